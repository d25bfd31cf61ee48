use crate::error::ImportError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 单个 PDF 文件的纯文本
#[derive(Debug, Clone)]
pub struct SourceText {
    pub path: PathBuf,
    pub text: String,
}

impl SourceText {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// 日志和报告中使用的文件名
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// 无法读取的文件
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: ImportError,
}

/// 文件名标记：文件名包含全部标记才会被选中
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    markers: Vec<String>,
}

impl FileFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.markers.iter().all(|m| file_name.contains(m.as_str()))
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// 列出 `dir` 中被 `filter` 接受的 PDF 文件，按路径排序
pub fn list_pdfs(dir: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>, ImportError> {
    if !dir.is_dir() {
        return Err(ImportError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_pdf(&path) {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if filter.matches(&name) {
            files.push(path);
        }
    }
    files.sort();

    info!("{} PDF files selected in {}", files.len(), dir.display());
    Ok(files)
}

/// 按页序提取所有页面的文本
pub fn read_pdf(path: &Path) -> Result<String, ImportError> {
    let bytes = std::fs::read(path)?;
    let pdf_error = |message: String| ImportError::Pdf {
        path: path.to_path_buf(),
        message,
    };

    // pdf-extract 内部对畸形字体/资源使用 expect，需捕获 panic
    match panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(&bytes)
    })) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(pdf_error(e.to_string())),
        Err(payload) => Err(pdf_error(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("extractor panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("extractor panicked: {message}")
    } else {
        "extractor panicked".to_string()
    }
}

/// 逐个读取文件，无法读取的记录日志并作为跳过项返回
pub fn read_sources(paths: &[PathBuf]) -> (Vec<SourceText>, Vec<SkippedFile>) {
    let mut sources = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();

    for path in paths {
        match read_pdf(path) {
            Ok(text) => {
                info!("read {}", path.display());
                sources.push(SourceText::new(path.clone(), text));
            }
            Err(error) => {
                warn!("skipping {}: {}", path.display(), error);
                skipped.push(SkippedFile {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    (sources, skipped)
}
