use std::path::PathBuf;

/// 读取、提取或保存 PER/DCOMP 文档时的错误
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF 无法转换为文本
    #[error("failed to extract text from {}: {message}", path.display())]
    Pdf { path: PathBuf, message: String },

    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// 缺少必填标识字段（CNPJ 或文档编号）
    #[error("mandatory field `{0}` not found in document")]
    MissingField(&'static str),

    #[error("unrecognized document (type: {document_type}, credit: {credit_type})")]
    Unrecognized {
        document_type: String,
        credit_type: String,
    },

    /// 唯一约束拒绝了该行
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("no company registered with CNPJ {0}")]
    UnknownCompany(String),

    #[error("no PER or DCOMP found for cancelled number {0}")]
    UnresolvedCancellation(String),

    #[error("cancelled number {0} matches both a PER and a DCOMP")]
    AmbiguousCancellation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
