//! 两阶段导入：先提取所有文件，再按依赖顺序保存
//! （PER、解析来源 PER、DCOMP、撤销申请）

use crate::config::ImportConfig;
use crate::db::Repository;
use crate::error::ImportError;
use crate::extract::{self, split_debit_lines, FileFilter, SourceText};
use crate::models::{
    CancellationRequest, CancellationTarget, CompensationDeclaration, DebitReport,
    DocumentHeader, ExtractedDocument, ImportReport, RestitutionRequest,
};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::path::Path;

/// 无法提取的文档
#[derive(Debug)]
pub struct SkippedDocument {
    pub source: String,
    pub error: ImportError,
}

/// 提取阶段的结果
#[derive(Debug, Default)]
pub struct ExtractionBatch {
    pub documents: Vec<ExtractedDocument>,
    pub skipped: Vec<SkippedDocument>,
}

impl ExtractionBatch {
    pub fn restitutions(&self) -> impl Iterator<Item = &RestitutionRequest> {
        self.documents.iter().filter_map(|d| match d {
            ExtractedDocument::Restitution(doc) => Some(doc),
            _ => None,
        })
    }

    pub fn compensations(&self) -> impl Iterator<Item = &CompensationDeclaration> {
        self.documents.iter().filter_map(|d| match d {
            ExtractedDocument::Compensation(doc) => Some(doc),
            _ => None,
        })
    }

    pub fn cancellations(&self) -> impl Iterator<Item = &CancellationRequest> {
        self.documents.iter().filter_map(|d| match d {
            ExtractedDocument::Cancellation(doc) => Some(doc),
            _ => None,
        })
    }

    /// 按子类型名称统计的已提取文档数
    pub fn counts_by_subtype(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for document in &self.documents {
            *counts.entry(document.subtype().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// 阶段 1：提取所有来源，失败的记录日志并标记为跳过
pub fn extract_batch(sources: &[SourceText]) -> ExtractionBatch {
    let mut batch = ExtractionBatch::default();
    for source in sources {
        let name = source.name();
        match extract::extract_document(&name, &source.text) {
            Ok(document) => {
                tracing::info!("{}: {} {}", name, document.subtype(), document.header().numero);
                batch.documents.push(document);
            }
            Err(error) => {
                tracing::warn!("{}: skipped, {}", name, error);
                batch.skipped.push(SkippedDocument {
                    source: name,
                    error,
                });
            }
        }
    }
    batch
}

/// 按编号索引的来源 PER id，以及新建占位记录的编号
#[derive(Debug, Default)]
pub struct ParentResolution {
    ids: IndexMap<String, i64>,
    pub stubs: Vec<String>,
}

impl ParentResolution {
    pub fn get(&self, numero: &str) -> Option<i64> {
        self.ids.get(numero).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// 通过 [`Repository`] 导入 PER/DCOMP 文档和债务行
pub struct Importer<R> {
    repo: R,
    config: ImportConfig,
}

impl<R: Repository> Importer<R> {
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, ImportConfig::default())
    }

    pub fn with_config(repo: R, config: ImportConfig) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn restitution_filter(&self) -> FileFilter {
        FileFilter::with_markers(self.config.per_markers.iter().cloned())
    }

    fn compensation_filter(&self) -> FileFilter {
        FileFilter::with_markers(self.config.dcomp_markers.iter().cloned())
    }

    /// 分类导入 `dir` 中的所有 PDF
    pub async fn import_directory(
        &self,
        dir: &Path,
    ) -> Result<(ImportReport, ExtractionBatch), ImportError> {
        let paths = extract::list_pdfs(dir, &FileFilter::any())?;
        let (sources, unreadable) = extract::read_sources(&paths);

        let batch = extract_batch(&sources);
        let mut report = ImportReport {
            files_read: sources.len(),
            files_skipped: unreadable.len(),
            ..ImportReport::default()
        };
        self.persist(&batch, &mut report).await;
        Ok((report, batch))
    }

    /// 三目录导入：先一起保存 PER 和 DCOMP，再读取债务目录
    pub async fn import_split(
        &self,
        per_dir: &Path,
        dcomp_dir: &Path,
        debitos_dir: &Path,
    ) -> Result<(ImportReport, DebitReport), ImportError> {
        let mut paths = extract::list_pdfs(per_dir, &self.restitution_filter())?;
        paths.extend(extract::list_pdfs(dcomp_dir, &self.compensation_filter())?);
        let (sources, unreadable) = extract::read_sources(&paths);

        let batch = extract_batch(&sources);
        let mut report = ImportReport {
            files_read: sources.len(),
            files_skipped: unreadable.len(),
            ..ImportReport::default()
        };
        self.persist(&batch, &mut report).await;

        let debits = self.import_debits(debitos_dir).await?;
        Ok((report, debits))
    }

    /// 阶段 2：按依赖顺序保存提取批次
    pub async fn persist(&self, batch: &ExtractionBatch, report: &mut ImportReport) {
        report.documents_by_subtype = batch.counts_by_subtype();
        report.documents_skipped += batch.skipped.len();

        // 1. 保存 PER
        for request in batch.restitutions() {
            match self.persist_restitution(request).await {
                Ok(id) => {
                    report.restitutions_created += 1;
                    tracing::info!("PER {} saved (id {})", request.header.numero, id);
                }
                Err(e) => {
                    report.documents_skipped += 1;
                    tracing::warn!("PER {} not saved: {}", request.header.numero, e);
                }
            }
        }

        // 2. 解析 DCOMP 引用的来源 PER，缺失的创建占位记录
        let declarations: Vec<_> = batch.compensations().collect();
        let parents = self.resolve_originating_requests(&declarations).await;
        report.stubs_created.extend(parents.stubs.iter().cloned());

        // 3. 保存 DCOMP
        for declaration in declarations {
            let parent = declaration
                .numero_perdcomp_inicial
                .as_deref()
                .and_then(|numero| parents.get(numero));
            match self.persist_compensation(declaration, parent).await {
                Ok(id) => {
                    report.compensations_created += 1;
                    tracing::info!("DCOMP {} saved (id {})", declaration.header.numero, id);
                }
                Err(e) => {
                    report.documents_skipped += 1;
                    tracing::warn!("DCOMP {} not saved: {}", declaration.header.numero, e);
                }
            }
        }

        // 4. 保存撤销申请（其目标此时均已存在）
        for request in batch.cancellations() {
            match self.persist_cancellation(request).await {
                Ok(id) => {
                    report.cancellations_created += 1;
                    tracing::info!("cancellation {} saved (id {})", request.header.numero, id);
                }
                Err(e) => {
                    report.documents_skipped += 1;
                    tracing::warn!("cancellation {} not saved: {}", request.header.numero, e);
                }
            }
        }
    }

    async fn company_id(&self, header: &DocumentHeader) -> Result<i64, ImportError> {
        let company = self
            .repo
            .get_or_create_company(&header.cnpj, header.nome_empresarial.as_deref())
            .await?;
        Ok(company.id)
    }

    async fn persist_restitution(&self, request: &RestitutionRequest) -> Result<i64, ImportError> {
        let company_id = self.company_id(&request.header).await?;
        self.repo.create_restitution(company_id, request).await
    }

    async fn persist_compensation(
        &self,
        declaration: &CompensationDeclaration,
        parent: Option<i64>,
    ) -> Result<i64, ImportError> {
        let company_id = self.company_id(&declaration.header).await?;
        self.repo
            .create_compensation(company_id, declaration, parent)
            .await
    }

    async fn persist_cancellation(&self, request: &CancellationRequest) -> Result<i64, ImportError> {
        let numero = request
            .numero_a_cancelar
            .as_deref()
            .ok_or(ImportError::MissingField("numero_perdcomp_a_cancelar"))?;
        let target = self.resolve_cancellation_target(numero).await?;
        let company_id = self.company_id(&request.header).await?;
        self.repo.create_cancellation(company_id, request, target).await
    }

    /// 查找 `declarations` 引用的每个 PER 编号，未入库的创建占位记录
    /// （只有编号和所属公司）。占位记录归属第一个引用它的声明的公司
    pub async fn resolve_originating_requests(
        &self,
        declarations: &[&CompensationDeclaration],
    ) -> ParentResolution {
        let mut owners: IndexMap<&str, &DocumentHeader> = IndexMap::new();
        for declaration in declarations {
            if let Some(numero) = declaration.numero_perdcomp_inicial.as_deref() {
                owners.entry(numero).or_insert(&declaration.header);
            }
        }

        let mut resolution = ParentResolution::default();
        for (numero, header) in owners {
            match self.find_or_create_stub(numero, header).await {
                Ok((id, created)) => {
                    if created {
                        tracing::info!("PER {} not found, stub created (id {})", numero, id);
                        resolution.stubs.push(numero.to_string());
                    }
                    resolution.ids.insert(numero.to_string(), id);
                }
                Err(e) => tracing::warn!("originating PER {} unresolved: {}", numero, e),
            }
        }
        resolution
    }

    async fn find_or_create_stub(
        &self,
        numero: &str,
        owner: &DocumentHeader,
    ) -> Result<(i64, bool), ImportError> {
        if let Some(id) = self.repo.find_restitution(numero).await? {
            return Ok((id, false));
        }
        let company_id = self.company_id(owner).await?;
        let id = self.repo.create_restitution_stub(company_id, numero).await?;
        Ok((id, true))
    }

    /// 先查 PER 再查 DCOMP，必须恰好存在一个
    pub async fn resolve_cancellation_target(
        &self,
        numero: &str,
    ) -> Result<CancellationTarget, ImportError> {
        let restitution = self.repo.find_restitution(numero).await?;
        let compensation = self.repo.find_compensation(numero).await?;
        match (restitution, compensation) {
            (Some(id), None) => Ok(CancellationTarget::Restitution(id)),
            (None, Some(id)) => Ok(CancellationTarget::Compensation(id)),
            (None, None) => Err(ImportError::UnresolvedCancellation(numero.to_string())),
            (Some(_), Some(_)) => Err(ImportError::AmbiguousCancellation(numero.to_string())),
        }
    }

    /// 导入 `dir` 中 DCOMP 文件的债务行
    pub async fn import_debits(&self, dir: &Path) -> Result<DebitReport, ImportError> {
        let paths = extract::list_pdfs(dir, &self.compensation_filter())?;
        let (sources, unreadable) = extract::read_sources(&paths);

        let mut report = DebitReport {
            files_skipped: unreadable.len(),
            ..DebitReport::default()
        };
        self.import_debit_sources(&sources, &mut report).await;
        Ok(report)
    }

    /// 将每个来源拆分为债务行并逐条保存
    pub async fn import_debit_sources(&self, sources: &[SourceText], report: &mut DebitReport) {
        for source in sources {
            report.files_read += 1;
            let name = source.name();

            let header = match extract::read_header(&name, &source.text) {
                Ok(header) => header,
                Err(e) => {
                    report.documents_skipped += 1;
                    tracing::warn!("{}: skipped, {}", name, e);
                    continue;
                }
            };
            let company_id = match self.company_id(&header).await {
                Ok(id) => id,
                Err(e) => {
                    report.documents_skipped += 1;
                    tracing::warn!("{}: company {} not saved: {}", name, header.cnpj, e);
                    continue;
                }
            };

            let lines = split_debit_lines(&source.text, &header);
            report.debits_found += lines.len();
            tracing::info!("{}: {} debit lines in DCOMP {}", name, lines.len(), header.numero);

            let compensation = match self.repo.find_compensation(&header.numero).await {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("DCOMP {} lookup failed: {}", header.numero, e);
                    None
                }
            };

            for line in &lines {
                let debit_id = match self.repo.create_debit(company_id, line).await {
                    Ok(id) => id,
                    Err(e) => {
                        report.debits_skipped += 1;
                        tracing::warn!("debit {} not saved: {}", line.marker, e);
                        continue;
                    }
                };
                report.debits_created += 1;

                let Some(compensation_id) = compensation else {
                    continue;
                };
                match self.repo.link_debit(compensation_id, debit_id).await {
                    Ok(()) => report.debits_linked += 1,
                    Err(e) => tracing::warn!("debit {} not linked: {}", line.marker, e),
                }
            }
        }
    }
}
