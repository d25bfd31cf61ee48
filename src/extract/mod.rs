//! 将 PDF 文本转换为类型化文档

pub mod classify;
pub mod convert;
pub mod debits;
pub mod fields;
pub mod layouts;
pub mod text;

use crate::error::ImportError;
use crate::models::{
    CancellationRequest, CompensationDeclaration, DocumentHeader, ExtractedDocument,
    RestitutionRequest,
};
use classify::{classify, DocumentType, Subtype};
use convert::normalize_cnpj;
use fields::extract_fields;
use layouts::IDENTITY;
use tracing::debug;

pub use debits::split_debit_lines;
pub use text::{list_pdfs, read_pdf, read_sources, FileFilter, SkippedFile, SourceText};

/// 读取每个文档必须携带的标识
///
/// CNPJ 和文档编号必填，公司名称和表单版本可选
pub fn read_header(source: &str, text: &str) -> Result<DocumentHeader, ImportError> {
    let cnpj = IDENTITY
        .cnpj
        .find_raw(text)
        .map(normalize_cnpj)
        .ok_or(ImportError::MissingField("cnpj"))?;
    let numero = IDENTITY
        .numero
        .find_raw(text)
        .map(str::to_string)
        .ok_or(ImportError::MissingField("numero_perdcomp"))?;

    Ok(DocumentHeader {
        source: source.to_string(),
        cnpj,
        numero,
        versao: IDENTITY.versao.find_raw(text).map(str::to_string),
        nome_empresarial: IDENTITY.nome_empresarial.find_raw(text).map(str::to_string),
    })
}

/// 分类 `text`，读取标识并运行子类型的字段表
pub fn extract_document(source: &str, text: &str) -> Result<ExtractedDocument, ImportError> {
    let classification = classify(text);
    let subtype = Subtype::resolve(classification).ok_or_else(|| ImportError::Unrecognized {
        document_type: classification.document_type.label().to_string(),
        credit_type: classification.credit_type.label().to_string(),
    })?;

    let header = read_header(source, text)?;
    let fields = extract_fields(text, layouts::layout(subtype));
    debug!(
        "{} {}: {} of {} fields found",
        subtype,
        header.numero,
        fields.present(),
        fields.len()
    );

    let document = match subtype.document_type() {
        DocumentType::Restitution => ExtractedDocument::Restitution(RestitutionRequest {
            header,
            subtype,
            fields,
        }),
        DocumentType::Compensation => ExtractedDocument::Compensation(CompensationDeclaration {
            header,
            subtype,
            numero_perdcomp_inicial: IDENTITY.perdcomp_inicial.find_raw(text).map(str::to_string),
            fields,
        }),
        _ => ExtractedDocument::Cancellation(CancellationRequest {
            header,
            numero_a_cancelar: IDENTITY.perdcomp_a_cancelar.find_raw(text).map(str::to_string),
            fields,
        }),
    };
    Ok(document)
}
