use crate::extract::classify::Subtype;
use crate::extract::fields::FieldSet;

/// 所有 PER/DCOMP 表单共有的标识
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHeader {
    /// 文本来源文件
    pub source: String,
    /// 纯数字 CNPJ
    pub cnpj: String,
    pub numero: String,
    pub versao: Option<String>,
    pub nome_empresarial: Option<String>,
}

/// 退税申请（PER）
#[derive(Debug, Clone, PartialEq)]
pub struct RestitutionRequest {
    pub header: DocumentHeader,
    pub subtype: Subtype,
    pub fields: FieldSet,
}

/// 抵扣声明（DCOMP）
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationDeclaration {
    pub header: DocumentHeader,
    pub subtype: Subtype,
    /// 本声明所用信用对应的 PER 编号
    pub numero_perdcomp_inicial: Option<String>,
    pub fields: FieldSet,
}

/// 针对已提交 PER 或 DCOMP 的撤销申请
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationRequest {
    pub header: DocumentHeader,
    pub numero_a_cancelar: Option<String>,
    pub fields: FieldSet,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedDocument {
    Restitution(RestitutionRequest),
    Compensation(CompensationDeclaration),
    Cancellation(CancellationRequest),
}

impl ExtractedDocument {
    pub fn header(&self) -> &DocumentHeader {
        match self {
            Self::Restitution(doc) => &doc.header,
            Self::Compensation(doc) => &doc.header,
            Self::Cancellation(doc) => &doc.header,
        }
    }

    pub fn subtype(&self) -> Subtype {
        match self {
            Self::Restitution(doc) => doc.subtype,
            Self::Compensation(doc) => doc.subtype,
            Self::Cancellation(_) => Subtype::Cancellation,
        }
    }

    pub fn fields(&self) -> &FieldSet {
        match self {
            Self::Restitution(doc) => &doc.fields,
            Self::Compensation(doc) => &doc.fields,
            Self::Cancellation(doc) => &doc.fields,
        }
    }
}

/// 撤销申请指向的唯一文档
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationTarget {
    Restitution(i64),
    Compensation(i64),
}

impl CancellationTarget {
    pub fn restitution_id(self) -> Option<i64> {
        match self {
            Self::Restitution(id) => Some(id),
            Self::Compensation(_) => None,
        }
    }

    pub fn compensation_id(self) -> Option<i64> {
        match self {
            Self::Compensation(id) => Some(id),
            Self::Restitution(_) => None,
        }
    }
}
