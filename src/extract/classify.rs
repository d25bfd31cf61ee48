use serde::Serialize;
use std::fmt;

const FORM_HEADER: &str =
    "PEDIDO DE RESTITUIÇÃO, RESSARCIMENTO OU REEMBOLSO E DECLARAÇÃO DE COMPENSAÇÃO";

/// PER/DCOMP 表单类型，由文本中的字面标记决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentType {
    Restitution,
    Cancellation,
    Compensation,
    /// 有表单标题但没有已知的文档类型
    Unidentified,
    Unrecognized,
}

impl DocumentType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Restitution => "Pedido de Restituição",
            Self::Cancellation => "Pedido de Cancelamento",
            Self::Compensation => "Declaração de Compensação",
            Self::Unidentified => "Tipo Específico Não Identificado",
            Self::Unrecognized => "Documento Não Reconhecido",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CreditType {
    NegativeBalanceIrpj,
    NegativeBalanceCsll,
    PaymentExcess,
    Unknown,
}

impl CreditType {
    pub fn label(self) -> &'static str {
        match self {
            Self::NegativeBalanceIrpj => "Saldo Negativo de IRPJ",
            Self::NegativeBalanceCsll => "Saldo Negativo de CSLL",
            Self::PaymentExcess => "Pagamento Indevido ou a Maior",
            Self::Unknown => "Crédito Desconhecido",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub document_type: DocumentType,
    pub credit_type: CreditType,
}

/// 读取文档所用的提取布局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Subtype {
    RestitutionPaymentExcess,
    RestitutionNegativeBalanceIrpj,
    RestitutionNegativeBalanceCsll,
    CompensationPaymentExcess,
    CompensationNegativeBalanceIrpj,
    CompensationNegativeBalanceCsll,
    Cancellation,
}

impl Subtype {
    pub const ALL: [Subtype; 7] = [
        Self::RestitutionPaymentExcess,
        Self::RestitutionNegativeBalanceIrpj,
        Self::RestitutionNegativeBalanceCsll,
        Self::CompensationPaymentExcess,
        Self::CompensationNegativeBalanceIrpj,
        Self::CompensationNegativeBalanceCsll,
        Self::Cancellation,
    ];

    pub fn resolve(classification: Classification) -> Option<Self> {
        use CreditType::*;
        match (classification.document_type, classification.credit_type) {
            (DocumentType::Restitution, PaymentExcess) => Some(Self::RestitutionPaymentExcess),
            (DocumentType::Restitution, NegativeBalanceIrpj) => {
                Some(Self::RestitutionNegativeBalanceIrpj)
            }
            (DocumentType::Restitution, NegativeBalanceCsll) => {
                Some(Self::RestitutionNegativeBalanceCsll)
            }
            (DocumentType::Compensation, PaymentExcess) => Some(Self::CompensationPaymentExcess),
            (DocumentType::Compensation, NegativeBalanceIrpj) => {
                Some(Self::CompensationNegativeBalanceIrpj)
            }
            (DocumentType::Compensation, NegativeBalanceCsll) => {
                Some(Self::CompensationNegativeBalanceCsll)
            }
            (DocumentType::Cancellation, _) => Some(Self::Cancellation),
            _ => None,
        }
    }

    pub fn document_type(self) -> DocumentType {
        match self {
            Self::RestitutionPaymentExcess
            | Self::RestitutionNegativeBalanceIrpj
            | Self::RestitutionNegativeBalanceCsll => DocumentType::Restitution,
            Self::CompensationPaymentExcess
            | Self::CompensationNegativeBalanceIrpj
            | Self::CompensationNegativeBalanceCsll => DocumentType::Compensation,
            Self::Cancellation => DocumentType::Cancellation,
        }
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RestitutionPaymentExcess => "per pagamento indevido ou a maior",
            Self::RestitutionNegativeBalanceIrpj => "per saldo negativo irpj",
            Self::RestitutionNegativeBalanceCsll => "per saldo negativo csll",
            Self::CompensationPaymentExcess => "dcomp pagamento indevido ou a maior",
            Self::CompensationNegativeBalanceIrpj => "dcomp saldo negativo irpj",
            Self::CompensationNegativeBalanceCsll => "dcomp saldo negativo csll",
            Self::Cancellation => "pedido de cancelamento",
        };
        f.write_str(name)
    }
}

pub fn classify_document(text: &str) -> DocumentType {
    if !text.contains(FORM_HEADER) {
        return DocumentType::Unrecognized;
    }
    if text.contains("Pedido de Restituição") {
        DocumentType::Restitution
    } else if text.contains("Pedido de Cancelamento") {
        DocumentType::Cancellation
    } else if text.contains("Declaração de Compensação") {
        DocumentType::Compensation
    } else {
        DocumentType::Unidentified
    }
}

pub fn classify_credit(text: &str) -> CreditType {
    [
        CreditType::NegativeBalanceIrpj,
        CreditType::NegativeBalanceCsll,
        CreditType::PaymentExcess,
    ]
    .into_iter()
    .find(|credit| text.contains(credit.label()))
    .unwrap_or(CreditType::Unknown)
}

/// 通过子串检查分类文档，不会失败
pub fn classify(text: &str) -> Classification {
    Classification {
        document_type: classify_document(text),
        credit_type: classify_credit(text),
    }
}
