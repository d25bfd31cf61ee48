use crate::extract::fields::FieldSet;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 文档导入结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub files_read: usize,
    pub files_skipped: usize,
    pub documents_by_subtype: BTreeMap<String, usize>,
    pub documents_skipped: usize,
    pub restitutions_created: usize,
    pub compensations_created: usize,
    pub cancellations_created: usize,
    /// 为满足 DCOMP 引用而创建的占位 PER 编号
    pub stubs_created: Vec<String>,
}

/// 债务行导入结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebitReport {
    pub files_read: usize,
    pub files_skipped: usize,
    pub documents_skipped: usize,
    pub debits_found: usize,
    pub debits_created: usize,
    pub debits_skipped: usize,
    pub debits_linked: usize,
}

/// 可用余额：PER 原始信用减去 DCOMP 债务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditBalance {
    pub total_credito: BigDecimal,
    pub total_debitos: BigDecimal,
    pub saldo_disponivel: BigDecimal,
}

impl CreditBalance {
    /// PER 中申报信用金额的列
    pub const CREDIT_FIELD: &'static str = "valor_original_do_credito_inicial";
    /// DCOMP 中被抵扣债务金额的列
    pub const DEBIT_FIELD: &'static str = "total_dos_debitos";

    pub fn new(total_credito: BigDecimal, total_debitos: BigDecimal) -> Self {
        let saldo_disponivel = &total_credito - &total_debitos;
        Self {
            total_credito,
            total_debitos,
            saldo_disponivel,
        }
    }

    /// 对字段集合求和，缺失值按 0 计
    pub fn from_fields<'a>(
        restitutions: impl IntoIterator<Item = &'a FieldSet>,
        compensations: impl IntoIterator<Item = &'a FieldSet>,
    ) -> Self {
        Self::new(
            sum_field(restitutions, Self::CREDIT_FIELD),
            sum_field(compensations, Self::DEBIT_FIELD),
        )
    }
}

fn sum_field<'a>(sets: impl IntoIterator<Item = &'a FieldSet>, name: &str) -> BigDecimal {
    sets.into_iter()
        .filter_map(|f| f.decimal(name))
        .fold(BigDecimal::from(0), |acc, v| acc + v)
}
