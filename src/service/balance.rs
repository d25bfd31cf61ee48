use super::importer::ExtractionBatch;
use crate::db::Repository;
use crate::error::ImportError;
use crate::extract::convert::normalize_cnpj;
use crate::models::CreditBalance;

/// 已入库数据的可用余额
///
/// 指定 `cnpj` 时只统计该公司的 PER 与 DCOMP，CNPJ 可带标点；公司不存在时报错。
pub async fn available_balance<R: Repository>(
    repo: &R,
    cnpj: Option<&str>,
) -> Result<CreditBalance, ImportError> {
    // 1. 解析公司
    let company = match cnpj {
        Some(raw) => {
            let cnpj = normalize_cnpj(raw);
            let company = repo
                .find_company(&cnpj)
                .await?
                .ok_or(ImportError::UnknownCompany(cnpj))?;
            Some(company)
        }
        None => None,
    };

    // 2. 汇总
    let balance = repo.credit_balance(company.as_ref().map(|c| c.id)).await?;
    tracing::info!(
        "{}: credit {} - debits {} = available {}",
        company.as_ref().map_or("all companies", |c| c.cnpj.as_str()),
        balance.total_credito,
        balance.total_debitos,
        balance.saldo_disponivel
    );
    Ok(balance)
}

/// 提取批次的可用余额（入库前）
pub fn batch_balance(batch: &ExtractionBatch) -> CreditBalance {
    CreditBalance::from_fields(
        batch.restitutions().map(|r| &r.fields),
        batch.compensations().map(|c| &c.fields),
    )
}
