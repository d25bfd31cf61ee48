use crate::error::ImportError;
use crate::models::{
    CancellationRequest, CancellationTarget, Company, CompensationDeclaration, CreditBalance,
    DebitLine, RestitutionRequest,
};

/// 导入器的持久化接口
///
/// 所有 `create_*` 只插入新行，唯一约束冲突返回 `ImportError::Duplicate`，不做原地更新。
#[allow(async_fn_in_trait)]
pub trait Repository {
    /// 按纯数字 CNPJ 查找公司，首次出现时创建
    async fn get_or_create_company(
        &self,
        cnpj: &str,
        nome: Option<&str>,
    ) -> Result<Company, ImportError>;

    /// 按纯数字 CNPJ 查找公司，不创建
    async fn find_company(&self, cnpj: &str) -> Result<Option<Company>, ImportError>;

    async fn find_restitution(&self, numero: &str) -> Result<Option<i64>, ImportError>;

    async fn create_restitution(
        &self,
        company_id: i64,
        request: &RestitutionRequest,
    ) -> Result<i64, ImportError>;

    /// 插入只有编号和所属公司的 PER 占位记录
    async fn create_restitution_stub(
        &self,
        company_id: i64,
        numero: &str,
    ) -> Result<i64, ImportError>;

    async fn find_compensation(&self, numero: &str) -> Result<Option<i64>, ImportError>;

    async fn create_compensation(
        &self,
        company_id: i64,
        declaration: &CompensationDeclaration,
        originating_request: Option<i64>,
    ) -> Result<i64, ImportError>;

    async fn create_debit(&self, company_id: i64, line: &DebitLine) -> Result<i64, ImportError>;

    /// 将债务行加入 DCOMP 的债务集合
    async fn link_debit(&self, compensation_id: i64, debit_id: i64) -> Result<(), ImportError>;

    async fn create_cancellation(
        &self,
        company_id: i64,
        request: &CancellationRequest,
        target: CancellationTarget,
    ) -> Result<i64, ImportError>;

    /// 可用余额；`company_id` 为 None 时统计全部公司
    async fn credit_balance(&self, company_id: Option<i64>)
        -> Result<CreditBalance, ImportError>;
}
