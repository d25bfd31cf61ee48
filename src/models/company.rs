use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 公司（perdcomp_empresa），以纯数字 CNPJ 为键
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub nome: Option<String>,
    pub cnpj: String,
}
