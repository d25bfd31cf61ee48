use super::repository::Repository;
use crate::error::ImportError;
use crate::extract::fields::{Field, FieldSet, FieldValue, ValueKind};
use crate::models::{
    CancellationRequest, CancellationTarget, Company, CompensationDeclaration, CreditBalance,
    DebitLine, DocumentHeader, RestitutionRequest,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::{Duration, Instant};

const INSERT_TIMEOUT: Duration = Duration::from_secs(30);
const UNIQUE_VIOLATION: &str = "23505";

/// 待插入的单列值
enum Value {
    Id(Option<i64>),
    Field(ValueKind, Option<FieldValue>),
}

impl Value {
    fn text(value: &str) -> Self {
        Self::Field(ValueKind::Text, Some(FieldValue::Text(value.to_string())))
    }

    fn optional_text(value: Option<&str>) -> Self {
        Self::Field(
            ValueKind::Text,
            value.map(|v| FieldValue::Text(v.to_string())),
        )
    }
}

impl From<&Field> for Value {
    fn from(field: &Field) -> Self {
        Self::Field(field.kind, field.value.clone())
    }
}

/// 单次插入的列列表，按语句顺序
struct Row {
    table: &'static str,
    columns: Vec<(&'static str, Value)>,
}

impl Row {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
        }
    }

    fn push(mut self, column: &'static str, value: Value) -> Self {
        self.columns.push((column, value));
        self
    }

    fn header(self, company_id: i64, header: &DocumentHeader) -> Self {
        self.push("empresa_id", Value::Id(Some(company_id)))
            .push("versao_perdcomp", Value::optional_text(header.versao.as_deref()))
            .push("cnpj", Value::text(&header.cnpj))
            .push("numero_perdcomp", Value::text(&header.numero))
            .push(
                "nome_empresarial",
                Value::optional_text(header.nome_empresarial.as_deref()),
            )
    }

    fn fields(mut self, fields: &FieldSet) -> Self {
        for field in fields.iter() {
            self.columns.push((field.name, Value::from(field)));
        }
        self
    }
}

/// 缺失值按列类型绑定为 NULL
fn push_value(values: &mut Separated<'_, '_, Postgres, &'static str>, value: Value) {
    match value {
        Value::Id(id) => {
            values.push_bind(id);
        }
        Value::Field(_, Some(FieldValue::Text(v))) => {
            values.push_bind(v);
        }
        Value::Field(_, Some(FieldValue::Decimal(v))) => {
            values.push_bind(v);
        }
        Value::Field(_, Some(FieldValue::Date(v))) => {
            values.push_bind(v);
        }
        Value::Field(_, Some(FieldValue::Flag(v))) => {
            values.push_bind(v);
        }
        Value::Field(ValueKind::Text, None) => {
            values.push_bind(None::<String>);
        }
        Value::Field(ValueKind::Decimal, None) => {
            values.push_bind(None::<BigDecimal>);
        }
        Value::Field(ValueKind::Date, None) => {
            values.push_bind(None::<NaiveDate>);
        }
        Value::Field(ValueKind::Flag, None) => {
            values.push_bind(None::<bool>);
        }
    }
}

fn unique_violation(err: sqlx::Error, entity: &'static str, key: &str) -> ImportError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return ImportError::Duplicate {
                entity,
                key: key.to_string(),
            };
        }
    }
    ImportError::Database(err)
}

/// 基于 `perdcomp_*` 表的 PostgreSQL [`Repository`] 实现
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 构建并执行 `INSERT INTO <table> (...) VALUES (...) RETURNING id`
    async fn insert(&self, row: Row, entity: &'static str, key: &str) -> Result<i64, ImportError> {
        let start = Instant::now();
        let table = row.table;
        let (names, values): (Vec<_>, Vec<_>) = row.columns.into_iter().unzip();

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO {table} ("));
        {
            let mut columns = builder.separated(", ");
            for name in names {
                columns.push(name);
            }
        }
        builder.push(") VALUES (");
        {
            let mut binds = builder.separated(", ");
            for value in values {
                push_value(&mut binds, value);
            }
        }
        builder.push(") RETURNING id");

        let result = tokio::time::timeout(
            INSERT_TIMEOUT,
            builder.build_query_scalar::<i64>().fetch_one(&self.pool),
        )
        .await;

        match result {
            Ok(Ok(id)) => {
                tracing::debug!("{table}: inserted id {id} ({key}) in {:?}", start.elapsed());
                Ok(id)
            }
            Ok(Err(e)) => Err(unique_violation(e, entity, key)),
            Err(_) => {
                tracing::error!("{table}: insert of {key} timed out after {INSERT_TIMEOUT:?}");
                Err(ImportError::Database(sqlx::Error::PoolTimedOut))
            }
        }
    }

    async fn find_id(&self, table: &str, numero: &str) -> Result<Option<i64>, ImportError> {
        let id = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT id FROM {table} WHERE numero_perdcomp = $1"
        ))
        .bind(numero)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }
}

impl Repository for PgRepository {
    async fn get_or_create_company(
        &self,
        cnpj: &str,
        nome: Option<&str>,
    ) -> Result<Company, ImportError> {
        let created = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO perdcomp_empresa (cnpj, nome)
            VALUES ($1, $2)
            ON CONFLICT (cnpj) DO NOTHING
            RETURNING id, nome, cnpj
            "#,
        )
        .bind(cnpj)
        .bind(nome)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(company) = created {
            tracing::info!("company created: {} ({})", company.cnpj, company.id);
            return Ok(company);
        }

        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, nome, cnpj
            FROM perdcomp_empresa
            WHERE cnpj = $1
            "#,
        )
        .bind(cnpj)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!("company found: {} ({})", company.cnpj, company.id);
        Ok(company)
    }

    async fn find_company(&self, cnpj: &str) -> Result<Option<Company>, ImportError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            SELECT id, nome, cnpj
            FROM perdcomp_empresa
            WHERE cnpj = $1
            "#,
        )
        .bind(cnpj)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    async fn find_restitution(&self, numero: &str) -> Result<Option<i64>, ImportError> {
        self.find_id("perdcomp_per", numero).await
    }

    async fn create_restitution(
        &self,
        company_id: i64,
        request: &RestitutionRequest,
    ) -> Result<i64, ImportError> {
        let row = Row::new("perdcomp_per")
            .header(company_id, &request.header)
            .fields(&request.fields);
        self.insert(row, "PER", &request.header.numero).await
    }

    async fn create_restitution_stub(
        &self,
        company_id: i64,
        numero: &str,
    ) -> Result<i64, ImportError> {
        let row = Row::new("perdcomp_per")
            .push("empresa_id", Value::Id(Some(company_id)))
            .push("numero_perdcomp", Value::text(numero));
        self.insert(row, "PER", numero).await
    }

    async fn find_compensation(&self, numero: &str) -> Result<Option<i64>, ImportError> {
        self.find_id("perdcomp_dcomp", numero).await
    }

    async fn create_compensation(
        &self,
        company_id: i64,
        declaration: &CompensationDeclaration,
        originating_request: Option<i64>,
    ) -> Result<i64, ImportError> {
        let row = Row::new("perdcomp_dcomp")
            .header(company_id, &declaration.header)
            .push("numero_perdcomp_inicial_id", Value::Id(originating_request))
            .fields(&declaration.fields);
        self.insert(row, "DCOMP", &declaration.header.numero).await
    }

    async fn create_debit(&self, company_id: i64, line: &DebitLine) -> Result<i64, ImportError> {
        let row = Row::new("perdcomp_dcompdebitos")
            .push("empresa_id", Value::Id(Some(company_id)))
            .push("cnpj", Value::text(&line.cnpj))
            .push("numero_dcomp", Value::text(&line.numero_dcomp))
            .push(
                "nome_empresarial",
                Value::optional_text(line.nome_empresarial.as_deref()),
            )
            .fields(&line.fields);
        self.insert(row, "debit line", &line.key().to_string()).await
    }

    async fn link_debit(&self, compensation_id: i64, debit_id: i64) -> Result<(), ImportError> {
        sqlx::query(
            r#"
            INSERT INTO perdcomp_dcomp_debitos (dcomp_id, dcompdebitos_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(compensation_id)
        .bind(debit_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_cancellation(
        &self,
        company_id: i64,
        request: &CancellationRequest,
        target: CancellationTarget,
    ) -> Result<i64, ImportError> {
        let row = Row::new("perdcomp_percanc")
            .header(company_id, &request.header)
            .push(
                "numero_perdcomp_a_cancelar",
                Value::optional_text(request.numero_a_cancelar.as_deref()),
            )
            .push("per_relacionado_id", Value::Id(target.restitution_id()))
            .push("dcomp_relacionado_id", Value::Id(target.compensation_id()))
            .fields(&request.fields);
        self.insert(row, "cancellation", &request.header.numero).await
    }

    async fn credit_balance(
        &self,
        company_id: Option<i64>,
    ) -> Result<CreditBalance, ImportError> {
        let total_credito = sqlx::query_scalar::<_, BigDecimal>(
            r#"
            SELECT COALESCE(SUM(valor_original_do_credito_inicial), 0)
            FROM perdcomp_per
            WHERE ($1::BIGINT IS NULL OR empresa_id = $1)
            "#,
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;
        let total_debitos = sqlx::query_scalar::<_, BigDecimal>(
            r#"
            SELECT COALESCE(SUM(total_dos_debitos), 0)
            FROM perdcomp_dcomp
            WHERE ($1::BIGINT IS NULL OR empresa_id = $1)
            "#,
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(CreditBalance::new(total_credito, total_debitos))
    }
}

#[cfg(test)]
mod tests {
    use crate::extract::classify::{DocumentType, Subtype};
    use crate::extract::layouts::layout;

    const SCHEMA: &str = include_str!("../../sql/schema.sql");

    fn table_block(table: &str) -> &'static str {
        let start = SCHEMA
            .find(&format!("CREATE TABLE IF NOT EXISTS {table} ("))
            .unwrap_or_else(|| panic!("no DDL for {table}"));
        let end = start + SCHEMA[start..].find("\n);").unwrap();
        &SCHEMA[start..end]
    }

    fn has_column(block: &str, column: &str) -> bool {
        block.contains(&format!("\n    {column} "))
    }

    #[test]
    fn every_layout_field_has_a_column() {
        for subtype in Subtype::ALL {
            let table = match subtype.document_type() {
                DocumentType::Restitution => "perdcomp_per",
                DocumentType::Compensation => "perdcomp_dcomp",
                _ => "perdcomp_percanc",
            };
            let block = table_block(table);
            for column in ["empresa_id", "versao_perdcomp", "cnpj", "numero_perdcomp", "nome_empresarial"] {
                assert!(has_column(block, column), "{table}.{column}");
            }
            for field in layout(subtype) {
                assert!(has_column(block, field.name), "{subtype}: {table}.{}", field.name);
            }
        }

        assert!(has_column(table_block("perdcomp_dcomp"), "numero_perdcomp_inicial_id"));
        let percanc = table_block("perdcomp_percanc");
        for column in ["numero_perdcomp_a_cancelar", "per_relacionado_id", "dcomp_relacionado_id"] {
            assert!(has_column(percanc, column), "perdcomp_percanc.{column}");
        }
    }

    #[test]
    fn restitution_may_reference_its_compensation() {
        let alter = SCHEMA
            .find("ALTER TABLE perdcomp_per")
            .map(|start| &SCHEMA[start..start + SCHEMA[start..].find(';').unwrap()])
            .expect("perdcomp_per is altered after perdcomp_dcomp exists");
        assert!(alter.contains("dcomp_inicial_id BIGINT REFERENCES perdcomp_dcomp (id) ON DELETE SET NULL"));
        assert!(!alter.contains("NOT NULL"));
        assert!(
            SCHEMA.find("CREATE TABLE IF NOT EXISTS perdcomp_dcomp (").unwrap()
                < SCHEMA.find("ALTER TABLE perdcomp_per").unwrap()
        );
    }
}
