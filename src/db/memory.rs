use super::repository::Repository;
use crate::error::ImportError;
use crate::extract::fields::FieldSet;
use crate::models::{
    CancellationRequest, CancellationTarget, Company, CompensationDeclaration, CreditBalance,
    DebitKey, DebitLine, RestitutionRequest,
};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

/// 已保存的 PER 或 DCOMP
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: i64,
    pub company_id: i64,
    pub numero: String,
    /// DCOMP 的来源 PER
    pub parent_id: Option<i64>,
    pub fields: FieldSet,
}

impl StoredDocument {
    /// 占位记录只有编号和所属公司
    pub fn is_stub(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StoredDebit {
    pub id: i64,
    pub company_id: i64,
    pub key: DebitKey,
    pub line: DebitLine,
}

#[derive(Debug, Clone)]
pub struct StoredCancellation {
    pub id: i64,
    pub company_id: i64,
    pub numero: String,
    pub target: CancellationTarget,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    companies: Vec<Company>,
    restitutions: Vec<StoredDocument>,
    compensations: Vec<StoredDocument>,
    debits: Vec<StoredDebit>,
    links: BTreeSet<(i64, i64)>,
    cancellations: Vec<StoredCancellation>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// 进程内 [`Repository`]，唯一性规则与数据库一致
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn companies(&self) -> Vec<Company> {
        self.state().companies.clone()
    }

    pub fn restitutions(&self) -> Vec<StoredDocument> {
        self.state().restitutions.clone()
    }

    pub fn compensations(&self) -> Vec<StoredDocument> {
        self.state().compensations.clone()
    }

    pub fn restitution(&self, numero: &str) -> Option<StoredDocument> {
        self.state()
            .restitutions
            .iter()
            .find(|d| d.numero == numero)
            .cloned()
    }

    pub fn compensation(&self, numero: &str) -> Option<StoredDocument> {
        self.state()
            .compensations
            .iter()
            .find(|d| d.numero == numero)
            .cloned()
    }

    pub fn debits(&self) -> Vec<StoredDebit> {
        self.state().debits.clone()
    }

    /// `(dcomp_id, debit_id)` 对
    pub fn links(&self) -> Vec<(i64, i64)> {
        self.state().links.iter().copied().collect()
    }

    pub fn cancellations(&self) -> Vec<StoredCancellation> {
        self.state().cancellations.clone()
    }

    fn insert_document(
        documents: &mut Vec<StoredDocument>,
        entity: &'static str,
        document: StoredDocument,
    ) -> Result<i64, ImportError> {
        if documents.iter().any(|d| d.numero == document.numero) {
            return Err(ImportError::Duplicate {
                entity,
                key: document.numero,
            });
        }
        let id = document.id;
        documents.push(document);
        Ok(id)
    }
}

impl Repository for MemoryRepository {
    async fn get_or_create_company(
        &self,
        cnpj: &str,
        nome: Option<&str>,
    ) -> Result<Company, ImportError> {
        let mut state = self.state();
        if let Some(company) = state.companies.iter().find(|c| c.cnpj == cnpj) {
            return Ok(company.clone());
        }
        let company = Company {
            id: state.next_id(),
            nome: nome.map(str::to_string),
            cnpj: cnpj.to_string(),
        };
        state.companies.push(company.clone());
        Ok(company)
    }

    async fn find_company(&self, cnpj: &str) -> Result<Option<Company>, ImportError> {
        Ok(self.state().companies.iter().find(|c| c.cnpj == cnpj).cloned())
    }

    async fn find_restitution(&self, numero: &str) -> Result<Option<i64>, ImportError> {
        Ok(self.restitution(numero).map(|d| d.id))
    }

    async fn create_restitution(
        &self,
        company_id: i64,
        request: &RestitutionRequest,
    ) -> Result<i64, ImportError> {
        let mut state = self.state();
        let document = StoredDocument {
            id: state.next_id(),
            company_id,
            numero: request.header.numero.clone(),
            parent_id: None,
            fields: request.fields.clone(),
        };
        Self::insert_document(&mut state.restitutions, "PER", document)
    }

    async fn create_restitution_stub(
        &self,
        company_id: i64,
        numero: &str,
    ) -> Result<i64, ImportError> {
        let mut state = self.state();
        let document = StoredDocument {
            id: state.next_id(),
            company_id,
            numero: numero.to_string(),
            parent_id: None,
            fields: FieldSet::new(),
        };
        Self::insert_document(&mut state.restitutions, "PER", document)
    }

    async fn find_compensation(&self, numero: &str) -> Result<Option<i64>, ImportError> {
        Ok(self.compensation(numero).map(|d| d.id))
    }

    async fn create_compensation(
        &self,
        company_id: i64,
        declaration: &CompensationDeclaration,
        originating_request: Option<i64>,
    ) -> Result<i64, ImportError> {
        let mut state = self.state();
        let document = StoredDocument {
            id: state.next_id(),
            company_id,
            numero: declaration.header.numero.clone(),
            parent_id: originating_request,
            fields: declaration.fields.clone(),
        };
        Self::insert_document(&mut state.compensations, "DCOMP", document)
    }

    async fn create_debit(&self, company_id: i64, line: &DebitLine) -> Result<i64, ImportError> {
        let mut state = self.state();
        let key = line.key();
        if key.is_complete() && state.debits.iter().any(|d| d.key == key) {
            return Err(ImportError::Duplicate {
                entity: "debit line",
                key: key.to_string(),
            });
        }
        let id = state.next_id();
        state.debits.push(StoredDebit {
            id,
            company_id,
            key,
            line: line.clone(),
        });
        Ok(id)
    }

    async fn link_debit(&self, compensation_id: i64, debit_id: i64) -> Result<(), ImportError> {
        self.state().links.insert((compensation_id, debit_id));
        Ok(())
    }

    async fn create_cancellation(
        &self,
        company_id: i64,
        request: &CancellationRequest,
        target: CancellationTarget,
    ) -> Result<i64, ImportError> {
        let mut state = self.state();
        let id = state.next_id();
        state.cancellations.push(StoredCancellation {
            id,
            company_id,
            numero: request.header.numero.clone(),
            target,
        });
        Ok(id)
    }

    async fn credit_balance(
        &self,
        company_id: Option<i64>,
    ) -> Result<CreditBalance, ImportError> {
        let state = self.state();
        let owned = |d: &&StoredDocument| company_id.map_or(true, |id| d.company_id == id);
        Ok(CreditBalance::from_fields(
            state.restitutions.iter().filter(owned).map(|d| &d.fields),
            state.compensations.iter().filter(owned).map(|d| &d.fields),
        ))
    }
}
