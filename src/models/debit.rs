use crate::extract::fields::FieldSet;
use std::fmt;

/// DCOMP 的一条债务行（perdcomp_dcompdebitos）
#[derive(Debug, Clone, PartialEq)]
pub struct DebitLine {
    pub cnpj: String,
    pub numero_dcomp: String,
    pub nome_empresarial: Option<String>,
    /// Marker text, e.g. `001. Débito Compensado`.
    pub marker: String,
    pub fields: FieldSet,
}

impl DebitLine {
    pub fn key(&self) -> DebitKey {
        DebitKey {
            numero_dcomp: self.numero_dcomp.clone(),
            grupo_tributo: self.fields.text("grupo_tributo").map(str::to_string),
            codigo_da_receita_denominacao: self
                .fields
                .text("codigo_da_receita_denominacao")
                .map(str::to_string),
            periodo_da_apuracao: self.fields.text("periodo_da_apuracao").map(str::to_string),
        }
    }
}

/// 债务行的唯一键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DebitKey {
    pub numero_dcomp: String,
    pub grupo_tributo: Option<String>,
    pub codigo_da_receita_denominacao: Option<String>,
    pub periodo_da_apuracao: Option<String>,
}

impl DebitKey {
    /// SQL 唯一约束忽略含 NULL 列的行
    pub fn is_complete(&self) -> bool {
        self.grupo_tributo.is_some()
            && self.codigo_da_receita_denominacao.is_some()
            && self.periodo_da_apuracao.is_some()
    }
}

impl fmt::Display for DebitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{} / {} / {} / {}",
            self.numero_dcomp,
            part(&self.grupo_tributo),
            part(&self.codigo_da_receita_denominacao),
            part(&self.periodo_da_apuracao)
        )
    }
}
