//! 将 DCOMP 拆分为债务行
//!
//! 每行以 `NNN. Débito ...` 标记开始，子字段从标记处向后查找，
//! 标记之后的第一次出现为准

use super::fields::Locator::Pattern;
use super::fields::{extract_fields, CompiledField, FieldSpec};
use crate::models::{DebitLine, DocumentHeader};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{3}\.\s+Débito\s+[^\n]+)").expect("debit marker must compile"));

const DEBIT_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("grupo_tributo", &[Pattern(r"Grupo de Tributo\s+([^\n]+)")]),
    FieldSpec::text(
        "codigo_da_receita_denominacao",
        &[Pattern(r"Código da Receita/Denominação\s+([^\n]+)")],
    ),
    FieldSpec::text("periodo_da_apuracao", &[Pattern(r"Período de Apuração\s+([^\n]+)")]),
    FieldSpec::text("periodicidade", &[Pattern(r"Periodicidade DCTFWeb\s+([^\n]+)")]),
    FieldSpec::date(
        "data_de_vencimento_do_tributo_quota",
        &[Pattern(r"Data de Vencimento do Tributo/Quota\s+([^\n]+)")],
    ),
    FieldSpec::text("periocidade_dctf_web", &[Pattern(r"Periodicidade DCTFWeb\s+([^\n]+)")]),
    FieldSpec::text(
        "periodo_apuracao_dctfweb",
        &[Pattern(r"([^\n]+)\nPeríodo Apuração DCTFWeb")],
    ),
    FieldSpec::decimal("valor_principal", &[Pattern(r"Principal\s+([\d.,]+)")]),
    FieldSpec::decimal("valor_multa", &[Pattern(r"Multa\s+([\d.,]+)")]),
    FieldSpec::decimal("valor_juros", &[Pattern(r"Juros\s+([\d.,]+)")]),
    FieldSpec::decimal("valor_total", &[Pattern(r"Total\s+([\d.,]+)")]),
];

static COMPILED: Lazy<Vec<CompiledField>> =
    Lazy::new(|| DEBIT_FIELDS.iter().map(CompiledField::compile).collect());

/// 每个标记一条 `DebitLine`，按文档顺序
pub fn split_debit_lines(text: &str, header: &DocumentHeader) -> Vec<DebitLine> {
    MARKER
        .find_iter(text)
        .map(|marker| {
            let window = &text[marker.start()..];
            let fields = extract_fields(window, &COMPILED);
            debug!(
                "{}: {} ({} of {} fields)",
                header.numero,
                marker.as_str().trim(),
                fields.present(),
                fields.len()
            );
            DebitLine {
                cnpj: header.cnpj.clone(),
                numero_dcomp: header.numero.clone(),
                nome_empresarial: header.nome_empresarial.clone(),
                marker: marker.as_str().trim().to_string(),
                fields,
            }
        })
        .collect()
}
