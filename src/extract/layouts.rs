//! 声明式提取表，每个 PER/DCOMP 子类型一张
//!
//! 每个布局是有序的分段列表，每段是 `(列名, 定位器, 类型)` 行，
//! 标签沿用 Receita Federal 打印版式，包括不同信用类型之间的差异

use super::classify::Subtype;
use super::fields::Locator::{After, Before, LinesBelow, Pattern};
use super::fields::{CompiledField, FieldSpec};
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const CNPJ: FieldSpec = FieldSpec::text(
    "cnpj",
    &[
        Pattern(r"PERDCOMP\s+\d+\.\d+\s+CNPJ\s+(\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2})"),
        Pattern(r"CNPJ\s+(\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2})"),
    ],
);

pub const NUMERO_PERDCOMP: FieldSpec = FieldSpec::text(
    "numero_perdcomp",
    &[Pattern(r"(\d{5}\.\d{5}\.\d{6}\.\d\.\d\.\d{2}-\d{4})\nDADOS INICIAIS")],
);

pub const VERSAO_PERDCOMP: FieldSpec =
    FieldSpec::text("versao_perdcomp", &[Pattern(r"PERDCOMP\s+(\d+\.\d+)")]);

pub const NOME_EMPRESARIAL: FieldSpec =
    FieldSpec::text("nome_empresarial", &[After("Nome Empresarial")]);

pub const PERDCOMP_INICIAL: FieldSpec =
    FieldSpec::text("numero_perdcomp_inicial", &[After("N° do PER/DCOMP Inicial")]);

pub const PERDCOMP_A_CANCELAR: FieldSpec = FieldSpec::text(
    "numero_perdcomp_a_cancelar",
    &[After("Número do PER/DCOMP a Cancelar")],
);

const DOCUMENT_DATA: &[FieldSpec] = &[
    FieldSpec::date("data_criacao", &[After("Data de Criação")]),
    FieldSpec::date("data_transmissao", &[After("Data de Transmissão")]),
    FieldSpec::text("tipo_documento", &[After("Tipo de Documento")]),
    FieldSpec::text("tipo_credito", &[After("Tipo de Crédito")]),
];

const RETIFICADOR: &[FieldSpec] = &[FieldSpec::flag(
    "perdcomp_retificador",
    &[After("PER/DCOMP Retificador")],
)];

const NUMERO_RETIFICADO: &[FieldSpec] = &[FieldSpec::text(
    "numero_perdcomp_retificador",
    &[After("N° PER/DCOMP Retificado")],
)];

const ACAO_JUDICIAL: &[FieldSpec] = &[FieldSpec::flag(
    "credito_oriundo_de_acao_judicial",
    &[After("Crédito Oriundo de Ação Judicial")],
)];

const BANK_ACCOUNT: &[FieldSpec] = &[
    FieldSpec::text("tipo_da_conta", &[After("Tipo da Conta")]),
    FieldSpec::text("banco", &[After("Banco")]),
    FieldSpec::text("agencia", &[After("Agência")]),
    FieldSpec::text("conta", &[After("N° Conta")]),
];

const QUALIFICACAO: &[FieldSpec] = &[FieldSpec::text(
    "qualificacao",
    &[After("Qualificação do Contribuinte")],
)];

const LIQUIDACAO: &[FieldSpec] = &[FieldSpec::flag(
    "pessoa_juridica_extinta_por_liquidacao_voluntaria",
    &[After("Pessoa Jurídica Extinta por Liquidação Voluntária")],
)];

const RESPONSIBLES: &[FieldSpec] = &[
    FieldSpec::text(
        "nome_responsavel_da_pessoa_juridica_perante_rfb",
        &[Pattern(
            r"Dados do Responsável da Pessoa Jurídica Perante a RFB\nNome\n([^\n]+)",
        )],
    ),
    FieldSpec::text(
        "cpf_do_responsavel_da_pessoa_juridica_perante_a_rfb",
        &[Pattern(
            r"Dados do Responsável da Pessoa Jurídica Perante a RFB\nNome\n[^\n]+\nCPF\n([^\n]+)",
        )],
    ),
    FieldSpec::text(
        "nome_responsavel_pelo_preechimento",
        &[Pattern(r"Dados do Responsável pelo Preenchimento\nNome\n([^\n]+)")],
    ),
    FieldSpec::text(
        "cpf_do_responsavel_pelo_preenchimento",
        &[Pattern(
            r"Dados do Responsável pelo Preenchimento\nNome\n[^\n]+\nCPF\n([^\n]+)",
        )],
    ),
];

const PRIOR_DISCLOSURE: &[FieldSpec] = &[
    FieldSpec::flag(
        "informado_em_processo_admistrativo_anterior",
        &[
            After("Informado em Processo Administrativo Anterior"),
            After("Informado em Processo Administrativo anterior"),
        ],
    ),
    FieldSpec::flag(
        "informado_em_outro_perdcomp",
        &[After("Informado em Outro PER/DCOMP")],
    ),
];

const SITUACAO_ESPECIAL: &[FieldSpec] = &[FieldSpec::text(
    "situacao_especial_do_titular_credito",
    &[After("Situação Especial do Titular do Crédito")],
)];

const SUCEDIDA: &[FieldSpec] = &[FieldSpec::flag(
    "credito_sucedido",
    &[After("Crédito de Sucedida")],
)];

const SELIC: &[FieldSpec] = &[FieldSpec::decimal(
    "selic_acumulada",
    &[After("Selic Acumulada")],
)];

const CREDITO_INICIAL: &[FieldSpec] = &[FieldSpec::decimal(
    "valor_original_do_credito_inicial",
    &[After("Valor Original do Crédito Inicial")],
)];

const CREDITO_ORIGINAL: &[FieldSpec] = &[FieldSpec::decimal(
    "credito_original",
    &[Before("Crédito Original na Data da Entrega")],
)];

const PAYMENT_ORIGIN: &[FieldSpec] = &[
    FieldSpec::date(
        "periodo_de_apuracao_origem_credito",
        &[Before("Período de Apuração")],
    ),
    FieldSpec::text(
        "cnpj_do_pagamento_origem_credito",
        &[Before("CNPJ do Pagamento")],
    ),
    FieldSpec::text("codigo_da_receita", &[After("Código da Receita")]),
    FieldSpec::text("grupo_do_tributo", &[After("Grupo de Tributo")]),
    FieldSpec::date("data_de_arrecadacao", &[After("Data de Arrecadação")]),
    FieldSpec::decimal("valor_do_principal", &[After("Valor do Principal")]),
    FieldSpec::decimal("valor_da_multa", &[After("Valor da Multa")]),
    FieldSpec::decimal("valor_do_juros", &[Before("Valor dos Juros")]),
    FieldSpec::decimal("valor_total_origem_credito", &[After("Valor Total")]),
];

const TAX_PERIOD: &[FieldSpec] = &[
    FieldSpec::text("forma_apuracao", &[After("Forma de Apuração")]),
    FieldSpec::text("exercicio", &[After("Exercício")]),
    FieldSpec::date("data_inicial_periodo", &[After("Data Inicial do Período")]),
    FieldSpec::date("data_final_periodo", &[After("Data Final do Período")]),
];

const FORMA_TRIBUTACAO_IRPJ: &[FieldSpec] = &[FieldSpec::text(
    "forma_tributacao_lucro",
    &[After("Forma de Tributação do Lucro")],
)];

const FORMA_TRIBUTACAO_CSLL: &[FieldSpec] = &[FieldSpec::text(
    "forma_tributacao_lucro",
    &[After("Forma de Tributação no Período")],
)];

const FORMA_TRIBUTACAO_ANY: &[FieldSpec] = &[FieldSpec::text(
    "forma_tributacao_lucro",
    &[
        After("Forma de Tributação do Lucro"),
        After("Forma de Tributação no Período"),
    ],
)];

const IMPOSTO_DEVIDO_IRPJ: &[FieldSpec] = &[FieldSpec::decimal(
    "imposto_devido",
    &[After("Imposto Devido")],
)];

const IMPOSTO_DEVIDO_CSLL: &[FieldSpec] = &[FieldSpec::decimal(
    "imposto_devido",
    &[After("CSLL Devida")],
)];

const IMPOSTO_DEVIDO_ANY: &[FieldSpec] = &[FieldSpec::decimal(
    "imposto_devido",
    &[After("Imposto Devido"), After("CSLL Devida")],
)];

const PARCELAS_AFTER: &[FieldSpec] = &[FieldSpec::decimal(
    "total_parcelas_composicao_credito",
    &[After("Total das Parcelas de Composição do Crédito")],
)];

const PARCELAS_BEFORE: &[FieldSpec] = &[FieldSpec::decimal(
    "total_parcelas_composicao_credito",
    &[Before("Total das Parcelas de Composição do Crédito")],
)];

const SALDO_NEGATIVO_PER: &[FieldSpec] = &[FieldSpec::decimal(
    "valor_do_saldo_negativo",
    &[After("Valor do Saldo Negativo")],
)];

const SALDO_NEGATIVO_DCOMP: &[FieldSpec] = &[FieldSpec::decimal(
    "valor_saldo_negativo",
    &[After("Valor do Saldo Negativo")],
)];

const PEDIDO_AFTER: &[FieldSpec] = &[FieldSpec::decimal(
    "valor_do_pedido_restituicao",
    &[After("Valor do Pedido de Restituição")],
)];

const PEDIDO_BEFORE: &[FieldSpec] = &[FieldSpec::decimal(
    "valor_do_pedido_restituicao",
    &[Before("Valor do Pedido de Restituição")],
)];

const DCOMP_TOTALS_DOCUMENT: &[FieldSpec] = &[
    FieldSpec::decimal("credito_atualizado", &[After("Crédito Atualizado")]),
    FieldSpec::decimal(
        "total_dos_debitos",
        &[After("Total dos Débitos deste Documento")],
    ),
    FieldSpec::decimal(
        "total_do_credito_original_utilizado_neste_documento",
        &[After("Total do Crédito Original Utilizado neste Documento")],
    ),
    FieldSpec::decimal(
        "saldo_do_credito_original",
        &[After("Saldo do Crédito Original")],
    ),
];

const DCOMP_TOTALS_IRPJ: &[FieldSpec] = &[
    FieldSpec::decimal("credito_atualizado", &[After("Crédito Atualizado")]),
    FieldSpec::decimal(
        "total_dos_debitos",
        &[
            After("Total dos Débitos deste Documento"),
            LinesBelow { label: "Total dos débitos desta DCOMP", offset: 5 },
        ],
    ),
    FieldSpec::decimal(
        "total_do_credito_original_utilizado_neste_documento",
        &[After("Total do Crédito Original Utilizado nesta DCOMP")],
    ),
    FieldSpec::decimal(
        "saldo_do_credito_original",
        &[After("Saldo do Crédito Original")],
    ),
];

const DCOMP_TOTALS_CSLL: &[FieldSpec] = &[
    FieldSpec::decimal("credito_atualizado", &[After("Crédito Atualizado")]),
    FieldSpec::decimal(
        "total_dos_debitos",
        &[After("Total dos débitos desta DCOMP")],
    ),
    FieldSpec::decimal(
        "total_do_credito_original_utilizado_neste_documento",
        &[After("Total do Crédito Original Utilizado nesta DCOMP")],
    ),
    FieldSpec::decimal(
        "saldo_do_credito_original",
        &[After("Saldo do Crédito Original")],
    ),
];

const CREDITO_ORIGINAL_BEFORE_SELIC: &[FieldSpec] = &[FieldSpec::decimal(
    "credito_original",
    &[Pattern(r"([\d\.,]+)\nSelic Acumulada")],
)];

const RESTITUTION_PAYMENT_EXCESS: &[&[FieldSpec]] = &[
    DOCUMENT_DATA,
    RETIFICADOR,
    ACAO_JUDICIAL,
    BANK_ACCOUNT,
    QUALIFICACAO,
    LIQUIDACAO,
    RESPONSIBLES,
    PRIOR_DISCLOSURE,
    SITUACAO_ESPECIAL,
    SUCEDIDA,
    CREDITO_INICIAL,
    CREDITO_ORIGINAL,
    PEDIDO_AFTER,
    PAYMENT_ORIGIN,
];

const RESTITUTION_NEGATIVE_IRPJ: &[&[FieldSpec]] = &[
    DOCUMENT_DATA,
    RETIFICADOR,
    ACAO_JUDICIAL,
    BANK_ACCOUNT,
    QUALIFICACAO,
    LIQUIDACAO,
    RESPONSIBLES,
    PRIOR_DISCLOSURE,
    SUCEDIDA,
    FORMA_TRIBUTACAO_IRPJ,
    TAX_PERIOD,
    IMPOSTO_DEVIDO_IRPJ,
    PARCELAS_AFTER,
    SALDO_NEGATIVO_PER,
    CREDITO_ORIGINAL,
    PEDIDO_AFTER,
];

const RESTITUTION_NEGATIVE_CSLL: &[&[FieldSpec]] = &[
    DOCUMENT_DATA,
    RETIFICADOR,
    ACAO_JUDICIAL,
    BANK_ACCOUNT,
    QUALIFICACAO,
    LIQUIDACAO,
    RESPONSIBLES,
    PRIOR_DISCLOSURE,
    SUCEDIDA,
    FORMA_TRIBUTACAO_CSLL,
    TAX_PERIOD,
    IMPOSTO_DEVIDO_CSLL,
    PARCELAS_BEFORE,
    SALDO_NEGATIVO_PER,
    CREDITO_ORIGINAL,
    PEDIDO_BEFORE,
];

const COMPENSATION_PAYMENT_EXCESS: &[&[FieldSpec]] = &[
    DOCUMENT_DATA,
    RETIFICADOR,
    NUMERO_RETIFICADO,
    ACAO_JUDICIAL,
    QUALIFICACAO,
    LIQUIDACAO,
    RESPONSIBLES,
    PRIOR_DISCLOSURE,
    SITUACAO_ESPECIAL,
    SELIC,
    SUCEDIDA,
    CREDITO_INICIAL,
    CREDITO_ORIGINAL,
    DCOMP_TOTALS_DOCUMENT,
    PAYMENT_ORIGIN,
];

const COMPENSATION_NEGATIVE_IRPJ: &[&[FieldSpec]] = &[
    DOCUMENT_DATA,
    RETIFICADOR,
    NUMERO_RETIFICADO,
    ACAO_JUDICIAL,
    QUALIFICACAO,
    LIQUIDACAO,
    RESPONSIBLES,
    PRIOR_DISCLOSURE,
    SUCEDIDA,
    FORMA_TRIBUTACAO_IRPJ,
    TAX_PERIOD,
    SELIC,
    IMPOSTO_DEVIDO_ANY,
    PARCELAS_AFTER,
    SALDO_NEGATIVO_DCOMP,
    CREDITO_ORIGINAL,
    DCOMP_TOTALS_IRPJ,
];

const COMPENSATION_NEGATIVE_CSLL: &[&[FieldSpec]] = &[
    DOCUMENT_DATA,
    RETIFICADOR,
    NUMERO_RETIFICADO,
    ACAO_JUDICIAL,
    QUALIFICACAO,
    LIQUIDACAO,
    RESPONSIBLES,
    PRIOR_DISCLOSURE,
    SUCEDIDA,
    FORMA_TRIBUTACAO_ANY,
    TAX_PERIOD,
    SELIC,
    IMPOSTO_DEVIDO_ANY,
    PARCELAS_BEFORE,
    SALDO_NEGATIVO_DCOMP,
    CREDITO_ORIGINAL_BEFORE_SELIC,
    DCOMP_TOTALS_CSLL,
];

const CANCELLATION: &[&[FieldSpec]] = &[DOCUMENT_DATA, ACAO_JUDICIAL, LIQUIDACAO, RESPONSIBLES];

pub fn sections(subtype: Subtype) -> &'static [&'static [FieldSpec]] {
    match subtype {
        Subtype::RestitutionPaymentExcess => RESTITUTION_PAYMENT_EXCESS,
        Subtype::RestitutionNegativeBalanceIrpj => RESTITUTION_NEGATIVE_IRPJ,
        Subtype::RestitutionNegativeBalanceCsll => RESTITUTION_NEGATIVE_CSLL,
        Subtype::CompensationPaymentExcess => COMPENSATION_PAYMENT_EXCESS,
        Subtype::CompensationNegativeBalanceIrpj => COMPENSATION_NEGATIVE_IRPJ,
        Subtype::CompensationNegativeBalanceCsll => COMPENSATION_NEGATIVE_CSLL,
        Subtype::Cancellation => CANCELLATION,
    }
}

/// 所有子类型共有的标识字段：文档及其所属公司
pub struct IdentityFields {
    pub cnpj: CompiledField,
    pub numero: CompiledField,
    pub versao: CompiledField,
    pub nome_empresarial: CompiledField,
    pub perdcomp_inicial: CompiledField,
    pub perdcomp_a_cancelar: CompiledField,
}

pub static IDENTITY: Lazy<IdentityFields> = Lazy::new(|| IdentityFields {
    cnpj: CompiledField::compile(&CNPJ),
    numero: CompiledField::compile(&NUMERO_PERDCOMP),
    versao: CompiledField::compile(&VERSAO_PERDCOMP),
    nome_empresarial: CompiledField::compile(&NOME_EMPRESARIAL),
    perdcomp_inicial: CompiledField::compile(&PERDCOMP_INICIAL),
    perdcomp_a_cancelar: CompiledField::compile(&PERDCOMP_A_CANCELAR),
});

static COMPILED: Lazy<HashMap<Subtype, Vec<CompiledField>>> = Lazy::new(|| {
    Subtype::ALL
        .into_iter()
        .map(|subtype| {
            let fields = sections(subtype)
                .iter()
                .flat_map(|section| section.iter())
                .map(CompiledField::compile)
                .collect();
            (subtype, fields)
        })
        .collect()
});

/// 子类型的已编译字段表
pub fn layout(subtype: Subtype) -> &'static [CompiledField] {
    COMPILED.get(&subtype).map(Vec::as_slice).unwrap_or(&[])
}
