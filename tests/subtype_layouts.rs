use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use perdcomp_import::extract::classify::Subtype;
use perdcomp_import::extract::extract_document;
use perdcomp_import::extract::fields::FieldSet;
use perdcomp_import::models::ExtractedDocument;
use std::str::FromStr;

const FORM: &str = "PEDIDO DE RESTITUIÇÃO, RESSARCIMENTO OU REEMBOLSO E DECLARAÇÃO DE COMPENSAÇÃO";
const NUMERO: &str = "12345.67890.123456.1.2.04-1234";
const INICIAL: &str = "11111.22222.333333.1.2.04-0001";

fn form(document: &str, credit: &str, body: &str) -> String {
    format!(
        "{FORM}\nPERDCOMP 4.8\nCNPJ 12.345.678/0001-95\n{NUMERO}\nDADOS INICIAIS\n\
Nome Empresarial\nACME LTDA\n\
Tipo de Documento\n{document}\nTipo de Crédito\n{credit}\n{body}"
    )
}

fn extract(text: &str, expected: Subtype) -> ExtractedDocument {
    let doc = extract_document("form.pdf", text).unwrap();
    assert_eq!(doc.subtype(), expected);
    assert_eq!(doc.header().numero, NUMERO);
    doc
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn assert_amount(fields: &FieldSet, name: &str, expected: &str) {
    assert_eq!(fields.decimal(name), Some(&dec(expected)), "{name}");
}

#[test]
fn restitution_payment_excess() {
    let text = form(
        "Pedido de Restituição",
        "Pagamento Indevido ou a Maior",
        "Data de Criação\n05/03/2024\nData de Transmissão\n06/03/2024\n\
PER/DCOMP Retificador\nNão\nCrédito de Sucedida\nTalvez\n\
Banco\n001\nAgência\n1234\n\
Valor Original do Crédito Inicial\n1.500,00\n\
2.345,67\nCrédito Original na Data da Entrega\n\
Valor do Pedido de Restituição\n2.000,00\n\
31/01/2024\nPeríodo de Apuração\n\
Código da Receita\n2362-01\n\
12,50\nValor dos Juros\n",
    );
    let doc = extract(&text, Subtype::RestitutionPaymentExcess);
    let fields = doc.fields();

    assert_eq!(fields.date("data_criacao"), date(2024, 3, 5));
    assert_eq!(fields.date("data_transmissao"), date(2024, 3, 6));
    assert_eq!(fields.text("tipo_documento"), Some("Pedido de Restituição"));
    assert_eq!(fields.flag("perdcomp_retificador"), Some(false));
    // 未知答案保持缺失
    assert_eq!(fields.flag("credito_sucedido"), None);
    assert!(fields.contains("credito_sucedido"));
    assert_eq!(fields.text("banco"), Some("001"));
    assert_eq!(fields.text("agencia"), Some("1234"));
    assert_amount(fields, "valor_original_do_credito_inicial", "1500.00");
    assert_amount(fields, "credito_original", "2345.67");
    assert_amount(fields, "valor_do_pedido_restituicao", "2000.00");
    assert_eq!(fields.date("periodo_de_apuracao_origem_credito"), date(2024, 1, 31));
    assert_eq!(fields.text("codigo_da_receita"), Some("2362-01"));
    assert_amount(fields, "valor_do_juros", "12.50");
}

#[test]
fn restitution_negative_balance_irpj() {
    let text = form(
        "Pedido de Restituição",
        "Saldo Negativo de IRPJ",
        "Forma de Tributação do Lucro\nLucro Real\n\
Forma de Apuração\nAnual\nExercício\n2024\n\
Data Inicial do Período\n01/01/2023\nData Final do Período\n31/12/2023\n\
Imposto Devido\n10.000,00\n\
Total das Parcelas de Composição do Crédito\n12.500,00\n\
Valor do Saldo Negativo\n2.500,00\n\
Valor do Pedido de Restituição\n2.400,00\n",
    );
    let doc = extract(&text, Subtype::RestitutionNegativeBalanceIrpj);
    let fields = doc.fields();

    assert_eq!(fields.text("forma_tributacao_lucro"), Some("Lucro Real"));
    assert_eq!(fields.text("forma_apuracao"), Some("Anual"));
    assert_eq!(fields.text("exercicio"), Some("2024"));
    assert_eq!(fields.date("data_inicial_periodo"), date(2023, 1, 1));
    assert_eq!(fields.date("data_final_periodo"), date(2023, 12, 31));
    assert_amount(fields, "imposto_devido", "10000.00");
    // 值在标签之后，而非上一行
    assert_amount(fields, "total_parcelas_composicao_credito", "12500.00");
    assert_amount(fields, "valor_do_saldo_negativo", "2500.00");
    assert_amount(fields, "valor_do_pedido_restituicao", "2400.00");
}

#[test]
fn restitution_negative_balance_csll() {
    let text = form(
        "Pedido de Restituição",
        "Saldo Negativo de CSLL",
        "Forma de Tributação no Período\nLucro Presumido\n\
CSLL Devida\n3.000,00\n\
3.600,00\nTotal das Parcelas de Composição do Crédito\n\
Valor do Saldo Negativo\n600,00\n\
550,00\nValor do Pedido de Restituição\n\
Crédito Oriundo de Ação Judicial\nSim\n",
    );
    let doc = extract(&text, Subtype::RestitutionNegativeBalanceCsll);
    let fields = doc.fields();

    assert_eq!(fields.text("forma_tributacao_lucro"), Some("Lucro Presumido"));
    assert_amount(fields, "imposto_devido", "3000.00");
    // CSLL 版式中这些值位于标签上一行
    assert_amount(fields, "total_parcelas_composicao_credito", "3600.00");
    assert_amount(fields, "valor_do_pedido_restituicao", "550.00");
    assert_amount(fields, "valor_do_saldo_negativo", "600.00");
    assert_eq!(fields.flag("credito_oriundo_de_acao_judicial"), Some(true));
}

#[test]
fn compensation_payment_excess() {
    let text = form(
        "Declaração de Compensação",
        "Pagamento Indevido ou a Maior",
        &format!(
            "N° do PER/DCOMP Inicial\n{INICIAL}\n\
N° PER/DCOMP Retificado\n22222.33333.444444.1.3.04-0002\n\
Selic Acumulada\n12,34%\n\
Valor Original do Crédito Inicial\n1.000,00\n\
900,00\nCrédito Original na Data da Entrega\n\
Crédito Atualizado\n1.011,06\n\
Total dos Débitos deste Documento\n800,00\n\
Total do Crédito Original Utilizado neste Documento\n700,00\n\
Saldo do Crédito Original\n200,00\n"
        ),
    );
    let doc = extract(&text, Subtype::CompensationPaymentExcess);
    let ExtractedDocument::Compensation(dcomp) = &doc else {
        panic!("expected a compensation declaration");
    };
    assert_eq!(dcomp.numero_perdcomp_inicial.as_deref(), Some(INICIAL));

    let fields = &dcomp.fields;
    assert_eq!(
        fields.text("numero_perdcomp_retificador"),
        Some("22222.33333.444444.1.3.04-0002")
    );
    assert_amount(fields, "selic_acumulada", "12.34");
    assert_amount(fields, "valor_original_do_credito_inicial", "1000.00");
    assert_amount(fields, "credito_original", "900.00");
    assert_amount(fields, "credito_atualizado", "1011.06");
    assert_amount(fields, "total_dos_debitos", "800.00");
    assert_amount(
        fields,
        "total_do_credito_original_utilizado_neste_documento",
        "700.00",
    );
    assert_amount(fields, "saldo_do_credito_original", "200.00");
}

#[test]
fn compensation_negative_balance_irpj() {
    let text = form(
        "Declaração de Compensação",
        "Saldo Negativo de IRPJ",
        "Forma de Tributação do Lucro\nLucro Real\n\
Imposto Devido\n8.000,00\n\
Total das Parcelas de Composição do Crédito\n9.000,00\n\
Valor do Saldo Negativo\n1.000,00\n\
Selic Acumulada\n5,00%\n\
Total dos débitos desta DCOMP\nPrincipal\nMulta\nJuros\nTotal\n7.654,32\n\
Total do Crédito Original Utilizado nesta DCOMP\n950,00\n",
    );
    let doc = extract(&text, Subtype::CompensationNegativeBalanceIrpj);
    let fields = doc.fields();

    assert_eq!(fields.text("forma_tributacao_lucro"), Some("Lucro Real"));
    assert_amount(fields, "imposto_devido", "8000.00");
    assert_amount(fields, "total_parcelas_composicao_credito", "9000.00");
    assert_amount(fields, "valor_saldo_negativo", "1000.00");
    assert_amount(fields, "selic_acumulada", "5.00");
    // 没有文档合计时，取债务表头下方第五行的合计
    assert_amount(fields, "total_dos_debitos", "7654.32");
    assert_amount(
        fields,
        "total_do_credito_original_utilizado_neste_documento",
        "950.00",
    );
}

#[test]
fn compensation_negative_balance_irpj_prefers_document_total() {
    let text = form(
        "Declaração de Compensação",
        "Saldo Negativo de IRPJ",
        "Total dos Débitos deste Documento\n1.234,00\n\
Total dos débitos desta DCOMP\nPrincipal\nMulta\nJuros\nTotal\n7.654,32\n",
    );
    let doc = extract(&text, Subtype::CompensationNegativeBalanceIrpj);
    assert_amount(doc.fields(), "total_dos_debitos", "1234.00");
}

#[test]
fn compensation_negative_balance_csll() {
    let text = form(
        "Declaração de Compensação",
        "Saldo Negativo de CSLL",
        "Forma de Tributação no Período\nLucro Real\n\
CSLL Devida\n4.000,00\n\
4.500,00\nTotal das Parcelas de Composição do Crédito\n\
Valor do Saldo Negativo\n500,00\n\
4.321,00\nSelic Acumulada\n5,67%\n\
Total dos débitos desta DCOMP\n480,00\n\
Total do Crédito Original Utilizado nesta DCOMP\n450,00\n",
    );
    let doc = extract(&text, Subtype::CompensationNegativeBalanceCsll);
    let fields = doc.fields();

    assert_eq!(fields.text("forma_tributacao_lucro"), Some("Lucro Real"));
    assert_amount(fields, "imposto_devido", "4000.00");
    assert_amount(fields, "total_parcelas_composicao_credito", "4500.00");
    assert_amount(fields, "valor_saldo_negativo", "500.00");
    // 原始信用位于 Selic 标签的上一行
    assert_amount(fields, "credito_original", "4321.00");
    assert_amount(fields, "selic_acumulada", "5.67");
    assert_amount(fields, "total_dos_debitos", "480.00");
    assert_amount(
        fields,
        "total_do_credito_original_utilizado_neste_documento",
        "450.00",
    );
}

#[test]
fn cancellation_request() {
    let text = form(
        "Pedido de Cancelamento",
        "",
        &format!(
            "Número do PER/DCOMP a Cancelar\n{INICIAL}\n\
Data de Transmissão\n10/04/2024\n\
Pessoa Jurídica Extinta por Liquidação Voluntária\nNão\n\
Dados do Responsável pelo Preenchimento\nNome\nMARIA SILVA\nCPF\n123.456.789-00\n"
        ),
    );
    let doc = extract(&text, Subtype::Cancellation);
    let ExtractedDocument::Cancellation(request) = &doc else {
        panic!("expected a cancellation request");
    };
    assert_eq!(request.numero_a_cancelar.as_deref(), Some(INICIAL));

    let fields = &request.fields;
    assert_eq!(fields.date("data_transmissao"), date(2024, 4, 10));
    assert_eq!(
        fields.flag("pessoa_juridica_extinta_por_liquidacao_voluntaria"),
        Some(false)
    );
    assert_eq!(fields.text("nome_responsavel_pelo_preechimento"), Some("MARIA SILVA"));
    assert_eq!(
        fields.text("cpf_do_responsavel_pelo_preenchimento"),
        Some("123.456.789-00")
    );
    assert_eq!(fields.text("nome_responsavel_da_pessoa_juridica_perante_rfb"), None);
}
