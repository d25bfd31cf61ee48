use bigdecimal::BigDecimal;
use perdcomp_import::db::{MemoryRepository, Repository};
use perdcomp_import::extract::SourceText;
use perdcomp_import::models::{CancellationTarget, DebitReport, ImportReport};
use perdcomp_import::service::{available_balance, extract_batch, Importer};
use perdcomp_import::ImportError;
use std::str::FromStr;

const FORM: &str = "PEDIDO DE RESTITUIÇÃO, RESSARCIMENTO OU REEMBOLSO E DECLARAÇÃO DE COMPENSAÇÃO";

const ACME: &str = "12.345.678/0001-95";
const GLOBEX: &str = "98.765.432/0001-10";

const PER: &str = "11111.22222.333333.1.2.04-0001";
const DCOMP_A: &str = "22222.33333.444444.1.3.04-0002";
const DCOMP_B: &str = "33333.44444.555555.1.3.04-0003";
const MISSING_PER: &str = "99999.88888.777777.1.2.04-0009";

fn identity(cnpj: &str, numero: &str, nome: &str) -> String {
    format!("{FORM}\nPERDCOMP 4.8\nCNPJ {cnpj}\n{numero}\nDADOS INICIAIS\nNome Empresarial\n{nome}\n")
}

fn restitution(numero: &str, credit: &str) -> String {
    format!(
        "{}Tipo de Documento\nPedido de Restituição\n\
Tipo de Crédito\nPagamento Indevido ou a Maior\n\
Valor Original do Crédito Inicial\n{credit}\n",
        identity(ACME, numero, "ACME LTDA")
    )
}

fn compensation(cnpj: &str, numero: &str, inicial: &str, total: &str) -> String {
    format!(
        "{}Tipo de Documento\nDeclaração de Compensação\n\
Tipo de Crédito\nPagamento Indevido ou a Maior\n\
N° do PER/DCOMP Inicial\n{inicial}\n\
Total dos Débitos deste Documento\n{total}\n",
        identity(cnpj, numero, "EMPRESA")
    )
}

fn cancellation(numero: &str, target: &str) -> String {
    format!(
        "{}Tipo de Documento\nPedido de Cancelamento\n\
Número do PER/DCOMP a Cancelar\n{target}\n",
        identity(ACME, numero, "ACME LTDA")
    )
}

fn debit_block(ordinal: &str) -> String {
    format!(
        "{ordinal}. Débito IRPJ\nGrupo de Tributo IRPJ\n\
Código da Receita/Denominação 2362-01 - IRPJ\nPeríodo de Apuração 01/2024\n\
Principal 400,00\nMulta 0,00\nJuros 0,00\nTotal 400,00\n"
    )
}

fn source(name: &str, text: String) -> SourceText {
    SourceText::new(name, text)
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn sample_sources() -> Vec<SourceText> {
    vec![
        source("per.pdf", restitution(PER, "1.000,00")),
        source("dcomp-a.pdf", compensation(ACME, DCOMP_A, PER, "400,00")),
        source("dcomp-b.pdf", compensation(GLOBEX, DCOMP_B, MISSING_PER, "150,00")),
        source(
            "canc-per.pdf",
            cancellation("44444.55555.666666.1.8.04-0004", PER),
        ),
        source(
            "canc-unknown.pdf",
            cancellation("55555.66666.777777.1.8.04-0005", "00000.00000.000000.0.0.00-0000"),
        ),
        source(
            "no-cnpj.pdf",
            restitution("66666.77777.888888.1.2.04-0006", "10,00").replace(ACME, "-"),
        ),
    ]
}

async fn import(importer: &Importer<MemoryRepository>) -> ImportReport {
    let batch = extract_batch(&sample_sources());
    let mut report = ImportReport::default();
    importer.persist(&batch, &mut report).await;
    report
}

#[tokio::test]
async fn persists_in_dependency_order() {
    let importer = Importer::new(MemoryRepository::new());
    let report = import(&importer).await;

    assert_eq!(report.restitutions_created, 1);
    assert_eq!(report.compensations_created, 2);
    assert_eq!(report.cancellations_created, 1);
    // 缺少 CNPJ 的文件和无法解析的撤销申请
    assert_eq!(report.documents_skipped, 2);
    assert_eq!(report.documents_by_subtype["dcomp pagamento indevido ou a maior"], 2);
    assert_eq!(report.documents_by_subtype["pedido de cancelamento"], 2);
}

#[tokio::test]
async fn missing_originating_request_becomes_stub() {
    let importer = Importer::new(MemoryRepository::new());
    let report = import(&importer).await;
    let repo = importer.repository();

    assert_eq!(report.stubs_created, vec![MISSING_PER.to_string()]);

    let stub = repo.restitution(MISSING_PER).unwrap();
    assert!(stub.is_stub());
    let globex = repo
        .companies()
        .into_iter()
        .find(|c| c.cnpj == "98765432000110")
        .unwrap();
    assert_eq!(stub.company_id, globex.id);
    assert_eq!(repo.compensation(DCOMP_B).unwrap().parent_id, Some(stub.id));

    let per = repo.restitution(PER).unwrap();
    assert!(!per.is_stub());
    assert_eq!(repo.compensation(DCOMP_A).unwrap().parent_id, Some(per.id));
}

#[tokio::test]
async fn cancellation_points_at_exactly_one_document() {
    let importer = Importer::new(MemoryRepository::new());
    import(&importer).await;
    let repo = importer.repository();

    let per = repo.restitution(PER).unwrap();
    let cancellations = repo.cancellations();
    assert_eq!(cancellations.len(), 1);
    assert_eq!(cancellations[0].target, CancellationTarget::Restitution(per.id));

    let dcomp = repo.compensation(DCOMP_A).unwrap();
    assert_eq!(
        importer.resolve_cancellation_target(DCOMP_A).await.unwrap(),
        CancellationTarget::Compensation(dcomp.id)
    );
    assert!(matches!(
        importer.resolve_cancellation_target("nope").await,
        Err(ImportError::UnresolvedCancellation(_))
    ));
}

#[tokio::test]
async fn same_number_in_both_tables_is_ambiguous() {
    let repo = MemoryRepository::new();
    let company = repo.get_or_create_company("12345678000195", None).await.unwrap();
    repo.create_restitution_stub(company.id, PER).await.unwrap();

    let importer = Importer::new(repo);
    let batch = extract_batch(&[source("dcomp.pdf", compensation(ACME, PER, PER, "1,00"))]);
    let mut report = ImportReport::default();
    importer.persist(&batch, &mut report).await;
    assert_eq!(report.compensations_created, 1);

    assert!(matches!(
        importer.resolve_cancellation_target(PER).await,
        Err(ImportError::AmbiguousCancellation(_))
    ));
}

#[tokio::test]
async fn second_run_reports_duplicates() {
    let importer = Importer::new(MemoryRepository::new());
    import(&importer).await;
    let again = import(&importer).await;

    assert_eq!(again.restitutions_created, 0);
    assert_eq!(again.compensations_created, 0);
    assert!(again.stubs_created.is_empty());
    assert_eq!(importer.repository().restitutions().len(), 2);
    assert_eq!(importer.repository().companies().len(), 2);
}

#[tokio::test]
async fn balance_is_credit_minus_debits() {
    let importer = Importer::new(MemoryRepository::new());
    import(&importer).await;

    let balance = available_balance(importer.repository(), None).await.unwrap();
    assert_eq!(balance.total_credito, dec("1000.00"));
    assert_eq!(balance.total_debitos, dec("550.00"));
    assert_eq!(balance.saldo_disponivel, dec("450.00"));
}

#[tokio::test]
async fn balance_per_company() {
    let importer = Importer::new(MemoryRepository::new());
    import(&importer).await;
    let repo = importer.repository();

    let acme = available_balance(repo, Some(ACME)).await.unwrap();
    assert_eq!(acme.total_credito, dec("1000.00"));
    assert_eq!(acme.total_debitos, dec("400.00"));
    assert_eq!(acme.saldo_disponivel, dec("600.00"));

    // 只有占位 PER，没有信用
    let globex = available_balance(repo, Some("98765432000110")).await.unwrap();
    assert_eq!(globex.total_credito, dec("0"));
    assert_eq!(globex.total_debitos, dec("150.00"));
    assert_eq!(globex.saldo_disponivel, dec("-150.00"));

    assert!(matches!(
        available_balance(repo, Some("11.111.111/0001-11")).await,
        Err(ImportError::UnknownCompany(cnpj)) if cnpj == "11111111000111"
    ));
}

#[tokio::test]
async fn debit_lines_are_unique_and_linked() {
    let importer = Importer::new(MemoryRepository::new());
    import(&importer).await;

    let text = format!(
        "{}{}{}",
        compensation(ACME, DCOMP_A, PER, "400,00"),
        debit_block("001"),
        debit_block("002")
    );
    let orphan = format!(
        "{}{}",
        identity(ACME, "77777.88888.999999.1.3.04-0007", "ACME LTDA"),
        debit_block("001")
    );
    let sources = vec![
        source("dcomp-a.pdf", text),
        source("orphan.pdf", orphan),
        source("broken.pdf", "sem identificação".to_string()),
    ];

    let mut report = DebitReport::default();
    importer.import_debit_sources(&sources, &mut report).await;

    assert_eq!(report.files_read, 3);
    assert_eq!(report.documents_skipped, 1);
    assert_eq!(report.debits_found, 3);
    assert_eq!(report.debits_created, 2);
    // 同一声明中 (dcomp, 税种组, 收入代码, 期间) 重复
    assert_eq!(report.debits_skipped, 1);
    assert_eq!(report.debits_linked, 1);

    let repo = importer.repository();
    let dcomp = repo.compensation(DCOMP_A).unwrap();
    let linked = repo.links();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].0, dcomp.id);

    let debit = repo
        .debits()
        .into_iter()
        .find(|d| d.id == linked[0].1)
        .unwrap();
    assert_eq!(debit.line.fields.decimal("valor_total"), Some(&dec("400.00")));
    assert_eq!(debit.line.cnpj, "12345678000195");
}
