use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::NaiveDate;
use intake_config::{EmptyInboxPolicy, Layout, Settings};
use intake_core::{digits_only, CellValue, RecordBatch, REQUIRED_COLUMNS};
use intake_io::{report, xlsx};
use intake_recon::{
    bootstrap, pending_files, reconcile, submit, DriverError, FileOutcome, Journal, Readiness,
    Segment, SkipReason, SubmitOutcome,
};
use proptest::prelude::*;
use tempfile::{tempdir, TempDir};

const HEADER: &str = "Nome,CPF,Data,Valor,Status,Tipo de Contrato\n";

fn ready_root() -> (TempDir, Layout) {
    let dir = tempdir().unwrap();
    let layout = Settings::default().layout(dir.path());
    assert!(matches!(bootstrap(&layout).unwrap(), Readiness::Created(_)));
    (dir, layout)
}

fn run(layout: &Layout) -> intake_recon::RunReport {
    let mut journal = Journal::open(&layout.log_file).unwrap();
    let report = reconcile(layout, EmptyInboxPolicy::Warn, &mut journal).unwrap();
    journal.finish().unwrap();
    report
}

fn text(s: &str) -> CellValue {
    CellValue::text(s)
}

fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

// -------------------------------------------------------------------------
// End-to-end per source format
// -------------------------------------------------------------------------

#[test]
fn delinquent_csv_end_to_end() {
    let (_dir, layout) = ready_root();
    fs::write(
        layout.inbox.join("clientes.csv"),
        format!(
            "{HEADER}\
             joão silva,123.456.789-09,2025-01-10,1500,Inadimplente,Mensal\n\
             joão silva,123.456.789-09,2025-01-10,1500,Inadimplente,Mensal\n\
             maria souza,123.456,2024-03-02,2500,Inadimplente,Anual\n\
             pedro lima,987.654.321-00,2025-02-01,900,Inadimplente,Mensal\n\
             ana costa,111.222.333-44,2025-05-05,9000,Cancelado,Anual\n"
        ),
    )
    .unwrap();

    let report = run(&layout);
    let file = report.file("clientes.csv").unwrap();
    let FileOutcome::Processed { segment, report: out } = &file.outcome else {
        panic!("expected processed, got {:?}", file.outcome);
    };
    assert_eq!(*segment, Segment::Delinquent);
    assert_eq!(out.active_rows, 2);
    assert_eq!(out.highlighted, 1);
    assert!(out.id_column_found);

    let organized = xlsx::import(&layout.organized.join("clientes.xlsx")).unwrap();
    assert_eq!(organized.columns(), REQUIRED_COLUMNS);
    assert_eq!(organized.len(), 2);
    assert_eq!(organized.get(0, "Nome"), Some(&text("João Silva")));
    assert_eq!(organized.get(0, "CPF"), Some(&text("12345678909")));
    assert_eq!(organized.get(1, "CPF"), Some(&text("123456")));
    assert_eq!(
        organized.get(0, "Data").and_then(CellValue::as_datetime),
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap().and_hms_opt(0, 0, 0)
    );

    let summary = xlsx::import(&layout.reports.join("clientes.xlsx")).unwrap();
    assert_eq!(summary.columns(), &["Tipo de Contrato", "Qtd Clientes", "Valor Total (R$)"]);
    assert_eq!(summary.len(), 2);
    assert_eq!(summary.get(0, "Tipo de Contrato"), Some(&text("Anual")));
    assert_eq!(summary.get(0, "Valor Total (R$)"), Some(&CellValue::Number(2500.0)));
    assert_eq!(summary.get(1, "Tipo de Contrato"), Some(&text("Mensal")));
    assert_eq!(summary.get(1, "Qtd Clientes"), Some(&CellValue::Number(1.0)));
}

#[test]
fn cancelled_json_end_to_end() {
    let (_dir, layout) = ready_root();
    fs::write(
        layout.inbox.join("cancelamentos.json"),
        r#"[
            {"Nome": "ana", "CPF": "111.222.333-44", "Data": "2025-04-01", "Valor": 4500, "Status": "Cancelado", "Tipo de Contrato": "A"},
            {"Nome": "bia", "CPF": "222.333.444-55", "Data": "2025-04-02", "Valor": 200, "Status": "Cancelado", "Tipo de Contrato": "B"},
            {"Nome": "caio", "CPF": "333.444.555-66", "Data": "2024-12-31", "Valor": 9000, "Status": "Cancelado", "Tipo de Contrato": "A"},
            {"Nome": "davi", "CPF": "444.555.666-77", "Data": "2025-07-01", "Valor": 8000, "Status": "Ativo", "Tipo de Contrato": "A"}
        ]"#,
    )
    .unwrap();

    let report = run(&layout);
    let outcome = &report.file("cancelamentos.json").unwrap().outcome;
    assert!(matches!(
        outcome,
        FileOutcome::Processed { segment: Segment::Cancelled, report } if report.active_rows == 1
    ));

    let organized = xlsx::import(&layout.organized.join("cancelamentos.xlsx")).unwrap();
    assert_eq!(organized.get(0, "Nome"), Some(&text("Ana")));
}

#[test]
fn xlsx_source_end_to_end() {
    let (_dir, layout) = ready_root();
    let date = |y, m, d| {
        CellValue::DateTime(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
    };
    let source = RecordBatch::with_rows(
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        vec![
            vec![text("ana"), text("12345678909"), date(2025, 1, 1), CellValue::Number(100.0), text("Inadimplente"), text("A")],
            vec![text("bia"), text("1234567890"), date(2025, 1, 2), CellValue::Number(2000.0), text("Inadimplente"), text("A")],
            vec![text("caio"), text("123-4"), date(2025, 1, 3), CellValue::Number(3000.0), text("Inadimplente"), text("B")],
        ],
    );
    xlsx::export(&source, &layout.inbox.join("planilha.xlsx")).unwrap();

    let report = run(&layout);
    let FileOutcome::Processed { report: out, .. } = &report.file("planilha.xlsx").unwrap().outcome
    else {
        panic!("planilha.xlsx was not processed");
    };
    assert_eq!(out.active_rows, 2);
    assert_eq!(out.highlighted, 2);
    assert_eq!(out.summary_rows, 2);
}

#[test]
fn month_first_dates_are_processed() {
    let (_dir, layout) = ready_root();
    fs::write(
        layout.inbox.join("b.csv"),
        format!("{HEADER}ana,123.456.789-09,12/31/2025,5000,Cancelado,Mensal\n"),
    )
    .unwrap();

    let report = run(&layout);
    let outcome = &report.file("b.csv").unwrap().outcome;
    assert!(
        matches!(
            outcome,
            FileOutcome::Processed { segment: Segment::Cancelled, report } if report.active_rows == 1
        ),
        "got {outcome:?}"
    );

    let organized = xlsx::import(&layout.organized.join("b.xlsx")).unwrap();
    assert_eq!(
        organized.get(0, "Data").and_then(CellValue::as_datetime),
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap().and_hms_opt(0, 0, 0)
    );
}

#[test]
fn extra_columns_keep_their_position() {
    let (_dir, layout) = ready_root();
    fs::write(
        layout.inbox.join("extras.csv"),
        "Obs,Nome,CPF,Data,Valor,Status,Tipo de Contrato,Fim\n\
         ligar,ana,123.456.789-09,2025-01-10,1500,Inadimplente,Mensal,sim\n\
         nada,bia,123.456,2025-01-11,2500,Inadimplente,Anual,nao\n",
    )
    .unwrap();

    let report = run(&layout);
    let FileOutcome::Processed { report: out, .. } = &report.file("extras.csv").unwrap().outcome
    else {
        panic!("extras.csv was not processed");
    };
    assert_eq!(out.active_rows, 2);
    assert_eq!(out.highlighted, 1);

    let organized = xlsx::import(&layout.organized.join("extras.xlsx")).unwrap();
    assert_eq!(
        organized.columns(),
        &["Obs", "Nome", "CPF", "Data", "Valor", "Status", "Tipo de Contrato", "Fim"]
    );
    assert_eq!(organized.get(0, "Obs"), Some(&text("ligar")));
    assert_eq!(organized.get(0, "CPF"), Some(&text("12345678909")));
    assert_eq!(organized.get(1, "Fim"), Some(&text("nao")));
}

// -------------------------------------------------------------------------
// Run-level behavior
// -------------------------------------------------------------------------

#[test]
fn second_run_changes_nothing() {
    let (_dir, layout) = ready_root();
    fs::write(
        layout.inbox.join("lote.csv"),
        format!("{HEADER}ana,123.456.789-09,2025-01-10,1500,Inadimplente,Mensal\n"),
    )
    .unwrap();

    let first = run(&layout);
    assert!(first.file("lote.csv").unwrap().outcome.is_processed());

    let organized = layout.organized.join("lote.xlsx");
    let summary = layout.reports.join("lote.xlsx");
    let (organized_bytes, summary_bytes) = (fs::read(&organized).unwrap(), fs::read(&summary).unwrap());
    let (organized_mtime, summary_mtime) = (mtime(&organized), mtime(&summary));

    let second = run(&layout);
    assert_eq!(
        second.file("lote.csv").and_then(|f| f.outcome.skip_reason()),
        Some(SkipReason::AlreadyProcessed)
    );
    assert_eq!(fs::read(&organized).unwrap(), organized_bytes);
    assert_eq!(fs::read(&summary).unwrap(), summary_bytes);
    assert_eq!(mtime(&organized), organized_mtime);
    assert_eq!(mtime(&summary), summary_mtime);
    assert!(pending_files(&layout).unwrap().is_empty());
}

#[test]
fn missing_column_writes_no_output() {
    let (_dir, layout) = ready_root();
    fs::write(
        layout.inbox.join("sem_status.csv"),
        "Nome,CPF,Data,Valor,Tipo de Contrato\nana,1,2025-01-01,10,A\n",
    )
    .unwrap();

    let report = run(&layout);
    assert_eq!(
        report.file("sem_status.csv").and_then(|f| f.outcome.skip_reason()),
        Some(SkipReason::MissingColumns)
    );
    assert!(fs::read_dir(&layout.organized).unwrap().next().is_none());
    assert!(!layout.reports.join("sem_status.xlsx").exists());
}

#[test]
fn numeric_ids_are_skipped_as_already_normalized() {
    let (_dir, layout) = ready_root();
    fs::write(
        layout.inbox.join("reenvio.csv"),
        format!("{HEADER}Ana,12345678909,2025-01-10,1500,Inadimplente,Mensal\n"),
    )
    .unwrap();

    let report = run(&layout);
    assert_eq!(
        report.file("reenvio.csv").and_then(|f| f.outcome.skip_reason()),
        Some(SkipReason::AlreadyNormalized)
    );
    let log = fs::read_to_string(&layout.log_file).unwrap();
    assert!(log.contains("already analysed"));
}

#[test]
fn empty_inbox_policies() {
    let (_dir, layout) = ready_root();

    let mut journal = Journal::in_memory();
    let report = reconcile(&layout, EmptyInboxPolicy::Warn, &mut journal).unwrap();
    assert!(report.is_empty());
    assert_eq!(journal.count_at_least(log::Level::Warn), 1);

    let mut journal = Journal::in_memory();
    let err = reconcile(&layout, EmptyInboxPolicy::Abort, &mut journal).unwrap_err();
    assert!(matches!(err, DriverError::EmptyInbox(p) if p == layout.inbox));
}

#[test]
fn log_file_accumulates_across_runs() {
    let (_dir, layout) = ready_root();
    fs::write(layout.inbox.join("x.txt"), "").unwrap();

    run(&layout);
    let after_first = fs::read_to_string(&layout.log_file).unwrap().lines().count();
    run(&layout);
    let after_second = fs::read_to_string(&layout.log_file).unwrap().lines().count();

    assert!(after_first > 0);
    assert!(after_second > after_first);
}

#[test]
fn bootstrap_is_ready_on_second_call() {
    let (_dir, layout) = ready_root();
    assert_eq!(bootstrap(&layout).unwrap(), Readiness::Ready);
}

#[test]
fn duplicate_submit_keeps_first_copy() {
    let (dir, layout) = ready_root();
    let upload = dir.path().join("envio.csv");
    let first = format!("{HEADER}ana,123.456.789-09,2025-01-10,1500,Inadimplente,Mensal\n");
    fs::write(&upload, &first).unwrap();
    assert!(matches!(submit(&upload, &layout).unwrap(), SubmitOutcome::Accepted(_)));

    fs::write(&upload, format!("{first}bia,987.654.321-00,2025-01-11,1200,Inadimplente,Anual\n")).unwrap();
    assert!(matches!(submit(&upload, &layout).unwrap(), SubmitOutcome::Duplicate(_)));
    assert_eq!(fs::read_to_string(layout.inbox.join("envio.csv")).unwrap(), first);
}

// -------------------------------------------------------------------------
// ID normalization properties
// -------------------------------------------------------------------------

proptest! {
    #[test]
    fn digits_only_keeps_digits_in_order(s in "[0-9.\\- /a-z]{0,30}") {
        let expected: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        prop_assert_eq!(digits_only(&s), expected);
    }

    #[test]
    fn formatted_eleven_digit_ids_are_well_formed(d in "[0-9]{11}") {
        let formatted = format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11]);
        prop_assert!(!report::is_malformed_id(&formatted));
        prop_assert_eq!(digits_only(&formatted), d);
    }

    #[test]
    fn other_digit_counts_are_malformed(d in "[0-9]{0,20}") {
        prop_assume!(d.len() != 11);
        prop_assert!(report::is_malformed_id(&d));
    }
}
