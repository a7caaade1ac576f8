use chrono::NaiveDate;
use nomina::browse::{ActiveFilters, NavOutcome};
use nomina::client::{PageRequest, StaticPages};
use nomina::console::{CreateLoteError, PageMove};
use nomina::error::{ExportError, ValidationError};
use nomina::lock::{ENABLE_EDIT_PROMPT, LockStage};
use nomina::models::Candado;
use nomina::notify::Severity;
use std::fs;

mod test_utils;
use test_utils::{HarnessBuilder, Reply, comprobante, empresa, lote};

fn export_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

#[tokio::test]
async fn loading_companies_selects_first_and_loads_its_collections() {
    let mut h = HarnessBuilder::new().build();

    let selected = h.console.load_empresas().await.unwrap();

    assert_eq!(selected.map(|e| e.secuencia), Some(1));
    assert_eq!(
        h.lotes.requests(),
        vec![PageRequest::query(Some(1), ActiveFilters::new())]
    );
    assert_eq!(h.comprobantes.fetch_count(), 1);
    assert_eq!(h.console.lotes().navigator().len(), 2);
}

#[tokio::test]
async fn company_navigation_crosses_page_boundaries() {
    let mut h = HarnessBuilder::new()
        .empresas(StaticPages::chain(vec![
            vec![empresa(1, "ACME"), empresa(2, "Beta")],
            vec![empresa(3, "Gamma")],
        ]))
        .build();
    h.console.load_empresas().await.unwrap();

    let step = h.console.next_empresa().await.unwrap();
    assert_eq!(step.map(|e| e.secuencia), Some(2));

    let step = h.console.next_empresa().await.unwrap();
    assert_eq!(step.map(|e| e.secuencia), Some(3));
    assert_eq!(h.console.empresas().page_number(), 2);

    // Last company overall: nothing further to move to.
    let step = h.console.next_empresa().await.unwrap();
    assert_eq!(step.map(|e| e.secuencia), Some(3));

    // Crossing back lands on the last record of the previous page.
    let step = h.console.prev_empresa().await.unwrap();
    assert_eq!(step.map(|e| e.secuencia), Some(2));
    assert_eq!(h.console.empresas().page_number(), 1);

    h.console.prev_empresa().await.unwrap();
    let step = h.console.prev_empresa().await.unwrap();
    assert_eq!(step.map(|e| e.secuencia), Some(1));
    assert_eq!(
        h.lotes.requests().last(),
        Some(&PageRequest::query(Some(1), ActiveFilters::new()))
    );
}

#[tokio::test]
async fn failed_company_page_is_reported_and_can_be_retried() {
    let mut h = HarnessBuilder::new()
        .empresas(
            StaticPages::chain(vec![
                vec![empresa(1, "ACME"), empresa(2, "Beta")],
                vec![empresa(3, "Gamma")],
            ])
            .failing_page(2),
        )
        .build();
    h.console.load_empresas().await.unwrap();
    h.console.next_empresa().await.unwrap();

    assert!(h.console.next_empresa().await.is_err());
    assert!(h.has("Error al cargar las empresas", Severity::Error));
    assert!(h.console.empresas().is_empty());
    assert_eq!(h.empresas.fetch_count(), 2);
    // The batches of the company still selected stay on screen.
    assert_eq!(h.console.current_empresa().map(|e| e.secuencia), Some(2));

    // The cursors survived the failure, so moving on asks the backend again.
    assert!(h.console.next_empresa().await.is_err());
    assert_eq!(h.empresas.fetch_count(), 3);
    let failures = h
        .messages()
        .into_iter()
        .filter(|m| m == "Error al cargar las empresas")
        .count();
    assert_eq!(failures, 2);

    // Moving back restores the page the cursors belong to.
    let step = h.console.prev_empresa().await.unwrap();
    assert_eq!(step.map(|e| e.secuencia), Some(2));
    assert_eq!(h.empresas.fetch_count(), 4);
    assert_eq!(h.console.empresas().len(), 2);
    assert_eq!(h.console.empresas().page_number(), 1);
}

#[tokio::test]
async fn company_search_picks_filter_by_input_kind() {
    let mut h = HarnessBuilder::new()
        .empresas(StaticPages::chain(vec![vec![
            empresa(1, "ACME"),
            empresa(2, "Beta"),
        ]]))
        .build();
    h.console.load_empresas().await.unwrap();
    h.console.next_empresa().await.unwrap();

    h.console.search_empresas("900000002").await.unwrap();
    assert_eq!(h.console.empresa_search().get("nit"), Some("900000002"));

    h.console.search_empresas(" beta ").await.unwrap();
    assert_eq!(h.console.empresa_search().get("nombre"), Some("beta"));
    assert_eq!(h.console.current_empresa().map(|e| e.secuencia), Some(2));

    // The selection is kept and navigation resumes from its position.
    let step = h.console.prev_empresa().await.unwrap();
    assert_eq!(step.map(|e| e.secuencia), Some(1));

    h.console.search_empresas("").await.unwrap();
    assert!(h.console.empresa_search().is_empty());
}

#[tokio::test]
async fn company_load_failure_is_notified() {
    let mut h = HarnessBuilder::new()
        .empresas(StaticPages::chain(vec![vec![empresa(1, "ACME")]]).failing_page(1))
        .build();

    assert!(h.console.load_empresas().await.is_err());
    assert!(h.has("Error al cargar las empresas", Severity::Error));
    assert!(h.console.current_empresa().is_none());
}

#[tokio::test]
async fn batch_load_failure_on_selection_is_notified() {
    let mut h = HarnessBuilder::new()
        .lotes(StaticPages::chain(vec![vec![lote(10, "N")]]).failing_page(1))
        .build();

    h.console.load_empresas().await.unwrap();

    assert!(h.has("Error al cargar los lotes", Severity::Error));
    assert!(h.console.lotes().navigator().is_empty());
    assert!(h.console.lotes().navigator().last_error().is_some());
}

#[tokio::test]
async fn partial_year_is_kept_without_reloading() {
    let mut h = HarnessBuilder::new().build();
    h.console.load_empresas().await.unwrap();

    assert_eq!(h.console.set_lotes_ano("202").await.unwrap(), None);
    assert_eq!(h.lotes.fetch_count(), 1);

    let outcome = h.console.set_lotes_ano("2024").await.unwrap();
    assert!(outcome.is_some_and(|o| o.is_loaded()));

    h.console.set_lotes_mes(Some(3)).await.unwrap();
    assert_eq!(
        h.lotes.requests().last(),
        Some(&PageRequest::query(
            Some(1),
            ActiveFilters::new().with("ano", "2024").with("mes", "3")
        ))
    );

    h.console.clear_lotes_filters().await.unwrap();
    assert_eq!(
        h.lotes.requests().last(),
        Some(&PageRequest::query(Some(1), ActiveFilters::new()))
    );
}

#[tokio::test]
async fn voucher_filters_need_three_characters() {
    let mut h = HarnessBuilder::new().build();
    h.console.load_empresas().await.unwrap();

    assert_eq!(h.console.set_comprobantes_nombre("an").await.unwrap(), None);
    assert_eq!(h.comprobantes.fetch_count(), 1);

    h.console.set_comprobantes_codigo("1020").await.unwrap();
    assert_eq!(
        h.comprobantes.requests().last(),
        Some(&PageRequest::query(
            Some(1),
            ActiveFilters::new().with("codigoempleado", "1020")
        ))
    );
}

#[tokio::test]
async fn page_moves_without_cursor_are_no_ops() {
    let mut h = HarnessBuilder::new().build();
    h.console.load_empresas().await.unwrap();

    assert_eq!(h.console.move_lotes(PageMove::Next).await.unwrap(), NavOutcome::NoOp);
    assert_eq!(h.console.move_lotes(PageMove::Prev).await.unwrap(), NavOutcome::NoOp);
    assert!(h.console.move_lotes(PageMove::First).await.unwrap().is_loaded());
}

#[tokio::test]
async fn cune_edit_updates_displayed_voucher() {
    let mut h = HarnessBuilder::new().build();
    h.console.load_empresas().await.unwrap();

    assert!(h.console.set_cune(20, "  cune-abc "));
    let edited = h.console.comprobantes().navigator().item(0).unwrap();
    assert_eq!(edited.cune.as_deref(), Some("cune-abc"));

    assert!(!h.console.set_cune(99, "cune-x"));
}

#[tokio::test]
async fn processed_total_prefers_backend_count() {
    let mut h = HarnessBuilder::new()
        .comprobantes(StaticPages::chain(vec![vec![
            comprobante(20, Some(57)),
            comprobante(21, Some(57)),
        ]]))
        .build();
    h.console.load_empresas().await.unwrap();
    assert_eq!(h.console.total_procesados(), 57);

    let mut h = HarnessBuilder::new()
        .comprobantes(StaticPages::chain(vec![vec![
            comprobante(20, None),
            comprobante(21, None),
        ]]))
        .build();
    h.console.load_empresas().await.unwrap();
    assert_eq!(h.console.total_procesados(), 2);
}

#[tokio::test]
async fn changing_company_cancels_pending_lock_change() {
    let mut h = HarnessBuilder::new()
        .empresas(StaticPages::chain(vec![vec![
            empresa(1, "ACME"),
            empresa(2, "Beta"),
        ]]))
        .build();
    h.console.load_empresas().await.unwrap();

    assert_eq!(
        h.console.request_candado_change(10, Candado::S),
        Some(ENABLE_EDIT_PROMPT)
    );
    h.console.select_empresa(1).await.unwrap();

    assert_eq!(h.console.lock().stage(), LockStage::Idle);
    assert!(h.mutations.candado_calls().is_empty());
}

#[tokio::test]
async fn create_lote_success_reloads_batches() {
    let mut h = HarnessBuilder::new().build();
    h.console.load_empresas().await.unwrap();

    h.console.create_lote("2024", 3, "").await.unwrap();

    let created = h.mutations.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].empresa, 1);
    assert_eq!(created[0].accion, "NINM");
    assert_eq!(created[0].ajuste, "N");
    assert!(h.has("Lote guardado exitosamente", Severity::Success));
    assert_eq!(h.lotes.fetch_count(), 2);
}

#[tokio::test]
async fn create_lote_error_status_skips_reload() {
    let mut h = HarnessBuilder::new()
        .reply(Reply::status("error", Some("Periodo cerrado")))
        .build();
    h.console.load_empresas().await.unwrap();

    let response = h.console.create_lote("2024", 3, "NIAM").await.unwrap();

    assert!(!response.is_success());
    assert_eq!(h.last().message, "Periodo cerrado");
    assert_eq!(h.last().severity, Severity::Error);
    assert_eq!(h.lotes.fetch_count(), 1);
}

#[tokio::test]
async fn create_lote_other_status_is_informational() {
    let mut h = HarnessBuilder::new()
        .reply(Reply::status("warning", Some("Pendiente de revisión")))
        .build();
    h.console.load_empresas().await.unwrap();

    h.console.create_lote("2024", 3, "").await.unwrap();

    assert!(h.has("Pendiente de revisión", Severity::Info));
    assert_eq!(h.lotes.fetch_count(), 2);
}

#[tokio::test]
async fn create_lote_transport_failure_uses_fallback_message() {
    let mut h = HarnessBuilder::new()
        .reply(Reply::Fail {
            status: 500,
            message: None,
        })
        .build();
    h.console.load_empresas().await.unwrap();

    let err = h.console.create_lote("2024", 3, "").await.unwrap_err();

    assert!(matches!(err, CreateLoteError::Client(_)));
    assert!(h.has("Error al guardar el lote", Severity::Error));
}

#[tokio::test]
async fn create_lote_rejects_invalid_input_locally() {
    let mut h = HarnessBuilder::new().build();
    h.console.load_empresas().await.unwrap();

    let err = h.console.create_lote("24", 3, "").await.unwrap_err();
    assert!(matches!(
        err,
        CreateLoteError::Validation(ValidationError::YearFormat { .. })
    ));

    let err = h.console.create_lote("2024", 13, "").await.unwrap_err();
    assert!(matches!(
        err,
        CreateLoteError::Validation(ValidationError::MonthOutOfRange { value: 13 })
    ));
    assert!(h.mutations.created().is_empty());
    assert_eq!(h.last().severity, Severity::Error);
}

#[tokio::test]
async fn create_lote_without_company_warns() {
    let h = HarnessBuilder::new().build();

    let err = h.console.create_lote("2024", 3, "").await.unwrap_err();

    assert!(matches!(
        err,
        CreateLoteError::Validation(ValidationError::NoEmpresaSelected)
    ));
    assert!(h.has("No hay empresa seleccionada", Severity::Warning));
}

#[tokio::test]
async fn export_writes_every_page_of_the_filtered_collection() {
    let mut h = HarnessBuilder::new()
        .lotes(StaticPages::chain(vec![
            vec![lote(10, "N"), lote(11, "S")],
            vec![lote(12, "N")],
        ]))
        .build();
    h.console.load_empresas().await.unwrap();

    let report = h.console.export_lotes_on(export_date()).await.unwrap();

    assert_eq!(report.rows, 3);
    assert_eq!(report.pages_fetched, 2);
    assert!(!report.truncated);
    assert_eq!(
        report.path.file_name().and_then(|n| n.to_str()),
        Some("Lotes_ACME_2024-05-01.jsonl")
    );
    let written = fs::read_to_string(&report.path).unwrap();
    assert_eq!(written.lines().count(), 4);

    assert!(h.has("Cargando todos los lotes...", Severity::Info));
    assert!(h.has("Se exportaron 3 lotes exitosamente", Severity::Success));
}

#[tokio::test]
async fn export_stops_at_page_ceiling_and_warns() {
    let mut h = HarnessBuilder::new()
        .lotes(StaticPages::chain(vec![
            vec![lote(10, "N")],
            vec![lote(11, "N")],
            vec![lote(12, "N")],
        ]))
        .export_max_pages(2)
        .build();
    h.console.load_empresas().await.unwrap();

    let report = h.console.export_lotes_on(export_date()).await.unwrap();

    assert_eq!(report.rows, 2);
    assert!(report.truncated);
    // One initial load plus two export pages; page three is never requested.
    assert_eq!(h.lotes.fetch_count(), 3);
    assert_eq!(h.last().severity, Severity::Warning);
}

#[tokio::test]
async fn export_failure_mid_walk_writes_nothing() {
    let mut h = HarnessBuilder::new()
        .lotes(
            StaticPages::chain(vec![vec![lote(10, "N")], vec![lote(11, "N")]]).failing_page(2),
        )
        .build();
    h.console.load_empresas().await.unwrap();

    let err = h.console.export_lotes_on(export_date()).await.unwrap_err();

    assert!(matches!(err, ExportError::Client(_)));
    assert!(h.has(
        "Error al exportar los lotes. Por favor, intente nuevamente.",
        Severity::Error
    ));
    assert_eq!(fs::read_dir(h.export_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn export_after_failed_load_reports_first_page_error() {
    let mut h = HarnessBuilder::new()
        .lotes(StaticPages::chain(vec![vec![lote(10, "N")]]).failing_page(1))
        .build();
    h.console.load_empresas().await.unwrap();

    let err = h.console.export_lotes_on(export_date()).await.unwrap_err();

    assert!(matches!(err, ExportError::Client(_)));
    assert!(h.has(
        "Error al obtener los lotes. Por favor, intente nuevamente.",
        Severity::Error
    ));
}

#[tokio::test]
async fn empty_export_warns() {
    let mut h = HarnessBuilder::new()
        .comprobantes(StaticPages::chain(vec![vec![]]))
        .build();
    h.console.load_empresas().await.unwrap();

    let err = h.console.export_comprobantes_on(export_date()).await.unwrap_err();

    assert!(matches!(err, ExportError::Empty));
    assert!(h.has("No hay comprobantes para exportar", Severity::Warning));
}

#[tokio::test]
async fn export_without_company_warns() {
    let h = HarnessBuilder::new().build();

    let err = h.console.export_lotes_on(export_date()).await.unwrap_err();

    assert!(matches!(
        err,
        ExportError::Validation(ValidationError::NoEmpresaSelected)
    ));
    assert!(h.has("No hay empresa seleccionada", Severity::Warning));
}
