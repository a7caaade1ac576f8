//! # Payroll console
//!
//! Wires the browsing, export and lock controllers around the currently
//! selected company and turns their results into user notifications.
//!
//! Failures never escape as panics or fatal errors: every operation reports
//! through the [`Notifier`] and returns its result so callers can also react.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::browse::filters::YEAR_DIGITS;
use crate::browse::{ActiveFilters, Collection, NavOutcome, PageNavigator};
use crate::client::{BatchCreator, HttpBackend, LockUpdater, PageRequest, PageSource};
use crate::config::AppConfig;
use crate::error::{ClientError, ExportError, LockError, ValidationError};
use crate::export::{ExportReport, ExportRow, TabularSink, export_collection};
use crate::lock::{LockIntent, LockOutcome, LockSequencer};
use crate::models::lote::NuevoLote;
use crate::models::{Candado, Comprobante, Empresa, Lote, MutationResponse, PageRef};
use crate::notify::{Notifier, Severity};

pub const LOTES_ANO_FILTER: &str = "ano";
pub const LOTES_MES_FILTER: &str = "mes";
pub const COMPROBANTES_CODIGO_FILTER: &str = "codigoempleado";
pub const COMPROBANTES_NOMBRE_FILTER: &str = "nombre";
const EMPRESAS_NIT_FILTER: &str = "nit";
const EMPRESAS_NOMBRE_FILTER: &str = "nombre";

const SAVE_LOTE_FAILURE: &str = "Error al guardar el lote";
const SAVE_LOTE_SUCCESS: &str = "Lote guardado exitosamente";
const NO_EMPRESA: &str = "No hay empresa seleccionada";
const EMPRESAS_LOAD_FAILURE: &str = "Error al cargar las empresas";

/// Direction of a single-page move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMove {
    First,
    Next,
    Prev,
}

/// User-facing wording of one exportable collection.
struct ExportWording {
    /// Plural noun, e.g. `lotes`
    noun: &'static str,
}

impl ExportWording {
    fn loading(&self) -> String {
        format!("Cargando todos los {}...", self.noun)
    }

    fn empty(&self) -> String {
        format!("No hay {} para exportar", self.noun)
    }

    fn done(&self, count: usize) -> String {
        format!("Se exportaron {} {} exitosamente", count, self.noun)
    }

    fn truncated(&self, max_pages: usize) -> String {
        format!(
            "Solo se exportaron las primeras {} páginas de {}; hay más resultados disponibles",
            max_pages, self.noun
        )
    }

    fn first_page_failed(&self) -> String {
        format!(
            "Error al obtener los {}. Por favor, intente nuevamente.",
            self.noun
        )
    }

    fn failed(&self) -> String {
        format!(
            "Error al exportar los {}. Por favor, intente nuevamente.",
            self.noun
        )
    }

    fn load_failed(&self) -> String {
        format!("Error al cargar los {}", self.noun)
    }
}

const LOTES: ExportWording = ExportWording { noun: "lotes" };
const COMPROBANTES: ExportWording = ExportWording {
    noun: "comprobantes",
};

/// Collaborators the console talks to.
pub struct ConsoleDeps {
    pub empresas: Arc<dyn PageSource<Empresa>>,
    pub lotes: Arc<dyn PageSource<Lote>>,
    pub comprobantes: Arc<dyn PageSource<Comprobante>>,
    pub lock_updater: Arc<dyn LockUpdater>,
    pub batch_creator: Arc<dyn BatchCreator>,
    pub sink: Arc<dyn TabularSink>,
    pub notifier: Arc<dyn Notifier>,
}

impl ConsoleDeps {
    /// Every backend seam served by one HTTP client.
    pub fn http(
        backend: Arc<HttpBackend>,
        sink: Arc<dyn TabularSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            empresas: backend.clone(),
            lotes: backend.clone(),
            comprobantes: backend.clone(),
            lock_updater: backend.clone(),
            batch_creator: backend,
            sink,
            notifier,
        }
    }
}

/// Tunables taken from [`AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSettings {
    pub export_max_pages: usize,
    pub notification_duration: Duration,
}

impl From<&AppConfig> for ConsoleSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            export_max_pages: config.export_max_pages,
            notification_duration: config.notification_duration(),
        }
    }
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Company-centred payroll console.
pub struct PayrollConsole {
    empresas: PageNavigator<Empresa>,
    empresa_search: ActiveFilters,
    current: Option<Empresa>,
    /// Position of `current` within the loaded company page, if it is on it
    current_index: Option<usize>,
    lotes: Collection<Lote>,
    comprobantes: Collection<Comprobante>,
    lock: LockSequencer,
    lock_updater: Arc<dyn LockUpdater>,
    batch_creator: Arc<dyn BatchCreator>,
    sink: Arc<dyn TabularSink>,
    notifier: Arc<dyn Notifier>,
    settings: ConsoleSettings,
}

impl PayrollConsole {
    pub fn new(deps: ConsoleDeps, settings: ConsoleSettings) -> Self {
        Self {
            empresas: PageNavigator::new("empresas", deps.empresas),
            empresa_search: ActiveFilters::new(),
            current: None,
            current_index: None,
            lotes: Collection::scoped("lotes", deps.lotes),
            comprobantes: Collection::scoped("comprobantes", deps.comprobantes),
            lock: LockSequencer::new(),
            lock_updater: deps.lock_updater,
            batch_creator: deps.batch_creator,
            sink: deps.sink,
            notifier: deps.notifier,
            settings,
        }
    }

    pub fn settings(&self) -> ConsoleSettings {
        self.settings
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.notifier
            .notify(message, severity, self.settings.notification_duration);
    }

    // ----- companies -----

    pub fn empresas(&self) -> &PageNavigator<Empresa> {
        &self.empresas
    }

    pub fn current_empresa(&self) -> Option<&Empresa> {
        self.current.as_ref()
    }

    /// Filters of the last company search; empty when listing everything.
    pub fn empresa_search(&self) -> &ActiveFilters {
        &self.empresa_search
    }

    /// Load the first page of companies and select its first entry.
    pub async fn load_empresas(&mut self) -> Result<Option<Empresa>, ClientError> {
        self.empresa_search = ActiveFilters::new();
        match self.empresas.load_first_page(None, ActiveFilters::new()).await {
            Ok(outcome) => self.land_on(outcome, 0).await,
            Err(err) => {
                self.notify(EMPRESAS_LOAD_FAILURE, Severity::Error);
                Err(err)
            }
        }
    }

    /// List companies matching `term`: digits search by NIT, anything else by
    /// name, blank lists everything. The selection is left unchanged.
    pub async fn search_empresas(&mut self, term: &str) -> Result<NavOutcome, ClientError> {
        let term = term.trim();
        self.empresa_search = if term.is_empty() {
            ActiveFilters::new()
        } else if term.chars().all(|c| c.is_ascii_digit()) {
            ActiveFilters::new().with(EMPRESAS_NIT_FILTER, term)
        } else {
            ActiveFilters::new().with(EMPRESAS_NOMBRE_FILTER, term)
        };
        info!(filters = self.empresa_search.len(), "Searching companies");

        let outcome = self
            .empresas
            .load_first_page(None, self.empresa_search.clone())
            .await
            .inspect_err(|_| self.notify("Error al buscar empresas", Severity::Error))?;
        self.relocate_current();
        Ok(outcome)
    }

    fn relocate_current(&mut self) {
        self.current_index = self.current.as_ref().and_then(|current| {
            self.empresas
                .items()
                .iter()
                .position(|e| e.secuencia == current.secuencia)
        });
    }

    /// Select the company at `index` of the loaded page and reload its batches
    /// and vouchers.
    pub async fn select_empresa(&mut self, index: usize) -> Option<Empresa> {
        let empresa = self.empresas.item(index)?;
        self.activate(index, empresa.clone()).await;
        Some(empresa)
    }

    /// Move to the next company, crossing into the next page when needed.
    ///
    /// After a failed page fetch the list is empty but the cursors are intact,
    /// so the next call retries the same page.
    pub async fn next_empresa(&mut self) -> Result<Option<Empresa>, ClientError> {
        let total = self.empresas.len();
        match self.current_index {
            Some(index) if index + 1 < total => Ok(self.select_empresa(index + 1).await),
            None if total > 0 => Ok(self.select_empresa(0).await),
            _ => {
                let result = self.empresas.go_to_next().await;
                let outcome = self.report_empresas_load(result)?;
                self.land_on(outcome, 0).await
            }
        }
    }

    /// Move to the previous company; crossing back lands on the last record of
    /// the previous page.
    ///
    /// An empty list with no previous page (a failed move off page one)
    /// reloads the first page.
    pub async fn prev_empresa(&mut self) -> Result<Option<Empresa>, ClientError> {
        let total = self.empresas.len();
        match self.current_index {
            Some(index) if index > 0 && index < total => {
                Ok(self.select_empresa(index - 1).await)
            }
            None if total > 0 => Ok(self.select_empresa(0).await),
            _ => {
                let result = if total == 0 && !self.empresas.has_prev() {
                    self.empresas.go_to_first().await
                } else {
                    self.empresas.go_to_prev().await
                };
                let outcome = self.report_empresas_load(result)?;
                let last = self.empresas.len().saturating_sub(1);
                self.land_on(outcome, last).await
            }
        }
    }

    fn report_empresas_load(
        &mut self,
        result: Result<NavOutcome, ClientError>,
    ) -> Result<NavOutcome, ClientError> {
        if let Err(err) = &result {
            warn!(error = %err, "Company page load failed");
            self.current_index = None;
            self.notify(EMPRESAS_LOAD_FAILURE, Severity::Error);
        }
        result
    }

    async fn land_on(
        &mut self,
        outcome: NavOutcome,
        index: usize,
    ) -> Result<Option<Empresa>, ClientError> {
        if !outcome.is_loaded() {
            return Ok(self.current_empresa().cloned());
        }
        Ok(self.select_empresa(index).await)
    }

    async fn activate(&mut self, index: usize, empresa: Empresa) {
        info!(secuencia = empresa.secuencia, nombre = %empresa.nombre, "Company selected");
        let secuencia = empresa.secuencia;
        self.current = Some(empresa);
        self.current_index = Some(index);
        self.lock.cancel();

        if let Err(err) = self.lotes.set_parent(Some(secuencia)).await {
            warn!(error = %err, "Loading batches for selected company failed");
            self.notify(&LOTES.load_failed(), Severity::Error);
        }
        if let Err(err) = self.comprobantes.set_parent(Some(secuencia)).await {
            warn!(error = %err, "Loading vouchers for selected company failed");
            self.notify(&COMPROBANTES.load_failed(), Severity::Error);
        }
    }

    // ----- batches -----

    pub fn lotes(&self) -> &Collection<Lote> {
        &self.lotes
    }

    /// Year filter; only a cleared or complete four-digit year reloads.
    pub async fn set_lotes_ano(&mut self, raw: &str) -> Result<Option<NavOutcome>, ClientError> {
        let result = self
            .lotes
            .set_exact_digit_filter(LOTES_ANO_FILTER, raw, YEAR_DIGITS)
            .await;
        self.report_load(result, &LOTES)
    }

    pub async fn set_lotes_mes(
        &mut self,
        mes: Option<u32>,
    ) -> Result<Option<NavOutcome>, ClientError> {
        let value = mes.map(|m| m.to_string());
        let result = self
            .lotes
            .set_choice_filter(LOTES_MES_FILTER, value.as_deref())
            .await;
        self.report_load(result, &LOTES)
    }

    pub async fn clear_lotes_filters(&mut self) -> Result<Option<NavOutcome>, ClientError> {
        let result = self.lotes.clear_filters().await;
        self.report_load(result, &LOTES)
    }

    pub async fn move_lotes(&self, movement: PageMove) -> Result<NavOutcome, ClientError> {
        let result = Self::step(self.lotes.navigator(), movement).await;
        self.report_load(result, &LOTES)
    }

    // ----- vouchers -----

    pub fn comprobantes(&self) -> &Collection<Comprobante> {
        &self.comprobantes
    }

    pub async fn set_comprobantes_codigo(
        &mut self,
        raw: &str,
    ) -> Result<Option<NavOutcome>, ClientError> {
        let result = self
            .comprobantes
            .set_text_filter(COMPROBANTES_CODIGO_FILTER, raw)
            .await;
        self.report_load(result, &COMPROBANTES)
    }

    pub async fn set_comprobantes_nombre(
        &mut self,
        raw: &str,
    ) -> Result<Option<NavOutcome>, ClientError> {
        let result = self
            .comprobantes
            .set_text_filter(COMPROBANTES_NOMBRE_FILTER, raw)
            .await;
        self.report_load(result, &COMPROBANTES)
    }

    pub async fn clear_comprobantes_filters(
        &mut self,
    ) -> Result<Option<NavOutcome>, ClientError> {
        let result = self.comprobantes.clear_filters().await;
        self.report_load(result, &COMPROBANTES)
    }

    pub async fn move_comprobantes(&self, movement: PageMove) -> Result<NavOutcome, ClientError> {
        let result = Self::step(self.comprobantes.navigator(), movement).await;
        self.report_load(result, &COMPROBANTES)
    }

    /// Replace a displayed voucher's CUNE. Returns whether the voucher was found.
    pub fn set_cune(&self, secuencia: i64, cune: &str) -> bool {
        let cune = cune.trim().to_string();
        let found = self.comprobantes.navigator().modify_items(|items| {
            items
                .iter_mut()
                .find(|c| c.secuencia == secuencia)
                .map(|c| c.cune = Some(cune))
                .is_some()
        });
        if !found {
            warn!(secuencia, "CUNE edit for a voucher that is not displayed");
        }
        found
    }

    /// Employees processed in the displayed vouchers.
    pub fn total_procesados(&self) -> u64 {
        let items = self.comprobantes.navigator().items();
        items
            .first()
            .and_then(|c| c.total_empleados)
            .unwrap_or(items.len() as u64)
    }

    async fn step<T>(
        navigator: &PageNavigator<T>,
        movement: PageMove,
    ) -> Result<NavOutcome, ClientError>
    where
        T: Clone + Send + Sync + 'static,
    {
        match movement {
            PageMove::First => navigator.go_to_first().await,
            PageMove::Next => navigator.go_to_next().await,
            PageMove::Prev => navigator.go_to_prev().await,
        }
    }

    fn report_load<R>(
        &self,
        result: Result<R, ClientError>,
        wording: &ExportWording,
    ) -> Result<R, ClientError> {
        result.inspect_err(|err| {
            warn!(collection = wording.noun, error = %err, "Page load failed");
            self.notify(&wording.load_failed(), Severity::Error);
        })
    }

    // ----- exports -----

    pub async fn export_lotes(&self) -> Result<ExportReport, ExportError> {
        self.export_with(&self.lotes, &LOTES, today()).await
    }

    pub async fn export_comprobantes(&self) -> Result<ExportReport, ExportError> {
        self.export_with(&self.comprobantes, &COMPROBANTES, today())
            .await
    }

    /// Same as the `export_*` methods with an explicit date for the file name.
    pub async fn export_lotes_on(&self, date: NaiveDate) -> Result<ExportReport, ExportError> {
        self.export_with(&self.lotes, &LOTES, date).await
    }

    pub async fn export_comprobantes_on(
        &self,
        date: NaiveDate,
    ) -> Result<ExportReport, ExportError> {
        self.export_with(&self.comprobantes, &COMPROBANTES, date)
            .await
    }

    async fn export_with<R>(
        &self,
        collection: &Collection<R>,
        wording: &ExportWording,
        date: NaiveDate,
    ) -> Result<ExportReport, ExportError>
    where
        R: ExportRow + Clone + Send + Sync + 'static,
    {
        let Some(empresa) = self.current_empresa() else {
            self.notify(NO_EMPRESA, Severity::Warning);
            return Err(ValidationError::NoEmpresaSelected.into());
        };
        self.notify(&wording.loading(), Severity::Info);

        let source = collection.navigator().source();
        let initial_ref = match self.export_start(collection, source.as_ref()).await {
            Ok(initial_ref) => initial_ref,
            Err(err) => {
                self.notify(&wording.first_page_failed(), Severity::Error);
                return Err(err.into());
            }
        };

        let result = export_collection(
            source.as_ref(),
            initial_ref,
            self.settings.export_max_pages,
            empresa.display_name(),
            self.sink.as_ref(),
            date,
        )
        .await;

        match &result {
            Ok(report) => {
                self.notify(&wording.done(report.rows), Severity::Success);
                if report.truncated {
                    self.notify(
                        &wording.truncated(self.settings.export_max_pages),
                        Severity::Warning,
                    );
                }
            }
            Err(ExportError::Empty) => self.notify(&wording.empty(), Severity::Warning),
            Err(err) => {
                warn!(collection = wording.noun, error = %err, "Export failed");
                self.notify(&wording.failed(), Severity::Error);
            }
        }
        result
    }

    /// First-page reference of the filtered collection: the displayed one when
    /// the last load succeeded, otherwise a fresh query.
    async fn export_start<R>(
        &self,
        collection: &Collection<R>,
        source: &dyn PageSource<R>,
    ) -> Result<PageRef, ClientError>
    where
        R: Clone + Send + Sync + 'static,
    {
        let navigator = collection.navigator();
        if navigator.last_error().is_none() {
            if let Some(first) = navigator.first_ref() {
                return Ok(first);
            }
        }
        let request = PageRequest::query(collection.parent_id(), collection.filters().active());
        let page = source.fetch_page(&request).await?;
        Ok(page.first_ref().clone())
    }

    // ----- lock flag -----

    pub fn lock(&self) -> &LockSequencer {
        &self.lock
    }

    /// Start changing a displayed batch's lock. Returns the first prompt, or
    /// `None` when the batch is not displayed or already has that value.
    pub fn request_candado_change(&mut self, secuencia: i64, new: Candado) -> Option<&'static str> {
        let lote = self
            .lotes
            .navigator()
            .items()
            .into_iter()
            .find(|l| l.secuencia == secuencia)?;
        self.lock.request_change(&lote, new)?;
        self.lock.prompt()
    }

    /// Accept the first prompt; returns the second one.
    pub fn confirm_candado_first(&mut self) -> Result<&'static str, LockError> {
        self.lock.confirm_first()?;
        self.lock.prompt().ok_or(LockError::NothingPending)
    }

    /// Accept the second prompt and send the change.
    pub async fn confirm_candado_second(&mut self) -> Result<LockOutcome, LockError> {
        self.lock
            .confirm_second(
                self.lock_updater.as_ref(),
                self.lotes.navigator(),
                self.notifier.as_ref(),
                self.settings.notification_duration,
            )
            .await
    }

    pub fn cancel_candado_change(&mut self) -> Option<LockIntent> {
        self.lock.cancel()
    }

    // ----- batch creation -----

    /// Validate and submit a new batch for the selected company.
    ///
    /// The batch list is reloaded unless the backend reports an error.
    pub async fn create_lote(
        &self,
        ano: &str,
        mes: u32,
        accion: &str,
    ) -> Result<MutationResponse, CreateLoteError> {
        let Some(empresa) = self.current_empresa() else {
            self.notify(NO_EMPRESA, Severity::Warning);
            return Err(ValidationError::NoEmpresaSelected.into());
        };
        let nuevo = NuevoLote::new(empresa.secuencia, ano, mes, accion).inspect_err(|err| {
            self.notify(&err.to_string(), Severity::Error);
        })?;

        let response = match self.batch_creator.create_lote(&nuevo).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Batch creation request failed");
                let message = err.server_message().unwrap_or(SAVE_LOTE_FAILURE);
                self.notify(message, Severity::Error);
                return Err(err.into());
            }
        };

        let (severity, fallback) = match response.status.as_deref() {
            Some("error") => (Severity::Error, SAVE_LOTE_FAILURE),
            Some("success") => (Severity::Success, SAVE_LOTE_SUCCESS),
            _ => (Severity::Info, SAVE_LOTE_SUCCESS),
        };
        let message = response
            .message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback);
        self.notify(message, severity);
        if severity == Severity::Error {
            return Ok(response);
        }

        info!(empresa = nuevo.empresa, ano = nuevo.ano, mes = nuevo.mes, "Batch created; reloading");
        if let Err(err) = self.lotes.reload().await {
            warn!(error = %err, "Reloading batches after creation failed");
            self.notify(&LOTES.load_failed(), Severity::Error);
        }
        Ok(response)
    }
}

/// Failure of [`PayrollConsole::create_lote`].
#[derive(Debug, thiserror::Error)]
pub enum CreateLoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
