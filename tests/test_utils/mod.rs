//! Shared fixtures for the console integration tests.
//!
//! Builds a [`PayrollConsole`] over in-memory page chains, a scripted mutation
//! backend and a recording notifier, with exports written to a temp directory.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nomina::client::{BatchCreator, LockUpdater, PageSource, StaticPages};
use nomina::console::{ConsoleDeps, ConsoleSettings, PayrollConsole};
use nomina::error::ClientError;
use nomina::export::JsonLinesSink;
use nomina::models::lote::NuevoLote;
use nomina::models::{Candado, Comprobante, Empresa, Lote, MutationResponse};
use nomina::notify::{Notification, RecordingNotifier, Severity};
use serde_json::json;
use tempfile::TempDir;

pub fn empresa(secuencia: i64, nombre: &str) -> Empresa {
    serde_json::from_value(json!({
        "secuencia": secuencia,
        "codigo": secuencia,
        "nit": 900_000_000 + secuencia,
        "nombre": nombre
    }))
    .unwrap()
}

pub fn lote(secuencia: i64, candado: &str) -> Lote {
    serde_json::from_value(json!({
        "secuencia": secuencia,
        "empresa": 1,
        "ano": 2024,
        "mes_nombre": "marzo",
        "lote": secuencia,
        "consecutivo": 1,
        "ajuste": "N",
        "accion": "NINM",
        "candado": candado
    }))
    .unwrap()
}

pub fn comprobante(secuencia: i64, total_empleados: Option<u64>) -> Comprobante {
    serde_json::from_value(json!({
        "secuencia": secuencia,
        "empleado": 100 + secuencia,
        "nombre_empleado": format!("Empleado {}", secuencia),
        "comprobantetotal": 1_500_000.5,
        "total_empleados": total_empleados
    }))
    .unwrap()
}

/// Canned answer of the mutation endpoints.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(MutationResponse),
    Fail { status: u16, message: Option<String> },
}

impl Reply {
    pub fn status(status: &str, message: Option<&str>) -> Self {
        Reply::Body(MutationResponse {
            status: Some(status.to_string()),
            message: message.map(str::to_string),
        })
    }
}

/// Records every lock update and batch creation and answers with one reply.
pub struct ScriptedMutations {
    reply: Mutex<Reply>,
    candado_calls: Mutex<Vec<(i64, Candado)>>,
    created: Mutex<Vec<NuevoLote>>,
}

#[allow(dead_code)]
impl ScriptedMutations {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            candado_calls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn candado_calls(&self) -> Vec<(i64, Candado)> {
        self.candado_calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<NuevoLote> {
        self.created.lock().unwrap().clone()
    }

    fn answer(&self) -> Result<MutationResponse, ClientError> {
        match self.reply.lock().unwrap().clone() {
            Reply::Body(body) => Ok(body),
            Reply::Fail { status, message } => Err(ClientError::Http { status, message }),
        }
    }
}

#[async_trait]
impl LockUpdater for ScriptedMutations {
    async fn update_candado(
        &self,
        secuencia: i64,
        candado: Candado,
    ) -> Result<MutationResponse, ClientError> {
        self.candado_calls.lock().unwrap().push((secuencia, candado));
        self.answer()
    }
}

#[async_trait]
impl BatchCreator for ScriptedMutations {
    async fn create_lote(&self, lote: &NuevoLote) -> Result<MutationResponse, ClientError> {
        self.created.lock().unwrap().push(lote.clone());
        self.answer()
    }
}

pub struct Harness {
    pub console: PayrollConsole,
    pub notifier: Arc<RecordingNotifier>,
    pub mutations: Arc<ScriptedMutations>,
    pub empresas: Arc<StaticPages<Empresa>>,
    pub lotes: Arc<StaticPages<Lote>>,
    pub comprobantes: Arc<StaticPages<Comprobante>>,
    pub export_dir: TempDir,
}

#[allow(dead_code)]
impl Harness {
    pub fn messages(&self) -> Vec<String> {
        self.notifier
            .notifications()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    pub fn last(&self) -> Notification {
        self.notifier.last().expect("a notification was delivered")
    }

    pub fn has(&self, message: &str, severity: Severity) -> bool {
        self.notifier
            .notifications()
            .iter()
            .any(|n| n.message == message && n.severity == severity)
    }
}

pub struct HarnessBuilder {
    empresas: StaticPages<Empresa>,
    lotes: StaticPages<Lote>,
    comprobantes: StaticPages<Comprobante>,
    reply: Reply,
    settings: ConsoleSettings,
}

#[allow(dead_code)]
impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            empresas: StaticPages::chain(vec![vec![empresa(1, "ACME")]]),
            lotes: StaticPages::chain(vec![vec![lote(10, "N"), lote(11, "S")]]),
            comprobantes: StaticPages::chain(vec![vec![comprobante(20, None)]]),
            reply: Reply::status("success", None),
            settings: ConsoleSettings::default(),
        }
    }

    pub fn empresas(mut self, pages: StaticPages<Empresa>) -> Self {
        self.empresas = pages;
        self
    }

    pub fn lotes(mut self, pages: StaticPages<Lote>) -> Self {
        self.lotes = pages;
        self
    }

    pub fn comprobantes(mut self, pages: StaticPages<Comprobante>) -> Self {
        self.comprobantes = pages;
        self
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.reply = reply;
        self
    }

    pub fn export_max_pages(mut self, max_pages: usize) -> Self {
        self.settings.export_max_pages = max_pages;
        self
    }

    pub fn build(self) -> Harness {
        let notifier = Arc::new(RecordingNotifier::new());
        let mutations = Arc::new(ScriptedMutations::new(self.reply));
        let empresas = Arc::new(self.empresas);
        let lotes = Arc::new(self.lotes);
        let comprobantes = Arc::new(self.comprobantes);
        let export_dir = TempDir::new().unwrap();

        let empresas_source: Arc<dyn PageSource<Empresa>> = empresas.clone();
        let lotes_source: Arc<dyn PageSource<Lote>> = lotes.clone();
        let comprobantes_source: Arc<dyn PageSource<Comprobante>> = comprobantes.clone();
        let deps = ConsoleDeps {
            empresas: empresas_source,
            lotes: lotes_source,
            comprobantes: comprobantes_source,
            lock_updater: mutations.clone(),
            batch_creator: mutations.clone(),
            sink: Arc::new(JsonLinesSink::new(export_dir.path())),
            notifier: notifier.clone(),
        };

        Harness {
            console: PayrollConsole::new(deps, self.settings),
            notifier,
            mutations,
            empresas,
            lotes,
            comprobantes,
            export_dir,
        }
    }
}
