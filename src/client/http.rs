//! reqwest implementation of the backend traits.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::browse::ActiveFilters;
use crate::client::resource::{CREATE_LOTE_ROUTE, Resource, candado_route};
use crate::client::trait_::{BatchCreator, LockUpdater, PageRequest, PageSource};
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::models::lote::NuevoLote;
use crate::models::{Candado, MutationResponse, Page};

/// HTTP client for the payroll backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a client rooted at `base_url`; a missing trailing slash is added.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// Create a client from the loaded application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.api_base_url,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(route)?)
    }

    fn query_url<T: Resource>(
        &self,
        parent_id: Option<i64>,
        filters: &ActiveFilters,
    ) -> Result<Url, ClientError> {
        let mut url = self.endpoint(T::ROUTE)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let (Some(param), Some(id)) = (T::PARENT_PARAM, parent_id) {
                pairs.append_pair(param, &id.to_string());
            }
            for (name, value) in filters.iter() {
                pairs.append_pair(name, value);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    async fn error_from(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MutationResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.message);
        ClientError::Http { status, message }
    }

    async fn read_json<B: DeserializeOwned>(response: Response) -> Result<B, ClientError> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ClientError::MalformedResponse(err.to_string()))
    }

    async fn read_mutation(response: Response) -> Result<MutationResponse, ClientError> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(MutationResponse::default());
        }
        serde_json::from_slice(&bytes)
            .map_err(|err| ClientError::MalformedResponse(err.to_string()))
    }
}

#[async_trait]
impl<T: Resource> PageSource<T> for HttpBackend {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, ClientError> {
        let started = Instant::now();
        let response = match request {
            PageRequest::Query { parent_id, filters } => {
                let url = self.query_url::<T>(*parent_id, filters)?;
                debug!(resource = T::NAME, url = %url, "Fetching first page");
                self.client.get(url).send().await?
            }
            PageRequest::Ref(page_ref) => {
                debug!(resource = T::NAME, page_ref = %page_ref, "Fetching page by reference");
                self.client.get(page_ref.as_str()).send().await?
            }
        };

        let result = Self::read_json::<Page<T>>(response).await;
        histogram!("nomina_page_fetch_latency_ms").record(started.elapsed().as_millis() as f64);
        match &result {
            Ok(page) => {
                counter!("nomina_page_fetch_total", "resource" => T::NAME).increment(1);
                debug!(
                    resource = T::NAME,
                    items = page.items.len(),
                    has_next = page.next_ref().is_some(),
                    has_prev = page.prev_ref().is_some(),
                    "Page fetched"
                );
            }
            Err(err) => {
                counter!("nomina_page_fetch_failure_total", "resource" => T::NAME).increment(1);
                warn!(resource = T::NAME, error = %err, "Page fetch failed");
            }
        }
        result
    }
}

#[async_trait]
impl LockUpdater for HttpBackend {
    async fn update_candado(
        &self,
        secuencia: i64,
        candado: Candado,
    ) -> Result<MutationResponse, ClientError> {
        let url = self.endpoint(&candado_route(secuencia))?;
        debug!(secuencia, candado = %candado, url = %url, "Updating lote candado");

        let response = self
            .client
            .put(url)
            .json(&serde_json::json!({ "candado": candado }))
            .send()
            .await?;
        Self::read_mutation(response).await
    }
}

#[async_trait]
impl BatchCreator for HttpBackend {
    async fn create_lote(&self, lote: &NuevoLote) -> Result<MutationResponse, ClientError> {
        let url = self.endpoint(CREATE_LOTE_ROUTE)?;
        debug!(
            empresa = lote.empresa,
            ano = lote.ano,
            mes = lote.mes,
            accion = %lote.accion,
            "Submitting lote for validation"
        );

        let response = self.client.post(url).json(lote).send().await?;
        Self::read_mutation(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Comprobante, Empresa, Lote};

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let backend = backend("http://localhost:8000/ords/nomina");
        assert_eq!(backend.base_url().as_str(), "http://localhost:8000/ords/nomina/");
    }

    #[test]
    fn lotes_query_carries_parent_and_filters() {
        let backend = backend("http://localhost:8000/api/");
        let filters = ActiveFilters::new().with("ano", "2025").with("mes", "9");
        let url = backend.query_url::<Lote>(Some(42), &filters).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/lotes/v1/empresa/?secuencia=42&ano=2025&mes=9"
        );
    }

    #[test]
    fn comprobantes_query_encodes_text_filters() {
        let backend = backend("http://localhost:8000/api/");
        let filters = ActiveFilters::new().with("nombre", "José Pérez");
        let url = backend.query_url::<Comprobante>(Some(7), &filters).unwrap();
        assert!(url.as_str().starts_with(
            "http://localhost:8000/api/comprobantesdian/v1/empresa/?empresa_id=7&nombre="
        ));
        let nombre = url
            .query_pairs()
            .find(|(k, _)| k == "nombre")
            .map(|(_, v)| v.into_owned());
        assert_eq!(nombre.as_deref(), Some("José Pérez"));
    }

    #[test]
    fn empresas_query_without_filters_has_no_query_string() {
        let backend = backend("http://localhost:8000/api/");
        let url = backend
            .query_url::<Empresa>(None, &ActiveFilters::new())
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/empresas/v1/lista/");
    }

    #[test]
    fn candado_route_targets_lote() {
        let backend = backend("http://localhost:8000/api/");
        let url = backend.endpoint(&candado_route(15)).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/lotes/v1/lote/15/candado/");
    }
}
