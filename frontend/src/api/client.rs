use reqwest::{header::CONTENT_TYPE, Client};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;

use crate::{api::types::*, config};

const NOT_CONFIGURED_MESSAGE: &str = "La URL de Google Apps Script no está configurada. \
     Despliega el script y configura la URL para continuar.";
const NETWORK_ERROR_MESSAGE: &str = "Error de red: No se pudo conectar al servidor. \
     Verifica tu conexión a internet y que el script de Google está desplegado y accesible.";
const UNKNOWN_SERVER_ERROR: &str = "Ha ocurrido un error desconocido en el servidor.";

/// Declared as plain text so the browser does not send a CORS pre-flight.
const PLAIN_TEXT: &str = "text/plain;charset=utf-8";

/// Single-endpoint gateway: every operation is one POST carrying
/// `{action, payload}` and answered with a `{status, data, message}` envelope.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: Option<String>,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            endpoint: None,
        }
    }

    pub fn new_with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: Some(endpoint.into()),
        }
    }

    async fn resolved_endpoint(&self) -> String {
        if let Some(endpoint) = &self.endpoint {
            endpoint.clone()
        } else {
            config::await_script_url().await
        }
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.client
    }

    pub async fn call(&self, action: &str, payload: Option<Value>) -> Result<Value, ApiError> {
        let endpoint = self.resolved_endpoint().await;
        if !config::is_configured(&endpoint) {
            return Err(ApiError::configuration(NOT_CONFIGURED_MESSAGE));
        }

        log::debug!("Calling action {}", action);
        let result = self.send_action(&endpoint, action, payload).await;
        if let Err(err) = &result {
            log::error!("API call failed for action \"{}\": {}", action, err);
        }
        result
    }

    pub async fn call_as<T: DeserializeOwned>(
        &self,
        action: &str,
        payload: Option<Value>,
    ) -> Result<T, ApiError> {
        let data = self.call(action, payload).await?;
        serde_json::from_value(data).map_err(|err| {
            log::error!("Unexpected data for action \"{}\": {}", action, err);
            ApiError::unknown(format!("Failed to parse {} response: {}", action, err))
        })
    }

    async fn send_action(
        &self,
        endpoint: &str,
        action: &str,
        payload: Option<Value>,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_string(&ActionRequest { action, payload })
            .map_err(|e| ApiError::unknown(format!("Failed to encode request: {}", e)))?;

        let response = self
            .http_client()
            .post(endpoint)
            .header(CONTENT_TYPE, PLAIN_TEXT)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                log::debug!("Transport failure: {}", e);
                ApiError::network(NETWORK_ERROR_MESSAGE)
            })?;

        decode_envelope(response.text().await)
    }
}

/// The script answers 200 even for failures, so the envelope decides.
fn decode_envelope<E: Display>(body: Result<String, E>) -> Result<Value, ApiError> {
    let text = body.map_err(|e| ApiError::unknown(format!("Failed to read response: {}", e)))?;
    let envelope: ResponseEnvelope = serde_json::from_str(&text)
        .map_err(|e| ApiError::unknown(format!("Failed to parse response: {}", e)))?;

    if envelope.is_error() {
        let message = envelope
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string());
        return Err(ApiError::application(message));
    }
    Ok(envelope.data)
}
