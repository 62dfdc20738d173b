//! HTTP implementation of the provider script loader
//!
//! The provider publishes its client script at an endpoint templated with the
//! experiment id. Loading it here fetches the decision payload the script
//! would carry; both provider queries are then answered from that payload,
//! the way the installed script answers them in-process.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::experiment::ProviderExperimentId;
use crate::domain::provider::{ProviderClient, ProviderScriptLoader};
use crate::domain::variation::VariationValue;
use crate::domain::VariationError;

/// Decision payload served with the provider's client script
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptPayload {
    #[serde(default)]
    experiment: Option<String>,
    #[serde(default)]
    chosen_variation: Option<VariationValue>,
}

/// Loads the provider script over HTTP
#[derive(Debug, Clone)]
pub struct HttpScriptLoader {
    client: reqwest::Client,
    script_url: String,
}

impl HttpScriptLoader {
    pub fn new(script_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            script_url: script_url.into(),
        }
    }

    pub fn with_timeout(script_url: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            script_url: script_url.into(),
        }
    }
}

#[async_trait]
impl ProviderScriptLoader for HttpScriptLoader {
    async fn load(
        &self,
        id: &ProviderExperimentId,
    ) -> Result<Arc<dyn ProviderClient>, VariationError> {
        let response = self
            .client
            .get(&self.script_url)
            .query(&[("experiment", id.as_str())])
            .send()
            .await
            .map_err(|e| VariationError::provider(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(VariationError::provider(format!(
                "HTTP {}: {}",
                status, error_body
            )));
        }

        let payload: ScriptPayload = response
            .json()
            .await
            .map_err(|e| VariationError::provider(format!("Failed to parse response: {}", e)))?;

        Ok(Arc::new(HttpProviderClient { payload }))
    }

    fn loader_name(&self) -> &'static str {
        "http"
    }
}

/// Client handle answering from the fetched payload
#[derive(Debug)]
struct HttpProviderClient {
    payload: ScriptPayload,
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn choose_variation(&self) -> Result<Option<VariationValue>, VariationError> {
        Ok(self.payload.chosen_variation.clone())
    }

    async fn chosen_variation(
        &self,
        id: &ProviderExperimentId,
    ) -> Result<Option<VariationValue>, VariationError> {
        if self.payload.experiment.as_deref() == Some(id.as_str()) {
            Ok(self.payload.chosen_variation.clone())
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn id(raw: &str) -> ProviderExperimentId {
        ProviderExperimentId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_load_answers_both_queries_from_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cx/api.js"))
            .and(query_param("experiment", "exp1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "experiment": "exp1",
                "chosenVariation": 1
            })))
            .mount(&server)
            .await;

        let loader = HttpScriptLoader::new(format!("{}/cx/api.js", server.uri()));
        let client = loader.load(&id("exp1")).await.unwrap();

        assert_eq!(
            client.choose_variation().await.unwrap(),
            Some(VariationValue::Number(1.0))
        );
        assert_eq!(
            client.chosen_variation(&id("exp1")).await.unwrap(),
            Some(VariationValue::Number(1.0))
        );
        assert_eq!(client.chosen_variation(&id("other")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_inert_payload_answers_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cx/api.js"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "experiment": "exp1",
                "chosenVariation": null
            })))
            .mount(&server)
            .await;

        let loader = HttpScriptLoader::new(format!("{}/cx/api.js", server.uri()));
        let client = loader.load(&id("exp1")).await.unwrap();

        assert_eq!(client.choose_variation().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_http_failure_maps_to_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cx/api.js"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let loader = HttpScriptLoader::new(format!("{}/cx/api.js", server.uri()));
        let error = loader.load(&id("exp1")).await.unwrap_err();

        assert!(matches!(error, VariationError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_text_variation_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cx/api.js"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "experiment": "exp1",
                "chosenVariation": "treatment"
            })))
            .mount(&server)
            .await;

        let loader = HttpScriptLoader::new(format!("{}/cx/api.js", server.uri()));
        let client = loader.load(&id("exp1")).await.unwrap();

        assert_eq!(
            client.choose_variation().await.unwrap(),
            Some(VariationValue::Text("treatment".to_string()))
        );
    }
}
