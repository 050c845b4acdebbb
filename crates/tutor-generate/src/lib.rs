//! Client for a local Ollama server.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use tutor_core::config::GenerationSettings;
use tutor_core::traits::Generator;

pub const FALLBACK_MODEL: &str = "llama3";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("Failed to reach the model service: {0}")]
    Request(reqwest::Error),
    #[error("Failed to decode the model service response: {0}")]
    Deserialization(reqwest::Error),
    #[error("Model service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("No model selected and the service lists none")]
    NoModel,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

// Newer servers send both fields, older ones only `name`.
#[derive(Deserialize)]
struct ModelTag {
    model: Option<String>,
    name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    /// `host` may omit the scheme (`localhost:11434`); `http://` is assumed.
    pub fn new(host: &str, model: impl Into<String>, timeout: Duration) -> Result<Self, GenerateError> {
        let client = Client::builder().timeout(timeout).build().map_err(GenerateError::ClientBuild)?;
        Ok(Self { client, base_url: base_url(host), model: model.into() })
    }

    /// Generator for the configured model, or the first model the service
    /// lists when none is configured.
    pub async fn from_settings(settings: &GenerationSettings) -> Result<Self, GenerateError> {
        let generator = Self::new(&settings.host, settings.model.clone(), Duration::from_secs(settings.timeout_secs))?;
        if !generator.model.is_empty() {
            return Ok(generator);
        }
        let model = generator.list_models().await.into_iter().next().ok_or(GenerateError::NoModel)?;
        Ok(generator.with_model(model))
    }

    /// `model` overrides the configured model and skips discovery.
    pub async fn for_model(settings: &GenerationSettings, model: Option<String>) -> Result<Self, GenerateError> {
        match model {
            Some(model) => Self::new(&settings.host, model, Duration::from_secs(settings.timeout_secs)),
            None => Self::from_settings(settings).await,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Installed model names, or `["llama3"]` when the service is unreachable
    /// or lists nothing.
    pub async fn list_models(&self) -> Vec<String> {
        match self.try_list_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => vec![FALLBACK_MODEL.to_string()],
            Err(e) => {
                warn!(error = %e, url = %self.base_url, "Failed to list models");
                vec![FALLBACK_MODEL.to_string()]
            }
        }
    }

    pub async fn try_list_models(&self) -> Result<Vec<String>, GenerateError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(GenerateError::Request)?;
        let response = check_status(response).await?;
        let tags: TagsResponse = response.json().await.map_err(GenerateError::Deserialization)?;
        Ok(tags.models.into_iter().filter_map(|m| m.model.or(m.name)).collect())
    }

    pub async fn try_generate(&self, prompt: &str) -> Result<String, GenerateError> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "generating");
        let body = GenerateRequest { model: &self.model, prompt, stream: false };
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(GenerateError::Request)?;
        let response = check_status(response).await?;
        let parsed: GenerateResponse = response.json().await.map_err(GenerateError::Deserialization)?;
        Ok(parsed.response)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.try_generate(prompt).await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GenerateError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GenerateError::Api { status: status.as_u16(), body })
}

fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}
