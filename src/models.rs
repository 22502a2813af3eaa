//! Model management client.
//!
//! Plain request/response calls against the training API: create a model,
//! train it on intent statements, query its status, and run batch text
//! prediction. Stateless apart from the connection pool; all calls carry
//! bearer-token auth and JSON bodies.

use crate::config::ApiConfig;
use crate::stream::Intent;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Serialize)]
struct CreateModelPayload<'a> {
    name: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateModelResult {
    id: String,
}

#[derive(Debug, Serialize)]
struct TrainModelPayload<'a> {
    intents: &'a [String],
}

#[derive(Debug, Serialize)]
struct PredictTextPayload<'a> {
    statements: &'a [String],
}

/// Prediction for one statement of a batch request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentencePrediction {
    pub statement: String,
    pub prediction: Vec<Intent>,
}

pub struct ModelClient {
    client: reqwest::Client,
    host: String,
    token: String,
}

impl ModelClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(api: &ApiConfig) -> Result<Self> {
        if api.token.is_empty() {
            bail!("auth token is empty; set api.token before calling the model API");
        }

        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            host: api.host.clone(),
            token: api.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("https://{}{}", self.host, path)
    }

    /// Create a model; returns the server-assigned model id.
    pub async fn create_model(&self, name: &str, language: &str) -> Result<String> {
        info!("creating model {:?} ({})", name, language);

        let result: CreateModelResult = self
            .client
            .post(self.url("/model"))
            .bearer_auth(&self.token)
            .json(&CreateModelPayload { name, language })
            .send()
            .await
            .context("Create model request failed")?
            .error_for_status()
            .context("Create model rejected")?
            .json()
            .await
            .context("Failed to parse create model response")?;

        info!("created model {}", result.id);
        Ok(result.id)
    }

    /// Train a model on newline-separated intent statements.
    pub async fn train_model(&self, model_id: &str, intents: &[String]) -> Result<String> {
        info!("training model {} on {} statements", model_id, intents.len());

        self.client
            .post(self.url(&format!("/model/{}/train", model_id)))
            .bearer_auth(&self.token)
            .json(&TrainModelPayload { intents })
            .send()
            .await
            .context("Train request failed")?
            .error_for_status()
            .context("Train request rejected")?
            .text()
            .await
            .context("Failed to read train response")
    }

    /// Raw status document for a model.
    pub async fn model_status(&self, model_id: &str) -> Result<String> {
        self.client
            .get(self.url(&format!("/model/{}", model_id)))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Status request failed")?
            .error_for_status()
            .context("Status request rejected")?
            .text()
            .await
            .context("Failed to read status response")
    }

    /// Batch prediction from text. The response body is a bare JSON
    /// array of per-statement predictions.
    pub async fn predict_from_text(
        &self,
        model_id: &str,
        statements: &[String],
    ) -> Result<Vec<SentencePrediction>> {
        info!("predicting {} statements with model {}", statements.len(), model_id);

        self.client
            .post(self.url(&format!("/model/{}/predict-from-text", model_id)))
            .bearer_auth(&self.token)
            .json(&PredictTextPayload { statements })
            .send()
            .await
            .context("Predict request failed")?
            .error_for_status()
            .context("Predict request rejected")?
            .json()
            .await
            .context("Failed to parse predict response")
    }
}
