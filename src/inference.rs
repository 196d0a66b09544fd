//! Outbound calls to the inference service.
//!
//! One POST per chat turn, JSON in, raw text out. No retries, no streaming.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{ChatError, Result};

/// Body sent to the inference service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InferenceRequest {
    /// Question answering over a document
    Question {
        /// Document markdown
        input: String,
        /// User prompt
        question: String,
    },
    /// Generic document analysis
    Analyze {
        /// Document markdown
        data: String,
    },
}

impl InferenceRequest {
    /// Short label for logs and metrics
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Question { .. } => "question",
            Self::Analyze { .. } => "analyze",
        }
    }
}

/// Seam between request handling and the inference service
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// POST `request` to `path_suffix` under the service base URL and return the body text
    async fn invoke(&self, path_suffix: &str, request: &InferenceRequest) -> Result<String>;
}

/// `reqwest`-backed gateway
#[derive(Debug, Clone)]
pub struct HttpInferenceGateway {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpInferenceGateway {
    /// Gateway for `base_url`; `None` makes every call fail with a configuration error.
    ///
    /// Without `timeout` the client waits as long as the transport allows.
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.filter(|url| !url.trim().is_empty()),
        })
    }

    fn endpoint(&self, path_suffix: &str) -> Result<String> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| ChatError::Config("inference server host is not configured".to_string()))?;
        let base = base.trim_end_matches('/');
        if path_suffix.starts_with('/') {
            Ok(format!("{base}{path_suffix}"))
        } else {
            Ok(format!("{base}/{path_suffix}"))
        }
    }
}

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    async fn invoke(&self, path_suffix: &str, request: &InferenceRequest) -> Result<String> {
        let url = self.endpoint(path_suffix)?;
        trace!(%url, shape = request.shape(), "Calling inference service");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ChatError::InferenceStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
