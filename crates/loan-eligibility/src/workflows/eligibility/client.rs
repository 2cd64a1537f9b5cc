use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::domain::EligibilityResult;
use super::form::SubmissionPayload;

/// Boundary to the remote prediction service. Both phases use the same call;
/// they differ only in whether `payload.loan_type` is set.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload)
        -> Result<EligibilityResult, SubmissionError>;
}

/// Failure raised at the submission boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("prediction service unreachable: {message}")]
    Transport { message: String },
    #[error("prediction service returned {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("prediction response malformed: {message}")]
    MalformedResponse { message: String },
}

impl SubmissionError {
    /// True for the transport category: network failures and non-success statuses.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Rejected { .. })
    }
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: String,
}

/// reqwest-backed client issuing one JSON POST per submission.
#[derive(Debug, Clone)]
pub struct HttpSubmissionClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpSubmissionClient {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionClient for HttpSubmissionClient {
    async fn submit(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<EligibilityResult, SubmissionError> {
        debug!(
            endpoint = %self.endpoint,
            refinement = payload.is_refinement(),
            "posting eligibility payload"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|err| SubmissionError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| SubmissionError::Transport {
                message: format!("failed to read response body: {err}"),
            })?;

        if !status.is_success() {
            let message = rejection_message(status, &body);
            warn!(status = status.as_u16(), %message, "prediction service rejected payload");
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice::<EligibilityResult>(&body).map_err(|err| {
            SubmissionError::MalformedResponse {
                message: err.to_string(),
            }
        })
    }
}

fn rejection_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ServiceErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string(),
    }
}
