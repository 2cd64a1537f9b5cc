use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::eligibility::{FlowError, FormError, SubmissionError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Form(FormError),
    Flow(FlowError),
    Submission(SubmissionError),
    Export(csv::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Form(err) => write!(f, "form error: {}", err),
            AppError::Flow(err) => write!(f, "flow error: {}", err),
            AppError::Submission(err) => write!(f, "submission error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Form(err) => Some(err),
            AppError::Flow(err) => Some(err),
            AppError::Submission(err) => Some(err),
            AppError::Export(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Form(_) | AppError::Flow(FlowError::Form(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Flow(FlowError::RefinementUnavailable) => StatusCode::CONFLICT,
            AppError::Submission(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<FormError> for AppError {
    fn from(value: FormError) -> Self {
        Self::Form(value)
    }
}

impl From<FlowError> for AppError {
    fn from(value: FlowError) -> Self {
        Self::Flow(value)
    }
}

impl From<SubmissionError> for AppError {
    fn from(value: SubmissionError) -> Self {
        Self::Submission(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Export(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_onto_http_statuses() {
        let form = AppError::Form(FormError::UnknownField("Salary".to_string()));
        assert_eq!(
            form.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let flow = AppError::Flow(FlowError::RefinementUnavailable);
        assert_eq!(flow.into_response().status(), StatusCode::CONFLICT);

        let submission = AppError::Submission(SubmissionError::Transport {
            message: "connection refused".to_string(),
        });
        assert_eq!(submission.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
