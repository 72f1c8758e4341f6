//! Probe failures and their HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use smp_exporter_core::{EmitError, ModelKey, NormalizeError, ProbeError, RegistryError};

use crate::client::DeviceError;
use crate::metrics::outcome;

/// Why a probe produced no exposition.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("Target parameter is missing")]
    MissingTarget,

    /// Failed before the model was known (target parsing, login).
    #[error(transparent)]
    Session(#[from] DeviceError),

    #[error("{model}: {source}")]
    Probe {
        model: ModelKey,
        #[source]
        source: ProbeError<DeviceError>,
    },

    #[error("{model}: {source}")]
    Emit {
        model: ModelKey,
        #[source]
        source: EmitError,
    },
}

impl ProbeFailure {
    pub fn model(&self) -> Option<ModelKey> {
        match self {
            Self::Probe { model, .. } | Self::Emit { model, .. } => Some(*model),
            Self::MissingTarget | Self::Session(_) => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingTarget => StatusCode::BAD_REQUEST,
            Self::Session(e) => e.status_code(),
            Self::Probe { source, .. } => match source {
                ProbeError::Fetch(e) => e.status_code(),
                ProbeError::Normalize(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ProbeError::MissingUnitIdentity(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Emit { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label value for `smp_exporter_probes_total`.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::MissingTarget | Self::Session(DeviceError::InvalidTarget { .. }) => {
                outcome::BAD_REQUEST
            }
            Self::Session(DeviceError::Client(_)) | Self::Emit { .. } => outcome::INTERNAL,
            Self::Session(_) => outcome::UPSTREAM,
            Self::Probe { source, .. } => match source {
                ProbeError::Fetch(DeviceError::InvalidTarget { .. }) => outcome::BAD_REQUEST,
                ProbeError::Fetch(_) | ProbeError::MissingUnitIdentity(_) => outcome::UPSTREAM,
                ProbeError::Normalize(_) => outcome::PARSE,
            },
        }
    }
}

impl IntoResponse for ProbeFailure {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::Probe {
                source: ProbeError::Normalize(NormalizeError::Unparseable { .. }),
                ..
            } => format!("Values could not be parsed to Float64: {self}"),
            _ => self.to_string(),
        };
        (self.status_code(), body).into_response()
    }
}

/// Startup failures of the exporter.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid model registry: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Client(#[from] DeviceError),

    #[error("failed to set up exporter metrics: {0}")]
    Metrics(#[from] EmitError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use smp_exporter_core::DocumentError;

    fn document_error() -> DeviceError {
        DeviceError::Document {
            url: "https://smp/api/swis/resources".into(),
            source: DocumentError::Shape("object"),
        }
    }

    #[test]
    fn test_missing_target() {
        let f = ProbeFailure::MissingTarget;
        assert_eq!(f.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(f.outcome(), outcome::BAD_REQUEST);
        assert_eq!(f.to_string(), "Target parameter is missing");
        assert_eq!(f.model(), None);
    }

    #[test]
    fn test_fetch_errors_keep_device_status() {
        let f = ProbeFailure::Probe {
            model: ModelKey::Smp400,
            source: ProbeError::Fetch(DeviceError::Status {
                url: "https://smp/".into(),
                status: StatusCode::FORBIDDEN,
            }),
        };
        assert_eq!(f.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(f.outcome(), outcome::UPSTREAM);
        assert_eq!(f.model(), Some(ModelKey::Smp400));

        let f = ProbeFailure::Probe {
            model: ModelKey::Smp300,
            source: ProbeError::Fetch(document_error()),
        };
        assert_eq!(f.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_unparseable_value_is_500() {
        let f = ProbeFailure::Probe {
            model: ModelKey::Smd101,
            source: ProbeError::Normalize(NormalizeError::Unparseable {
                model: ModelKey::Smd101,
                metric: "extron_cpu_usage",
                raw: "n/a".into(),
            }),
        };
        assert_eq!(f.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(f.outcome(), outcome::PARSE);
        let response = f.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_session_errors() {
        let f = ProbeFailure::from(document_error());
        assert_eq!(f.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(f.outcome(), outcome::UPSTREAM);
    }
}
