//! HTTP session against one appliance.
//!
//! A probe logs in once, keeps the session cookies for its own requests and
//! drops them afterwards. Nothing is shared between probes except the
//! connection pool of the underlying [`reqwest::Client`].

use std::future::Future;
use std::time::Duration;

use axum::http::StatusCode;
use log::{debug, info, warn};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use serde_json::Value;
use thiserror::Error;

use smp_exporter_core::{DocumentError, TelemetryDocument, TelemetrySource};

pub const LOGIN_PATH: &str = "/api/login";
pub const MODEL_NAME_PATH: &str = "/api/swis/resource/unit/model/name";
pub const RESOURCES_PATH: &str = "/api/swis/resources";

/// Timeouts and TLS policy for device requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Total time budget of a single request.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Appliances ship self-signed certificates, so this is off by default.
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            verify_tls: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("invalid target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },

    #[error("malformed response from {url}: {source}")]
    Document {
        url: String,
        #[source]
        source: DocumentError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl DeviceError {
    /// Status code the exporter answers with when this error ends a probe.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidTarget { .. } => StatusCode::BAD_REQUEST,
            Self::Transport { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Status { status, .. } => *status,
            Self::Document { .. } => StatusCode::BAD_GATEWAY,
            Self::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Shared HTTP client for all probes.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
}

impl DeviceClient {
    pub fn new(config: &ClientConfig) -> Result<Self, DeviceError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .user_agent(concat!("smp-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DeviceError::Client)?;
        Ok(Self { http })
    }

    /// Log in to `target` and return a session carrying its cookies.
    ///
    /// `authorization` is forwarded verbatim on every request.
    pub async fn login(
        &self,
        target: &str,
        authorization: Option<&str>,
    ) -> Result<DeviceSession, DeviceError> {
        let mut session = DeviceSession {
            http: self.http.clone(),
            base: target_url(target)?,
            authorization: authorization.filter(|a| !a.is_empty()).map(str::to_string),
            cookies: None,
        };

        let url = session.url(LOGIN_PATH)?;
        debug!("logging in at {url}");
        let response = session.request(self.http.post(url.clone())).send().await;
        let response = response.map_err(|source| transport(&url, source))?;
        if !response.status().is_success() {
            warn!("login at {url} failed: {}", response.status());
            return Err(DeviceError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        session.cookies = session_cookies(response.headers().get_all(SET_COOKIE).iter());
        Ok(session)
    }
}

/// One probe's authenticated view of an appliance.
#[derive(Debug, Clone)]
pub struct DeviceSession {
    http: reqwest::Client,
    base: Url,
    authorization: Option<String>,
    cookies: Option<String>,
}

impl DeviceSession {
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Ask the unit for its model string, e.g. `SMP 401`.
    pub async fn model_name(&self) -> Result<Option<String>, DeviceError> {
        let url = self.url(MODEL_NAME_PATH)?;
        let body = self.get_bytes(url.clone()).await?;
        let value: Value = serde_json::from_slice(&body).map_err(|e| DeviceError::Document {
            url: url.to_string(),
            source: DocumentError::Json(e),
        })?;
        Ok(match value.get("result") {
            Some(Value::String(model)) => Some(model.clone()),
            Some(Value::Array(items)) => items.first().and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
    }

    /// Like [`model_name`](Self::model_name), but any failure yields an empty
    /// identity so the registry falls back to its default descriptor.
    pub async fn detect_model(&self) -> String {
        match self.model_name().await {
            Ok(Some(model)) => model,
            Ok(None) => {
                warn!("{} reported no model name", self.base);
                String::new()
            }
            Err(e) => {
                warn!("model detection failed: {e}");
                String::new()
            }
        }
    }

    /// One batched request for every URI, in the given order.
    pub async fn fetch_resources(
        &self,
        uris: &[&'static str],
    ) -> Result<TelemetryDocument, DeviceError> {
        let url = self.resources_url(uris, chrono::Utc::now().timestamp())?;
        info!("fetching {} resources from {}", uris.len(), self.base);
        let body = self.get_bytes(url.clone()).await?;
        TelemetryDocument::parse(&body, uris).map_err(|source| DeviceError::Document {
            url: url.to_string(),
            source,
        })
    }

    fn resources_url(&self, uris: &[&str], now: i64) -> Result<Url, DeviceError> {
        let mut url = self.url(RESOURCES_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query.clear().append_pair("_dc", &now.to_string());
            for uri in uris {
                query.append_pair("uri", uri);
            }
        }
        Ok(url)
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, DeviceError> {
        let response = self
            .request(self.http.get(url.clone()))
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!("request to {} failed: {status}", url.path());
            return Err(DeviceError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = response
            .bytes()
            .await
            .map_err(|source| transport(&url, source))?;
        Ok(body.to_vec())
    }

    fn request(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(authorization) = &self.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if let Some(cookies) = &self.cookies {
            builder = builder.header(COOKIE, cookies);
        }
        builder
    }

    fn url(&self, path: &str) -> Result<Url, DeviceError> {
        self.base
            .join(path)
            .map_err(|e| invalid_target(self.base.as_str(), e))
    }
}

impl TelemetrySource for DeviceSession {
    type Error = DeviceError;

    fn fetch(
        &self,
        uris: &[&'static str],
    ) -> impl Future<Output = Result<TelemetryDocument, DeviceError>> + Send {
        self.fetch_resources(uris)
    }
}

/// Parse a probe target. A bare host gets `https://`.
pub fn target_url(target: &str) -> Result<Url, DeviceError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(DeviceError::InvalidTarget {
            target: target.to_string(),
            reason: "empty".to_string(),
        });
    }
    let url = if target.contains("://") {
        Url::parse(target)
    } else {
        Url::parse(&format!("https://{target}"))
    }
    .map_err(|e| invalid_target(target, e))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(DeviceError::InvalidTarget {
            target: target.to_string(),
            reason: "no host".to_string(),
        });
    }
    Ok(url)
}

/// `name=value` pairs of every `Set-Cookie` header, joined for a `Cookie`
/// header. Attributes are dropped.
fn session_cookies<'a>(
    headers: impl Iterator<Item = &'a reqwest::header::HeaderValue>,
) -> Option<String> {
    let pairs: Vec<&str> = headers
        .filter_map(|h| h.to_str().ok())
        .filter_map(|h| h.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();
    (!pairs.is_empty()).then(|| pairs.join("; "))
}

fn transport(url: &Url, source: reqwest::Error) -> DeviceError {
    warn!("request to {} failed: {source}", url.path());
    DeviceError::Transport {
        url: url.to_string(),
        source,
    }
}

fn invalid_target(target: &str, e: impl std::fmt::Display) -> DeviceError {
    DeviceError::InvalidTarget {
        target: target.to_string(),
        reason: e.to_string(),
    }
}
