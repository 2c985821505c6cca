use crate::error::FetchError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use ureq::http::Uri;
use ureq::Agent;

/// Point-in-time view of the Unit status document.
///
/// Every struct defaults its fields, so keys missing from the payload decode to
/// zero and keys this exporter does not know about are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatusSnapshot {
    pub connections: Connections,
    pub requests: Requests,
    pub applications: BTreeMap<String, Application>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Connections {
    pub accepted: i64,
    pub active: i64,
    pub idle: i64,
    pub closed: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Requests {
    pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Application {
    pub processes: Processes,
    pub requests: ApplicationRequests,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Processes {
    pub running: i64,
    pub starting: i64,
    pub idle: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApplicationRequests {
    pub active: i64,
}

impl StatusSnapshot {
    pub fn requests_total(&self) -> i64 {
        self.requests.total
    }
}

/// Anything that can produce a fresh [`StatusSnapshot`] on demand.
pub trait StatusSource: Send + Sync {
    fn fetch(&self) -> Result<StatusSnapshot, FetchError>;
}

/// Fetches the status document from a Unit control or status endpoint.
#[derive(Debug, Clone)]
pub struct StatusClient {
    endpoint: String,
    agent: Agent,
}

impl StatusClient {
    /// Creates a client and performs one fetch so a bad endpoint fails at startup.
    pub fn new(agent: Agent, endpoint: impl Into<String>) -> Result<Self, FetchError> {
        let client = Self::new_unchecked(agent, endpoint);
        client.fetch()?;
        Ok(client)
    }

    /// Same as [`StatusClient::new`], building an agent bounded by `timeout`.
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        Self::new(agent_with_timeout(timeout), endpoint)
    }

    pub fn new_unchecked(agent: Agent, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issues a single GET and decodes the body.
    ///
    /// The response, and with it the connection, is dropped before returning on
    /// every path. The agent's global timeout bounds the whole exchange.
    pub fn get_status(&self) -> Result<StatusSnapshot, FetchError> {
        let uri = parse_endpoint(&self.endpoint)?;

        let mut response = self.agent.get(uri).call().map_err(|e| match e {
            ureq::Error::BadUri(reason) => FetchError::RequestConstruction {
                endpoint: self.endpoint.clone(),
                reason,
            },
            ureq::Error::Http(e) => FetchError::RequestConstruction {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            },
            source => FetchError::Transport {
                endpoint: self.endpoint.clone(),
                source,
            },
        })?;

        let code = response.status().as_u16();
        if code != 200 {
            return Err(FetchError::UnexpectedStatus { code });
        }

        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(FetchError::BodyRead)?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            body: String::from_utf8_lossy(&body).into_owned(),
            source,
        })
    }
}

impl StatusSource for StatusClient {
    fn fetch(&self) -> Result<StatusSnapshot, FetchError> {
        self.get_status()
    }
}

/// Agent with no retries, non-200 statuses left to the caller, and an overall
/// deadline per request.
pub fn agent_with_timeout(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

fn parse_endpoint(endpoint: &str) -> Result<Uri, FetchError> {
    let invalid = |reason: String| FetchError::RequestConstruction {
        endpoint: endpoint.to_string(),
        reason,
    };

    let uri: Uri = endpoint.parse().map_err(|e: ureq::http::uri::InvalidUri| invalid(e.to_string()))?;
    match (uri.scheme_str(), uri.host()) {
        (Some("http" | "https"), Some(host)) if !host.is_empty() => Ok(uri),
        (Some(scheme), Some(_)) => Err(invalid(format!("unsupported scheme {scheme:?}"))),
        _ => Err(invalid("missing scheme or host".to_string())),
    }
}
