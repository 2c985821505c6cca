use thiserror::Error;

/// Ways a single status fetch can fail.
///
/// The collector treats every variant the same (a down cycle plus a log line);
/// the distinction matters at startup, where the self-check reports it verbatim.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to create a get request for {endpoint}: {reason}")]
    RequestConstruction { endpoint: String, reason: String },

    #[error("failed to get {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: ureq::Error,
    },

    #[error("expected 200 response, got {code}")]
    UnexpectedStatus { code: u16 },

    #[error("failed to read the response body: {0}")]
    BodyRead(#[source] ureq::Error),

    #[error("failed to parse response body {body:?}: {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Status code carried by [`FetchError::UnexpectedStatus`].
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::UnexpectedStatus { code } => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to bind metrics server to {addr}: {reason}")]
pub struct BindError {
    pub addr: String,
    pub reason: String,
}
