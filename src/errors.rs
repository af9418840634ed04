use thiserror::Error;

/// Represents errors that can occur while dispatching a bridged tool call.
///
/// None of these are fatal to the bridge: the dispatcher renders each one into
/// an error payload for the single request that produced it.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The argument bag was not an object, or a required field was missing or mistyped.
    #[error("{0}")]
    InvalidArguments(String),
    /// The `provider_type` tag is absent, not a string, or not one of the known variants.
    #[error("failed to unmarshal provider: unsupported provider_type: {0}")]
    UnsupportedProviderType(String),
    /// The tag matched a variant but the payload does not fit that variant's shape.
    #[error("failed to unmarshal provider: failed to unmarshal {variant}: {source}")]
    MalformedProviderPayload {
        variant: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// A chain step carried an empty or missing `tool_name`.
    #[error("each step requires tool_name (step {index})")]
    MissingToolName { index: usize },
    /// The backend client rejected the call.
    #[error("{context}: {source:#}")]
    Backend {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
    /// A stream failed after it had started producing chunks.
    #[error("stream error: {0:#}")]
    StreamAbort(anyhow::Error),
    /// The caller abandoned the request before the backend finished.
    #[error("request cancelled")]
    Cancelled,
    /// A backend result could not be rendered as JSON.
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl BridgeError {
    pub fn backend(context: &'static str, source: anyhow::Error) -> Self {
        BridgeError::Backend { context, source }
    }
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
