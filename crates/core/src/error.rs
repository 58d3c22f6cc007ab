/// Result alias that carries the custom [`PortfolioError`] type.
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    /// Free-form failure message.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// An animation option was out of range when the operation was invoked.
    #[error("invalid `{option}` option: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },
    /// Environment or CLI configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
    /// The long-lived refresh token is not configured, so no access token can
    /// be requested.
    #[error("refresh token missing")]
    MissingRefreshToken,
    /// The OAuth `state` returned by the provider does not match the cookie.
    #[error("invalid OAuth state")]
    InvalidState,
    /// The OAuth callback did not carry an authorization code.
    #[error("missing authorization code")]
    MissingCode,
    /// Transport failure or non-success status from the upstream provider.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    /// Upstream payload could not be decoded.
    #[error("could not decode upstream payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PortfolioError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn invalid_option(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.into(),
        }
    }

    /// Whether the failure was caused by the caller rather than by this
    /// service or the upstream provider.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidState | Self::MissingCode)
    }
}

impl From<&str> for PortfolioError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for PortfolioError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
