//! Crate-wide error type

use thiserror::Error;

/// Errors produced by the toolkit.
///
/// Codec, resolver and builder errors are always returned to the immediate
/// caller; nothing in this crate retries them. The watcher handles data-source
/// failures with its own retry loop and never surfaces them through this type.
#[derive(Debug, Error)]
pub enum Error {
    /// A buffer was too short, a length header pointed past the end of the
    /// buffer, or an array's declared shape did not match its content.
    #[error("malformed ABI data: {0}")]
    MalformedAbiData(String),

    /// A Solidity type-name string could not be parsed.
    #[error("invalid ABI type '{0}'")]
    InvalidTypeName(String),

    /// No function with the requested name exists in the contract ABI.
    #[error("unknown method '{0}'")]
    UnknownMethod(String),

    /// No event with the requested name exists in the contract ABI.
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    /// A call was built with a different number of arguments than its
    /// signature declares.
    #[error("parameter count mismatch: signature takes {expected}, got {actual}")]
    ParameterCountMismatch { expected: usize, actual: usize },

    /// A typed accessor's single-value shape assumption was violated.
    #[error("invalid call data: {0}")]
    InvalidCallData(String),

    /// A stringified argument could not be coerced to its declared ABI type.
    #[error("invalid argument for {kind}: {reason}")]
    InvalidArgument { kind: String, reason: String },

    /// An address was not valid hex, Base58Check, or had the wrong length
    /// or prefix byte.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The contract ABI JSON could not be parsed.
    #[error("invalid contract ABI: {0}")]
    InvalidAbi(String),

    /// The confirmation poller exhausted its attempts. The transaction may
    /// still confirm later; this is "not confirmed yet", not a hard failure.
    #[error("transaction {txid} not confirmed after {attempts} polls")]
    ConfirmationTimeout { txid: String, attempts: u32 },

    /// An external collaborator (block source, receipt source, ABI source)
    /// failed.
    #[error("data source error: {0}")]
    DataSource(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Collaborator failures funnel into [`Error::DataSource`], so call sites can
/// use `?` on `anyhow::Result` values coming back from the chain traits.
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::DataSource(err)
    }
}

impl Error {
    /// True when this is the poller's "not confirmed yet" outcome, which
    /// callers may want to treat differently from every other error.
    pub fn is_confirmation_timeout(&self) -> bool {
        matches!(self, Error::ConfirmationTimeout { .. })
    }
}
