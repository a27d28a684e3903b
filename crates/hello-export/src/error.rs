use thiserror::Error;

/// Failures surfaced while binding or invoking an export.
///
/// The exported function itself cannot fail; every variant here describes
/// the host side of the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("export `{name}` is already registered")]
    DuplicateExport { name: String },

    #[error("no export named `{name}`")]
    UnknownExport { name: String },

    #[error("host binding failure: {0}")]
    HostBindingFailure(String),
}

impl BindingError {
    pub fn host(message: impl Into<String>) -> Self {
        Self::HostBindingFailure(message.into())
    }
}
