//! Error taxonomy of the document model

/// Document result type
pub type DocResult<T> = Result<T, DocumentError>;

/// Errors raised synchronously by the operation that detects them.
///
/// Construction never validates; callers run [`crate::Document::validate`]
/// before persisting.
#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("Key fields is not defined for the class {0}")]
    MissingKeyFields(String),
    #[error("Key field {field} is missing in key values for the class {class}")]
    MissingKeyValue { class: String, field: String },
    #[error("Required field {0} can not be empty")]
    RequiredField(String),
    #[error("Invalid value for field {field}: {message}")]
    InvalidValue { field: String, message: String },
    #[error("Dependent check failed on {class}/{field}")]
    DependentCheck { class: String, field: String },
    #[error("Action {action} is not a public API of object {class}")]
    UnsupportedAction { action: String, class: String },
    #[error("Invalid document id: {0}")]
    InvalidId(String),
    #[error("Document ID missing for calculating version code")]
    MissingId,
    #[error("Data out of scope for engine {0}")]
    OutOfScope(String),
    #[error("Abstract document {0} has no collection name")]
    AbstractCollection(String),
    #[error("Unknown document class: {0}")]
    UnknownClass(String),
    #[error("Class registration error: {0}")]
    Registration(String),
    #[error("Access control error: {0}")]
    Acl(String),
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

impl DocumentError {
    /// Shorthand used by field implementations
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        DocumentError::InvalidValue { field: field.into(), message: message.into() }
    }

    /// Attach the owning field name to a validation error raised below it
    pub(crate) fn within(self, field: &str) -> Self {
        let nest = |inner: String| {
            if inner.is_empty() {
                field.to_string()
            } else {
                format!("{field}.{inner}")
            }
        };
        match self {
            DocumentError::InvalidValue { field: inner, message } => {
                DocumentError::InvalidValue { field: nest(inner), message }
            }
            DocumentError::RequiredField(inner) => DocumentError::RequiredField(nest(inner)),
            other => other,
        }
    }

    /// True for the errors a caller's `validate` pass is expected to surface
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DocumentError::RequiredField(_)
                | DocumentError::InvalidValue { .. }
                | DocumentError::DependentCheck { .. }
        )
    }
}
