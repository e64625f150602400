//! Error types for provider operations.
//!
//! Three layers of errors exist:
//!
//! - [`ApiError`] - failures talking to the Okta management API
//! - [`ValidationError`] - configuration rejected before any remote call is made
//! - [`ProviderError`] - what a resource operation ultimately reports to the host

/// Main error type for resource operations.
///
/// Every remote failure is surfaced to the host with a prefix naming the
/// operation that failed; validation failures carry the fixed messages users
/// see at plan time.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Configuration rejected during plan
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A remote call failed
    #[error("Error {operation}: {source}")]
    Api {
        operation: String,
        #[source]
        source: ApiError,
    },

    /// The remote object a resource refers to does not exist
    #[error("{resource_type} {name} not found in Okta")]
    NotFound { resource_type: String, name: String },

    /// A policy rule refers to a policy that does not exist
    #[error("Cannot find Policy ID {policy_id} in Okta")]
    MissingPolicy { policy_id: String },

    /// More remote objects matched than the data model allows
    #[error("{message}")]
    Cardinality { message: String },

    /// The requested object variant or option is not implemented
    #[error("{message}")]
    Unsupported { message: String },

    /// Provider credentials or endpoint configuration is invalid
    #[error("Invalid provider configuration: {message}")]
    Configuration { message: String },

    /// No handler registered under this resource or data source type
    #[error("Unsupported resource type: {0}")]
    UnknownResourceType(String),

    /// The host driver was asked to do something the lifecycle forbids
    #[error("Internal provider error: {message}")]
    Internal { message: String },
}

/// Errors returned by an [`OktaApi`](crate::client::OktaApi) implementation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("HTTP {status}: {summary}")]
    Http {
        status: u16,
        error_code: Option<String>,
        summary: String,
    },

    /// The configured endpoint could not be turned into a request URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An identifier cannot stand as a single path segment
    #[error("invalid path segment '{0}'")]
    InvalidPathSegment(String),

    /// The response body did not match the expected shape
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Okta's error code for "resource not found".
pub const NOT_FOUND_ERROR_CODE: &str = "E0000007";

impl ApiError {
    /// Create an HTTP error from a status and Okta error fields.
    pub fn http(status: u16, error_code: Option<&str>, summary: impl Into<String>) -> Self {
        Self::Http {
            status,
            error_code: error_code.map(str::to_string),
            summary: summary.into(),
        }
    }

    /// Create a not-found error the way Okta reports it.
    pub fn not_found(summary: impl Into<String>) -> Self {
        Self::http(404, Some(NOT_FOUND_ERROR_CODE), summary)
    }

    /// Whether the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Http {
                status, error_code, ..
            } => *status == 404 || error_code.as_deref() == Some(NOT_FOUND_ERROR_CODE),
            _ => false,
        }
    }
}

/// Configuration errors detected before any remote call.
///
/// Messages are fixed strings: they are what users match against when a plan
/// is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Required attribute is missing
    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// Attribute value doesn't match the declared type
    #[error("Attribute '{attribute}' has invalid type, expected {expected}, got {actual}")]
    InvalidAttributeType {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// String value outside the accepted set
    #[error("Attribute '{attribute}' has invalid value '{value}', allowed values: {allowed:?}")]
    InvalidCanonicalValue {
        attribute: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Integer value outside the accepted range
    #[error("Attribute '{attribute}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        attribute: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Unknown attribute in configuration
    #[error("Unknown attribute '{attribute}' in {resource_type}")]
    UnknownAttribute {
        attribute: String,
        resource_type: String,
    },

    /// Block declared more times than allowed
    #[error("Attribute '{attribute}' allows at most {max} block(s)")]
    TooManyItems { attribute: String, max: usize },

    #[error("You cannot change the name field or type field of an existing Policy")]
    ImmutablePolicyIdentity,

    #[error(
        "You cannot change the policyid field, name field, or type field of an existing Policy Rule"
    )]
    ImmutablePolicyRuleIdentity,

    #[error("You cannot edit a default Policy Rule")]
    DefaultPolicyRule,

    /// An option block not available for the chosen object type
    #[error("{option} options not supported in the {target}")]
    UnsupportedOption { option: String, target: String },

    #[error("You can only set one of the groups, users, or authprovider policy conditions")]
    ConflictingPolicyConditions,

    #[error(
        "accepted values for excludeattributes password settings are \"firstName\" and/or \"lastName\""
    )]
    InvalidExcludeAttributes,

    #[error("You cannot set both include and exclude network condition zones")]
    ConflictingNetworkZones,

    #[error("mfa signon actions not supported in this provider at this time")]
    UnsupportedMfaActions,

    #[error("{kind} not supported in this provider at this time")]
    UnsupportedType { kind: String },

    #[error("Editing a base user subschema not supported in this provider at this time")]
    BaseSubschema,

    #[error("You cannot change the {field} field for an existing User SubSchema")]
    ImmutableSubschemaField { field: String },

    #[error("arraytype is required when type is array")]
    MissingArrayType,

    #[error("arraytype is only supported when type is array")]
    UnexpectedArrayType,

    /// General validation error with custom message
    #[error("Validation failed: {message}")]
    Custom { message: String },
}

impl ProviderError {
    /// Wrap a remote failure with the operation that triggered it.
    pub fn api(operation: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            operation: operation.into(),
            source,
        }
    }

    /// Create a not-found error for a resource resolved by name.
    pub fn not_found(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Create a cardinality error
    pub fn cardinality(message: impl Into<String>) -> Self {
        Self::Cardinality {
            message: message.into(),
        }
    }

    /// Create an unsupported-feature error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl ValidationError {
    /// Create a missing required attribute error
    pub fn missing_required(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create an invalid type error
    pub fn invalid_type(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidAttributeType {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an unsupported option error, e.g. password settings on a sign-on policy
    pub fn unsupported_option(option: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnsupportedOption {
            option: option.into(),
            target: target.into(),
        }
    }

    /// Create a custom validation error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

// Result type aliases for convenience
pub type ProviderResult<T> = Result<T, ProviderError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type ApiResult<T> = Result<T, ApiError>;
