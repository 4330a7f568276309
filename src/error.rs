use std::fmt;

use crate::config::ConfigError;

/// An error reported by the deployment engine, or by the provider plugin behind it.
///
/// The SDK never interprets these errors. They are surfaced verbatim through the outputs of the
/// affected resource and through the result of [`Deployment::run`](crate::Deployment::run).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineError {
    /// The message reported by the engine.
    pub message: String,
}

impl EngineError {
    /// Construct an engine error with the given `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineError {}

/// The reason an [`Output`](crate::Output) resolved without a value.
///
/// Outputs are shared between any number of readers, so this error is cheap to clone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OutputError {
    /// The engine (or provider) failed the operation that would have produced the value.
    Engine(EngineError),

    /// The value is not known yet.
    ///
    /// This only happens during a preview, where the engine may not know values that will only be
    /// computed by the provider when the deployment is applied.
    Unknown,

    /// The engine did not return the property.
    Missing {
        /// The name of the missing property.
        property: String,
    },

    /// The engine returned a value of an unexpected shape for the property.
    Decode {
        /// The name of the property.
        property: String,

        /// A description of the decoding failure.
        message: String,
    },

    /// A value could not be marshalled into a property value.
    Invalid {
        /// A description of the marshalling failure.
        message: String,
    },

    /// The output's resolver was dropped without ever resolving it.
    Dropped,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(error) => write!(f, "{}", error),
            Self::Unknown => write!(f, "value is unknown during preview"),
            Self::Missing { property } => {
                write!(f, "engine did not return property '{}'", property)
            }
            Self::Decode { property, message } => {
                write!(f, "invalid value for property '{}': {}", property, message)
            }
            Self::Invalid { message } => write!(f, "invalid input value: {}", message),
            Self::Dropped => write!(f, "output was never resolved"),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(error) => Some(error),
            _ => None,
        }
    }
}

impl From<EngineError> for OutputError {
    fn from(error: EngineError) -> Self {
        Self::Engine(error)
    }
}

/// Describes a resource registration that the engine (or one of the resource's inputs) failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistrationFailure {
    /// The URN of the resource that failed to register.
    pub urn: String,

    /// The reason the registration failed.
    pub error: OutputError,
}

impl fmt::Display for RegistrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to register {}: {}", self.urn, self.error)
    }
}

impl std::error::Error for RegistrationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Errors that can occur when declaring resources or running a deployment.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A required argument was not set.
    ///
    /// This is returned synchronously by resource constructors, before anything is sent to the
    /// engine.
    MissingRequiredArgument {
        /// The name of the argument type, e.g. `ResourceTagArgs`.
        args_type: &'static str,

        /// The (schema) name of the missing property.
        property: &'static str,
    },

    /// A resource was declared with an empty name.
    InvalidResourceName {
        /// The type token of the resource.
        type_token: &'static str,
    },

    /// A resource with the same URN was already declared in this deployment.
    DuplicateResourceName {
        /// The URN shared by both resources.
        urn: String,
    },

    /// A string could not be parsed as a URN.
    InvalidUrn {
        /// The offending string.
        urn: String,
    },

    /// A type token does not name a resource in this package.
    UnknownResourceType {
        /// The offending type token.
        type_token: String,
    },

    /// The resource type cannot be looked up by ID.
    UnsupportedLookup {
        /// The type token of the resource.
        type_token: &'static str,
    },

    /// The engine failed a deployment-level operation.
    Engine(EngineError),

    /// An output awaited by the program resolved without a value.
    Output(OutputError),

    /// A resource registration failed.
    ///
    /// When several registrations fail, only the first failure observed is reported here; the
    /// remainder are logged.
    Registration(RegistrationFailure),

    /// A stack export could not be resolved.
    Export {
        /// The name of the export.
        name: String,

        /// The reason the export could not be resolved.
        source: OutputError,
    },

    /// A registration task panicked.
    TaskPanicked {
        /// The panic description reported by the runtime.
        message: String,
    },

    /// The deployment settings or configuration were invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredArgument {
                args_type,
                property,
            } => write!(
                f,
                "Missing required property '{}' in {}",
                property, args_type
            ),
            Self::InvalidResourceName { type_token } => {
                write!(f, "Resource of type {} declared with an empty name", type_token)
            }
            Self::DuplicateResourceName { urn } => {
                write!(f, "Duplicate resource URN {}; resource names must be unique", urn)
            }
            Self::InvalidUrn { urn } => write!(f, "Invalid URN: {}", urn),
            Self::UnknownResourceType { type_token } => {
                write!(f, "Unknown resource type: {}", type_token)
            }
            Self::UnsupportedLookup { type_token } => {
                write!(f, "Resources of type {} cannot be looked up by ID", type_token)
            }
            Self::Engine(error) => write!(f, "Deployment engine error: {}", error),
            Self::Output(error) => write!(f, "{}", error),
            Self::Registration(failure) => write!(f, "{}", failure),
            Self::Export { name, source } => {
                write!(f, "Failed to resolve stack export '{}': {}", name, source)
            }
            Self::TaskPanicked { message } => {
                write!(f, "Resource registration task panicked: {}", message)
            }
            Self::Config(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(error) => Some(error),
            Self::Output(error) => Some(error),
            Self::Registration(failure) => Some(failure),
            Self::Export { source, .. } => Some(source),
            Self::Config(error) => Some(error),
            _ => None,
        }
    }
}

impl From<OutputError> for Error {
    fn from(error: OutputError) -> Self {
        Self::Output(error)
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_argument_message() {
        let error = Error::MissingRequiredArgument {
            args_type: "ResourceTagArgs",
            property: "resourceARN",
        };
        assert_eq!(
            error.to_string(),
            "Missing required property 'resourceARN' in ResourceTagArgs"
        );
    }

    #[test]
    fn engine_errors_are_verbatim() {
        let error = OutputError::from(EngineError::new("AccessDenied: not authorized"));
        assert_eq!(error.to_string(), "AccessDenied: not authorized");

        let failure = RegistrationFailure {
            urn: "urn:pulumi:dev::proj::awstags:aws:ResourceTag::tag".to_string(),
            error,
        };
        assert_eq!(
            Error::Registration(failure).to_string(),
            "Failed to register urn:pulumi:dev::proj::awstags:aws:ResourceTag::tag: AccessDenied: not authorized"
        );
    }
}
