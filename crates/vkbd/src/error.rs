#![forbid(unsafe_code)]

//! Unified error type for vkbd hosts.
//!
//! Each subsystem keeps its own typed error; [`Error`] wraps them so a host
//! can `?` through construction, configuration, and input handling alike.
//!
//! Construction errors (layout, config, I/O) leave no keyboard to drive.
//! Input errors only lose the one event that failed.

use std::fmt;

use vkbd_core::layout::LayoutError;
use vkbd_runtime::ConfigError;
#[cfg(feature = "input-parser")]
use vkbd_web::input_parser::InputParseError;
#[cfg(feature = "web")]
use vkbd_web::WebKeyboardError;

/// Top-level error type for vkbd hosts.
#[derive(Debug)]
pub enum Error {
    /// Layout could not be built.
    Layout(LayoutError),
    /// Configuration could not be loaded or failed validation.
    Config(ConfigError),
    /// The web driver rejected a host call.
    #[cfg(feature = "web")]
    Web(WebKeyboardError),
    /// An encoded host event could not be parsed.
    #[cfg(feature = "input-parser")]
    InputParse(InputParseError),
    /// Raw I/O error (convenience variant for `?` on io::Result).
    Io(std::io::Error),
}

/// Standard result type for vkbd APIs.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Error type label for logs.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Layout(_) => "layout",
            Self::Config(_) => "config",
            #[cfg(feature = "web")]
            Self::Web(_) => "web",
            #[cfg(feature = "input-parser")]
            Self::InputParse(_) => "input_parse",
            Self::Io(_) => "io",
        }
    }

    /// Whether the keyboard can keep running after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Layout(_) | Self::Config(_) | Self::Io(_) => false,
            #[cfg(feature = "web")]
            Self::Web(WebKeyboardError::Layout(_)) => false,
            #[cfg(feature = "web")]
            Self::Web(_) => true,
            #[cfg(feature = "input-parser")]
            Self::InputParse(_) => true,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layout(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            #[cfg(feature = "web")]
            Self::Web(err) => write!(f, "{err}"),
            #[cfg(feature = "input-parser")]
            Self::InputParse(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "I/O: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            Self::Config(err) => Some(err),
            #[cfg(feature = "web")]
            Self::Web(err) => Some(err),
            #[cfg(feature = "input-parser")]
            Self::InputParse(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<LayoutError> for Error {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "web")]
impl From<WebKeyboardError> for Error {
    fn from(err: WebKeyboardError) -> Self {
        Self::Web(err)
    }
}

#[cfg(feature = "input-parser")]
impl From<InputParseError> for Error {
    fn from(err: InputParseError) -> Self {
        Self::InputParse(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn layout_error_is_fatal() {
        let err = Error::from(LayoutError::Empty);
        assert_eq!(err.error_type(), "layout");
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "layout contains no keys");
        assert!(err.source().is_some());
    }

    #[test]
    fn config_validation_is_fatal() {
        let err = Error::from(ConfigError::Validation(vec!["bad".into()]));
        assert_eq!(err.error_type(), "config");
        assert!(!err.is_recoverable());
        assert_eq!(err.to_string(), "validation errors: bad");
    }

    #[test]
    fn io_display_is_prefixed() {
        let err = Error::from(std::io::Error::other("disk gone"));
        assert_eq!(err.to_string(), "I/O: disk gone");
        assert!(!err.is_recoverable());
    }

    #[cfg(feature = "web")]
    #[test]
    fn web_time_regression_is_recoverable() {
        let err = Error::from(WebKeyboardError::TimeRegression {
            now: std::time::Duration::from_millis(5),
            requested: std::time::Duration::ZERO,
        });
        assert_eq!(err.error_type(), "web");
        assert!(err.is_recoverable());
        assert!(!Error::from(WebKeyboardError::Layout(LayoutError::Empty)).is_recoverable());
    }

    #[cfg(feature = "input-parser")]
    #[test]
    fn input_parse_is_recoverable() {
        let err = Error::from(InputParseError::UnknownKind("wheel".into()));
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "unknown event kind: wheel");
    }
}
