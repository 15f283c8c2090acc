use std::fmt;

/// Result alias that carries the custom [`SdlError`] type.
pub type Result<T> = std::result::Result<T, SdlError>;

/// Coarse classification of [`SdlError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Load,
    Binding,
    NativeCall,
    DoubleRelease,
    UseAfterRelease,
    SessionActive,
    Dispatch,
    Config,
    Io,
    Other,
}

/// Common error type for the binding layer.
#[derive(Debug, thiserror::Error)]
pub enum SdlError {
    /// No compatible shared library could be found or opened, or a required
    /// symbol was missing from the one that was opened.
    #[error("unable to load native library: {message}")]
    Load { message: String },
    /// An argument was rejected before any native call was issued.
    #[error("invalid argument `{argument}`: {reason}")]
    Binding {
        argument: &'static str,
        reason: String,
    },
    /// The native call itself reported failure through `SDL_GetError`.
    #[error("{call} failed: {message}")]
    NativeCall { call: &'static str, message: String },
    #[error("{resource} handle {handle} was already released")]
    DoubleRelease {
        resource: &'static str,
        handle: String,
    },
    #[error("{resource} handle {handle} used after release")]
    UseAfterRelease {
        resource: &'static str,
        handle: String,
    },
    /// Another live context has already initialised the same native library.
    #[error("SDL is already initialised by another live context")]
    SessionActive,
    /// The cross-thread dispatcher could not deliver a job or its reply.
    #[error("dispatcher: {reason}")]
    Dispatch { reason: &'static str },
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Message(String),
}

impl SdlError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn load<T: Into<String>>(message: T) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    pub fn invalid<T: Into<String>>(argument: &'static str, reason: T) -> Self {
        Self::Binding {
            argument,
            reason: reason.into(),
        }
    }

    pub fn native<T: Into<String>>(call: &'static str, message: T) -> Self {
        Self::NativeCall {
            call,
            message: message.into(),
        }
    }

    pub(crate) fn double_release(resource: &'static str, handle: impl fmt::Display) -> Self {
        Self::DoubleRelease {
            resource,
            handle: handle.to_string(),
        }
    }

    pub(crate) fn use_after_release(resource: &'static str, handle: impl fmt::Display) -> Self {
        Self::UseAfterRelease {
            resource,
            handle: handle.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Load { .. } => ErrorKind::Load,
            Self::Binding { .. } => ErrorKind::Binding,
            Self::NativeCall { .. } => ErrorKind::NativeCall,
            Self::DoubleRelease { .. } => ErrorKind::DoubleRelease,
            Self::UseAfterRelease { .. } => ErrorKind::UseAfterRelease,
            Self::SessionActive => ErrorKind::SessionActive,
            Self::Dispatch { .. } => ErrorKind::Dispatch,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Message(_) => ErrorKind::Other,
        }
    }

    /// Returns `true` for errors caused by misusing a handle's lifetime.
    /// These point at a defect in the calling code rather than a runtime
    /// condition.
    pub fn is_lifetime_defect(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::DoubleRelease | ErrorKind::UseAfterRelease
        )
    }
}

impl From<&str> for SdlError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SdlError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_lifetime_defects() {
        let err = SdlError::double_release("window", "3v1");
        assert_eq!(err.kind(), ErrorKind::DoubleRelease);
        assert!(err.is_lifetime_defect());

        let err = SdlError::invalid("title", "contains a NUL byte");
        assert!(!err.is_lifetime_defect());
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn native_errors_carry_the_call_name() {
        let err = SdlError::native("SDL_Init", "No available video device");
        assert_eq!(err.kind(), ErrorKind::NativeCall);
        assert_eq!(err.to_string(), "SDL_Init failed: No available video device");
    }
}
