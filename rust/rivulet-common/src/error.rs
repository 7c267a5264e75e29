use thiserror::Error;

/// The error type shared by all rivulet crates.
///
/// The kind is boxed so that `Result<T>` stays a single pointer wide on the
/// error path; callers branch on [`Error::kind`].
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn schema(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Schema {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn encode(field: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Encode {
                field: field.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn closed(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::Closed {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn invalid_format(name: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: Default::default(),
            }
            .into(),
        )
    }

    pub fn invalid_format_msg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn cursor<E>(context: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::Cursor {
                context: context.into(),
                source: Box::new(source),
            }
            .into(),
        )
    }

    /// Returns `true` for failures of the byte sink, the byte source or the
    /// query cursor. These are never retried internally.
    pub fn is_io(&self) -> bool {
        matches!(self.kind(), ErrorKind::Io { .. } | ErrorKind::Cursor { .. })
    }

    pub fn is_schema(&self) -> bool {
        matches!(self.kind(), ErrorKind::Schema { .. })
    }

    pub fn is_encode(&self) -> bool {
        matches!(self.kind(), ErrorKind::Encode { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.kind(), ErrorKind::Closed { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("schema error: {message}")]
    Schema { message: String },

    #[error("encode error for field '{field}': {message}")]
    Encode { field: String, message: String },

    #[error("operation '{operation}' on a sealed session")]
    Closed { operation: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("checksum mismatch for '{element}'")]
    ChecksumMismatch { element: String },

    #[error("invalid container format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("cursor error for '{context}': {source}")]
    Cursor {
        context: String,
        source: StdErrorBoxed,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(_: std::convert::Infallible) -> Self {
        Error::invalid_operation("conversion")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(Error::schema("dup").is_schema());
        assert!(Error::encode("id", "null").is_encode());
        assert!(Error::closed("close").is_closed());
        assert!(Error::io("sink", std::io::ErrorKind::BrokenPipe.into()).is_io());
        assert!(Error::cursor("fetch", std::io::Error::other("gone")).is_io());
        assert!(!Error::invalid_operation("write_row").is_io());
    }

    #[test]
    fn test_error_display() {
        let e = Error::encode("name", "expected utf8, got int32");
        assert_eq!(
            e.to_string(),
            "encode error for field 'name': expected utf8, got int32"
        );
        let e = Error::closed("close");
        assert_eq!(e.to_string(), "operation 'close' on a sealed session");
    }
}
