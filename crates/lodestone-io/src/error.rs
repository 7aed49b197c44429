//! IO error codes and the error payload carried by every fallible operation.

use std::borrow::Cow;
use std::fmt;

/// Machine-readable IO error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoErrorCode {
    None,

    // path / resolve
    InvalidPath,
    PathEscapesRoot,

    // fs
    NotFound,
    AlreadyExists,
    PermissionDenied,
    NotSupported,

    // stream / io
    OpenFailed,
    ReadFailed,
    WriteFailed,
    SeekFailed,
    EndOfStream,

    // internal
    InternalError,
}

impl IoErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IoErrorCode::None => "None",
            IoErrorCode::InvalidPath => "InvalidPath",
            IoErrorCode::PathEscapesRoot => "PathEscapesRoot",
            IoErrorCode::NotFound => "NotFound",
            IoErrorCode::AlreadyExists => "AlreadyExists",
            IoErrorCode::PermissionDenied => "PermissionDenied",
            IoErrorCode::NotSupported => "NotSupported",
            IoErrorCode::OpenFailed => "OpenFailed",
            IoErrorCode::ReadFailed => "ReadFailed",
            IoErrorCode::WriteFailed => "WriteFailed",
            IoErrorCode::SeekFailed => "SeekFailed",
            IoErrorCode::EndOfStream => "EndOfStream",
            IoErrorCode::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for IoErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload: code, short message, optional detail (usually the path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoError {
    pub code: IoErrorCode,
    pub message: Cow<'static, str>,
    pub detail: Option<String>,
}

impl IoError {
    pub fn new(code: IoErrorCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(
        code: IoErrorCode,
        message: impl Into<Cow<'static, str>>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == IoErrorCode::NotFound
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl std::error::Error for IoError {}

/// Result type alias used throughout the IO layer.
pub type IoResult<T> = Result<T, IoError>;
