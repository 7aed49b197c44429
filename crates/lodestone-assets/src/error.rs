//! Asset-level error codes and payload.

use std::borrow::Cow;
use std::fmt;

use lodestone_io::{IoError, IoErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetErrorCode {
    InvalidPath,
    PathEscapesRoot,
    InvalidCatalogEntry,
    ParseFailed,
    NoLoader,
    IoFailed,
    DecodeFailed,
    TypeMismatch,
    NotFound,
}

impl AssetErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetErrorCode::InvalidPath => "InvalidPath",
            AssetErrorCode::PathEscapesRoot => "PathEscapesRoot",
            AssetErrorCode::InvalidCatalogEntry => "InvalidCatalogEntry",
            AssetErrorCode::ParseFailed => "ParseFailed",
            AssetErrorCode::NoLoader => "NoLoader",
            AssetErrorCode::IoFailed => "IoFailed",
            AssetErrorCode::DecodeFailed => "DecodeFailed",
            AssetErrorCode::TypeMismatch => "TypeMismatch",
            AssetErrorCode::NotFound => "NotFound",
        }
    }
}

impl fmt::Display for AssetErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload: code, short message, optional detail (the offending path
/// or document source).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetError {
    pub code: AssetErrorCode,
    pub message: Cow<'static, str>,
    pub detail: Option<String>,
}

impl AssetError {
    pub fn new(code: AssetErrorCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(
        code: AssetErrorCode,
        message: impl Into<Cow<'static, str>>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AssetError {}

impl From<IoError> for AssetError {
    fn from(err: IoError) -> Self {
        let code = match err.code {
            IoErrorCode::InvalidPath => AssetErrorCode::InvalidPath,
            IoErrorCode::PathEscapesRoot => AssetErrorCode::PathEscapesRoot,
            IoErrorCode::NotFound => AssetErrorCode::NotFound,
            _ => AssetErrorCode::IoFailed,
        };
        Self {
            code,
            message: err.message,
            detail: err.detail,
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
