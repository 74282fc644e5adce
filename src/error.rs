use enough::StopReason;

use crate::capability::Version;
use crate::format::ImageFormat;

/// Errors from pixel buffer access, layout conversion, decoding and encoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SurfaceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("pixel ({x}, {y}) out of bounds for {width}x{height} buffer")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },

    #[error("unsupported channel layout: {0}")]
    UnsupportedLayout(String),

    #[error("{operation}: unsupported image format {format}")]
    UnsupportedFormat {
        format: String,
        operation: &'static str,
    },

    #[error(
        "{operation}: extended codecs unavailable (required {required}, available {})",
        version_or_none(.available)
    )]
    CapabilityUnavailable {
        operation: &'static str,
        required: Version,
        available: Option<Version>,
    },

    #[error("unrecognized format magic bytes")]
    UnrecognizedFormat,

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid pixel data: {0}")]
    InvalidData(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("codec error ({format}): {source}")]
    Codec {
        format: ImageFormat,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

/// Coarse error classification.
///
/// Lets callers tell a recoverable condition (an unsupported format, a
/// missing extended codec) apart from a contract violation (a malformed
/// argument) without matching every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidDimension,
    OutOfBounds,
    UnsupportedLayout,
    UnsupportedFormat,
    CapabilityUnavailable,
    Decode,
    Configuration,
    Io,
    LimitExceeded,
    Cancelled,
}

impl SurfaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::BufferTooSmall { .. } => ErrorKind::InvalidArgument,
            Self::InvalidDimension(_) | Self::DimensionsTooLarge { .. } => {
                ErrorKind::InvalidDimension
            }
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            Self::UnsupportedLayout(_) => ErrorKind::UnsupportedLayout,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::CapabilityUnavailable { .. } => ErrorKind::CapabilityUnavailable,
            Self::UnrecognizedFormat
            | Self::InvalidHeader(_)
            | Self::InvalidData(_)
            | Self::UnexpectedEof
            | Self::Codec { .. } => ErrorKind::Decode,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io(_) => ErrorKind::Io,
            Self::LimitExceeded(_) => ErrorKind::LimitExceeded,
            Self::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// Wrap a third-party codec error.
    pub(crate) fn codec<E>(format: ImageFormat, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Codec {
            format,
            source: Box::new(error),
        }
    }

    pub(crate) fn unsupported_format(format: impl ToString, operation: &'static str) -> Self {
        Self::UnsupportedFormat {
            format: format.to_string(),
            operation,
        }
    }
}

fn version_or_none(v: &Option<Version>) -> String {
    match v {
        Some(v) => v.to_string(),
        None => "none".into(),
    }
}

impl From<StopReason> for SurfaceError {
    fn from(r: StopReason) -> Self {
        SurfaceError::Cancelled(r)
    }
}
