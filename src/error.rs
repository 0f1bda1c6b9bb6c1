//! Error types for the lightbox page core.
//!
//! Load failures are not errors at this level: a remote load that produces no
//! bitmap moves the page into its failed state and the gallery stays usable.
//! `LightboxError` covers misuse and loader-side faults.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LightboxError {
    /// Layout was requested before the host provided a viewport.
    #[error("page has no viewport; call configure_layout first")]
    NoViewport,

    /// The page was torn down and no longer reacts to host events.
    #[error("page has been torn down")]
    TornDown,

    #[error("invalid image uri {uri:?}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported uri scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("failed to read image {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {0:?} contains no frames")]
    EmptyAnimation(PathBuf),

    #[error("rgba buffer of {len} bytes does not match {width}x{height}")]
    InvalidBitmap { width: u32, height: u32, len: usize },

    #[error("image loader queue is full")]
    QueueFull,

    #[error("image loader has been shut down")]
    LoaderShutdown,
}

pub type Result<T> = std::result::Result<T, LightboxError>;
