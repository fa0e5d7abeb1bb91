use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported entry revision {revision}")]
    UnsupportedRevision { revision: i32 },

    #[error("cipher is not in identity state at {context}")]
    CipherNotIdentity { context: &'static str },

    #[error("invalid signature: expected {expected:#x}, found {found:#x}")]
    InvalidSignature { expected: i32, found: i32 },

    #[error("binary content carries metadata: {field} is not empty")]
    BinaryMetadata { field: &'static str },

    #[error("seek before the start of an additive cipher run")]
    InvalidSeek,

    #[error("string is not valid UTF-8: {source}")]
    InvalidString {
        #[from]
        source: std::string::FromUtf8Error,
    },

    #[error("{context}: {message}")]
    Parse {
        context: &'static str,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
