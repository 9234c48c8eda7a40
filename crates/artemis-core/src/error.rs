use thiserror::Error;

/// Errors produced by the artemis protocol and client layers.
#[derive(Debug, Error)]
pub enum ArtemisError {
    #[error("codec error: {0}")]
    Codec(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("no message kind resolves to handler name '{0}'")]
    UnknownHandler(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type ArtemisResult<T> = Result<T, ArtemisError>;
