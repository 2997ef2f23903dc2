#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Io error, {0}")]
    Io(#[from] std::io::Error),
    #[error("Json error, {0}")]
    Json(#[from] serde_json::Error),
    #[error("Backend error, {0}")]
    Backend(#[from] anyhow::Error),
    #[error("{0}")]
    Message(String),
}

impl Error {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
