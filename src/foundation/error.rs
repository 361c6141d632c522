pub type PosterResult<T> = Result<T, PosterError>;

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum PosterError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("display error: {0}")]
    Display(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PosterError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn display(msg: impl Into<String>) -> Self {
        Self::Display(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }
}
