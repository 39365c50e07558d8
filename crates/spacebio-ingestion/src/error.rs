use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Db(#[from] spacebio_db::DbError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No article metadata found at {0}")]
    EmptyArticle(String),
}

impl From<IngestError> for spacebio_common::error::ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidUrl(_) => Self::BadRequest(err.to_string()),
            IngestError::Db(db) => db.into(),
            IngestError::Http(_) | IngestError::HttpStatus { .. } | IngestError::EmptyArticle(_) => {
                Self::Upstream(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}
