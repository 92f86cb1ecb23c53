use crate::types::TemplateType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("{0}")]
    Rejected(String),

    #[error("backend response carried no data")]
    MissingData,

    #[error("could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    Validation(String),

    #[error("Request failed ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Template ID not found")]
    MissingTemplateId,

    #[error("Template has no {0} document")]
    MissingDocument(TemplateType),

    #[error("Invalid request JSON format")]
    InvalidRequestJson(#[source] serde_json::Error),

    #[error(transparent)]
    Client(#[from] ClientError),
}
