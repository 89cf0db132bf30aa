use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("cluster rejected the credentials")]
    Unauthorized,
    #[error("cluster returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed json payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("response missing field `{0}`")]
    MissingField(&'static str),
}

impl ClientError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }
}
