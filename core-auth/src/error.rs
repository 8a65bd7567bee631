use connector_traits::ConnectorError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("Token acquisition failed: {0}")]
    AcquisitionFailed(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Token endpoint returned status {status}: {message}")]
    TokenEndpoint { status: u16, message: String },
}

impl From<AuthError> for ConnectorError {
    fn from(err: AuthError) -> Self {
        ConnectorError::Auth(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
