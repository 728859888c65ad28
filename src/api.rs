use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// `{ "error": { "message": "..." } }`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorMessage,
}

impl ErrorResponse {
    pub fn new(msg: &str) -> Self {
        ErrorResponse {
            error: ErrorMessage {
                message: msg.to_owned(),
            },
        }
    }
}
