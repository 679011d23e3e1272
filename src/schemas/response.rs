use serde::Serialize;

use crate::utils::datetime_stamp;

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// `{"status": "error", "error": {"type", "message"}, "date_time"}`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub error: ErrorDetail,
    pub date_time: String,
}

impl ErrorEnvelope {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            error: ErrorDetail {
                kind: kind.into(),
                message: message.into(),
            },
            date_time: datetime_stamp(),
        }
    }
}
