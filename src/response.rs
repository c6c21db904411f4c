use axum::{response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

/// Envelope for mutations. Reads return plain JSON.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_only_omits_data() {
        let body = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "done");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn with_message_carries_both() {
        let body = serde_json::to_value(ApiResponse::with_message(7, "saved")).unwrap();
        assert_eq!(body["data"], 7);
        assert_eq!(body["message"], "saved");
    }
}
