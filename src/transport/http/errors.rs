use {
    crate::domain::error::{BookingError, StateError},
    axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    },
};

/// Newtype so `BookingError` can implement Axum's `IntoResponse` without
/// coupling the domain crate to the HTTP framework.
pub struct ApiError(pub BookingError);

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        Self(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self(BookingError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self.0 {
            BookingError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone())
            }
            BookingError::Authorization(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            BookingError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            BookingError::State(kind) => state_error_response(kind),
            BookingError::Gateway(msg) => {
                tracing::error!("payment gateway error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "gateway_error",
                    "payment gateway error".to_string(),
                )
            }
            BookingError::Database(err) => {
                tracing::error!("database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            BookingError::Serialization(err) => {
                tracing::error!("serialization error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
            BookingError::WebhookSignature(_) => (
                StatusCode::UNAUTHORIZED,
                "webhook_error",
                "invalid webhook signature".to_string(),
            ),
            BookingError::Configuration(msg) => {
                tracing::error!("configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

fn state_error_response(kind: &StateError) -> (StatusCode, &'static str, String) {
    match kind {
        StateError::InvalidTransition | StateError::StatusDrift => {
            (StatusCode::BAD_REQUEST, "invalid_transition", kind.to_string())
        }
        StateError::InvalidOtp => (StatusCode::BAD_REQUEST, "invalid_otp", kind.to_string()),
        StateError::OwnedByOtherProvider => {
            (StatusCode::FORBIDDEN, "owned_by_other_provider", kind.to_string())
        }
        StateError::NotCandidate => (StatusCode::FORBIDDEN, "not_candidate", kind.to_string()),
        StateError::GraceWindowExpired => {
            (StatusCode::BAD_REQUEST, "grace_window_expired", kind.to_string())
        }
        StateError::NoAuthorizedIntent => {
            (StatusCode::CONFLICT, "no_authorized_intent", kind.to_string())
        }
    }
}
