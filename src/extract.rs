use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ApiError;

/// `Json` body whose rejections are answered as validation errors in the
/// regular `{"detail"}` shape instead of axum's plain-text ones.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

fn rejection_message(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
        _ => "Invalid request body",
    }
}

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                // serde detail stays in the log
                warn!(status = %rejection.status(), error = %rejection.body_text(), "request body rejected");
                Err(ApiError::validation(rejection_message(&rejection)))
            }
        }
    }
}
