//! Request extractors that fail with the error envelope
//!
//! Drop-in replacements for axum's `Json`, `Query` and `Path`. A body, query
//! string or path segment that does not deserialize becomes `InvalidRequest`
//! (400) instead of axum's plain-text 400/415/422.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::{AppError, ErrorCode};

/// JSON request body
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

/// Query string parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

/// Path parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Path<T>(pub T);

fn invalid_request(status: http::StatusCode, text: String) -> AppError {
    if status.is_server_error() {
        tracing::error!(error = %text, "Extractor failed");
        return AppError::internal(text);
    }
    AppError::with_message(ErrorCode::InvalidRequest, text)
}

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        axum::Json::<T>::from_request(req, state)
            .await
            .map(|axum::Json(value)| Self(value))
            .map_err(|e: JsonRejection| invalid_request(e.status(), e.body_text()))
    }
}

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        axum::extract::Query::<T>::from_request_parts(parts, state)
            .await
            .map(|axum::extract::Query(value)| Self(value))
            .map_err(|e: QueryRejection| invalid_request(e.status(), e.body_text()))
    }
}

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        axum::extract::Path::<T>::from_request_parts(parts, state)
            .await
            .map(|axum::extract::Path(value)| Self(value))
            .map_err(|e: PathRejection| invalid_request(e.status(), e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::routing::get;
    use http::StatusCode;
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Filter {
        #[allow(dead_code)]
        limit: u32,
    }

    #[derive(Deserialize)]
    struct Counter {
        #[allow(dead_code)]
        count: i64,
    }

    fn app() -> Router {
        Router::new()
            .route("/items/{id}", get(|Path(id): Path<i64>| async move { id.to_string() }))
            .route(
                "/items",
                get(|Query(_): Query<Filter>| async { "ok" })
                    .post(|Json(_): Json<Counter>| async { "ok" }),
            )
    }

    async fn call(request: Request) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    fn assert_envelope(status: StatusCode, body: &serde_json::Value) {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], ErrorCode::InvalidRequest.code());
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn test_bad_path_segment() {
        let req = Request::get("/items/abc").body(Body::empty()).unwrap();
        let (status, body) = call(req).await;
        assert_envelope(status, &body);
    }

    #[tokio::test]
    async fn test_bad_query_string() {
        let req = Request::get("/items?limit=many").body(Body::empty()).unwrap();
        let (status, body) = call(req).await;
        assert_envelope(status, &body);
    }

    #[tokio::test]
    async fn test_bad_json_body() {
        let req = Request::post("/items")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"count":"abc"}"#))
            .unwrap();
        let (status, body) = call(req).await;
        assert_envelope(status, &body);
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let req = Request::post("/items").body(Body::from(r#"{"count":1}"#)).unwrap();
        let (status, body) = call(req).await;
        assert_envelope(status, &body);
    }

    #[tokio::test]
    async fn test_valid_path_passes_through() {
        let req = Request::get("/items/42").body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
