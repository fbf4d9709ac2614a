//! Validation utilities for Web API DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::web::error::ApiError;

/// JSON body extractor that runs `validator` rules after deserializing.
///
/// ```ignore
/// async fn create_category(
///     ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
/// ) -> Result<Json<CategoryResponse>, ApiError> {
///     // payload is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| {
                ApiError::bad_request(format!("Invalid request body: {}", e.body_text()))
            })?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// Validate that a string does not contain control characters or NULL bytes.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_empty_trimmed(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("not_empty_trimmed")
            .with_message("Must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header::CONTENT_TYPE};
    use serde::Deserialize;
    use crate::web::error::ErrorCode;

    #[derive(Debug, Deserialize, Validate)]
    struct Named {
        #[validate(custom(function = "not_empty_trimmed"))]
        name: String,
    }

    fn request(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_control_chars() {
        assert!(no_control_chars("Ransomware\tgroup\nupdate").is_ok());
        assert!(no_control_chars("Zero\x00day").is_err());
        assert!(no_control_chars("Zero\x1bday").is_err());
    }

    #[test]
    fn test_not_empty_trimmed() {
        assert!(not_empty_trimmed(" Malware ").is_ok());
        assert!(not_empty_trimmed("").is_err());
        assert!(not_empty_trimmed(" \t\n").is_err());
    }

    #[tokio::test]
    async fn test_validated_json() {
        let ValidatedJson(named) =
            ValidatedJson::<Named>::from_request(request(r#"{"name":"AI"}"#), &())
                .await
                .unwrap();
        assert_eq!(named.name, "AI");

        let blank = ValidatedJson::<Named>::from_request(request(r#"{"name":"  "}"#), &()).await;
        assert!(matches!(blank, Err(e) if e.code() == ErrorCode::ValidationError));

        let malformed = ValidatedJson::<Named>::from_request(request("{"), &()).await;
        assert!(matches!(malformed, Err(e) if e.code() == ErrorCode::BadRequest));
    }
}
