//! Request body validation
//!
//! DTOs derive [`validator::Validate`]; failures become `ValidationFailed`
//! with one detail entry per offending field.

use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::AppError;
use super::extract::Json;

/// Validate a payload, mapping field errors into the error details
pub fn validate_request<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(validation_error)
}

fn validation_error(errors: ValidationErrors) -> AppError {
    let mut fields = serde_json::Map::new();
    collect(&errors, "", &mut fields);
    let summary = fields.keys().cloned().collect::<Vec<_>>().join(", ");
    AppError::validation(format!("Invalid fields: {summary}"))
        .with_detail("errors", serde_json::Value::Object(fields))
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut serde_json::Map<String, serde_json::Value>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages: Vec<serde_json::Value> = list
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                            .into()
                    })
                    .collect();
                out.insert(path, serde_json::Value::Array(messages));
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

/// JSON body that is deserialized and validated before the handler runs
///
/// Malformed JSON is reported as `InvalidRequest`, failed validation as
/// `ValidationFailed`, both 400.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await?;
        validate_request(&payload)?;
        Ok(Self(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Address, GymCreate, RegisterRequest};

    #[test]
    fn test_field_errors_in_details() {
        let req = RegisterRequest {
            name: String::new(),
            email: "nope".into(),
            password: "password123".into(),
            phone: None,
        };
        let err = validate_request(&req).unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        let errors = details["errors"].as_object().unwrap();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
        assert!(!errors.contains_key("password"));
    }

    #[test]
    fn test_nested_errors_are_prefixed() {
        let req = GymCreate {
            name: "Iron Temple".into(),
            email: "iron@example.com".into(),
            password: "password123".into(),
            phone: None,
            address: Address {
                pincode: Some("x".repeat(40)),
                ..Default::default()
            },
            operating_hours: None,
        };
        let err = validate_request(&req).unwrap_err();
        let details = err.details.unwrap();
        assert!(details["errors"].as_object().unwrap().contains_key("address.pincode"));
    }
}
