//! JSON body extractor that validates before the handler runs.

use axum::extract::{FromRequest, Request};
use axum::Json;
use portfolio_core::error::CoreError;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// A JSON body that parsed and passed its `validator` rules.
///
/// Malformed JSON and unknown fields become `400 BAD_REQUEST`; rule
/// violations become `400 VALIDATION_ERROR`. Both use the standard error body.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value.validate().map_err(validation_error)?;
        Ok(ValidatedJson(value))
    }
}

/// Flatten `validator` errors into one message, fields sorted.
pub fn validation_error(errors: validator::ValidationErrors) -> CoreError {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let codes: Vec<&str> = errs.iter().map(|e| &*e.code).collect();
            format!("{field}: {}", codes.join(", "))
        })
        .collect();
    fields.sort();
    CoreError::Validation(fields.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Validate)]
    struct Probe {
        #[validate(length(min = 3))]
        name: String,
        #[validate(range(min = 1, max = 5))]
        impact: i16,
    }

    #[test]
    fn field_errors_are_listed_in_order() {
        let probe = Probe {
            name: "x".into(),
            impact: 9,
        };
        let err = validation_error(probe.validate().unwrap_err());
        match err {
            CoreError::Validation(msg) => assert_eq!(msg, "impact: range; name: length"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
