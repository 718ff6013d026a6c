use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};

use super::error::ApiError;
use crate::record::{NewRecord, RecordPatch};

pub const UNSUPPORTED_BODY: &str = "Please provide the data in JSON or form format";
pub const MISSING_FIELDS: &str = "Please provide all the fields";
pub const NO_FIELDS: &str = "Please provide at least one field";

/// `name`, `email` and `password` read from either a JSON or a form-encoded
/// body.
#[derive(Debug)]
pub struct UserFields(pub RecordPatch);

impl UserFields {
    /// All three fields, each present and non-empty.
    pub fn into_new_record(self) -> Result<NewRecord, ApiError> {
        let RecordPatch {
            name,
            email,
            password,
        } = self.0;
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        match (non_empty(name), non_empty(email), non_empty(password)) {
            (Some(name), Some(email), Some(password)) => Ok(NewRecord {
                name,
                email,
                password,
            }),
            _ => Err(ApiError::BadRequest(MISSING_FIELDS.to_string())),
        }
    }

    /// Whatever subset of fields was supplied, at least one.
    pub fn into_patch(self) -> Result<RecordPatch, ApiError> {
        if self.0.is_empty() {
            return Err(ApiError::BadRequest(NO_FIELDS.to_string()));
        }
        Ok(self.0)
    }
}

#[async_trait]
impl<S> FromRequest<S> for UserFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let patch = if content_type.starts_with("application/json") {
            let Json(patch) = Json::<RecordPatch>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            patch
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(patch) = Form::<RecordPatch>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            patch
        } else {
            return Err(ApiError::BadRequest(UNSUPPORTED_BODY.to_string()));
        };

        Ok(UserFields(patch))
    }
}
