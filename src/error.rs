use std::collections::BTreeMap;

use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use diesel::r2d2::PoolError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Field name to the messages describing what is wrong with it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("recipe {0} not found")]
    NotFound(i32),

    #[error("invalid payload: {0:?}")]
    Validation(FieldErrors),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] BlockingError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Pool(_) | ApiError::Blocking(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            ApiError::NotFound(_) => response.json(json!({ "detail": "Not found." })),
            ApiError::Validation(errors) => response.json(errors),
            ApiError::MalformedBody(message) => response.json(json!({ "detail": message })),
            ApiError::Database(_) | ApiError::Pool(_) | ApiError::Blocking(_) => {
                //the cause stays in the log, the client only learns that something failed
                log::error!("{}", self);
                response.json(json!({ "detail": "A server error occurred." }))
            }
        }
    }
}
