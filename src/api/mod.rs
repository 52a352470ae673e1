//! REST API module.
//!
//! Thin handlers over the repository. Every response carries the catalog
//! revision so clients can tell when their cached lists went stale.

mod catalog;
mod extract;
mod favorites;
mod games;
mod posts;
mod reactions;

pub use catalog::*;
pub use extract::Json;
pub use favorites::*;
pub use games::*;
pub use posts::*;
pub use reactions::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::errors::{AppError, AppErrorWithRevision};

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
    /// Non-fatal notes, e.g. dropped duplicate codes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, axum::Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create a successful API response that carries warnings.
pub fn success_with_warnings<T: Serialize>(
    data: T,
    revision_id: i64,
    warnings: Vec<String>,
) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id).with_warnings(warnings))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(AppErrorWithRevision {
        error: err,
        revision_id,
    })
}
