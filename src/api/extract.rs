//! Request body extractor that answers in the error envelope.

use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::errors::{AppError, AppErrorWithRevision};
use crate::AppState;

/// JSON request body.
///
/// Wraps `axum::Json` so a body that does not read as `T` is reported in the
/// same envelope as every other failure, with the current revision.
pub struct Json<T>(pub T);

impl<T> FromRequest<AppState> for Json<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = AppErrorWithRevision;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => {
                let error = AppError::from(rejection);
                let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
                Err(AppErrorWithRevision { error, revision_id })
            }
        }
    }
}
