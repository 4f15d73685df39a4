//! services/api/src/web/extract.rs
//!
//! `ValidJson`: a JSON body that has been deserialized and validated.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::dto::{Validate, ValidationContext};
use crate::web::state::AppState;

/// Extracts `T` from the JSON body and yields its validated form.
///
/// Malformed JSON, wrong field types and failed validation all reject with 400.
pub struct ValidJson<T: Validate>(pub T::Valid);

impl<T> FromRequest<Arc<AppState>> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        let ctx = ValidationContext::at(state.clock.now(), state.venue_offset);
        payload.validate(&ctx).map(ValidJson).map_err(ApiError::Validation)
    }
}
