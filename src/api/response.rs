use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::Result;

/// Success envelope: every payload is wrapped as `{ "message": ... }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: T,
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub fn ok<T: Serialize>(message: T) -> Result<Envelope<T>> {
    Ok(Envelope { message })
}
