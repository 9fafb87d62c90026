/// Success envelope shared by every endpoint:
/// `{success, message, data}`. Errors use `error::ErrorResponse`.

use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn respond(self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
    ApiResponse::new(message, Some(data)).respond(StatusCode::OK)
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    ApiResponse::new(message, Some(data)).respond(StatusCode::CREATED)
}

/// 200 with `data: null`
pub fn ok_empty(message: &str) -> HttpResponse {
    ApiResponse::<()>::new(message, None).respond(StatusCode::OK)
}
