use actix_web::HttpResponse;

use crate::response;

pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    response::ok_empty("Service is healthy")
}
