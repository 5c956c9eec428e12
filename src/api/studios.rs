//! Studio creation endpoint for internal callers.

use actix_web::{HttpRequest, HttpResponse, web};

use crate::auth::ServiceKey;
use crate::error::{AppError, AppResult};
use crate::models::CreateStudioRequest;
use crate::services::StudioService;

/// `POST /studios`, authenticated by `X-Service-Key`.
pub async fn create_studio(
    req: HttpRequest,
    body: web::Bytes,
    key: web::Data<ServiceKey>,
    service: web::Data<StudioService>,
) -> AppResult<HttpResponse> {
    key.authorize(&req)?;

    let request: CreateStudioRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid studio request: {}", e)))?;

    let response = service.create(request).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/studios").route(web::post().to(create_studio)));
}
