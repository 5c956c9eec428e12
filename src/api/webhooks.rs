//! Provider webhook endpoint.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;

use crate::error::AppResult;
use crate::models::WebhookQuery;
use crate::services::WebhookDispatcher;

#[derive(Debug, Serialize)]
struct WebhookAck {
    success: bool,
}

/// `POST /webhooks/studio`
///
/// The raw body is taken as bytes so the signature is checked over exactly
/// what the provider sent.
pub async fn studio_webhook(
    req: HttpRequest,
    query: web::Query<WebhookQuery>,
    body: web::Bytes,
    dispatcher: web::Data<WebhookDispatcher>,
) -> AppResult<HttpResponse> {
    dispatcher.handle(&query, req.headers(), &body).await?;
    Ok(HttpResponse::Ok().json(WebhookAck { success: true }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/webhooks/studio").route(web::post().to(studio_webhook)));
}
