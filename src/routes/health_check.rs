use actix_web::{HttpRequest, HttpResponse, Responder};

/// Liveness probe, served by both the JSON and the RPC servers
#[tracing::instrument(name = "Health Check handler", skip(_req))]
pub async fn health_check(_req: HttpRequest) -> impl Responder {
    HttpResponse::Ok().finish()
}
