use actix_web::{web, HttpResponse};

use crate::domain::{EmailBody, ListSubscribersBody, UpdateSubscriberBody};
use crate::service::{ServiceError, SubscriberService};

#[tracing::instrument(
    name = "Create subscriber handler",
    skip(body, service),
    fields(subscriber_email = %body.email)
)]
pub async fn handle_create_subscriber(
    body: web::Json<EmailBody>,
    service: web::Data<SubscriberService>,
) -> Result<HttpResponse, ServiceError> {
    let subscriber = service.create(body.into_inner()).await?;

    Ok(HttpResponse::Created().json(subscriber))
}

/// Responds with `null` when the email is unknown.
#[tracing::instrument(
    name = "Get subscriber handler",
    skip(body, service),
    fields(subscriber_email = %body.email)
)]
pub async fn handle_get_subscriber(
    body: web::Json<EmailBody>,
    service: web::Data<SubscriberService>,
) -> Result<HttpResponse, ServiceError> {
    let subscriber = service.get(&body.email).await?;

    Ok(HttpResponse::Ok().json(subscriber))
}

#[tracing::instrument(
    name = "Update subscriber handler",
    skip(body, service),
    fields(
        subscriber_email = %body.email,
        confirmed_at = %body.confirmed_at,
        opt_out = %body.opt_out
    )
)]
pub async fn handle_update_subscriber(
    body: web::Json<UpdateSubscriberBody>,
    service: web::Data<SubscriberService>,
) -> Result<HttpResponse, ServiceError> {
    let subscriber = service.update(body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(subscriber))
}

#[tracing::instrument(
    name = "Delete subscriber handler",
    skip(body, service),
    fields(subscriber_email = %body.email)
)]
pub async fn handle_delete_subscriber(
    body: web::Json<EmailBody>,
    service: web::Data<SubscriberService>,
) -> Result<HttpResponse, ServiceError> {
    let subscriber = service.delete(&body.email).await?;

    Ok(HttpResponse::Ok().json(subscriber))
}

#[tracing::instrument(
    name = "List subscribers handler",
    skip(body, service),
    fields(page = %body.page, count = %body.count)
)]
pub async fn handle_list_subscribers(
    body: web::Json<ListSubscribersBody>,
    service: web::Data<SubscriberService>,
) -> Result<HttpResponse, ServiceError> {
    let subscribers = service.list(body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(subscribers))
}
