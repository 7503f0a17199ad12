//! Remote procedure front-end: JSON-RPC 2.0 over HTTP.
mod methods;
pub mod protocol;

use actix_web::{web, HttpResponse};
use serde_json::Value;

use crate::service::SubscriberService;
pub use methods::{CREATE_EMAIL, DELETE_EMAIL, GET_EMAIL, GET_EMAIL_BATCH, UPDATE_EMAIL};
use protocol::{RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION};

/// Every answered call is a 200: failures travel inside the JSON-RPC error object.
#[tracing::instrument(
    name = "RPC handler",
    skip(body, service),
    fields(rpc_method = tracing::field::Empty)
)]
pub async fn handle_rpc(body: web::Bytes, service: web::Data<SubscriberService>) -> HttpResponse {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!("Unparsable RPC payload: {}", err);
            return reply(RpcResponse::failure(
                Value::Null,
                RpcError::parse_error(err.to_string()),
            ));
        }
    };
    let id = payload.get("id").cloned().unwrap_or(Value::Null);

    // Batches and positional requests are not supported
    if !payload.is_object() {
        return reply(RpcResponse::failure(
            Value::Null,
            RpcError::invalid_request("Request must be a JSON object"),
        ));
    }

    let request: RpcRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(err) => {
            return reply(RpcResponse::failure(
                id,
                RpcError::invalid_request(err.to_string()),
            ))
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return reply(RpcResponse::failure(
            id,
            RpcError::invalid_request(format!("Unsupported jsonrpc version {}", request.jsonrpc)),
        ));
    }

    tracing::Span::current().record("rpc_method", &request.method.as_str());

    let outcome = methods::dispatch(&service, &request.method, request.params).await;

    match request.id {
        None => HttpResponse::NoContent().finish(),
        Some(id) => match outcome {
            Ok(result) => reply(RpcResponse::success(id, result)),
            Err(err) => reply(RpcResponse::failure(id, err)),
        },
    }
}

fn reply(response: RpcResponse) -> HttpResponse {
    HttpResponse::Ok().json(response)
}
