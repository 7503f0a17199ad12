use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::domain::{EmailBody, ListSubscribersBody, UpdateSubscriberBody};
use crate::rpc::protocol::RpcError;
use crate::service::SubscriberService;

pub const CREATE_EMAIL: &str = "CreateEmail";
pub const GET_EMAIL: &str = "GetEmail";
pub const UPDATE_EMAIL: &str = "UpdateEmail";
pub const DELETE_EMAIL: &str = "DeleteEmail";
pub const GET_EMAIL_BATCH: &str = "GetEmailBatch";

/// Runs one procedure against the service and encodes its result.
pub async fn dispatch(
    service: &SubscriberService,
    method: &str,
    params: Value,
) -> Result<Value, RpcError> {
    match method {
        CREATE_EMAIL => {
            let body: EmailBody = parse_params(params)?;
            to_result(service.create(body).await?)
        }
        GET_EMAIL => {
            let body: EmailBody = parse_params(params)?;
            to_result(service.get(&body.email).await?)
        }
        UPDATE_EMAIL => {
            let body: UpdateSubscriberBody = parse_params(params)?;
            to_result(service.update(body).await?)
        }
        DELETE_EMAIL => {
            let body: EmailBody = parse_params(params)?;
            to_result(service.delete(&body.email).await?)
        }
        GET_EMAIL_BATCH => {
            let body: ListSubscribersBody = parse_params(params)?;
            to_result(service.list(body).await?)
        }
        unknown => Err(RpcError::method_not_found(unknown)),
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|err| RpcError::invalid_params(err.to_string()))
}

fn to_result(value: impl Serialize) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|err| RpcError::internal(err.to_string()))
}
