use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{ClientId, LeadWindow, NewClient};
use super::service::{ClientService, ClientServiceError};
use super::store::ClientStore;

/// Router builder exposing client registration, lookup, and lead assignment.
pub fn client_router<S>(service: Arc<ClientService<S>>) -> Router
where
    S: ClientStore + 'static,
{
    Router::new()
        .route("/clients", get(list_handler::<S>).post(create_handler::<S>))
        .route("/clients/", get(list_handler::<S>).post(create_handler::<S>))
        .route("/clients/assign", post(assign_handler::<S>))
        .route("/clients/:id", get(get_handler::<S>))
        .with_state(service)
}

pub(crate) async fn list_handler<S>(State(service): State<Arc<ClientService<S>>>) -> Response
where
    S: ClientStore + 'static,
{
    match run_blocking(service, |service| service.list_clients()).await {
        Ok(clients) => (StatusCode::OK, Json(clients)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<ClientService<S>>>,
    Path(raw_id): Path<String>,
) -> Response
where
    S: ClientStore + 'static,
{
    let id = match raw_id.parse::<i64>() {
        Ok(id) => ClientId(id),
        Err(err) => {
            return error_response(ClientServiceError::Validation(format!(
                "client id '{raw_id}' is not an integer: {err}"
            )))
        }
    };

    match run_blocking(service, move |service| service.get_client(id)).await {
        Ok(clients) => (StatusCode::OK, Json(clients)).into_response(),
        Err(ClientServiceError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(format!("client with ID '{raw_id}' was not found")),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<ClientService<S>>>,
    payload: Result<Json<NewClient>, JsonRejection>,
) -> Response
where
    S: ClientStore + 'static,
{
    let Json(client) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(validation_error(rejection)),
    };

    match run_blocking(service, move |service| service.create_client(client)).await {
        Ok(_) => (StatusCode::OK, Json(true)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn assign_handler<S>(
    State(service): State<Arc<ClientService<S>>>,
    payload: Result<Json<LeadWindow>, JsonRejection>,
) -> Response
where
    S: ClientStore + 'static,
{
    let Json(window) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(validation_error(rejection)),
    };

    match run_blocking(service, move |service| service.assign_lead(window)).await {
        Ok(lead) => (StatusCode::OK, Json(lead)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Runs a service call on the blocking pool; store calls hold the connection lock.
pub(crate) async fn run_blocking<S, T, F>(
    service: Arc<ClientService<S>>,
    call: F,
) -> Result<T, ClientServiceError>
where
    S: ClientStore + 'static,
    T: Send + 'static,
    F: FnOnce(&ClientService<S>) -> Result<T, ClientServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|err| ClientServiceError::Interrupted(err.to_string()))?
}

fn validation_error(rejection: JsonRejection) -> ClientServiceError {
    ClientServiceError::Validation(rejection.body_text())
}

/// Lookups that find nothing answer 404 with a bare message; every other failure is a 500.
fn error_response(err: ClientServiceError) -> Response {
    match err {
        ClientServiceError::NotFound(_) => {
            (StatusCode::NOT_FOUND, Json(err.to_string())).into_response()
        }
        other => {
            match &other {
                ClientServiceError::Store(store) => error!(error = %store, "client store failure"),
                ClientServiceError::Interrupted(reason) => {
                    error!(reason = %reason, "client request aborted")
                }
                _ => {}
            }
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
