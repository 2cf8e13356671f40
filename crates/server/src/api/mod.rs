//! Typed v1 endpoints: JSON bodies in, `ApiError` + status code out.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use shared::{
    domain::{LedgerEntry, PointsKey, PointsRecord},
    error::ApiError,
    protocol::{
        ChangeHolderRequest, RecordPointsRequest, TxReceipt, V1_HOLDER_ROUTE,
        V1_POINTS_BY_ID_ROUTE, V1_POINTS_ROUTE,
    },
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::app_state::AppState;

const MAX_BODY_BYTES: usize = 16 * 1024;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub(crate) fn v1_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(V1_POINTS_ROUTE, get(list_points).post(record_points))
        .route(V1_POINTS_BY_ID_ROUTE, get(get_points))
        .route(V1_HOLDER_ROUTE, put(change_holder))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn list_points(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<LedgerEntry>>> {
    let entries = server_api::query_all_points(&state.api)
        .await
        .map_err(reject)?;
    Ok(Json(entries))
}

async fn get_points(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PointsRecord>> {
    let record = server_api::query_points(&state.api, &PointsKey(id))
        .await
        .map_err(reject)?;
    Ok(Json(record))
}

async fn record_points(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RecordPointsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TxReceipt>)> {
    let Json(req) = payload.map_err(bad_body)?;
    let receipt = server_api::record_points_checked(&state.api, &req)
        .await
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn change_holder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ChangeHolderRequest>, JsonRejection>,
) -> ApiResult<Json<TxReceipt>> {
    let Json(req) = payload.map_err(bad_body)?;
    if req.holder.trim().is_empty() {
        return Err(reject(ApiError::validation("holder must not be empty")));
    }
    let receipt = server_api::change_points_holder(&state.api, &PointsKey(id), &req.holder)
        .await
        .map_err(reject)?;
    Ok(Json(receipt))
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = StatusCode::from_u16(err.code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err))
}

fn bad_body(rejection: JsonRejection) -> (StatusCode, Json<ApiError>) {
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(ApiError::validation(rejection.body_text())))
}
