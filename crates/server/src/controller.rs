//! Ledger-side handlers behind the legacy GET routes.
//!
//! Each operation receives the raw path parameter together with the
//! untouched request and owns the whole response, including the plain-text
//! sentinel bodies the browser front end matches on.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use server_api::ApiContext;
use shared::{
    domain::{PointsKey, PointsRecord},
    error::{ApiError, ErrorCode},
    protocol::{HolderSegment, PointsSegment, HOLDER_NOT_FOUND_SENTINEL, POINTS_NOT_FOUND_SENTINEL},
};
use tracing::{debug, info, warn};

#[async_trait]
pub trait PointsController: Send + Sync {
    async fn get_points(&self, id: String, request: Request) -> Response;
    async fn add_points(&self, points: String, request: Request) -> Response;
    async fn get_all_points(&self, request: Request) -> Response;
    async fn change_holder(&self, holder: String, request: Request) -> Response;
}

pub type SharedController = Arc<dyn PointsController>;

pub struct LedgerController {
    api: ApiContext,
}

impl LedgerController {
    pub fn new(api: ApiContext) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PointsController for LedgerController {
    async fn get_points(&self, id: String, request: Request) -> Response {
        let key = PointsKey(id);
        match server_api::query_points(&self.api, &key).await {
            Ok(record) => {
                debug!(%key, holder = %record.holder, "points lookup hit");
                Json(record).into_response()
            }
            Err(err) if err.code == ErrorCode::NotFound => {
                info!(%key, uri = %request.uri(), "points lookup missed");
                (StatusCode::OK, POINTS_NOT_FOUND_SENTINEL).into_response()
            }
            Err(err) => failure("get_points", err),
        }
    }

    async fn add_points(&self, points: String, request: Request) -> Response {
        let segment = match PointsSegment::decode(&points) {
            Ok(segment) => segment,
            Err(err) => {
                warn!(uri = %request.uri(), %err, "rejected points segment");
                return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
            }
        };

        let key = PointsKey(segment.id);
        let record = PointsRecord {
            scheme_id: segment.scheme_id,
            timestamp: segment.timestamp,
            location: segment.location,
            holder: segment.holder,
        };
        match server_api::record_points(&self.api, &key, record).await {
            Ok(receipt) => {
                debug!(%key, tx_id = %receipt.tx_id, "points segment recorded");
                (StatusCode::OK, receipt.tx_id.0).into_response()
            }
            Err(err) => failure("add_points", err),
        }
    }

    async fn get_all_points(&self, _request: Request) -> Response {
        match server_api::query_all_points(&self.api).await {
            Ok(entries) => Json(entries).into_response(),
            Err(err) => failure("get_all_points", err),
        }
    }

    async fn change_holder(&self, holder: String, request: Request) -> Response {
        let segment = match HolderSegment::decode(&holder) {
            Ok(segment) => segment,
            Err(err) => {
                warn!(uri = %request.uri(), %err, "rejected holder segment");
                return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
            }
        };

        let key = PointsKey(segment.id);
        match server_api::change_points_holder(&self.api, &key, &segment.name).await {
            Ok(receipt) => (StatusCode::OK, receipt.tx_id.0).into_response(),
            Err(err) if err.code == ErrorCode::NotFound => {
                info!(%key, "holder change for unknown points");
                (StatusCode::OK, HOLDER_NOT_FOUND_SENTINEL).into_response()
            }
            Err(err) => failure("change_holder", err),
        }
    }
}

fn failure(operation: &'static str, err: ApiError) -> Response {
    warn!(operation, code = ?err.code, message = %err.message, "ledger operation failed");
    let status = StatusCode::from_u16(err.code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.message).into_response()
}
