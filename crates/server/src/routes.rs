//! Legacy URL dispatcher: four GET patterns, each forwarded to one
//! [`PointsController`](crate::controller::PointsController) operation
//! with the request left as received.

use axum::{
    extract::{Path, Request, State},
    response::Response,
    routing::get,
    Router,
};
use shared::protocol::{
    get_all_points_path, ADD_POINTS_ROUTE, CHANGE_HOLDER_ROUTE, GET_ALL_POINTS_ROUTE,
    GET_POINTS_ROUTE,
};

use crate::controller::SharedController;

pub fn legacy_router(controller: SharedController) -> Router {
    Router::new()
        .route(GET_POINTS_ROUTE, get(get_points))
        .route(ADD_POINTS_ROUTE, get(add_points))
        .route(GET_ALL_POINTS_ROUTE, get(get_all_points))
        .route(get_all_points_path(), get(get_all_points))
        .route(CHANGE_HOLDER_ROUTE, get(change_holder))
        .with_state(controller)
}

async fn get_points(
    State(controller): State<SharedController>,
    Path(id): Path<String>,
    request: Request,
) -> Response {
    controller.get_points(id, request).await
}

async fn add_points(
    State(controller): State<SharedController>,
    Path(points): Path<String>,
    request: Request,
) -> Response {
    controller.add_points(points, request).await
}

async fn get_all_points(State(controller): State<SharedController>, request: Request) -> Response {
    controller.get_all_points(request).await
}

async fn change_holder(
    State(controller): State<SharedController>,
    Path(holder): Path<String>,
    request: Request,
) -> Response {
    controller.change_holder(holder, request).await
}

#[cfg(test)]
#[path = "tests/routes_tests.rs"]
mod tests;
