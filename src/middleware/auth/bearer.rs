//! Bearer token → SecurityContext in request extensions.
//!
//! Runs on every route. It never rejects: a missing, malformed, expired or
//! unresolvable token leaves the request anonymous, and the `CurrentUser`
//! extractor turns that into a 401 only where a handler asks for a user.

use std::net::SocketAddr;

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::middleware::http::REQUEST_ID_HEADER;
use crate::services::auth::RequestDetails;
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // from_fn cannot see router state in axum 0.8, so hand it over explicitly.
    router.layer(middleware::from_fn_with_state(state, bearer_middleware))
}

async fn bearer_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let details = RequestDetails {
        client_ip: req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip()),
        request_id: req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let ctx = state
        .pipeline
        .authenticate(req.headers().get(header::AUTHORIZATION), details)
        .await;

    // Read back by the CurrentUser extractor.
    req.extensions_mut().insert(ctx);

    next.run(req).await
}
