//! CORS for browser clients.
//!
//! Development allows any origin; production allows only `CORS_ALLOWED_ORIGINS`
//! (an empty list allows none). Credentials are never allowed: the token travels
//! in the `Authorization` header, not in cookies.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;
use crate::middleware::http::REQUEST_ID_HEADER;

pub fn apply(router: Router, config: &Config) -> Router {
    let origins = if config.app_env.is_production() {
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();
        AllowOrigin::list(allowed)
    } else {
        AllowOrigin::from(Any)
    };

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .max_age(Duration::from_secs(600));

    router.layer(cors)
}
