/*
 * Responsibility
 * - Router-wide layers: authentication, CORS, transport (request id, limits, tracing)
 */
pub mod auth;
pub mod cors;
pub mod http;
