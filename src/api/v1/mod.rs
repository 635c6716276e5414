/*
 * Responsibility
 * - v1 entry point: routes() re-export plus the modules handlers rely on
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
