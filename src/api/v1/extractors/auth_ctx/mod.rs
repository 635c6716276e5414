/**
 * Responsibility
 *  - Bundle core and expose only the extractor handlers use
 */
mod core;

pub use core::CurrentUser;
