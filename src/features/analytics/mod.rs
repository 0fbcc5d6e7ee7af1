//! Warehouse view statements for reporting dashboards.
//!
//! Templates live in `templates/analytics/` and are compiled into the binary.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;
