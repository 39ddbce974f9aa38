//! Prediction HTTP service, compiled with the `http` feature.
//!
//! A small Axum server exposing health and prediction endpoints over a shared
//! `AppContext`. Clients post the raw audio bytes; the page, upload widget and
//! plotting live in whatever front end calls it.

mod routes;

pub use routes::{build_router, run_http_server, HttpServerError, HttpState};

#[cfg(test)]
mod tests;
