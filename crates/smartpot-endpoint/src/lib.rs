//! `smartpot-endpoint` – request/response ingress.
//!
//! Serves a small REST API (default port `8080`) with axum.  Each route
//! turns its request into one [`Operation`][smartpot_types::Operation], runs
//! it through the shared [`Gateway`][smartpot_gateway::Gateway] and renders
//! the [`Reply`][smartpot_types::Reply] as JSON.
//!
//! # Modules
//!
//! - [`router`] – the route table and handlers.
//! - [`response`] – reply → status / headers / body.
//! - [`server`] – [`HttpEndpoint`], binding and graceful shutdown.

pub mod response;
pub mod router;
pub mod server;

pub use response::{ApiError, ApiReply};
pub use router::{router, AppState, MAX_WORKERS};
pub use server::{HttpEndpoint, DEFAULT_PORT, DEFAULT_WORKERS};
