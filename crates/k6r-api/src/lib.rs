//! HTTP front end for the k6 run orchestrator.
//!
//! [`HttpApi`] mounts the `/runs` routes on an axum [`Router`](axum::Router) and delegates to an
//! [`ApiHandler`]; [`RunServiceAdapter`] is the handler backed by [`k6r_core::RunService`].
mod error;
pub use error::{ApiError, Problem};

mod handler;
pub use handler::ApiHandler;

mod adapter;
pub use adapter::RunServiceAdapter;

mod http;
pub use http::HttpApi;
