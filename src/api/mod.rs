//! HTTP surface: `POST /invoke` carries frames, `GET /health` reports mode.

mod error;
pub mod models;
mod server;
pub mod services;
pub mod sink;
pub mod state;
pub(crate) mod utils;

pub use error::ApiError;
pub use server::{router, run};
pub use sink::HttpEventSink;
pub use state::AppState;
