//! Read-only JSON API over the token database

mod server;

pub mod routes;
pub mod state;
pub mod utils;

pub use server::{build_app, shutdown, start_server};
pub use state::AppState;
