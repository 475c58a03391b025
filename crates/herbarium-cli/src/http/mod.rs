//! HTTP surface: public catalog, sign-in flow, and admin API.

pub mod error;
pub mod extract;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::serve;
pub use state::AppState;
