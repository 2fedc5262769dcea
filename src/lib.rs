pub mod assistant;
pub mod config;
pub mod conversations;
pub mod error;
pub mod routes;
pub mod state;

pub use crate::config::Config;
pub use crate::routes::build_router;
pub use crate::state::AppState;
