pub mod chat;
pub mod history;
pub mod types;
pub mod utils;

pub use types::*;
