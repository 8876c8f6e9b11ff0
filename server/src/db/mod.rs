//! Database module for PostgreSQL persistence.

mod pool;
mod state;

pub use pool::*;
pub use state::*;
