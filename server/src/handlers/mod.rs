//! Request handlers.
//!
//! Handlers hold the endpoint logic and are shared by the HTTP routes and the
//! WebSocket protocol; routes only extract and wrap.

mod auth;
mod backup;
mod insights;
mod state;
mod websocket;

pub use auth::*;
pub use backup::*;
pub use insights::*;
pub use state::*;
pub use websocket::*;
