//! Web layer for the train scheduler.
//!
//! JSON endpoints for the track network registry and for scheduling trips.

mod dto;
mod routes;
mod state;


pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
