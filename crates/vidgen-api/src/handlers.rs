//! API handlers.

pub mod generations;
pub mod health;

pub use generations::{get_generation, list_generations, submit_generation};
pub use health::{health, ready};
