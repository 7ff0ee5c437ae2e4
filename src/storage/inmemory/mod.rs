//! In-memory storage implementations
//!
//! Suitable for development and testing; users are lost on restart.

mod users;

pub use users::MemoryUserStore;
