//! cb-core
//!
//! The central domain logic and interface definitions for the club board.

pub mod clock;
pub mod error;
pub mod models;
pub mod seed;
pub mod service;
pub mod traits;

// Re-exporting for easier access in other crates
pub use clock::*;
pub use error::*;
pub use models::*;
pub use service::*;
pub use traits::*;
