//! Shared types for the POS workspace
//!
//! Domain data shared by every caller of the order core: catalog and
//! table models, cashier sessions, the order snapshot/command/event
//! types and the unified error code system.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode, ErrorKind};
