//! Data models
//!
//! Shared between the order core and its callers. Every record is stored
//! as a JSON document keyed by its string id.

pub mod cart;
pub mod cashier_session;
pub mod category;
pub mod dining_table;
pub mod product;
pub mod role;
pub mod settings;

// Re-exports
pub use cart::*;
pub use cashier_session::*;
pub use category::*;
pub use dining_table::*;
pub use product::*;
pub use role::*;
pub use settings::*;
