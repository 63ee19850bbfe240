//! Order lifecycle engine
//!
//! - **actions**: one command handler per command (validate, emit events)
//! - **appliers**: fold events into snapshots
//! - **manager**: [`OrdersManager`], the command entry point and queries
//! - **money**: decimal arithmetic and totals
//! - **reducer**: catalog product → order item (price capture, instance ids)
//!
//! ```text
//! OrderCommand → OrdersManager → CommandAction → OrderEvent(s)
//!                     ↓                               ↓
//!              redb transaction  ←──  EventAction (snapshot update)
//!                     ↓
//!             broadcast to subscribers
//! ```

pub mod traits;

pub mod actions;
pub mod appliers;
pub mod manager;
pub mod money;
pub mod reducer;

pub use manager::{ManagerError, ManagerResult, OrdersManager};
pub use reducer::{generate_instance_id, input_to_item};
