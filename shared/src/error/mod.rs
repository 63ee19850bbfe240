//! Unified error system
//!
//! - [`ErrorCode`]: Standardized numeric error codes
//! - [`ErrorKind`]: Coarse failure taxonomy every code maps onto
//! - [`ErrorCategory`]: Classification of codes by domain
//! - [`AppError`]: Rich error type with code, message and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product errors
//! - 7xxx: Table errors
//! - 8xxx: Cashier session errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ErrorKind};
//!
//! let err = AppError::with_message(ErrorCode::TableOccupied, "Table 4 is occupied")
//!     .with_detail("table_number", 4);
//! assert_eq!(err.kind(), ErrorKind::Conflict);
//! ```

mod category;
mod codes;
mod kind;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use kind::ErrorKind;
pub use types::{AppError, AppResult};
