//! Unified error codes for the POS core
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product / catalog errors
//! - 7xxx: Table errors
//! - 8xxx: Cashier session errors
//! - 9xxx: System errors

use super::kind::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that callers in any
/// language can match on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field is missing
    RequiredField = 7,
    /// Value is out of range
    ValueOutOfRange = 8,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role is required
    RoleRequired = 2002,
    /// Administrator role is required
    AdminRequired = 2003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4002,
    /// Status transition not allowed from the current status
    InvalidStatusTransition = 4003,
    /// Order is paid, items and totals are frozen
    OrderFrozen = 4004,
    /// Order has been canceled
    OrderCanceled = 4005,
    /// Order line not found
    ItemNotFound = 4006,
    /// More than one line matches, an instance id is required
    AmbiguousItem = 4007,
    /// Kitchen items must be prepared before settlement
    KitchenItemsPending = 4008,
    /// Order is not a delivery/pickup order ready for hand-over
    NotDeliverable = 4009,

    // ==================== 5xxx: Payment ====================
    /// Tendered cash is below the order total
    InsufficientPayment = 5001,
    /// Invalid money amount
    InvalidAmount = 5002,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product is deactivated
    ProductInactive = 6002,
    /// Category not found
    CategoryNotFound = 6003,
    /// Option selection does not match the product's option groups
    InvalidOptionSelection = 6004,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is occupied by another order
    TableOccupied = 7002,
    /// Table is closed for service
    TableClosed = 7003,
    /// Table still references a live order
    TableStillInUse = 7004,

    // ==================== 8xxx: Cashier session ====================
    /// A cashier session is already open
    SessionAlreadyOpen = 8001,
    /// No cashier session is open
    NoOpenSession = 8002,
    /// Cashier session not found
    SessionNotFound = 8003,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Storage unavailable (database / transaction / IO)
    StorageUnavailable = 9002,
    /// Storage full (disk space insufficient)
    StorageFull = 9003,
    /// Storage corrupted (data file damaged)
    StorageCorrupted = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Map the code onto the coarse failure taxonomy
    pub const fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::Success | ErrorCode::Unknown | ErrorCode::InternalError => {
                ErrorKind::Internal
            }
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidRequest
            | ErrorCode::RequiredField
            | ErrorCode::ValueOutOfRange
            | ErrorCode::OrderEmpty
            | ErrorCode::AmbiguousItem
            | ErrorCode::InvalidAmount
            | ErrorCode::ProductInactive
            | ErrorCode::InvalidOptionSelection => ErrorKind::Validation,
            ErrorCode::NotFound
            | ErrorCode::OrderNotFound
            | ErrorCode::ItemNotFound
            | ErrorCode::ProductNotFound
            | ErrorCode::CategoryNotFound
            | ErrorCode::TableNotFound
            | ErrorCode::SessionNotFound => ErrorKind::NotFound,
            ErrorCode::InvalidStatusTransition
            | ErrorCode::OrderFrozen
            | ErrorCode::OrderCanceled
            | ErrorCode::KitchenItemsPending
            | ErrorCode::NotDeliverable
            | ErrorCode::TableClosed
            | ErrorCode::TableStillInUse
            | ErrorCode::NoOpenSession => ErrorKind::InvalidState,
            ErrorCode::AlreadyExists
            | ErrorCode::TableOccupied
            | ErrorCode::SessionAlreadyOpen => ErrorKind::Conflict,
            ErrorCode::InsufficientPayment => ErrorKind::InsufficientPayment,
            ErrorCode::PermissionDenied | ErrorCode::RoleRequired | ErrorCode::AdminRequired => {
                ErrorKind::Permission
            }
            ErrorCode::StorageUnavailable
            | ErrorCode::StorageFull
            | ErrorCode::StorageCorrupted => ErrorKind::StorageUnavailable,
        }
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::InvalidStatusTransition => "Status transition is not allowed",
            ErrorCode::OrderFrozen => "Order is paid and can no longer change",
            ErrorCode::OrderCanceled => "Order has been canceled",
            ErrorCode::ItemNotFound => "Order item not found",
            ErrorCode::AmbiguousItem => "Several lines match, specify the line instance",
            ErrorCode::KitchenItemsPending => "Kitchen items must be prepared before payment",
            ErrorCode::NotDeliverable => "Order cannot be marked as delivered",

            // Payment
            ErrorCode::InsufficientPayment => "Insufficient payment amount",
            ErrorCode::InvalidAmount => "Invalid amount",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ProductInactive => "Product is not available",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::InvalidOptionSelection => "Invalid option selection",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableOccupied => "Table is occupied",
            ErrorCode::TableClosed => "Table is closed for service",
            ErrorCode::TableStillInUse => "Table still holds a live order",

            // Session
            ErrorCode::SessionAlreadyOpen => "A cashier session is already open",
            ErrorCode::NoOpenSession => "No cashier session is open",
            ErrorCode::SessionNotFound => "Cashier session not found",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::StorageUnavailable => "Storage unavailable",
            ErrorCode::StorageFull => "Storage full (disk space insufficient)",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::InvalidStatusTransition),
            4004 => Ok(ErrorCode::OrderFrozen),
            4005 => Ok(ErrorCode::OrderCanceled),
            4006 => Ok(ErrorCode::ItemNotFound),
            4007 => Ok(ErrorCode::AmbiguousItem),
            4008 => Ok(ErrorCode::KitchenItemsPending),
            4009 => Ok(ErrorCode::NotDeliverable),

            // Payment
            5001 => Ok(ErrorCode::InsufficientPayment),
            5002 => Ok(ErrorCode::InvalidAmount),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInactive),
            6003 => Ok(ErrorCode::CategoryNotFound),
            6004 => Ok(ErrorCode::InvalidOptionSelection),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableOccupied),
            7003 => Ok(ErrorCode::TableClosed),
            7004 => Ok(ErrorCode::TableStillInUse),

            // Session
            8001 => Ok(ErrorCode::SessionAlreadyOpen),
            8002 => Ok(ErrorCode::NoOpenSession),
            8003 => Ok(ErrorCode::SessionNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StorageUnavailable),
            9003 => Ok(ErrorCode::StorageFull),
            9004 => Ok(ErrorCode::StorageCorrupted),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}
