//! Category Model

use serde::{Deserialize, Serialize};

/// Category entity
///
/// `display_order` is unique and sequential: a new category gets
/// `max + 1` (or 1 when none exist).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub display_order: i32,
}
