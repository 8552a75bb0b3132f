//! Work item data model.
//!
//! - [`ids`]: opaque identifiers for items and catalog entries.
//! - [`item`]: the [`WorkItem`](item::WorkItem) attribute set and the
//!   closed [`Field`](item::Field) enumeration.
//! - [`relation`]: typed relations between items.
//! - [`changes`]: a partial attribute update as requested by a caller.

pub mod changes;
pub mod ids;
pub mod item;
pub mod relation;
