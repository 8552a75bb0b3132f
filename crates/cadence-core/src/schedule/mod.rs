//! Date scheduling.
//!
//! - [`resolver`] computes the earliest permissible start of an item from
//!   its predecessors and the predecessors of its automatically scheduled
//!   ancestors.
//! - [`propagation`] decides whether that start is applied and derives the
//!   due date from it.

pub mod propagation;
pub mod resolver;

pub use propagation::propagate;
pub use resolver::{ScheduleChange, SoonestStart, resolve_soonest, soonest_start};
