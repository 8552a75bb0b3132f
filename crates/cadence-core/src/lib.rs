//! cadence-core library.
//!
//! The date-scheduling and attribute-consistency engine for hierarchical,
//! dependency-linked work packages. The single entry point is
//! [`resolve::resolve_attributes`]: given one work item, a set of requested
//! attribute changes and read access to the surrounding graph, it returns
//! the attributes the caller should persist.
//!
//! # Conventions
//!
//! - **Errors**: domain errors are `thiserror` enums; config loading uses
//!   `anyhow::Result` with context.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//! - **Purity**: nothing in this crate performs I/O except [`config`] and
//!   [`snapshot`] loaders. All graph reads go through [`graph::WorkGraph`]
//!   and [`catalog::Catalog`].

pub mod catalog;
pub mod cleanup;
pub mod config;
pub mod contract;
pub mod dates;
pub mod defaults;
pub mod error;
pub mod graph;
pub mod model;
pub mod reconcile;
pub mod resolve;
pub mod schedule;
pub mod snapshot;

pub use resolve::{ResolveContext, ResolvedAttributes, resolve_attributes};
