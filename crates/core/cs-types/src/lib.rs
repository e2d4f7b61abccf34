//! Core types for cloudsweep.
//!
//! This crate provides the foundational types used throughout the system:
//! - [`Record`] - One retrieved unit of data (log event, table item, queue message)
//! - [`Page`] and [`PageCursor`] - One bounded fetch and its continuation
//! - [`TimeWindow`] - Fixed retrieval window for time-bounded sources
//! - [`Artifact`] - A finalized chunk on local disk
//! - [`Statement`] - A decomposed policy statement
//! - [`ToolConfig`] and [`RegionSetting`] - Invocation-time configuration

pub mod artifact;
pub mod config;
pub mod record;
pub mod statement;

pub use artifact::*;
pub use config::*;
pub use record::*;
pub use statement::*;
