//! Paginated collection browsing.
//!
//! - [`PageNavigator`] walks one cursor-linked collection a page at a time
//! - [`FilterCoordinator`] decides which filter edits are significant
//! - [`Collection`] binds the two to a parent entity so every filter reload
//!   restarts from the first page

pub mod collection;
pub mod filters;
pub mod navigator;

pub use collection::Collection;
pub use filters::{ActiveFilters, FilterCoordinator, FilterOutcome, FilterRule};
pub use navigator::{CursorSnapshot, NavOutcome, PageNavigator};
