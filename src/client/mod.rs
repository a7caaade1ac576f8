//! Backend client module
//!
//! - The [`PageSource`] and [`LockUpdater`] traits at the seam between the
//!   console and the payroll backend
//! - [`HttpBackend`], the reqwest implementation of every trait
//! - [`StaticPages`], an in-memory page chain used by tests and dry runs

pub mod http;
pub mod memory;
pub mod resource;
pub mod trait_;

pub use http::HttpBackend;
pub use memory::StaticPages;
pub use resource::Resource;
pub use trait_::{BatchCreator, LockUpdater, PageRequest, PageSource};
