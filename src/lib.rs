//! coursehub: online course catalog and enrollment backend.

pub mod catalog;
pub mod config;
pub mod core;
pub mod enrollment;
pub mod feedback;
pub mod main_module;

pub use crate::core::error::{CatalogError, CatalogResult};
pub use crate::core::shared::state::AppState;
pub use crate::core::store::{CatalogStore, InMemoryCatalogStore, PgCatalogStore};
pub use main_module::{build_router, run_server};
