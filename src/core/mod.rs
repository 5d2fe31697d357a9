pub mod error;
pub mod extract;
pub mod shared;
pub mod store;
