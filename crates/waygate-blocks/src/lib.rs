//! Materials, the material catalog, and the block store boundary.
#![forbid(unsafe_code)]

pub mod material;
pub mod store;
pub mod types;

pub use material::MaterialCatalog;
pub use store::BlockStore;
pub use types::MaterialId;
