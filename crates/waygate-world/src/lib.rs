//! Worlds, locations, and lazily resolved location references.
#![forbid(unsafe_code)]

pub mod lazy;
pub mod world;

pub use lazy::LazyLocation;
pub use world::{Location, World, WorldList, WorldLookup};
