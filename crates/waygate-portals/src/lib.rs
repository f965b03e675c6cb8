//! Portal registry: linking, style resolution, block rendering, persistence.
#![forbid(unsafe_code)]

pub mod block;
pub mod codec;
pub mod config;
pub mod ordering;
pub mod portal;
pub mod registry;
pub mod style;

pub use block::{BlockRole, PortalBlock};
pub use ordering::ProximityOrdering;
pub use portal::{GroupMembership, Icon, Orientation, OwnerId, Portal, PortalId, Visibility};
pub use registry::{ConsoleDisplay, LinkGraph, LoadReport, Portals, SharedPortals};
pub use style::{Style, StyleError, StyleKey, StyleRegistry};
