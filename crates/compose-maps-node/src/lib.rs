//! Surface and overlay nodes for Compose-Maps.
//!
//! A [`SurfaceNode`] owns the native surface and, once the platform reports
//! it ready, the native root. [`OverlayNode`]s are its children; each places
//! one native overlay on the root. Both run their modifiers through a
//! [`ContributionChain`](compose_maps_core::ContributionChain) restricted to
//! the kinds they own.

mod error;
mod lifecycle;
mod overlay;
mod platform;
mod surface;

pub use error::NodeError;
pub use lifecycle::{LifecycleHooks, NodeOptions, NodeState};
pub use overlay::OverlayNode;
pub use platform::MapPlatform;
pub use surface::{RootReady, SurfaceNode};

pub mod prelude {
    pub use crate::{LifecycleHooks, MapPlatform, NodeError, NodeOptions, NodeState, OverlayNode, SurfaceNode};
    pub use compose_maps_core::prelude::*;
}
