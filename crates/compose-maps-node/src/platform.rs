use compose_maps_core::Platform;

use crate::surface::RootReady;

/// Native operations nodes need beyond contributing properties.
pub trait MapPlatform: Platform {
    /// Asks the surface for its root resource.
    ///
    /// The platform must call [`RootReady::fire`] at most once, either before
    /// returning or at any later point on the same thread.
    fn request_root(surface: &mut Self::Surface, ready: RootReady<Self>);

    /// Places an overlay on the root.
    fn attach_overlay(overlay: &mut Self::Overlay, root: &mut Self::Root);

    /// Removes an overlay from whatever root it was placed on.
    fn detach_overlay(overlay: &mut Self::Overlay);
}
