//! Native object types and the kind-tagged dispatch union.

use std::fmt;

use crate::kind::Kind;

/// Names the concrete native object type behind each capability kind.
///
/// Native objects are expected to be cheap handles (for example references
/// into a platform toolkit) so contributors may keep a clone around to undo
/// their effect later.
pub trait Platform: Sized + 'static {
    type Surface: Clone + 'static;
    type Root: Clone + 'static;
    type Overlay: Clone + 'static;
}

/// Mutable access to the native object a contributor is applied against.
///
/// This is the single dispatch point between generic contributors and
/// concrete natives: contributors match on the variant instead of
/// downcasting.
pub enum Target<'a, P: Platform> {
    Surface(&'a mut P::Surface),
    Root(&'a mut P::Root),
    Overlay(&'a mut P::Overlay),
}

impl<'a, P: Platform> Target<'a, P> {
    pub fn kind(&self) -> Kind {
        match self {
            Target::Surface(_) => Kind::Surface,
            Target::Root(_) => Kind::Root,
            Target::Overlay(_) => Kind::Overlay,
        }
    }

    /// Reborrows the target for a shorter lifetime so it can be handed to
    /// several contributors in turn.
    pub fn reborrow(&mut self) -> Target<'_, P> {
        match self {
            Target::Surface(surface) => Target::Surface(&mut **surface),
            Target::Root(root) => Target::Root(&mut **root),
            Target::Overlay(overlay) => Target::Overlay(&mut **overlay),
        }
    }

    /// Clones the underlying handle.
    pub fn to_native(&self) -> Native<P> {
        match self {
            Target::Surface(surface) => Native::Surface((**surface).clone()),
            Target::Root(root) => Native::Root((**root).clone()),
            Target::Overlay(overlay) => Native::Overlay((**overlay).clone()),
        }
    }
}

impl<P: Platform> fmt::Debug for Target<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Target").field(&self.kind()).finish()
    }
}

/// An owned native handle tagged with its kind.
pub enum Native<P: Platform> {
    Surface(P::Surface),
    Root(P::Root),
    Overlay(P::Overlay),
}

impl<P: Platform> Native<P> {
    pub fn kind(&self) -> Kind {
        match self {
            Native::Surface(_) => Kind::Surface,
            Native::Root(_) => Kind::Root,
            Native::Overlay(_) => Kind::Overlay,
        }
    }

    pub fn as_target(&mut self) -> Target<'_, P> {
        match self {
            Native::Surface(surface) => Target::Surface(surface),
            Native::Root(root) => Target::Root(root),
            Native::Overlay(overlay) => Target::Overlay(overlay),
        }
    }
}

impl<P: Platform> Clone for Native<P> {
    fn clone(&self) -> Self {
        match self {
            Native::Surface(surface) => Native::Surface(surface.clone()),
            Native::Root(root) => Native::Root(root.clone()),
            Native::Overlay(overlay) => Native::Overlay(overlay.clone()),
        }
    }
}

impl<P: Platform> fmt::Debug for Native<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Native").field(&self.kind()).finish()
    }
}
