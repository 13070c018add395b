//! Capability kinds that route contributions to native objects.
//!
//! Every contribution declares the set of kinds it applies to. The set is a
//! small typed bitset so a single descriptor can target several kinds at
//! once, while [`Kind`] is the closed enum the reconciliation engine uses to
//! index its per-kind buckets.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Set of capability kinds a contribution applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KindSet: u32 {
        /// The surface view that hosts the map and its overlays.
        const SURFACE = 1 << 0;
        /// The native root resource, available once the surface is ready.
        const ROOT = 1 << 1;
        /// A single placed overlay object.
        const OVERLAY = 1 << 2;
        /// Reserved for engine bookkeeping. Never valid on a descriptor.
        const ANY = 1 << 31;
    }
}

impl KindSet {
    /// Every kind a descriptor may legitimately declare.
    pub const USER: KindSet = KindSet::SURFACE
        .union(KindSet::ROOT)
        .union(KindSet::OVERLAY);

    /// Returns true when `kind` is a member of this set.
    #[inline]
    pub fn contains_kind(self, kind: Kind) -> bool {
        self.intersects(kind.set())
    }

    /// Returns true when the reserved [`KindSet::ANY`] bit is present.
    #[inline]
    pub fn is_reserved(self) -> bool {
        self.contains(KindSet::ANY)
    }

    /// Iterates the user kinds in this set in bucket order.
    pub fn kinds(self) -> impl Iterator<Item = Kind> {
        Kind::ALL
            .into_iter()
            .filter(move |kind| self.contains_kind(*kind))
    }
}

/// A single capability kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Surface,
    Root,
    Overlay,
}

impl Kind {
    pub const COUNT: usize = 3;

    /// All kinds in bucket order.
    pub const ALL: [Kind; Kind::COUNT] = [Kind::Surface, Kind::Root, Kind::Overlay];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn set(self) -> KindSet {
        match self {
            Kind::Surface => KindSet::SURFACE,
            Kind::Root => KindSet::ROOT,
            Kind::Overlay => KindSet::OVERLAY,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Kind::Surface => "surface",
            Kind::Root => "root",
            Kind::Overlay => "overlay",
        }
    }
}

impl From<Kind> for KindSet {
    fn from(kind: Kind) -> Self {
        kind.set()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
