//! Recording descriptors, one per native setter, in the shape a code
//! generator would emit them.

use std::fmt;
use std::rc::Rc;

use compose_maps_core::{Contribution, Contributor, Kind, KindSet, Modifier, Native, Target};

use crate::call_log::CallLog;
use crate::fake::{native_record, target_record, FakeOverlay, FakePlatform, FakeSurface, RecordHandle};

/// Live state of a recording property descriptor.
pub struct PropertyContributor<V> {
    key: &'static str,
    value: V,
    log: CallLog,
    applied_to: Option<RecordHandle>,
}

impl<V> PropertyContributor<V> {
    fn new(key: &'static str, value: V, log: CallLog) -> Self {
        Self {
            key,
            value,
            log,
            applied_to: None,
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Removes the property from the native it was last written to.
    fn undo(&mut self) {
        if let Some(record) = self.applied_to.take() {
            record.borrow_mut().props.remove(self.key);
        }
    }
}

impl<V: fmt::Display + 'static> Contributor<FakePlatform> for PropertyContributor<V> {
    fn contribute(&mut self, target: Target<'_, FakePlatform>) {
        let record = target_record(&target);
        let label = record.borrow().label.clone();
        record
            .borrow_mut()
            .props
            .insert(self.key, self.value.to_string());
        self.log
            .push(format!("contribute:{}={}@{label}", self.key, self.value));
        self.applied_to = Some(record);
    }
}

macro_rules! recording_property {
    ($(#[$meta:meta])* $name:ident, $key:literal, $value:ty, $kinds:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            pub value: $value,
            log: CallLog,
        }

        impl $name {
            pub fn new(value: $value, log: &CallLog) -> Self {
                Self {
                    value,
                    log: log.clone(),
                }
            }

            pub fn modifier(value: $value, log: &CallLog) -> Modifier<FakePlatform> {
                Modifier::element(Self::new(value, log))
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.value == other.value
            }
        }

        impl Contribution<FakePlatform> for $name {
            type Contributor = PropertyContributor<$value>;

            fn kinds(&self) -> KindSet {
                $kinds
            }

            fn create(&self) -> Self::Contributor {
                self.log.push(format!("create:{}={}", $key, self.value));
                PropertyContributor::new($key, self.value.clone(), self.log.clone())
            }

            fn update(&self, contributor: &mut Self::Contributor) {
                self.log.push(format!("update:{}={}", $key, self.value));
                contributor.value = self.value.clone();
            }

            fn on_attach(&self, contributor: &mut Self::Contributor) {
                self.log
                    .push(format!("attach:{}={}", $key, contributor.value));
            }

            fn on_detach(&self, contributor: &mut Self::Contributor) {
                self.log
                    .push(format!("detach:{}={}", $key, contributor.value));
                contributor.undo();
            }
        }
    };
}

recording_property!(
    /// Overlay stroke color.
    SetColor, "color", &'static str, KindSet::OVERLAY
);
recording_property!(
    /// Circle radius in meters.
    SetRadius, "radius", u32, KindSet::OVERLAY
);
recording_property!(SetVisible, "visible", bool, KindSet::OVERLAY);
recording_property!(SetZIndex, "z_index", i32, KindSet::OVERLAY);
recording_property!(
    /// Base map type of the root.
    SetMapType, "map_type", &'static str, KindSet::ROOT
);
recording_property!(SetPadding, "padding", u32, KindSet::SURFACE);
recording_property!(
    /// Accessibility label written to both the surface and the root.
    SetContentDescription, "content_description", &'static str,
    KindSet::SURFACE.union(KindSet::ROOT)
);

/// Owning delegate that hands a pre-built native to the node instead of
/// letting the node invoke its factory.
#[derive(Clone)]
pub struct Adopt {
    native: Native<FakePlatform>,
    kinds: KindSet,
    log: CallLog,
}

impl Adopt {
    pub fn surface(surface: FakeSurface, log: &CallLog) -> Self {
        Self {
            native: Native::Surface(surface),
            kinds: KindSet::SURFACE,
            log: log.clone(),
        }
    }

    pub fn overlay(overlay: FakeOverlay, log: &CallLog) -> Self {
        Self {
            native: Native::Overlay(overlay),
            kinds: KindSet::OVERLAY,
            log: log.clone(),
        }
    }

    /// Declares different kinds than the native it holds.
    pub fn with_kinds(mut self, kinds: KindSet) -> Self {
        self.kinds = kinds;
        self
    }

    pub fn modifier(self) -> Modifier<FakePlatform> {
        Modifier::element(self)
    }

    fn label(&self) -> String {
        native_record(&self.native).borrow().label.clone()
    }
}

impl PartialEq for Adopt {
    fn eq(&self, other: &Self) -> bool {
        self.kinds == other.kinds
            && Rc::ptr_eq(&native_record(&self.native), &native_record(&other.native))
    }
}

impl fmt::Debug for Adopt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adopt")
            .field("native", &self.label())
            .field("kinds", &self.kinds)
            .finish()
    }
}

/// Holds the adopted native until the node takes it.
pub struct AdoptContributor {
    native: Option<Native<FakePlatform>>,
    log: CallLog,
}

impl Contributor<FakePlatform> for AdoptContributor {
    fn contribute(&mut self, _target: Target<'_, FakePlatform>) {}

    fn adopt(&mut self, kind: Kind) -> Option<Native<FakePlatform>> {
        let native = self.native.take()?;
        self.log.push(format!(
            "adopt:{}:{kind}",
            native_record(&native).borrow().label
        ));
        Some(native)
    }
}

impl Contribution<FakePlatform> for Adopt {
    type Contributor = AdoptContributor;

    fn kinds(&self) -> KindSet {
        self.kinds
    }

    fn create(&self) -> AdoptContributor {
        self.log.push(format!("create:adopt={}", self.label()));
        AdoptContributor {
            native: Some(self.native.clone()),
            log: self.log.clone(),
        }
    }

    fn update(&self, contributor: &mut AdoptContributor) {
        contributor.native = Some(self.native.clone());
    }

    fn is_delegate(&self) -> bool {
        true
    }
}
