//! Recording natives for [`FakePlatform`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use compose_maps_core::{Native, Platform, Target};
use compose_maps_node::{MapPlatform, RootReady};

use crate::call_log::CallLog;

/// Observable state of one fake native object.
#[derive(Debug, Default)]
pub struct FakeRecord {
    pub label: String,
    pub props: BTreeMap<&'static str, String>,
    /// Label of the root an overlay is placed on.
    pub parent: Option<String>,
}

pub type RecordHandle = Rc<RefCell<FakeRecord>>;

/// Shared accessors of the fake native handles.
pub trait FakeNative {
    fn record(&self) -> &RecordHandle;

    fn log(&self) -> &CallLog;

    fn label(&self) -> String {
        self.record().borrow().label.clone()
    }

    fn prop(&self, key: &str) -> Option<String> {
        self.record().borrow().props.get(key).cloned()
    }

    fn props(&self) -> BTreeMap<&'static str, String> {
        self.record().borrow().props.clone()
    }

    fn parent(&self) -> Option<String> {
        self.record().borrow().parent.clone()
    }

    fn same_native(&self, other: &Self) -> bool
    where
        Self: Sized,
    {
        Rc::ptr_eq(self.record(), other.record())
    }
}

fn new_record(label: &str) -> RecordHandle {
    Rc::new(RefCell::new(FakeRecord {
        label: label.to_string(),
        ..FakeRecord::default()
    }))
}

macro_rules! fake_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $name {
            record: RecordHandle,
            log: CallLog,
        }

        impl $name {
            pub fn new(label: &str, log: &CallLog) -> Self {
                Self {
                    record: new_record(label),
                    log: log.clone(),
                }
            }

            /// A factory that logs when the node invokes it.
            pub fn factory(&self) -> impl FnOnce() -> Self + 'static {
                let native = self.clone();
                move || {
                    native.log.push(format!("native:create:{}", native.label()));
                    native
                }
            }
        }

        impl FakeNative for $name {
            fn record(&self) -> &RecordHandle {
                &self.record
            }

            fn log(&self) -> &CallLog {
                &self.log
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.label()).finish()
            }
        }
    };
}

fake_handle!(
    /// Fake root resource.
    FakeRoot
);
fake_handle!(
    /// Fake placed overlay.
    FakeOverlay
);

/// Fake surface whose root arrives when the test says so.
#[derive(Clone)]
pub struct FakeSurface {
    record: RecordHandle,
    log: CallLog,
    pending: Rc<RefCell<Option<RootReady<FakePlatform>>>>,
    immediate_root: Option<FakeRoot>,
}

impl FakeSurface {
    pub fn new(label: &str, log: &CallLog) -> Self {
        Self {
            record: new_record(label),
            log: log.clone(),
            pending: Rc::default(),
            immediate_root: None,
        }
    }

    /// Delivers `root` synchronously from inside the root request.
    pub fn with_immediate_root(mut self, root: FakeRoot) -> Self {
        self.immediate_root = Some(root);
        self
    }

    pub fn factory(&self) -> impl FnOnce() -> Self + 'static {
        let native = self.clone();
        move || {
            native.log.push(format!("native:create:{}", native.label()));
            native
        }
    }

    pub fn has_pending_root_request(&self) -> bool {
        self.pending.borrow().is_some()
    }

    /// Fires the pending root request. Returns false when nothing was pending.
    pub fn fire_root_ready(&self, root: FakeRoot) -> bool {
        let pending = self.pending.borrow_mut().take();
        match pending {
            Some(ready) => {
                ready.fire(root);
                true
            }
            None => false,
        }
    }
}

impl FakeNative for FakeSurface {
    fn record(&self) -> &RecordHandle {
        &self.record
    }

    fn log(&self) -> &CallLog {
        &self.log
    }
}

impl fmt::Debug for FakeSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FakeSurface").field(&self.label()).finish()
    }
}

/// Platform whose natives record every property and platform call.
pub struct FakePlatform;

impl Platform for FakePlatform {
    type Surface = FakeSurface;
    type Root = FakeRoot;
    type Overlay = FakeOverlay;
}

impl MapPlatform for FakePlatform {
    fn request_root(surface: &mut FakeSurface, ready: RootReady<Self>) {
        surface
            .log
            .push(format!("native:request_root:{}", surface.label()));
        match surface.immediate_root.clone() {
            Some(root) => ready.fire(root),
            None => *surface.pending.borrow_mut() = Some(ready),
        }
    }

    fn attach_overlay(overlay: &mut FakeOverlay, root: &mut FakeRoot) {
        overlay.record.borrow_mut().parent = Some(root.label());
        overlay.log.push(format!(
            "native:attach_overlay:{}->{}",
            overlay.label(),
            root.label()
        ));
    }

    fn detach_overlay(overlay: &mut FakeOverlay) {
        overlay.record.borrow_mut().parent = None;
        overlay
            .log
            .push(format!("native:detach_overlay:{}", overlay.label()));
    }
}

/// The record behind whichever native a contributor is applied to.
pub fn target_record(target: &Target<'_, FakePlatform>) -> RecordHandle {
    match target {
        Target::Surface(surface) => Rc::clone(surface.record()),
        Target::Root(root) => Rc::clone(root.record()),
        Target::Overlay(overlay) => Rc::clone(overlay.record()),
    }
}

pub fn native_record(native: &Native<FakePlatform>) -> RecordHandle {
    match native {
        Native::Surface(surface) => Rc::clone(surface.record()),
        Native::Root(root) => Rc::clone(root.record()),
        Native::Overlay(overlay) => Rc::clone(overlay.record()),
    }
}
