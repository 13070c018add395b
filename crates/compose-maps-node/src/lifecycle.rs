//! Node states, lifecycle hooks and construction options.

use std::fmt;

use compose_maps_core::ReconcileConfig;

/// Lifecycle of a node. `Detached` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeState {
    Created,
    Attached,
    Detached,
}

impl NodeState {
    pub fn name(self) -> &'static str {
        match self {
            NodeState::Created => "created",
            NodeState::Attached => "attached",
            NodeState::Detached => "detached",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Hook = Box<dyn FnMut()>;

/// Callbacks run when a node attaches or detaches.
///
/// Hooks run while the node is being mutated and must not call back into
/// the node that owns them.
#[derive(Default)]
pub struct LifecycleHooks {
    on_attached: Option<Hook>,
    on_detached: Option<Hook>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_attached(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_attached = Some(Box::new(hook));
        self
    }

    pub fn on_detached(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_detached = Some(Box::new(hook));
        self
    }

    pub(crate) fn attached(&mut self) {
        if let Some(hook) = self.on_attached.as_mut() {
            hook();
        }
    }

    pub(crate) fn detached(&mut self) {
        if let Some(hook) = self.on_detached.as_mut() {
            hook();
        }
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("on_attached", &self.on_attached.is_some())
            .field("on_detached", &self.on_detached.is_some())
            .finish()
    }
}

/// Construction options shared by surface and overlay nodes.
#[derive(Debug, Default)]
pub struct NodeOptions {
    pub hooks: LifecycleHooks,
    pub config: ReconcileConfig,
}

impl NodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(mut self, config: ReconcileConfig) -> Self {
        self.config = config;
        self
    }
}
