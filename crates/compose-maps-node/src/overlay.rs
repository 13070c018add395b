use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use compose_maps_core::{CommitReport, ContributionChain, Kind, KindSet, Modifier, Native, Symbol, Target};

use crate::error::NodeError;
use crate::lifecycle::{LifecycleHooks, NodeOptions, NodeState};
use crate::platform::MapPlatform;
use crate::surface::{SurfaceNode, SurfaceShared};

type OverlayFactory<O> = Box<dyn FnOnce() -> O>;

struct OverlayState<P: MapPlatform> {
    state: NodeState,
    parent: Weak<SurfaceShared<P>>,
    modifier: Modifier<P>,
    chain: ContributionChain<P>,
    factory: Option<OverlayFactory<P::Overlay>>,
    overlay: Symbol<P::Overlay>,
    hooks: Option<LifecycleHooks>,
}

/// Handle to a node that places one native overlay on its parent's root.
pub struct OverlayNode<P: MapPlatform> {
    inner: Rc<RefCell<OverlayState<P>>>,
}

impl<P: MapPlatform> OverlayNode<P> {
    pub fn new(
        parent: Option<&SurfaceNode<P>>,
        factory: impl FnOnce() -> P::Overlay + 'static,
    ) -> Result<Self, NodeError> {
        Self::with_options(parent, factory, Modifier::empty(), NodeOptions::default())
    }

    /// Builds an overlay node for `parent` with an initial modifier.
    ///
    /// Fails with [`NodeError::MissingParent`] before anything is created
    /// when there is no parent. If the parent's root is already available
    /// the node attaches right away, before it is in the parent's child
    /// list; it only shows up in [`SurfaceNode::children`] once inserted.
    /// Otherwise it attaches when the root arrives if it has been inserted
    /// by then, or on insertion if that comes later.
    pub fn with_options(
        parent: Option<&SurfaceNode<P>>,
        factory: impl FnOnce() -> P::Overlay + 'static,
        modifier: Modifier<P>,
        options: NodeOptions,
    ) -> Result<Self, NodeError> {
        let parent = parent.ok_or(NodeError::MissingParent)?;
        let NodeOptions { hooks, config } = options;
        let mut chain = ContributionChain::with_config(KindSet::OVERLAY, config);
        chain.reconcile(&modifier)?;

        let node = Self {
            inner: Rc::new(RefCell::new(OverlayState {
                state: NodeState::Created,
                parent: Rc::downgrade(parent.shared()),
                modifier,
                chain,
                factory: Some(Box::new(factory)),
                overlay: Symbol::new("overlay"),
                hooks: Some(hooks),
            })),
        };
        if let Some(mut root) = parent.shared().root() {
            node.attach(&mut root)?;
        }
        Ok(node)
    }

    pub fn state(&self) -> NodeState {
        self.inner.borrow().state
    }

    pub fn is_attached(&self) -> bool {
        self.state() == NodeState::Attached
    }

    pub fn modifier(&self) -> Modifier<P> {
        self.inner.borrow().modifier.clone()
    }

    /// The surface node this overlay was created for.
    pub fn parent(&self) -> Result<SurfaceNode<P>, NodeError> {
        self.inner
            .borrow()
            .parent
            .upgrade()
            .map(SurfaceNode::from_shared)
            .ok_or(NodeError::NotReady)
    }

    pub fn set_modifier(&self, modifier: Modifier<P>) -> Result<CommitReport, NodeError> {
        let mut state = self.inner.borrow_mut();
        if state.state == NodeState::Detached {
            return Err(NodeError::Detached);
        }
        let report = state.chain.reconcile(&modifier)?;
        state.modifier = modifier;
        Ok(report)
    }

    /// Applies overlay contributors to the overlay, if it exists yet.
    pub fn contribute(&self) -> Result<usize, NodeError> {
        let mut guard = self.inner.borrow_mut();
        let state = &mut *guard;
        if state.state == NodeState::Detached {
            return Err(NodeError::Detached);
        }
        match state.overlay.get_mut() {
            Ok(overlay) => Ok(state.chain.contribute(Target::Overlay(overlay))),
            Err(_) => Ok(0),
        }
    }

    pub(crate) fn attach(&self, root: &mut P::Root) -> Result<(), NodeError> {
        let mut guard = self.inner.borrow_mut();
        let state = &mut *guard;
        match state.state {
            NodeState::Attached => return Err(NodeError::AlreadyAttached),
            NodeState::Detached => return Err(NodeError::Detached),
            NodeState::Created => {}
        }

        let mut overlay = match state.chain.delegate_native(Kind::Overlay)? {
            Some(Native::Overlay(overlay)) => {
                log::debug!("overlay adopted from owning delegate");
                overlay
            }
            Some(other) => {
                return Err(NodeError::DelegateMismatch {
                    expected: Kind::Overlay,
                    found: other.kind(),
                })
            }
            None => match state.factory.take() {
                Some(factory) => factory(),
                None => return Err(NodeError::NotReady),
            },
        };
        state.factory = None;
        P::attach_overlay(&mut overlay, root);
        state.overlay.bind(overlay)?;
        if let Some(hooks) = state.hooks.as_mut() {
            hooks.attached();
        }
        let overlay = state.overlay.get_mut()?;
        let contributed = state.chain.contribute(Target::Overlay(overlay));
        state.state = NodeState::Attached;
        log::debug!("overlay node attached with {contributed} contributors");
        Ok(())
    }

    /// Removes the overlay from the root and tears down every contributor.
    pub fn detach(&self) -> Result<(), NodeError> {
        let mut guard = self.inner.borrow_mut();
        let state = &mut *guard;
        if state.state == NodeState::Detached {
            return Ok(());
        }
        let was_attached = state.state == NodeState::Attached;

        if let Ok(overlay) = state.overlay.get_mut() {
            P::detach_overlay(overlay);
        }
        state.overlay.unbind();
        state.factory = None;
        state.modifier = Modifier::empty();
        state.chain.detach_all()?;
        state.state = NodeState::Detached;
        if let Some(mut hooks) = state.hooks.take() {
            if was_attached {
                hooks.detached();
            }
        }
        state.parent = Weak::new();
        log::debug!("overlay node detached");
        Ok(())
    }

    pub fn with_overlay<R>(&self, f: impl FnOnce(&mut P::Overlay) -> R) -> Result<R, NodeError> {
        let mut state = self.inner.borrow_mut();
        Ok(f(state.overlay.get_mut()?))
    }

    pub fn contributor_count(&self) -> usize {
        self.inner.borrow().chain.len(Kind::Overlay)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn belongs_to(&self, surface: &Rc<SurfaceShared<P>>) -> bool {
        self.inner
            .borrow()
            .parent
            .upgrade()
            .is_some_and(|parent| Rc::ptr_eq(&parent, surface))
    }

    pub(crate) fn describe(&self) -> String {
        let state = self.inner.borrow();
        format!(
            "OverlayNode [{}] overlay_contributors={}",
            state.state,
            state.chain.len(Kind::Overlay)
        )
    }
}

impl<P: MapPlatform> Clone for OverlayNode<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: MapPlatform> fmt::Debug for OverlayNode<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(state) => f
                .debug_struct("OverlayNode")
                .field("state", &state.state)
                .field("chain", &state.chain)
                .finish(),
            Err(_) => f.debug_struct("OverlayNode").finish_non_exhaustive(),
        }
    }
}
