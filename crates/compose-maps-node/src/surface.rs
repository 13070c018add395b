//! Surface nodes and the deferred root-ready handshake.
//!
//! Attaching a surface node creates (or adopts) the native surface and asks
//! the platform for the root resource. The root arrives later through a
//! one-shot [`RootReady`]; only then do the root contributors run and the
//! children that were waiting for it attach, in list order.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use compose_maps_core::{CommitReport, ContributionChain, Kind, KindSet, Modifier, Native, Symbol, Target};

use crate::error::NodeError;
use crate::lifecycle::{LifecycleHooks, NodeOptions, NodeState};
use crate::overlay::OverlayNode;
use crate::platform::MapPlatform;

type SurfaceFactory<S> = Box<dyn FnOnce() -> S>;

struct SurfaceState<P: MapPlatform> {
    state: NodeState,
    modifier: Modifier<P>,
    chain: ContributionChain<P>,
    factory: Option<SurfaceFactory<P::Surface>>,
    surface: Symbol<P::Surface>,
    root: Symbol<P::Root>,
    children: Vec<OverlayNode<P>>,
    hooks: Option<LifecycleHooks>,
    root_pending: bool,
}

pub(crate) struct SurfaceShared<P: MapPlatform> {
    state: RefCell<SurfaceState<P>>,
    /// Root delivered while the node was busy, picked up once it is not.
    parked: RefCell<Option<P::Root>>,
}

impl<P: MapPlatform> SurfaceShared<P> {
    /// A handle to the root, if it has arrived.
    pub(crate) fn root(&self) -> Option<P::Root> {
        self.state.borrow().root.get().ok().cloned()
    }

    fn root_ready(&self, root: P::Root) -> Result<(), NodeError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if !state.root_pending || state.state != NodeState::Attached {
            log::debug!("root ready ignored for {} surface node", state.state);
            return Ok(());
        }
        state.root_pending = false;
        state.root.bind(root)?;

        let root = state.root.get_mut()?;
        let contributed = state.chain.contribute(Target::Root(&mut *root));
        let mut attached = 0;
        let mut failed = 0;
        for (index, child) in state.children.iter().enumerate() {
            if child.state() != NodeState::Created {
                continue;
            }
            // A failing child must not keep its later siblings off the root.
            match child.attach(root) {
                Ok(()) => attached += 1,
                Err(err) => {
                    failed += 1;
                    log::error!("child {index} failed to attach on root ready: {err}");
                }
            }
        }
        log::debug!(
            "root ready: {contributed} root contributors applied, {attached} children attached, {failed} failed"
        );
        Ok(())
    }

    fn drain_parked(&self) -> Result<(), NodeError> {
        let parked = self.parked.borrow_mut().take();
        match parked {
            Some(root) => self.root_ready(root),
            None => Ok(()),
        }
    }
}

/// One-shot callback through which the platform delivers the root.
///
/// Firing after the surface node detached or was dropped does nothing.
pub struct RootReady<P: MapPlatform> {
    node: Weak<SurfaceShared<P>>,
}

impl<P: MapPlatform> RootReady<P> {
    pub fn fire(self, root: P::Root) {
        let Some(shared) = self.node.upgrade() else {
            log::debug!("root ready after surface node was dropped");
            return;
        };
        // Fired while the node is borrowed; the borrowing call drains it.
        if shared.state.try_borrow_mut().is_err() {
            *shared.parked.borrow_mut() = Some(root);
            return;
        }
        if let Err(err) = shared.root_ready(root) {
            log::error!("root ready handling failed: {err}");
        }
    }
}

impl<P: MapPlatform> fmt::Debug for RootReady<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootReady")
            .field("live", &(self.node.strong_count() > 0))
            .finish()
    }
}

/// Handle to the node owning the native surface and its root.
pub struct SurfaceNode<P: MapPlatform> {
    shared: Rc<SurfaceShared<P>>,
}

impl<P: MapPlatform> SurfaceNode<P> {
    pub fn new(factory: impl FnOnce() -> P::Surface + 'static) -> Self {
        Self::with_options(factory, NodeOptions::default())
    }

    pub fn with_options(factory: impl FnOnce() -> P::Surface + 'static, options: NodeOptions) -> Self {
        let NodeOptions { hooks, config } = options;
        let state = SurfaceState {
            state: NodeState::Created,
            modifier: Modifier::empty(),
            chain: ContributionChain::with_config(KindSet::SURFACE | KindSet::ROOT, config),
            factory: Some(Box::new(factory)),
            surface: Symbol::new("surface"),
            root: Symbol::new("root"),
            children: Vec::new(),
            hooks: Some(hooks),
            root_pending: false,
        };
        Self {
            shared: Rc::new(SurfaceShared {
                state: RefCell::new(state),
                parked: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn shared(&self) -> &Rc<SurfaceShared<P>> {
        &self.shared
    }

    pub(crate) fn from_shared(shared: Rc<SurfaceShared<P>>) -> Self {
        Self { shared }
    }

    pub fn state(&self) -> NodeState {
        self.shared.state.borrow().state
    }

    pub fn is_root_ready(&self) -> bool {
        self.shared.state.borrow().root.is_bound()
    }

    pub fn modifier(&self) -> Modifier<P> {
        self.shared.state.borrow().modifier.clone()
    }

    /// Reconciles `modifier` against the current contributors and commits.
    pub fn set_modifier(&self, modifier: Modifier<P>) -> Result<CommitReport, NodeError> {
        let report = {
            let mut state = self.shared.state.borrow_mut();
            if state.state == NodeState::Detached {
                return Err(NodeError::Detached);
            }
            let report = state.chain.reconcile(&modifier)?;
            state.modifier = modifier;
            report
        };
        self.shared.drain_parked()?;
        Ok(report)
    }

    /// Applies surface contributors to the surface and root contributors to
    /// the root, skipping whichever is not bound yet.
    pub fn contribute(&self) -> Result<usize, NodeError> {
        let applied = {
            let mut guard = self.shared.state.borrow_mut();
            let state = &mut *guard;
            if state.state == NodeState::Detached {
                return Err(NodeError::Detached);
            }
            let mut applied = 0;
            if let Ok(surface) = state.surface.get_mut() {
                applied += state.chain.contribute(Target::Surface(surface));
            }
            if let Ok(root) = state.root.get_mut() {
                applied += state.chain.contribute(Target::Root(root));
            }
            applied
        };
        self.shared.drain_parked()?;
        Ok(applied)
    }

    /// Creates or adopts the surface, contributes to it and requests the root.
    pub fn attach(&self) -> Result<(), NodeError> {
        {
            let mut guard = self.shared.state.borrow_mut();
            let state = &mut *guard;
            match state.state {
                NodeState::Attached => return Err(NodeError::AlreadyAttached),
                NodeState::Detached => return Err(NodeError::Detached),
                NodeState::Created => {}
            }

            let surface = match state.chain.delegate_native(Kind::Surface)? {
                Some(Native::Surface(surface)) => {
                    log::debug!("surface adopted from owning delegate");
                    surface
                }
                Some(other) => {
                    return Err(NodeError::DelegateMismatch {
                        expected: Kind::Surface,
                        found: other.kind(),
                    })
                }
                None => match state.factory.take() {
                    Some(factory) => factory(),
                    None => return Err(NodeError::NotReady),
                },
            };
            state.factory = None;
            state.surface.bind(surface)?;
            state.state = NodeState::Attached;
            if let Some(hooks) = state.hooks.as_mut() {
                hooks.attached();
            }

            let surface = state.surface.get_mut()?;
            state.chain.contribute(Target::Surface(&mut *surface));
            state.root_pending = true;
            log::debug!("surface node attached, requesting root");
            P::request_root(
                surface,
                RootReady {
                    node: Rc::downgrade(&self.shared),
                },
            );
        }
        self.shared.drain_parked()
    }

    /// Cancels a pending root request and tears down every contributor.
    ///
    /// Children are left as they are.
    pub fn detach(&self) -> Result<(), NodeError> {
        let mut guard = self.shared.state.borrow_mut();
        let state = &mut *guard;
        if state.state == NodeState::Detached {
            return Ok(());
        }
        let was_attached = state.state == NodeState::Attached;

        state.root_pending = false;
        self.shared.parked.borrow_mut().take();
        state.root.unbind();
        state.surface.unbind();
        state.factory = None;
        state.modifier = Modifier::empty();
        state.chain.detach_all()?;
        state.state = NodeState::Detached;
        if let Some(mut hooks) = state.hooks.take() {
            if was_attached {
                hooks.detached();
            }
        }
        log::debug!("surface node detached");
        Ok(())
    }

    /// Inserts `child` at `index`.
    ///
    /// A child that is still waiting is attached right away when the root
    /// has already arrived. Before that, the root-ready callback attaches it.
    pub fn insert(&self, index: usize, child: OverlayNode<P>) -> Result<(), NodeError> {
        if !child.belongs_to(&self.shared) {
            return Err(NodeError::ForeignChild);
        }
        let root = {
            let mut state = self.shared.state.borrow_mut();
            let len = state.children.len();
            if index > len {
                return Err(NodeError::RangeOutOfBounds {
                    start: index,
                    count: 1,
                    len,
                });
            }
            state.children.insert(index, child.clone());
            match state.state {
                NodeState::Attached => state.root.get().ok().cloned(),
                _ => None,
            }
        };
        if let Some(mut root) = root {
            if child.state() == NodeState::Created {
                log::debug!("child inserted after root ready, attaching at {index}");
                child.attach(&mut root)?;
            }
        }
        Ok(())
    }

    /// Removes `count` children starting at `index` and returns them
    /// without detaching them.
    pub fn remove_range(&self, index: usize, count: usize) -> Result<Vec<OverlayNode<P>>, NodeError> {
        let mut state = self.shared.state.borrow_mut();
        let len = state.children.len();
        let end = index
            .checked_add(count)
            .filter(|end| *end <= len)
            .ok_or(NodeError::RangeOutOfBounds {
                start: index,
                count,
                len,
            })?;
        Ok(state.children.drain(index..end).collect())
    }

    /// Moves `count` children starting at `from` so they sit before the child
    /// that was at index `to`.
    pub fn move_range(&self, from: usize, to: usize, count: usize) -> Result<(), NodeError> {
        let mut state = self.shared.state.borrow_mut();
        move_span(&mut state.children, from, to, count)
    }

    pub fn remove_all(&self) -> Vec<OverlayNode<P>> {
        std::mem::take(&mut self.shared.state.borrow_mut().children)
    }

    pub fn children(&self) -> Vec<OverlayNode<P>> {
        self.shared.state.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.shared.state.borrow().children.len()
    }

    pub fn contributor_count(&self, kind: Kind) -> usize {
        self.shared.state.borrow().chain.len(kind)
    }

    pub fn with_surface<R>(&self, f: impl FnOnce(&mut P::Surface) -> R) -> Result<R, NodeError> {
        let result = {
            let mut state = self.shared.state.borrow_mut();
            f(state.surface.get_mut()?)
        };
        self.shared.drain_parked()?;
        Ok(result)
    }

    pub fn with_root<R>(&self, f: impl FnOnce(&mut P::Root) -> R) -> Result<R, NodeError> {
        let result = {
            let mut state = self.shared.state.borrow_mut();
            f(state.root.get_mut()?)
        };
        self.shared.drain_parked()?;
        Ok(result)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    /// Renders the node, its contributor counts and its children.
    pub fn dump_tree(&self) -> String {
        let state = self.shared.state.borrow();
        let mut output = String::new();
        output.push_str(&format!(
            "SurfaceNode [{}] root={} surface_contributors={} root_contributors={}\n",
            state.state,
            if state.root.is_bound() { "ready" } else { "pending" },
            state.chain.len(Kind::Surface),
            state.chain.len(Kind::Root),
        ));
        for (index, child) in state.children.iter().enumerate() {
            output.push_str(&format!("  [{index}] {}\n", child.describe()));
        }
        output
    }
}

fn move_span<T>(items: &mut Vec<T>, from: usize, to: usize, count: usize) -> Result<(), NodeError> {
    let len = items.len();
    let end = from
        .checked_add(count)
        .filter(|end| *end <= len)
        .ok_or(NodeError::RangeOutOfBounds {
            start: from,
            count,
            len,
        })?;
    if to > len {
        return Err(NodeError::RangeOutOfBounds { start: to, count, len });
    }
    if count == 0 || (from..=end).contains(&to) {
        return Ok(());
    }
    let dest = if from > to { to } else { to - count };
    let moved: Vec<T> = items.drain(from..end).collect();
    for (offset, item) in moved.into_iter().enumerate() {
        items.insert(dest + offset, item);
    }
    Ok(())
}

impl<P: MapPlatform> Clone for SurfaceNode<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<P: MapPlatform> fmt::Debug for SurfaceNode<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shared.state.try_borrow() {
            Ok(state) => f
                .debug_struct("SurfaceNode")
                .field("state", &state.state)
                .field("root_ready", &state.root.is_bound())
                .field("children", &state.children.len())
                .field("chain", &state.chain)
                .finish(),
            Err(_) => f.debug_struct("SurfaceNode").finish_non_exhaustive(),
        }
    }
}
