use compose_maps_core::{Kind, ReconcileError, SymbolError};
use thiserror::Error;

/// Failures raised by surface and overlay nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    #[error("overlay node requires a parent surface node")]
    MissingParent,
    #[error("child was created for a different surface node")]
    ForeignChild,
    #[error("node is not ready")]
    NotReady,
    #[error("node is already attached")]
    AlreadyAttached,
    #[error("node has been detached")]
    Detached,
    #[error("range {start}+{count} is out of bounds for {len} children")]
    RangeOutOfBounds {
        start: usize,
        count: usize,
        len: usize,
    },
    #[error("owning delegate for {expected} handed over a {found} object")]
    DelegateMismatch { expected: Kind, found: Kind },
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
