use thiserror::Error;

use crate::chain::Disposition;
use crate::kind::Kind;

/// Failures raised by an ownership [`Symbol`](crate::Symbol).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("symbol `{name}` is already bound")]
    AlreadyBound { name: &'static str },
    #[error("symbol `{name}` read before it was bound")]
    Unbound { name: &'static str },
}

/// Structural errors detected while reconciling a contribution chain.
///
/// All of these indicate a bug in the layer producing modifiers or in the
/// engine itself; none of them are recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("contribution {descriptor} declares the reserved kind bit")]
    ReservedKind { descriptor: &'static str },
    #[error("contribution {descriptor} declares no kind")]
    EmptyKindSet { descriptor: &'static str },
    #[error("more than one owning delegate contributed for {kind}")]
    DuplicateDelegate { kind: Kind },
    #[error("unexpected {disposition:?} disposition for {kind}[{index}]")]
    UnexpectedDisposition {
        kind: Kind,
        index: usize,
        disposition: Disposition,
    },
    #[error("contributor at {kind}[{index}] was not created by {expected}")]
    ContributorMismatch {
        kind: Kind,
        index: usize,
        expected: &'static str,
    },
    #[error("previous diff has not been committed")]
    PendingCommit,
}
