//! Contribution reconciliation core for Compose-Maps: capability kinds,
//! modifier chains, contribution descriptors and the engine that keeps live
//! contributors in sync with them.

pub mod chain;
pub mod config;
pub mod contribution;
pub mod error;
pub mod kind;
pub mod modifier;
pub mod platform;
pub mod setter;
pub mod symbol;

pub use chain::{CommitReport, ContributionChain, Disposition};
pub use config::ReconcileConfig;
pub use contribution::{
    contribution, AnyContribution, AsAny, Contribution, ContributionType, Contributor, Descriptor,
    TypeMismatch,
};
pub use error::{ReconcileError, SymbolError};
pub use kind::{Kind, KindSet};
pub use modifier::Modifier;
pub use platform::{Native, Platform, Target};
pub use setter::{Setter, SetterContributor};
pub use symbol::Symbol;

pub mod prelude {
    pub use crate::chain::{CommitReport, ContributionChain};
    pub use crate::contribution::{Contribution, Contributor};
    pub use crate::kind::{Kind, KindSet};
    pub use crate::modifier::Modifier;
    pub use crate::platform::{Native, Platform, Target};
    pub use crate::setter::Setter;
}
