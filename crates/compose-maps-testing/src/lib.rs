//! Testing utilities for Compose-Maps: a recording fake platform and
//! recording property descriptors.

mod call_log;
mod descriptors;
mod fake;

pub use call_log::CallLog;
pub use descriptors::*;
pub use fake::*;

pub mod prelude {
    pub use crate::call_log::CallLog;
    pub use crate::descriptors::*;
    pub use crate::fake::*;
}
