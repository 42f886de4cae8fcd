//! Control-flow hooks for the MIPS backend.
//!
//! Cross-reference extraction, calling-convention predicates, and function
//! summaries computed through a driver-supplied [`Backtracker`].

mod abi;
mod backtrace;
mod instruction_table;
mod summary;
mod xrefs;

pub use abi::*;
pub use backtrace::*;
pub use instruction_table::*;
pub use summary::*;
pub use xrefs::*;
