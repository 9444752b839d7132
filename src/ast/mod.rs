//! The shared tagged tree consumed by every later pass.
//!
//! Every node records its own source span; type information and
//! verification outcomes are attached in place via interior mutability
//! rather than by threading a second parallel tree, the one exception
//! being the optimizer, which is contractually required to hand back a
//! structurally new tree.

mod decl;
mod expr;
mod pattern;
mod stmt;
mod types;

pub use decl::*;
pub use expr::*;
pub use pattern::*;
pub use stmt::*;
pub use types::*;
