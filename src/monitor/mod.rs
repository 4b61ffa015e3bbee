//! Resource sampling: CPU accounting, pane lookup, process trees and the
//! per-refresh window/session aggregation built on top of them.

pub mod collect;
pub mod cpu;
pub mod pane_cache;
pub mod tree;

#[cfg(test)]
pub mod testing;
