//! The append-only history tree.
//!
//! Version `v` of the tree commits the events added at versions `0..=v`
//! in a binary tree of depth `⌈log2(v + 1)⌉`. Subtrees that lie entirely
//! left of the frontier are frozen: their digests can never change again,
//! so they are persisted once and pruned from every later traversal.

mod navigator;
mod position;
mod pruner;
mod resolver;
mod tree;

pub use navigator::HistoryNavigator;
pub use position::HistoryPosition;
pub use pruner::{HistoryPruningContext, InsertPruner, SearchPruner, VerifyPruner};
pub use resolver::{
    DoubleTargetedResolver, IncrementalResolver, IncrementalVerifyResolver, SingleTargetedResolver,
};
pub use tree::HistoryTree;
