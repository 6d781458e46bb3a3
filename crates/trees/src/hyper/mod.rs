//! The sparse hyper tree.
//!
//! A fixed-depth Merkle tree whose depth equals the hasher's output
//! length in bits; a leaf's index is the event digest itself, and its
//! value is the version at which the event was added. Only nodes above
//! the *cache level* are materialized as frozen digests; everything
//! below is reconstructed on demand by range-scanning the sorted leaf
//! store.

mod navigator;
mod position;
mod pruner;
mod resolver;
mod tree;

pub use navigator::HyperNavigator;
pub use position::HyperPosition;
pub use pruner::{HyperPruningContext, InsertPruner, SearchPruner, VerifyPruner};
pub use resolver::{MembershipVerifyResolver, SingleTargetedResolver};
pub use tree::HyperTree;
