//! Authenticated trees for a verifiable append-only log.
//!
//! Two tree variants share one proof engine:
//!
//! * [`history::HistoryTree`] is an append-only Merkle tree indexed by a
//!   monotonically increasing version. It answers membership queries and
//!   proves that two historical roots are consistent extensions of the
//!   same log.
//! * [`hyper::HyperTree`] is a sparse Merkle tree of fixed depth indexed
//!   by event digest, mapping each event to the version at which it was
//!   added.
//!
//! Every operation follows the same pipeline: a *pruner* walks the tree
//! geometry and produces a sparse [`Visitable`] in which subtrees whose
//! digests are already known are replaced by [`Visitable::Cached`]
//! placeholders; a post-order [`Visitor`] fold then computes the root
//! digest while collecting frozen digests to persist
//! ([`CachingVisitor`]) or the sibling digests that form a proof
//! ([`AuditPathVisitor`]). Verifiers rerun the same pipeline with the
//! audit path standing in for the cache.

#![warn(rust_2018_idioms, unused_lifetimes)]
#![warn(unused_qualifications)]
#![forbid(unsafe_code)]

mod audit;
mod cache;
mod caching;
mod compute;
mod error;
mod navigator;
mod position;
mod proof;
mod resolver;
mod visit;

pub mod history;
pub mod hyper;

pub use audit::{AuditPath, AuditPathVisitor};
pub use cache::{Cache, FallbackCache, LayeredCache, ModifiableCache, PassThroughCache, SimpleCache};
pub use caching::CachingVisitor;
pub use compute::ComputeHashVisitor;
pub use error::Error;
pub use navigator::TreeNavigator;
pub use position::Position;
pub use proof::{Commitment, IncrementalProof, MembershipProof};
pub use resolver::CacheResolver;
pub use visit::{Visitable, Visitor};
