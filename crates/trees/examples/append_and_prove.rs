//! Append a handful of events to both trees over one shared store, then
//! prove and verify membership and consistency.

use std::sync::Arc;

use anyhow::Result;
use canopy_crypto::{Hasher, Sha256Hasher};
use canopy_storage::MemoryStore;
use canopy_trees::history::HistoryTree;
use canopy_trees::hyper::HyperTree;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let hasher = Sha256Hasher;
    let store = Arc::new(MemoryStore::new());
    let history = HistoryTree::new(Sha256Hasher, store.clone());
    let hyper = HyperTree::new(Sha256Hasher, store, 128);

    let mut commitments = Vec::new();
    for version in 0u64..8 {
        let event = hasher.digest(&[format!("event {version}").as_bytes()]);
        let commitment = history.add(event.clone(), version)?;
        hyper.add(&event, version)?;
        println!("version {version}: root {:x}", commitment.digest);
        commitments.push((event, commitment));
    }

    let (event, commitment) = &commitments[7];
    let proof = history.prove_membership(7, 7);
    println!(
        "history membership of version 7: {}",
        history.verify_membership(&proof, 7, event.clone(), &commitment.digest),
    );

    let proof = history.prove_consistency(3, 7);
    println!(
        "history consistency of versions 3 and 7: {}",
        history.verify_incremental(
            &proof,
            3,
            7,
            &commitments[3].1.digest,
            &commitments[7].1.digest,
        ),
    );

    let (value, proof) = hyper.get(event)?;
    let version = u64::from_le_bytes(value.as_slice().try_into()?);
    println!(
        "hyper membership of version {version}: {}",
        hyper.verify_membership(&proof, version, event, &commitments[7].1.digest),
    );

    Ok(())
}
