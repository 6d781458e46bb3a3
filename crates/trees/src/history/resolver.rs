use crate::position::Position;
use crate::resolver::CacheResolver;

use super::position::HistoryPosition;

/// Resolver for operations targeting the newest leaf: insertion at a
/// version, or proving membership of the event at that version.
///
/// A subtree is frozen once it lies entirely strictly left of the
/// frontier; it becomes safe to freeze as soon as the target version
/// fills it completely.
#[derive(Clone, Copy, Debug)]
pub struct SingleTargetedResolver {
    version: u64,
}

impl SingleTargetedResolver {
    /// Resolver for the tree at `version`.
    pub fn new(version: u64) -> Self {
        Self { version }
    }
}

impl CacheResolver<HistoryPosition> for SingleTargetedResolver {
    fn should_be_in_cache(&self, pos: &HistoryPosition) -> bool {
        self.version > pos.last_descendant_index()
    }

    fn should_cache(&self, pos: &HistoryPosition) -> bool {
        self.version >= pos.last_descendant_index()
    }
}

/// Resolver for membership proofs of an event older than the tree head
/// (`start < end`). The start leaf itself is rebuilt, not pruned, so the
/// proof pins the event digest being proven.
#[derive(Clone, Copy, Debug)]
pub struct DoubleTargetedResolver {
    start: u64,
    end: u64,
}

impl DoubleTargetedResolver {
    /// Resolver for the window `start..=end`.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

impl CacheResolver<HistoryPosition> for DoubleTargetedResolver {
    fn should_be_in_cache(&self, pos: &HistoryPosition) -> bool {
        if pos.height() == 0 && pos.index() == self.start {
            return false;
        }
        in_window_or_left_of_both(self.start, self.end, pos)
    }

    fn should_cache(&self, pos: &HistoryPosition) -> bool {
        self.end >= pos.last_descendant_index()
    }
}

/// Resolver for consistency proofs between two versions. Identical to
/// [`DoubleTargetedResolver`] except that the start leaf is drawn from
/// the cache: its digest is part of the incremental proof.
#[derive(Clone, Copy, Debug)]
pub struct IncrementalResolver {
    start: u64,
    end: u64,
}

impl IncrementalResolver {
    /// Resolver for the window `start..=end`.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

impl CacheResolver<HistoryPosition> for IncrementalResolver {
    fn should_be_in_cache(&self, pos: &HistoryPosition) -> bool {
        if pos.height() == 0 && pos.index() == self.start {
            return true;
        }
        in_window_or_left_of_both(self.start, self.end, pos)
    }

    fn should_cache(&self, pos: &HistoryPosition) -> bool {
        self.end >= pos.last_descendant_index()
    }
}

/// Resolver for re-deriving the end root of a consistency proof: every
/// leaf the traversal reaches resolves from the audit path.
#[derive(Clone, Copy, Debug)]
pub struct IncrementalVerifyResolver {
    start: u64,
    end: u64,
}

impl IncrementalVerifyResolver {
    /// Resolver for the window `start..=end`.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

impl CacheResolver<HistoryPosition> for IncrementalVerifyResolver {
    fn should_be_in_cache(&self, pos: &HistoryPosition) -> bool {
        if pos.height() == 0 {
            return true;
        }
        in_window_or_left_of_both(self.start, self.end, pos)
    }

    fn should_cache(&self, pos: &HistoryPosition) -> bool {
        self.end >= pos.last_descendant_index()
    }
}

/// The shared pruning rule of the windowed resolvers: a subtree may be
/// skipped when both window ends lie strictly right of it, or when it
/// sits wholly inside the window past the start leaf.
fn in_window_or_left_of_both(start: u64, end: u64, pos: &HistoryPosition) -> bool {
    let last = pos.last_descendant_index();
    if start > last && end > last {
        return true;
    }
    pos.index() > start && last <= end
}
