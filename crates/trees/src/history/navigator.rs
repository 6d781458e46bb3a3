use crate::navigator::TreeNavigator;
use crate::position::Position;

use super::position::HistoryPosition;

/// Navigates the history tree as it stands at a given version.
///
/// The tree for version `v` has depth `⌈log2(v + 1)⌉` and spans leaf
/// indices `0..=v`. Descending right of the frontier yields `None`, which
/// the pruners materialize as partial nodes.
#[derive(Clone, Copy, Debug)]
pub struct HistoryNavigator {
    version: u64,
    depth: u16,
}

impl HistoryNavigator {
    /// Navigator for the tree at `version`.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            depth: depth(version),
        }
    }

    /// The depth of the tree.
    pub fn depth(&self) -> u16 {
        self.depth
    }
}

/// `⌈log2(version + 1)⌉`.
fn depth(version: u64) -> u16 {
    (u64::BITS - version.leading_zeros()) as u16
}

impl TreeNavigator for HistoryNavigator {
    type Pos = HistoryPosition;

    fn root(&self) -> HistoryPosition {
        HistoryPosition::new(0, self.depth)
    }

    fn is_root(&self, pos: &HistoryPosition) -> bool {
        pos.height() == self.depth
    }

    fn is_leaf(&self, pos: &HistoryPosition) -> bool {
        pos.height() == 0
    }

    fn go_left(&self, pos: &HistoryPosition) -> HistoryPosition {
        debug_assert!(pos.height() > 0);
        HistoryPosition::new(pos.index(), pos.height() - 1)
    }

    fn go_right(&self, pos: &HistoryPosition) -> Option<HistoryPosition> {
        if pos.height() == 0 {
            return None;
        }
        let right_index = pos.index() + (1u64 << (pos.height() - 1));
        if right_index > self.version {
            return None;
        }
        Some(HistoryPosition::new(right_index, pos.height() - 1))
    }

    fn descend_first(&self, pos: &HistoryPosition) -> HistoryPosition {
        HistoryPosition::new(pos.index(), 0)
    }

    fn descend_last(&self, pos: &HistoryPosition) -> HistoryPosition {
        HistoryPosition::new(pos.last_descendant_index(), 0)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_depth_grows_logarithmically() {
        assert_eq!(HistoryNavigator::new(0).depth(), 0);
        assert_eq!(HistoryNavigator::new(1).depth(), 1);
        assert_eq!(HistoryNavigator::new(2).depth(), 2);
        assert_eq!(HistoryNavigator::new(3).depth(), 2);
        assert_eq!(HistoryNavigator::new(4).depth(), 3);
        assert_eq!(HistoryNavigator::new(7).depth(), 3);
        assert_eq!(HistoryNavigator::new(8).depth(), 4);
        assert_eq!(HistoryNavigator::new(9).depth(), 4);
    }

    #[test]
    fn test_descend() {
        let nav = HistoryNavigator::new(9);

        assert_eq!(nav.root(), HistoryPosition::new(0, 4));
        assert!(nav.is_root(&HistoryPosition::new(0, 4)));
        assert!(nav.is_leaf(&HistoryPosition::new(3, 0)));

        let node = HistoryPosition::new(8, 2);
        assert_eq!(nav.go_left(&node), HistoryPosition::new(8, 1));
        assert_eq!(nav.descend_first(&node), HistoryPosition::new(8, 0));
        assert_eq!(nav.descend_last(&node), HistoryPosition::new(11, 0));
    }

    #[test]
    fn test_go_right_stops_at_frontier() {
        let nav = HistoryNavigator::new(9);

        // Within the frontier.
        assert_eq!(
            nav.go_right(&HistoryPosition::new(0, 4)),
            Some(HistoryPosition::new(8, 3)),
        );
        assert_eq!(
            nav.go_right(&HistoryPosition::new(8, 1)),
            Some(HistoryPosition::new(9, 0)),
        );

        // Beyond it: version 9 has no leaves past index 9.
        assert_eq!(nav.go_right(&HistoryPosition::new(8, 2)), None);
        assert_eq!(nav.go_right(&HistoryPosition::new(8, 3)), None);
        // Leaves have no children at all.
        assert_eq!(nav.go_right(&HistoryPosition::new(9, 0)), None);
    }
}
