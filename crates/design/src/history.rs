use std::collections::VecDeque;

pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Bounded undo/redo stacks of whole snapshots.
///
/// `record` is called with the state *before* a mutation. Once `depth`
/// snapshots are held, the oldest is dropped.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<T>,
    future: Vec<T>,
    depth: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::with_depth(DEFAULT_HISTORY_DEPTH)
    }
}

impl<T> History<T> {
    /// A depth of zero disables history entirely.
    pub fn with_depth(depth: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(depth.min(DEFAULT_HISTORY_DEPTH)),
            future: Vec::new(),
            depth,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn record(&mut self, before: T) {
        self.future.clear();
        if self.depth == 0 {
            return;
        }
        if self.past.len() == self.depth {
            self.past.pop_front();
        }
        self.past.push_back(before);
    }

    /// Swap `current` for the previous snapshot.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        if self.past.len() > self.depth {
            self.past.pop_front();
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn undo_and_redo_walk_the_snapshots() {
        let mut h = History::default();
        h.record(1);
        h.record(2);

        assert_eq!(h.undo(3), Some(2));
        assert_eq!(h.undo(2), Some(1));
        assert_eq!(h.undo(1), None);
        assert_eq!(h.redo(1), Some(2));
        assert_eq!(h.redo(2), Some(3));
        assert_eq!(h.redo(3), None);
    }

    #[test]
    fn recording_clears_redo() {
        let mut h = History::default();
        h.record("a");
        assert_eq!(h.undo("b"), Some("a"));
        assert!(h.can_redo());

        h.record("a");
        assert!(!h.can_redo());
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    fn depth_bounds_the_undo_stack(#[case] depth: usize) {
        let mut h = History::with_depth(depth);
        for i in 0..10 {
            h.record(i);
        }
        let mut undone = 0;
        let mut current = 10;
        while let Some(prev) = h.undo(current) {
            current = prev;
            undone += 1;
        }
        assert_eq!(undone, depth);
        assert_eq!(current, 10 - depth as i32);
    }

    #[test]
    fn zero_depth_records_nothing() {
        let mut h = History::with_depth(0);
        h.record(1);
        assert!(!h.can_undo());
    }
}
