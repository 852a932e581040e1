/// Speaker context — anti-repetition tracking for one NPC.

use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use crate::schema::ids::LineId;

/// A sliding window of the lines a speaker said most recently.
///
/// Owned by the caller (typically one per NPC instance) and fed to the
/// selector as its exclusion set. A window of 0 tracks nothing.
#[derive(Debug, Clone, Default)]
pub struct LineHistory {
    window: usize,
    recent: VecDeque<LineId>,
}

impl LineHistory {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            recent: VecDeque::with_capacity(window),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Remember a spoken line, forgetting the oldest once the window is full.
    pub fn record(&mut self, id: LineId) {
        if self.window == 0 {
            return;
        }
        self.recent.retain(|seen| *seen != id);
        self.recent.push_back(id);
        while self.recent.len() > self.window {
            self.recent.pop_front();
        }
    }

    pub fn contains(&self, id: LineId) -> bool {
        self.recent.contains(&id)
    }

    /// The lines to avoid on the next selection.
    pub fn exclusions(&self) -> FxHashSet<LineId> {
        self.recent.iter().copied().collect()
    }

    /// Most recent last.
    pub fn recent(&self) -> impl Iterator<Item = LineId> + '_ {
        self.recent.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_default() {
        let history = LineHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.window(), 0);
    }

    #[test]
    fn evicts_oldest() {
        let mut history = LineHistory::new(2);
        history.record(LineId(0));
        history.record(LineId(1));
        history.record(LineId(2));
        assert_eq!(history.len(), 2);
        assert!(!history.contains(LineId(0)));
        assert_eq!(history.recent().collect::<Vec<_>>(), vec![LineId(1), LineId(2)]);
    }

    #[test]
    fn repeat_moves_to_newest() {
        let mut history = LineHistory::new(2);
        history.record(LineId(0));
        history.record(LineId(1));
        history.record(LineId(0));
        history.record(LineId(2));
        assert_eq!(history.recent().collect::<Vec<_>>(), vec![LineId(0), LineId(2)]);
    }

    #[test]
    fn zero_window_tracks_nothing() {
        let mut history = LineHistory::new(0);
        history.record(LineId(3));
        assert!(history.is_empty());
        assert!(history.exclusions().is_empty());
    }

    #[test]
    fn exclusions_and_clear() {
        let mut history = LineHistory::new(3);
        history.record(LineId(4));
        history.record(LineId(5));
        let set = history.exclusions();
        assert!(set.contains(&LineId(4)) && set.contains(&LineId(5)));
        history.clear();
        assert!(history.is_empty());
    }
}
