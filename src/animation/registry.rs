use std::collections::HashMap;

use super::AnimationId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Entry {
    Live,
    /// Stopped or completed, kept until the next compaction
    Dead,
}

/// Liveness table for the animations issued by one scheduler.
///
/// Entries are never removed one by one: stopping marks them dead and a
/// periodic compaction (every `compact_every` allocations) rebuilds the table
/// with only the live ones.
#[derive(Debug)]
pub struct Registry {
    entries: HashMap<AnimationId, Entry>,
    counter: u64,
    compact_every: u64,
}

impl Registry {
    pub const DEFAULT_COMPACT_EVERY: u64 = 20;

    pub fn new() -> Self {
        Self::with_compaction(Self::DEFAULT_COMPACT_EVERY)
    }

    pub fn with_compaction(compact_every: u64) -> Self {
        Self {
            entries: HashMap::new(),
            counter: 0,
            compact_every: compact_every.max(1),
        }
    }

    /// Allocate the next identifier and mark it live
    pub fn start(&mut self) -> AnimationId {
        self.counter += 1;
        let id = AnimationId(self.counter);

        if self.counter % self.compact_every == 0 {
            self.compact();
        }

        self.entries.insert(id, Entry::Live);
        id
    }

    /// Mark a live entry dead. Returns whether it was live.
    pub fn stop(&mut self, id: AnimationId) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) if *entry == Entry::Live => {
                *entry = Entry::Dead;
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self, id: AnimationId) -> bool {
        self.entries.get(&id) == Some(&Entry::Live)
    }

    /// Rebuild the table keeping only live entries
    pub fn compact(&mut self) {
        let before = self.entries.len();
        self.entries = self
            .entries
            .drain()
            .filter(|(_, entry)| *entry == Entry::Live)
            .collect();
        log::trace!(
            "Compacted animation registry: {} -> {} entries",
            before,
            self.entries.len()
        );
    }

    /// Entries currently stored, dead ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| **entry == Entry::Live)
            .count()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increase() {
        let mut registry = Registry::new();
        let a = registry.start();
        let b = registry.start();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert!(registry.is_running(a));
        assert!(registry.is_running(b));
    }

    #[test]
    fn test_stop_reports_transition_once() {
        let mut registry = Registry::new();
        let id = registry.start();
        assert!(registry.stop(id));
        assert!(!registry.stop(id));
        assert!(!registry.is_running(id));
        // Dead but still present until compaction
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stop_unknown_id() {
        let mut registry = Registry::new();
        registry.start();
        assert!(!registry.stop(AnimationId(42)));
        assert!(!registry.is_running(AnimationId(42)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_compaction_every_twentieth_start() {
        let mut registry = Registry::new();
        let keep = registry.start();
        for _ in 1..19 {
            let id = registry.start();
            registry.stop(id);
        }
        assert_eq!(registry.len(), 19);

        // The 20th allocation drops the 18 dead entries
        let twentieth = registry.start();
        assert_eq!(twentieth.get(), 20);
        assert_eq!(registry.len(), 2);
        assert!(registry.is_running(keep));
        assert!(registry.is_running(twentieth));
    }

    #[test]
    fn test_dead_entries_stay_bounded() {
        let mut registry = Registry::new();
        let live: Vec<_> = (0..3).map(|_| registry.start()).collect();
        for _ in 0..200 {
            let id = registry.start();
            assert!(registry.len() <= registry.live_count() + 19);
            registry.stop(id);
        }
        assert_eq!(registry.live_count(), 3);
        assert!(live.iter().all(|id| registry.is_running(*id)));
    }

    #[test]
    fn test_zero_compaction_interval_is_clamped() {
        let mut registry = Registry::with_compaction(0);
        let a = registry.start();
        registry.stop(a);
        registry.start();
        assert_eq!(registry.len(), 1);
    }
}
