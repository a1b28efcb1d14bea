use crate::models::ShortcutEntry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable keyword → phrase mapping. Keys are always lower-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcutSnapshot {
    phrases: HashMap<String, String>,
}

impl ShortcutSnapshot {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let phrases = pairs
            .into_iter()
            .map(|(keyword, phrase)| (keyword.as_ref().to_lowercase(), phrase.into()))
            .collect();
        Self { phrases }
    }

    pub fn from_entries(entries: &[ShortcutEntry]) -> Self {
        Self::new(
            entries
                .iter()
                .map(|entry| (entry.keyword.as_str(), entry.phrase.clone())),
        )
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, keyword: &str) -> Option<&str> {
        self.phrases
            .get(&keyword.to_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.lookup(keyword).is_some()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

/// Shared, atomically replaceable reference to the current snapshot.
///
/// Readers clone the inner `Arc` and keep working on that value even if a
/// writer swaps in a new one meanwhile, so a lookup never sees a half-updated map.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle {
    current: Arc<RwLock<Arc<ShortcutSnapshot>>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: ShortcutSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    pub fn load(&self) -> Arc<ShortcutSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn replace(&self, snapshot: ShortcutSnapshot) {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let snapshot = ShortcutSnapshot::new([("Tady", "Thank you very much in advance.")]);
        assert_eq!(
            snapshot.lookup("tady"),
            Some("Thank you very much in advance.")
        );
        assert_eq!(snapshot.lookup("TADY"), snapshot.lookup("tady"));
        assert!(snapshot.lookup("tad").is_none());
    }

    #[test]
    fn replaced_snapshot_does_not_affect_loaded_reader() {
        let handle = SnapshotHandle::new(ShortcutSnapshot::new([("bye", "Goodbye")]));
        let before = handle.load();

        handle.replace(ShortcutSnapshot::new([("hello", "Hello there")]));

        assert!(before.contains("bye"));
        assert!(!before.contains("hello"));
        let after = handle.load();
        assert!(after.contains("hello"));
        assert!(!after.contains("bye"));
    }

    #[test]
    fn clones_share_the_same_slot() {
        let handle = SnapshotHandle::default();
        let other = handle.clone();
        other.replace(ShortcutSnapshot::new([("tcoop", "Thanks for your cooperation.")]));
        assert_eq!(handle.load().len(), 1);
    }
}
