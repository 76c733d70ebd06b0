//! Immutable process-table snapshots.

use serde::Serialize;

/// One process as seen at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessEntry {
    /// Process id.
    pub pid: i32,
    /// Short process name (`comm`).
    pub name: String,
    /// Full argument vector, or `None` when it could not be read.
    pub args: Option<Vec<String>>,
}

impl ProcessEntry {
    /// Entry with a readable argument vector.
    #[must_use]
    pub fn new(pid: i32, name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            args: Some(args),
        }
    }

    /// Entry whose argument vector could not be read.
    #[must_use]
    pub fn unreadable(pid: i32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            args: None,
        }
    }

    /// Whether any argument equals `needle` exactly.
    ///
    /// Unreadable argument vectors never match.
    #[must_use]
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args
            .as_deref()
            .is_some_and(|args| args.iter().any(|arg| arg == needle))
    }
}

/// Ordered, immutable capture of the process table.
///
/// A snapshot is never refreshed in place; callers take a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSnapshot {
    entries: Vec<ProcessEntry>,
}

impl ProcessSnapshot {
    /// Wrap entries in the order they were enumerated.
    #[must_use]
    pub const fn new(entries: Vec<ProcessEntry>) -> Self {
        Self { entries }
    }

    /// All entries in enumeration order.
    #[must_use]
    pub fn entries(&self) -> &[ProcessEntry] {
        &self.entries
    }

    /// Entries whose name equals `name`, in enumeration order.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ProcessEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.name == name)
    }

    /// Whether any process named `name` is present.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.named(name).next().is_some()
    }

    /// Number of processes captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn has_arg_requires_exact_match() {
        let entry = ProcessEntry::new(
            10,
            "rdimport",
            args(&["rdimport", "--drop-box", "MUSIC", "/mnt/drop1/*.wav"]),
        );
        assert!(entry.has_arg("/mnt/drop1/*.wav"));
        assert!(!entry.has_arg("/mnt/drop1/"));
        assert!(!entry.has_arg("/mnt/drop1/*.WAV"));
        assert!(!ProcessEntry::unreadable(11, "rdimport").has_arg("/mnt/drop1/*.wav"));
    }

    #[test]
    fn named_preserves_enumeration_order() {
        let snapshot = ProcessSnapshot::new(vec![
            ProcessEntry::new(30, "rdimport", args(&["rdimport"])),
            ProcessEntry::new(5, "rdcatchd", args(&["rdcatchd"])),
            ProcessEntry::new(12, "rdimport", args(&["rdimport"])),
        ]);
        let pids: Vec<i32> = snapshot.named("rdimport").map(|entry| entry.pid).collect();
        assert_eq!(pids, vec![30, 12]);
        assert!(snapshot.contains_name("rdcatchd"));
        assert!(!snapshot.contains_name("caed"));
        assert_eq!(snapshot.len(), 3);
        assert!(!snapshot.is_empty());
    }
}
