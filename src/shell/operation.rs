//! The closed vocabulary of shell operations and sets of them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single operation a shell may expose.
///
/// Declaration order is the vocabulary order; it decides which operation is
/// reported first when several are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Execute,
    Read,
    Write,
    Upload,
    Unlink,
}

impl Operation {
    /// Every operation, in vocabulary order.
    pub const ALL: [Operation; 5] = [
        Operation::Execute,
        Operation::Read,
        Operation::Write,
        Operation::Upload,
        Operation::Unlink,
    ];

    /// Stable lowercase name, used in errors, logs and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Execute => "execute",
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Upload => "upload",
            Operation::Unlink => "unlink",
        }
    }

    /// Parse an operation from its stable name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered set of operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationSet(BTreeSet<Operation>);

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, op: Operation) -> bool {
        self.0.insert(op)
    }

    pub fn contains(&self, op: Operation) -> bool {
        self.0.contains(&op)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Operations in `self` that are absent from `available`.
    pub fn missing_from(&self, available: &OperationSet) -> OperationSet {
        Self(self.0.difference(&available.0).copied().collect())
    }

    pub fn union(&self, other: &OperationSet) -> OperationSet {
        Self(self.0.union(&other.0).copied().collect())
    }

    /// First operation in vocabulary order.
    pub fn first(&self) -> Option<Operation> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Operation> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Operation> for OperationSet {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&[Operation]> for OperationSet {
    fn from(ops: &[Operation]) -> Self {
        ops.iter().copied().collect()
    }
}

impl<const N: usize> From<[Operation; N]> for OperationSet {
    fn from(ops: [Operation; N]) -> Self {
        ops.into_iter().collect()
    }
}

impl fmt::Display for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, op) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(op.as_str())?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.as_str()), Some(op));
        }
        assert_eq!(Operation::from_name("chmod"), None);
    }

    #[test]
    fn test_missing_from_is_set_difference() {
        let required = OperationSet::from([Operation::Write, Operation::Execute, Operation::Read]);
        let available = OperationSet::from([Operation::Read, Operation::Upload]);

        let missing = required.missing_from(&available);
        assert_eq!(missing, OperationSet::from([Operation::Execute, Operation::Write]));
    }

    #[test]
    fn test_first_follows_vocabulary_order() {
        let set = OperationSet::from([Operation::Unlink, Operation::Read, Operation::Write]);
        assert_eq!(set.first(), Some(Operation::Read));
        assert_eq!(OperationSet::new().first(), None);
    }

    #[test]
    fn test_display_and_json() {
        let set = OperationSet::from([Operation::Upload, Operation::Execute]);
        assert_eq!(set.to_string(), "{execute, upload}");
        assert_eq!(OperationSet::new().to_string(), "{}");

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["execute","upload"]"#);
    }
}
