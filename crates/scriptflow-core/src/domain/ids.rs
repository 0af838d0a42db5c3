//! Domain identifiers (strongly-typed IDs).
//!
//! Every id is a ULID wrapped in `Id<T>`, where `T` is a zero-sized marker.
//! ULIDs sort by creation time and can be minted on any node without
//! coordination, which keeps history records ordered without a sequence.
//!
//! The marker only exists at compile time (`PhantomData`), so a
//! `ProcessInstanceId` cannot be passed where an `ExecutionId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for each id family.
///
/// Supplies the prefix used by `Display` (`"proc-"`, `"exec-"`).
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic ULID-backed id.
///
/// ```ignore
/// let instance: ProcessInstanceId = Id::from(Ulid::new());
/// let execution: ExecutionId = Id::from(Ulid::new());
/// // instance and execution are different types and cannot be mixed up
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker for process instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcessInstance {}

impl IdMarker for ProcessInstance {
    fn prefix() -> &'static str {
        "proc-"
    }
}

/// Marker for executions (one token path inside a process instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExecutionMarker {}

impl IdMarker for ExecutionMarker {
    fn prefix() -> &'static str {
        "exec-"
    }
}

/// Identifier of a running process instance.
pub type ProcessInstanceId = Id<ProcessInstance>;

/// Identifier of an execution (the unit that owns a variable scope).
pub type ExecutionId = Id<ExecutionMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types_with_prefixes() {
        let ulid1 = Ulid::new();
        let ulid2 = Ulid::new();

        let instance = ProcessInstanceId::from_ulid(ulid1);
        let execution = ExecutionId::from_ulid(ulid2);

        assert_eq!(instance.as_ulid(), ulid1);
        assert_eq!(execution.as_ulid(), ulid2);
        assert!(instance.to_string().starts_with("proc-"));
        assert!(execution.to_string().starts_with("exec-"));

        // let _: ExecutionId = instance; // <- does not compile
    }

    #[test]
    fn ulid_ids_are_sortable() {
        let id1 = ExecutionId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = ExecutionId::from_ulid(Ulid::new());

        assert!(id1 < id2);
    }

    #[test]
    fn ids_survive_json() {
        let id = ProcessInstanceId::from_ulid(Ulid::new());

        let serialized = serde_json::to_string(&id).unwrap();
        let back: ProcessInstanceId = serde_json::from_str(&serialized).unwrap();

        assert_eq!(id, back);
    }

    #[test]
    fn phantom_marker_is_zero_sized() {
        use std::mem::size_of;

        assert_eq!(size_of::<ExecutionId>(), size_of::<Ulid>());
        assert_eq!(size_of::<ProcessInstanceId>(), 16);
    }
}
