//! The set of primitives confirmed present on a session.

use std::collections::BTreeSet;
use std::fmt;

use super::{Family, Primitive, RemoteService};

/// Enumeration primitives in the order they are tried.
const ENUMERATE_ORDER: [Primitive; 3] = [Primitive::ListDir, Primitive::Ls, Primitive::ListDirectory];
/// Chunked-open primitives in the order they are tried.
const STREAM_ORDER: [Primitive; 2] = [Primitive::Open, Primitive::FileOpen];
const BULK_READ_ORDER: [Primitive; 1] = [Primitive::GetFileContents];
const COPY_OUT_ORDER: [Primitive; 2] = [Primitive::PullFile, Primitive::Pull];

/// Primitives available on the current session.
///
/// Computed once at session start and immutable afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    primitives: BTreeSet<Primitive>,
}

impl CapabilitySet {
    /// Records what `service` advertises.
    #[must_use]
    pub fn probe(service: &dyn RemoteService) -> Self {
        let set: Self = service.advertised().into_iter().collect();
        if set.is_empty() {
            log::warn!("Device advertises no file-access primitives");
        } else {
            log::info!("Detected device primitives: {set}");
        }
        set
    }

    /// Returns true if `primitive` is available.
    #[must_use]
    pub fn contains(&self, primitive: Primitive) -> bool {
        self.primitives.contains(&primitive)
    }

    /// Returns true if nothing is available.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Returns true if at least one primitive of `family` is available.
    #[must_use]
    pub fn has(&self, family: Family) -> bool {
        !self.ordered(family).is_empty()
    }

    /// Available primitives of `family`, in fallback priority order.
    #[must_use]
    pub fn ordered(&self, family: Family) -> Vec<Primitive> {
        let order: &[Primitive] = match family {
            Family::Enumerate => &ENUMERATE_ORDER,
            Family::Stream => &STREAM_ORDER,
            Family::BulkRead => &BULK_READ_ORDER,
            Family::CopyOut => &COPY_OUT_ORDER,
        };
        order.iter().copied().filter(|p| self.contains(*p)).collect()
    }
}

impl FromIterator<Primitive> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Primitive>>(iter: I) -> Self {
        Self {
            primitives: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.primitives.iter().map(|p| p.name()).collect();
        f.write_str(&names.join(", "))
    }
}
