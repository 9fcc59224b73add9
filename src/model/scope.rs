use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of snapshot sections.
///
/// Used to mark parts of the model stale, to batch gateway queries, and to
/// filter change events for subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScopeSet(u8);

impl ScopeSet {
    pub const NONE: ScopeSet = ScopeSet(0);
    /// HEAD plus local and remote branches
    pub const BRANCHES: ScopeSet = ScopeSet(1);
    /// Index and working tree
    pub const STATUS: ScopeSet = ScopeSet(1 << 1);
    /// Recent commits reachable from HEAD
    pub const LOG: ScopeSet = ScopeSet(1 << 2);
    pub const ALL: ScopeSet = ScopeSet(0b111);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: ScopeSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: ScopeSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: ScopeSet) {
        self.0 |= other.0;
    }

    /// Return the current set and leave this one empty
    pub fn take(&mut self) -> ScopeSet {
        std::mem::take(self)
    }
}

impl BitOr for ScopeSet {
    type Output = ScopeSet;

    fn bitor(self, rhs: ScopeSet) -> ScopeSet {
        ScopeSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for ScopeSet {
    fn bitor_assign(&mut self, rhs: ScopeSet) {
        self.insert(rhs);
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (ScopeSet::BRANCHES, "branches"),
            (ScopeSet::STATUS, "status"),
            (ScopeSet::LOG, "log"),
        ]
        .into_iter()
        .filter(|(scope, _)| self.contains(*scope))
        .map(|(_, name)| name)
        .collect();

        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("+"))
        }
    }
}
