//! Change events and per-root action filtering

use crate::error::WatchError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use sw_core::FileEntry;

/// Kind of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Op {
    Create,
    Write,
    Remove,
    Rename,
    /// Accepted in configuration; mode changes alone are never classified
    Chmod,
    Move,
}

impl Op {
    pub const ALL: [Op; 6] = [Op::Create, Op::Write, Op::Remove, Op::Rename, Op::Chmod, Op::Move];

    fn bit(self) -> u32 {
        match self {
            Op::Create => 1,
            Op::Write => 2,
            Op::Remove => 4,
            Op::Rename => 8,
            Op::Chmod => 16,
            Op::Move => 32,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Create => "CREATE",
            Op::Write => "WRITE",
            Op::Remove => "REMOVE",
            Op::Rename => "RENAME",
            Op::Chmod => "CHMOD",
            Op::Move => "MOVE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Op {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Op::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WatchError::UnknownAction(s.to_string()))
    }
}

/// Set of operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OpSet(u32);

impl OpSet {
    pub const EMPTY: OpSet = OpSet(0);
    pub const ALL: OpSet = OpSet(1 | 2 | 4 | 8 | 16 | 32);

    pub fn contains(self, op: Op) -> bool {
        self.0 & op.bit() != 0
    }

    pub fn insert(&mut self, op: Op) {
        self.0 |= op.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Op> {
        Op::ALL.into_iter().filter(move |op| self.contains(*op))
    }

    /// Parse action names case-insensitively; no names means every action
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, WatchError> {
        if names.is_empty() {
            return Ok(Self::ALL);
        }
        let mut set = Self::EMPTY;
        for name in names {
            set.insert(name.as_ref().parse()?);
        }
        Ok(set)
    }
}

impl FromIterator<Op> for OpSet {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for op in iter {
            set.insert(op);
        }
        set
    }
}

impl fmt::Display for OpSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("ALL");
        }
        let names: Vec<&str> = self.iter().map(Op::name).collect();
        f.write_str(&names.join("|"))
    }
}

/// One classified change under a root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub op: Op,
    /// Path after the change
    pub path: String,
    /// Path before a rename or move
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    /// Base name after the change
    pub name: String,
    pub is_dir: bool,
}

impl Event {
    pub fn new(op: Op, entry: &FileEntry) -> Self {
        Self {
            op,
            path: entry.path.clone(),
            old_path: None,
            name: entry.name.clone(),
            is_dir: entry.is_dir(),
        }
    }

    /// `entry` now lives where it does, having been at `old_path`
    pub fn relocated(op: Op, old_path: &str, entry: &FileEntry) -> Self {
        Self {
            old_path: Some(old_path.to_string()),
            ..Self::new(op, entry)
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_dir { "DIRECTORY" } else { "FILE" };
        write!(f, "{} {:?} {} [{}]", kind, self.name, self.op, self.path)
    }
}
