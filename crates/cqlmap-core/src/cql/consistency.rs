use serde::{Deserialize, Serialize};
use std::fmt;

///
/// ConsistencyLevel
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    LocalOne,
    Serial,
    LocalSerial,
}

impl ConsistencyLevel {
    /// Serial levels only apply to the Paxos phase of conditional writes.
    #[must_use]
    pub const fn is_serial(self) -> bool {
        matches!(self, Self::Serial | Self::LocalSerial)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Two => "TWO",
            Self::Three => "THREE",
            Self::Quorum => "QUORUM",
            Self::All => "ALL",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::LocalOne => "LOCAL_ONE",
            Self::Serial => "SERIAL",
            Self::LocalSerial => "LOCAL_SERIAL",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ConsistencyPair
///
/// Read/write consistency overrides. `None` inherits the next level down
/// (property → entity → flush context).
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConsistencyPair {
    pub read: Option<ConsistencyLevel>,
    pub write: Option<ConsistencyLevel>,
}

impl ConsistencyPair {
    #[must_use]
    pub const fn new(read: Option<ConsistencyLevel>, write: Option<ConsistencyLevel>) -> Self {
        Self { read, write }
    }

    #[must_use]
    pub const fn both(level: ConsistencyLevel) -> Self {
        Self {
            read: Some(level),
            write: Some(level),
        }
    }

    /// Fill unset levels from `fallback`.
    #[must_use]
    pub const fn or(self, fallback: Self) -> Self {
        Self {
            read: match self.read {
                Some(level) => Some(level),
                None => fallback.read,
            },
            write: match self.write {
                Some(level) => Some(level),
                None => fallback.write,
            },
        }
    }
}
