//! Core types for the entity store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Unique identifier for an entity.
///
/// Text and numeric ids never compare equal to each other, so `Id::from("1")`
/// and `Id::from(1)` name two different entities.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(i64),
    Text(String),
}

impl Id {
    /// Text value, if this is a text id.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Id::Text(s) => Some(s),
            Id::Number(_) => None,
        }
    }

    /// Numeric value, if this is a numeric id.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Id::Number(n) => Some(*n),
            Id::Text(_) => None,
        }
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Text(s) => write!(f, "Id({:?})", s),
            Id::Number(n) => write!(f, "Id({})", n),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Text(s) => write!(f, "{}", s),
            Id::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::Text(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::Text(s)
    }
}

impl From<&String> for Id {
    fn from(s: &String) -> Self {
        Id::Text(s.clone())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Id::Number(i64::from(n))
    }
}

impl From<u32> for Id {
    fn from(n: u32) -> Self {
        Id::Number(i64::from(n))
    }
}

/// Function used to get the unique id of an entity.
pub type GetId<T> = Arc<dyn Fn(&T) -> Id + Send + Sync>;

/// Filter function over entities.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
