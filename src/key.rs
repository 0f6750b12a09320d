//! Key: the closed set of shapes a structural map accepts as keys.

use core::fmt;

/// A key value of any supported shape.
///
/// Equality (`==`) is structural: lists compare element-wise in order,
/// records compare by their full set of `(name, value)` pairs regardless of
/// declaration order. See [`crate::equivalence`].
#[derive(Clone, Debug)]
pub enum Key {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An atom. Never equal to a `Str` with the same text.
    Symbol(String),
    List(Vec<Key>),
    /// Field-set. Declaration order is kept for display only.
    Record(Vec<(String, Key)>),
}

impl Key {
    pub fn symbol(name: impl Into<String>) -> Self {
        Key::Symbol(name.into())
    }

    pub fn list<T, I>(items: I) -> Self
    where
        T: Into<Key>,
        I: IntoIterator<Item = T>,
    {
        Key::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a record from `(name, value)` pairs in declaration order.
    ///
    /// Duplicate names are accepted here and rejected when the key is
    /// fingerprinted ([`KeyError::DuplicateField`]).
    pub fn record<N, T, I>(fields: I) -> Self
    where
        N: Into<String>,
        T: Into<Key>,
        I: IntoIterator<Item = (N, T)>,
    {
        Key::Record(
            fields
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Key::List(_) | Key::Record(_))
    }

    /// Look up a record field by name. `None` for non-records.
    pub fn field(&self, name: &str) -> Option<&Key> {
        match self {
            Key::Record(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Int(i64::from(i))
    }
}

impl From<u32> for Key {
    fn from(i: u32) -> Self {
        Key::Int(i64::from(i))
    }
}

impl From<f64> for Key {
    fn from(f: f64) -> Self {
        Key::Float(f)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl<T: Into<Key>> From<Vec<T>> for Key {
    fn from(items: Vec<T>) -> Self {
        Key::list(items)
    }
}

impl<T: Into<Key>> From<Option<T>> for Key {
    fn from(o: Option<T>) -> Self {
        o.map_or(Key::Null, Into::into)
    }
}

/// Failure to process a key. Propagated unchanged to the caller of the map
/// operation that triggered it; the map is left untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyError {
    /// A record names the same field more than once.
    DuplicateField { field: String },
    /// Raised by user-supplied fingerprinters for shapes they do not cover.
    Unsupported(String),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::DuplicateField { field } => {
                write!(f, "record key has duplicate field `{}`", field)
            }
            KeyError::Unsupported(what) => write!(f, "unsupported key shape: {}", what),
        }
    }
}

impl std::error::Error for KeyError {}
