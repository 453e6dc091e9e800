//! Tag value types.
//!
//! Tags are free-form metadata attached either to the whole document or to
//! individual events. A tag value is always a scalar or a flat list of
//! scalars, which keeps the append rules of [`TagValue::extend`] total.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single tag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Interprets free text the way a shell user would expect.
    ///
    /// `true`/`false` become booleans, integral text becomes an integer,
    /// finite decimal text becomes a float and anything else stays a string.
    pub fn infer(text: &str) -> Self {
        match text {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(int) = text.parse::<i64>() {
            return Self::Int(int);
        }
        match text.parse::<f64>() {
            Ok(float) if float.is_finite() => Self::Float(float),
            _ => Self::Str(text.to_string()),
        }
    }
}

/// Implements `From` for both [`Scalar`] and [`TagValue`] from a primitive.
macro_rules! impl_scalar_from {
    ($($ty:ty => |$value:ident| $convert:expr),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from($value: $ty) -> Self {
                    $convert
                }
            }

            impl From<$ty> for TagValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.into())
                }
            }
        )*
    };
}

impl_scalar_from!(
    bool => |value| Self::Bool(value),
    i64 => |value| Self::Int(value),
    i32 => |value| Self::Int(i64::from(value)),
    u32 => |value| Self::Int(i64::from(value)),
    f64 => |value| Self::Float(value),
    &str => |value| Self::Str(value.to_string()),
    String => |value| Self::Str(value),
);

/// A tag value: one scalar, or a list of scalars built up by appends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    List(Vec<Scalar>),
    Scalar(Scalar),
}

impl TagValue {
    /// Appends `values`, turning a scalar into a one-element list first.
    pub fn extend(&mut self, values: impl IntoIterator<Item = Scalar>) {
        let mut list = match std::mem::replace(self, Self::List(Vec::new())) {
            Self::List(list) => list,
            Self::Scalar(old) => vec![old],
        };
        list.extend(values);
        *self = Self::List(list);
    }

    /// Flattens the value into its scalars.
    pub fn into_scalars(self) -> Vec<Scalar> {
        match self {
            Self::List(list) => list,
            Self::Scalar(scalar) => vec![scalar],
        }
    }

    /// Returns the list form, or `None` for a scalar.
    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            Self::List(list) => Some(list),
            Self::Scalar(_) => None,
        }
    }
}

impl From<Scalar> for TagValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for TagValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for TagValue {
    fn from(values: [T; N]) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// A tag map, keyed by tag name.
///
/// Keys keep the order they were first set in; replacing a value keeps its
/// position and new keys go to the end. Equality ignores order.
#[derive(Debug, Clone, Default)]
pub struct Tags(Vec<(String, TagValue)>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<TagValue>) {
        let key = key.into();
        let value = value.into();
        match self.entry_mut(&key) {
            Some(existing) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub(crate) fn entry_mut(&mut self, key: &str) -> Option<&mut TagValue> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Merges `other` over `self`; keys from `other` win.
    pub fn merge(&mut self, other: Self) {
        for (key, value) in other.0 {
            self.insert(key, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl PartialEq for Tags {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.0.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>, V: Into<TagValue>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Self::new();
        for (key, value) in iter {
            tags.insert(key, value);
        }
        tags
    }
}

impl<K: Into<String>, V: Into<TagValue>, const N: usize> From<[(K, V); N]> for Tags {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl Serialize for Tags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TagsVisitor;

        impl<'de> Visitor<'de> for TagsVisitor {
            type Value = Tags;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of tag values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Tags, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut tags = Tags::new();
                while let Some((key, value)) = access.next_entry::<String, TagValue>()? {
                    tags.insert(key, value);
                }
                Ok(tags)
            }
        }

        deserializer.deserialize_map(TagsVisitor)
    }
}
