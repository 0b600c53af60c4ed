//! Raw query-string parameters.
//!
//! Keys keep their bracket suffix (`averageCost[gte]`); splitting a key into field and
//! operator happens in [`split_key`]. A repeated key collects all of its values.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    One(String),
    Many(Vec<String>),
}

impl ParamValue {
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(v) => vec![v.as_str()],
            Self::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// The single value, or `None` when the key was repeated.
    #[must_use]
    pub fn single(&self) -> Option<&str> {
        match self {
            Self::One(v) => Some(v),
            Self::Many(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: BTreeMap<String, ParamValue>,
}

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `a=1&b=x%20y&b=z` as `application/x-www-form-urlencoded`. Empty segments
    /// and empty keys are skipped; a key without `=` gets an empty value. Invalid escapes
    /// are kept literally and invalid UTF-8 is replaced.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut out = Self::new();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            out.insert(key, value);
        }
        out
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut out = Self::new();
        for (k, v) in pairs {
            out.insert(k, v);
        }
        out
    }

    /// Adds a value; a key seen before turns into (or extends) a list.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.entries.entry(key.into()) {
            Entry::Vacant(e) => {
                e.insert(ParamValue::One(value));
            }
            Entry::Occupied(mut e) => {
                let slot = e.get_mut();
                *slot = match std::mem::replace(slot, ParamValue::Many(Vec::new())) {
                    ParamValue::One(first) => ParamValue::Many(vec![first, value]),
                    ParamValue::Many(mut vs) => {
                        vs.push(value);
                        ParamValue::Many(vs)
                    }
                };
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Splits `field[op]` into `("field", Some("op"))`; a plain key yields `(key, None)`.
/// Returns `None` when the brackets are malformed (`a[gt`, `a[]`, `[gt]`, `a[gt]x`).
#[must_use]
pub fn split_key(key: &str) -> Option<(&str, Option<&str>)> {
    match key.find('[') {
        None => (!key.contains(']')).then_some((key, None)),
        Some(open) => {
            let field = &key[..open];
            let rest = key[open + 1..].strip_suffix(']')?;
            if field.is_empty() || rest.is_empty() || rest.contains(['[', ']']) {
                return None;
            }
            Some((field, Some(rest)))
        }
    }
}
