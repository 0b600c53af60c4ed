use bson::Bson;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Safety limits to prevent resource abuse
pub(crate) const MAX_IN_SET: usize = 1000;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_PROJECTION_FIELDS: usize = 64;
pub const DEFAULT_LIMIT: usize = 25;
pub const MAX_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Desc }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Operator tokens accepted in bracket keys (`averageCost[gte]=1000`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpToken {
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FromStr for OpToken {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            "lt" => Ok(Self::Lt),
            "lte" => Ok(Self::Lte),
            "in" => Ok(Self::In),
            other => Err(format!("unsupported operator [{other}]")),
        }
    }
}

impl OpToken {
    /// The comparison this token stands for; `None` for set membership.
    #[must_use]
    pub const fn cmp_op(self) -> Option<CmpOp> {
        match self {
            Self::Gt => Some(CmpOp::Gt),
            Self::Gte => Some(CmpOp::Gte),
            Self::Lt => Some(CmpOp::Lt),
            Self::Lte => Some(CmpOp::Lte),
            Self::In => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    In { path: String, values: Vec<Bson> },
    Cmp { path: String, op: CmpOp, value: Bson },
    /// Point stored as `[lng, lat]` at `path` lies within `radius` radians of the center.
    Within { path: String, lng: f64, lat: f64, radius: f64 },
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self::Cmp { path: path.into(), op: CmpOp::Eq, value: value.into() }
    }

    /// Conjunction that flattens nested `And`s and drops `True`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut parts = Vec::new();
        for f in [self, other] {
            match f {
                Self::True => {}
                Self::And(fs) => parts.extend(fs),
                f => parts.push(f),
            }
        }
        match parts.len() {
            0 => Self::True,
            1 => parts.remove(0),
            _ => Self::And(parts),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulateKind {
    /// `path` holds the related `_id`; it is replaced by the related document (or null).
    Ref,
    /// Related documents whose `foreign_field` equals this `_id` are attached under `path`.
    Reverse { foreign_field: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Populate {
    pub path: String,
    pub from: String,
    /// Fields kept on related documents (plus `_id`); empty keeps everything.
    pub select: Vec<String>,
    pub kind: PopulateKind,
}

impl Populate {
    pub fn reference(path: impl Into<String>, from: impl Into<String>, select: &[&str]) -> Self {
        Self {
            path: path.into(),
            from: from.into(),
            select: select.iter().map(|s| (*s).to_string()).collect(),
            kind: PopulateKind::Ref,
        }
    }

    pub fn reverse(
        path: impl Into<String>,
        from: impl Into<String>,
        foreign_field: impl Into<String>,
        select: &[&str],
    ) -> Self {
        Self {
            path: path.into(),
            from: from.into(),
            select: select.iter().map(|s| (*s).to_string()).collect(),
            kind: PopulateKind::Reverse { foreign_field: foreign_field.into() },
        }
    }
}

/// Options for `DocumentStore::find`.
///
/// Semantics:
/// - Filtering, then sorting, then `skip`/`limit` (capped at `MAX_LIMIT`).
/// - `projection: Some(fields)` keeps exactly those fields plus `_id`.
/// - Without a projection, `hidden` fields are removed.
/// - Population runs last, on the shaped page.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub projection: Option<Vec<String>>,
    pub hidden: Vec<String>,
    pub sort: Vec<SortSpec>,
    pub skip: usize,
    pub limit: Option<usize>,
    pub populate: Option<Populate>,
}
