use crate::document::{Document, ID_FIELD, get_path};
use bson::Bson;
use std::cmp::Ordering;

use super::types::{CmpOp, Filter, MAX_SORT_FIELDS, Order, SortSpec};

const EARTH_RADIUS_MILES: f64 = 3963.2;

/// Evaluates a filter against a document. A scalar condition on an array field
/// matches when any element matches.
#[must_use]
pub fn eval_filter(doc: &Document, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::In { path, values } => {
            get_path(doc, path).is_some_and(|v| any_element(v, |x| is_in_set(x, values)))
        }
        Filter::Cmp { path, op, value } => get_path(doc, path)
            .is_some_and(|v| any_element(v, |x| cmp_matches(x, *op, value))),
        Filter::Within { path, lng, lat, radius } => {
            point_of(get_path(doc, path)).is_some_and(|(plng, plat)| {
                angular_distance((*lng, *lat), (plng, plat)) <= *radius
            })
        }
    }
}

fn any_element(v: &Bson, pred: impl Fn(&Bson) -> bool) -> bool {
    match v {
        Bson::Array(items) => items.iter().any(&pred) || pred(v),
        _ => pred(v),
    }
}

fn cmp_matches(v: &Bson, op: CmpOp, value: &Bson) -> bool {
    if op == CmpOp::Eq {
        return bson_eq(v, value);
    }
    // Range operators only compare values of the same family.
    if !comparable(v, value) {
        return false;
    }
    let c = compare_bson(v, value);
    match op {
        CmpOp::Eq => c == Ordering::Equal,
        CmpOp::Gt => c == Ordering::Greater,
        CmpOp::Gte => c != Ordering::Less,
        CmpOp::Lt => c == Ordering::Less,
        CmpOp::Lte => c != Ordering::Greater,
    }
}

fn is_in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().any(|x| bson_eq(v, x))
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))
}

fn comparable(a: &Bson, b: &Bson) -> bool {
    (is_num(a) && is_num(b)) || std::mem::discriminant(a) == std::mem::discriminant(b)
}

#[allow(clippy::cast_precision_loss)]
fn as_f64_num(x: &Bson) -> f64 {
    match x {
        Bson::Int32(i) => f64::from(*i),
        Bson::Int64(i) => *i as f64,
        Bson::Double(f) => *f,
        _ => f64::NAN,
    }
}

/// Equality that treats all numeric kinds as one family (`1000 == 1000.0`).
#[must_use]
pub fn bson_eq(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return as_f64_num(a) == as_f64_num(b);
    }
    a == b
}

#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if is_num(a) && is_num(b) {
        return as_f64_num(a).total_cmp(&as_f64_num(b));
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Bson) -> u8 {
    match v {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 255,
        _ => 12,
    }
}

/// Composite ordering with left-to-right priority. Missing fields sort before present ones.
#[must_use]
pub fn compare_docs(a: &Document, b: &Document, sort: &[SortSpec]) -> Ordering {
    for s in sort.iter().take(MAX_SORT_FIELDS + 1) {
        let ord = match (get_path(a, &s.field), get_path(b, &s.field)) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if s.order == Order::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

/// Keeps `_id` plus the listed fields. Dotted names keep only that nested leaf.
#[must_use]
pub fn project_fields(doc: &Document, fields: &[String]) -> Document {
    let mut out = Document::new();
    if let Some(id) = doc.get(ID_FIELD) {
        out.insert(ID_FIELD, id.clone());
    }
    for f in fields {
        if let Some(v) = get_path(doc, f) {
            insert_path(&mut out, f, v.clone());
        }
    }
    out
}

fn insert_path(doc: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(doc.get(head), Some(Bson::Document(_))) {
                doc.insert(head, Document::new());
            }
            if let Some(Bson::Document(sub)) = doc.get_mut(head) {
                insert_path(sub, rest, value);
            }
        }
    }
}

fn point_of(v: Option<&Bson>) -> Option<(f64, f64)> {
    match v? {
        Bson::Array(c) if c.len() == 2 && c.iter().all(is_num) => {
            Some((as_f64_num(&c[0]), as_f64_num(&c[1])))
        }
        _ => None,
    }
}

/// Great-circle distance in radians between two `(lng, lat)` points given in degrees.
#[must_use]
pub fn angular_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lng1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lng2, lat2) = (b.0.to_radians(), b.1.to_radians());
    let h = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lng2 - lng1) / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Converts a distance in miles into a radius in radians on the earth's surface.
#[must_use]
pub fn miles_to_radians(miles: f64) -> f64 {
    miles / EARTH_RADIUS_MILES
}
