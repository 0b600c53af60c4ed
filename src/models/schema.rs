//! Static field tables describing each collection.
//!
//! A schema drives two things: validation of request bodies on write, and typing of
//! filter values taken from the query string.

use crate::document::{CREATED_AT, Document, ID_FIELD, from_chrono, now};
use crate::errors::ApiError;
use bson::Bson;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Date,
    ObjectId,
    StringArray,
    Object,
}

impl FieldKind {
    const fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::ObjectId => "ObjectId",
            Self::StringArray => "[string]",
            Self::Object => "Object",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Str(&'static str),
    Bool(bool),
    Now,
}

impl DefaultValue {
    fn to_bson(self) -> Bson {
        match self {
            Self::Str(s) => Bson::String(s.to_string()),
            Self::Bool(b) => Bson::Boolean(b),
            Self::Now => Bson::DateTime(now()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: Option<&'static str>,
    pub enum_values: &'static [&'static str],
    /// Values accepted in query-string filters when they differ from `enum_values`.
    pub filter_values: Option<&'static [&'static str]>,
    pub min_len: Option<(usize, &'static str)>,
    pub max_len: Option<(usize, &'static str)>,
    pub min: Option<(f64, &'static str)>,
    pub max: Option<(f64, &'static str)>,
    pub pattern: Option<(&'static str, &'static str)>,
    pub trim: bool,
    pub default: Option<DefaultValue>,
    pub hidden: bool,
    pub unique: bool,
    pub immutable: bool,
    /// Maintained by services; never taken from a request body.
    pub derived: bool,
}

impl FieldDef {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: None,
            enum_values: &[],
            filter_values: None,
            min_len: None,
            max_len: None,
            min: None,
            max: None,
            pattern: None,
            trim: false,
            default: None,
            hidden: false,
            unique: false,
            immutable: false,
            derived: false,
        }
    }

    #[must_use]
    pub const fn required(mut self, msg: &'static str) -> Self {
        self.required = Some(msg);
        self
    }

    #[must_use]
    pub const fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.enum_values = values;
        self
    }

    #[must_use]
    pub const fn filter_one_of(mut self, values: &'static [&'static str]) -> Self {
        self.filter_values = Some(values);
        self
    }

    #[must_use]
    pub const fn min_len(mut self, n: usize, msg: &'static str) -> Self {
        self.min_len = Some((n, msg));
        self
    }

    #[must_use]
    pub const fn max_len(mut self, n: usize, msg: &'static str) -> Self {
        self.max_len = Some((n, msg));
        self
    }

    #[must_use]
    pub const fn min(mut self, n: f64, msg: &'static str) -> Self {
        self.min = Some((n, msg));
        self
    }

    #[must_use]
    pub const fn max(mut self, n: f64, msg: &'static str) -> Self {
        self.max = Some((n, msg));
        self
    }

    #[must_use]
    pub const fn pattern(mut self, re: &'static str, msg: &'static str) -> Self {
        self.pattern = Some((re, msg));
        self
    }

    #[must_use]
    pub const fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }

    #[must_use]
    pub const fn with_default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    #[must_use]
    pub const fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    fn cast_error(&self, raw: &str) -> String {
        format!("Cast to {} failed for value \"{raw}\" at path \"{}\"", self.kind.label(), self.name)
    }

    /// Converts a JSON body value into this field's kind.
    fn coerce_json(&self, value: &Value) -> Result<Bson, String> {
        let fail = || self.cast_error(&json_display(value));
        match (self.kind, value) {
            (FieldKind::String, Value::String(s)) => Ok(Bson::String(self.trim_str(s))),
            (FieldKind::String, Value::Number(n)) => Ok(Bson::String(n.to_string())),
            (FieldKind::String, Value::Bool(b)) => Ok(Bson::String(b.to_string())),
            (FieldKind::Number, Value::Number(n)) => {
                n.as_f64().filter(|f| f.is_finite()).map(Bson::Double).ok_or_else(fail)
            }
            (FieldKind::Number, Value::String(s)) => parse_finite(s).map(Bson::Double).ok_or_else(fail),
            (FieldKind::Boolean, Value::Bool(b)) => Ok(Bson::Boolean(*b)),
            (FieldKind::Boolean, Value::String(s)) => parse_bool(s).map(Bson::Boolean).ok_or_else(fail),
            (FieldKind::Date, Value::String(s)) => parse_date(s).ok_or_else(fail),
            (FieldKind::Date, Value::Number(n)) => {
                n.as_i64().map(|ms| Bson::DateTime(bson::DateTime::from_millis(ms))).ok_or_else(fail)
            }
            (FieldKind::ObjectId, Value::String(s)) => {
                ObjectId::parse_str(s.trim()).map(Bson::ObjectId).map_err(|_| fail())
            }
            (FieldKind::StringArray, Value::String(s)) => {
                Ok(Bson::Array(vec![Bson::String(self.trim_str(s))]))
            }
            (FieldKind::StringArray, Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => Ok(Bson::String(self.trim_str(s))),
                    _ => Err(fail()),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Bson::Array),
            (FieldKind::Object, Value::Object(_)) => {
                Bson::try_from(value.clone()).map_err(|_| fail())
            }
            _ => Err(fail()),
        }
    }

    /// Converts a query-string value into this field's kind.
    fn coerce_raw(&self, raw: &str) -> Result<Bson, String> {
        let fail = || self.cast_error(raw);
        let value = match self.kind {
            FieldKind::Number => parse_finite(raw).map(Bson::Double).ok_or_else(fail)?,
            FieldKind::Boolean => parse_bool(raw).map(Bson::Boolean).ok_or_else(fail)?,
            FieldKind::Date => match raw.trim().parse::<i64>() {
                Ok(ms) => Bson::DateTime(bson::DateTime::from_millis(ms)),
                Err(_) => parse_date(raw).ok_or_else(fail)?,
            },
            FieldKind::ObjectId => ObjectId::parse_str(raw.trim()).map(Bson::ObjectId).map_err(|_| fail())?,
            FieldKind::String | FieldKind::StringArray | FieldKind::Object => {
                Bson::String(raw.to_string())
            }
        };
        let allowed = self.filter_values.unwrap_or(self.enum_values);
        if let Bson::String(s) = &value
            && !allowed.is_empty()
            && !allowed.contains(&s.as_str())
        {
            return Err(enum_message(s, self.name));
        }
        Ok(value)
    }

    fn trim_str(&self, s: &str) -> String {
        if self.trim { s.trim().to_string() } else { s.to_string() }
    }

    /// Runs every rule against a coerced value, pushing one message per failed rule.
    fn validate(&self, value: &Bson, errors: &mut Vec<String>) -> Result<(), ApiError> {
        let strings: Vec<&str> = match value {
            Bson::String(s) => vec![s.as_str()],
            Bson::Array(items) => items.iter().filter_map(Bson::as_str).collect(),
            _ => Vec::new(),
        };
        for s in &strings {
            if !self.enum_values.is_empty() && !self.enum_values.contains(s) {
                errors.push(enum_message(s, self.name));
            }
        }
        if let Bson::String(s) = value {
            let len = s.chars().count();
            if let Some((n, msg)) = self.min_len
                && len < n
            {
                errors.push(msg.to_string());
            }
            if let Some((n, msg)) = self.max_len
                && len > n
            {
                errors.push(msg.to_string());
            }
            if let Some((re, msg)) = self.pattern {
                let re = Regex::new(re)
                    .map_err(|e| ApiError::Config(format!("pattern for {}: {e}", self.name)))?;
                if !re.is_match(s) {
                    errors.push(msg.to_string());
                }
            }
        }
        if let Bson::Double(n) = value {
            if !n.is_finite() {
                errors.push(self.cast_error(&n.to_string()));
            }
            if let Some((min, msg)) = self.min
                && *n < min
            {
                errors.push(msg.to_string());
            }
            if let Some((max, msg)) = self.max
                && *n > max
            {
                errors.push(msg.to_string());
            }
        }
        Ok(())
    }

    fn required_message(&self) -> String {
        self.required.map_or_else(|| format!("Path `{}` is required.", self.name), str::to_string)
    }
}

fn enum_message(value: &str, path: &str) -> String {
    format!("`{value}` is not a valid enum value for path `{path}`.")
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<Bson> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Bson::DateTime(from_chrono(dt.with_timezone(&Utc))));
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| Bson::DateTime(from_chrono(d.and_utc())))
}

fn json_display(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug)]
pub struct Schema {
    pub collection: &'static str,
    pub fields: &'static [FieldDef],
}

impl Schema {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Builds a new document from a request body: unknown and derived fields are dropped,
    /// values coerced, defaults applied and every rule checked.
    ///
    /// # Errors
    /// `BadRequest` for a non-object body; `Validation` with every failed rule.
    pub fn prepare_insert(&self, body: &Value) -> Result<Document, ApiError> {
        let obj = body
            .as_object()
            .ok_or_else(|| ApiError::BadRequest("request body must be a JSON object".into()))?;
        let mut out = Document::new();
        let mut errors = Vec::new();
        if let Some(raw) = obj.get(ID_FIELD).filter(|v| !v.is_null()) {
            let id_def = FieldDef::new(ID_FIELD, FieldKind::ObjectId);
            match id_def.coerce_json(raw) {
                Ok(id) => {
                    out.insert(ID_FIELD, id);
                }
                Err(e) => errors.push(e),
            }
        }
        for f in self.fields.iter().filter(|f| !f.derived) {
            match obj.get(f.name).filter(|v| !v.is_null()) {
                Some(raw) => match f.coerce_json(raw) {
                    Ok(v) => {
                        f.validate(&v, &mut errors)?;
                        out.insert(f.name, v);
                    }
                    Err(e) => errors.push(e),
                },
                None => {
                    if let Some(d) = f.default {
                        out.insert(f.name, d.to_bson());
                    } else if f.required.is_some() {
                        errors.push(f.required_message());
                    }
                }
            }
        }
        if !out.contains_key(CREATED_AT) {
            out.insert(CREATED_AT, now());
        }
        if errors.is_empty() { Ok(out) } else { Err(ApiError::Validation(errors)) }
    }

    /// Builds the change set for an update. Only provided fields are considered;
    /// immutable and derived fields are ignored. A `null` on an optional field unsets it.
    ///
    /// # Errors
    /// `BadRequest` for a non-object body; `Validation` with every failed rule.
    pub fn prepare_update(&self, body: &Value) -> Result<Document, ApiError> {
        let obj = body
            .as_object()
            .ok_or_else(|| ApiError::BadRequest("request body must be a JSON object".into()))?;
        let mut out = Document::new();
        let mut errors = Vec::new();
        for f in self.fields.iter().filter(|f| !f.derived && !f.immutable) {
            let Some(raw) = obj.get(f.name) else { continue };
            if raw.is_null() {
                if f.required.is_some() {
                    errors.push(f.required_message());
                } else {
                    out.insert(f.name, Bson::Null);
                }
                continue;
            }
            match f.coerce_json(raw) {
                Ok(v) => {
                    if f.required.is_some() && matches!(&v, Bson::String(s) if s.is_empty()) {
                        errors.push(f.required_message());
                        continue;
                    }
                    f.validate(&v, &mut errors)?;
                    out.insert(f.name, v);
                }
                Err(e) => errors.push(e),
            }
        }
        if errors.is_empty() { Ok(out) } else { Err(ApiError::Validation(errors)) }
    }

    /// Types a query-string filter value by the declared kind of `field`.
    /// Undeclared fields (and nested paths below an object field) stay strings.
    ///
    /// # Errors
    /// `ApiError::Query` when the value cannot be cast or is not an allowed enum value.
    pub fn coerce_filter_value(&self, field: &str, raw: &str) -> Result<Bson, ApiError> {
        if field == ID_FIELD {
            return ObjectId::parse_str(raw.trim())
                .map(Bson::ObjectId)
                .map_err(|_| ApiError::Query(FieldDef::new(ID_FIELD, FieldKind::ObjectId).cast_error(raw)));
        }
        if field == CREATED_AT && self.field(CREATED_AT).is_none() {
            return FieldDef::new(CREATED_AT, FieldKind::Date).coerce_raw(raw).map_err(ApiError::Query);
        }
        match self.field(field) {
            Some(f) => f.coerce_raw(raw).map_err(ApiError::Query),
            None => Ok(Bson::String(raw.to_string())),
        }
    }

    #[must_use]
    pub fn hidden_fields(&self) -> Vec<String> {
        self.fields.iter().filter(|f| f.hidden).map(|f| f.name.to_string()).collect()
    }

    #[must_use]
    pub fn unique_fields(&self) -> Vec<&'static str> {
        self.fields.iter().filter(|f| f.unique).map(|f| f.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static WIDGETS: Schema = Schema {
        collection: "widgets",
        fields: &[
            FieldDef::new("name", FieldKind::String)
                .required("Please add a name")
                .trimmed()
                .max_len(5, "Name too long")
                .unique(),
            FieldDef::new("size", FieldKind::String).one_of(&["s", "m"]),
            FieldDef::new("price", FieldKind::Number).min(1.0, "Too cheap"),
            FieldDef::new("sale", FieldKind::Boolean).with_default(DefaultValue::Bool(false)),
            FieldDef::new("secret", FieldKind::String).hidden(),
            FieldDef::new("slug", FieldKind::String).derived(),
            FieldDef::new("createdAt", FieldKind::Date).with_default(DefaultValue::Now).immutable(),
        ],
    };

    #[test]
    fn insert_trims_coerces_and_applies_defaults() {
        let d = WIDGETS
            .prepare_insert(&json!({"name": "  cog ", "price": "12", "slug": "x", "bogus": 1}))
            .unwrap();
        assert_eq!(d.get_str("name").unwrap(), "cog");
        assert_eq!(d.get_f64("price").unwrap(), 12.0);
        assert!(!d.get_bool("sale").unwrap());
        assert!(d.get("slug").is_none());
        assert!(d.get("bogus").is_none());
        assert!(matches!(d.get("createdAt"), Some(Bson::DateTime(_))));
    }

    #[test]
    fn insert_collects_every_failure() {
        let err = WIDGETS.prepare_insert(&json!({"size": "xl", "price": 0})).unwrap_err();
        let ApiError::Validation(msgs) = err else { panic!("expected validation error") };
        assert_eq!(
            msgs,
            vec![
                "Please add a name".to_string(),
                "`xl` is not a valid enum value for path `size`.".to_string(),
                "Too cheap".to_string(),
            ]
        );
    }

    #[test]
    fn update_skips_absent_and_immutable_fields() {
        let d = WIDGETS
            .prepare_update(&json!({"price": 5, "createdAt": "2020-01-01", "secret": null}))
            .unwrap();
        assert_eq!(d, bson::doc! {"price": 5.0, "secret": Bson::Null});
        assert!(WIDGETS.prepare_update(&json!({"name": null})).is_err());
    }

    #[test]
    fn filter_values_follow_declared_kinds() {
        assert_eq!(WIDGETS.coerce_filter_value("price", "1000").unwrap(), Bson::Double(1000.0));
        assert_eq!(WIDGETS.coerce_filter_value("sale", "true").unwrap(), Bson::Boolean(true));
        assert_eq!(WIDGETS.coerce_filter_value("other", "42").unwrap(), Bson::String("42".into()));
        assert!(matches!(WIDGETS.coerce_filter_value("price", "abc"), Err(ApiError::Query(_))));
        assert!(matches!(WIDGETS.coerce_filter_value("size", "xl"), Err(ApiError::Query(_))));
        assert!(matches!(WIDGETS.coerce_filter_value("_id", "nope"), Err(ApiError::Query(_))));
    }

    #[test]
    fn non_finite_numbers_are_cast_errors() {
        for bad in ["NaN", "inf", "-Infinity"] {
            let err = WIDGETS.prepare_insert(&json!({"name": "cog", "price": bad})).unwrap_err();
            let ApiError::Validation(msgs) = err else { panic!("expected validation error") };
            assert_eq!(msgs, vec![format!("Cast to Number failed for value \"{bad}\" at path \"price\"")]);
            assert!(WIDGETS.prepare_update(&json!({"price": bad})).is_err());
            assert!(matches!(WIDGETS.coerce_filter_value("price", bad), Err(ApiError::Query(_))));
        }
        let mut errors = Vec::new();
        WIDGETS.field("price").unwrap().validate(&Bson::Double(f64::NAN), &mut errors).unwrap();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn filter_values_can_widen_the_write_enum() {
        static ROLES: Schema = Schema {
            collection: "people",
            fields: &[FieldDef::new("role", FieldKind::String)
                .one_of(&["user", "publisher"])
                .filter_one_of(&["user", "publisher", "admin"])],
        };
        assert_eq!(ROLES.coerce_filter_value("role", "admin").unwrap(), Bson::String("admin".into()));
        assert!(ROLES.coerce_filter_value("role", "root").is_err());
        assert!(ROLES.prepare_insert(&json!({"role": "admin"})).is_err());
    }

    #[test]
    fn hidden_and_unique_lists() {
        assert_eq!(WIDGETS.hidden_fields(), vec!["secret".to_string()]);
        assert_eq!(WIDGETS.unique_fields(), vec!["name"]);
    }
}
