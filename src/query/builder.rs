//! Translates list-route query parameters into one count and one fetch against the store.
//!
//! Reserved keys are `select`, `sort`, `page` and `limit`; every other key is a field
//! filter, either a plain equality (`housing=true`) or a bracket operator
//! (`averageCost[gte]=1000`, `careers[in]=Business,UI/UX`).

use crate::document::{CREATED_AT, ID_FIELD};
use crate::errors::ApiError;
use crate::models::Schema;
use crate::store::DocumentStore;
use bson::Bson;
use std::time::Instant;

use super::cancel::QueryContext;
use super::envelope::ResultEnvelope;
use super::params::{ParamValue, QueryParams, split_key};
use super::types::{
    DEFAULT_LIMIT, Filter, FindOptions, MAX_IN_SET, MAX_LIMIT, MAX_PROJECTION_FIELDS,
    MAX_SORT_FIELDS, OpToken, Order, Populate, SortSpec,
};

const RESERVED: [&str; 4] = ["select", "sort", "page", "limit"];

/// The parsed form of a request, ready to run.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub filter: Filter,
    pub options: FindOptions,
    pub page: u64,
    pub limit: u64,
}

/// Per-request builder. Holds configuration only; nothing carries over between builds.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    collection: &'a str,
    schema: Option<&'a Schema>,
    base: Filter,
    populate: Option<Populate>,
    default_limit: usize,
    max_limit: usize,
}

impl<'a> QueryBuilder<'a> {
    #[must_use]
    pub fn new(collection: &'a str) -> Self {
        Self {
            collection,
            schema: None,
            base: Filter::True,
            populate: None,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }

    /// Builder for a schema's collection; filter values are typed by it.
    #[must_use]
    pub fn for_schema(schema: &'a Schema) -> Self {
        Self::new(schema.collection).schema(schema)
    }

    #[must_use]
    pub fn schema(mut self, schema: &'a Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Condition AND-combined with the parameter filters (nested routes).
    #[must_use]
    pub fn base_filter(mut self, filter: Filter) -> Self {
        self.base = filter;
        self
    }

    #[must_use]
    pub fn populate(mut self, spec: Populate) -> Self {
        self.populate = Some(spec);
        self
    }

    /// `max` is clamped to the hard cap; `default` to `max`.
    #[must_use]
    pub fn limits(mut self, default: usize, max: usize) -> Self {
        self.max_limit = max.clamp(1, MAX_LIMIT);
        self.default_limit = default.clamp(1, self.max_limit);
        self
    }

    /// Parses the parameters without touching the store.
    ///
    /// # Errors
    /// `ApiError::Query` for non-positive or non-integer `page`/`limit`, skip overflow,
    /// malformed filter keys, unsupported operators or values the schema rejects.
    pub fn prepare(&self, params: &QueryParams) -> Result<PreparedQuery, ApiError> {
        let page = self.positive(params, "page")?.unwrap_or(1);
        let requested = self.positive(params, "limit")?.unwrap_or(self.default_limit as u64);
        let limit = requested.min(self.max_limit as u64);
        let skip = (page - 1)
            .checked_mul(limit)
            .and_then(|s| usize::try_from(s).ok())
            .ok_or_else(|| ApiError::Query(format!("page {page} is out of range")))?;

        let mut filter = self.base.clone();
        for (key, value) in params.iter().filter(|(k, _)| !RESERVED.contains(k)) {
            filter = filter.and(self.condition(key, value)?);
        }

        let projection = params
            .get("select")
            .map(|v| split_list(&v.values()))
            .filter(|fields| !fields.is_empty());
        if let Some(fields) = &projection
            && fields.len() > MAX_PROJECTION_FIELDS
        {
            return Err(ApiError::Query(format!(
                "at most {MAX_PROJECTION_FIELDS} select fields are allowed"
            )));
        }
        let hidden = self.schema.map(Schema::hidden_fields).unwrap_or_default();
        let sort = parse_sort(params.get("sort").map(|v| split_list(&v.values())))?;

        Ok(PreparedQuery {
            filter,
            options: FindOptions {
                projection,
                hidden,
                sort,
                skip,
                limit: usize::try_from(limit).ok(),
                populate: self.populate.clone(),
            },
            page,
            limit,
        })
    }

    /// Runs the count and the fetch concurrently and assembles the envelope.
    ///
    /// # Errors
    /// `Query` for malformed parameters, `Store` when either call fails, `Cancelled` when
    /// the context's signal fires or its deadline passes. No partial result is returned.
    pub async fn build<S: DocumentStore>(
        &self,
        store: &S,
        params: &QueryParams,
        ctx: &QueryContext,
    ) -> Result<ResultEnvelope, ApiError> {
        let q = self.prepare(params)?;
        if ctx.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(ApiError::Cancelled(format!("{} query cancelled", self.collection)));
        }
        let started = Instant::now();
        let work = async {
            tokio::try_join!(
                store.count(self.collection, &q.filter),
                store.find(self.collection, &q.filter, &q.options)
            )
        };
        let deadline = async {
            match ctx.timeout {
                Some(t) => tokio::time::timeout(t, work).await.unwrap_or_else(|_| {
                    Err(ApiError::Cancelled(format!("{} query exceeded {t:?}", self.collection)))
                }),
                None => work.await,
            }
        };
        let (total, data) = match &ctx.cancel {
            Some(signal) => tokio::select! {
                biased;
                () = signal.cancelled() => {
                    return Err(ApiError::Cancelled(format!("{} query cancelled", self.collection)));
                }
                r = deadline => r?,
            },
            None => deadline.await?,
        };
        log::debug!(
            "advanced results on {}: total={} returned={} page={} limit={} in {:?}",
            self.collection,
            total,
            data.len(),
            q.page,
            q.limit,
            started.elapsed()
        );
        Ok(ResultEnvelope::assemble(data, q.page, q.limit, total))
    }

    fn positive(&self, params: &QueryParams, key: &str) -> Result<Option<u64>, ApiError> {
        let Some(v) = params.get(key) else { return Ok(None) };
        let raw = v
            .single()
            .ok_or_else(|| ApiError::Query(format!("{key} must be given once")))?
            .trim();
        match raw.parse::<u64>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ApiError::Query(format!("{key} must be a positive integer, got \"{raw}\""))),
        }
    }

    fn condition(&self, key: &str, value: &ParamValue) -> Result<Filter, ApiError> {
        let (field, op) =
            split_key(key).ok_or_else(|| ApiError::Query(format!("malformed filter key \"{key}\"")))?;
        let raws = value.values();
        let Some(op) = op else {
            let mut values = self.coerce_all(field, raws.iter().copied())?;
            return if values.len() == 1 {
                Ok(Filter::eq(field, values.remove(0)))
            } else {
                in_set(field, values)
            };
        };
        let op: OpToken = op.parse().map_err(|e: String| ApiError::Query(format!("{field}: {e}")))?;
        match op.cmp_op() {
            None => {
                let parts = raws.iter().flat_map(|r| r.split(',')).map(str::trim).filter(|s| !s.is_empty());
                in_set(field, self.coerce_all(field, parts)?)
            }
            Some(cmp) => {
                let [raw] = raws.as_slice() else {
                    return Err(ApiError::Query(format!("{key} must be given once")));
                };
                Ok(Filter::Cmp { path: field.to_string(), op: cmp, value: self.coerce(field, raw)? })
            }
        }
    }

    fn coerce_all<'r>(
        &self,
        field: &str,
        raws: impl Iterator<Item = &'r str>,
    ) -> Result<Vec<Bson>, ApiError> {
        raws.map(|r| self.coerce(field, r)).collect()
    }

    fn coerce(&self, field: &str, raw: &str) -> Result<Bson, ApiError> {
        match self.schema {
            Some(s) => s.coerce_filter_value(field, raw),
            None => Ok(Bson::String(raw.to_string())),
        }
    }
}

fn in_set(field: &str, values: Vec<Bson>) -> Result<Filter, ApiError> {
    if values.len() > MAX_IN_SET {
        return Err(ApiError::Query(format!("{field}: at most {MAX_IN_SET} values are allowed")));
    }
    Ok(Filter::In { path: field.to_string(), values })
}

fn split_list(values: &[&str]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `a,-b` into specs; default newest first. Always ends with an `_id` tie-break in the
/// direction of the last key so that page boundaries are stable.
fn parse_sort(keys: Option<Vec<String>>) -> Result<Vec<SortSpec>, ApiError> {
    let keys = keys.filter(|k| !k.is_empty());
    let mut sort: Vec<SortSpec> = match keys {
        None => vec![SortSpec::desc(CREATED_AT)],
        Some(keys) => {
            if keys.len() > MAX_SORT_FIELDS {
                return Err(ApiError::Query(format!(
                    "at most {MAX_SORT_FIELDS} sort fields are allowed"
                )));
            }
            keys.into_iter()
                .map(|k| match k.strip_prefix('-') {
                    Some("") => Err(ApiError::Query("empty sort field".into())),
                    Some(f) => Ok(SortSpec::desc(f)),
                    None => Ok(SortSpec::asc(k)),
                })
                .collect::<Result<_, _>>()?
        }
    };
    if !sort.iter().any(|s| s.field == ID_FIELD) {
        let order = sort.last().map_or(Order::Desc, |s| s.order);
        sort.push(SortSpec { field: ID_FIELD.into(), order });
    }
    Ok(sort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CmpOp;

    #[test]
    fn defaults_to_first_page_newest_first() {
        let q = QueryBuilder::new("bootcamps").prepare(&QueryParams::new()).unwrap();
        assert_eq!((q.page, q.limit, q.options.skip), (1, 25, 0));
        assert_eq!(q.options.sort, vec![SortSpec::desc("createdAt"), SortSpec::desc("_id")]);
        assert_eq!(q.filter, Filter::True);
        assert!(q.options.projection.is_none());
    }

    #[test]
    fn sort_gets_id_tiebreak_in_last_direction() {
        let q = QueryBuilder::new("c").prepare(&QueryParams::parse("sort=name,-averageCost")).unwrap();
        assert_eq!(
            q.options.sort,
            vec![SortSpec::asc("name"), SortSpec::desc("averageCost"), SortSpec::desc("_id")]
        );
        let q = QueryBuilder::new("c").prepare(&QueryParams::parse("sort=_id")).unwrap();
        assert_eq!(q.options.sort, vec![SortSpec::asc("_id")]);
    }

    #[test]
    fn page_and_limit_must_be_positive_integers() {
        let b = QueryBuilder::new("c");
        for bad in ["page=0", "page=-1", "page=abc", "limit=0", "limit=2.5", "page=1&page=2"] {
            assert!(matches!(b.prepare(&QueryParams::parse(bad)), Err(ApiError::Query(_))), "{bad}");
        }
        let q = b.prepare(&QueryParams::parse("page=3&limit=10")).unwrap();
        assert_eq!(q.options.skip, 20);
    }

    #[test]
    fn limit_is_capped() {
        let q = QueryBuilder::new("c")
            .limits(10, 50)
            .prepare(&QueryParams::parse("limit=100000"))
            .unwrap();
        assert_eq!(q.limit, 50);
        assert_eq!(q.options.limit, Some(50));
    }

    #[test]
    fn page_overflow_is_a_query_error() {
        let raw = format!("page={}&limit=10000", u64::MAX);
        assert!(matches!(QueryBuilder::new("c").prepare(&QueryParams::parse(&raw)), Err(ApiError::Query(_))));
    }

    #[test]
    fn filters_translate_to_explicit_operators() {
        let q = QueryBuilder::new("c")
            .prepare(&QueryParams::parse("averageCost[lte]=10000&careers[in]=Business,UI%2FUX&housing=true"))
            .unwrap();
        let Filter::And(parts) = q.filter else { panic!("expected conjunction") };
        assert_eq!(parts.len(), 3);
        assert!(parts.contains(&Filter::Cmp {
            path: "averageCost".into(),
            op: CmpOp::Lte,
            value: Bson::String("10000".into())
        }));
        assert!(parts.contains(&Filter::In {
            path: "careers".into(),
            values: vec!["Business".into(), "UI/UX".into()]
        }));
        assert!(parts.contains(&Filter::eq("housing", "true")));
    }

    #[test]
    fn unsupported_or_malformed_operators_fail() {
        let b = QueryBuilder::new("c");
        for bad in ["a[ne]=1", "a[$gt]=1", "a[gt=1", "a[gt]=1&a[gt]=2"] {
            assert!(matches!(b.prepare(&QueryParams::parse(bad)), Err(ApiError::Query(_))), "{bad}");
        }
    }

    #[test]
    fn oversized_select_and_in_lists_are_rejected() {
        let b = QueryBuilder::new("c");
        let fields: Vec<String> = (0..=MAX_PROJECTION_FIELDS).map(|i| format!("f{i}")).collect();
        let raw = format!("select={}", fields.join(","));
        assert!(matches!(b.prepare(&QueryParams::parse(&raw)), Err(ApiError::Query(_))));
        let raw = format!("select={}", fields[..MAX_PROJECTION_FIELDS].join(","));
        let kept = b.prepare(&QueryParams::parse(&raw)).unwrap().options.projection;
        assert_eq!(kept.map(|p| p.len()), Some(MAX_PROJECTION_FIELDS));

        let values: Vec<String> = (0..=MAX_IN_SET).map(|i| format!("v{i}")).collect();
        let raw = format!("tag[in]={}", values.join(","));
        assert!(matches!(b.prepare(&QueryParams::parse(&raw)), Err(ApiError::Query(_))));
        let raw: Vec<String> = values.iter().map(|v| format!("tag={v}")).collect();
        assert!(matches!(b.prepare(&QueryParams::parse(&raw.join("&"))), Err(ApiError::Query(_))));
    }

    #[test]
    fn repeated_plain_key_matches_any() {
        let q = QueryBuilder::new("c").prepare(&QueryParams::parse("state=MA&state=NY")).unwrap();
        assert_eq!(q.filter, Filter::In { path: "state".into(), values: vec!["MA".into(), "NY".into()] });
    }

    #[test]
    fn base_filter_is_combined() {
        let q = QueryBuilder::new("c")
            .base_filter(Filter::eq("bootcamp", "x"))
            .prepare(&QueryParams::parse("weeks=4"))
            .unwrap();
        assert_eq!(q.filter, Filter::And(vec![Filter::eq("bootcamp", "x"), Filter::eq("weeks", "4")]));
    }

    #[test]
    fn select_is_split_and_trimmed() {
        let q = QueryBuilder::new("c").prepare(&QueryParams::parse("select=name,%20description,")).unwrap();
        assert_eq!(q.options.projection, Some(vec!["name".to_string(), "description".to_string()]));
    }
}
