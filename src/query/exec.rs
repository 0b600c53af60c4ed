use crate::document::Document;
use crate::store::Collection;
use std::time::Instant;

use super::eval::{compare_docs, eval_filter, project_fields};
use super::types::{Filter, FindOptions, MAX_LIMIT, MAX_SORT_FIELDS};

fn millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Filters, sorts and pages a collection snapshot. Population and shaping happen
/// afterwards in the store.
#[must_use]
pub fn find_docs(col: &Collection, filter: &Filter, opts: &FindOptions) -> Vec<Document> {
    let bench_start = Instant::now();
    let mut docs: Vec<Document> =
        col.snapshot().into_iter().filter(|d| eval_filter(d, filter)).collect();

    if !opts.sort.is_empty() {
        if opts.sort.len() > MAX_SORT_FIELDS + 1 {
            log::warn!("too many sort keys: {}", opts.sort.len());
        }
        docs.sort_by(|a, b| compare_docs(a, b, &opts.sort));
    }

    let skip = opts.skip;
    let limit = opts.limit.unwrap_or(MAX_LIMIT).min(MAX_LIMIT);
    let docs: Vec<Document> = docs.into_iter().skip(skip).take(limit).collect();
    crate::devlog!(
        "{{\"bench\":\"query\",\"op\":\"find\",\"collection\":\"{}\",\"duration_ms\":{},\"result_count\":{},\"limit\":{},\"skip\":{}}}",
        col.name(),
        millis(bench_start),
        docs.len(),
        limit,
        skip
    );
    docs
}

#[must_use]
pub fn count_docs(col: &Collection, filter: &Filter) -> usize {
    let start = Instant::now();
    let n = col.snapshot().iter().filter(|d| eval_filter(d, filter)).count();
    crate::devlog!(
        "{{\"bench\":\"query\",\"op\":\"count\",\"collection\":\"{}\",\"duration_ms\":{},\"result_count\":{}}}",
        col.name(),
        millis(start),
        n
    );
    n
}

/// Applies the projection (exactly `fields` plus `_id`) or, without one, strips
/// hidden fields. A hidden field survives only when the projection names it.
#[must_use]
pub fn shape_doc(doc: &Document, projection: Option<&[String]>, hidden: &[String]) -> Document {
    match projection {
        Some(fields) => project_fields(doc, fields),
        None => {
            let mut out = doc.clone();
            for h in hidden {
                out.remove(h);
            }
            out
        }
    }
}
