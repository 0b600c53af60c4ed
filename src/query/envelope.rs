use crate::document::{Document, to_json};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
}

impl Pagination {
    /// `next` when more matches lie past this page; `previous` for any page after the first.
    #[must_use]
    pub fn compute(page: u64, limit: u64, total: u64) -> Self {
        let end = page.saturating_mul(limit);
        Self {
            previous: (page > 1).then(|| PageRef { page: page - 1, limit }),
            next: (end < total).then(|| PageRef { page: page + 1, limit }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    pub success: bool,
    pub count: usize,
    /// Matches before pagination.
    pub total: u64,
    pub pagination: Pagination,
    pub data: Vec<Document>,
}

impl ResultEnvelope {
    #[must_use]
    pub fn assemble(data: Vec<Document>, page: u64, limit: u64, total: u64) -> Self {
        Self {
            success: true,
            count: data.len(),
            total,
            pagination: Pagination::compute(page, limit, total),
            data,
        }
    }

    /// Response body shape: `{success, count, pagination, data}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "success": self.success,
            "count": self.count,
            "pagination": self.pagination,
            "data": self.data.iter().map(to_json).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn middle_page_links_both_ways() {
        let p = Pagination::compute(2, 10, 30);
        assert_eq!(p.previous, Some(PageRef { page: 1, limit: 10 }));
        assert_eq!(p.next, Some(PageRef { page: 3, limit: 10 }));
    }

    #[test]
    fn last_and_only_pages_omit_links() {
        assert_eq!(Pagination::compute(3, 10, 30).next, None);
        assert_eq!(Pagination::compute(1, 25, 0), Pagination::default());
    }

    #[test]
    fn json_omits_absent_links() {
        let env = ResultEnvelope::assemble(Vec::new(), 1, 25, 0);
        assert_eq!(
            env.to_json(),
            json!({"success": true, "count": 0, "pagination": {}, "data": []})
        );
    }
}
