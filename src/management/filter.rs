use crate::request::Request;

/// Query parameters of the list and read endpoints.
///
/// Offset pagination uses `page` and `per_page`, checkpoint pagination uses `from` and `take`.
/// Unset values are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    page: Option<u32>,
    per_page: Option<u32>,
    include_totals: Option<bool>,
    from: Option<String>,
    take: Option<u32>,
    q: Option<String>,
    sort: Option<String>,
    fields: Option<(String, bool)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-based page of `per_page` items.
    pub fn with_page(self, page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            ..self
        }
    }

    /// Wraps the items in an envelope with the counters of the page.
    pub fn with_totals(self, include_totals: bool) -> Self {
        Self {
            include_totals: Some(include_totals),
            ..self
        }
    }

    pub fn with_checkpoint(self, from: Option<&str>, take: u32) -> Self {
        Self {
            from: from.map(str::to_string),
            take: Some(take),
            ..self
        }
    }

    /// Lucene query of the search endpoints.
    pub fn with_query(self, q: &str) -> Self {
        Self {
            q: Some(q.to_string()),
            ..self
        }
    }

    /// `field:1` sorts ascending, `field:-1` descending.
    pub fn with_sort(self, sort: &str) -> Self {
        Self {
            sort: Some(sort.to_string()),
            ..self
        }
    }

    /// Comma separated list of fields to include, or to exclude when `include` is false.
    pub fn with_fields(self, fields: &str, include: bool) -> Self {
        Self {
            fields: Some((fields.to_string(), include)),
            ..self
        }
    }

    pub(crate) fn apply<T>(&self, mut request: Request<T>) -> Request<T> {
        if let Some(page) = self.page {
            request = request.with_query("page", &page.to_string());
        }
        if let Some(per_page) = self.per_page {
            request = request.with_query("per_page", &per_page.to_string());
        }
        if let Some(include_totals) = self.include_totals {
            request = request.with_query("include_totals", &include_totals.to_string());
        }
        if let Some(from) = &self.from {
            request = request.with_query("from", from);
        }
        if let Some(take) = self.take {
            request = request.with_query("take", &take.to_string());
        }
        if let Some(q) = &self.q {
            request = request.with_query("q", q);
        }
        if let Some(sort) = &self.sort {
            request = request.with_query("sort", sort);
        }
        if let Some((fields, include)) = &self.fields {
            request = request
                .with_query("fields", fields)
                .with_query("include_fields", &include.to_string());
        }
        request
    }
}
