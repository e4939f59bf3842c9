//! List query state: page, limit, search and a domain filter

use mailreach_client::ListParams;

/// Query behind a paginated table.
///
/// Changing the search term, the filter or the page size moves back to the
/// first page. Setters return whether anything changed so the store knows
/// when to refetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<F> {
    params: ListParams<F>,
}

impl<F: Default> ListQuery<F> {
    pub fn new(limit: u32) -> Self {
        Self {
            params: ListParams::new(limit.max(1)),
        }
    }
}

impl<F: Clone + PartialEq> ListQuery<F> {
    pub fn params(&self) -> &ListParams<F> {
        &self.params
    }

    pub fn page(&self) -> u32 {
        self.params.page
    }

    pub fn limit(&self) -> u32 {
        self.params.limit
    }

    pub fn search(&self) -> Option<&str> {
        self.params.search.as_deref()
    }

    pub fn filter(&self) -> &F {
        &self.params.filter
    }

    /// Set the search term. Blank input clears it.
    pub fn set_search(&mut self, search: &str) -> bool {
        let search = search.trim();
        let search = (!search.is_empty()).then(|| search.to_string());
        if search == self.params.search {
            return false;
        }
        self.params.search = search;
        self.params.page = 1;
        true
    }

    pub fn set_filter(&mut self, filter: F) -> bool {
        if filter == self.params.filter {
            return false;
        }
        self.params.filter = filter;
        self.params.page = 1;
        true
    }

    /// Edit the current filter in place
    pub fn update_filter(&mut self, f: impl FnOnce(&mut F)) -> bool {
        let mut filter = self.params.filter.clone();
        f(&mut filter);
        self.set_filter(filter)
    }

    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        if page == self.params.page {
            return false;
        }
        self.params.page = page;
        true
    }

    pub fn set_limit(&mut self, limit: u32) -> bool {
        let limit = limit.max(1);
        if limit == self.params.limit {
            return false;
        }
        self.params.limit = limit;
        self.params.page = 1;
        true
    }

    /// Back to the first page with no search
    pub fn reset(&mut self) -> bool
    where
        F: Default,
    {
        let fresh = ListParams {
            page: 1,
            limit: self.params.limit,
            search: None,
            filter: F::default(),
        };
        if fresh == self.params {
            return false;
        }
        self.params = fresh;
        true
    }
}
