//! Paginated collection slice shared by every domain

use crate::async_op::AsyncOp;
use crate::cache::EntityCache;
use crate::query::ListQuery;
use mailreach_client::Page;
use mailreach_common::types::{Entity, Pagination};
use mailreach_common::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// One server-paginated table: cached rows, the query that produced them and
/// the flags of the operations that touch them.
#[derive(Debug, Clone)]
pub struct ListSlice<T, F> {
    pub items: EntityCache<T>,
    pub query: ListQuery<F>,
    pub pagination: Pagination,
    pub fetch: AsyncOp,
    pub create: AsyncOp,
    pub update: AsyncOp,
    pub delete: AsyncOp,
    /// Parent entity the rows belong to, e.g. the selected recipient list
    scope: Option<i64>,
}

impl<T: Entity, F: Default + Clone + PartialEq> ListSlice<T, F> {
    pub fn new(page_size: u32) -> Self {
        let query = ListQuery::new(page_size);
        let pagination = Pagination::new(1, query.limit(), 0);
        Self {
            items: EntityCache::new(),
            query,
            pagination,
            fetch: AsyncOp::latest_only(),
            create: AsyncOp::concurrent(),
            update: AsyncOp::concurrent(),
            delete: AsyncOp::concurrent(),
            scope: None,
        }
    }

    pub fn scope(&self) -> Option<i64> {
        self.scope
    }

    /// Point the slice at another parent. Rows of the old parent are dropped
    /// and the query returns to page 1.
    pub fn set_scope(&mut self, scope: Option<i64>) -> bool {
        if scope == self.scope {
            return false;
        }
        self.scope = scope;
        self.fetch.invalidate();
        self.items.clear();
        self.query.set_page(1);
        self.pagination = Pagination::new(1, self.query.limit(), 0);
        true
    }

    pub fn is_loading(&self) -> bool {
        self.fetch.is_loading()
    }

    /// Whether any mutation is in flight
    pub fn is_saving(&self) -> bool {
        self.create.is_loading() || self.update.is_loading() || self.delete.is_loading()
    }

    /// Most recent error among fetch and mutations
    pub fn error(&self) -> Option<&str> {
        [&self.fetch, &self.create, &self.update, &self.delete]
            .into_iter()
            .find_map(AsyncOp::error)
    }

    pub fn apply_page(&mut self, page: Page<T>) {
        self.items.replace_all(page.items);
        self.pagination = page.pagination;
    }

    pub fn apply_created(&mut self, item: T) {
        if self.items.prepend(item) {
            self.pagination.total += 1;
        }
    }

    pub fn apply_removed(&mut self, id: i64) {
        if self.items.remove(id).is_some() {
            self.pagination.total = self.pagination.total.saturating_sub(1);
        }
    }
}

impl<T, F> ListSlice<T, F>
where
    T: Entity + Serialize + DeserializeOwned,
    F: Default + Clone + PartialEq,
{
    /// Merge an update response into the cached row. On error the row is
    /// left untouched.
    pub fn apply_merged(&mut self, id: i64, fields: &Map<String, Value>) -> Result<()> {
        self.items.merge(id, fields).map(|_| ())
    }
}
