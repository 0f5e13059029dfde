use serde::{Deserialize, Serialize};

/// Paging parameters for a list query.
///
/// `max_row_id` and `offset` together form the continuation token. When
/// `count > 0` and no bound is set, the repository pins the scan to the
/// current maximum of the entity's sequence column so that rows inserted
/// while paging do not shift later pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListOptions {
    /// Order expression, e.g. `"created_at desc, id"`.
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub max_row_id: Option<i64>,
    #[serde(default)]
    pub offset: u64,
    /// Page size; `0` disables paging.
    #[serde(default)]
    pub count: u64,
}

impl ListOptions {
    /// First page of `count` rows.
    pub fn page(count: u64) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn max_row_id(mut self, max_row_id: i64) -> Self {
        self.max_row_id = Some(max_row_id);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

/// One page of a list query.
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    /// Rows returned in this page.
    pub count: u64,
    /// The bound the page was read under.
    pub max_row_id: Option<i64>,
    /// Offset of the next page.
    pub offset: u64,
}

impl<T> ListResult<T> {
    pub fn new(items: Vec<T>, max_row_id: Option<i64>, previous_offset: u64) -> Self {
        let count = items.len() as u64;
        Self {
            items,
            count,
            max_row_id,
            offset: previous_offset + count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Options for the page following this one, keeping order, size and bound.
    pub fn next_options(&self, previous: &ListOptions) -> ListOptions {
        ListOptions {
            order: previous.order.clone(),
            max_row_id: self.max_row_id,
            offset: self.offset,
            count: previous.count,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for ListResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ListResult<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
