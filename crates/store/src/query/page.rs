use crate::error::{ErrorKind, Result};
use crate::models::PagedRow;

/// One page of a cursor-paginated listing.
///
/// Row numbers are 1-based positions in the sorted, filtered result, not
/// primary keys. Pass [`next_cursor`](Self::next_cursor) back as `after` to
/// get the following page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the filter across all pages.
    pub total_count: i64,
    pub first_row_no: i64,
    pub last_row_no: i64,
    /// Requested page size.
    pub limit: u32,
    /// The cursor this page was requested with.
    pub after: u32,
    /// Canonical sort token this page was ordered by.
    pub sort: String,
    pub search: Option<String>,
}

impl<T> Page<T> {
    /// Assemble a page from fetched rows. Zero rows is [`ErrorKind::NoRows`].
    pub(crate) fn from_rows<R>(
        rows: Vec<PagedRow<R>>,
        limit: u32,
        after: u32,
        sort: String,
        search: Option<String>,
    ) -> Result<Self>
    where
        T: TryFrom<R, Error = crate::error::Error>,
    {
        let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
            exn::bail!(ErrorKind::NoRows);
        };
        let (total_count, first_row_no, last_row_no) = (first.count, first.rowno, last.rowno);
        if first_row_no > last_row_no {
            exn::bail!(ErrorKind::InvalidData("first row number is larger than last row number"));
        }
        if last_row_no - first_row_no >= i64::from(limit) {
            exn::bail!(ErrorKind::InvalidData("page holds more rows than its limit"));
        }
        let items = rows.into_iter().map(|row| T::try_from(row.row)).collect::<Result<Vec<_>>>()?;
        Ok(Self {
            items,
            total_count,
            first_row_no,
            last_row_no,
            limit,
            after,
            sort,
            search,
        })
    }

    pub fn is_first(&self) -> bool {
        self.first_row_no <= 1
    }

    pub fn is_last(&self) -> bool {
        self.last_row_no >= self.total_count
    }

    /// `after` value for the next page, `None` on the last page.
    pub fn next_cursor(&self) -> Option<i64> {
        (!self.is_last()).then_some(self.last_row_no)
    }

    /// `after` value for the previous page, `None` on the first page.
    pub fn previous_cursor(&self) -> Option<i64> {
        (!self.is_first()).then(|| (self.first_row_no - i64::from(self.limit) - 1).max(0))
    }

    pub fn num_of_pages(&self) -> i64 {
        let limit = i64::from(self.limit.max(1));
        (self.total_count + limit - 1) / limit
    }

    /// Query parameters reproducing this page, for callers building links.
    ///
    /// `after` is replaced by the given cursor when one is passed, e.g.
    /// `page.query_params(page.next_cursor())`.
    pub fn query_params(&self, after: Option<i64>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("after", after.unwrap_or(i64::from(self.after)).to_string()),
            ("limit", self.limit.to_string()),
            ("sort", self.sort.clone()),
        ];
        if let Some(q) = &self.search {
            params.push(("q", q.clone()));
        }
        params
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
