//! Window-function pagination.
//!
//! Every listing is one statement of the shape
//!
//! ```sql
//! WITH paginate AS (
//!     SELECT COUNT() OVER() AS count,
//!            ROW_NUMBER() OVER(ORDER BY t.<column> <dir>, t.id <dir>) AS rowno,
//!            t.*
//!     FROM <source> t
//!     WHERE <scope> AND <predicate>
//! )
//! SELECT * FROM paginate WHERE rowno > ? ORDER BY rowno LIMIT ?
//! ```
//!
//! Only `&'static str` identifiers are spliced into the text (the source
//! relation and a safelisted sort column); every caller value is bound.

mod filter;
mod page;
mod sort;

pub use crate::query::filter::{BookFilter, DEFAULT_LIMIT, MAX_AFTER, SearchFilter};
pub(crate) use crate::query::filter::{Predicate, Scope};
pub use crate::query::page::Page;
pub(crate) use crate::query::sort::Listing;
pub use crate::query::sort::{Direction, Sort};

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::error::{Result, classify};
use crate::models::PagedRow;
use crate::query::filter::fts_phrase;

/// A fully resolved listing request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Paged<'a> {
    pub listing: Listing,
    pub scope: Scope,
    pub predicate: Predicate<'a>,
    pub sort: Sort,
    pub after: u32,
    pub limit: u32,
}

impl<'a> Paged<'a> {
    pub(crate) fn books(filter: &'a BookFilter, scope: Scope) -> Result<Self> {
        filter.validate()?;
        Ok(Self {
            listing: Listing::Books,
            scope,
            predicate: filter.predicate(),
            sort: Sort::parse(Listing::Books, filter.sort.as_deref())?,
            after: filter.after,
            limit: filter.limit,
        })
    }

    pub(crate) fn entities(listing: Listing, filter: &'a SearchFilter) -> Result<Self> {
        filter.validate()?;
        Ok(Self {
            listing,
            scope: Scope::All,
            predicate: filter.predicate(),
            sort: Sort::parse(listing, filter.sort.as_deref())?,
            after: filter.after,
            limit: filter.limit,
        })
    }

    pub(crate) fn build(&self) -> QueryBuilder<'a, Sqlite> {
        let direction = self.sort.direction();
        let mut query = QueryBuilder::new(format!(
            "WITH paginate AS (SELECT COUNT() OVER() AS count, \
             ROW_NUMBER() OVER(ORDER BY t.{column} {direction}, t.id {direction}) AS rowno, t.* \
             FROM {source} t WHERE ",
            column = self.sort.column(),
            source = self.listing.source(),
        ));
        self.push_scope(&mut query);
        query.push(" AND ");
        self.push_predicate(&mut query);
        query.push(") SELECT * FROM paginate WHERE rowno > ");
        query.push_bind(i64::from(self.after));
        query.push(" ORDER BY rowno LIMIT ");
        query.push_bind(i64::from(self.limit));
        query
    }

    fn push_scope(&self, query: &mut QueryBuilder<'a, Sqlite>) {
        match self.scope {
            Scope::All => {
                query.push("1");
            },
            Scope::Author(id) => {
                query.push("t.id IN (SELECT book FROM book_author_link WHERE author = ");
                query.push_bind(id).push(")");
            },
            Scope::Tag(id) => {
                query.push("t.id IN (SELECT book FROM book_tag_link WHERE tag = ");
                query.push_bind(id).push(")");
            },
            Scope::Series(id) => {
                query.push("t.id IN (SELECT book_id FROM series WHERE id = ");
                query.push_bind(id).push(")");
            },
        }
    }

    fn push_predicate(&self, query: &mut QueryBuilder<'a, Sqlite>) {
        match (self.listing, self.predicate) {
            (_, Predicate::All) => {
                query.push("1");
            },
            (Listing::Books, Predicate::Search(q)) => {
                let phrase = fts_phrase(q);
                query.push("(t.id IN (SELECT rowid FROM book_fts WHERE book_fts MATCH ");
                query.push_bind(phrase.clone());
                query.push(") OR t.id IN (SELECT book FROM book_author_link WHERE author IN ");
                query.push("(SELECT rowid FROM author_fts WHERE author_fts MATCH ");
                query.push_bind(phrase.clone());
                query.push(")) OR t.id IN (SELECT book FROM book_tag_link WHERE tag IN ");
                query.push("(SELECT rowid FROM tag_fts WHERE tag_fts MATCH ");
                query.push_bind(phrase);
                query.push(")))");
            },
            (Listing::Authors, Predicate::Search(q)) => {
                query.push("t.id IN (SELECT rowid FROM author_fts WHERE author_fts MATCH ");
                query.push_bind(fts_phrase(q)).push(")");
            },
            (Listing::Tags, Predicate::Search(q)) => {
                query.push("t.id IN (SELECT rowid FROM tag_fts WHERE tag_fts MATCH ");
                query.push_bind(fts_phrase(q)).push(")");
            },
            (Listing::Series, Predicate::Search(q)) => {
                query.push("t.id IN (SELECT rowid FROM series_fts WHERE series_fts MATCH ");
                query.push_bind(fts_phrase(q)).push(")");
            },
            (_, Predicate::Title(q)) => {
                query.push("t.id IN (SELECT rowid FROM book_fts WHERE book_fts MATCH ");
                query.push_bind(fts_phrase(q)).push(")");
            },
            (_, Predicate::Author(q)) => {
                query.push("t.id IN (SELECT book FROM book_author_link WHERE author IN ");
                query.push("(SELECT rowid FROM author_fts WHERE author_fts MATCH ");
                query.push_bind(fts_phrase(q)).push("))");
            },
            (_, Predicate::Tag(q)) => {
                query.push("t.id IN (SELECT book FROM book_tag_link WHERE tag IN ");
                query.push("(SELECT rowid FROM tag_fts WHERE tag_fts MATCH ");
                query.push_bind(fts_phrase(q)).push("))");
            },
            (_, Predicate::Series(q)) => {
                query.push("t.id IN (SELECT book_id FROM series WHERE id IN ");
                query.push("(SELECT rowid FROM series_fts WHERE series_fts MATCH ");
                query.push_bind(fts_phrase(q)).push("))");
            },
        }
    }

    /// Run the listing and return its raw rows, possibly none.
    pub(crate) async fn fetch<R>(&self, conn: &mut SqliteConnection) -> Result<Vec<PagedRow<R>>>
    where
        R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        self.build()
            .build_query_as::<PagedRow<R>>()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| classify(e, self.listing.source(), "select page", None, None))
    }

    /// Run the listing and assemble a [`Page`].
    pub(crate) async fn page<R, T>(&self, conn: &mut SqliteConnection, search: Option<&str>) -> Result<Page<T>>
    where
        R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
        T: TryFrom<R, Error = crate::error::Error>,
    {
        let rows = self.fetch::<R>(conn).await?;
        Page::from_rows(
            rows,
            self.limit,
            self.after,
            self.sort.token(),
            search.map(str::trim).filter(|q| !q.is_empty()).map(str::to_string),
        )
    }
}
