use dusk_model::Book;
use exn::ResultExt;
use time::{Date, UtcDateTime};

use crate::error::{Error, ErrorKind};
use crate::models::split_aggregate;

/// A row of `book_view`: the book columns plus its folded satellite values.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) subtitle: Option<String>,
    pub(crate) num_of_pages: i64,
    pub(crate) progress: i64,
    pub(crate) rating: i64,
    pub(crate) publisher: Option<String>,
    pub(crate) date_published: Option<i64>,
    pub(crate) description: Option<String>,
    pub(crate) notes: Option<String>,
    pub(crate) cover: Option<String>,
    pub(crate) date_started: Option<i64>,
    pub(crate) date_completed: Option<i64>,
    pub(crate) date_added: i64,
    pub(crate) date_updated: i64,
    pub(crate) author_string: Option<String>,
    pub(crate) tag_string: Option<String>,
    pub(crate) isbn10_string: Option<String>,
    pub(crate) isbn13_string: Option<String>,
    pub(crate) format_string: Option<String>,
    pub(crate) series_string: Option<String>,
}

/// Calendar dates are stored as midnight UTC.
pub(crate) fn date_to_timestamp(date: Option<Date>) -> Option<i64> {
    date.map(|d| d.midnight().as_utc().unix_timestamp())
}

fn timestamp_to_date(timestamp: Option<i64>, field: &'static str) -> Result<Option<Date>, Error> {
    timestamp
        .map(|ts| {
            UtcDateTime::from_unix_timestamp(ts)
                .map(|dt| dt.date())
                .or_raise(|| ErrorKind::InvalidData(field))
        })
        .transpose()
}

impl TryFrom<BookRow> for Book {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            authors: split_aggregate(row.author_string),
            tags: split_aggregate(row.tag_string),
            isbn10: split_aggregate(row.isbn10_string),
            isbn13: split_aggregate(row.isbn13_string),
            formats: split_aggregate(row.format_string),
            series: row.series_string,
            num_of_pages: u32::try_from(row.num_of_pages).or_raise(|| ErrorKind::InvalidData("num of pages"))?,
            progress: u32::try_from(row.progress).or_raise(|| ErrorKind::InvalidData("progress"))?,
            rating: u8::try_from(row.rating).or_raise(|| ErrorKind::InvalidData("rating"))?,
            publisher: row.publisher,
            date_published: timestamp_to_date(row.date_published, "date published")?,
            description: row.description,
            notes: row.notes,
            cover: row.cover,
            date_started: timestamp_to_date(row.date_started, "date started")?,
            date_completed: timestamp_to_date(row.date_completed, "date completed")?,
            date_added: Some(UtcDateTime::from_unix_timestamp(row.date_added).or_raise(|| ErrorKind::InvalidData("date added"))?),
            date_updated: Some(
                UtcDateTime::from_unix_timestamp(row.date_updated).or_raise(|| ErrorKind::InvalidData("date updated"))?,
            ),
        })
    }
}
