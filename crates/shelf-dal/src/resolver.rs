//! Selection of a book lookup from a sparse set of filter criteria.
//!
//! Each criterion is independently present or absent, which gives 16
//! combinations. Presence is encoded as a 4-bit key (author, title,
//! before, after from the most significant bit) and every key maps to
//! exactly one [`BookStore`] lookup.

use time::Date;
use tracing::{debug, info};

use crate::{
    Error,
    book::{Book, BookStore},
    error::Result,
};

pub const AUTHOR_BIT: u8 = 0b1000;
pub const TITLE_BIT: u8 = 0b0100;
pub const BEFORE_BIT: u8 = 0b0010;
pub const AFTER_BIT: u8 = 0b0001;

/// Lookup operation names, indexed by presence key
pub const OPERATIONS: [&str; 16] = [
    "all",
    "by-published-after",
    "by-published-before",
    "by-published-before-and-after",
    "by-title-contains",
    "by-title-contains-and-published-after",
    "by-title-contains-and-published-before",
    "by-title-contains-and-published-before-and-after",
    "by-author",
    "by-author-and-published-after",
    "by-author-and-published-before",
    "by-author-and-published-before-and-after",
    "by-author-and-title-contains",
    "by-author-and-title-contains-and-published-after",
    "by-author-and-title-contains-and-published-before",
    "by-author-and-title-contains-and-published-before-and-after",
];

/// Optional filters for listing books.
///
/// An empty `author` or `title_contains` counts as absent, dates are absent only when `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub author: Option<String>,
    pub title_contains: Option<String>,
    pub published_before: Option<Date>,
    pub published_after: Option<Date>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl Criteria {
    pub fn new(
        author: Option<String>,
        title_contains: Option<String>,
        published_before: Option<Date>,
        published_after: Option<Date>,
    ) -> Self {
        Criteria {
            author,
            title_contains,
            published_before,
            published_after,
        }
    }

    pub fn presence_key(&self) -> u8 {
        let mut key = 0;
        if self.author.as_deref().is_some_and(|s| !s.is_empty()) {
            key |= AUTHOR_BIT;
        }
        if self.title_contains.as_deref().is_some_and(|s| !s.is_empty()) {
            key |= TITLE_BIT;
        }
        if self.published_before.is_some() {
            key |= BEFORE_BIT;
        }
        if self.published_after.is_some() {
            key |= AFTER_BIT;
        }
        key
    }

    pub fn into_lookup(self) -> Lookup {
        use Lookup::*;
        match (
            non_empty(self.author),
            non_empty(self.title_contains),
            self.published_before,
            self.published_after,
        ) {
            (None, None, None, None) => All,
            (None, None, None, Some(after)) => PublishedAfter(after),
            (None, None, Some(before), None) => PublishedBefore(before),
            (None, None, Some(before), Some(after)) => PublishedBeforeAndAfter(before, after),
            (None, Some(title), None, None) => TitleContains(title),
            (None, Some(title), None, Some(after)) => TitleContainsAndPublishedAfter(title, after),
            (None, Some(title), Some(before), None) => {
                TitleContainsAndPublishedBefore(title, before)
            }
            (None, Some(title), Some(before), Some(after)) => {
                TitleContainsAndPublishedBeforeAndAfter(title, before, after)
            }
            (Some(author), None, None, None) => Author(author),
            (Some(author), None, None, Some(after)) => AuthorAndPublishedAfter(author, after),
            (Some(author), None, Some(before), None) => AuthorAndPublishedBefore(author, before),
            (Some(author), None, Some(before), Some(after)) => {
                AuthorAndPublishedBeforeAndAfter(author, before, after)
            }
            (Some(author), Some(title), None, None) => AuthorAndTitleContains(author, title),
            (Some(author), Some(title), None, Some(after)) => {
                AuthorAndTitleContainsAndPublishedAfter(author, title, after)
            }
            (Some(author), Some(title), Some(before), None) => {
                AuthorAndTitleContainsAndPublishedBefore(author, title, before)
            }
            (Some(author), Some(title), Some(before), Some(after)) => {
                AuthorAndTitleContainsAndPublishedBeforeAndAfter(author, title, before, after)
            }
        }
    }
}

/// One leaf of the criteria decision table, carrying the values of present criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    All,
    PublishedAfter(Date),
    PublishedBefore(Date),
    PublishedBeforeAndAfter(Date, Date),
    TitleContains(String),
    TitleContainsAndPublishedAfter(String, Date),
    TitleContainsAndPublishedBefore(String, Date),
    TitleContainsAndPublishedBeforeAndAfter(String, Date, Date),
    Author(String),
    AuthorAndPublishedAfter(String, Date),
    AuthorAndPublishedBefore(String, Date),
    AuthorAndPublishedBeforeAndAfter(String, Date, Date),
    AuthorAndTitleContains(String, String),
    AuthorAndTitleContainsAndPublishedAfter(String, String, Date),
    AuthorAndTitleContainsAndPublishedBefore(String, String, Date),
    AuthorAndTitleContainsAndPublishedBeforeAndAfter(String, String, Date, Date),
}

impl Lookup {
    pub fn key(&self) -> u8 {
        use Lookup::*;
        match self {
            All => 0,
            PublishedAfter(..) => 1,
            PublishedBefore(..) => 2,
            PublishedBeforeAndAfter(..) => 3,
            TitleContains(..) => 4,
            TitleContainsAndPublishedAfter(..) => 5,
            TitleContainsAndPublishedBefore(..) => 6,
            TitleContainsAndPublishedBeforeAndAfter(..) => 7,
            Author(..) => 8,
            AuthorAndPublishedAfter(..) => 9,
            AuthorAndPublishedBefore(..) => 10,
            AuthorAndPublishedBeforeAndAfter(..) => 11,
            AuthorAndTitleContains(..) => 12,
            AuthorAndTitleContainsAndPublishedAfter(..) => 13,
            AuthorAndTitleContainsAndPublishedBefore(..) => 14,
            AuthorAndTitleContainsAndPublishedBeforeAndAfter(..) => 15,
        }
    }

    pub fn operation(&self) -> &'static str {
        OPERATIONS[self.key() as usize]
    }

    pub async fn execute<S: BookStore>(&self, store: &S) -> Result<Vec<Book>> {
        use Lookup::*;
        let operation = self.operation();
        debug!("Executing book lookup {operation}");
        let result = match self {
            All => store.find_all().await,
            PublishedAfter(after) => store.find_by_published_after(*after).await,
            PublishedBefore(before) => store.find_by_published_before(*before).await,
            PublishedBeforeAndAfter(before, after) => {
                store.find_by_published_before_and_after(*before, *after).await
            }
            TitleContains(title) => store.find_by_title_contains(title).await,
            TitleContainsAndPublishedAfter(title, after) => {
                store
                    .find_by_title_contains_and_published_after(title, *after)
                    .await
            }
            TitleContainsAndPublishedBefore(title, before) => {
                store
                    .find_by_title_contains_and_published_before(title, *before)
                    .await
            }
            TitleContainsAndPublishedBeforeAndAfter(title, before, after) => {
                store
                    .find_by_title_contains_and_published_before_and_after(title, *before, *after)
                    .await
            }
            Author(author) => store.find_by_author(author).await,
            AuthorAndPublishedAfter(author, after) => {
                store
                    .find_by_author_and_published_after(author, *after)
                    .await
            }
            AuthorAndPublishedBefore(author, before) => {
                store
                    .find_by_author_and_published_before(author, *before)
                    .await
            }
            AuthorAndPublishedBeforeAndAfter(author, before, after) => {
                store
                    .find_by_author_and_published_before_and_after(author, *before, *after)
                    .await
            }
            AuthorAndTitleContains(author, title) => {
                store
                    .find_by_author_and_title_contains(author, title)
                    .await
            }
            AuthorAndTitleContainsAndPublishedAfter(author, title, after) => {
                store
                    .find_by_author_and_title_contains_and_published_after(author, title, *after)
                    .await
            }
            AuthorAndTitleContainsAndPublishedBefore(author, title, before) => {
                store
                    .find_by_author_and_title_contains_and_published_before(author, title, *before)
                    .await
            }
            AuthorAndTitleContainsAndPublishedBeforeAndAfter(author, title, before, after) => {
                store
                    .find_by_author_and_title_contains_and_published_before_and_after(
                        author, title, *before, *after,
                    )
                    .await
            }
        };

        result.map_err(|e| {
            debug!("Book lookup {operation} failed: {e}");
            Error::LookupFailed {
                operation,
                source: Box::new(e),
            }
        })
    }
}

/// Lists books matching `criteria` with the single store lookup selected for them
pub async fn resolve<S: BookStore>(store: &S, criteria: Criteria) -> Result<Vec<Book>> {
    let books = criteria.into_lookup().execute(store).await?;
    info!("{} total books found", books.len());
    Ok(books)
}
