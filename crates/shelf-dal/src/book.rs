use crate::{ChosenDB, Error, error::Result};
use garde::Validate;
use serde::{Deserialize, Serialize};
use shelf_types::Isbn;
use sqlx::{Pool, QueryBuilder};
use time::{Date, OffsetDateTime};
use tracing::debug;

const SELECT_BOOK: &str = "SELECT isbn, title, author, publish_date, summary, note, created_at, last_modified_at FROM book";

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateBook {
    #[garde(dive)]
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub isbn: Isbn,
    #[garde(length(min = 1, max = 511))]
    pub title: String,
    /// Comma-separated authors of the book
    #[garde(length(min = 1, max = 511))]
    pub author: String,
    #[garde(skip)]
    pub publish_date: Option<Date>,
    #[garde(length(max = 5000))]
    pub summary: Option<String>,
    #[garde(length(max = 5000))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateBook {
    #[garde(length(min = 1, max = 511))]
    pub title: String,
    #[garde(length(min = 1, max = 511))]
    pub author: String,
    #[garde(skip)]
    pub publish_date: Option<Date>,
    #[garde(length(max = 5000))]
    pub summary: Option<String>,
    #[garde(length(max = 5000))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publish_date: Option<Date>,
    pub summary: Option<String>,
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_modified_at: Option<OffsetDateTime>,
}

/// Lookups over stored books, one per combination of filter criteria.
///
/// All lookups return books in insertion order. Author matches exactly,
/// title matches when it contains the given substring, date bounds are strict.
#[allow(async_fn_in_trait)]
pub trait BookStore {
    async fn find_all(&self) -> Result<Vec<Book>>;

    async fn find_by_author(&self, author: &str) -> Result<Vec<Book>>;
    async fn find_by_title_contains(&self, title: &str) -> Result<Vec<Book>>;
    async fn find_by_published_before(&self, before: Date) -> Result<Vec<Book>>;
    async fn find_by_published_after(&self, after: Date) -> Result<Vec<Book>>;

    async fn find_by_author_and_title_contains(
        &self,
        author: &str,
        title: &str,
    ) -> Result<Vec<Book>>;
    async fn find_by_author_and_published_before(
        &self,
        author: &str,
        before: Date,
    ) -> Result<Vec<Book>>;
    async fn find_by_author_and_published_after(
        &self,
        author: &str,
        after: Date,
    ) -> Result<Vec<Book>>;
    async fn find_by_title_contains_and_published_before(
        &self,
        title: &str,
        before: Date,
    ) -> Result<Vec<Book>>;
    async fn find_by_title_contains_and_published_after(
        &self,
        title: &str,
        after: Date,
    ) -> Result<Vec<Book>>;
    async fn find_by_published_before_and_after(
        &self,
        before: Date,
        after: Date,
    ) -> Result<Vec<Book>>;

    async fn find_by_author_and_title_contains_and_published_before(
        &self,
        author: &str,
        title: &str,
        before: Date,
    ) -> Result<Vec<Book>>;
    async fn find_by_author_and_title_contains_and_published_after(
        &self,
        author: &str,
        title: &str,
        after: Date,
    ) -> Result<Vec<Book>>;
    async fn find_by_author_and_published_before_and_after(
        &self,
        author: &str,
        before: Date,
        after: Date,
    ) -> Result<Vec<Book>>;
    async fn find_by_title_contains_and_published_before_and_after(
        &self,
        title: &str,
        before: Date,
        after: Date,
    ) -> Result<Vec<Book>>;

    async fn find_by_author_and_title_contains_and_published_before_and_after(
        &self,
        author: &str,
        title: &str,
        before: Date,
        after: Date,
    ) -> Result<Vec<Book>>;
}

#[derive(Default)]
struct Conditions<'a> {
    author: Option<&'a str>,
    title: Option<&'a str>,
    before: Option<Date>,
    after: Option<Date>,
}

pub type BookRepository = BookRepositoryImpl<Pool<ChosenDB>>;

pub struct BookRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> BookRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateBook) -> Result<Book> {
        let result = sqlx::query(
            "INSERT INTO book (isbn, title, author, publish_date, summary, note, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(payload.isbn.as_ref())
        .bind(&payload.title)
        .bind(&payload.author)
        .bind(payload.publish_date)
        .bind(&payload.summary)
        .bind(&payload.note)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.executor)
        .await;

        match result {
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!("Book with ISBN {} already exists", payload.isbn);
                Err(Error::DuplicateKey(payload.isbn.to_string()))
            }
            Err(e) => Err(e.into()),
            Ok(_) => self.get(payload.isbn.as_ref()).await,
        }
    }

    pub async fn get(&self, isbn: &str) -> Result<Book> {
        let sql = format!("{SELECT_BOOK} WHERE isbn = ?");
        sqlx::query_as::<_, Book>(&sql)
            .bind(isbn)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("Book {isbn}")))
    }

    pub async fn update(&self, isbn: &str, payload: UpdateBook) -> Result<Book> {
        let result = sqlx::query(
            "UPDATE book SET title = ?, author = ?, publish_date = ?, summary = ?, note = ?, last_modified_at = ? WHERE isbn = ?",
        )
        .bind(&payload.title)
        .bind(&payload.author)
        .bind(payload.publish_date)
        .bind(&payload.summary)
        .bind(&payload.note)
        .bind(OffsetDateTime::now_utc())
        .bind(isbn)
        .execute(&self.executor)
        .await?;

        if result.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("Book {isbn}")))
        } else {
            self.get(isbn).await
        }
    }

    pub async fn delete(&self, isbn: &str) -> Result<()> {
        let res = sqlx::query("DELETE FROM book WHERE isbn = ?")
            .bind(isbn)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("Book {isbn}")))
        } else {
            Ok(())
        }
    }

    pub async fn count(&self) -> Result<u64> {
        let count: u64 = sqlx::query_scalar("SELECT count(*) FROM book")
            .fetch_one(&self.executor)
            .await?;
        Ok(count)
    }

    async fn find(&self, conditions: Conditions<'_>) -> Result<Vec<Book>> {
        let mut query = QueryBuilder::<ChosenDB>::new(SELECT_BOOK);
        let mut separator = " WHERE ";
        if let Some(author) = conditions.author {
            query.push(separator).push("author = ").push_bind(author);
            separator = " AND ";
        }
        if let Some(title) = conditions.title {
            // instr gives plain containment, without LIKE wildcards
            query
                .push(separator)
                .push("instr(title, ")
                .push_bind(title)
                .push(") > 0");
            separator = " AND ";
        }
        if let Some(before) = conditions.before {
            query.push(separator).push("publish_date < ").push_bind(before);
            separator = " AND ";
        }
        if let Some(after) = conditions.after {
            query.push(separator).push("publish_date > ").push_bind(after);
        }
        query.push(" ORDER BY rowid");

        let records = query
            .build_query_as::<Book>()
            .fetch_all(&self.executor)
            .await?;
        Ok(records)
    }
}

impl BookStore for BookRepository {
    async fn find_all(&self) -> Result<Vec<Book>> {
        self.find(Conditions::default()).await
    }

    async fn find_by_author(&self, author: &str) -> Result<Vec<Book>> {
        self.find(Conditions {
            author: Some(author),
            ..Default::default()
        })
        .await
    }

    async fn find_by_title_contains(&self, title: &str) -> Result<Vec<Book>> {
        self.find(Conditions {
            title: Some(title),
            ..Default::default()
        })
        .await
    }

    async fn find_by_published_before(&self, before: Date) -> Result<Vec<Book>> {
        self.find(Conditions {
            before: Some(before),
            ..Default::default()
        })
        .await
    }

    async fn find_by_published_after(&self, after: Date) -> Result<Vec<Book>> {
        self.find(Conditions {
            after: Some(after),
            ..Default::default()
        })
        .await
    }

    async fn find_by_author_and_title_contains(
        &self,
        author: &str,
        title: &str,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            author: Some(author),
            title: Some(title),
            ..Default::default()
        })
        .await
    }

    async fn find_by_author_and_published_before(
        &self,
        author: &str,
        before: Date,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            author: Some(author),
            before: Some(before),
            ..Default::default()
        })
        .await
    }

    async fn find_by_author_and_published_after(
        &self,
        author: &str,
        after: Date,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            author: Some(author),
            after: Some(after),
            ..Default::default()
        })
        .await
    }

    async fn find_by_title_contains_and_published_before(
        &self,
        title: &str,
        before: Date,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            title: Some(title),
            before: Some(before),
            ..Default::default()
        })
        .await
    }

    async fn find_by_title_contains_and_published_after(
        &self,
        title: &str,
        after: Date,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            title: Some(title),
            after: Some(after),
            ..Default::default()
        })
        .await
    }

    async fn find_by_published_before_and_after(
        &self,
        before: Date,
        after: Date,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            before: Some(before),
            after: Some(after),
            ..Default::default()
        })
        .await
    }

    async fn find_by_author_and_title_contains_and_published_before(
        &self,
        author: &str,
        title: &str,
        before: Date,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            author: Some(author),
            title: Some(title),
            before: Some(before),
            ..Default::default()
        })
        .await
    }

    async fn find_by_author_and_title_contains_and_published_after(
        &self,
        author: &str,
        title: &str,
        after: Date,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            author: Some(author),
            title: Some(title),
            after: Some(after),
            ..Default::default()
        })
        .await
    }

    async fn find_by_author_and_published_before_and_after(
        &self,
        author: &str,
        before: Date,
        after: Date,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            author: Some(author),
            before: Some(before),
            after: Some(after),
            ..Default::default()
        })
        .await
    }

    async fn find_by_title_contains_and_published_before_and_after(
        &self,
        title: &str,
        before: Date,
        after: Date,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            title: Some(title),
            before: Some(before),
            after: Some(after),
            ..Default::default()
        })
        .await
    }

    async fn find_by_author_and_title_contains_and_published_before_and_after(
        &self,
        author: &str,
        title: &str,
        before: Date,
        after: Date,
    ) -> Result<Vec<Book>> {
        self.find(Conditions {
            author: Some(author),
            title: Some(title),
            before: Some(before),
            after: Some(after),
        })
        .await
    }
}
