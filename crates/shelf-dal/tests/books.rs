use futures::TryStreamExt as _;
use shelf_dal::{
    Error,
    book::{BookRepository, BookRepositoryImpl, BookStore, CreateBook, UpdateBook},
    resolver::{Criteria, resolve},
};
use sqlx::Executor;
use time::macros::date;
use tracing_test::traced_test;

const TEST_DATA: &str = r#"
INSERT INTO book (isbn, title, author, publish_date, summary, note, created_at)
VALUES ('9780553293357', 'Foundation', 'Isaac Asimov', '1951-05-01', NULL, NULL, '2024-01-01T10:00:00Z');
INSERT INTO book (isbn, title, author, publish_date, summary, note, created_at)
VALUES ('9780553293371', 'I, Robot', 'Isaac Asimov', '1950-12-02', NULL, NULL, '2024-01-01T10:00:00Z');
INSERT INTO book (isbn, title, author, publish_date, summary, note, created_at)
VALUES ('9780553803716', 'Foundation and Empire', 'Isaac Asimov', '1952-06-01', NULL, NULL, '2024-01-01T10:00:00Z');
INSERT INTO book (isbn, title, author, publish_date, summary, note, created_at)
VALUES ('0306406152', 'Rendezvous with Rama', 'Arthur C. Clarke', '1973-06-01', 'Alien starship', NULL, '2024-01-01T10:00:00Z');
INSERT INTO book (isbn, title, author, publish_date, summary, note, created_at)
VALUES ('080442957X', '100% Space', 'Arthur C. Clarke', NULL, NULL, 'Undated', '2024-01-01T10:00:00Z');
"#;

async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    shelf_dal::migrate(&conn).await.unwrap();

    conn.execute_many(TEST_DATA)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    conn
}

fn isbns(books: &[shelf_dal::book::Book]) -> Vec<&str> {
    books.iter().map(|b| b.isbn.as_str()).collect()
}

#[tokio::test]
async fn test_book_create() {
    let conn = init_db().await;
    let repo: BookRepository = BookRepositoryImpl::new(conn);

    let new_book = CreateBook {
        isbn: "978-3-98259-791-1".parse().unwrap(),
        title: "The Gods Themselves".to_string(),
        author: "Isaac Asimov".to_string(),
        publish_date: Some(date!(1972 - 05 - 01)),
        summary: Some("Parallel universe".to_string()),
        note: None,
    };

    let book = repo.create(new_book.clone()).await.unwrap();
    assert_eq!(book.isbn, "9783982597911");
    assert_eq!(book.title, "The Gods Themselves");
    assert_eq!(book.publish_date, Some(date!(1972 - 05 - 01)));
    assert!(book.last_modified_at.is_none());
    assert_eq!(repo.count().await.unwrap(), 6);

    let err = repo.create(new_book).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateKey(isbn) if isbn == "9783982597911"));
    assert_eq!(repo.count().await.unwrap(), 6);
}

#[tokio::test]
async fn test_book_update() {
    let conn = init_db().await;
    let repo = BookRepositoryImpl::new(conn);

    let book = repo.get("9780553293357").await.unwrap();
    assert!(book.last_modified_at.is_none());

    let update = UpdateBook {
        title: "Foundation (Foundation #1)".to_string(),
        author: book.author.clone(),
        publish_date: book.publish_date,
        summary: Some("Psychohistory".to_string()),
        note: Some("First of trilogy".to_string()),
    };

    let updated = repo.update(&book.isbn, update.clone()).await.unwrap();
    assert_eq!(updated.title, "Foundation (Foundation #1)");
    assert_eq!(updated.summary.as_deref(), Some("Psychohistory"));
    assert_eq!(updated.created_at, book.created_at);
    assert!(updated.last_modified_at.is_some());

    let err = repo.update("9781620466100", update).await.unwrap_err();
    assert!(matches!(err, Error::RecordNotFound(_)));
}

#[tokio::test]
async fn test_book_delete() {
    let conn = init_db().await;
    let repo = BookRepositoryImpl::new(conn);

    repo.delete("0306406152").await.unwrap();
    assert!(matches!(
        repo.get("0306406152").await.unwrap_err(),
        Error::RecordNotFound(_)
    ));
    assert!(matches!(
        repo.delete("0306406152").await.unwrap_err(),
        Error::RecordNotFound(_)
    ));
    assert_eq!(repo.count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_lookups() {
    let conn = init_db().await;
    let repo = BookRepositoryImpl::new(conn);

    let all = repo.find_all().await.unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all[0].isbn, "9780553293357");
    assert_eq!(all[4].isbn, "080442957X");

    let by_author = repo.find_by_author("Isaac Asimov").await.unwrap();
    assert_eq!(
        isbns(&by_author),
        ["9780553293357", "9780553293371", "9780553803716"]
    );
    // author is matched exactly
    assert!(repo.find_by_author("Asimov").await.unwrap().is_empty());

    let by_title = repo.find_by_title_contains("Foundation").await.unwrap();
    assert_eq!(isbns(&by_title), ["9780553293357", "9780553803716"]);
    // no wildcard meaning for %
    let by_title = repo.find_by_title_contains("100%").await.unwrap();
    assert_eq!(isbns(&by_title), ["080442957X"]);
    assert!(repo.find_by_title_contains("%").await.unwrap().len() == 1);

    // bounds are strict, undated books never match
    let before = repo
        .find_by_published_before(date!(1951 - 05 - 01))
        .await
        .unwrap();
    assert_eq!(isbns(&before), ["9780553293371"]);
    let after = repo
        .find_by_published_after(date!(1951 - 05 - 01))
        .await
        .unwrap();
    assert_eq!(isbns(&after), ["9780553803716", "0306406152"]);

    let range = repo
        .find_by_published_before_and_after(date!(1960 - 01 - 01), date!(1951 - 01 - 01))
        .await
        .unwrap();
    assert_eq!(isbns(&range), ["9780553293357", "9780553803716"]);

    let combined = repo
        .find_by_author_and_title_contains_and_published_before_and_after(
            "Isaac Asimov",
            "Foundation",
            date!(1952 - 01 - 01),
            date!(1950 - 01 - 01),
        )
        .await
        .unwrap();
    assert_eq!(isbns(&combined), ["9780553293357"]);

    let combined = repo
        .find_by_author_and_published_after("Arthur C. Clarke", date!(1900 - 01 - 01))
        .await
        .unwrap();
    assert_eq!(isbns(&combined), ["0306406152"]);
}

#[tokio::test]
#[traced_test]
async fn test_resolve_against_database() {
    let conn = init_db().await;
    let repo: BookRepository = BookRepositoryImpl::new(conn);

    let books = resolve(&repo, Criteria::default()).await.unwrap();
    assert_eq!(books.len(), 5);

    let criteria = Criteria::new(
        None,
        Some("Foundation".to_string()),
        Some(date!(2000 - 01 - 01)),
        Some(date!(1950 - 01 - 01)),
    );
    let books = resolve(&repo, criteria).await.unwrap();
    assert_eq!(isbns(&books), ["9780553293357", "9780553803716"]);

    let criteria = Criteria::new(
        Some("Arthur C. Clarke".to_string()),
        Some(String::new()),
        None,
        None,
    );
    let books = resolve(&repo, criteria).await.unwrap();
    assert_eq!(isbns(&books), ["0306406152", "080442957X"]);
}

#[tokio::test]
#[traced_test]
async fn test_in_memory_pool_keeps_schema() {
    let pool = shelf_dal::new_pool("sqlite::memory:").await.unwrap();
    shelf_dal::migrate(&pool).await.unwrap();

    let counts = futures::future::try_join_all((0..8).map(|_| {
        let pool = pool.clone();
        async move {
            let repo: BookRepository = BookRepositoryImpl::new(pool);
            repo.count().await
        }
    }))
    .await
    .unwrap();
    assert!(counts.iter().all(|c| *c == 0));
}
