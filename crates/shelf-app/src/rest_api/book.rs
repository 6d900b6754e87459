use crate::{
    error::{ApiError, ApiResult},
    repository_from_request,
    request_id::RequestId,
    state::AppState,
    validate::Garde,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use garde::Validate;
use http::{header, StatusCode};
#[cfg(feature = "openapi")]
use shelf_dal::book::Book;
use shelf_dal::book::{BookRepository, CreateBook, UpdateBook};
use shelf_dal::resolver::{resolve, Criteria};
use shelf_types::Isbn;
use time::{macros::format_description, Date};
use tracing::{debug, info};

repository_from_request!(BookRepository);

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(create, list, count, get_book, update, delete))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

/// Filters for book listing, all optional
#[derive(Debug, Clone, Validate, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct BookListQuery {
    /// Author of the book, exact match
    #[garde(length(max = 511))]
    author: Option<String>,
    /// Substring of the title
    #[garde(length(max = 511))]
    title_like: Option<String>,
    /// Published before this date (YYYY-MM-DD)
    #[garde(length(max = 32))]
    publish_date_before: Option<String>,
    /// Published after this date (YYYY-MM-DD)
    #[garde(length(max = 32))]
    publish_date_after: Option<String>,
}

fn parse_date(value: Option<String>, name: &str) -> ApiResult<Option<Date>> {
    value
        .map(|v| {
            Date::parse(&v, format_description!("[year]-[month]-[day]"))
                .map_err(|e| ApiError::InvalidQuery(format!("Invalid {name} '{v}': {e}")))
        })
        .transpose()
}

impl BookListQuery {
    pub fn into_criteria(self) -> ApiResult<Criteria> {
        let published_before = parse_date(self.publish_date_before, "publish_date_before")?;
        let published_after = parse_date(self.publish_date_after, "publish_date_after")?;
        Ok(Criteria::new(
            self.author,
            self.title_like,
            published_before,
            published_after,
        ))
    }
}

#[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = "Book", operation_id = "createBook",
    request_body = CreateBook,
    responses((status = StatusCode::CREATED, description = "Created Book", body = Book),
        (status = StatusCode::CONFLICT, description = "Book with same ISBN exists", body = crate::error::ErrorResponse))))]
pub async fn create(
    repository: BookRepository,
    request_id: RequestId,
    State(state): State<AppState>,
    Garde(Json(payload)): Garde<Json<CreateBook>>,
) -> ApiResult<impl IntoResponse> {
    info!(%request_id, "New book storage request received");
    debug!(%request_id, "Storing book {:?}", payload);
    let record = repository.create(payload).await?;
    let location = state.build_url(&format!("api/book/{}", record.isbn))?;
    info!(%request_id, "New book stored with ISBN {}", record.isbn);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location.to_string())],
        Json(record),
    ))
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = "Book", operation_id = "listBook",
    params(BookListQuery), responses((status = StatusCode::OK, description = "List of Books matching filters", body = Vec<Book>))))]
pub async fn list(
    repository: BookRepository,
    request_id: RequestId,
    Garde(Query(query)): Garde<Query<BookListQuery>>,
) -> ApiResult<impl IntoResponse> {
    info!(%request_id, "Book list retrieval request received");
    debug!(%request_id, "Listing books with {:?}", query);
    let criteria = query.into_criteria()?;
    let books = resolve(&repository, criteria).await?;
    Ok((StatusCode::OK, Json(books)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/count", tag = "Book", operation_id = "countBook",
    responses((status = StatusCode::OK, description = "Count", body = u64))))]
pub async fn count(repository: BookRepository) -> ApiResult<impl IntoResponse> {
    let count = repository.count().await?;
    Ok((StatusCode::OK, Json(count)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{isbn}", tag = "Book", operation_id = "getBook",
    params(("isbn" = String, Path, description = "ISBN of book to return")),
    responses((status = StatusCode::OK, description = "Get one", body = Book),
        (status = StatusCode::NOT_FOUND, description = "Book not found", body = crate::error::ErrorResponse))))]
pub async fn get_book(
    Path(isbn): Path<Isbn>,
    repository: BookRepository,
    request_id: RequestId,
) -> ApiResult<impl IntoResponse> {
    info!(%request_id, "Book retrieval request received for ISBN {isbn}");
    let record = repository.get(isbn.as_ref()).await?;

    Ok((StatusCode::OK, Json(record)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/{isbn}", tag = "Book", operation_id = "updateBook",
    params(("isbn" = String, Path, description = "ISBN of book to update")),
    request_body = UpdateBook,
    responses((status = StatusCode::OK, description = "Updated Book", body = Book),
        (status = StatusCode::NOT_FOUND, description = "Book not found", body = crate::error::ErrorResponse))))]
pub async fn update(
    Path(isbn): Path<Isbn>,
    repository: BookRepository,
    request_id: RequestId,
    Garde(Json(payload)): Garde<Json<UpdateBook>>,
) -> ApiResult<impl IntoResponse> {
    info!(%request_id, "Book update request received for ISBN {isbn}");
    let record = repository.update(isbn.as_ref(), payload).await?;

    Ok((StatusCode::OK, Json(record)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(delete, path = "/{isbn}", tag = "Book", operation_id = "deleteBook",
    params(("isbn" = String, Path, description = "ISBN of book to delete")),
    responses((status = StatusCode::NO_CONTENT, description = "Deleted successfully"),
        (status = StatusCode::NOT_FOUND, description = "Book not found", body = crate::error::ErrorResponse))))]
pub async fn delete(
    Path(isbn): Path<Isbn>,
    repository: BookRepository,
    request_id: RequestId,
) -> ApiResult<impl IntoResponse> {
    info!(%request_id, "Book removal request received for ISBN {isbn}");
    repository.delete(isbn.as_ref()).await?;

    Ok((StatusCode::NO_CONTENT, ()))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create).get(list))
        .route("/count", get(count))
        .route("/{isbn}", get(get_book).put(update).delete(delete))
}
