use anyhow::{Result, anyhow};
use reqwest::{StatusCode, Url};
use serde_json::{Value, json};

pub async fn create_book(
    client: &reqwest::Client,
    base_url: &Url,
    isbn: &str,
    title: &str,
    author: &str,
    publish_date: Option<&str>,
) -> Result<Value> {
    let payload = json!({
        "isbn": isbn,
        "title": title,
        "author": author,
        "publish_date": publish_date,
    });
    let api_url = base_url.join("api/book")?;

    let response = client.post(api_url).json(&payload).send().await?;
    if response.status() != StatusCode::CREATED {
        return Err(anyhow!("Book not created: {}", response.status()));
    }

    let new_book: Value = response.json().await?;
    Ok(new_book)
}

/// Lists books with given query parameters, returns ISBNs in response order
pub async fn list_isbns(
    client: &reqwest::Client,
    base_url: &Url,
    query: &[(&str, &str)],
) -> Result<Vec<String>> {
    let api_url = base_url.join("api/book")?;
    let response = client.get(api_url).query(query).send().await?;
    if !response.status().is_success() {
        return Err(anyhow!("Listing failed: {}", response.status()));
    }
    let books: Vec<Value> = response.json().await?;
    Ok(books
        .iter()
        .filter_map(|b| b["isbn"].as_str().map(str::to_string))
        .collect())
}
