use crate::page;
use axum::response::{Html, IntoResponse};

pub async fn index() -> impl IntoResponse {
    Html(page::index_page())
}
