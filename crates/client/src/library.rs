// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Personal library, book search and gamification endpoints.

use chrono::NaiveDate;
use serde_json::Value;

use crate::client::{ApiClient, ApiRequest};
use crate::error::ApiError;
use crate::model::{
    BookLookup, BookPatch, BookStatus, GamificationStats, SearchBookResult, UserBook,
};

/// Ratings accepted by the API.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

impl ApiClient {
    /// Every book in the user's library.
    pub async fn library(&self) -> Result<Vec<UserBook>, ApiError> {
        self.get_json("/status/").await
    }

    pub async fn user_book(&self, id: u64) -> Result<UserBook, ApiError> {
        self.get_json(&format!("/status/{id}/")).await
    }

    /// Add a book by ISBN, or move it if it is already in the library.
    pub async fn add_or_update_book(
        &self,
        isbn: &str,
        status: BookStatus,
        extra: &BookPatch,
    ) -> Result<UserBook, ApiError> {
        let isbn = isbn.trim();
        if isbn.is_empty() {
            return Err(ApiError::InvalidInput("isbn is required".to_owned()));
        }
        let mut body = serde_json::to_value(extra)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        if let Value::Object(ref mut fields) = body {
            fields.insert("isbn".to_owned(), Value::from(isbn));
            fields.insert("status".to_owned(), Value::from(status.code()));
        }
        self.send_json(ApiRequest::post("/status/", body)).await
    }

    pub async fn patch_user_book(&self, id: u64, patch: &BookPatch) -> Result<UserBook, ApiError> {
        self.patch_json(&format!("/status/{id}/"), patch).await
    }

    /// Record pages read; marks the book as being read.
    pub async fn update_progress(&self, id: u64, pages_read: u32) -> Result<UserBook, ApiError> {
        let patch = BookPatch {
            status: Some(BookStatus::Reading),
            pages_read: Some(pages_read),
            ..BookPatch::default()
        };
        self.patch_user_book(id, &patch).await
    }

    /// Rate a book 1-5; marks it finished as of `today`.
    pub async fn rate_book(
        &self,
        id: u64,
        rating: u8,
        today: NaiveDate,
    ) -> Result<UserBook, ApiError> {
        if !RATING_RANGE.contains(&rating) {
            return Err(ApiError::InvalidInput(format!("rating must be 1-5, got {rating}")));
        }
        let patch = BookPatch {
            status: Some(BookStatus::Finished),
            rating: Some(rating),
            finished_date: Some(today.format("%Y-%m-%d").to_string()),
            ..BookPatch::default()
        };
        self.patch_user_book(id, &patch).await
    }

    pub async fn delete_user_book(&self, id: u64) -> Result<(), ApiError> {
        self.delete(&format!("/status/{id}/")).await
    }

    pub async fn search_books(&self, query: &str) -> Result<Vec<SearchBookResult>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidInput("search query is empty".to_owned()));
        }
        self.send_json(ApiRequest::get("/books/search/").with_query("q", query)).await
    }

    /// Resolve an ISBN. A 404 is reported as a `not_found` lookup.
    pub async fn lookup_isbn(&self, isbn: &str) -> Result<BookLookup, ApiError> {
        let isbn = isbn.trim();
        if isbn.is_empty() {
            return Err(ApiError::InvalidInput("isbn is required".to_owned()));
        }
        match self.get_json(&format!("/books/isbn/{isbn}/")).await {
            Err(ApiError::Status { status: 404, .. }) => {
                Ok(BookLookup { status: "not_found".to_owned(), data: None })
            }
            other => other,
        }
    }

    pub async fn gamification_stats(&self) -> Result<GamificationStats, ApiError> {
        self.get_json("/gamification/").await
    }
}
