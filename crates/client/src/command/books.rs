// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Library, search and stats commands.

use chrono::NaiveDate;
use serde_json::{json, Value};

use super::{to_json, LibraryArgs};
use crate::client::ApiClient;
use crate::model::{BookPatch, BookStatus, LibraryFilters};
use crate::shelf;

pub async fn library(api: &ApiClient, args: &LibraryArgs) -> anyhow::Result<Value> {
    let books = api.library().await?;
    let filters = LibraryFilters {
        genres: args.genres.clone(),
        authors: args.authors.clone(),
        year: args.year,
        rating: args.min_rating,
    };

    let mut matched = shelf::filter_books(&books, args.query.as_deref().unwrap_or(""), &filters);
    if let Some(status) = args.status {
        matched.retain(|ub| ub.status == status);
    }
    let sorted = shelf::sort_books(&matched, args.sort);

    let mut out = json!({
        "sort": args.sort,
        "sort_label": args.sort.display_name(),
        "active_filters": shelf::active_filter_count(&filters),
        "total": books.len(),
        "books": sorted,
    });
    if args.facets {
        out["facets"] = to_json(&shelf::facets(&books))?;
    }
    Ok(out)
}

pub async fn add(api: &ApiClient, isbn: &str, status: BookStatus) -> anyhow::Result<Value> {
    let entry = api.add_or_update_book(isbn, status, &BookPatch::default()).await?;
    to_json(&entry)
}

/// Search hits annotated with the library entry id when already owned.
pub async fn search(api: &ApiClient, query: &str) -> anyhow::Result<Value> {
    let hits = api.search_books(query).await?;
    let owned = shelf::library_index(&api.library().await?);
    let results: Vec<Value> = hits
        .iter()
        .map(|hit| -> anyhow::Result<Value> {
            let mut value = to_json(hit)?;
            value["library_id"] = json!(owned.get(&hit.isbn));
            Ok(value)
        })
        .collect::<anyhow::Result<_>>()?;
    Ok(json!({ "query": query.trim(), "results": results }))
}

pub async fn stats(api: &ApiClient, today: NaiveDate) -> anyhow::Result<Value> {
    let stats = api.gamification_stats().await?;
    let books = api.library().await?;
    let shelves = shelf::partition_by_status(&books);
    let reading = shelf::sort_by_progress(&shelves.reading);

    let challenge = &stats.yearly_challenge;
    let current: Vec<Value> = reading
        .iter()
        .map(|ub| {
            json!({
                "id": ub.id,
                "title": ub.book.title,
                "pages_read": ub.pages_read.unwrap_or(0),
                "pages_count": ub.book.pages_count,
                "progress": shelf::progress(ub),
            })
        })
        .collect();

    Ok(json!({
        "streak": stats.streak,
        "week": shelf::last_seven_days(&stats.activity_dates, today),
        "yearly_challenge": {
            "year": challenge.year,
            "read": challenge.read,
            "goal": challenge.goal,
            "percentage": shelf::yearly_percentage(challenge.read, challenge.goal),
        },
        "shelves": {
            "reading": shelves.reading.len(),
            "to_read": shelves.to_read.len(),
            "finished": shelves.finished.len(),
        },
        "currently_reading": current,
    }))
}
