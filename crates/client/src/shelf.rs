// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Library view logic: partitioning, filtering, facets and sort orders.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use crate::model::{Author, BookStatus, Genre, LibraryFilters, SortOption, UserBook};

/// Library split by reading status, original order kept.
#[derive(Debug, Default, Serialize)]
pub struct Shelves<'a> {
    pub reading: Vec<&'a UserBook>,
    pub to_read: Vec<&'a UserBook>,
    pub finished: Vec<&'a UserBook>,
}

pub fn partition_by_status(books: &[UserBook]) -> Shelves<'_> {
    let mut shelves = Shelves::default();
    for book in books {
        match book.status {
            BookStatus::Reading => shelves.reading.push(book),
            BookStatus::ToRead => shelves.to_read.push(book),
            BookStatus::Finished => shelves.finished.push(book),
        }
    }
    shelves
}

/// Apply the title search and filters.
///
/// Title matching is a case-insensitive substring test. Genre and author
/// filters match if any of the book's entries is selected. A year filter
/// excludes books without a parseable publication date.
pub fn filter_books<'a>(
    books: &'a [UserBook],
    query: &str,
    filters: &LibraryFilters,
) -> Vec<&'a UserBook> {
    let query = query.trim().to_lowercase();
    books
        .iter()
        .filter(|ub| query.is_empty() || ub.book.title.to_lowercase().contains(&query))
        .filter(|ub| {
            filters.genres.is_empty()
                || ub.book.genres.iter().any(|g| filters.genres.contains(&g.name))
        })
        .filter(|ub| {
            filters.authors.is_empty()
                || ub.book.authors.iter().any(|a| filters.authors.contains(&a.name))
        })
        .filter(|ub| match filters.year {
            Some(year) => ub.book.published_date.as_deref().and_then(published_year) == Some(year),
            None => true,
        })
        .filter(|ub| match filters.rating {
            Some(min) => ub.rating.is_some_and(|r| r >= min),
            None => true,
        })
        .collect()
}

/// Selected list entries plus one per set scalar filter.
pub fn active_filter_count(filters: &LibraryFilters) -> usize {
    filters.genres.len()
        + filters.authors.len()
        + usize::from(filters.year.is_some())
        + usize::from(filters.rating.is_some())
}

/// Values available for filtering a library.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Facets {
    pub genres: Vec<Genre>,
    pub authors: Vec<Author>,
    /// Most recent first.
    pub years: Vec<i32>,
}

pub fn facets(books: &[UserBook]) -> Facets {
    let mut genres: HashMap<u64, &Genre> = HashMap::new();
    let mut authors: HashMap<u64, &Author> = HashMap::new();
    let mut years = BTreeSet::new();

    for ub in books {
        for genre in &ub.book.genres {
            genres.entry(genre.id).or_insert(genre);
        }
        for author in &ub.book.authors {
            authors.entry(author.id).or_insert(author);
        }
        if let Some(year) = ub.book.published_date.as_deref().and_then(published_year) {
            years.insert(year);
        }
    }

    let mut genres: Vec<Genre> = genres.into_values().cloned().collect();
    genres.sort_by(|a, b| compare_text(&a.name, &b.name).then(a.id.cmp(&b.id)));
    let mut authors: Vec<Author> = authors.into_values().cloned().collect();
    authors.sort_by(|a, b| compare_text(&a.name, &b.name).then(a.id.cmp(&b.id)));

    Facets { genres, authors, years: years.into_iter().rev().collect() }
}

/// Sorted copy of `books`. Stable; unrated books trail both rating orders.
pub fn sort_books<B>(books: &[B], option: SortOption) -> Vec<B>
where
    B: Borrow<UserBook> + Clone,
{
    let mut sorted = books.to_vec();
    sorted.sort_by(|a, b| compare(a.borrow(), b.borrow(), option));
    sorted
}

fn compare(a: &UserBook, b: &UserBook, option: SortOption) -> Ordering {
    match option {
        SortOption::TitleAsc => compare_text(&a.book.title, &b.book.title),
        SortOption::TitleDesc => compare_text(&b.book.title, &a.book.title),
        SortOption::AuthorAsc => compare_text(first_author(a), first_author(b)),
        SortOption::AuthorDesc => compare_text(first_author(b), first_author(a)),
        SortOption::DateAddedAsc => date_added(a).cmp(&date_added(b)),
        SortOption::DateAddedDesc => date_added(b).cmp(&date_added(a)),
        SortOption::RatingAsc => compare_rating(a.rating, b.rating, false),
        SortOption::RatingDesc => compare_rating(a.rating, b.rating, true),
        SortOption::PagesAsc => a.book.pages_count.cmp(&b.book.pages_count),
        SortOption::PagesDesc => b.book.pages_count.cmp(&a.book.pages_count),
    }
}

fn compare_rating(a: Option<u8>, b: Option<u8>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn first_author(ub: &UserBook) -> &str {
    ub.book.authors.first().map(|a| a.name.as_str()).unwrap_or_default()
}

/// Milliseconds since epoch from `created_at`, else the id.
fn date_added(ub: &UserBook) -> i64 {
    ub.created_at.as_deref().and_then(parse_timestamp_ms).unwrap_or(ub.id as i64)
}

fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Year of a `YYYY`, `YYYY-MM` or `YYYY-MM-DD` publication date.
pub fn published_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.year());
    }
    let head = raw.split('-').next()?;
    if head.len() == 4 && head.bytes().all(|b| b.is_ascii_digit()) {
        head.parse().ok()
    } else {
        None
    }
}

/// Case- and accent-insensitive comparison (Spanish alphabet).
pub fn compare_text(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

fn collation_key(s: &str) -> String {
    let mut key = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' => key.push('a'),
            'é' | 'è' | 'ë' | 'ê' => key.push('e'),
            'í' | 'ì' | 'ï' | 'î' => key.push('i'),
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => key.push('o'),
            'ú' | 'ù' | 'ü' | 'û' => key.push('u'),
            'ç' => key.push('c'),
            // ñ is its own letter between n and o.
            'ñ' => key.push_str("n~"),
            other => key.push(other),
        }
    }
    key
}

/// Books ordered by reading progress, furthest along first.
pub fn sort_by_progress<B>(books: &[B]) -> Vec<B>
where
    B: Borrow<UserBook> + Clone,
{
    let mut sorted = books.to_vec();
    sorted.sort_by(|a, b| progress(b.borrow()).total_cmp(&progress(a.borrow())));
    sorted
}

/// Fraction of pages read; page counts of zero count as one.
pub fn progress(ub: &UserBook) -> f64 {
    f64::from(ub.pages_read.unwrap_or(0)) / f64::from(ub.book.pages_count.max(1))
}

/// Yearly goal completion, rounded and capped at 100. Zero goal gives 0.
pub fn yearly_percentage(read: u32, goal: u32) -> u32 {
    if goal == 0 {
        return 0;
    }
    let pct = (f64::from(read) / f64::from(goal) * 100.0).round();
    pct.min(100.0) as u32
}

/// One entry of the activity strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayActivity {
    pub date: NaiveDate,
    /// Narrow Spanish weekday name (L, M, X, J, V, S, D).
    pub letter: char,
    pub active: bool,
    pub is_today: bool,
}

/// The seven days ending at `today`, oldest first.
pub fn last_seven_days(activity_dates: &[String], today: NaiveDate) -> Vec<DayActivity> {
    let active: BTreeSet<NaiveDate> = activity_dates
        .iter()
        .filter_map(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        .collect();

    (0..7u64)
        .rev()
        .filter_map(|back| {
            let date = today.checked_sub_days(Days::new(back))?;
            Some(DayActivity {
                date,
                letter: weekday_letter(date.weekday()),
                active: active.contains(&date),
                is_today: back == 0,
            })
        })
        .collect()
}

fn weekday_letter(day: Weekday) -> char {
    match day {
        Weekday::Mon => 'L',
        Weekday::Tue => 'M',
        Weekday::Wed => 'X',
        Weekday::Thu => 'J',
        Weekday::Fri => 'V',
        Weekday::Sat => 'S',
        Weekday::Sun => 'D',
    }
}

/// ISBN to library entry id, to tell whether a search hit is already owned.
pub fn library_index(books: &[UserBook]) -> HashMap<String, u64> {
    books.iter().map(|ub| (ub.book.isbn.clone(), ub.id)).collect()
}

#[cfg(test)]
#[path = "shelf_tests.rs"]
mod tests;
