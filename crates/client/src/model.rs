// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the reading-tracker API.

use serde::{Deserialize, Serialize};

/// Authenticated user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<String>,
}

/// Reading status of a book in the user's library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum BookStatus {
    /// To read.
    #[serde(rename = "TR")]
    #[value(name = "to-read", alias = "TR")]
    ToRead,
    #[serde(rename = "RD")]
    #[value(name = "reading", alias = "RD")]
    Reading,
    #[serde(rename = "FN")]
    #[value(name = "finished", alias = "FN")]
    Finished,
}

impl BookStatus {
    /// Wire code (`TR`, `RD`, `FN`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::ToRead => "TR",
            Self::Reading => "RD",
            Self::Finished => "FN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ToRead => "Por Leer",
            Self::Reading => "Leyendo",
            Self::Finished => "Finalizado",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub pages_count: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// `GOOGLE_BOOKS`, `OPEN_LIBRARY`, `MANUAL`, or anything the server adds later.
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

fn default_source() -> String {
    "UNKNOWN".to_owned()
}

/// A book in the user's library together with its reading state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBook {
    pub id: u64,
    pub book: Book,
    pub status: BookStatus,
    #[serde(default)]
    pub status_display: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub pages_read: Option<u32>,
    #[serde(default)]
    pub finished_date: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Partial update for a library entry. Unset fields are omitted from the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages_read: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_date: Option<String>,
}

/// Library filters applied on top of the title search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryFilters {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rating: Option<u8>,
}

/// Library sort orders.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortOption {
    TitleAsc,
    TitleDesc,
    AuthorAsc,
    AuthorDesc,
    DateAddedAsc,
    #[default]
    DateAddedDesc,
    RatingAsc,
    RatingDesc,
    PagesAsc,
    PagesDesc,
}

impl SortOption {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TitleAsc => "Título (A-Z)",
            Self::TitleDesc => "Título (Z-A)",
            Self::AuthorAsc => "Autor (A-Z)",
            Self::AuthorDesc => "Autor (Z-A)",
            Self::DateAddedAsc => "Fecha añadido (Antiguo primero)",
            Self::DateAddedDesc => "Fecha añadido (Nuevo primero)",
            Self::RatingAsc => "Valoración (Menor primero)",
            Self::RatingDesc => "Valoración (Mayor primero)",
            Self::PagesAsc => "Páginas (Menor primero)",
            Self::PagesDesc => "Páginas (Mayor primero)",
        }
    }

    /// Short label for a compact sort indicator.
    pub fn short_description(&self) -> &'static str {
        match self {
            Self::TitleAsc => "A-Z",
            Self::TitleDesc => "Z-A",
            Self::AuthorAsc => "Autor A-Z",
            Self::AuthorDesc => "Autor Z-A",
            Self::DateAddedAsc => "Más antiguos",
            Self::DateAddedDesc => "Más recientes",
            Self::RatingAsc => "⭐ Menor",
            Self::RatingDesc => "⭐ Mayor",
            Self::PagesAsc => "📖 Menos páginas",
            Self::PagesDesc => "📖 Más páginas",
        }
    }
}

/// Reading streak and yearly goal progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamificationStats {
    pub streak: u32,
    #[serde(default)]
    pub activity_dates: Vec<String>,
    pub yearly_challenge: YearlyChallenge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyChallenge {
    pub read: u32,
    pub goal: u32,
    pub year: i32,
}

/// A hit from the book search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchBookResult {
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
}

/// Result of resolving a single ISBN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLookup {
    /// `found`, `created`, `not_found`, ...
    pub status: String,
    #[serde(default)]
    pub data: Option<Book>,
}

impl BookLookup {
    pub fn is_found(&self) -> bool {
        self.status != "not_found" && self.data.is_some()
    }
}
