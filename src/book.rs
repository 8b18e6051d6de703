use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Default page size for a browse request.
pub const DEFAULT_LIMIT: u32 = 40;

/// A catalog work as handed back to callers.
///
/// Search results only fill the first five fields; the remaining ones are
/// populated by a detail lookup.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Book {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub author_name: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_i: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_publish_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_links: Option<BTreeMap<LinkSource, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_details: Option<AuthorDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<TextBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct AuthorDetail {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<TextBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
}

/// Open Library text fields arrive either as a bare string or as
/// `{"type": "/type/text", "value": "..."}`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum TextBlock {
    Plain(String),
    Typed {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        value: String,
    },
}

impl TextBlock {
    pub fn as_str(&self) -> &str {
        match self {
            TextBlock::Plain(text) => text,
            TextBlock::Typed { value, .. } => value,
        }
    }
}

/// Stores that an edition can carry an identifier for.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LinkSource {
    Goodreads,
    Amazon,
    Google,
}

impl LinkSource {
    pub const ALL: [LinkSource; 3] = [LinkSource::Goodreads, LinkSource::Amazon, LinkSource::Google];

    /// Name of the identifier list in an edition's `identifiers` object.
    pub fn identifier_name(self) -> &'static str {
        match self {
            LinkSource::Goodreads => "goodreads",
            LinkSource::Amazon => "amazon",
            LinkSource::Google => "google",
        }
    }

    pub fn url_for(self, id: &str) -> String {
        match self {
            LinkSource::Goodreads => format!("https://www.goodreads.com/book/show/{id}"),
            LinkSource::Amazon => format!("https://www.amazon.com/dp/{id}"),
            LinkSource::Google => format!("https://books.google.com/books?id={id}"),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Relevance,
    New,
    Old,
    Rating,
    Title,
    Random,
}

impl SortMode {
    /// Value for the `sort` query parameter. Relevance is the server default
    /// and is never sent.
    pub fn as_param(self) -> Option<&'static str> {
        match self {
            SortMode::Relevance => None,
            SortMode::New => Some("new"),
            SortMode::Old => Some("old"),
            SortMode::Rating => Some("rating"),
            SortMode::Title => Some("title"),
            SortMode::Random => Some("random"),
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relevance" => Ok(SortMode::Relevance),
            "new" => Ok(SortMode::New),
            "old" => Ok(SortMode::Old),
            "rating" => Ok(SortMode::Rating),
            "title" => Ok(SortMode::Title),
            "random" => Ok(SortMode::Random),
            other => Err(format!("unknown sort mode '{other}'")),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param().unwrap_or("relevance"))
    }
}

/// Parameters of a search/browse request.
#[derive(Clone, Debug, PartialEq)]
pub struct BrowseOptions {
    pub query: Option<String>,
    pub genres: Vec<String>,
    pub year: Option<i32>,
    pub sort: SortMode,
    pub limit: u32,
    /// 1-based.
    pub page: u32,
}

impl Default for BrowseOptions {
    fn default() -> Self {
        BrowseOptions {
            query: None,
            genres: Vec::new(),
            year: None,
            sort: SortMode::Relevance,
            limit: DEFAULT_LIMIT,
            page: 1,
        }
    }
}

impl BrowseOptions {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genres.push(genre.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Number of results to skip. A page of 0 counts as the first page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }
}

/// One page of search results plus the server-reported match count.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct BrowseResult {
    pub books: Vec<Book>,
    pub total: u64,
}
