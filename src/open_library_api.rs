use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::book::{AuthorDetail, Book, BrowseOptions, BrowseResult, LinkSource, TextBlock};
use crate::cache::{MemoryCache, SessionCache};
use crate::config::CatalogConfig;
use crate::error::{CacheError, CatalogError, Result};

/// Wildcard query matching every work.
pub const MATCH_ALL: &str = "*";

/// Fields requested from the search endpoint.
pub const SEARCH_FIELDS: &str = "key,title,author_name,cover_i,first_publish_year";

const DEFAULT_USER_AGENT: &str = concat!("next_book/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
    #[serde(rename = "numFound", default)]
    num_found: u64,
}

#[derive(Deserialize, Debug)]
struct SearchDoc {
    key: Option<String>,
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    cover_i: Option<i64>,
    first_publish_year: Option<i32>,
}

impl SearchDoc {
    /// Drops documents without a usable key.
    fn into_book(self) -> Option<Book> {
        let key = self.key.filter(|key| !key.trim().is_empty())?;
        Some(Book {
            key,
            title: self.title.unwrap_or_default(),
            author_name: self.author_name,
            cover_i: self.cover_i,
            first_publish_year: self.first_publish_year,
            ..Book::default()
        })
    }
}

#[derive(Deserialize, Debug)]
struct WorkRecord {
    key: Option<String>,
    title: Option<String>,
    #[serde(default)]
    covers: Vec<i64>,
    #[serde(default)]
    authors: Vec<WorkAuthor>,
    first_publish_date: Option<String>,
    description: Option<TextBlock>,
    #[serde(default)]
    subjects: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct WorkAuthor {
    author: Option<KeyRef>,
}

#[derive(Deserialize, Debug)]
struct KeyRef {
    key: String,
}

impl WorkRecord {
    fn author_key(&self) -> Option<&str> {
        self.authors
            .iter()
            .filter_map(|entry| entry.author.as_ref())
            .map(|author| author.key.as_str())
            .find(|key| !key.is_empty())
    }

    fn into_book(self, work_id: &str) -> Book {
        Book {
            key: self.key.unwrap_or_else(|| format!("/works/{work_id}")),
            title: self.title.unwrap_or_default(),
            author_name: Vec::new(),
            cover_i: first_cover(&self.covers),
            first_publish_year: self.first_publish_date.as_deref().and_then(extract_year),
            description: self.description,
            subjects: self.subjects,
            ..Book::default()
        }
    }
}

#[derive(Deserialize, Debug)]
struct EditionList {
    #[serde(default)]
    entries: Vec<EditionRecord>,
}

#[derive(Deserialize, Debug)]
struct EditionRecord {
    #[serde(default)]
    covers: Vec<i64>,
    #[serde(default)]
    identifiers: HashMap<String, Vec<String>>,
}

#[derive(Deserialize, Debug)]
struct AuthorRecord {
    name: Option<String>,
    personal_name: Option<String>,
    bio: Option<TextBlock>,
    birth_date: Option<String>,
    death_date: Option<String>,
}

impl AuthorRecord {
    fn into_detail(self) -> Option<AuthorDetail> {
        let name = self
            .name
            .or(self.personal_name)
            .filter(|name| !name.trim().is_empty())?;
        Some(AuthorDetail {
            name,
            bio: self.bio,
            birth_date: self.birth_date,
            death_date: self.death_date,
        })
    }
}

/// Open Library uses `-1` for "no cover".
fn first_cover(covers: &[i64]) -> Option<i64> {
    covers.iter().copied().find(|id| *id > 0)
}

/// First run of four digits in a free-form date such as `"June 1965"`.
fn extract_year(date: &str) -> Option<i32> {
    date.as_bytes()
        .windows(4)
        .position(|window| window.iter().all(u8::is_ascii_digit))
        .and_then(|start| date[start..start + 4].parse().ok())
}

/// Accepts `OL45804W`, `/works/OL45804W` or `/works/OL45804W.json`.
fn normalize_work_id(work_id: &str) -> &str {
    let id = work_id.trim();
    let id = id.strip_prefix("/works/").unwrap_or(id);
    id.strip_suffix(".json").unwrap_or(id)
}

fn external_links(identifiers: &HashMap<String, Vec<String>>) -> Option<BTreeMap<LinkSource, String>> {
    let links: BTreeMap<LinkSource, String> = LinkSource::ALL
        .iter()
        .filter_map(|&source| {
            identifiers
                .get(source.identifier_name())
                .and_then(|ids| ids.first())
                .filter(|id| !id.is_empty())
                .map(|id| (source, source.url_for(id)))
        })
        .collect();
    if links.is_empty() {
        None
    } else {
        Some(links)
    }
}

fn build_http_client(config: &CatalogConfig) -> Result<Client> {
    let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
    debug!(base_url = %config.base_url, user_agent, "building catalog HTTP client");
    Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(|e| CatalogError::Client(e.to_string()))
}

/// Data-access layer over the Open Library API.
///
/// Holds no state besides the injected session cache; every call is a
/// strictly sequential chain of requests.
pub struct CatalogClient {
    http: Client,
    config: CatalogConfig,
    cache: Arc<dyn SessionCache>,
}

impl CatalogClient {
    /// Client backed by a fresh in-memory session cache.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        Self::with_cache(config, Arc::new(MemoryCache::new()))
    }

    pub fn with_cache(config: CatalogConfig, cache: Arc<dyn SessionCache>) -> Result<Self> {
        Url::parse(config.api_root())
            .map_err(|e| CatalogError::Client(format!("invalid base url '{}': {e}", config.base_url)))?;
        let http = build_http_client(&config)?;
        Ok(CatalogClient { http, config, cache })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Catalog URL with `segments` appended to the base path, each one
    /// percent-encoded on its own.
    fn endpoint<I>(&self, segments: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = Url::parse(self.config.api_root())
            .map_err(|e| CatalogError::Client(format!("invalid base url '{}': {e}", self.config.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::Client(format!("base url '{}' cannot have a path", self.config.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn work_url(&self, work_id: &str) -> Result<Url> {
        let file = format!("{work_id}.json");
        self.endpoint(["works", file.as_str()])
    }

    /// Full search request for `options`, parameters in a fixed order.
    pub fn search_url(&self, options: &BrowseOptions) -> Result<Url> {
        let mut url = self.endpoint(["search.json"])?;
        {
            let mut query = url.query_pairs_mut();
            let text = options
                .query
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .unwrap_or(MATCH_ALL);
            query.append_pair("q", text);
            for genre in &options.genres {
                query.append_pair("subject", genre);
            }
            if let Some(year) = options.year {
                query.append_pair("publish_year", &year.to_string());
            }
            if let Some(sort) = options.sort.as_param() {
                query.append_pair("sort", sort);
            }
            query.append_pair("offset", &options.offset().to_string());
            query.append_pair("language", &self.config.language);
            query.append_pair("limit", &options.limit.to_string());
            query.append_pair("fields", SEARCH_FIELDS);
        }
        Ok(url)
    }

    pub fn cache_key(&self, url: &Url) -> String {
        format!("{}{}", self.config.cache_namespace, url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Upstream {
                status: Some(status.as_u16()),
                message: status.canonical_reason().unwrap_or("request failed").to_string(),
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn fetch_search(&self, url: Url) -> Result<BrowseResult> {
        let response: SearchResponse = self.get_json(url).await?;
        let books: Vec<Book> = response
            .docs
            .into_iter()
            .filter_map(SearchDoc::into_book)
            .collect();
        Ok(BrowseResult {
            books,
            total: response.num_found,
        })
    }

    fn store(&self, cache_key: &str, result: &BrowseResult) {
        let stored = serde_json::to_string(result)
            .map_err(CacheError::from)
            .and_then(|value| self.cache.set(cache_key, &value));
        if let Err(err) = stored {
            warn!(cache_key, error = %err, "could not write search result to session cache");
        }
    }

    fn cached(&self, cache_key: &str) -> Option<BrowseResult> {
        let value = self.cache.get(cache_key)?;
        match serde_json::from_str(&value) {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(cache_key, error = %err, "ignoring unreadable session cache entry");
                None
            }
        }
    }

    /// Search the catalog.
    ///
    /// Successful results are cached under the request URL. When the request
    /// fails, the last successful result for the identical request is
    /// returned instead; without one the original error is returned.
    pub async fn browse_books(&self, options: &BrowseOptions) -> Result<BrowseResult> {
        let url = self.search_url(options)?;
        let cache_key = self.cache_key(&url);

        match self.fetch_search(url).await {
            Ok(result) => {
                debug!(total = result.total, returned = result.books.len(), "search succeeded");
                self.store(&cache_key, &result);
                Ok(result)
            }
            Err(err) => match self.cached(&cache_key) {
                Some(result) => {
                    warn!(error = %err, cache_key, "search failed, serving cached result");
                    Ok(result)
                }
                None => Err(err),
            },
        }
    }

    async fn first_edition(&self, work_id: &str) -> Result<Option<EditionRecord>> {
        let mut url = self.endpoint(["works", work_id, "editions.json"])?;
        url.query_pairs_mut()
            .append_pair("limit", "1")
            .append_pair("language", &self.config.language);
        let editions: EditionList = self.get_json(url).await?;
        Ok(editions.entries.into_iter().next())
    }

    async fn fetch_author(&self, author_key: &str) -> Result<AuthorRecord> {
        let mut segments: Vec<String> = author_key
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        match segments.last_mut() {
            Some(last) => last.push_str(".json"),
            None => {
                return Err(CatalogError::Upstream {
                    status: None,
                    message: format!("unusable author key '{author_key}'"),
                })
            }
        }
        self.get_json(self.endpoint(&segments)?).await
    }

    /// Look up a work and enrich it with its first edition and author.
    ///
    /// Only the work lookup itself can fail the call; edition and author
    /// lookups that fail are logged and skipped.
    pub async fn get_book_details(&self, work_id: &str) -> Result<Book> {
        let id = normalize_work_id(work_id);
        let url = self.work_url(id)?;

        let work: WorkRecord = match self.get_json(url).await {
            Ok(work) => work,
            Err(err) if err.status() == Some(404) => {
                return Err(CatalogError::NotFound {
                    id: work_id.to_string(),
                })
            }
            Err(err) => return Err(err),
        };
        let author_key = work.author_key().map(str::to_string);
        let mut book = work.into_book(id);

        match self.first_edition(id).await {
            Ok(Some(edition)) => {
                if let Some(cover) = first_cover(&edition.covers) {
                    book.cover_i = Some(cover);
                }
                book.external_links = external_links(&edition.identifiers);
            }
            Ok(None) => warn!(work = id, "no editions found, skipping edition enrichment"),
            Err(err) => warn!(work = id, error = %err, "edition lookup failed"),
        }

        if let Some(author_key) = author_key {
            match self.fetch_author(&author_key).await.map(AuthorRecord::into_detail) {
                Ok(Some(author)) => {
                    book.author_name = vec![author.name.clone()];
                    book.author_details = Some(author);
                }
                Ok(None) => warn!(author = %author_key, "author record has no name"),
                Err(err) => warn!(author = %author_key, error = %err, "author lookup failed"),
            }
        }

        info!(work = id, title = %book.title, "loaded book details");
        Ok(book)
    }
}
