//! Home page sections that never fail.
//!
//! Each section walks a list of candidate subjects and keeps the first one
//! the catalog returns books for. Failed subjects are skipped after a short
//! pause; running out of subjects yields an empty list.

use rand::seq::SliceRandom;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::book::{Book, BrowseOptions, SortMode};
use crate::open_library_api::CatalogClient;

pub const TRENDING_SUBJECTS: [&str; 5] = ["love", "fiction", "thriller", "adventure", "fantasy"];

pub const TOP_RATED_SUBJECTS: [&str; 4] = ["history", "classic_literature", "biography", "science"];

pub const RANDOM_SUBJECTS: [&str; 6] = [
    "adventure",
    "fantasy",
    "science_fiction",
    "romance",
    "thriller",
    "mystery",
];

impl CatalogClient {
    pub async fn get_trending_books(&self, limit: u32) -> Vec<Book> {
        self.first_subject_with_books("trending", &TRENDING_SUBJECTS, limit)
            .await
    }

    pub async fn get_top_rated_books(&self, limit: u32) -> Vec<Book> {
        self.first_subject_with_books("top rated", &TOP_RATED_SUBJECTS, limit)
            .await
    }

    /// Same as the other sections, over a freshly shuffled subject list.
    pub async fn get_random_books(&self, limit: u32) -> Vec<Book> {
        let mut subjects = RANDOM_SUBJECTS.to_vec();
        subjects.shuffle(&mut rand::thread_rng());
        self.first_subject_with_books("random", &subjects, limit).await
    }

    async fn first_subject_with_books(&self, section: &str, subjects: &[&str], limit: u32) -> Vec<Book> {
        for subject in subjects {
            let options = BrowseOptions::default()
                .with_genre(*subject)
                .with_sort(SortMode::Relevance)
                .with_limit(limit);
            match self.browse_books(&options).await {
                Ok(result) if !result.books.is_empty() => {
                    debug!(section, subject, count = result.books.len(), "section filled");
                    return result.books;
                }
                Ok(_) => debug!(section, subject, "subject returned no books"),
                Err(err) => {
                    warn!(section, subject, error = %err, "subject query failed, trying next");
                    sleep(self.config().retry_delay()).await;
                }
            }
        }
        error!(section, tried = subjects.len(), "no subject returned any books");
        Vec::new()
    }
}
