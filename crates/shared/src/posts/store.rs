use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::model::{BlogPost, NewPost};
use super::seed::seed_posts;
use super::slug::slugify;
use super::storage::{KeyValueStore, StorageError};

pub const POSTS_STORAGE_KEY: &str = "crypto_blog_posts";

#[derive(Debug, Error)]
pub enum PostStoreError {
    #[error("failed to encode blog posts: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Blog posts as one collection: the seed set merged with the posts readers
/// added through the admin surface.
pub struct PostStore<S> {
    storage: S,
    seed: Vec<BlogPost>,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> PostStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_seed(storage, seed_posts())
    }

    pub fn with_seed(storage: S, seed: Vec<BlogPost>) -> Self {
        Self {
            storage,
            seed,
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Never fails: unreadable or malformed persisted data is logged and
    /// treated as an empty set.
    pub fn list_posts(&self) -> Vec<BlogPost> {
        let persisted = self.load_persisted().unwrap_or_else(|err| {
            warn!("failed to read persisted blog posts, using seed posts only: {err}");
            Vec::new()
        });
        merge_posts(&self.seed, persisted)
    }

    pub fn add_post(&self, input: NewPost) -> Result<BlogPost, PostStoreError> {
        self.add_post_at(input, Utc::now())
    }

    pub fn add_post_at(
        &self,
        input: NewPost,
        published_at: DateTime<Utc>,
    ) -> Result<BlogPost, PostStoreError> {
        let post = BlogPost {
            id: new_post_id(published_at),
            slug: slugify(&input.title),
            title: input.title,
            summary: input.summary,
            content: input.content,
            image_url: input.image_url,
            published_at: published_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // A failed read must not turn into an overwrite of the saved posts.
        let mut persisted = self.load_persisted()?;
        persisted.push(post.clone());
        let encoded = serde_json::to_string(&persisted)?;
        self.storage.write(POSTS_STORAGE_KEY, &encoded)?;

        info!(
            post_id = %post.id,
            slug = %post.slug,
            persisted_count = persisted.len(),
            "blog post added"
        );
        Ok(post)
    }

    /// Malformed data reads as an empty set; storage failures are returned.
    fn load_persisted(&self) -> Result<Vec<BlogPost>, StorageError> {
        let Some(raw) = self.storage.read(POSTS_STORAGE_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<BlogPost>>(&raw) {
            Ok(posts) => Ok(posts),
            Err(err) => {
                warn!("persisted blog posts are malformed, using seed posts only: {err}");
                Ok(Vec::new())
            }
        }
    }
}

/// Seed first, then persisted; a later post replaces an earlier one with the
/// same id in place. The result is sorted newest first, with unparseable
/// timestamps last.
pub fn merge_posts(seed: &[BlogPost], persisted: Vec<BlogPost>) -> Vec<BlogPost> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<BlogPost> = Vec::with_capacity(seed.len() + persisted.len());

    for post in seed.iter().cloned().chain(persisted) {
        match positions.get(&post.id) {
            Some(&index) => merged[index] = post,
            None => {
                positions.insert(post.id.clone(), merged.len());
                merged.push(post);
            }
        }
    }

    merged.sort_by_cached_key(|post| std::cmp::Reverse(post.published_at_utc()));
    merged
}

fn new_post_id(published_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("post-{}-{}", published_at.timestamp_millis(), &suffix[..8])
}
