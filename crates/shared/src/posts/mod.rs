pub mod model;
pub mod seed;
pub mod slug;
pub mod storage;
pub mod store;

pub use model::{BlogPost, NewPost};
pub use seed::seed_posts;
pub use slug::slugify;
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError};
pub use store::{POSTS_STORAGE_KEY, PostStore, PostStoreError, merge_posts};
