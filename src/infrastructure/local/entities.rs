//! Per-entity local caches fronting database lookups

use tracing::debug;

use super::cache::LocalCache;
use crate::domain::storage::{RowSource, SqlValue};
use crate::domain::{DomainError, Livestream, Tag, Theme, User};

const USER_BY_ID: &str = "SELECT * FROM users WHERE id = ?";
const USER_BY_NAME: &str = "SELECT * FROM users WHERE name = ?";
const THEME_BY_USER_ID: &str = "SELECT * FROM themes WHERE user_id = ?";
const TAGS_BY_ID: &str = "SELECT * FROM tags WHERE id = ?";
const ALL_TAGS: &str = "SELECT * FROM tags";
const LIVESTREAM_BY_ID: &str = "SELECT * FROM livestreams WHERE id = ?";

/// The process-local entity caches
///
/// Each lookup takes the caller's open database handle, usually the request's
/// transaction. A hit returns a copy without touching the database; a miss
/// queries through the handle and stores the row. Errors, not-found included,
/// are returned as-is and leave the cache untouched.
///
/// Concurrent misses for one key are not coalesced: each runs its own query
/// and the last store wins, which is fine since every stored value is a row
/// that was actually read.
///
/// Entries are never invalidated. The by-id and by-name user caches are
/// independent, and a row updated after it was cached keeps being served in
/// its cached form for the life of the process.
#[derive(Debug, Default)]
pub struct EntityCaches {
    users: LocalCache<i64, User>,
    users_by_name: LocalCache<String, User>,
    themes: LocalCache<i64, Theme>,
    tags: LocalCache<i64, Tag>,
    livestreams: LocalCache<i64, Livestream>,
}

impl EntityCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_user_by_id<D>(&self, db: &D, id: i64) -> Result<User, DomainError>
    where
        D: RowSource<User> + ?Sized,
    {
        if let Some(user) = self.users.load(&id) {
            return Ok(user);
        }

        debug!(user_id = id, "User cache miss");
        let user = db.fetch_one(USER_BY_ID, &[SqlValue::Int(id)]).await?;
        self.users.store(id, user.clone());

        Ok(user)
    }

    pub async fn get_user_by_name<D>(&self, db: &D, name: &str) -> Result<User, DomainError>
    where
        D: RowSource<User> + ?Sized,
    {
        if let Some(user) = self.users_by_name.load(name) {
            return Ok(user);
        }

        debug!(user_name = %name, "User-by-name cache miss");
        let user = db.fetch_one(USER_BY_NAME, &[SqlValue::from(name)]).await?;
        self.users_by_name.store(name.to_string(), user.clone());

        Ok(user)
    }

    pub async fn get_theme_by_user_id<D>(&self, db: &D, user_id: i64) -> Result<Theme, DomainError>
    where
        D: RowSource<Theme> + ?Sized,
    {
        if let Some(theme) = self.themes.load(&user_id) {
            return Ok(theme);
        }

        debug!(user_id, "Theme cache miss");
        let theme = db.fetch_one(THEME_BY_USER_ID, &[SqlValue::Int(user_id)]).await?;
        self.themes.store(user_id, theme.clone());

        Ok(theme)
    }

    /// Looks a tag up by id
    ///
    /// The miss path selects every row matching `id` and caches each one
    /// under its own id; the first row is the answer. No rows is a
    /// not-found error.
    pub async fn get_tag_by_id<D>(&self, db: &D, id: i64) -> Result<Tag, DomainError>
    where
        D: RowSource<Tag> + ?Sized,
    {
        if let Some(tag) = self.tags.load(&id) {
            return Ok(tag);
        }

        debug!(tag_id = id, "Tag cache miss");
        let rows = db.fetch_all(TAGS_BY_ID, &[SqlValue::Int(id)]).await?;

        let first = rows
            .first()
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Tag {} not found", id)))?;

        for tag in rows {
            self.tags.store(tag.id, tag);
        }

        Ok(first)
    }

    pub async fn get_livestream_by_id<D>(&self, db: &D, id: i64) -> Result<Livestream, DomainError>
    where
        D: RowSource<Livestream> + ?Sized,
    {
        if let Some(livestream) = self.livestreams.load(&id) {
            return Ok(livestream);
        }

        debug!(livestream_id = id, "Livestream cache miss");
        let livestream = db.fetch_one(LIVESTREAM_BY_ID, &[SqlValue::Int(id)]).await?;
        self.livestreams.store(id, livestream.clone());

        Ok(livestream)
    }

    /// Loads the whole tag table into the tag cache, returning the row count
    pub async fn preload_tags<D>(&self, db: &D) -> Result<usize, DomainError>
    where
        D: RowSource<Tag> + ?Sized,
    {
        let rows = db.fetch_all(ALL_TAGS, &[]).await?;
        let count = rows.len();

        for tag in rows {
            self.tags.store(tag.id, tag);
        }

        debug!(count, "Preloaded tag cache");
        Ok(count)
    }

    /// Every tag currently cached, ordered by id
    pub fn cached_tags(&self) -> Vec<Tag> {
        let mut tags = self.tags.values();
        tags.sort_by_key(|tag| tag.id);
        tags
    }

    pub fn users(&self) -> &LocalCache<i64, User> {
        &self.users
    }

    pub fn users_by_name(&self) -> &LocalCache<String, User> {
        &self.users_by_name
    }

    pub fn themes(&self) -> &LocalCache<i64, Theme> {
        &self.themes
    }

    pub fn tags(&self) -> &LocalCache<i64, Tag> {
        &self.tags
    }

    pub fn livestreams(&self) -> &LocalCache<i64, Livestream> {
        &self.livestreams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::storage::mock::{MockDatabase, MockTable};

    fn user(id: i64, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            display_name: name.to_uppercase(),
            description: String::new(),
            password: "hash".to_string(),
        }
    }

    fn tag(id: i64, name: &str) -> Tag {
        Tag {
            id,
            name: name.to_string(),
        }
    }

    fn livestream(id: i64, user_id: i64) -> Livestream {
        Livestream {
            id,
            user_id,
            title: format!("stream {}", id),
            description: String::new(),
            playlist_url: format!("https://media.example/{}.m3u8", id),
            thumbnail_url: format!("https://media.example/{}.jpg", id),
            start_at: 1_711_900_800,
            end_at: 1_711_904_400,
        }
    }

    #[tokio::test]
    async fn test_user_by_id_miss_then_hit() {
        let db = MockDatabase {
            users: MockTable::new().with_row(user(7, "alice")),
            ..Default::default()
        };
        let caches = EntityCaches::new();

        let first = caches.get_user_by_id(&db, 7).await.unwrap();
        let second = caches.get_user_by_id(&db, 7).await.unwrap();

        assert_eq!(first, user(7, "alice"));
        assert_eq!(second, first);
        assert_eq!(db.users.queries(), 1);
    }

    #[tokio::test]
    async fn test_user_not_found_is_not_cached() {
        let db = MockDatabase::new();
        let caches = EntityCaches::new();

        let result = caches.get_user_by_id(&db, 404).await;
        assert!(result.unwrap_err().is_not_found());
        assert!(caches.users().is_empty());

        let _ = caches.get_user_by_id(&db, 404).await;
        assert_eq!(db.users.queries(), 2);
    }

    #[tokio::test]
    async fn test_database_error_propagates_unchanged() {
        let db = MockDatabase::new();
        db.themes.fail_with(DomainError::storage("Lost connection to MySQL server"));
        let caches = EntityCaches::new();

        let result = caches.get_theme_by_user_id(&db, 7).await;
        assert_eq!(
            result,
            Err(DomainError::storage("Lost connection to MySQL server"))
        );
        assert!(caches.themes().is_empty());
    }

    #[tokio::test]
    async fn test_theme_keyed_by_user_id() {
        let db = MockDatabase {
            themes: MockTable::new().with_row(Theme {
                id: 3,
                user_id: 7,
                dark_mode: true,
            }),
            ..Default::default()
        };
        let caches = EntityCaches::new();

        let theme = caches.get_theme_by_user_id(&db, 7).await.unwrap();
        assert_eq!(theme.id, 3);
        assert!(caches.themes().load(&7).is_some());
        assert!(caches.themes().load(&3).is_none());
    }

    #[tokio::test]
    async fn test_tag_bulk_load_seeds_cache() {
        let db = MockDatabase {
            tags: MockTable::new().with_row(tag(42, "rust")),
            ..Default::default()
        };
        let caches = EntityCaches::new();

        let found = caches.get_tag_by_id(&db, 42).await.unwrap();
        assert_eq!(found, tag(42, "rust"));
        assert_eq!(caches.tags().load(&42), Some(tag(42, "rust")));

        caches.get_tag_by_id(&db, 42).await.unwrap();
        assert_eq!(db.tags.queries(), 1);
    }

    #[tokio::test]
    async fn test_tag_zero_rows_is_not_found() {
        let db = MockDatabase {
            tags: MockTable::new().with_row(tag(42, "rust")),
            ..Default::default()
        };
        let caches = EntityCaches::new();

        let result = caches.get_tag_by_id(&db, 999).await;
        assert!(result.unwrap_err().is_not_found());
        assert!(caches.tags().load(&999).is_none());
    }

    #[tokio::test]
    async fn test_preload_and_list_tags() {
        let db = MockDatabase {
            tags: MockTable::new()
                .with_row(tag(2, "game"))
                .with_row(tag(1, "rust")),
            ..Default::default()
        };
        let caches = EntityCaches::new();

        assert_eq!(caches.preload_tags(&db).await.unwrap(), 2);
        assert_eq!(caches.cached_tags(), vec![tag(1, "rust"), tag(2, "game")]);

        caches.get_tag_by_id(&db, 2).await.unwrap();
        assert_eq!(db.tags.queries(), 1);
    }

    #[tokio::test]
    async fn test_livestream_by_id() {
        let db = MockDatabase {
            livestreams: MockTable::new().with_row(livestream(1, 7)),
            ..Default::default()
        };
        let caches = EntityCaches::new();

        let found = caches.get_livestream_by_id(&db, 1).await.unwrap();
        assert_eq!(found, livestream(1, 7));
        assert_eq!(caches.livestreams().load(&1), Some(livestream(1, 7)));
    }

    #[tokio::test]
    async fn test_id_and_name_caches_diverge_after_update() {
        let db = MockDatabase {
            users: MockTable::new().with_row(user(7, "alice")),
            ..Default::default()
        };
        let caches = EntityCaches::new();

        caches.get_user_by_id(&db, 7).await.unwrap();
        db.users.upsert(User {
            display_name: "Alice Renamed".to_string(),
            ..user(7, "alice")
        });
        let by_name = caches.get_user_by_name(&db, "alice").await.unwrap();
        let by_id = caches.get_user_by_id(&db, 7).await.unwrap();

        // No invalidation: the id entry keeps the first snapshot
        assert_eq!(by_name.display_name, "Alice Renamed");
        assert_eq!(by_id.display_name, "ALICE");
    }

    #[tokio::test]
    async fn test_cached_theme_survives_row_update() {
        let db = MockDatabase {
            themes: MockTable::new().with_row(Theme {
                id: 3,
                user_id: 7,
                dark_mode: false,
            }),
            ..Default::default()
        };
        let caches = EntityCaches::new();

        caches.get_theme_by_user_id(&db, 7).await.unwrap();
        db.themes.upsert(Theme {
            id: 3,
            user_id: 7,
            dark_mode: true,
        });

        let theme = caches.get_theme_by_user_id(&db, 7).await.unwrap();
        assert!(!theme.dark_mode);
        assert_eq!(db.themes.queries(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lookups_all_return_the_row() {
        let db = Arc::new(MockDatabase {
            users: MockTable::new().with_row(user(7, "alice")),
            ..Default::default()
        });
        let caches = Arc::new(EntityCaches::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let db = Arc::clone(&db);
                let caches = Arc::clone(&caches);
                tokio::spawn(async move { caches.get_user_by_id(db.as_ref(), 7).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), user(7, "alice"));
        }

        // Misses are not coalesced, so anywhere between 1 and 16 queries ran
        let queries = db.users.queries();
        assert!((1..=16).contains(&queries));
        assert_eq!(caches.users().len(), 1);
    }
}
