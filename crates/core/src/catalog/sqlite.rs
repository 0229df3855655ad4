//! SQLite-backed movie catalog implementation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::{
    CatalogError, CatalogStats, CatalogWriter, Category, CategoryStore, Movie, UpsertOutcome,
};

const LAST_SYNCED_AT_KEY: &str = "last_synced_at";

const MOVIE_COLUMNS: &str = "m.id, m.title, m.release_date, m.rating, m.synopsis, \
                             m.poster_variants, m.backdrop_variants";

/// SQLite-backed movie catalog.
///
/// The single connection is the single writer: a [`CatalogWriter`] holds the
/// connection lock for the whole transaction, so reads and other writes wait
/// for it to commit or roll back.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Create a new SQLite catalog, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            -- One row per remote movie id
            CREATE TABLE IF NOT EXISTS movies (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                release_date TEXT NOT NULL,
                rating REAL NOT NULL,
                synopsis TEXT NOT NULL,
                poster_variants TEXT NOT NULL,
                backdrop_variants TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Category memberships; row id order is the remote ranking
            CREATE TABLE IF NOT EXISTS popular_movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_id INTEGER NOT NULL UNIQUE REFERENCES movies(id)
            );

            CREATE TABLE IF NOT EXISTS highest_rated_movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_id INTEGER NOT NULL UNIQUE REFERENCES movies(id)
            );

            CREATE TABLE IF NOT EXISTS favorite_movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                movie_id INTEGER NOT NULL UNIQUE REFERENCES movies(id)
            );

            -- Sync bookkeeping, written in the same transaction as the catalog
            CREATE TABLE IF NOT EXISTS sync_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Internal("catalog connection lock poisoned".to_string()))
    }

    /// Convert a row selected with `MOVIE_COLUMNS` to a Movie.
    fn row_to_movie(row: &rusqlite::Row) -> rusqlite::Result<Movie> {
        let poster_json: String = row.get(5)?;
        let backdrop_json: String = row.get(6)?;

        Ok(Movie {
            id: row.get(0)?,
            title: row.get(1)?,
            release_date: row.get(2)?,
            rating: row.get(3)?,
            synopsis: row.get(4)?,
            poster_variants: parse_variants(5, &poster_json)?,
            backdrop_variants: parse_variants(6, &backdrop_json)?,
        })
    }

    fn row_exists(conn: &Connection, movie_id: u32) -> Result<bool, CatalogError> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM movies WHERE id = ?",
                params![movie_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    fn favorite_exists(conn: &Connection, movie_id: u32) -> Result<bool, CatalogError> {
        let favorite = conn
            .query_row(
                "SELECT 1 FROM favorite_movies WHERE movie_id = ?",
                params![movie_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(favorite)
    }

    fn count(conn: &Connection, table: &str) -> Result<u64, CatalogError> {
        let count: u64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    fn load_last_synced_at(conn: &Connection) -> Result<Option<DateTime<Utc>>, CatalogError> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM sync_state WHERE key = ?",
                params![LAST_SYNCED_AT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value.and_then(|s| match DateTime::parse_from_rfc3339(&s) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(e) => {
                warn!("Ignoring unreadable last sync time '{}': {}", s, e);
                None
            }
        }))
    }
}

fn parse_variants(idx: usize, json: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn encode_variants(variants: &[String]) -> Result<String, CatalogError> {
    serde_json::to_string(variants).map_err(|e| CatalogError::Internal(e.to_string()))
}

/// A write transaction holding the catalog connection.
struct SqliteWriteBatch<'a> {
    conn: MutexGuard<'a, Connection>,
    committed: bool,
}

impl<'a> SqliteWriteBatch<'a> {
    fn begin(conn: MutexGuard<'a, Connection>) -> Result<Self, CatalogError> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            conn,
            committed: false,
        })
    }
}

impl Drop for SqliteWriteBatch<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        debug!("Rolling back uncommitted catalog batch");
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!("Failed to roll back catalog batch: {}", e);
        }
    }
}

impl CatalogWriter for SqliteWriteBatch<'_> {
    fn upsert_movie(&mut self, movie: &Movie) -> Result<UpsertOutcome, CatalogError> {
        let existed = SqliteCatalog::row_exists(&self.conn, movie.id)?;

        self.conn.execute(
            "INSERT INTO movies (id, title, release_date, rating, synopsis, poster_variants, backdrop_variants, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                release_date = excluded.release_date,
                rating = excluded.rating,
                synopsis = excluded.synopsis,
                poster_variants = excluded.poster_variants,
                backdrop_variants = excluded.backdrop_variants,
                updated_at = excluded.updated_at",
            params![
                movie.id,
                &movie.title,
                &movie.release_date,
                movie.rating,
                &movie.synopsis,
                encode_variants(&movie.poster_variants)?,
                encode_variants(&movie.backdrop_variants)?,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn add_membership(
        &mut self,
        category: Category,
        movie_id: u32,
    ) -> Result<bool, CatalogError> {
        if !SqliteCatalog::row_exists(&self.conn, movie_id)? {
            return Err(CatalogError::ReferentialIntegrity { category, movie_id });
        }

        let inserted = self.conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (movie_id) VALUES (?)",
                category.table_name()
            ),
            params![movie_id],
        )?;

        Ok(inserted > 0)
    }

    fn remove_membership(
        &mut self,
        category: Category,
        movie_id: u32,
    ) -> Result<bool, CatalogError> {
        let removed = self.conn.execute(
            &format!("DELETE FROM {} WHERE movie_id = ?", category.table_name()),
            params![movie_id],
        )?;

        Ok(removed > 0)
    }

    fn clear_category(&mut self, category: Category) -> Result<u64, CatalogError> {
        let cleared = self
            .conn
            .execute(&format!("DELETE FROM {}", category.table_name()), [])?;
        Ok(cleared as u64)
    }

    fn delete_orphan_movies_except(&mut self, keep: &[u32]) -> Result<u64, CatalogError> {
        let keep: HashSet<u32> = keep.iter().copied().collect();

        let orphans: Vec<u32> = {
            let mut stmt = self.conn.prepare(
                "SELECT id FROM movies
                 WHERE id NOT IN (SELECT movie_id FROM popular_movies)
                   AND id NOT IN (SELECT movie_id FROM highest_rated_movies)
                   AND id NOT IN (SELECT movie_id FROM favorite_movies)",
            )?;
            let rows = stmt.query_map([], |row| row.get::<_, u32>(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let mut delete = self.conn.prepare("DELETE FROM movies WHERE id = ?")?;
        let mut deleted = 0;
        for id in orphans.into_iter().filter(|id| !keep.contains(id)) {
            deleted += delete.execute([id])? as u64;
        }
        Ok(deleted)
    }

    fn is_favorite(&self, movie_id: u32) -> Result<bool, CatalogError> {
        SqliteCatalog::favorite_exists(&self.conn, movie_id)
    }

    fn movie_exists(&self, movie_id: u32) -> Result<bool, CatalogError> {
        SqliteCatalog::row_exists(&self.conn, movie_id)
    }

    fn set_last_synced_at(&mut self, at: DateTime<Utc>) -> Result<(), CatalogError> {
        self.conn.execute(
            "INSERT INTO sync_state (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![LAST_SYNCED_AT_KEY, at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<(), CatalogError> {
        self.conn.execute_batch("COMMIT")?;
        self.committed = true;
        Ok(())
    }
}

impl CategoryStore for SqliteCatalog {
    fn begin(&self) -> Result<Box<dyn CatalogWriter + '_>, CatalogError> {
        let conn = self.lock()?;
        Ok(Box::new(SqliteWriteBatch::begin(conn)?))
    }

    fn list_members(&self, category: Category) -> Result<Vec<Movie>, CatalogError> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {}
             FROM {} c
             INNER JOIN movies m ON c.movie_id = m.id
             ORDER BY c.id ASC",
            MOVIE_COLUMNS,
            category.table_name()
        ))?;

        let rows = stmt.query_map([], Self::row_to_movie)?;

        let mut movies = Vec::new();
        for row in rows {
            movies.push(row?);
        }
        Ok(movies)
    }

    fn get_movie(&self, movie_id: u32) -> Result<Movie, CatalogError> {
        let conn = self.lock()?;

        conn.query_row(
            &format!("SELECT {} FROM movies m WHERE m.id = ?", MOVIE_COLUMNS),
            params![movie_id],
            Self::row_to_movie,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                CatalogError::NotFound(format!("movie {}", movie_id))
            }
            _ => CatalogError::Database(e.to_string()),
        })
    }

    fn is_favorite(&self, movie_id: u32) -> Result<bool, CatalogError> {
        let conn = self.lock()?;
        Self::favorite_exists(&conn, movie_id)
    }

    fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>, CatalogError> {
        let conn = self.lock()?;
        Self::load_last_synced_at(&conn)
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let conn = self.lock()?;

        Ok(CatalogStats {
            total_movies: Self::count(&conn, "movies")?,
            popular: Self::count(&conn, Category::Popular.table_name())?,
            highest_rated: Self::count(&conn, Category::HighestRated.table_name())?,
            favorites: Self::count(&conn, Category::Favorite.table_name())?,
            last_synced_at: Self::load_last_synced_at(&conn)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_catalog() -> SqliteCatalog {
        SqliteCatalog::in_memory().unwrap()
    }

    fn create_test_movie(id: u32, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            release_date: "2017-03-16".to_string(),
            rating: 7.1,
            synopsis: format!("{} synopsis", title),
            poster_variants: vec![
                "https://image.tmdb.org/t/p/w185/poster.jpg".to_string(),
                "https://image.tmdb.org/t/p/original/poster.jpg".to_string(),
            ],
            backdrop_variants: vec!["https://image.tmdb.org/t/p/w780/backdrop.jpg".to_string()],
        }
    }

    fn ids(movies: &[Movie]) -> Vec<u32> {
        movies.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_upsert_new_movie() {
        let catalog = create_test_catalog();

        let outcome = catalog.upsert_movie(&create_test_movie(1, "Logan")).unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let movie = catalog.get_movie(1).unwrap();
        assert_eq!(movie, create_test_movie(1, "Logan"));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let catalog = create_test_catalog();
        let movie = create_test_movie(1, "Logan");

        catalog.upsert_movie(&movie).unwrap();
        let outcome = catalog.upsert_movie(&movie).unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let stats = catalog.stats().unwrap();
        assert_eq!(stats.total_movies, 1);
        assert_eq!(catalog.get_movie(1).unwrap(), movie);
    }

    #[test]
    fn test_upsert_overwrites_fields_but_keeps_identity() {
        let catalog = create_test_catalog();
        catalog.upsert_movie(&create_test_movie(1, "Logan")).unwrap();

        let mut refreshed = create_test_movie(1, "Logan (2017)");
        refreshed.rating = 8.4;
        refreshed.poster_variants = vec![];
        catalog.upsert_movie(&refreshed).unwrap();

        let movie = catalog.get_movie(1).unwrap();
        assert_eq!(movie.title, "Logan (2017)");
        assert_eq!(movie.rating, 8.4);
        assert!(movie.poster_variants.is_empty());
        assert_eq!(catalog.stats().unwrap().total_movies, 1);
    }

    #[test]
    fn test_upsert_keeps_memberships() {
        let catalog = create_test_catalog();
        catalog.upsert_movie(&create_test_movie(1, "Logan")).unwrap();
        catalog.add_membership(Category::Favorite, 1).unwrap();

        catalog
            .upsert_movie(&create_test_movie(1, "Logan (2017)"))
            .unwrap();

        assert!(CategoryStore::is_favorite(&catalog, 1).unwrap());
    }

    #[test]
    fn test_add_membership_requires_movie_row() {
        let catalog = create_test_catalog();

        let result = catalog.add_membership(Category::Popular, 99);
        assert!(matches!(
            result,
            Err(CatalogError::ReferentialIntegrity {
                category: Category::Popular,
                movie_id: 99
            })
        ));
        assert!(catalog.list_members(Category::Popular).unwrap().is_empty());
    }

    #[test]
    fn test_add_membership_twice_is_noop() {
        let catalog = create_test_catalog();
        catalog.upsert_movie(&create_test_movie(1, "Logan")).unwrap();

        assert!(catalog.add_membership(Category::Popular, 1).unwrap());
        assert!(!catalog.add_membership(Category::Popular, 1).unwrap());
        assert_eq!(catalog.list_members(Category::Popular).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_membership_absent_is_noop() {
        let catalog = create_test_catalog();
        catalog.upsert_movie(&create_test_movie(1, "Logan")).unwrap();

        assert!(!catalog.remove_membership(Category::Favorite, 1).unwrap());
        assert!(!catalog.remove_membership(Category::Favorite, 42).unwrap());
    }

    #[test]
    fn test_list_members_preserves_insertion_order() {
        let catalog = create_test_catalog();
        for (id, title) in [(30, "C"), (10, "A"), (20, "B")] {
            catalog.upsert_movie(&create_test_movie(id, title)).unwrap();
            catalog.add_membership(Category::HighestRated, id).unwrap();
        }

        let members = catalog.list_members(Category::HighestRated).unwrap();
        assert_eq!(ids(&members), vec![30, 10, 20]);
        assert_eq!(members[0].title, "C");
    }

    #[test]
    fn test_clear_category_keeps_movies_and_other_categories() {
        let catalog = create_test_catalog();
        catalog.upsert_movie(&create_test_movie(1, "Logan")).unwrap();
        catalog.add_membership(Category::Popular, 1).unwrap();
        catalog.add_membership(Category::HighestRated, 1).unwrap();

        let cleared = catalog.clear_category(Category::Popular).unwrap();
        assert_eq!(cleared, 1);

        assert!(catalog.list_members(Category::Popular).unwrap().is_empty());
        assert_eq!(catalog.list_members(Category::HighestRated).unwrap().len(), 1);
        assert!(catalog.get_movie(1).is_ok());
    }

    #[test]
    fn test_delete_orphans_spares_favorites() {
        let catalog = create_test_catalog();
        for id in [1, 2, 3] {
            catalog
                .upsert_movie(&create_test_movie(id, &format!("Movie {}", id)))
                .unwrap();
        }
        catalog.add_membership(Category::Popular, 1).unwrap();
        catalog.add_membership(Category::Favorite, 2).unwrap();

        let deleted = catalog.delete_orphan_movies().unwrap();
        assert_eq!(deleted, 1);

        assert!(catalog.get_movie(1).is_ok());
        assert!(catalog.get_movie(2).is_ok());
        assert!(matches!(
            catalog.get_movie(3),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_orphans_except_keeps_listed_ids() {
        let catalog = create_test_catalog();
        for id in [1, 2, 3] {
            catalog
                .upsert_movie(&create_test_movie(id, &format!("Movie {}", id)))
                .unwrap();
        }

        let mut writer = catalog.begin().unwrap();
        let deleted = writer.delete_orphan_movies_except(&[1, 3, 99]).unwrap();
        writer.commit().unwrap();

        assert_eq!(deleted, 1);
        assert!(catalog.get_movie(1).is_ok());
        assert!(catalog.get_movie(2).is_err());
        assert!(catalog.get_movie(3).is_ok());
    }

    #[test]
    fn test_dropped_batch_rolls_back() {
        let catalog = create_test_catalog();
        catalog.upsert_movie(&create_test_movie(1, "Logan")).unwrap();
        catalog.add_membership(Category::Popular, 1).unwrap();

        {
            let mut writer = catalog.begin().unwrap();
            writer.clear_category(Category::Popular).unwrap();
            writer.delete_orphan_movies().unwrap();
            writer.upsert_movie(&create_test_movie(2, "Split")).unwrap();
            // dropped without commit
        }

        assert_eq!(ids(&catalog.list_members(Category::Popular).unwrap()), vec![1]);
        assert!(catalog.get_movie(1).is_ok());
        assert!(catalog.get_movie(2).is_err());
    }

    #[test]
    fn test_writer_sees_its_own_writes() {
        let catalog = create_test_catalog();

        let mut writer = catalog.begin().unwrap();
        writer.upsert_movie(&create_test_movie(7, "Get Out")).unwrap();
        assert!(writer.movie_exists(7).unwrap());
        writer.add_membership(Category::Favorite, 7).unwrap();
        assert!(writer.is_favorite(7).unwrap());
        writer.commit().unwrap();

        assert!(CategoryStore::is_favorite(&catalog, 7).unwrap());
    }

    #[test]
    fn test_last_synced_at_round_trip() {
        let catalog = create_test_catalog();
        assert!(catalog.last_synced_at().unwrap().is_none());

        let now = Utc::now();
        let mut writer = catalog.begin().unwrap();
        writer.set_last_synced_at(now).unwrap();
        writer.commit().unwrap();

        let stored = catalog.last_synced_at().unwrap().unwrap();
        assert_eq!(stored.timestamp(), now.timestamp());
    }

    #[test]
    fn test_stats() {
        let catalog = create_test_catalog();

        let stats = catalog.stats().unwrap();
        assert_eq!(stats.total_movies, 0);
        assert!(stats.last_synced_at.is_none());

        catalog.upsert_movie(&create_test_movie(1, "Logan")).unwrap();
        catalog.upsert_movie(&create_test_movie(2, "Split")).unwrap();
        catalog.add_membership(Category::Popular, 1).unwrap();
        catalog.add_membership(Category::Popular, 2).unwrap();
        catalog.add_membership(Category::HighestRated, 1).unwrap();
        catalog.add_membership(Category::Favorite, 2).unwrap();

        let stats = catalog.stats().unwrap();
        assert_eq!(stats.total_movies, 2);
        assert_eq!(stats.popular, 2);
        assert_eq!(stats.highest_rated, 1);
        assert_eq!(stats.favorites, 1);
    }

    #[test]
    fn test_catalog_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("movies.db");

        {
            let catalog = SqliteCatalog::new(&path).unwrap();
            catalog.upsert_movie(&create_test_movie(42, "Arrival")).unwrap();
            catalog.add_membership(Category::Favorite, 42).unwrap();
        }

        let catalog = SqliteCatalog::new(&path).unwrap();
        let favorites = catalog.list_members(Category::Favorite).unwrap();
        assert_eq!(ids(&favorites), vec![42]);
        assert_eq!(favorites[0].title, "Arrival");
    }
}
