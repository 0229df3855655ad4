//! Movie catalog - the local copy of the remote rankings plus user favorites.
//!
//! One movie table keyed by remote id and one membership table per category.
//! All writes go through a [`CatalogWriter`], which is a single atomic
//! transaction: readers never see a category half rebuilt.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::*;

use chrono::{DateTime, Utc};

/// An open write transaction on the catalog.
///
/// Dropping a writer without calling [`CatalogWriter::commit`] rolls back
/// everything written through it.
pub trait CatalogWriter {
    /// Insert the movie, or overwrite every non-identity field if the id exists.
    fn upsert_movie(&mut self, movie: &Movie) -> Result<UpsertOutcome, CatalogError>;

    /// Add a movie to a category.
    ///
    /// Fails with [`CatalogError::ReferentialIntegrity`] if the movie row is
    /// missing. Returns false if the membership already existed.
    fn add_membership(&mut self, category: Category, movie_id: u32)
        -> Result<bool, CatalogError>;

    /// Remove a movie from a category. Returns false if it was not a member.
    fn remove_membership(
        &mut self,
        category: Category,
        movie_id: u32,
    ) -> Result<bool, CatalogError>;

    /// Delete every membership of a category. Movie rows are left alone.
    fn clear_category(&mut self, category: Category) -> Result<u64, CatalogError>;

    /// Delete every movie with no membership in any category, except the
    /// ids in `keep`. Returns how many rows were deleted.
    fn delete_orphan_movies_except(&mut self, keep: &[u32]) -> Result<u64, CatalogError>;

    /// Delete every movie with no membership in any category.
    fn delete_orphan_movies(&mut self) -> Result<u64, CatalogError> {
        self.delete_orphan_movies_except(&[])
    }

    /// Check the favorite membership inside this transaction.
    fn is_favorite(&self, movie_id: u32) -> Result<bool, CatalogError>;

    /// Check whether a movie row exists inside this transaction.
    fn movie_exists(&self, movie_id: u32) -> Result<bool, CatalogError>;

    /// Record when the catalog was last refreshed from the remote service.
    fn set_last_synced_at(&mut self, at: DateTime<Utc>) -> Result<(), CatalogError>;

    /// Commit everything written through this writer.
    fn commit(self: Box<Self>) -> Result<(), CatalogError>;
}

/// Trait for movie catalog storage.
pub trait CategoryStore: Send + Sync {
    /// Open a write transaction. Blocks until no other writer is active.
    fn begin(&self) -> Result<Box<dyn CatalogWriter + '_>, CatalogError>;

    /// List the movies of a category in membership insertion order.
    fn list_members(&self, category: Category) -> Result<Vec<Movie>, CatalogError>;

    /// Get a specific movie by id.
    fn get_movie(&self, movie_id: u32) -> Result<Movie, CatalogError>;

    /// Check whether a movie is a favorite.
    fn is_favorite(&self, movie_id: u32) -> Result<bool, CatalogError>;

    /// When the last successful sync committed, if ever.
    fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>, CatalogError>;

    /// Get catalog statistics.
    fn stats(&self) -> Result<CatalogStats, CatalogError>;

    /// Single-statement shorthand for [`CatalogWriter::upsert_movie`].
    fn upsert_movie(&self, movie: &Movie) -> Result<UpsertOutcome, CatalogError> {
        let mut writer = self.begin()?;
        let outcome = writer.upsert_movie(movie)?;
        writer.commit()?;
        Ok(outcome)
    }

    /// Single-statement shorthand for [`CatalogWriter::add_membership`].
    fn add_membership(&self, category: Category, movie_id: u32) -> Result<bool, CatalogError> {
        let mut writer = self.begin()?;
        let added = writer.add_membership(category, movie_id)?;
        writer.commit()?;
        Ok(added)
    }

    /// Single-statement shorthand for [`CatalogWriter::remove_membership`].
    fn remove_membership(&self, category: Category, movie_id: u32) -> Result<bool, CatalogError> {
        let mut writer = self.begin()?;
        let removed = writer.remove_membership(category, movie_id)?;
        writer.commit()?;
        Ok(removed)
    }

    /// Single-statement shorthand for [`CatalogWriter::clear_category`].
    fn clear_category(&self, category: Category) -> Result<u64, CatalogError> {
        let mut writer = self.begin()?;
        let cleared = writer.clear_category(category)?;
        writer.commit()?;
        Ok(cleared)
    }

    /// Single-statement shorthand for [`CatalogWriter::delete_orphan_movies`].
    fn delete_orphan_movies(&self) -> Result<u64, CatalogError> {
        let mut writer = self.begin()?;
        let deleted = writer.delete_orphan_movies()?;
        writer.commit()?;
        Ok(deleted)
    }
}
