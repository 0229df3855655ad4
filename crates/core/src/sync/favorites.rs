//! Favorite toggling.

use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::{CatalogError, Category, CategoryStore};
use crate::metrics;

use super::types::FavoriteState;

/// Flips movies in and out of the favorite category.
///
/// Each change is one write batch, so it serializes with a running sync
/// instead of interleaving with it. Unfavoriting never deletes the movie row:
/// a movie that is in neither ranked list is evicted by the next sync.
pub struct FavoriteToggle {
    store: Arc<dyn CategoryStore>,
}

impl FavoriteToggle {
    pub fn new(store: Arc<dyn CategoryStore>) -> Self {
        Self { store }
    }

    pub fn is_favorite(&self, movie_id: u32) -> Result<bool, CatalogError> {
        self.store.is_favorite(movie_id)
    }

    /// Flip the favorite state of a movie and return the new state.
    ///
    /// Favoriting a movie that is not in the catalog fails with
    /// [`CatalogError::ReferentialIntegrity`] and changes nothing.
    pub fn toggle(&self, movie_id: u32) -> Result<FavoriteState, CatalogError> {
        self.apply(movie_id, None)
    }

    /// Set the favorite state explicitly. Setting the current state is a no-op.
    pub fn set(&self, movie_id: u32, favorite: bool) -> Result<FavoriteState, CatalogError> {
        self.apply(movie_id, Some(favorite))
    }

    fn apply(&self, movie_id: u32, target: Option<bool>) -> Result<FavoriteState, CatalogError> {
        let result = self.write(movie_id, target);

        match &result {
            Ok(state) => {
                metrics::FAVORITE_TOGGLES
                    .with_label_values(&[state.as_str()])
                    .inc();
            }
            Err(e) => {
                metrics::FAVORITE_TOGGLES.with_label_values(&["failed"]).inc();
                warn!("Failed to change favorite state of movie {}: {}", movie_id, e);
            }
        }

        result
    }

    fn write(&self, movie_id: u32, target: Option<bool>) -> Result<FavoriteState, CatalogError> {
        let mut writer = self.store.begin()?;

        let current = writer.is_favorite(movie_id)?;
        let wanted = target.unwrap_or(!current);

        if wanted == current {
            return Ok(FavoriteState::from(current));
        }

        if wanted {
            writer.add_membership(Category::Favorite, movie_id)?;
        } else {
            writer.remove_membership(Category::Favorite, movie_id)?;
        }
        writer.commit()?;

        let state = FavoriteState::from(wanted);
        info!(movie_id, state = state.as_str(), "Favorite state changed");
        Ok(state)
    }
}
