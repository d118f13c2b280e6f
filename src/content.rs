//! Content management for fragments, memes and laws.
//!
//! Plain CRUD over a [`ContentStore`] with field validation. Deleting content
//! never touches excuses; they resolve the missing slot to `None` on read.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::role::Role;
use crate::store::ContentStore;
use crate::types::{
    Fragment, FragmentId, FragmentKind, FragmentPatch, Law, LawId, LawPatch, Meme, MemeId,
    MemePatch, NewFragment, NewLaw, NewMeme, ValidationError,
};

/// Error type for content operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// A field failed validation.
    #[error("Validation failed for {field}: {reason}")]
    Validation {
        /// Offending field.
        field: String,
        /// Reason.
        reason: String,
    },
    /// No record with this id.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Record kind.
        entity: &'static str,
        /// Requested id.
        id: String,
    },
    /// Store error.
    #[error("Store error: {0}")]
    Store(String),
}

impl ContentError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }

    fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }
}

impl From<ValidationError> for ContentError {
    fn from(e: ValidationError) -> Self {
        Self::Validation { field: e.field, reason: e.reason }
    }
}

/// Fragment list filter. Both fields are exact matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentFilter {
    /// Only this kind.
    pub kind: Option<FragmentKind>,
    /// Only fragments with exactly this affinity.
    pub role: Option<Role>,
}

/// Meme list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeFilter {
    /// Only this author.
    pub author: Option<String>,
}

/// Law list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawFilter {
    /// Only this category.
    pub category: Option<String>,
}

/// CRUD access to the content store.
pub struct ContentCatalog<S: ContentStore> {
    store: Arc<S>,
}

impl<S: ContentStore> Clone for ContentCatalog<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<S: ContentStore + 'static> ContentCatalog<S> {
    /// Create a content catalog over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // === Fragments ===

    /// Validate and store a new fragment.
    pub async fn create_fragment(&self, input: NewFragment) -> Result<Fragment, ContentError> {
        let fragment = input.validate()?;
        self.store.put_fragment(&fragment).await.map_err(ContentError::from_store)?;
        info!(fragment_id = %fragment.id, kind = %fragment.kind, "Created fragment");
        Ok(fragment)
    }

    /// Apply a partial update to a fragment.
    pub async fn update_fragment(
        &self,
        id: &FragmentId,
        patch: FragmentPatch,
    ) -> Result<Fragment, ContentError> {
        let mut fragment = self
            .get_fragment(id)
            .await?
            .ok_or_else(|| ContentError::not_found("Fragment", id))?;
        patch.apply(&mut fragment)?;
        self.store.put_fragment(&fragment).await.map_err(ContentError::from_store)?;
        info!(fragment_id = %id, "Updated fragment");
        Ok(fragment)
    }

    /// Delete a fragment.
    pub async fn delete_fragment(&self, id: &FragmentId) -> Result<(), ContentError> {
        if !self.store.delete_fragment(id).await.map_err(ContentError::from_store)? {
            return Err(ContentError::not_found("Fragment", id));
        }
        info!(fragment_id = %id, "Deleted fragment");
        Ok(())
    }

    /// Fetch a fragment.
    pub async fn get_fragment(&self, id: &FragmentId) -> Result<Option<Fragment>, ContentError> {
        self.store.get_fragment(id).await.map_err(ContentError::from_store)
    }

    /// List fragments matching a filter.
    pub async fn list_fragments(&self, filter: FragmentFilter) -> Result<Vec<Fragment>, ContentError> {
        let result = match (filter.kind, filter.role) {
            (Some(kind), Some(role)) => self.store.fragments_by_kind_and_role(kind, role).await,
            (Some(kind), None) => self.store.fragments_by_kind(kind).await,
            (None, Some(role)) => self.store.fragments_by_role(role).await,
            (None, None) => self.store.list_fragments().await,
        };
        result.map_err(ContentError::from_store)
    }

    // === Memes ===

    /// Validate and store a new meme.
    pub async fn create_meme(&self, input: NewMeme) -> Result<Meme, ContentError> {
        let meme = input.validate()?;
        self.store.put_meme(&meme).await.map_err(ContentError::from_store)?;
        info!(meme_id = %meme.id, "Created meme");
        Ok(meme)
    }

    /// Apply a partial update to a meme.
    pub async fn update_meme(&self, id: &MemeId, patch: MemePatch) -> Result<Meme, ContentError> {
        let mut meme = self
            .get_meme(id)
            .await?
            .ok_or_else(|| ContentError::not_found("Meme", id))?;
        patch.apply(&mut meme)?;
        self.store.put_meme(&meme).await.map_err(ContentError::from_store)?;
        info!(meme_id = %id, "Updated meme");
        Ok(meme)
    }

    /// Delete a meme.
    pub async fn delete_meme(&self, id: &MemeId) -> Result<(), ContentError> {
        if !self.store.delete_meme(id).await.map_err(ContentError::from_store)? {
            return Err(ContentError::not_found("Meme", id));
        }
        info!(meme_id = %id, "Deleted meme");
        Ok(())
    }

    /// Fetch a meme.
    pub async fn get_meme(&self, id: &MemeId) -> Result<Option<Meme>, ContentError> {
        self.store.get_meme(id).await.map_err(ContentError::from_store)
    }

    /// List memes matching a filter.
    pub async fn list_memes(&self, filter: &MemeFilter) -> Result<Vec<Meme>, ContentError> {
        let result = match &filter.author {
            Some(author) => self.store.memes_by_author(author).await,
            None => self.store.list_memes().await,
        };
        result.map_err(ContentError::from_store)
    }

    // === Laws ===

    /// Validate and store a new law.
    pub async fn create_law(&self, input: NewLaw) -> Result<Law, ContentError> {
        let law = input.validate()?;
        self.store.put_law(&law).await.map_err(ContentError::from_store)?;
        info!(law_id = %law.id, category = %law.category, "Created law");
        Ok(law)
    }

    /// Apply a partial update to a law.
    pub async fn update_law(&self, id: &LawId, patch: LawPatch) -> Result<Law, ContentError> {
        let mut law = self
            .get_law(id)
            .await?
            .ok_or_else(|| ContentError::not_found("Law", id))?;
        patch.apply(&mut law)?;
        self.store.put_law(&law).await.map_err(ContentError::from_store)?;
        info!(law_id = %id, "Updated law");
        Ok(law)
    }

    /// Delete a law.
    pub async fn delete_law(&self, id: &LawId) -> Result<(), ContentError> {
        if !self.store.delete_law(id).await.map_err(ContentError::from_store)? {
            return Err(ContentError::not_found("Law", id));
        }
        info!(law_id = %id, "Deleted law");
        Ok(())
    }

    /// Fetch a law.
    pub async fn get_law(&self, id: &LawId) -> Result<Option<Law>, ContentError> {
        self.store.get_law(id).await.map_err(ContentError::from_store)
    }

    /// List laws matching a filter.
    pub async fn list_laws(&self, filter: &LawFilter) -> Result<Vec<Law>, ContentError> {
        let result = match &filter.category {
            Some(category) => self.store.laws_by_category(category).await,
            None => self.store.list_laws().await,
        };
        result.map_err(ContentError::from_store)
    }
}
