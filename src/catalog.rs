//! Excuse catalog.
//!
//! Persistence-facing operations over an [`ExcuseStore`]. Generation takes one
//! [`ContentPool`](crate::pool::ContentPool) snapshot, runs the composer on it
//! and persists the result. Reads go through [`ExcuseCatalog::resolve`], which
//! looks every reference up again and yields `None` for records that were
//! deleted since.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::composer::{fresh_seed, ComposeError, ExcuseComposer, ExcuseDraft, GenerationMode};
use crate::role::Role;
use crate::store::ExcuseStore;
use crate::types::{
    Excuse, ExcuseId, ExcuseType, Fragment, FragmentId, FragmentKind, LawId, MemeId,
    ResolvedExcuse,
};

/// Error type for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Composition failed.
    #[error(transparent)]
    Compose(#[from] ComposeError),
    /// Store error.
    #[error("Store error: {0}")]
    Store(String),
}

impl CatalogError {
    /// Create a store error from any error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::Store(e.to_string())
    }
}

/// Explicit parts for a manually constructed excuse.
///
/// Every id is optional and looked up best effort: ids that do not resolve
/// are left unset on the stored excuse instead of failing the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualExcuse {
    /// Context fragment.
    pub context_id: Option<FragmentId>,
    /// Cause fragment.
    pub cause_id: Option<FragmentId>,
    /// Consequence fragment.
    pub consequence_id: Option<FragmentId>,
    /// Recommendation fragment.
    pub recommendation_id: Option<FragmentId>,
    /// Meme to attach.
    pub meme_id: Option<MemeId>,
    /// Law to attach.
    pub law_id: Option<LawId>,
    /// Excuse type, `SIMPLE` when unset.
    #[serde(rename = "type")]
    pub excuse_type: Option<ExcuseType>,
    /// Role the excuse is meant for.
    pub role: Option<Role>,
    /// Seed to record, a fresh one when unset.
    pub seed: Option<i64>,
}

impl ManualExcuse {
    fn fragment_id(&self, kind: FragmentKind) -> Option<FragmentId> {
        match kind {
            FragmentKind::Context => self.context_id,
            FragmentKind::Cause => self.cause_id,
            FragmentKind::Consequence => self.consequence_id,
            FragmentKind::Recommendation => self.recommendation_id,
        }
    }
}

/// Generates, persists and reads back excuses.
pub struct ExcuseCatalog<S: ExcuseStore> {
    store: Arc<S>,
}

impl<S: ExcuseStore> Clone for ExcuseCatalog<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<S: ExcuseStore + 'static> ExcuseCatalog<S> {
    /// Create a catalog over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Compose an excuse with `mode` and persist it.
    pub async fn create(&self, mode: GenerationMode) -> Result<ResolvedExcuse, CatalogError> {
        let pool = self.store.content_pool().await.map_err(CatalogError::from_store)?;
        // thread_rng is not Send, so the draw must finish before the next await
        let draft = ExcuseComposer::new(&pool).compose(mode)?;
        self.persist(draft).await
    }

    /// Compose an excuse for the role named by `token` and persist it.
    ///
    /// An unknown token fails before the store is read.
    pub async fn create_by_role(&self, token: &str) -> Result<ResolvedExcuse, CatalogError> {
        let mode = GenerationMode::by_role(token)?;
        self.create(mode).await
    }

    /// Compose and persist the excuse of a given day.
    pub async fn create_daily_for(&self, date: NaiveDate) -> Result<ResolvedExcuse, CatalogError> {
        let pool = self.store.content_pool().await.map_err(CatalogError::from_store)?;
        let draft = ExcuseComposer::new(&pool).compose_daily_for(date)?;
        self.persist(draft).await
    }

    /// Build an excuse from explicit parts and persist it.
    ///
    /// Never fails on unknown ids; only store errors are reported.
    pub async fn create_manual(&self, manual: ManualExcuse) -> Result<ResolvedExcuse, CatalogError> {
        let mut fragments: [Option<Fragment>; 4] = Default::default();
        for (slot, kind) in fragments.iter_mut().zip(FragmentKind::DRAW_ORDER) {
            *slot = self.lookup_fragment(manual.fragment_id(kind)).await?;
        }
        let meme = match manual.meme_id {
            Some(id) => self.store.get_meme(&id).await.map_err(CatalogError::from_store)?,
            None => None,
        };
        let law = match manual.law_id {
            Some(id) => self.store.get_law(&id).await.map_err(CatalogError::from_store)?,
            None => None,
        };

        let [context, cause, consequence, recommendation] = fragments;
        let excuse = Excuse {
            id: ExcuseId::generate(),
            context: context.as_ref().map(|f| f.id),
            cause: cause.as_ref().map(|f| f.id),
            consequence: consequence.as_ref().map(|f| f.id),
            recommendation: recommendation.as_ref().map(|f| f.id),
            meme: meme.as_ref().map(|m| m.id),
            law: law.as_ref().map(|l| l.id),
            excuse_type: manual.excuse_type.unwrap_or_default(),
            role: manual.role,
            seed: manual.seed.unwrap_or_else(fresh_seed),
            created_at: Utc::now(),
            updated_at: None,
        };

        self.store.insert_excuse(&excuse).await.map_err(CatalogError::from_store)?;
        info!(
            excuse_id = %excuse.id,
            excuse_type = %excuse.excuse_type,
            "Stored manual excuse"
        );

        Ok(ResolvedExcuse { excuse, context, cause, consequence, recommendation, meme, law })
    }

    /// Fetch an excuse by id, resolved.
    pub async fn find_by_id(&self, id: &ExcuseId) -> Result<Option<ResolvedExcuse>, CatalogError> {
        let excuse = self.store.get_excuse(id).await.map_err(CatalogError::from_store)?;
        match excuse {
            Some(excuse) => Ok(Some(self.resolve(excuse).await?)),
            None => Ok(None),
        }
    }

    /// Every stored excuse, resolved, oldest first.
    pub async fn list_all(&self) -> Result<Vec<ResolvedExcuse>, CatalogError> {
        let excuses = self.store.list_excuses().await.map_err(CatalogError::from_store)?;
        let mut resolved = Vec::with_capacity(excuses.len());
        for excuse in excuses {
            resolved.push(self.resolve(excuse).await?);
        }
        Ok(resolved)
    }

    /// Look up every record an excuse references.
    ///
    /// References to deleted records resolve to `None`; the excuse itself is
    /// returned unchanged.
    pub async fn resolve(&self, excuse: Excuse) -> Result<ResolvedExcuse, CatalogError> {
        let context = self.lookup_fragment(excuse.context).await?;
        let cause = self.lookup_fragment(excuse.cause).await?;
        let consequence = self.lookup_fragment(excuse.consequence).await?;
        let recommendation = self.lookup_fragment(excuse.recommendation).await?;
        let meme = match excuse.meme {
            Some(id) => self.store.get_meme(&id).await.map_err(CatalogError::from_store)?,
            None => None,
        };
        let law = match excuse.law {
            Some(id) => self.store.get_law(&id).await.map_err(CatalogError::from_store)?,
            None => None,
        };

        let resolved = ResolvedExcuse { excuse, context, cause, consequence, recommendation, meme, law };
        if resolved.has_dangling_refs() {
            debug!(excuse_id = %resolved.excuse.id, "Excuse references deleted content");
        }
        Ok(resolved)
    }

    async fn lookup_fragment(&self, id: Option<FragmentId>) -> Result<Option<Fragment>, CatalogError> {
        match id {
            Some(id) => self.store.get_fragment(&id).await.map_err(CatalogError::from_store),
            None => Ok(None),
        }
    }

    async fn persist(&self, draft: ExcuseDraft) -> Result<ResolvedExcuse, CatalogError> {
        let resolved = draft.into_resolved();
        self.store
            .insert_excuse(&resolved.excuse)
            .await
            .map_err(CatalogError::from_store)?;
        info!(
            excuse_id = %resolved.excuse.id,
            excuse_type = %resolved.excuse.excuse_type,
            role = ?resolved.excuse.role,
            seed = resolved.excuse.seed,
            "Stored excuse"
        );
        Ok(resolved)
    }
}
