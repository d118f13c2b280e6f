//! Shared service state.

use std::sync::Arc;
use std::time::Instant;

use crate::catalog::ExcuseCatalog;
use crate::content::ContentCatalog;
use crate::store::ExcuseStore;

/// Shared service state.
///
/// One store instance backs both the excuse catalog and content management.
pub struct ServiceState<S: ExcuseStore> {
    /// The store backend.
    pub store: Arc<S>,
    /// Excuse generation and lookup.
    pub catalog: ExcuseCatalog<S>,
    /// Fragment, meme and law management.
    pub content: ContentCatalog<S>,
    started_at: Instant,
}

impl<S: ExcuseStore + 'static> ServiceState<S> {
    /// Create service state over a store.
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Create service state over an already shared store.
    pub fn from_arc(store: Arc<S>) -> Self {
        Self {
            catalog: ExcuseCatalog::new(Arc::clone(&store)),
            content: ContentCatalog::new(Arc::clone(&store)),
            store,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl<S: ExcuseStore> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalog: self.catalog.clone(),
            content: self.content.clone(),
            started_at: self.started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::GenerationMode;
    use crate::store::InMemoryStore;
    use crate::types::{Fragment, FragmentKind};

    #[tokio::test]
    async fn test_catalog_and_content_share_the_store() {
        let state = ServiceState::new(InMemoryStore::new());
        for kind in FragmentKind::DRAW_ORDER {
            state.store.add_fragment(Fragment::new(kind, format!("some {} text", kind), None));
        }

        let created = state.catalog.create(GenerationMode::Simple).await.unwrap();
        assert_eq!(state.store.num_excuses(), 1);

        let clone = state.clone();
        let context = created.excuse.context.unwrap();
        clone.content.delete_fragment(&context).await.unwrap();

        let found = state.catalog.find_by_id(&created.excuse.id).await.unwrap().unwrap();
        assert!(found.context.is_none());
    }
}
