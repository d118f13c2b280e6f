//! Content and excuse storage backends.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

use crate::pool::ContentPool;
use crate::role::Role;
use crate::types::{Excuse, ExcuseId, Fragment, FragmentId, FragmentKind, Law, LawId, Meme, MemeId};

/// Trait for the content store: fragments, memes and laws.
///
/// Pure storage. List methods return records ordered by id.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the backend is reachable.
    async fn is_healthy(&self) -> bool {
        true
    }

    /// Take a consistent snapshot of all content for one compose call.
    async fn content_pool(&self) -> Result<ContentPool, Self::Error>;

    /// Fetch a fragment by ID.
    async fn get_fragment(&self, id: &FragmentId) -> Result<Option<Fragment>, Self::Error>;

    /// All fragments.
    async fn list_fragments(&self) -> Result<Vec<Fragment>, Self::Error>;

    /// Fragments of one kind.
    async fn fragments_by_kind(&self, kind: FragmentKind) -> Result<Vec<Fragment>, Self::Error>;

    /// Fragments of one kind with affinity exactly `role`.
    async fn fragments_by_kind_and_role(
        &self,
        kind: FragmentKind,
        role: Role,
    ) -> Result<Vec<Fragment>, Self::Error>;

    /// Fragments with affinity exactly `role`, any kind.
    async fn fragments_by_role(&self, role: Role) -> Result<Vec<Fragment>, Self::Error>;

    /// Insert or replace a fragment.
    async fn put_fragment(&self, fragment: &Fragment) -> Result<(), Self::Error>;

    /// Delete a fragment. Returns whether it existed.
    async fn delete_fragment(&self, id: &FragmentId) -> Result<bool, Self::Error>;

    /// Fetch a meme by ID.
    async fn get_meme(&self, id: &MemeId) -> Result<Option<Meme>, Self::Error>;

    /// All memes.
    async fn list_memes(&self) -> Result<Vec<Meme>, Self::Error>;

    /// Memes by exact author.
    async fn memes_by_author(&self, author: &str) -> Result<Vec<Meme>, Self::Error>;

    /// Insert or replace a meme.
    async fn put_meme(&self, meme: &Meme) -> Result<(), Self::Error>;

    /// Delete a meme. Returns whether it existed.
    async fn delete_meme(&self, id: &MemeId) -> Result<bool, Self::Error>;

    /// Fetch a law by ID.
    async fn get_law(&self, id: &LawId) -> Result<Option<Law>, Self::Error>;

    /// All laws.
    async fn list_laws(&self) -> Result<Vec<Law>, Self::Error>;

    /// Laws by exact category.
    async fn laws_by_category(&self, category: &str) -> Result<Vec<Law>, Self::Error>;

    /// Insert or replace a law.
    async fn put_law(&self, law: &Law) -> Result<(), Self::Error>;

    /// Delete a law. Returns whether it existed.
    async fn delete_law(&self, id: &LawId) -> Result<bool, Self::Error>;

    /// Record counts as (fragments, memes, laws).
    async fn content_counts(&self) -> Result<(usize, usize, usize), Self::Error>;
}

/// Trait for excuse persistence, layered over the content store.
///
/// Excuses reference content by id only; deleting content never deletes an
/// excuse.
#[async_trait]
pub trait ExcuseStore: ContentStore {
    /// Persist a new excuse.
    async fn insert_excuse(&self, excuse: &Excuse) -> Result<(), Self::Error>;

    /// Fetch an excuse by ID.
    async fn get_excuse(&self, id: &ExcuseId) -> Result<Option<Excuse>, Self::Error>;

    /// All excuses, oldest first.
    async fn list_excuses(&self) -> Result<Vec<Excuse>, Self::Error>;
}

pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresStore};
