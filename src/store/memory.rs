//! In-memory store for tests and single-process deployments.

use std::collections::BTreeMap;
use std::convert::Infallible;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{ContentStore, ExcuseStore};
use crate::pool::ContentPool;
use crate::role::Role;
use crate::types::{Excuse, ExcuseId, Fragment, FragmentId, FragmentKind, Law, LawId, Meme, MemeId};

#[derive(Debug, Default)]
struct Tables {
    fragments: BTreeMap<FragmentId, Fragment>,
    memes: BTreeMap<MemeId, Meme>,
    laws: BTreeMap<LawId, Law>,
    excuses: BTreeMap<ExcuseId, Excuse>,
}

/// In-memory store.
///
/// Uses BTreeMap for deterministic iteration order. A single lock guards all
/// tables, so [`ContentStore::content_pool`] sees one consistent state.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with content.
    pub fn with_content(fragments: Vec<Fragment>, memes: Vec<Meme>, laws: Vec<Law>) -> Self {
        let store = Self::new();
        for f in fragments {
            store.add_fragment(f);
        }
        for m in memes {
            store.add_meme(m);
        }
        for l in laws {
            store.add_law(l);
        }
        store
    }

    /// Add a fragment to the store.
    pub fn add_fragment(&self, fragment: Fragment) {
        self.tables.write().fragments.insert(fragment.id, fragment);
    }

    /// Add a meme to the store.
    pub fn add_meme(&self, meme: Meme) {
        self.tables.write().memes.insert(meme.id, meme);
    }

    /// Add a law to the store.
    pub fn add_law(&self, law: Law) {
        self.tables.write().laws.insert(law.id, law);
    }

    /// Number of stored excuses.
    pub fn num_excuses(&self) -> usize {
        self.tables.read().excuses.len()
    }

    fn fragments_where(&self, pred: impl Fn(&Fragment) -> bool) -> Vec<Fragment> {
        self.tables
            .read()
            .fragments
            .values()
            .filter(|f| pred(f))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    type Error = Infallible;

    async fn content_pool(&self) -> Result<ContentPool, Self::Error> {
        let tables = self.tables.read();
        Ok(ContentPool::new(
            tables.fragments.values().cloned().collect(),
            tables.memes.values().cloned().collect(),
            tables.laws.values().cloned().collect(),
        ))
    }

    async fn get_fragment(&self, id: &FragmentId) -> Result<Option<Fragment>, Self::Error> {
        Ok(self.tables.read().fragments.get(id).cloned())
    }

    async fn list_fragments(&self) -> Result<Vec<Fragment>, Self::Error> {
        Ok(self.fragments_where(|_| true))
    }

    async fn fragments_by_kind(&self, kind: FragmentKind) -> Result<Vec<Fragment>, Self::Error> {
        Ok(self.fragments_where(|f| f.kind == kind))
    }

    async fn fragments_by_kind_and_role(
        &self,
        kind: FragmentKind,
        role: Role,
    ) -> Result<Vec<Fragment>, Self::Error> {
        Ok(self.fragments_where(|f| f.kind == kind && f.role == Some(role)))
    }

    async fn fragments_by_role(&self, role: Role) -> Result<Vec<Fragment>, Self::Error> {
        Ok(self.fragments_where(|f| f.role == Some(role)))
    }

    async fn put_fragment(&self, fragment: &Fragment) -> Result<(), Self::Error> {
        self.add_fragment(fragment.clone());
        Ok(())
    }

    async fn delete_fragment(&self, id: &FragmentId) -> Result<bool, Self::Error> {
        Ok(self.tables.write().fragments.remove(id).is_some())
    }

    async fn get_meme(&self, id: &MemeId) -> Result<Option<Meme>, Self::Error> {
        Ok(self.tables.read().memes.get(id).cloned())
    }

    async fn list_memes(&self) -> Result<Vec<Meme>, Self::Error> {
        Ok(self.tables.read().memes.values().cloned().collect())
    }

    async fn memes_by_author(&self, author: &str) -> Result<Vec<Meme>, Self::Error> {
        Ok(self
            .tables
            .read()
            .memes
            .values()
            .filter(|m| m.author == author)
            .cloned()
            .collect())
    }

    async fn put_meme(&self, meme: &Meme) -> Result<(), Self::Error> {
        self.add_meme(meme.clone());
        Ok(())
    }

    async fn delete_meme(&self, id: &MemeId) -> Result<bool, Self::Error> {
        Ok(self.tables.write().memes.remove(id).is_some())
    }

    async fn get_law(&self, id: &LawId) -> Result<Option<Law>, Self::Error> {
        Ok(self.tables.read().laws.get(id).cloned())
    }

    async fn list_laws(&self) -> Result<Vec<Law>, Self::Error> {
        Ok(self.tables.read().laws.values().cloned().collect())
    }

    async fn laws_by_category(&self, category: &str) -> Result<Vec<Law>, Self::Error> {
        Ok(self
            .tables
            .read()
            .laws
            .values()
            .filter(|l| l.category == category)
            .cloned()
            .collect())
    }

    async fn put_law(&self, law: &Law) -> Result<(), Self::Error> {
        self.add_law(law.clone());
        Ok(())
    }

    async fn delete_law(&self, id: &LawId) -> Result<bool, Self::Error> {
        Ok(self.tables.write().laws.remove(id).is_some())
    }

    async fn content_counts(&self) -> Result<(usize, usize, usize), Self::Error> {
        let tables = self.tables.read();
        Ok((tables.fragments.len(), tables.memes.len(), tables.laws.len()))
    }
}

#[async_trait]
impl ExcuseStore for InMemoryStore {
    async fn insert_excuse(&self, excuse: &Excuse) -> Result<(), Self::Error> {
        self.tables.write().excuses.insert(excuse.id, excuse.clone());
        Ok(())
    }

    async fn get_excuse(&self, id: &ExcuseId) -> Result<Option<Excuse>, Self::Error> {
        Ok(self.tables.read().excuses.get(id).cloned())
    }

    async fn list_excuses(&self) -> Result<Vec<Excuse>, Self::Error> {
        let mut excuses: Vec<Excuse> = self.tables.read().excuses.values().cloned().collect();
        excuses.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(excuses)
    }
}
