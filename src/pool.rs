//! Consistent content snapshots.
//!
//! A [`ContentPool`] is everything one compose call is allowed to see. It is
//! taken from the store once, up front, so the four fragment draws and the
//! optional meme/law draws all observe the same data even if other requests
//! modify the store meanwhile.

use crate::role::Role;
use crate::types::{Fragment, FragmentKind, Law, Meme};

/// A read-only snapshot of the content store.
///
/// Records are kept ordered by id. Seeded draws index into these lists, so
/// the ordering is what makes a daily excuse depend only on the stored data
/// and the date.
#[derive(Debug, Clone, Default)]
pub struct ContentPool {
    fragments: Vec<Fragment>,
    memes: Vec<Meme>,
    laws: Vec<Law>,
}

impl ContentPool {
    /// Build a pool, sorting every collection by id.
    pub fn new(mut fragments: Vec<Fragment>, mut memes: Vec<Meme>, mut laws: Vec<Law>) -> Self {
        fragments.sort_by_key(|f| f.id);
        memes.sort_by_key(|m| m.id);
        laws.sort_by_key(|l| l.id);
        Self { fragments, memes, laws }
    }

    /// Fragments of one kind, any role affinity.
    pub fn by_kind(&self, kind: FragmentKind) -> Vec<&Fragment> {
        self.fragments.iter().filter(|f| f.kind == kind).collect()
    }

    /// Fragments of one kind whose affinity is exactly `role`.
    ///
    /// Universal fragments (no affinity) are not included.
    pub fn by_kind_and_role(&self, kind: FragmentKind, role: Role) -> Vec<&Fragment> {
        self.fragments
            .iter()
            .filter(|f| f.kind == kind && f.is_affine_to(role))
            .collect()
    }

    /// All fragments.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// All memes.
    pub fn memes(&self) -> &[Meme] {
        &self.memes
    }

    /// All laws.
    pub fn laws(&self) -> &[Law] {
        &self.laws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FragmentId;
    use uuid::Uuid;

    fn fragment(id: u128, kind: FragmentKind, role: Option<Role>) -> Fragment {
        Fragment::new(kind, format!("fragment number {}", id), role)
            .with_id(FragmentId::new(Uuid::from_u128(id)))
    }

    #[test]
    fn test_pool_orders_by_id() {
        let pool = ContentPool::new(
            vec![
                fragment(3, FragmentKind::Cause, None),
                fragment(1, FragmentKind::Cause, None),
                fragment(2, FragmentKind::Cause, None),
            ],
            vec![],
            vec![],
        );
        let ids: Vec<u128> = pool
            .by_kind(FragmentKind::Cause)
            .iter()
            .map(|f| f.id.as_uuid().as_u128())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_role_filter_excludes_universal() {
        let pool = ContentPool::new(
            vec![
                fragment(1, FragmentKind::Context, None),
                fragment(2, FragmentKind::Context, Some(Role::Dev)),
                fragment(3, FragmentKind::Context, Some(Role::Qa)),
            ],
            vec![],
            vec![],
        );
        let dev = pool.by_kind_and_role(FragmentKind::Context, Role::Dev);
        assert_eq!(dev.len(), 1);
        assert_eq!(dev[0].id.as_uuid().as_u128(), 2);
        assert!(pool.by_kind_and_role(FragmentKind::Context, Role::Pm).is_empty());
    }

    #[test]
    fn test_extras_are_sorted_too() {
        use crate::types::{LawId, MemeId};

        let memes = vec![
            Meme::new("Anon", "second meme in id order").with_id(MemeId::new(Uuid::from_u128(2))),
            Meme::new("Anon", "first meme in id order").with_id(MemeId::new(Uuid::from_u128(1))),
        ];
        let laws = vec![
            Law::new("Law B", "Second by id.", "Murphy").with_id(LawId::new(Uuid::from_u128(9))),
            Law::new("Law A", "First by id.", "Murphy").with_id(LawId::new(Uuid::from_u128(8))),
        ];
        let pool = ContentPool::new(vec![], memes, laws);
        assert_eq!(pool.memes()[0].id.as_uuid().as_u128(), 1);
        assert_eq!(pool.laws()[0].name, "Law A");
    }
}
