//! # excuse-engine
//!
//! Composable technical excuses.
//!
//! An excuse is four reusable text fragments, one per slot (context, cause,
//! consequence, recommendation), optionally enriched with a quoted meme and
//! a "law" of software development.
//!
//! ## Architecture
//!
//! ```text
//! request → Role Resolver → ExcuseComposer(ContentPool) → ExcuseCatalog → ExcuseStore
//!                                  ↑
//!                       ContentStore (Postgres or Memory)
//! ```
//!
//! ## Generation Modes
//!
//! - Simple, WithMeme, WithLaw, Ultra: uniform random selection per slot.
//! - ByRole: prefers fragments affine to the role, falls back per slot.
//! - Daily: seeded from the UTC day number; identical for every caller on
//!   the same day over the same content.
//!
//! ## Failure Policy
//!
//! Composition is strict: a slot with no candidates is
//! [`ComposeError::NoFragmentsAvailable`]. Manual construction is best
//! effort: unknown ids are left unset. Reading an excuse back resolves its
//! references explicitly, so deleted content shows up as `None`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod role;
pub mod pool;
pub mod composer;
pub mod catalog;
pub mod content;
pub mod bootstrap;
pub mod config;
pub mod store;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    Excuse, ExcuseId, ExcuseType, Fragment, FragmentId, FragmentKind, Law, LawId, Meme, MemeId,
    ResolvedExcuse, Role,
};
pub use role::{resolve_role, InvalidRole};
pub use pool::ContentPool;
pub use composer::{day_seed, ComposeError, ExcuseComposer, ExcuseDraft, GenerationMode};
pub use catalog::{CatalogError, ExcuseCatalog, ManualExcuse};
pub use content::{ContentCatalog, ContentError, FragmentFilter, LawFilter, MemeFilter};
pub use bootstrap::{seed_from_dir, BootstrapError, BootstrapReport};
pub use config::{ServiceConfig, StoreBackend};
pub use store::{ContentStore, ExcuseStore, InMemoryStore};
#[cfg(feature = "postgres")]
pub use store::PostgresStore;

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};
