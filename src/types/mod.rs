//! Core types for the excuse engine.

pub mod ids;
pub mod fragment;
pub mod meme;
pub mod law;
pub mod excuse;
pub mod validation;

pub use ids::{ExcuseId, FragmentId, LawId, MemeId};
pub use fragment::{Fragment, FragmentKind, FragmentPatch, NewFragment};
pub use meme::{Meme, MemePatch, NewMeme};
pub use law::{Law, LawPatch, NewLaw};
pub use excuse::{Excuse, ExcuseType, ResolvedExcuse};
pub use validation::ValidationError;
pub use crate::role::Role;
