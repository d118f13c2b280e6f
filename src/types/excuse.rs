//! Excuse types.
//!
//! An [`Excuse`] holds non-owning references (ids) to the fragments, meme and
//! law it was built from. Those records have their own lifecycle and may be
//! deleted later, so reading an excuse back goes through an explicit resolve
//! step that yields a [`ResolvedExcuse`] where every missing record is `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::fragment::{Fragment, FragmentKind};
use super::ids::{ExcuseId, FragmentId, LawId, MemeId};
use super::law::Law;
use super::meme::Meme;
use crate::role::Role;

/// Which optional parts an excuse was composed with.
///
/// The type records intent: a `WithMeme` excuse may still have no meme when
/// the store held none at composition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExcuseType {
    /// Four fragments only.
    Simple,
    /// Fragments plus a meme.
    WithMeme,
    /// Fragments plus a law.
    WithLaw,
    /// Fragments plus both a meme and a law.
    Ultra,
}

impl ExcuseType {
    /// Canonical token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::WithMeme => "WITH_MEME",
            Self::WithLaw => "WITH_LAW",
            Self::Ultra => "ULTRA",
        }
    }

    /// Parse type from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SIMPLE" => Some(Self::Simple),
            "WITH_MEME" => Some(Self::WithMeme),
            "WITH_LAW" => Some(Self::WithLaw),
            "ULTRA" => Some(Self::Ultra),
            _ => None,
        }
    }

    /// Whether composition should attempt a meme.
    pub fn wants_meme(&self) -> bool {
        matches!(self, Self::WithMeme | Self::Ultra)
    }

    /// Whether composition should attempt a law.
    pub fn wants_law(&self) -> bool {
        matches!(self, Self::WithLaw | Self::Ultra)
    }
}

impl Default for ExcuseType {
    fn default() -> Self {
        Self::Simple
    }
}

impl fmt::Display for ExcuseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted excuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excuse {
    /// Unique excuse identifier.
    pub id: ExcuseId,
    /// Context fragment reference.
    pub context: Option<FragmentId>,
    /// Cause fragment reference.
    pub cause: Option<FragmentId>,
    /// Consequence fragment reference.
    pub consequence: Option<FragmentId>,
    /// Recommendation fragment reference.
    pub recommendation: Option<FragmentId>,
    /// Attached meme, if any.
    pub meme: Option<MemeId>,
    /// Attached law, if any.
    pub law: Option<LawId>,
    /// Composition type.
    #[serde(rename = "type")]
    pub excuse_type: ExcuseType,
    /// Role the excuse was tailored for.
    pub role: Option<Role>,
    /// Randomness source. Regeneration key for daily excuses, metadata otherwise.
    pub seed: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Excuse {
    /// Fragment reference for the given slot.
    pub fn fragment_ref(&self, kind: FragmentKind) -> Option<FragmentId> {
        match kind {
            FragmentKind::Context => self.context,
            FragmentKind::Cause => self.cause,
            FragmentKind::Consequence => self.consequence,
            FragmentKind::Recommendation => self.recommendation,
        }
    }

    /// All fragment references in draw order.
    pub fn fragment_refs(&self) -> [Option<FragmentId>; 4] {
        FragmentKind::DRAW_ORDER.map(|kind| self.fragment_ref(kind))
    }
}

/// An excuse together with whatever referenced records still exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedExcuse {
    /// The stored excuse.
    pub excuse: Excuse,
    /// Context fragment, if it still exists.
    pub context: Option<Fragment>,
    /// Cause fragment, if it still exists.
    pub cause: Option<Fragment>,
    /// Consequence fragment, if it still exists.
    pub consequence: Option<Fragment>,
    /// Recommendation fragment, if it still exists.
    pub recommendation: Option<Fragment>,
    /// Meme, if attached and still existing.
    pub meme: Option<Meme>,
    /// Law, if attached and still existing.
    pub law: Option<Law>,
}

impl ResolvedExcuse {
    /// Resolved fragment for the given slot.
    pub fn fragment(&self, kind: FragmentKind) -> Option<&Fragment> {
        match kind {
            FragmentKind::Context => self.context.as_ref(),
            FragmentKind::Cause => self.cause.as_ref(),
            FragmentKind::Consequence => self.consequence.as_ref(),
            FragmentKind::Recommendation => self.recommendation.as_ref(),
        }
    }

    /// Whether some reference on the excuse points at a record that no
    /// longer exists.
    pub fn has_dangling_refs(&self) -> bool {
        let fragments_missing = FragmentKind::DRAW_ORDER
            .iter()
            .any(|&kind| self.excuse.fragment_ref(kind).is_some() && self.fragment(kind).is_none());
        fragments_missing
            || (self.excuse.meme.is_some() && self.meme.is_none())
            || (self.excuse.law.is_some() && self.law.is_none())
    }

    /// Render the excuse as a single paragraph of text.
    ///
    /// Missing parts are skipped. The meme is appended as a quote and the law
    /// as a closing justification.
    pub fn narrative(&self) -> String {
        let mut parts: Vec<String> = FragmentKind::DRAW_ORDER
            .iter()
            .filter_map(|&kind| self.fragment(kind))
            .map(|f| f.text.clone())
            .collect();

        if let Some(meme) = &self.meme {
            parts.push(format!("As {} said: \"{}\"", meme.author, meme.quote));
        }
        if let Some(law) = &self.law {
            parts.push(format!("{}: {}", law.name, law.description));
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tokens() {
        assert_eq!(serde_json::to_string(&ExcuseType::WithMeme).unwrap(), "\"WITH_MEME\"");
        assert_eq!(ExcuseType::from_str("ultra"), Some(ExcuseType::Ultra));
        assert_eq!(ExcuseType::from_str("ULTRA_SHARK"), None);
    }

    #[test]
    fn test_wants_parts() {
        assert!(!ExcuseType::Simple.wants_meme());
        assert!(ExcuseType::WithMeme.wants_meme());
        assert!(!ExcuseType::WithMeme.wants_law());
        assert!(ExcuseType::Ultra.wants_meme() && ExcuseType::Ultra.wants_law());
    }

    #[test]
    fn test_narrative_skips_missing_parts() {
        let context = Fragment::new(FragmentKind::Context, "During the release,", None);
        let cause = Fragment::new(FragmentKind::Cause, "the cache expired,", None);
        let excuse = Excuse {
            id: ExcuseId::generate(),
            context: Some(context.id),
            cause: Some(cause.id),
            consequence: None,
            recommendation: Some(FragmentId::generate()),
            meme: None,
            law: None,
            excuse_type: ExcuseType::Simple,
            role: None,
            seed: 0,
            created_at: Utc::now(),
            updated_at: None,
        };
        let resolved = ResolvedExcuse {
            excuse,
            context: Some(context),
            cause: Some(cause),
            consequence: None,
            recommendation: None,
            meme: None,
            law: None,
        };

        assert_eq!(resolved.narrative(), "During the release, the cache expired,");
        assert!(resolved.has_dangling_refs());
    }
}
