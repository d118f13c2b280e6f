//! Fragment types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::FragmentId;
use super::validation::{checked_text, ValidationError};
use crate::role::Role;

/// Minimum fragment text length in characters.
pub const FRAGMENT_TEXT_MIN: usize = 5;
/// Maximum fragment text length in characters.
pub const FRAGMENT_TEXT_MAX: usize = 500;

/// The slot a fragment fills in an excuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FragmentKind {
    /// The situation the excuse starts from.
    Context,
    /// The technical reason.
    Cause,
    /// What happened as a result.
    Consequence,
    /// What should be done about it.
    Recommendation,
}

impl FragmentKind {
    /// All kinds, in the order excuses draw them.
    ///
    /// The daily excuse depends on this order; reordering it changes every
    /// reproducible excuse.
    pub const DRAW_ORDER: [FragmentKind; 4] = [
        FragmentKind::Context,
        FragmentKind::Cause,
        FragmentKind::Consequence,
        FragmentKind::Recommendation,
    ];

    /// Canonical upper-case token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Context => "CONTEXT",
            Self::Cause => "CAUSE",
            Self::Consequence => "CONSEQUENCE",
            Self::Recommendation => "RECOMMENDATION",
        }
    }

    /// Parse kind from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CONTEXT" => Some(Self::Context),
            "CAUSE" => Some(Self::Cause),
            "CONSEQUENCE" => Some(Self::Consequence),
            "RECOMMENDATION" => Some(Self::Recommendation),
            _ => None,
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reusable text unit tagged with a kind and an optional role affinity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Unique fragment identifier.
    pub id: FragmentId,
    /// Slot this fragment fills.
    pub kind: FragmentKind,
    /// Fragment text.
    pub text: String,
    /// Role affinity; `None` applies to every role.
    pub role: Option<Role>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time, if ever updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Fragment {
    /// Create a fragment with a fresh id and the current timestamp.
    ///
    /// No validation is performed; use [`NewFragment::validate`] for
    /// untrusted input.
    pub fn new(kind: FragmentKind, text: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            id: FragmentId::generate(),
            kind,
            text: text.into(),
            role,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Replace the id (useful for fixtures with stable ids).
    pub fn with_id(mut self, id: FragmentId) -> Self {
        self.id = id;
        self
    }

    /// Whether this fragment is eligible for an excuse tailored to `role`.
    pub fn is_affine_to(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

/// Input for creating a fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFragment {
    /// Slot the fragment fills.
    pub kind: FragmentKind,
    /// Fragment text (5-500 characters).
    pub text: String,
    /// Optional role affinity.
    #[serde(default)]
    pub role: Option<Role>,
}

impl NewFragment {
    /// Validate the input and build a fragment ready to persist.
    pub fn validate(self) -> Result<Fragment, ValidationError> {
        let text = checked_text("text", &self.text, FRAGMENT_TEXT_MIN, FRAGMENT_TEXT_MAX)?;
        Ok(Fragment::new(self.kind, text, self.role))
    }
}

/// Partial update for a fragment. Only provided fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FragmentPatch {
    /// New kind.
    #[serde(default)]
    pub kind: Option<FragmentKind>,
    /// New text.
    #[serde(default)]
    pub text: Option<String>,
    /// New role affinity.
    #[serde(default)]
    pub role: Option<Role>,
}

impl FragmentPatch {
    /// Apply the patch to `fragment`, validating any new text.
    ///
    /// The fragment keeps its identity; a kind change only affects which
    /// future excuses it is eligible for.
    pub fn apply(self, fragment: &mut Fragment) -> Result<(), ValidationError> {
        if let Some(text) = self.text {
            fragment.text = checked_text("text", &text, FRAGMENT_TEXT_MIN, FRAGMENT_TEXT_MAX)?;
        }
        if let Some(kind) = self.kind {
            fragment.kind = kind;
        }
        if let Some(role) = self.role {
            fragment.role = Some(role);
        }
        fragment.updated_at = Some(Utc::now());
        Ok(())
    }
}
