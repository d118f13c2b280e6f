//! Law types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::LawId;
use super::validation::{checked_text, ValidationError};

/// A maxim or "law" of software development (Murphy, Hofstadter, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Law {
    /// Unique law identifier.
    pub id: LawId,
    /// Name of the law (1-100 characters).
    pub name: String,
    /// Statement of the law (5-500 characters).
    pub description: String,
    /// Free-text family label, e.g. "Murphy".
    pub category: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time, if ever updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Law {
    /// Create a law with a fresh id and the current timestamp.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: LawId::generate(),
            name: name.into(),
            description: description.into(),
            category: category.into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Replace the id.
    pub fn with_id(mut self, id: LawId) -> Self {
        self.id = id;
        self
    }
}

/// Input for creating a law.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLaw {
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Category label.
    pub category: String,
}

impl NewLaw {
    /// Validate the input and build a law ready to persist.
    pub fn validate(self) -> Result<Law, ValidationError> {
        let name = checked_text("name", &self.name, 1, 100)?;
        let description = checked_text("description", &self.description, 5, 500)?;
        let category = checked_text("category", &self.category, 1, 100)?;
        Ok(Law::new(name, description, category))
    }
}

/// Partial update for a law.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LawPatch {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New category.
    #[serde(default)]
    pub category: Option<String>,
}

impl LawPatch {
    /// Apply the patch to `law`, validating provided fields first.
    pub fn apply(self, law: &mut Law) -> Result<(), ValidationError> {
        let name = self.name.map(|v| checked_text("name", &v, 1, 100)).transpose()?;
        let description = self
            .description
            .map(|v| checked_text("description", &v, 5, 500))
            .transpose()?;
        let category = self
            .category
            .map(|v| checked_text("category", &v, 1, 100))
            .transpose()?;

        if let Some(name) = name {
            law.name = name;
        }
        if let Some(description) = description {
            law.description = description;
        }
        if let Some(category) = category {
            law.category = category;
        }
        law.updated_at = Some(Utc::now());
        Ok(())
    }
}
