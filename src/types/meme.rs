//! Meme types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::MemeId;
use super::validation::{checked_text, ValidationError};

/// A quoted meme that can be attached to an excuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meme {
    /// Unique meme identifier.
    pub id: MemeId,
    /// Who said it (1-100 characters).
    pub author: String,
    /// The quote itself (10-500 characters).
    pub quote: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time, if ever updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Meme {
    /// Create a meme with a fresh id and the current timestamp.
    pub fn new(author: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            id: MemeId::generate(),
            author: author.into(),
            quote: quote.into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Replace the id.
    pub fn with_id(mut self, id: MemeId) -> Self {
        self.id = id;
        self
    }
}

/// Input for creating a meme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeme {
    /// Author.
    pub author: String,
    /// Quote.
    pub quote: String,
}

impl NewMeme {
    /// Validate the input and build a meme ready to persist.
    pub fn validate(self) -> Result<Meme, ValidationError> {
        let author = checked_text("author", &self.author, 1, 100)?;
        let quote = checked_text("quote", &self.quote, 10, 500)?;
        Ok(Meme::new(author, quote))
    }
}

/// Partial update for a meme.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemePatch {
    /// New author.
    #[serde(default)]
    pub author: Option<String>,
    /// New quote.
    #[serde(default)]
    pub quote: Option<String>,
}

impl MemePatch {
    /// Apply the patch to `meme`, validating provided fields first.
    pub fn apply(self, meme: &mut Meme) -> Result<(), ValidationError> {
        let author = self
            .author
            .map(|a| checked_text("author", &a, 1, 100))
            .transpose()?;
        let quote = self
            .quote
            .map(|q| checked_text("quote", &q, 10, 500))
            .transpose()?;

        if let Some(author) = author {
            meme.author = author;
        }
        if let Some(quote) = quote {
            meme.quote = quote;
        }
        meme.updated_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_length_bounds() {
        let short = NewMeme {
            author: "Anon".into(),
            quote: "too short".into(),
        };
        assert_eq!(short.validate().unwrap_err().field, "quote");

        let ok = NewMeme {
            author: "Anon".into(),
            quote: "works on my machine".into(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_patch_validates_before_mutating() {
        let mut meme = Meme::new("Anon", "it compiled, ship it");
        let result = MemePatch {
            author: Some("Someone".into()),
            quote: Some("short".into()),
        }
        .apply(&mut meme);

        assert!(result.is_err());
        assert_eq!(meme.author, "Anon");
    }
}
