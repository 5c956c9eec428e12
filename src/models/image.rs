//! Stored image derivatives.

use serde::{Deserialize, Serialize};

/// Which collection a stored image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// Untouched originals, delivered after purchase.
    Results,
    /// Watermarked previews.
    Previews,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Results => "results",
            Self::Previews => "previews",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "results" => Some(Self::Results),
            "previews" => Some(Self::Previews),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both public URLs produced for one source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedImage {
    pub original_url: String,
    pub watermarked_url: String,
}
