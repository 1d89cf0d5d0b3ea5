//! Product-page copy produced by the product-content step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Highlights of how the product is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageHighlights {
    pub timing: String,
    pub application_order: String,
    pub frequency: String,
}

/// Marketing copy for the product page.
///
/// Keys missing from a generated reply deserialize to empty values, which the
/// content validator rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductContent {
    pub tagline: String,
    pub description: String,
    pub key_features: Vec<String>,
    /// Ingredient name to one-line description.
    pub ingredient_descriptions: BTreeMap<String, String>,
    pub usage_highlights: UsageHighlights,
    pub precautions: Vec<String>,
    pub suitable_for_sensitive_skin: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_reply_defaults() {
        let content: ProductContent = serde_json::from_str(
            r#"{"tagline": "Radiance in every drop", "usage_highlights": {"timing": "morning"}}"#,
        )
        .unwrap();
        assert_eq!(content.tagline, "Radiance in every drop");
        assert_eq!(content.usage_highlights.timing, "morning");
        assert!(content.usage_highlights.frequency.is_empty());
        assert!(content.key_features.is_empty());
        assert!(content.ingredient_descriptions.is_empty());
    }
}
