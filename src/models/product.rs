//! Product and question models.
//!
//! A [`Product`] is built once per run from the raw input mapping and is
//! read by every later step. Questions are grouped in a [`QuestionSet`] whose
//! category set is always derived from its questions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Validated internal representation of the product being marketed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product name.
    pub name: String,
    /// Active ingredient concentration, e.g. "10% Vitamin C".
    pub concentration: String,
    /// Compatible skin types, in source order.
    pub skin_types: Vec<String>,
    /// Main ingredients, in source order.
    pub key_ingredients: Vec<String>,
    /// Product benefits, in source order.
    pub benefits: Vec<String>,
    /// How to use the product.
    pub usage_instructions: String,
    /// Potential side effects.
    pub side_effects: Option<String>,
    /// Currency-prefixed price, e.g. "₹699".
    pub price: String,
}

impl Product {
    /// Builds a product, splitting the comma-separated list fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        concentration: impl Into<String>,
        skin_types: &str,
        key_ingredients: &str,
        benefits: &str,
        usage_instructions: impl Into<String>,
        side_effects: Option<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            concentration: concentration.into().trim().to_string(),
            skin_types: split_list(skin_types),
            key_ingredients: split_list(key_ingredients),
            benefits: split_list(benefits),
            usage_instructions: usage_instructions.into().trim().to_string(),
            side_effects: side_effects
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            price: price.into().trim().to_string(),
        }
    }

    /// Names of list fields that are empty after normalization.
    ///
    /// The model itself accepts empty lists; steps that need every list
    /// populated call this and refuse to continue otherwise.
    pub fn empty_list_fields(&self) -> Vec<&'static str> {
        let mut empty = Vec::new();
        if self.skin_types.is_empty() {
            empty.push("skin_types");
        }
        if self.key_ingredients.is_empty() {
            empty.push("key_ingredients");
        }
        if self.benefits.is_empty() {
            empty.push("benefits");
        }
        empty
    }

    /// Whether every list field holds at least one item.
    pub fn is_complete(&self) -> bool {
        self.empty_list_fields().is_empty()
    }

    /// Numeric part before the first '%' of the concentration, if any.
    pub fn concentration_percent(&self) -> Option<f64> {
        let (number, _) = self.concentration.split_once('%')?;
        number.trim().parse().ok()
    }

    /// The comparable subset of this product, as used on comparison pages.
    pub fn profile(&self) -> ProductProfile {
        ProductProfile {
            name: self.name.clone(),
            concentration: self.concentration.clone(),
            skin_types: self.skin_types.clone(),
            key_ingredients: self.key_ingredients.clone(),
            benefits: self.benefits.clone(),
            price: self.price.clone(),
        }
    }

    /// Side effects text, or "None reported".
    pub fn side_effects_or_default(&self) -> &str {
        self.side_effects.as_deref().unwrap_or("None reported")
    }

    /// Whether any ingredient mentions vitamin C or an acid (case-insensitive).
    pub fn has_photosensitizing_ingredient(&self) -> bool {
        self.key_ingredients.iter().any(|ingredient| {
            let lower = ingredient.to_lowercase();
            lower.contains("vitamin c") || lower.contains("acid")
        })
    }

    /// Whether the side effects mention sensitive skin.
    pub fn mentions_sensitivity(&self) -> bool {
        self.side_effects
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains("sensitive"))
    }
}

/// Splits a comma-separated field, trimming items and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comparable attributes of a product: the shape shared by the parsed
/// product and its fictional competitor on a comparison page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductProfile {
    pub name: String,
    pub concentration: String,
    pub skin_types: Vec<String>,
    pub key_ingredients: Vec<String>,
    pub benefits: Vec<String>,
    pub price: String,
}

fn default_priority() -> u32 {
    1
}

/// A user question with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedQuestion {
    /// Free-form category label, e.g. "Informational" or "Usage".
    #[serde(default)]
    pub category: String,
    /// The question text.
    #[serde(default)]
    pub question: String,
    /// Ordering priority, 1 = highest.
    #[serde(default = "default_priority")]
    pub priority: u32,
}

impl CategorizedQuestion {
    pub fn new(category: impl Into<String>, question: impl Into<String>, priority: u32) -> Self {
        Self {
            category: category.into(),
            question: question.into(),
            priority: priority.max(1),
        }
    }
}

#[derive(Deserialize)]
struct QuestionSetRepr {
    questions: Vec<CategorizedQuestion>,
}

impl From<QuestionSetRepr> for QuestionSet {
    fn from(repr: QuestionSetRepr) -> Self {
        QuestionSet::new(repr.questions)
    }
}

/// Ordered collection of questions plus the distinct categories they use.
///
/// `categories` is recomputed from `questions` on construction and on
/// deserialization; it cannot be supplied independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QuestionSetRepr")]
pub struct QuestionSet {
    questions: Vec<CategorizedQuestion>,
    categories: BTreeSet<String>,
}

impl QuestionSet {
    pub fn new(questions: Vec<CategorizedQuestion>) -> Self {
        let categories = questions.iter().map(|q| q.category.clone()).collect();
        Self {
            questions,
            categories,
        }
    }

    pub fn questions(&self) -> &[CategorizedQuestion] {
        &self.questions
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
