//! Competitor comparison models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::product::ProductProfile;

/// Winner label for a point where neither product is better.
pub const WINNER_TIE: &str = "Tie";

/// Winner label for a point where both products are roughly equivalent.
pub const WINNER_COMPARABLE: &str = "Comparable";

/// One attribute compared between product A and product B.
///
/// Values are kept as JSON so that a point can hold a string, a number or a
/// list, as the generator produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    #[serde(default)]
    pub attribute: String,
    #[serde(default)]
    pub product_a: Value,
    #[serde(default)]
    pub product_b: Value,
    /// A product name, [`WINNER_TIE`] or [`WINNER_COMPARABLE`].
    #[serde(default)]
    pub winner: Option<String>,
}

impl ComparisonPoint {
    pub fn new(
        attribute: impl Into<String>,
        product_a: impl Into<Value>,
        product_b: impl Into<Value>,
        winner: impl Into<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            product_a: product_a.into(),
            product_b: product_b.into(),
            winner: Some(winner.into()),
        }
    }
}

/// A reply's summary: either the structured form or one sentence of text.
#[derive(Deserialize)]
#[serde(untagged)]
enum SummaryRepr {
    Text(String),
    Fields {
        #[serde(default)]
        winner: String,
        #[serde(default)]
        key_differences: String,
    },
}

impl From<SummaryRepr> for ComparisonSummary {
    fn from(repr: SummaryRepr) -> Self {
        match repr {
            SummaryRepr::Text(key_differences) => Self {
                winner: String::new(),
                key_differences,
            },
            SummaryRepr::Fields {
                winner,
                key_differences,
            } => Self {
                winner,
                key_differences,
            },
        }
    }
}

/// Textual differentiation between the two products.
///
/// A plain-text summary deserializes into `key_differences` with no winner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SummaryRepr")]
pub struct ComparisonSummary {
    pub winner: String,
    pub key_differences: String,
}

impl ComparisonSummary {
    pub fn is_empty(&self) -> bool {
        self.winner.trim().is_empty() && self.key_differences.trim().is_empty()
    }
}

/// Output of the comparison step.
///
/// Keys missing from a generated reply deserialize to empty values, which the
/// comparison validator rejects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonData {
    pub product_a: ProductProfile,
    pub product_b: ProductProfile,
    pub comparison_points: Vec<ComparisonPoint>,
    pub summary: ComparisonSummary,
    pub recommendation: String,
}

impl ComparisonData {
    /// Number of points won by each winner label. Points without a winner
    /// are not counted.
    pub fn win_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for winner in self
            .comparison_points
            .iter()
            .filter_map(|point| point.winner.as_deref())
            .map(str::trim)
            .filter(|w| !w.is_empty())
        {
            *counts.entry(winner.to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub fn competitor_name(&self) -> &str {
        &self.product_b.name
    }
}
