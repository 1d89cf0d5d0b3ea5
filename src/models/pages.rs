//! Final page documents written to disk.
//!
//! Every page serializes as a flat JSON object whose `page_type` field names
//! its kind. The tag comes from [`Page`], so pages are always written through
//! that enum.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::comparison::ComparisonPoint;
use super::product::ProductProfile;

/// Provenance tag carried by every page.
pub const GENERATED_BY: &str = "content-forge multi-agent pipeline";

fn generated_by() -> String {
    GENERATED_BY.to_string()
}

/// One question/answer pair on the FAQ page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqPage {
    pub product_name: String,
    pub total_questions: usize,
    /// Sorted distinct categories of `faqs`.
    pub categories: Vec<String>,
    pub faqs: Vec<FaqItem>,
    #[serde(default = "generated_by")]
    pub generated_by: String,
}

/// How to apply the product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageGuide {
    pub timing: String,
    /// Amount per application, e.g. "2-3 drops", when it could be read from
    /// the instructions.
    pub amount: Option<String>,
    pub instructions: String,
    pub application_order: String,
    pub frequency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyInformation {
    pub side_effects: String,
    pub precautions: Vec<String>,
    pub suitable_for_sensitive_skin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub price: String,
    /// First integer found in the price string.
    pub amount: Option<u64>,
    /// ISO code inferred from the currency symbol, or "UNKNOWN".
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    pub product_name: String,
    pub tagline: String,
    pub description: String,
    pub key_features: Vec<String>,
    pub ingredients: BTreeMap<String, String>,
    pub usage_guide: UsageGuide,
    pub suitable_for: Vec<String>,
    pub benefits: Vec<String>,
    pub safety_information: SafetyInformation,
    pub pricing: Pricing,
    #[serde(default = "generated_by")]
    pub generated_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonPageSummary {
    pub winner: String,
    pub key_differences: String,
    pub win_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPage {
    pub product_a: ProductProfile,
    pub product_b: ProductProfile,
    pub comparison_points: Vec<ComparisonPoint>,
    pub summary: ComparisonPageSummary,
    pub recommendation: String,
    #[serde(default = "generated_by")]
    pub generated_by: String,
}

/// Kind of page, independent of its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Faq,
    ProductPage,
    Comparison,
}

impl PageKind {
    /// All kinds, in the order pages are written.
    pub const ALL: [PageKind; 3] = [PageKind::Faq, PageKind::ProductPage, PageKind::Comparison];

    /// Value of the `page_type` field.
    pub fn page_type(&self) -> &'static str {
        match self {
            PageKind::Faq => "faq",
            PageKind::ProductPage => "product_page",
            PageKind::Comparison => "comparison",
        }
    }

    /// File name the page is written to.
    pub fn file_name(&self) -> &'static str {
        match self {
            PageKind::Faq => "faq.json",
            PageKind::ProductPage => "product_page.json",
            PageKind::Comparison => "comparison_page.json",
        }
    }
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.page_type())
    }
}

/// A finished page, tagged with its `page_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "page_type")]
pub enum Page {
    #[serde(rename = "faq")]
    Faq(FaqPage),
    #[serde(rename = "product_page")]
    Product(ProductPage),
    #[serde(rename = "comparison")]
    Comparison(ComparisonPage),
}

impl Page {
    pub fn kind(&self) -> PageKind {
        match self {
            Page::Faq(_) => PageKind::Faq,
            Page::Product(_) => PageKind::ProductPage,
            Page::Comparison(_) => PageKind::Comparison,
        }
    }

    pub fn generated_by(&self) -> &str {
        match self {
            Page::Faq(page) => &page.generated_by,
            Page::Product(page) => &page.generated_by,
            Page::Comparison(page) => &page.generated_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faq_page() -> Page {
        Page::Faq(FaqPage {
            product_name: "GlowBoost".to_string(),
            total_questions: 1,
            categories: vec!["Usage".to_string()],
            faqs: vec![FaqItem {
                question: "How do I use it?".to_string(),
                answer: "Apply two drops every morning after cleansing.".to_string(),
                category: "Usage".to_string(),
            }],
            generated_by: GENERATED_BY.to_string(),
        })
    }

    #[test]
    fn test_page_type_tag_serialized() {
        let value = serde_json::to_value(faq_page()).unwrap();
        assert_eq!(value["page_type"], "faq");
        assert_eq!(value["generated_by"], GENERATED_BY);
        assert_eq!(value["faqs"][0]["category"], "Usage");
    }

    #[test]
    fn test_page_kind_matches_tag() {
        let page = faq_page();
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["page_type"], page.kind().page_type());
        assert_eq!(page.kind().file_name(), "faq.json");
    }

    #[test]
    fn test_tagged_page_reads_back() {
        let json = serde_json::to_string(&faq_page()).unwrap();
        let page: Page = serde_json::from_str(&json).unwrap();
        assert_eq!(page.kind(), PageKind::Faq);
    }

    #[test]
    fn test_kind_file_names_distinct() {
        let names: std::collections::HashSet<_> =
            PageKind::ALL.iter().map(|k| k.file_name()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(PageKind::Comparison.file_name(), "comparison_page.json");
        assert_eq!(PageKind::ProductPage.to_string(), "product_page");
    }
}
