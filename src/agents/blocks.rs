//! Content logic blocks used to assemble the product page.
//!
//! Each block is a pure transformation of the product, optionally refined by
//! the product-content step's output.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{Pricing, Product, ProductContent, SafetyInformation, UsageGuide, UsageHighlights};

const DEFAULT_APPLICATION_ORDER: &str = "see instructions";
const DEFAULT_FREQUENCY: &str = "as directed";
const DEFAULT_INGREDIENT_DESCRIPTION: &str = "Key active ingredient";

/// Built-in one-line descriptions, matched case-insensitively.
const INGREDIENT_GLOSSARY: [(&str, &str); 6] = [
    ("vitamin c", "Antioxidant that brightens skin tone and fades dark spots"),
    ("hyaluronic acid", "Humectant that draws in moisture for lasting hydration"),
    ("vitamin e", "Antioxidant that nourishes and protects the skin barrier"),
    ("ferulic acid", "Antioxidant that stabilizes vitamins C and E"),
    ("niacinamide", "Form of vitamin B3 that refines pores and evens texture"),
    ("retinol", "Vitamin A derivative that supports cell turnover"),
];

fn amount_regex() -> Option<&'static Regex> {
    static AMOUNT: OnceLock<Option<Regex>> = OnceLock::new();
    AMOUNT
        .get_or_init(|| Regex::new(r"(?i)(\d+)(?:\s*[-–]\s*(\d+))?\s*drops").ok())
        .as_ref()
}

fn price_regex() -> Option<&'static Regex> {
    static PRICE: OnceLock<Option<Regex>> = OnceLock::new();
    PRICE
        .get_or_init(|| Regex::new(r"\d[\d,]*").ok())
        .as_ref()
}

/// "morning", "evening" or "as directed", by keyword.
pub fn usage_timing(instructions: &str) -> &'static str {
    let lower = instructions.to_lowercase();
    if lower.contains("morning") {
        "morning"
    } else if lower.contains("evening") {
        "evening"
    } else {
        "as directed"
    }
}

/// Amount per application read from "N–M drops", "N-M drops" or "N drops".
pub fn application_amount(instructions: &str) -> Option<String> {
    let caps = amount_regex()?.captures(instructions)?;
    let low = caps.get(1)?.as_str();
    Some(match caps.get(2) {
        Some(high) => format!("{}-{} drops", low, high.as_str()),
        None => format!("{} drops", low),
    })
}

fn non_empty_or(value: &str, default: impl Into<String>) -> String {
    if value.trim().is_empty() {
        default.into()
    } else {
        value.trim().to_string()
    }
}

/// Usage guide from the instructions, with non-empty highlight values taking
/// precedence over the block defaults.
pub fn usage_block(product: &Product, highlights: Option<&UsageHighlights>) -> UsageGuide {
    let instructions = &product.usage_instructions;
    let empty = UsageHighlights::default();
    let highlights = highlights.unwrap_or(&empty);

    UsageGuide {
        timing: non_empty_or(&highlights.timing, usage_timing(instructions)),
        amount: application_amount(instructions),
        instructions: instructions.clone(),
        application_order: non_empty_or(&highlights.application_order, DEFAULT_APPLICATION_ORDER),
        frequency: non_empty_or(&highlights.frequency, DEFAULT_FREQUENCY),
    }
}

/// ISO currency code for the symbol the price carries.
pub fn currency_code(price: &str) -> &'static str {
    if price.contains('₹') {
        "INR"
    } else if price.contains('$') {
        "USD"
    } else if price.contains('€') {
        "EUR"
    } else if price.contains('£') {
        "GBP"
    } else {
        "UNKNOWN"
    }
}

pub fn pricing_block(product: &Product) -> Pricing {
    let amount = price_regex()
        .and_then(|re| re.find(&product.price))
        .and_then(|m| m.as_str().replace(',', "").parse().ok());

    Pricing {
        price: product.price.clone(),
        amount,
        currency: currency_code(&product.price).to_string(),
    }
}

pub fn safety_block(product: &Product, content: &ProductContent) -> SafetyInformation {
    SafetyInformation {
        side_effects: product.side_effects_or_default().to_string(),
        precautions: content.precautions.clone(),
        suitable_for_sensitive_skin: non_empty_or(
            &content.suitable_for_sensitive_skin,
            "check product details",
        ),
    }
}

/// Glossary description for an ingredient, or a generic one.
pub fn describe_ingredient(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    INGREDIENT_GLOSSARY
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| DEFAULT_INGREDIENT_DESCRIPTION.to_string())
}

/// One description per product ingredient: the generated one when present,
/// otherwise the glossary's.
pub fn ingredient_descriptions(product: &Product, content: &ProductContent) -> BTreeMap<String, String> {
    product
        .key_ingredients
        .iter()
        .map(|ingredient| {
            let description = content
                .ingredient_descriptions
                .get(ingredient)
                .filter(|d| !d.trim().is_empty())
                .map(|d| d.trim().to_string())
                .unwrap_or_else(|| describe_ingredient(ingredient));
            (ingredient.clone(), description)
        })
        .collect()
}
