//! Product-page copy generation step.

use std::collections::BTreeMap;

use crate::llm::GenerationRequest;
use crate::models::{Product, ProductContent, UsageHighlights};

use super::blocks::{describe_ingredient, usage_timing};
use super::data_parser::ensure_complete;
use super::error::AgentResult;
use super::step::{parse_json_payload, GenerationSettings, GenerationStep, QualityIssue};

pub const MIN_TAGLINE_CHARS: usize = 10;
pub const MIN_DESCRIPTION_CHARS: usize = 50;
pub const MIN_KEY_FEATURES: usize = 3;
pub const MIN_PRECAUTIONS: usize = 2;

pub const PATCH_TEST_PRECAUTION: &str = "Perform a patch test before first use";
pub const EYE_CONTACT_PRECAUTION: &str = "Avoid contact with eyes";
pub const SUNSCREEN_PRECAUTION: &str = "Use sunscreen during the day when using this product";
pub const SENSITIVITY_PRECAUTION: &str =
    "May cause tingling for sensitive skin - discontinue if irritation occurs";

const CONTENT_SYSTEM_PROMPT: &str = r#"You are a professional skincare copywriter. Generate compelling product page content based on the product details provided.

Guidelines:
- Be persuasive but accurate
- Highlight unique selling points
- Use professional skincare language
- Base all content on provided data only
- Generate realistic precautions based on ingredients and side effects"#;

const CONTENT_USER_TEMPLATE: &str = r#"Product Information:
Name: {product_name}
Concentration: {concentration}
Skin Types: {skin_types}
Ingredients: {ingredients}
Benefits: {benefits}
Usage: {usage}
Side Effects: {side_effects}
Price: {price}

Return ONLY this JSON:
{
  "tagline": "catchy tagline (max 10 words)",
  "description": "compelling 2-3 sentence product description",
  "key_features": ["feature 1", "feature 2", "feature 3", "feature 4"],
  "ingredient_descriptions": {"Ingredient Name": "1 sentence description"},
  "usage_highlights": {
    "timing": "when to use (morning/evening/both)",
    "application_order": "when in routine (before/after other products)",
    "frequency": "how often (daily/twice daily/as needed)"
  },
  "precautions": ["precaution 1", "precaution 2", "precaution 3"],
  "suitable_for_sensitive_skin": "yes/no/with caution + brief explanation"
}"#;

/// Generates tagline, description, features and precautions.
#[derive(Debug, Clone, Default)]
pub struct ProductContentAgent {
    settings: GenerationSettings,
}

impl ProductContentAgent {
    pub fn new(settings: GenerationSettings) -> Self {
        Self { settings }
    }

    fn build_prompt(product: &Product) -> String {
        CONTENT_USER_TEMPLATE
            .replace("{product_name}", &product.name)
            .replace("{concentration}", &product.concentration)
            .replace("{skin_types}", &product.skin_types.join(", "))
            .replace("{ingredients}", &product.key_ingredients.join(", "))
            .replace("{benefits}", &product.benefits.join(", "))
            .replace("{usage}", &product.usage_instructions)
            .replace("{side_effects}", product.side_effects_or_default())
            .replace("{price}", &product.price)
    }
}

/// Checks copy against the product-content quality contract.
pub fn validate_content(content: &ProductContent) -> Result<(), QualityIssue> {
    let tagline = content.tagline.trim().chars().count();
    if tagline < MIN_TAGLINE_CHARS {
        return Err(QualityIssue::new(format!(
            "tagline has {} characters, need {}",
            tagline, MIN_TAGLINE_CHARS
        )));
    }

    let description = content.description.trim().chars().count();
    if description < MIN_DESCRIPTION_CHARS {
        return Err(QualityIssue::new(format!(
            "description has {} characters, need {}",
            description, MIN_DESCRIPTION_CHARS
        )));
    }

    if content.key_features.len() < MIN_KEY_FEATURES {
        return Err(QualityIssue::new(format!(
            "expected at least {} key features, got {}",
            MIN_KEY_FEATURES,
            content.key_features.len()
        )));
    }

    if content.precautions.len() < MIN_PRECAUTIONS {
        return Err(QualityIssue::new(format!(
            "expected at least {} precautions, got {}",
            MIN_PRECAUTIONS,
            content.precautions.len()
        )));
    }

    Ok(())
}

/// Uppercases every letter that follows a non-letter and lowercases the
/// rest, so "anti-aging serum" becomes "Anti-Aging Serum".
fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut after_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if after_letter {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            titled.push(c);
            after_letter = false;
        }
    }
    titled
}

/// Patch-test and eye-contact warnings, plus sunscreen and sensitivity
/// warnings when the product calls for them.
pub fn fallback_precautions(product: &Product) -> Vec<String> {
    let mut precautions = vec![
        PATCH_TEST_PRECAUTION.to_string(),
        EYE_CONTACT_PRECAUTION.to_string(),
    ];
    if product.has_photosensitizing_ingredient() {
        precautions.push(SUNSCREEN_PRECAUTION.to_string());
    }
    if product.mentions_sensitivity() {
        precautions.push(SENSITIVITY_PRECAUTION.to_string());
    }
    precautions
}

/// Product copy assembled from the product's own fields.
pub fn fallback_content(product: &Product) -> AgentResult<ProductContent> {
    ensure_complete(product)?;

    let primary_benefit = &product.benefits[0];
    let primary_ingredient = &product.key_ingredients[0];

    let mut tagline = format!("{} with {}", title_case(primary_benefit), primary_ingredient);
    if tagline.chars().count() < MIN_TAGLINE_CHARS {
        tagline = format!("{} by {}", tagline, product.name);
    }

    let description = format!(
        "{} is a {} serum designed for {} skin. Formulated with {}, it delivers {} benefits. {}",
        product.name,
        product.concentration,
        product.skin_types.join(" and "),
        product.key_ingredients.join(", "),
        product.benefits.join(" and ").to_lowercase(),
        product.usage_instructions
    );

    let key_features = vec![
        format!("{} formulation", product.concentration),
        format!("Suitable for {} skin", product.skin_types.join(" & ")),
        format!("Contains {}", product.key_ingredients.join(", ")),
        format!("Provides {} key benefits", product.benefits.len()),
    ];

    let ingredient_descriptions: BTreeMap<String, String> = product
        .key_ingredients
        .iter()
        .map(|ingredient| (ingredient.clone(), describe_ingredient(ingredient)))
        .collect();

    let timing = match usage_timing(&product.usage_instructions) {
        "morning" => "morning",
        _ => "as directed",
    };

    let suitable_for_sensitive_skin = if product.mentions_sensitivity() {
        "with caution"
    } else {
        "consult dermatologist"
    };

    Ok(ProductContent {
        tagline,
        description,
        key_features,
        ingredient_descriptions,
        usage_highlights: UsageHighlights {
            timing: timing.to_string(),
            application_order: "after cleansing, before moisturizer".to_string(),
            frequency: "daily".to_string(),
        },
        precautions: fallback_precautions(product),
        suitable_for_sensitive_skin: suitable_for_sensitive_skin.to_string(),
    })
}

impl GenerationStep for ProductContentAgent {
    type Input = Product;
    type Output = ProductContent;

    const AGENT_ID: &'static str = "product_content";

    fn build_request(&self, product: &Product) -> GenerationRequest {
        self.settings
            .request(CONTENT_SYSTEM_PROMPT, Self::build_prompt(product))
    }

    fn parse_response(&self, content: &str, _product: &Product) -> AgentResult<ProductContent> {
        parse_json_payload(content)
    }

    fn validate(&self, content: &ProductContent, _product: &Product) -> Result<(), QualityIssue> {
        validate_content(content)
    }

    fn fallback(&self, product: &Product) -> AgentResult<ProductContent> {
        fallback_content(product)
    }

    fn item_count(content: &ProductContent) -> usize {
        content.key_features.len()
    }
}
