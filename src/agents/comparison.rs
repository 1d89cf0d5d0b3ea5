//! Competitor comparison step.
//!
//! One request produces both the fictional competitor and the comparison
//! against it. The fallback compares against a fixed alternative product with
//! a fixed winner table.

use serde::Deserialize;

use crate::llm::GenerationRequest;
use crate::models::{
    ComparisonData, ComparisonPoint, ComparisonSummary, Product, ProductProfile,
    WINNER_COMPARABLE,
};

use super::data_parser::ensure_complete;
use super::error::AgentResult;
use super::step::{parse_json_payload, GenerationSettings, GenerationStep, QualityIssue};

/// Minimum number of comparison points.
pub const MIN_COMPARISON_POINTS: usize = 5;

/// Multiplier applied to the product's concentration for the fallback
/// competitor.
pub const COMPETITOR_CONCENTRATION_FACTOR: f64 = 1.2;

const COMPARISON_SYSTEM_PROMPT: &str = r#"You are an expert skincare product analyst with deep knowledge of cosmetic formulations, market positioning, and consumer needs.

Generate a realistic fictional competing product AND a comparison analysis in ONE response.

Competitor: a believable product in the same category with a distinct brand name, a comparable but different formulation, a realistic price, 2-4 skin types, 3-5 key ingredients and 2-4 benefits.

Comparison: at least 7 points (price & value, active concentration, ingredient complexity, targeted skin types, claimed benefits, usage convenience, market positioning). Give specific values for both products and a clear winner for each point, or "Tie" when truly equal. Base winners on objective criteria."#;

const COMPARISON_USER_TEMPLATE: &str = r#"Original Product to Compare Against:
Name: {product_name}
Concentration: {concentration}
Price: {price}
Skin Types: {skin_types}
Key Ingredients: {ingredients}
Benefits: {benefits}

Return ONLY this JSON structure:
{
  "competitor": {
    "name": "Competitor product name",
    "concentration": "X% Active Ingredient Name",
    "skin_types": ["Type1", "Type2"],
    "key_ingredients": ["Ingredient1", "Ingredient2", "Ingredient3"],
    "benefits": ["Benefit1", "Benefit2"],
    "price": "₹XXX"
  },
  "comparison_points": [
    {"attribute": "Price & Value", "product_a": "value", "product_b": "value", "winner": "Product Name"}
  ],
  "summary": {
    "winner": "Product name that wins most comparison points",
    "key_differences": "1-2 sentence summary of the main differentiators"
  },
  "recommendation": "One sentence recommending which product to choose and for whom"
}"#;

const FALLBACK_SKIN_TYPES: [&str; 1] = ["All Skin Types"];
const FALLBACK_INGREDIENTS: [&str; 3] = ["Vitamin E", "Hyaluronic Acid", "Peptides"];
const FALLBACK_BENEFITS: [&str; 3] = ["Hydration", "Anti-aging", "Brightening"];
const FALLBACK_PRICE: &str = "₹999";
const FALLBACK_CONCENTRATION: &str = "15% Active";

#[derive(Default, Deserialize)]
#[serde(default)]
struct ComparisonReply {
    competitor: ProductProfile,
    comparison_points: Vec<ComparisonPoint>,
    summary: ComparisonSummary,
    recommendation: String,
}

/// Generates a competitor and compares the product against it.
#[derive(Debug, Clone, Default)]
pub struct ComparisonAgent {
    settings: GenerationSettings,
}

impl ComparisonAgent {
    pub fn new(settings: GenerationSettings) -> Self {
        Self { settings }
    }

    fn build_prompt(product: &Product) -> String {
        COMPARISON_USER_TEMPLATE
            .replace("{product_name}", &product.name)
            .replace("{concentration}", &product.concentration)
            .replace("{price}", &product.price)
            .replace("{skin_types}", &product.skin_types.join(", "))
            .replace("{ingredients}", &product.key_ingredients.join(", "))
            .replace("{benefits}", &product.benefits.join(", "))
    }
}

/// Checks comparison data against the comparison quality contract.
pub fn validate_comparison(data: &ComparisonData) -> Result<(), QualityIssue> {
    let mut missing = Vec::new();
    if data.product_a.name.trim().is_empty() {
        missing.push("product_a");
    }
    if data.product_b == ProductProfile::default() {
        missing.push("product_b");
    }
    if data.comparison_points.is_empty() {
        missing.push("comparison_points");
    }
    if data.summary.is_empty() {
        missing.push("summary");
    }
    if data.recommendation.trim().is_empty() {
        missing.push("recommendation");
    }
    if !missing.is_empty() {
        return Err(QualityIssue::new(format!(
            "missing keys: {}",
            missing.join(", ")
        )));
    }

    if data.comparison_points.len() < MIN_COMPARISON_POINTS {
        return Err(QualityIssue::new(format!(
            "expected at least {} comparison points, got {}",
            MIN_COMPARISON_POINTS,
            data.comparison_points.len()
        )));
    }

    if data.competitor_name().trim().is_empty() {
        return Err(QualityIssue::new("competitor has no name"));
    }

    Ok(())
}

/// Concentration of the fallback competitor: the product's percentage scaled
/// by [`COMPETITOR_CONCENTRATION_FACTOR`], or a fixed value when the product's
/// concentration has no leading number.
pub fn competitor_concentration(product: &Product) -> String {
    match product.concentration_percent() {
        Some(percent) => format!("{:.1}% Active", percent * COMPETITOR_CONCENTRATION_FACTOR),
        None => FALLBACK_CONCENTRATION.to_string(),
    }
}

/// Fixed alternative product derived from the product's first name token.
pub fn fallback_competitor(product: &Product) -> ProductProfile {
    let token = product.name.split_whitespace().next().unwrap_or("Premium");
    ProductProfile {
        name: format!("Alternative {} Serum", token),
        concentration: competitor_concentration(product),
        skin_types: FALLBACK_SKIN_TYPES.iter().map(|s| s.to_string()).collect(),
        key_ingredients: FALLBACK_INGREDIENTS.iter().map(|s| s.to_string()).collect(),
        benefits: FALLBACK_BENEFITS.iter().map(|s| s.to_string()).collect(),
        price: FALLBACK_PRICE.to_string(),
    }
}

/// Five-point comparison against [`fallback_competitor`].
///
/// Winners are fixed: price goes to the product, skin types to the
/// competitor, everything else is comparable.
pub fn fallback_comparison(product: &Product) -> AgentResult<ComparisonData> {
    ensure_complete(product)?;

    let a = product.profile();
    let b = fallback_competitor(product);

    let comparison_points = vec![
        ComparisonPoint::new("Price", a.price.as_str(), b.price.as_str(), a.name.as_str()),
        ComparisonPoint::new(
            "Concentration",
            a.concentration.as_str(),
            b.concentration.as_str(),
            WINNER_COMPARABLE,
        ),
        ComparisonPoint::new(
            "Ingredients",
            format!("{} actives", a.key_ingredients.len()),
            format!("{} actives", b.key_ingredients.len()),
            WINNER_COMPARABLE,
        ),
        ComparisonPoint::new(
            "Skin Types",
            a.skin_types.join(", "),
            b.skin_types.join(", "),
            b.name.as_str(),
        ),
        ComparisonPoint::new(
            "Benefits",
            format!("{} benefits", a.benefits.len()),
            format!("{} benefits", b.benefits.len()),
            WINNER_COMPARABLE,
        ),
    ];

    let summary = ComparisonSummary {
        winner: a.name.clone(),
        key_differences: format!(
            "{} offers targeted formulation while {} provides broader compatibility.",
            a.name, b.name
        ),
    };
    let recommendation = format!(
        "Choose {} for specialized skincare needs, or {} for versatile daily use.",
        a.name, b.name
    );

    Ok(ComparisonData {
        product_a: a,
        product_b: b,
        comparison_points,
        summary,
        recommendation,
    })
}

impl GenerationStep for ComparisonAgent {
    type Input = Product;
    type Output = ComparisonData;

    const AGENT_ID: &'static str = "comparison";

    fn build_request(&self, product: &Product) -> GenerationRequest {
        self.settings
            .request(COMPARISON_SYSTEM_PROMPT, Self::build_prompt(product))
    }

    fn parse_response(&self, content: &str, product: &Product) -> AgentResult<ComparisonData> {
        let reply: ComparisonReply = parse_json_payload(content)?;
        Ok(ComparisonData {
            product_a: product.profile(),
            product_b: reply.competitor,
            comparison_points: reply.comparison_points,
            summary: reply.summary,
            recommendation: reply.recommendation.trim().to_string(),
        })
    }

    fn validate(&self, data: &ComparisonData, _product: &Product) -> Result<(), QualityIssue> {
        validate_comparison(data)
    }

    fn fallback(&self, product: &Product) -> AgentResult<ComparisonData> {
        fallback_comparison(product)
    }

    fn item_count(data: &ComparisonData) -> usize {
        data.comparison_points.len()
    }
}
