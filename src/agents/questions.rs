//! Question generation step.
//!
//! Produces the categorized user questions that drive the FAQ page. One
//! request asks for the whole batch; the template catalog below covers the
//! same categories when the reply is unusable.

use serde::Deserialize;

use crate::llm::GenerationRequest;
use crate::models::{CategorizedQuestion, Product, QuestionSet};

use super::data_parser::ensure_complete;
use super::error::AgentResult;
use super::step::{parse_json_payload, GenerationSettings, GenerationStep, QualityIssue};

/// Minimum number of questions a set must contain.
pub const MIN_QUESTIONS: usize = 15;

/// Categories every question set must cover.
pub const REQUIRED_CATEGORIES: [&str; 3] = ["Informational", "Usage", "Safety"];

/// Minimum length of a question, in characters.
pub const MIN_QUESTION_CHARS: usize = 10;

const QUESTION_SYSTEM_PROMPT: &str = r#"You are an expert at generating realistic user questions about skincare products.

Generate natural, conversational questions a real customer would ask before buying or while using the product. Every question must end with a question mark."#;

const QUESTION_USER_TEMPLATE: &str = r#"Generate exactly 20 diverse questions across these categories:
- Informational (4 questions): what it is, what it does, key features
- Usage (3 questions): how to use, when to apply, application tips
- Safety (3 questions): side effects, precautions, skin sensitivity
- Skin Type (3 questions): suitability for different skin types
- Purchase (3 questions): price, where to buy, value
- Comparison (2 questions): how it compares to competitors
- Results (2 questions): expected outcomes, timeline

Product Details:
Name: {product_name}
Concentration: {concentration}
Skin Types: {skin_types}
Ingredients: {ingredients}
Benefits: {benefits}
Usage: {usage}
Side Effects: {side_effects}
Price: {price}

Return ONLY a JSON array with this exact structure:
[
  {"category": "Informational", "question": "What is the product?", "priority": 1},
  {"category": "Usage", "question": "How do I use it?", "priority": 1}
]"#;

/// Fallback catalog: (category, template). Priority is the position within
/// the category.
const QUESTION_TEMPLATES: [(&str, &str); 23] = [
    ("Informational", "What is {name}?"),
    ("Informational", "What are the key ingredients in {name}?"),
    ("Informational", "What is the concentration of active ingredients in {name}?"),
    ("Informational", "What are the main benefits of using {name}?"),
    ("Usage", "How do I use {name}?"),
    ("Usage", "When should I apply {name}?"),
    ("Usage", "How many drops of {name} should I use?"),
    ("Usage", "Can I use {name} with other skincare products?"),
    ("Safety", "Are there any side effects of {name}?"),
    ("Safety", "Is {name} safe for sensitive skin?"),
    ("Safety", "What should I do if I experience irritation from {name}?"),
    ("Skin Type", "Is {name} suitable for {skin_a} skin?"),
    ("Skin Type", "Can people with {skin_b} skin use {name}?"),
    ("Skin Type", "What skin types is {name} best for?"),
    ("Purchase", "What is the price of {name}?"),
    ("Purchase", "Where can I buy {name}?"),
    ("Purchase", "Is {name} worth the price?"),
    ("Comparison", "How does {name} compare to other {ingredient_a} serums?"),
    ("Comparison", "What makes {name} different from other serums?"),
    ("Results", "How long does it take to see results from {name}?"),
    ("Results", "What results can I expect from {name}?"),
    ("Ingredients", "What does {ingredient_a} do in {name}?"),
    ("Ingredients", "Why is {ingredient_b} important in {name}?"),
];

/// Accepts a bare array or an object wrapping it under `questions`.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionsReply {
    List(Vec<CategorizedQuestion>),
    Wrapped { questions: Vec<CategorizedQuestion> },
}

/// Generates the question set for a product.
#[derive(Debug, Clone, Default)]
pub struct QuestionGeneratorAgent {
    settings: GenerationSettings,
}

impl QuestionGeneratorAgent {
    pub fn new(settings: GenerationSettings) -> Self {
        Self { settings }
    }

    fn build_prompt(product: &Product) -> String {
        QUESTION_USER_TEMPLATE
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

/// Checks a question set against the question quality contract.
pub fn validate_questions(set: &QuestionSet) -> Result<(), QualityIssue> {
    if set.len() < MIN_QUESTIONS {
        return Err(QualityIssue::new(format!(
            "expected at least {} questions, got {}",
            MIN_QUESTIONS,
            set.len()
        )));
    }

    let missing: Vec<&str> = REQUIRED_CATEGORIES
        .iter()
        .copied()
        .filter(|category| !set.has_category(category))
        .collect();
    if !missing.is_empty() {
        return Err(QualityIssue::new(format!(
            "missing required categories: {}",
            missing.join(", ")
        )));
    }

    for (i, q) in set.questions().iter().enumerate() {
        let text = q.question.trim();
        if text.chars().count() < MIN_QUESTION_CHARS {
            return Err(QualityIssue::new(format!(
                "question {} is shorter than {} characters",
                i + 1,
                MIN_QUESTION_CHARS
            )));
        }
        if !text.ends_with('?') {
            return Err(QualityIssue::new(format!(
                "question {} does not end with '?'",
                i + 1
            )));
        }
    }

    Ok(())
}

/// Template catalog filled in from the product.
pub fn fallback_questions(product: &Product) -> AgentResult<QuestionSet> {
    ensure_complete(product)?;

    let name = product.name.as_str();
    let skin_a = product.skin_types[0].to_lowercase();
    let skin_b = product
        .skin_types
        .get(1)
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| skin_a.clone());
    let ingredient_a = product.key_ingredients[0].as_str();
    let ingredient_b = product
        .key_ingredients
        .get(1)
        .map(String::as_str)
        .unwrap_or(ingredient_a);

    let mut questions = Vec::with_capacity(QUESTION_TEMPLATES.len());
    let mut previous_category = "";
    let mut priority = 0;
    for (category, template) in QUESTION_TEMPLATES {
        priority = if category == previous_category { priority + 1 } else { 1 };
        previous_category = category;

        let text = template
            .replace("{name}", name)
            .replace("{skin_a}", &skin_a)
            .replace("{skin_b}", &skin_b)
            .replace("{ingredient_a}", ingredient_a)
            .replace("{ingredient_b}", ingredient_b);
        questions.push(CategorizedQuestion::new(category, text, priority));
    }

    Ok(QuestionSet::new(questions))
}

impl GenerationStep for QuestionGeneratorAgent {
    type Input = Product;
    type Output = QuestionSet;

    const AGENT_ID: &'static str = "question_generator";

    fn build_request(&self, product: &Product) -> GenerationRequest {
        self.settings
            .request(QUESTION_SYSTEM_PROMPT, Self::build_prompt(product))
    }

    fn parse_response(&self, content: &str, _product: &Product) -> AgentResult<QuestionSet> {
        let questions = match parse_json_payload::<QuestionsReply>(content)? {
            QuestionsReply::List(questions) | QuestionsReply::Wrapped { questions } => questions,
        };
        Ok(QuestionSet::new(
            questions
                .into_iter()
                .map(|q| CategorizedQuestion::new(q.category.trim(), q.question.trim(), q.priority))
                .collect(),
        ))
    }

    fn validate(&self, set: &QuestionSet, _product: &Product) -> Result<(), QualityIssue> {
        validate_questions(set)
    }

    fn fallback(&self, product: &Product) -> AgentResult<QuestionSet> {
        fallback_questions(product)
    }

    fn item_count(set: &QuestionSet) -> usize {
        set.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::agents::test_support::{fast_runner, glowboost, MockLlmProvider};
    use crate::agents::types::GenerationMethod;

    fn generated_reply(count: usize) -> String {
        let categories = ["Informational", "Usage", "Safety", "Results"];
        let items: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "category": categories[i % categories.len()],
                    "question": format!("Is this generated question number {}?", i + 1),
                    "priority": 1 + i / categories.len(),
                })
            })
            .collect();
        format!("```json\n{}\n```", serde_json::Value::Array(items))
    }

    #[test]
    fn test_fallback_catalog_passes_validation() {
        let set = fallback_questions(&glowboost()).unwrap();
        assert_eq!(set.len(), 23);
        assert!(validate_questions(&set).is_ok());
        for category in ["Skin Type", "Purchase", "Comparison", "Results", "Ingredients"] {
            assert!(set.has_category(category), "missing {}", category);
        }
        assert!(set
            .questions()
            .iter()
            .all(|q| q.question.contains("GlowBoost Vitamin C Serum")));
    }

    #[test]
    fn test_fallback_uses_product_attributes() {
        let set = fallback_questions(&glowboost()).unwrap();
        let texts: Vec<&str> = set.questions().iter().map(|q| q.question.as_str()).collect();
        assert!(texts.contains(&"Is GlowBoost Vitamin C Serum suitable for oily skin?"));
        assert!(texts.contains(&"Can people with combination skin use GlowBoost Vitamin C Serum?"));
        assert!(texts.contains(&"Why is Hyaluronic Acid important in GlowBoost Vitamin C Serum?"));
    }

    #[test]
    fn test_fallback_priorities_restart_per_category() {
        let set = fallback_questions(&glowboost()).unwrap();
        let qs = set.questions();
        assert_eq!(qs[0].priority, 1);
        assert_eq!(qs[3].priority, 4);
        assert_eq!(qs[4].category, "Usage");
        assert_eq!(qs[4].priority, 1);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let a = serde_json::to_string(&fallback_questions(&glowboost()).unwrap()).unwrap();
        let b = serde_json::to_string(&fallback_questions(&glowboost()).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fallback_rejects_incomplete_product() {
        let mut product = glowboost();
        product.key_ingredients.clear();
        assert!(fallback_questions(&product).is_err());
    }

    #[test]
    fn test_validator_rules() {
        let set = |questions: Vec<CategorizedQuestion>| QuestionSet::new(questions);
        let mut base: Vec<CategorizedQuestion> = fallback_questions(&glowboost())
            .unwrap()
            .questions()
            .to_vec();

        assert!(validate_questions(&set(base[..14].to_vec())).is_err());

        let no_safety: Vec<_> = base.iter().filter(|q| q.category != "Safety").cloned().collect();
        let err = validate_questions(&set(no_safety)).unwrap_err();
        assert!(err.0.contains("Safety"));

        base[5].question = "Why?".to_string();
        assert!(validate_questions(&set(base.clone())).unwrap_err().0.contains("shorter"));

        base[5].question = "Tell me how to apply it.".to_string();
        assert!(validate_questions(&set(base)).unwrap_err().0.contains("'?'"));
    }

    #[test]
    fn test_prompt_carries_product_fields() {
        let prompt = QuestionGeneratorAgent::build_prompt(&glowboost());
        assert!(prompt.contains("Name: GlowBoost Vitamin C Serum"));
        assert!(prompt.contains("Skin Types: Oily, Combination"));
        assert!(prompt.contains("Price: ₹699"));
        assert!(!prompt.contains("{product_name}"));
    }

    #[tokio::test]
    async fn test_generated_set_accepted() {
        let mock = Arc::new(MockLlmProvider::with_responses(vec![Ok(generated_reply(16))]));
        let (runner, _) = fast_runner(mock.clone());
        let output = runner
            .run(&QuestionGeneratorAgent::default(), &glowboost())
            .await;

        assert_eq!(output.metadata.method, GenerationMethod::Llm);
        let set = output.data.unwrap();
        assert_eq!(set.len(), 16);
        assert_eq!(set.categories().len(), 4);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_short_generated_set_falls_back() {
        let mock = Arc::new(MockLlmProvider::with_responses(vec![Ok(generated_reply(10))]));
        let (runner, _) = fast_runner(mock);
        let output = runner
            .run(&QuestionGeneratorAgent::default(), &glowboost())
            .await;

        assert!(output.success);
        assert_eq!(output.metadata.method, GenerationMethod::Fallback);
        assert_eq!(output.data.unwrap().len(), 23);
    }

    #[test]
    fn test_wrapped_reply_parsed() {
        let reply = r#"{"questions": [{"category": "Usage", "question": " How often? "}]}"#;
        let set = QuestionGeneratorAgent::default()
            .parse_response(reply, &glowboost())
            .unwrap();
        assert_eq!(set.questions()[0].question, "How often?");
        assert_eq!(set.questions()[0].priority, 1);
    }
}
