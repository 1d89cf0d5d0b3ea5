//! Answer generation step.
//!
//! All questions go out in a single request; the reply must carry exactly one
//! answer per question, in order.

use serde::Deserialize;

use crate::llm::GenerationRequest;
use crate::models::{Product, QuestionSet};

use super::data_parser::ensure_complete;
use super::error::AgentResult;
use super::step::{parse_json_payload, GenerationSettings, GenerationStep, QualityIssue};

/// Minimum trimmed length of an answer, in characters.
pub const MIN_ANSWER_CHARS: usize = 20;

const ANSWER_SYSTEM_PROMPT: &str = r#"You are a knowledgeable skincare expert providing helpful, accurate answers about products.

Answer based ONLY on the provided product information.
- Each answer should be 2-3 sentences max
- Be conversational but professional
- Answer directly without fluff
- Use specific product details"#;

const ANSWER_USER_TEMPLATE: &str = r#"Product Details:
Name: {product_name}
Concentration: {concentration}
Skin Types: {skin_types}
Ingredients: {ingredients}
Benefits: {benefits}
Usage Instructions: {usage}
Side Effects: {side_effects}
Price: {price}

Generate answers for these questions:

{questions_list}

Return a JSON array with one entry per question, in the same order:
[
  {"question": "question text 1", "answer": "answer text 1"},
  {"question": "question text 2", "answer": "answer text 2"}
]

IMPORTANT: Return ONLY the JSON array, no additional text."#;

const SIDE_EFFECT_DEFAULT: &str = "No significant side effects have been reported for this product. However, it's always recommended to perform a patch test before first use.";

const SHORT_ANSWER_SUFFIX: &str = "Please refer to the product packaging for full details.";

/// Product plus the questions to answer.
#[derive(Debug, Clone)]
pub struct AnswerInput {
    pub product: Product,
    pub questions: QuestionSet,
}

/// One reply item: a bare answer string or an object carrying `answer`.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerItem {
    Text(String),
    Object {
        #[serde(default)]
        answer: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnswersReply {
    List(Vec<AnswerItem>),
    Wrapped { answers: Vec<AnswerItem> },
}

/// Answers every question of a set in one batched call.
#[derive(Debug, Clone, Default)]
pub struct AnswerGeneratorAgent {
    settings: GenerationSettings,
}

impl AnswerGeneratorAgent {
    pub fn new(settings: GenerationSettings) -> Self {
        Self { settings }
    }

    fn build_prompt(input: &AnswerInput) -> String {
        let product = &input.product;
        let questions_list = input
            .questions
            .questions()
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. [{}] {}", i + 1, q.category, q.question))
            .collect::<Vec<_>>()
            .join("\n");

        ANSWER_USER_TEMPLATE
            .replace("{product_name}", &product.name)
            .replace("{concentration}", &product.concentration)
            .replace("{skin_types}", &product.skin_types.join(", "))
            .replace("{ingredients}", &product.key_ingredients.join(", "))
            .replace("{benefits}", &product.benefits.join(", "))
            .replace("{usage}", &product.usage_instructions)
            .replace("{side_effects}", product.side_effects_or_default())
            .replace("{price}", &product.price)
            .replace("{questions_list}", &questions_list)
    }
}

/// Checks answers against the answer quality contract.
pub fn validate_answers(answers: &[String], questions: &QuestionSet) -> Result<(), QualityIssue> {
    if answers.len() != questions.len() {
        return Err(QualityIssue::new(format!(
            "answer count ({}) != question count ({})",
            answers.len(),
            questions.len()
        )));
    }

    for (i, answer) in answers.iter().enumerate() {
        if answer.trim().chars().count() < MIN_ANSWER_CHARS {
            return Err(QualityIssue::new(format!(
                "answer {} is empty or shorter than {} characters",
                i + 1,
                MIN_ANSWER_CHARS
            )));
        }
    }

    Ok(())
}

/// Canned answer chosen by keywords in the question.
pub fn fallback_answer(product: &Product, question: &str) -> String {
    let q = question.to_lowercase();
    let name = &product.name;

    let answer = if q.contains("what is") {
        format!(
            "{} is a {} serum formulated for {} skin types.",
            name,
            product.concentration,
            product.skin_types.join(", ")
        )
    } else if q.contains("ingredient") {
        format!(
            "{} contains {} as key active ingredients.",
            name,
            product.key_ingredients.join(", ")
        )
    } else if q.contains("benefit") {
        format!(
            "{} provides {} benefits.",
            name,
            product.benefits.join(", ").to_lowercase()
        )
    } else if q.contains("how to use") || q.contains("how do i use") {
        product.usage_instructions.clone()
    } else if q.contains("side effect") {
        match product.side_effects.as_deref() {
            Some(effects) if effects.chars().count() > MIN_ANSWER_CHARS => effects.to_string(),
            _ => SIDE_EFFECT_DEFAULT.to_string(),
        }
    } else if q.contains("price") {
        format!("{} is priced at {}.", name, product.price)
    } else if q.contains("skin type") {
        format!(
            "{} is suitable for {} skin types.",
            name,
            product.skin_types.join(", ")
        )
    } else {
        format!(
            "For detailed information about {}, please refer to the product documentation or consult with a skincare professional.",
            q.replace('?', "")
        )
    };

    pad_answer(answer)
}

fn pad_answer(answer: String) -> String {
    let trimmed = answer.trim();
    if trimmed.chars().count() >= MIN_ANSWER_CHARS {
        return answer;
    }
    if trimmed.is_empty() {
        SHORT_ANSWER_SUFFIX.to_string()
    } else {
        format!("{} {}", trimmed, SHORT_ANSWER_SUFFIX)
    }
}

/// One canned answer per question, in question order.
pub fn fallback_answers(input: &AnswerInput) -> AgentResult<Vec<String>> {
    ensure_complete(&input.product)?;
    Ok(input
        .questions
        .questions()
        .iter()
        .map(|q| fallback_answer(&input.product, &q.question))
        .collect())
}

impl GenerationStep for AnswerGeneratorAgent {
    type Input = AnswerInput;
    type Output = Vec<String>;

    const AGENT_ID: &'static str = "answer_generator";

    fn build_request(&self, input: &AnswerInput) -> GenerationRequest {
        self.settings
            .request(ANSWER_SYSTEM_PROMPT, Self::build_prompt(input))
    }

    fn parse_response(&self, content: &str, _input: &AnswerInput) -> AgentResult<Vec<String>> {
        let items = match parse_json_payload::<AnswersReply>(content)? {
            AnswersReply::List(items) | AnswersReply::Wrapped { answers: items } => items,
        };
        Ok(items
            .into_iter()
            .map(|item| match item {
                AnswerItem::Text(answer) | AnswerItem::Object { answer } => answer.trim().to_string(),
            })
            .collect())
    }

    fn validate(&self, answers: &Vec<String>, input: &AnswerInput) -> Result<(), QualityIssue> {
        validate_answers(answers, &input.questions)
    }

    fn fallback(&self, input: &AnswerInput) -> AgentResult<Vec<String>> {
        fallback_answers(input)
    }

    fn item_count(answers: &Vec<String>) -> usize {
        answers.len()
    }

    fn calls_saved(&self, input: &AnswerInput) -> usize {
        input.questions.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::agents::questions::fallback_questions;
    use crate::agents::test_support::{fast_runner, glowboost, MockLlmProvider};
    use crate::agents::types::GenerationMethod;
    use crate::models::CategorizedQuestion;

    fn input() -> AnswerInput {
        let product = glowboost();
        let questions = fallback_questions(&product).unwrap();
        AnswerInput { product, questions }
    }

    #[test]
    fn test_fallback_count_and_length() {
        let input = input();
        let answers = fallback_answers(&input).unwrap();
        assert_eq!(answers.len(), input.questions.len());
        assert!(answers.iter().all(|a| a.trim().chars().count() >= MIN_ANSWER_CHARS));
        assert!(validate_answers(&answers, &input.questions).is_ok());
    }

    #[test]
    fn test_keyword_dispatch() {
        let product = glowboost();
        assert_eq!(
            fallback_answer(&product, "What is GlowBoost Vitamin C Serum?"),
            "GlowBoost Vitamin C Serum is a 10% Vitamin C serum formulated for Oily, Combination skin types."
        );
        assert_eq!(
            fallback_answer(&product, "How do I use GlowBoost Vitamin C Serum?"),
            "Apply 2–3 drops in the morning before sunscreen"
        );
        assert_eq!(
            fallback_answer(&product, "Are there any side effects?"),
            "Mild tingling for sensitive skin"
        );
        assert_eq!(
            fallback_answer(&product, "Does it have key benefits?"),
            "GlowBoost Vitamin C Serum provides brightening, fades dark spots benefits."
        );
        assert!(fallback_answer(&product, "Where can I buy it?").starts_with(
            "For detailed information about where can i buy it, please refer"
        ));
    }

    #[test]
    fn test_short_side_effects_use_default() {
        let mut product = glowboost();
        product.side_effects = Some("None".to_string());
        assert_eq!(fallback_answer(&product, "Any side effects?"), SIDE_EFFECT_DEFAULT);
        product.side_effects = None;
        assert_eq!(fallback_answer(&product, "Any side effects?"), SIDE_EFFECT_DEFAULT);
    }

    #[test]
    fn test_short_usage_is_padded() {
        let mut product = glowboost();
        product.usage_instructions = "Apply daily".to_string();
        let answer = fallback_answer(&product, "How to use it?");
        assert!(answer.starts_with("Apply daily "));
        assert!(answer.chars().count() >= MIN_ANSWER_CHARS);
    }

    #[test]
    fn test_validator_rules() {
        let questions = QuestionSet::new(vec![
            CategorizedQuestion::new("Usage", "How do I use it?", 1),
            CategorizedQuestion::new("Safety", "Is it safe for me?", 1),
        ]);
        let long = "This answer is comfortably long enough.".to_string();

        assert!(validate_answers(&[long.clone()], &questions).is_err());
        assert!(validate_answers(&[long.clone(), "   short answer    ".to_string()], &questions)
            .unwrap_err()
            .0
            .contains("answer 2"));
        assert!(validate_answers(&[long.clone(), long], &questions).is_ok());
    }

    #[test]
    fn test_reply_items_as_strings_or_objects() {
        let agent = AnswerGeneratorAgent::default();
        let reply = r#"[{"question": "q1", "answer": " first answer "}, "second answer"]"#;
        let answers = agent.parse_response(reply, &input()).unwrap();
        assert_eq!(answers, vec!["first answer", "second answer"]);
    }

    #[test]
    fn test_prompt_numbers_questions() {
        let prompt = AnswerGeneratorAgent::build_prompt(&input());
        assert!(prompt.contains("1. [Informational] What is GlowBoost Vitamin C Serum?"));
        assert!(prompt.contains("23. [Ingredients]"));
    }

    #[tokio::test]
    async fn test_count_mismatch_falls_back_in_one_call() {
        let mock = Arc::new(MockLlmProvider::with_responses(vec![Ok(
            r#"["Only one answer that is long enough to pass."]"#.to_string(),
        )]));
        let (runner, _) = fast_runner(mock.clone());
        let input = input();
        let output = runner.run(&AnswerGeneratorAgent::default(), &input).await;

        assert!(output.success);
        assert_eq!(output.metadata.method, GenerationMethod::Fallback);
        assert_eq!(output.metadata.api_calls_saved, input.questions.len() - 1);
        assert_eq!(output.data.unwrap().len(), input.questions.len());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generated_answers_accepted() {
        let input = input();
        let reply: Vec<serde_json::Value> = input
            .questions
            .questions()
            .iter()
            .enumerate()
            .map(|(i, q)| {
                serde_json::json!({
                    "question": q.question,
                    "answer": format!("Generated answer number {} for this question.", i + 1),
                })
            })
            .collect();
        let mock = Arc::new(MockLlmProvider::with_responses(vec![Ok(format!(
            "```json\n{}\n```",
            serde_json::Value::Array(reply)
        ))]));
        let (runner, _) = fast_runner(mock.clone());

        let output = runner.run(&AnswerGeneratorAgent::default(), &input).await;
        assert!(output.success);
        assert_eq!(output.metadata.method, GenerationMethod::Llm);
        assert_eq!(output.metadata.validation_passed, Some(true));
        assert_eq!(output.metadata.api_calls, 1);
        assert_eq!(output.metadata.api_calls_saved, input.questions.len() - 1);

        let answers = output.data.unwrap();
        assert_eq!(answers.len(), input.questions.len());
        assert_eq!(answers[0], "Generated answer number 1 for this question.");
        assert_eq!(mock.call_count(), 1);

        let prompts = mock.prompts();
        assert_eq!(prompts.len(), 1);
        for question in input.questions.questions() {
            assert!(prompts[0].contains(&question.question), "missing {}", question.question);
        }
    }

    #[tokio::test]
    async fn test_wrapped_answers_reply_accepted() {
        let questions = QuestionSet::new(vec![
            CategorizedQuestion::new("Usage", "How do I use it?", 1),
            CategorizedQuestion::new("Safety", "Is it safe for me?", 1),
        ]);
        let input = AnswerInput {
            product: glowboost(),
            questions,
        };
        let mock = Arc::new(MockLlmProvider::with_responses(vec![Ok(
            r#"{"answers": ["Apply two drops every morning.", "Yes, after a patch test on your arm."]}"#
                .to_string(),
        )]));
        let (runner, _) = fast_runner(mock.clone());

        let output = runner.run(&AnswerGeneratorAgent::default(), &input).await;
        assert_eq!(output.metadata.method, GenerationMethod::Llm);
        assert_eq!(output.metadata.validation_passed, Some(true));
        assert_eq!(output.data.unwrap()[1], "Yes, after a patch test on your arm.");
        assert_eq!(mock.call_count(), 1);
    }
}
