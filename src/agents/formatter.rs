//! Assembles the final pages from the accumulated step outputs.

use crate::models::{
    ComparisonData, ComparisonPage, ComparisonPageSummary, FaqItem, FaqPage, Page, Product,
    ProductContent, ProductPage, QuestionSet, GENERATED_BY,
};

use super::blocks::{ingredient_descriptions, pricing_block, safety_block, usage_block};
use super::error::{AgentError, AgentResult};

/// Pairs each question with its answer. Fails when the counts differ.
pub fn build_faq_page(
    product: &Product,
    questions: &QuestionSet,
    answers: &[String],
) -> AgentResult<FaqPage> {
    if questions.len() != answers.len() {
        return Err(AgentError::Formatting(format!(
            "FAQ needs one answer per question: {} questions, {} answers",
            questions.len(),
            answers.len()
        )));
    }

    let faqs: Vec<FaqItem> = questions
        .questions()
        .iter()
        .zip(answers)
        .map(|(q, answer)| FaqItem {
            question: q.question.clone(),
            answer: answer.clone(),
            category: q.category.clone(),
        })
        .collect();

    Ok(FaqPage {
        product_name: product.name.clone(),
        total_questions: faqs.len(),
        categories: questions.categories().iter().cloned().collect(),
        faqs,
        generated_by: GENERATED_BY.to_string(),
    })
}

pub fn build_product_page(product: &Product, content: &ProductContent) -> ProductPage {
    ProductPage {
        product_name: product.name.clone(),
        tagline: content.tagline.clone(),
        description: content.description.clone(),
        key_features: content.key_features.clone(),
        ingredients: ingredient_descriptions(product, content),
        usage_guide: usage_block(product, Some(&content.usage_highlights)),
        suitable_for: product.skin_types.clone(),
        benefits: product.benefits.clone(),
        safety_information: safety_block(product, content),
        pricing: pricing_block(product),
        generated_by: GENERATED_BY.to_string(),
    }
}

/// Copies the comparison and recomputes the win counts from its points.
pub fn build_comparison_page(comparison: &ComparisonData) -> AgentResult<ComparisonPage> {
    if comparison.comparison_points.is_empty() {
        return Err(AgentError::Formatting(
            "comparison has no points to display".to_string(),
        ));
    }

    Ok(ComparisonPage {
        product_a: comparison.product_a.clone(),
        product_b: comparison.product_b.clone(),
        comparison_points: comparison.comparison_points.clone(),
        summary: ComparisonPageSummary {
            winner: comparison.summary.winner.clone(),
            key_differences: comparison.summary.key_differences.clone(),
            win_counts: comparison.win_counts(),
        },
        recommendation: comparison.recommendation.clone(),
        generated_by: GENERATED_BY.to_string(),
    })
}

/// Everything the formatter reads.
#[derive(Debug, Clone, Copy)]
pub struct PageInputs<'a> {
    pub product: &'a Product,
    pub questions: &'a QuestionSet,
    pub answers: &'a [String],
    pub comparison: &'a ComparisonData,
    pub content: &'a ProductContent,
}

/// Builds the FAQ, product and comparison pages, in write order.
pub fn format_pages(inputs: PageInputs<'_>) -> AgentResult<Vec<Page>> {
    Ok(vec![
        Page::Faq(build_faq_page(inputs.product, inputs.questions, inputs.answers)?),
        Page::Product(build_product_page(inputs.product, inputs.content)),
        Page::Comparison(build_comparison_page(inputs.comparison)?),
    ])
}
