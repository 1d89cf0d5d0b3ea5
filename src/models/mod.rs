//! Data contracts shared by the pipeline steps.

pub mod comparison;
pub mod content;
pub mod pages;
pub mod product;

pub use comparison::{
    ComparisonData, ComparisonPoint, ComparisonSummary, WINNER_COMPARABLE, WINNER_TIE,
};
pub use content::{ProductContent, UsageHighlights};
pub use pages::{
    ComparisonPage, ComparisonPageSummary, FaqItem, FaqPage, Page, PageKind, Pricing,
    ProductPage, SafetyInformation, UsageGuide, GENERATED_BY,
};
pub use product::{split_list, CategorizedQuestion, Product, ProductProfile, QuestionSet};
