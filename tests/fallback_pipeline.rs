//! End-to-end runs where every generation call fails.

use std::path::Path;
use std::sync::Arc;

use content_forge::agents::product_content::SUNSCREEN_PRECAUTION;
use content_forge::agents::GenerationMethod;
use content_forge::cli::sample_product;
use content_forge::llm::OfflineProvider;
use content_forge::models::{Page, PageKind, GENERATED_BY};
use content_forge::pipeline::{ContentOrchestrator, PageStore, PipelineConfig, WorkflowStage};
use serde_json::Value;

fn offline_orchestrator(dir: &Path) -> ContentOrchestrator {
    let config = PipelineConfig::new().with_output_dir(dir);
    ContentOrchestrator::new(Arc::new(OfflineProvider), config)
}

fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).expect("page file should exist");
    serde_json::from_str(&text).expect("page file should be valid JSON")
}

#[tokio::test]
async fn test_glowboost_completes_on_fallbacks() {
    let dir = tempfile::tempdir().unwrap();
    let summary = offline_orchestrator(dir.path()).run(&sample_product()).await;

    assert!(summary.is_success(), "errors: {:?}", summary.errors);
    assert_eq!(summary.fallbacks_used, 4);
    assert_eq!(summary.api_calls_made, 0);
    for agent in ["question_generator", "answer_generator", "comparison", "product_content"] {
        assert_eq!(summary.method_of(agent), Some(GenerationMethod::Fallback));
    }
    assert_eq!(summary.files.len(), 3);

    let store = PageStore::new(dir.path());

    let faq = read_json(&dir.path().join("faq.json"));
    assert_eq!(faq["page_type"], "faq");
    assert_eq!(faq["generated_by"], GENERATED_BY);
    let faqs = faq["faqs"].as_array().unwrap();
    assert!(faqs.len() >= 15);
    assert_eq!(faq["total_questions"].as_u64(), Some(faqs.len() as u64));
    for item in faqs {
        assert!(item["question"].as_str().unwrap().ends_with('?'));
        assert!(item["answer"].as_str().unwrap().trim().chars().count() >= 20);
    }

    match store.load(PageKind::ProductPage).await.unwrap() {
        Page::Product(page) => {
            assert!(page.key_features.len() >= 3);
            assert!(page.safety_information.precautions.len() >= 2);
            assert!(page
                .safety_information
                .precautions
                .iter()
                .any(|p| p == SUNSCREEN_PRECAUTION));
            assert_eq!(page.pricing.currency, "INR");
            assert_eq!(page.pricing.amount, Some(699));
        }
        other => panic!("unexpected page: {:?}", other.kind()),
    }

    match store.load(PageKind::Comparison).await.unwrap() {
        Page::Comparison(page) => {
            assert!(page.comparison_points.len() >= 5);
            assert!(!page.product_b.name.is_empty());
            let total: usize = page.summary.win_counts.values().sum();
            assert_eq!(total, page.comparison_points.len());
        }
        other => panic!("unexpected page: {:?}", other.kind()),
    }

    let raw = std::fs::read_to_string(dir.path().join("product_page.json")).unwrap();
    assert!(raw.contains("₹699"), "non-ASCII should be written verbatim");
}

#[tokio::test]
async fn test_fallback_output_is_byte_identical_across_runs() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let a = offline_orchestrator(first.path()).run(&sample_product()).await;
    let b = offline_orchestrator(second.path()).run(&sample_product()).await;
    assert!(a.is_success() && b.is_success());
    assert_ne!(a.run_id, b.run_id);

    for kind in PageKind::ALL {
        let left = std::fs::read(first.path().join(kind.file_name())).unwrap();
        let right = std::fs::read(second.path().join(kind.file_name())).unwrap();
        assert_eq!(left, right, "{} differs between runs", kind);
    }
    let digests = |s: &content_forge::WorkflowSummary| {
        s.files.iter().map(|f| f.sha256.clone()).collect::<Vec<_>>()
    };
    assert_eq!(digests(&a), digests(&b));
}

#[tokio::test]
async fn test_missing_required_field_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("pages");
    let mut raw = sample_product();
    raw.as_object_mut().unwrap().remove("key_ingredients");
    raw.as_object_mut().unwrap().remove("how_to_use");

    let summary = offline_orchestrator(&out).run(&raw).await;

    assert!(!summary.is_success());
    assert_eq!(summary.status, WorkflowStage::Failed);
    assert_eq!(summary.failed_stage, Some(WorkflowStage::ParsingData));
    assert!(summary.errors[0].contains("key_ingredients"));
    assert!(summary.errors[0].contains("how_to_use"));
    assert!(summary.files.is_empty());
    assert!(!out.exists());
}

#[tokio::test]
async fn test_optional_side_effects_may_be_null() {
    let dir = tempfile::tempdir().unwrap();
    let mut raw = sample_product();
    raw["side_effects"] = Value::Null;

    let summary = offline_orchestrator(dir.path()).run(&raw).await;
    assert!(summary.is_success(), "errors: {:?}", summary.errors);

    let product = read_json(&dir.path().join("product_page.json"));
    assert_eq!(product["safety_information"]["side_effects"], "None reported");
}
