//! Parses the raw product mapping into a [`Product`].
//!
//! There is no fallback here: without a product nothing downstream can run,
//! so every problem is reported as a failed output.

use serde_json::{Map, Value};

use crate::models::Product;

use super::error::{AgentError, AgentResult};
use super::types::{AgentOutput, GenerationMethod, StepMetadata};

/// Keys the raw mapping must contain, in reporting order.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "product_name",
    "concentration",
    "skin_type",
    "key_ingredients",
    "benefits",
    "how_to_use",
    "price",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DataParserAgent;

impl DataParserAgent {
    pub const AGENT_NAME: &'static str = "data_parser";

    pub fn new() -> Self {
        Self
    }

    /// Parses and checks the product, wrapping the result.
    pub fn run(&self, raw: &Value) -> AgentOutput<Product> {
        let metadata = StepMetadata::new(Self::AGENT_NAME, GenerationMethod::Deterministic);
        let parsed = self
            .parse(raw)
            .and_then(|product| ensure_complete(&product).map(|()| product));

        match parsed {
            Ok(product) => {
                let metadata = metadata
                    .with_items(1)
                    .with_note(format!("skin_types: {}", product.skin_types.len()))
                    .with_note(format!("key_ingredients: {}", product.key_ingredients.len()))
                    .with_note(format!("benefits: {}", product.benefits.len()));
                AgentOutput::success(product, metadata)
            }
            Err(e) => AgentOutput::failure(vec![e.to_string()], metadata),
        }
    }

    /// Builds a product from the raw mapping. All missing keys are reported
    /// together.
    pub fn parse(&self, raw: &Value) -> AgentResult<Product> {
        let map = raw
            .as_object()
            .ok_or_else(|| AgentError::InvalidInput("expected a JSON object".to_string()))?;

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|key| !map.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AgentError::MissingFields(missing));
        }

        Ok(Product::new(
            required_str(map, "product_name")?,
            required_str(map, "concentration")?,
            required_str(map, "skin_type")?,
            required_str(map, "key_ingredients")?,
            required_str(map, "benefits")?,
            required_str(map, "how_to_use")?,
            optional_str(map, "side_effects")?,
            required_str(map, "price")?,
        ))
    }
}

/// Fails with [`AgentError::IncompleteProduct`] when a list field is empty
/// after normalization.
pub fn ensure_complete(product: &Product) -> AgentResult<()> {
    let empty = product.empty_list_fields();
    if empty.is_empty() {
        Ok(())
    } else {
        Err(AgentError::IncompleteProduct(empty.join(", ")))
    }
}

fn required_str<'a>(map: &'a Map<String, Value>, key: &str) -> AgentResult<&'a str> {
    match map.get(key) {
        Some(Value::String(s)) if s.trim().is_empty() => Err(AgentError::InvalidField {
            field: key.to_string(),
            reason: "must not be blank".to_string(),
        }),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(AgentError::InvalidField {
            field: key.to_string(),
            reason: format!("expected a string, found {}", type_name(other)),
        }),
        None => Err(AgentError::MissingFields(vec![key.to_string()])),
    }
}

fn optional_str(map: &Map<String, Value>, key: &str) -> AgentResult<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(AgentError::InvalidField {
            field: key.to_string(),
            reason: format!("expected a string or null, found {}", type_name(other)),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw() -> Value {
        json!({
            "product_name": "GlowBoost Vitamin C Serum",
            "concentration": "10% Vitamin C",
            "skin_type": "Oily, Combination",
            "key_ingredients": "Vitamin C, Hyaluronic Acid",
            "benefits": "Brightening, Fades dark spots",
            "how_to_use": "Apply 2–3 drops in the morning before sunscreen",
            "side_effects": "Mild tingling for sensitive skin",
            "price": "₹699"
        })
    }

    #[test]
    fn test_parse_valid_input() {
        let output = DataParserAgent::new().run(&raw());
        assert!(output.success);
        assert_eq!(output.metadata.method, GenerationMethod::Deterministic);

        let product = output.data.unwrap();
        assert_eq!(product.name, "GlowBoost Vitamin C Serum");
        assert_eq!(product.skin_types, vec!["Oily", "Combination"]);
        assert_eq!(product.key_ingredients, vec!["Vitamin C", "Hyaluronic Acid"]);
        assert_eq!(product.benefits, vec!["Brightening", "Fades dark spots"]);
        assert_eq!(product.usage_instructions, "Apply 2–3 drops in the morning before sunscreen");
        assert_eq!(product.price, "₹699");
    }

    #[test]
    fn test_missing_keys_reported_together() {
        let mut input = raw();
        let map = input.as_object_mut().unwrap();
        map.remove("price");
        map.remove("skin_type");

        match DataParserAgent::new().parse(&input) {
            Err(AgentError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["skin_type".to_string(), "price".to_string()]);
            }
            other => panic!("expected missing fields, got {:?}", other),
        }
    }

    #[test]
    fn test_side_effects_optional() {
        let mut input = raw();
        input.as_object_mut().unwrap().remove("side_effects");
        let product = DataParserAgent::new().parse(&input).unwrap();
        assert_eq!(product.side_effects, None);

        input["side_effects"] = Value::Null;
        assert!(DataParserAgent::new().parse(&input).is_ok());
    }

    #[test]
    fn test_non_string_field_rejected() {
        let mut input = raw();
        input["price"] = json!(699);
        let err = DataParserAgent::new().parse(&input).unwrap_err();
        assert!(matches!(err, AgentError::InvalidField { ref field, .. } if field == "price"));
    }

    #[test]
    fn test_not_an_object() {
        let err = DataParserAgent::new().parse(&json!(["a"])).unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_list_field_fails_run() {
        let mut input = raw();
        input["benefits"] = json!(" , ");
        let output = DataParserAgent::new().run(&input);
        assert!(!output.success);
        assert!(output.errors[0].contains("benefits"));
    }

    #[test]
    fn test_blank_required_field_rejected() {
        for key in ["product_name", "concentration", "price"] {
            let mut input = raw();
            input[key] = json!("   ");
            match DataParserAgent::new().parse(&input) {
                Err(AgentError::InvalidField { field, reason }) => {
                    assert_eq!(field, key);
                    assert!(reason.contains("blank"));
                }
                other => panic!("expected invalid {}, got {:?}", key, other),
            }
        }

        let mut input = raw();
        input["product_name"] = json!("");
        let output = DataParserAgent::new().run(&input);
        assert!(!output.success);
        assert!(output.errors[0].contains("product_name"));
    }

    #[test]
    fn test_ensure_complete_names_empty_lists() {
        let product = Product::new("X", "5%", "", "Water", " , ", "Apply", None, "$5");
        assert!(matches!(
            ensure_complete(&product),
            Err(AgentError::IncompleteProduct(ref fields)) if fields == "skin_types, benefits"
        ));
        assert!(ensure_complete(&crate::agents::test_support::glowboost()).is_ok());
    }
}
