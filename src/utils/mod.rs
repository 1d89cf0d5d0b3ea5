//! Shared utility functions for content-forge.

pub mod json_extraction;

pub use json_extraction::{
    analyze_json_structure, extract_from_generic_code_block, extract_from_json_code_block,
    extract_json_payload, find_matching_close, JsonExtractionError, JsonStructureAnalysis,
};
