//! Prompts and response schemas for the Gemini `generateContent` calls.
//!
//! Each structured call pairs an instruction with a JSON schema so the
//! model answers with `responseMimeType: application/json` that maps
//! directly onto the crate's serde types.

use serde_json::{json, Value};

use super::ReviewEntry;

// ---------------------------------------------------------------------------
// Content ingestion
// ---------------------------------------------------------------------------

/// Instruction for turning source material into a shadowing script.
pub fn content_instruction(max_sentences: usize, translation_language: &str) -> String {
    let low = max_sentences.saturating_sub(5).max(1);
    format!(
        "You are an expert English teacher.\n\
         Analyze the provided content and create a structured shadowing lesson plan.\n\
         Break the content down into sentences suitable for shadowing practice.\n\
         If the text is very long, select the most important {low}-{max_sentences} sentences \
         that summarize the content well.\n\
         Provide a title for the session.\n\
         Provide a {translation_language} translation for each sentence to help understanding.\n\
         Rate difficulty as 'easy', 'medium', or 'hard'."
    )
}

/// Text part sent alongside an inline document.
pub const FILE_CONTENT_HINT: &str = "Extract sentences from this file.";

/// Text part wrapping pasted content.
pub fn text_content_part(text: &str) -> String {
    format!("Content to analyze:\n{text}")
}

pub fn content_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "sentences": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id":          { "type": "INTEGER" },
                        "text":        { "type": "STRING" },
                        "translation": { "type": "STRING" },
                        "difficulty":  { "type": "STRING", "enum": ["easy", "medium", "hard"] }
                    },
                    "required": ["id", "text", "translation", "difficulty"]
                }
            }
        },
        "required": ["title", "sentences"]
    })
}

// ---------------------------------------------------------------------------
// Pronunciation scoring
// ---------------------------------------------------------------------------

pub fn scoring_instruction(target_text: &str) -> String {
    format!(
        "Compare the user's audio recording with the target text: \"{target_text}\".\n\
         1. Assess the pronunciation accuracy (0-100).\n\
         2. Provide a short, constructive feedback message (max 2 sentences).\n\
         3. Provide specific pronunciation tips (e.g. \"Watch the 'th' sound\").\n\
         Return strict JSON."
    )
}

pub fn scoring_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score":             { "type": "INTEGER" },
            "feedback":          { "type": "STRING" },
            "pronunciationTips": { "type": "STRING" }
        },
        "required": ["score", "feedback", "pronunciationTips"]
    })
}

// ---------------------------------------------------------------------------
// Session review
// ---------------------------------------------------------------------------

pub fn review_instruction(history: &[ReviewEntry]) -> String {
    let history_json = serde_json::to_string(history).unwrap_or_else(|_| "[]".into());
    format!(
        "The user has just completed a shadowing session. \
         Here is their performance history:\n{history_json}\n\n\
         Provide a comprehensive summary:\n\
         1. Overall score (average).\n\
         2. Strengths.\n\
         3. Areas for improvement.\n\
         4. A motivational closing."
    )
}

pub fn review_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overallScore":        { "type": "INTEGER" },
            "strengths":           { "type": "STRING" },
            "improvements":        { "type": "STRING" },
            "motivationalMessage": { "type": "STRING" }
        }
    })
}
