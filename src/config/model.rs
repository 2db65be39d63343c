//! Model invocation parameters
//!
//! Static generation, safety and tool settings sent with every
//! `generateContent` call. None of these are negotiated per request.

use serde::{Deserialize, Serialize};

/// Sampling and output parameters (`generationConfig`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub seed: i32,
    pub max_output_tokens: u32,
    /// `-1` lets the model pick its own thinking budget, `0` disables thinking.
    pub thinking_budget: i32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 1.0,
            seed: 0,
            max_output_tokens: 65535,
            thinking_budget: -1,
        }
    }
}

/// Harm categories accepted by the content filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_CIVIC_INTEGRITY")]
    CivicIntegrity,
}

/// Blocking threshold for one harm category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
    Off,
}

/// One entry of `safetySettings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
    /// Disabled entries are left out of the request entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl SafetySetting {
    pub fn new(category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        Self {
            category,
            threshold,
            enabled: true,
        }
    }
}

/// Default filter set: the four classic categories with filtering off.
pub fn default_safety_settings() -> Vec<SafetySetting> {
    [
        HarmCategory::HateSpeech,
        HarmCategory::DangerousContent,
        HarmCategory::SexuallyExplicit,
        HarmCategory::Harassment,
    ]
    .into_iter()
    .map(|c| SafetySetting::new(c, HarmBlockThreshold::Off))
    .collect()
}

/// Auxiliary tools attached to the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Ground answers in Google Search results.
    pub google_search: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            google_search: true,
        }
    }
}

fn default_true() -> bool {
    true
}
