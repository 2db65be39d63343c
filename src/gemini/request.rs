//! Request construction for `streamGenerateContent`.

use serde_json::{json, Value};
use url::Url;

use crate::config::BridgeConfig;
use crate::{Error, ErrorContext, Result};

const VERTEX_GLOBAL_HOST: &str = "https://aiplatform.googleapis.com";
const DEVELOPER_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Resolve the streaming endpoint for the configured model.
///
/// - Vertex AI, `global`: `aiplatform.googleapis.com/v1/projects/{p}/locations/global/...`
/// - Vertex AI, regional: `{location}-aiplatform.googleapis.com/v1/projects/{p}/locations/{location}/...`
/// - Developer API: `generativelanguage.googleapis.com/v1beta/models/{model}`
/// - `http.base_url` override: `{base_url}/models/{model}`
pub fn stream_endpoint(cfg: &BridgeConfig) -> Result<Url> {
    let model_path = if let Some(base) = &cfg.http.base_url {
        format!("{}/models/{}", base.trim_end_matches('/'), cfg.model)
    } else if cfg.use_vertex_ai {
        let project = cfg.project.as_deref().ok_or_else(|| {
            Error::configuration_with_context(
                "a project is required when calling Vertex AI",
                ErrorContext::new()
                    .with_field_path("project")
                    .with_source("gemini_endpoint"),
            )
        })?;
        let host = if cfg.location == "global" {
            VERTEX_GLOBAL_HOST.to_string()
        } else {
            format!("https://{}-aiplatform.googleapis.com", cfg.location)
        };
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}",
            host, project, cfg.location, cfg.model
        )
    } else {
        format!("{}/models/{}", DEVELOPER_API_BASE, cfg.model)
    };

    let mut url = Url::parse(&format!("{}:streamGenerateContent", model_path)).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid model endpoint: {}", e),
            ErrorContext::new()
                .with_details(model_path.clone())
                .with_source("gemini_endpoint"),
        )
    })?;
    url.query_pairs_mut().append_pair("alt", "sse");
    Ok(url)
}

/// Build the JSON body for one prompt.
pub fn build_body(cfg: &BridgeConfig, prompt: &str) -> Value {
    let g = &cfg.generation;
    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }],
        }],
        "generationConfig": {
            "temperature": g.temperature,
            "topP": g.top_p,
            "seed": g.seed,
            "maxOutputTokens": g.max_output_tokens,
            "thinkingConfig": { "thinkingBudget": g.thinking_budget },
        },
    });

    let safety: Vec<Value> = cfg
        .safety
        .iter()
        .filter(|s| s.enabled)
        .map(|s| json!({ "category": s.category, "threshold": s.threshold }))
        .collect();
    if !safety.is_empty() {
        body["safetySettings"] = Value::Array(safety);
    }

    if cfg.tools.google_search {
        body["tools"] = json!([{ "googleSearch": {} }]);
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HarmBlockThreshold, HarmCategory, SafetySetting};

    fn cfg() -> BridgeConfig {
        BridgeConfig {
            project: Some("acme-proj".into()),
            ..BridgeConfig::default()
        }
    }

    #[test]
    fn vertex_global_endpoint() {
        let url = stream_endpoint(&cfg()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://aiplatform.googleapis.com/v1/projects/acme-proj/locations/global/publishers/google/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn vertex_regional_endpoint() {
        let mut c = cfg();
        c.location = "us-central1".into();
        let url = stream_endpoint(&c).unwrap();
        assert_eq!(url.host_str(), Some("us-central1-aiplatform.googleapis.com"));
        assert!(url.path().contains("/locations/us-central1/"));
    }

    #[test]
    fn developer_endpoint_and_override() {
        let mut c = BridgeConfig {
            use_vertex_ai: false,
            ..BridgeConfig::default()
        };
        assert_eq!(
            stream_endpoint(&c).unwrap().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );

        c.http.base_url = Some("http://127.0.0.1:1234/".into());
        assert_eq!(
            stream_endpoint(&c).unwrap().as_str(),
            "http://127.0.0.1:1234/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn vertex_without_project_is_a_config_error() {
        let err = stream_endpoint(&BridgeConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn body_carries_generation_safety_and_tools() {
        let body = build_body(&cfg(), "hello");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        let gc = &body["generationConfig"];
        assert_eq!(gc["topP"], 1.0);
        assert_eq!(gc["seed"], 0);
        assert_eq!(gc["maxOutputTokens"], 65535);
        assert_eq!(gc["thinkingConfig"]["thinkingBudget"], -1);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], "OFF");
        assert!(body["tools"][0]["googleSearch"].is_object());
    }

    #[test]
    fn disabled_filters_and_tools_are_omitted() {
        let mut c = cfg();
        c.safety = vec![SafetySetting {
            enabled: false,
            ..SafetySetting::new(HarmCategory::HateSpeech, HarmBlockThreshold::BlockNone)
        }];
        c.tools.google_search = false;
        let body = build_body(&c, "x");
        assert!(body.get("safetySettings").is_none());
        assert!(body.get("tools").is_none());
    }
}
