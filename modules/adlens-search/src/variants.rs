// Creative variant generation.
//
// A multimodal model looks at the reference creatives and writes one image
// prompt per requested variant; an image model then renders each prompt.
// Both services are traits so the parsing and orchestration here can be
// exercised without either.

use std::sync::Arc;

use adlens_common::AdLensError;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

/// A creative handed to the models as visual reference.
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedVariant {
    pub index: usize,
    pub prompt: String,
    #[serde(skip)]
    pub image: Bytes,
}

#[async_trait]
pub trait PromptAnalyzer: Send + Sync {
    /// Raw assistant text describing `desired_count` new creatives.
    async fn analyze(&self, images: &[ReferenceImage], desired_count: usize) -> Result<String>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, reference_images: &[ReferenceImage]) -> Result<Vec<u8>>;
}

fn starts_with_create(lower: &str) -> bool {
    lower.starts_with("create a ") || lower.starts_with("create an ")
}

fn mentions_overlay_text(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("text \"") || lower.contains("with the text")
}

/// Pull image prompts out of free-form analysis text.
///
/// A prompt opens on a line that starts with "Create a"/"Create an" (also
/// after an `Image N:` label, a list number or a bullet) and names the
/// overlay text. Following lines continue it until a blank line.
pub fn extract_prompts(text: &str, desired_count: usize) -> Vec<String> {
    let mut prompts = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut in_prompt = false;

    let mut finish = |current: &mut Vec<String>| {
        let joined = current.join(" ").trim().to_string();
        if starts_with_create(&joined.to_lowercase()) {
            prompts.push(joined);
        }
        current.clear();
    };

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if in_prompt {
                finish(&mut current);
                in_prompt = false;
            }
            continue;
        }

        let lower = line.to_lowercase();
        let mut start: Option<&str> = None;

        if starts_with_create(&lower) {
            start = Some(line);
        } else if lower.starts_with("image ") || lower.starts_with("image:") {
            if let Some(colon) = line.find(':') {
                let rest = line[colon + 1..].trim();
                if starts_with_create(&rest.to_lowercase()) {
                    start = Some(rest);
                }
            }
        } else if is_list_item(line) && (lower.contains("create a ") || lower.contains("create an ")) {
            start = Some(line.trim_start_matches(|c: char| c.is_ascii_digit() || ".-* ".contains(c)));
        }

        match start {
            Some(clean) if mentions_overlay_text(clean) => {
                if in_prompt {
                    finish(&mut current);
                }
                current.push(clean.to_string());
                in_prompt = true;
            }
            _ if in_prompt => current.push(line.to_string()),
            _ => {}
        }
    }
    if in_prompt {
        finish(&mut current);
    }

    normalize_count(prompts, desired_count)
}

fn is_list_item(line: &str) -> bool {
    let mut chars = line.chars();
    match chars.next() {
        Some('-') | Some('*') => true,
        Some(c) if c.is_ascii_digit() => chars.next() == Some('.'),
        _ => false,
    }
}

fn normalize_count(mut prompts: Vec<String>, desired_count: usize) -> Vec<String> {
    if let Some(last) = prompts.last().cloned() {
        prompts.resize(desired_count, last);
    }
    prompts
}

/// JSON objects from fenced ```json blocks, or the whole text when it is a
/// bare object. Blocks that don't parse are skipped.
pub fn extract_json_blocks(text: &str) -> Vec<Value> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<Value>(trimmed).into_iter().collect();
    }

    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```json") {
        let body = &rest[open + "```json".len()..];
        let Some(close) = body.find("```") else {
            break;
        };
        match serde_json::from_str::<Value>(body[..close].trim()) {
            Ok(value) => blocks.push(value),
            Err(e) => warn!(error = %e, "Skipping unparseable json block"),
        }
        rest = &body[close + 3..];
    }
    blocks
}

/// Prompt text for one variant of a structured (JSON) prompt.
///
/// A variant with its own `prompt` string is used as is. Otherwise the base
/// request is sent with its variant list narrowed to this one variant.
pub fn build_prompt_text(base: &Value, variant: &Value) -> String {
    if let Some(prompt) = variant.get("prompt").and_then(Value::as_str) {
        return prompt.trim().to_string();
    }

    let mut request = base.clone();
    let nested = matches!(request.get("instructions"), Some(Value::Object(_)));
    let target = if nested {
        request.get_mut("instructions").and_then(Value::as_object_mut)
    } else {
        request.as_object_mut()
    };
    if let Some(obj) = target {
        obj.insert("variants".to_string(), Value::Array(vec![variant.clone()]));
    }
    serde_json::to_string_pretty(&request).unwrap_or_default()
}

/// One prompt per variant listed in the analysis' JSON blocks, under
/// `instructions.variants` or a top-level `variants`.
pub fn structured_prompts(text: &str, desired_count: usize) -> Vec<String> {
    let mut prompts = Vec::new();
    for block in extract_json_blocks(text) {
        let variants = block
            .pointer("/instructions/variants")
            .or_else(|| block.get("variants"))
            .and_then(Value::as_array);
        let Some(variants) = variants else {
            continue;
        };
        prompts.extend(
            variants
                .iter()
                .map(|variant| build_prompt_text(&block, variant))
                .filter(|prompt| !prompt.is_empty()),
        );
    }
    normalize_count(prompts, desired_count)
}

pub struct VariantStudio {
    analyzer: Arc<dyn PromptAnalyzer>,
    generator: Arc<dyn ImageGenerator>,
}

impl VariantStudio {
    pub fn new(analyzer: Arc<dyn PromptAnalyzer>, generator: Arc<dyn ImageGenerator>) -> Self {
        Self { analyzer, generator }
    }

    /// Analyze the references and render up to `desired_count` variants.
    /// Individual render failures are logged and left out of the result.
    pub async fn generate(
        &self,
        images: &[ReferenceImage],
        desired_count: usize,
    ) -> Result<Vec<GeneratedVariant>, AdLensError> {
        if images.is_empty() {
            return Err(AdLensError::Generation("no reference images supplied".into()));
        }

        let analysis = self
            .analyzer
            .analyze(images, desired_count)
            .await
            .map_err(|e| AdLensError::Generation(format!("analysis failed: {e:#}")))?;

        let mut prompts = structured_prompts(&analysis, desired_count);
        if prompts.is_empty() {
            prompts = extract_prompts(&analysis, desired_count);
        }
        if prompts.is_empty() {
            return Err(AdLensError::Generation(
                "analysis contained no prompts starting with 'Create a' or 'Create an'".into(),
            ));
        }
        info!(prompts = prompts.len(), "Extracted variant prompts");

        let mut variants = Vec::with_capacity(prompts.len());
        for (index, prompt) in prompts.into_iter().enumerate() {
            match self.generator.generate(&prompt, images).await {
                Ok(image) => variants.push(GeneratedVariant {
                    index,
                    prompt,
                    image: Bytes::from(image),
                }),
                Err(e) => warn!(index, error = %e, "Variant generation failed, skipping"),
            }
        }

        info!(generated = variants.len(), "Variant generation complete");
        Ok(variants)
    }
}
