//! Prompt library for the text-understanding operations
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/tally/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Each prompt carries YAML frontmatter with its id, version, and the
//! sampling settings (`temperature`, `max_tokens`) used when sending it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const CATEGORIZE_EXPENSE: &str = include_str!("../../../prompts/categorize_expense.md");
    pub const PARSE_EXPENSE: &str = include_str!("../../../prompts/parse_expense.md");
    pub const GENERATE_INSIGHTS: &str = include_str!("../../../prompts/generate_insights.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    CategorizeExpense,
    ParseExpense,
    GenerateInsights,
}

impl PromptId {
    /// Get the string identifier for this prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategorizeExpense => "categorize_expense",
            Self::ParseExpense => "parse_expense",
            Self::GenerateInsights => "generate_insights",
        }
    }

    /// Get all known prompt IDs
    pub fn all() -> &'static [PromptId] {
        &[
            Self::CategorizeExpense,
            Self::ParseExpense,
            Self::GenerateInsights,
        ]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::CategorizeExpense => defaults::CATEGORIZE_EXPENSE,
            Self::ParseExpense => defaults::PARSE_EXPENSE,
            Self::GenerateInsights => defaults::GENERATE_INSIGHTS,
        }
    }

    /// Sampling settings used if frontmatter omits them
    fn default_sampling(&self) -> (f32, u32) {
        match self {
            Self::CategorizeExpense => (0.3, 10),
            Self::ParseExpense => (0.2, 200),
            Self::GenerateInsights => (0.5, 600),
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    /// Unique identifier
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    pub content: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Path to the override file this prompt came from (if any)
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    pub fn is_override(&self) -> bool {
        self.override_path.is_some()
    }

    /// Render the prompt with template variables replaced.
    ///
    /// Conditionals are resolved against the template before substitution, and
    /// inserted values are never scanned again, so user text is passed through
    /// verbatim even when it contains `{{...}}`.
    pub fn render(&self, vars: &HashMap<&str, String>) -> String {
        let template = remove_unmatched_conditionals(&self.content, vars);
        substitute_vars(&template, vars)
    }
}

/// Prompt library, loaded once and shared read-only
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    prompts: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a prompt library with the default override directory
    pub fn new() -> Self {
        Self::load(default_prompts_dir())
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self::load(Some(path))
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self::load(None)
    }

    fn load(override_dir: Option<PathBuf>) -> Self {
        let prompts = PromptId::all()
            .iter()
            .map(|&id| (id, load_prompt(id, override_dir.as_deref())))
            .collect();
        Self { prompts }
    }

    /// Get a prompt by ID
    pub fn get(&self, id: PromptId) -> &Prompt {
        // Every id is loaded at construction.
        &self.prompts[&id]
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("prompts").join("overrides"))
}

/// Load one prompt, preferring a readable override over the embedded default
fn load_prompt(id: PromptId, override_dir: Option<&Path>) -> Prompt {
    if let Some(dir) = override_dir {
        let path = dir.join(format!("{}.md", id.as_str()));
        if path.exists() {
            match read_override(id, &path) {
                Ok(prompt) => return prompt,
                Err(e) => warn!(
                    prompt = id.as_str(),
                    path = %path.display(),
                    "Ignoring prompt override: {}",
                    e
                ),
            }
        }
    }

    let content = id.default_content();
    match parse_prompt(content) {
        Ok((metadata, body)) => build_prompt(id, metadata, body, None),
        Err(e) => {
            warn!(prompt = id.as_str(), "Embedded prompt has bad frontmatter: {}", e);
            let metadata = PromptMetadata {
                id: id.as_str().to_string(),
                version: 0,
                temperature: None,
                max_tokens: None,
            };
            build_prompt(id, metadata, content.to_string(), None)
        }
    }
}

fn read_override(id: PromptId, path: &Path) -> Result<Prompt> {
    let content = fs::read_to_string(path)?;
    let (metadata, body) = parse_prompt(&content)?;
    Ok(build_prompt(id, metadata, body, Some(path.to_path_buf())))
}

fn build_prompt(
    id: PromptId,
    metadata: PromptMetadata,
    content: String,
    override_path: Option<PathBuf>,
) -> Prompt {
    let (temperature, max_tokens) = id.default_sampling();
    Prompt {
        temperature: metadata.temperature.unwrap_or(temperature),
        max_tokens: metadata.max_tokens.unwrap_or(max_tokens),
        metadata,
        content,
        override_path,
    }
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Replace each known `{{var}}` in one left-to-right pass; unknown ones stay
fn substitute_vars(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        match vars.get(after[..end].trim()) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Keep `{{#if var}}...{{/if}}` blocks whose variable is non-empty, drop the rest
fn remove_unmatched_conditionals(content: &str, vars: &HashMap<&str, String>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_end) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = result[var_start..var_start + var_end].trim().to_string();
        let block_start = var_start + var_end + 2;

        let Some(endif_pos) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let block_content = result[block_start..block_start + endif_pos].to_string();
        let full_end = block_start + endif_pos + 7;

        let keep = vars.get(var_name.as_str()).is_some_and(|v| !v.is_empty());
        let replacement = if keep { block_content.as_str() } else { "" };
        result = format!("{}{}{}", &result[..if_start], replacement, &result[full_end..]);
    }

    result
}
