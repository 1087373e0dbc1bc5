//! Parses a plugin agent markdown file into a `ParsedAgent`.
//!
//! Front-matter extraction follows the manual `---`-delimiter slicing
//! used for subagent markdown elsewhere in this codebase (rather than
//! the `splitn(3, "---")` style used for commands), since agent files
//! are expected to have a system prompt body that may itself contain
//! literal `---` separators past the closing fence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AgentParseError {
    #[error("agent markdown must start with YAML frontmatter delimited by ---")]
    MissingFrontmatter,
    #[error("failed to parse agent frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct AgentFrontmatter {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAgent {
    pub slug: String,
    pub name: String,
    pub mode: String,
    pub description: String,
    pub system_prompt: String,
    pub file_path: PathBuf,
}

const DEFAULT_MODE: &str = "code";

pub fn parse_agent_content(content: &str, file_path: &Path) -> Result<ParsedAgent, AgentParseError> {
    let default_slug = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "agent".to_string());

    let content = content.trim();
    if !content.starts_with("---") {
        return Err(AgentParseError::MissingFrontmatter);
    }

    let after_start = &content[3..];
    let end_pos = after_start
        .find("\n---")
        .ok_or(AgentParseError::MissingFrontmatter)?;

    let yaml_content = after_start[..end_pos].trim();
    let body_start = 3 + end_pos + 4;
    let system_prompt = content.get(body_start..).map(|s| s.trim()).unwrap_or("").to_string();

    let frontmatter: AgentFrontmatter = serde_yaml::from_str(yaml_content)?;

    let name = frontmatter
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| default_slug.clone());

    let description = frontmatter
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| name.clone());

    let mode = frontmatter
        .mode
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_MODE.to_string());

    Ok(ParsedAgent {
        slug: default_slug,
        name,
        mode,
        description,
        system_prompt,
        file_path: file_path.to_path_buf(),
    })
}
