//! Parses a plugin command markdown file into a `ParsedCommand`.
//!
//! Front-matter extraction mirrors `splitn(3, "---")` + `serde_yaml`
//! used for SKILL.md parsing in this codebase, generalized with the
//! fallback-default chain (explicit front-matter value, else derived
//! from the body/filename) spec'd for plugin commands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const ARGUMENTS_TOKEN: &str = "$ARGUMENTS";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CommandFrontmatter {
    name: Option<String>,
    description: Option<String>,
    #[serde(rename = "argument-hint")]
    #[serde(alias = "argument_hint")]
    argument_hint: Option<String>,
    #[serde(rename = "allowed-tools")]
    #[serde(alias = "allowed_tools")]
    allowed_tools: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub description: String,
    pub argument_hint: Option<String>,
    pub allowed_tools: Option<Vec<String>>,
    pub content: String,
    pub file_path: PathBuf,
    pub has_arguments_variable: bool,
}

/// Parse a command markdown file's contents. `file_path` is used only
/// to derive the fallback name (its filename stem) and is carried
/// through for `ParsedCommand::file_path`.
pub fn parse_command_content(content: &str, file_path: &Path) -> ParsedCommand {
    let default_name = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "command".to_string());

    let (frontmatter, body) = split_frontmatter(content);

    let name = frontmatter
        .as_ref()
        .and_then(|fm| fm.name.clone())
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or(default_name);

    let description = frontmatter
        .as_ref()
        .and_then(|fm| fm.description.clone())
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .or_else(|| infer_description_from_body(&body))
        .unwrap_or_else(|| name.clone());

    let argument_hint = frontmatter.as_ref().and_then(|fm| fm.argument_hint.clone());
    let allowed_tools = frontmatter.and_then(|fm| fm.allowed_tools);
    let has_arguments_variable = body.contains(ARGUMENTS_TOKEN);

    ParsedCommand {
        name,
        description,
        argument_hint,
        allowed_tools,
        content: body,
        file_path: file_path.to_path_buf(),
        has_arguments_variable,
    }
}

/// Split `---`-fenced YAML front-matter from the body. Front-matter
/// syntax errors are recovered: the body is still returned and
/// `frontmatter` is `None`, matching the parser's "non-fatal" contract.
fn split_frontmatter(content: &str) -> (Option<CommandFrontmatter>, String) {
    let parts: Vec<&str> = content.splitn(3, "---").collect();
    if parts.len() < 3 || !parts[0].trim().is_empty() {
        return (None, content.trim().to_string());
    }

    let yaml_str = parts[1].trim();
    let body = parts[2].trim_start().to_string();
    let frontmatter = serde_yaml::from_str(yaml_str).ok();
    (frontmatter, body)
}

/// First non-empty paragraph of `body`, skipping leading headings and
/// horizontal rules.
fn infer_description_from_body(body: &str) -> Option<String> {
    let mut paragraph = Vec::new();
    for line in body.lines() {
        let trimmed = line.trim();
        if paragraph.is_empty() {
            if trimmed.is_empty() || trimmed.starts_with('#') || is_horizontal_rule(trimmed) {
                continue;
            }
        } else if trimmed.is_empty() {
            break;
        }
        paragraph.push(trimmed);
    }
    if paragraph.is_empty() {
        None
    } else {
        Some(paragraph.join(" "))
    }
}

fn is_horizontal_rule(line: &str) -> bool {
    matches!(line, "---" | "***" | "___")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frontmatter_fields() {
        let content = "---\nname: status\ndescription: Show git status\nargument-hint: [path]\n---\n\nRun `git status`.\n";
        let parsed = parse_command_content(content, Path::new("status.md"));
        assert_eq!(parsed.name, "status");
        assert_eq!(parsed.description, "Show git status");
        assert_eq!(parsed.argument_hint.as_deref(), Some("[path]"));
        assert!(parsed.content.starts_with("Run `git status`."));
    }

    #[test]
    fn falls_back_to_filename_and_body_paragraph() {
        let content = "# Heading\n\nThis is the first paragraph.\n\nMore text.\n";
        let parsed = parse_command_content(content, Path::new("my-command.md"));
        assert_eq!(parsed.name, "my-command");
        assert_eq!(parsed.description, "This is the first paragraph.");
    }

    #[test]
    fn falls_back_to_name_when_no_body_paragraph() {
        let content = "# Heading only\n";
        let parsed = parse_command_content(content, Path::new("bare.md"));
        assert_eq!(parsed.description, "bare");
    }

    #[test]
    fn detects_arguments_token() {
        let with_args = parse_command_content("Run `echo $ARGUMENTS`", Path::new("a.md"));
        assert!(with_args.has_arguments_variable);

        let without_args = parse_command_content("Run `echo hi`", Path::new("a.md"));
        assert!(!without_args.has_arguments_variable);
    }

    #[test]
    fn malformed_frontmatter_still_recovers_body() {
        let content = "---\nname: [unterminated\n---\nBody text\n";
        let parsed = parse_command_content(content, Path::new("broken.md"));
        assert_eq!(parsed.name, "broken");
        assert_eq!(parsed.content, "Body text");
    }
}
