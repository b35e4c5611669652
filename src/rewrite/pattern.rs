use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::{ContentMutator, GIT_DIR};
use crate::error::Result;

/// Placeholder in the replacement format that receives the new version
pub const VALUE_PLACEHOLDER: &str = "%s";

/// Which lines to replace, what to replace them with, and in which files
#[derive(Debug, Clone)]
pub struct RewriteRule {
    line_regex: BytesRegex,
    replacement_format: String,
    file_pattern: Regex,
}

impl RewriteRule {
    /// Compile a rule. Invalid patterns are rejected here, before any cycle runs.
    pub fn new(
        line_regex: &str,
        replacement_format: impl Into<String>,
        file_pattern: &str,
    ) -> Result<Self> {
        Ok(RewriteRule {
            line_regex: BytesRegex::new(line_regex)?,
            replacement_format: replacement_format.into(),
            file_pattern: Regex::new(file_pattern)?,
        })
    }

    /// Whether a file with this base name is rewritten
    pub fn matches_file_name(&self, name: &str) -> bool {
        self.file_pattern.is_match(name)
    }

    /// Replacement text for `new_value`.
    ///
    /// Every `%s` receives the value. One trailing line break is dropped since
    /// lines are rewritten without their terminators. Capture references such
    /// as `$1` in the format still expand; a `$` in the value stays literal.
    pub fn replacement_for(&self, new_value: &str) -> String {
        let escaped = new_value.replace('$', "$$");
        let replacement = self.replacement_format.replace(VALUE_PLACEHOLDER, &escaped);
        let trimmed = replacement
            .strip_suffix("\r\n")
            .or_else(|| replacement.strip_suffix('\n'))
            .unwrap_or(&replacement);
        trimmed.to_string()
    }

    /// Rewrite every line of `content`. Returns `None` when no line changed.
    ///
    /// Line order, `\r\n` terminators and the presence of a final newline are
    /// preserved. Works on raw bytes, so non UTF-8 files are handled as well.
    pub fn rewrite_content(&self, content: &[u8], replacement: &str) -> Option<Vec<u8>> {
        if content.is_empty() {
            return None;
        }

        let (body, trailing_newline) = match content.strip_suffix(b"\n") {
            Some(body) => (body, true),
            None => (content, false),
        };

        let mut changed = false;
        let mut output = Vec::with_capacity(content.len());

        for (index, line) in body.split(|byte| *byte == b'\n').enumerate() {
            if index > 0 {
                output.push(b'\n');
            }

            let (text, carriage_return) = match line.strip_suffix(b"\r") {
                Some(text) => (text, true),
                None => (line, false),
            };

            let rewritten = self.line_regex.replace_all(text, replacement.as_bytes());
            if rewritten.as_ref() != text {
                changed = true;
            }

            output.extend_from_slice(&rewritten);
            if carriage_return {
                output.push(b'\r');
            }
        }

        if trailing_newline {
            output.push(b'\n');
        }

        changed.then_some(output)
    }
}

/// Rewrites matching lines of matching files in place
#[derive(Debug, Clone)]
pub struct PatternRewriter {
    rule: RewriteRule,
}

impl PatternRewriter {
    pub fn new(rule: RewriteRule) -> Self {
        PatternRewriter { rule }
    }

    pub fn rule(&self) -> &RewriteRule {
        &self.rule
    }
}

impl ContentMutator for PatternRewriter {
    fn apply(&self, root: &Path, new_value: &str) -> Result<Vec<PathBuf>> {
        let replacement = self.rule.replacement_for(new_value);
        let mut modified = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == GIT_DIR));

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !self.rule.matches_file_name(&name) {
                continue;
            }

            let path = entry.path();
            debug!(path = %path.display(), "matching file");

            let content = fs::read(path)?;
            let Some(rewritten) = self.rule.rewrite_content(&content, &replacement) else {
                continue;
            };
            fs::write(path, rewritten)?;

            let relative = path.strip_prefix(root).unwrap_or(path);
            modified.push(relative.to_path_buf());
        }

        Ok(modified)
    }
}
