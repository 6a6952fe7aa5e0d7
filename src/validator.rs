use regex::Regex;
use std::sync::OnceLock;

/// Validation report containing errors and warnings about a translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// The translation is very likely unusable
    pub errors: Vec<String>,

    /// Something that should have been preserved differs
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }
}

pub struct TranslationValidator;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
static MARKDOWN_LINK_REGEX: OnceLock<Regex> = OnceLock::new();

impl TranslationValidator {
    /// Compare `translated` against `original`.
    pub fn validate(original: &str, translated: &str) -> ValidationReport {
        let mut report = ValidationReport::new();

        if !original.trim().is_empty() && translated.trim().is_empty() {
            report
                .errors
                .push("Translation is empty but the original is not".to_string());
            return report;
        }

        let orig_tags = Self::extract_tags(original);
        let trans_tags = Self::extract_tags(translated);
        if orig_tags != trans_tags {
            report.warnings.push(format!(
                "HTML structure mismatch: original has {:?}, translation has {:?}",
                orig_tags, trans_tags
            ));
        }

        let orig_urls = Self::extract_urls(original);
        let trans_urls = Self::extract_urls(translated);
        if orig_urls != trans_urls {
            report.warnings.push(format!(
                "URL mismatch: original has {} URLs, translation has {} URLs",
                orig_urls.len(),
                trans_urls.len()
            ));
        }

        let orig_placeholders = Self::extract_placeholders(original);
        let trans_placeholders = Self::extract_placeholders(translated);
        if orig_placeholders != trans_placeholders {
            report.warnings.push(format!(
                "Placeholder mismatch: original has {:?}, translation has {:?}",
                orig_placeholders, trans_placeholders
            ));
        }

        let orig_md_links = Self::extract_markdown_links(original);
        let trans_md_links = Self::extract_markdown_links(translated);
        if orig_md_links.len() != trans_md_links.len() {
            report.warnings.push(format!(
                "Markdown link count mismatch: original has {}, translation has {}",
                orig_md_links.len(),
                trans_md_links.len()
            ));
        }

        report
    }

    /// Tag names in document order, closing tags prefixed with `/`.
    fn extract_tags(text: &str) -> Vec<String> {
        let regex = TAG_REGEX.get_or_init(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)\b[^>]*>").unwrap());

        regex
            .captures_iter(text)
            .map(|cap| format!("{}{}", &cap[1], cap[2].to_ascii_lowercase()))
            .collect()
    }

    fn extract_urls(text: &str) -> Vec<String> {
        let regex = URL_REGEX.get_or_init(|| Regex::new(r#"https?://[^\s)\]"'<>]+"#).unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// `{{ name }}` template placeholders, whitespace-normalized.
    fn extract_placeholders(text: &str) -> Vec<String> {
        let regex = PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").unwrap());

        regex
            .captures_iter(text)
            .map(|cap| format!("{{{{ {} }}}}", &cap[1]))
            .collect()
    }

    fn extract_markdown_links(text: &str) -> Vec<String> {
        let regex =
            MARKDOWN_LINK_REGEX.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
