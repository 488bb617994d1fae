//! Code block highlighting

use lazy_static::lazy_static;
use regex::Regex;
use std::ops::RangeInclusive;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::helpers::html_escape;

lazy_static! {
    static ref TITLE_RE: Regex = Regex::new(r#"title="([^"]*)""#).unwrap();
    static ref RANGES_RE: Regex = Regex::new(r"\{([\d,\s-]+)\}").unwrap();
}

/// Directives parsed from a code block caption, e.g.
/// `title="main.rs" {1,3-5} showLineNumbers`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeMeta {
    pub title: Option<String>,
    /// 1-based line ranges to emphasize
    pub highlight: Vec<RangeInclusive<usize>>,
    /// Per-block override of the line number setting
    pub line_numbers: Option<bool>,
}

impl CodeMeta {
    /// Parse a directive string. Unknown words are ignored.
    pub fn parse(meta: &str) -> Self {
        let title = TITLE_RE
            .captures(meta)
            .map(|c| c[1].to_string())
            .filter(|t| !t.is_empty());

        let mut highlight = Vec::new();
        for caps in RANGES_RE.captures_iter(meta) {
            for part in caps[1].split(',') {
                let part = part.trim();
                match part.split_once('-') {
                    Some((start, end)) => {
                        if let (Ok(start), Ok(end)) =
                            (start.trim().parse::<usize>(), end.trim().parse::<usize>())
                        {
                            if start <= end {
                                highlight.push(start..=end);
                            }
                        }
                    }
                    None => {
                        if let Ok(line) = part.parse::<usize>() {
                            highlight.push(line..=line);
                        }
                    }
                }
            }
        }

        let line_numbers = if meta.contains("hideLineNumbers") {
            Some(false)
        } else if meta.contains("showLineNumbers") {
            Some(true)
        } else {
            None
        };

        Self {
            title,
            highlight,
            line_numbers,
        }
    }

    /// Whether a 1-based line falls in any highlighted range
    pub fn is_highlighted(&self, line: usize) -> bool {
        self.highlight.iter().any(|range| range.contains(&line))
    }
}

/// Syntax highlighter for code blocks
pub struct CodeHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
}

impl CodeHighlighter {
    /// Create a new highlighter
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", true)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            line_numbers,
        }
    }

    /// Render a code listing as a highlighted figure
    pub fn render(&self, code: &str, lang: &str, meta: &CodeMeta) -> String {
        let lang_class = if lang.trim().is_empty() {
            "text".to_string()
        } else {
            slug::slugify(lang)
        };
        let lines = self.highlight_lines(code, lang);

        let mut code_lines = String::new();
        for (i, line) in lines.iter().enumerate() {
            let class = if meta.is_highlighted(i + 1) {
                "line highlighted"
            } else {
                "line"
            };
            code_lines.push_str(&format!(r#"<span class="{}">{}</span>"#, class, line));
            if i + 1 < lines.len() {
                code_lines.push('\n');
            }
        }

        let caption = meta
            .title
            .as_ref()
            .map(|t| format!("<figcaption>{}</figcaption>", html_escape(t)))
            .unwrap_or_default();

        if meta.line_numbers.unwrap_or(self.line_numbers) {
            let gutter = (1..=lines.len())
                .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                r#"<figure class="highlight {}">{}<table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
                lang_class, caption, gutter, code_lines
            )
        } else {
            format!(
                r#"<figure class="highlight {lang}">{caption}<pre><code class="language-{lang}">{code}</code></pre></figure>"#,
                lang = lang_class,
                caption = caption,
                code = code_lines
            )
        }
    }

    /// Highlight each line to inline-styled HTML, without trailing newlines
    fn highlight_lines(&self, code: &str, lang: &str) -> Vec<String> {
        let Some(theme) = self.theme() else {
            return escape_lines(code);
        };

        let syntax = self.find_syntax(lang);
        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();

        for line in LinesWithEndings::from(code) {
            let html = highlighter
                .highlight_line(line, &self.syntax_set)
                .and_then(|ranges| {
                    let ranges: Vec<(Style, &str)> = ranges
                        .into_iter()
                        .map(|(style, text)| (style, text.trim_end_matches(['\r', '\n'])))
                        .collect();
                    styled_line_to_highlighted_html(&ranges[..], IncludeBackground::No)
                });

            match html {
                Ok(html) => lines.push(html),
                Err(e) => {
                    tracing::debug!("Highlighting failed for {} code: {}", lang, e);
                    return escape_lines(code);
                }
            }
        }

        lines
    }

    fn find_syntax(&self, lang: &str) -> &SyntaxReference {
        let lang = lang.trim().to_lowercase();
        let token = match lang.as_str() {
            "javascript" | "jsx" => "js",
            "typescript" | "tsx" => "ts",
            "shell" | "bash" | "zsh" => "sh",
            "c++" => "cpp",
            "c#" => "cs",
            "plain text" | "" => "txt",
            other => other,
        };

        self.syntax_set
            .find_syntax_by_token(token)
            .or_else(|| self.syntax_set.find_syntax_by_extension(token))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
    }
}

impl Default for CodeHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_lines(code: &str) -> Vec<String> {
    code.lines().map(html_escape).collect()
}
