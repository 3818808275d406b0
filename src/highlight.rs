//! Syntax highlighting for fenced code blocks.
//!
//! Wraps syntect's bundled themes and the extended syntax set from
//! `two-face`, which adds languages syntect doesn't ship (Dart among them).
//! Loading them is the expensive part, so a [`Highlighter`] is built once per site and reused for
//! every render.
//!
//! Language resolution for a block:
//!
//! 1. the declared fence language, matched against syntax tokens and file
//!    extensions (`rust`, `rs`, `dart`, `py`)
//! 2. first-line detection (shebangs, `<?php`, XML declarations)
//! 3. none: the caller emits the block escaped and unhighlighted

use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::{SyntaxReference, SyntaxSet};
use tracing::{debug, warn};

/// Theme used when the configured one isn't bundled.
pub const FALLBACK_THEME: &str = "InspiredGitHub";

pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("theme", &self.theme.name)
            .finish_non_exhaustive()
    }
}

impl Highlighter {
    pub fn new(theme_name: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(theme_name) {
            Some(theme) => theme,
            None => {
                warn!(theme = theme_name, fallback = FALLBACK_THEME, "unknown highlight theme");
                themes.remove(FALLBACK_THEME).unwrap_or_default()
            }
        };
        Self {
            syntaxes: two_face::syntax::extra_newlines(),
            theme,
        }
    }

    /// Highlight `code` as inline-styled HTML (`<pre style=…>` wrapper
    /// included). `None` means no syntax could be determined, or the
    /// highlighter failed on the input.
    pub fn highlight(&self, code: &str, language: Option<&str>) -> Option<String> {
        let syntax = self.resolve(code, language)?;
        match highlighted_html_for_string(code, &self.syntaxes, syntax, &self.theme) {
            Ok(html) => Some(html),
            Err(err) => {
                warn!(syntax = %syntax.name, error = %err, "highlighting failed");
                None
            }
        }
    }

    fn resolve(&self, code: &str, language: Option<&str>) -> Option<&SyntaxReference> {
        let declared = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .and_then(|l| self.syntaxes.find_syntax_by_token(l));
        if declared.is_some() {
            return declared;
        }
        let detected = code
            .lines()
            .next()
            .and_then(|first| self.syntaxes.find_syntax_by_first_line(first));
        if let Some(syntax) = detected {
            debug!(language = ?language, detected = %syntax.name, "detected code block language");
        }
        detected
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new(FALLBACK_THEME)
    }
}
