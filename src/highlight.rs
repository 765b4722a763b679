//! Language names → highlighting classes, and terminal colouring.
//!
//! The service labels each file with a free-form language string ("PY",
//! "c++", "Markdown", ...). [`canonical_language`] folds those into a fixed
//! set of names; anything unrecognised becomes `plaintext`. The terminal
//! renderer then picks a syntect syntax for the canonical name.

use colored::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

/// Fallback class name for unknown languages.
pub const PLAINTEXT: &str = "plaintext";

const THEME: &str = "base16-ocean.dark";

static LANGUAGE_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("html", "html"),
        ("css", "css"),
        ("javascript", "javascript"),
        ("js", "javascript"),
        ("typescript", "typescript"),
        ("ts", "typescript"),
        ("python", "python"),
        ("py", "python"),
        ("java", "java"),
        ("c", "c"),
        ("cpp", "cpp"),
        ("c++", "cpp"),
        ("csharp", "csharp"),
        ("c#", "csharp"),
        ("php", "php"),
        ("ruby", "ruby"),
        ("go", "go"),
        ("rust", "rust"),
        ("swift", "swift"),
        ("kotlin", "kotlin"),
        ("sql", "sql"),
        ("json", "json"),
        ("xml", "xml"),
        ("yaml", "yaml"),
        ("markdown", "markdown"),
        ("md", "markdown"),
        ("bash", "bash"),
        ("shell", "shell"),
        ("sh", "shell"),
    ]
    .into_iter()
    .collect()
});

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Canonical name for a declared language, case-insensitive.
pub fn canonical_language(language: &str) -> &'static str {
    LANGUAGE_MAP
        .get(language.trim().to_lowercase().as_str())
        .copied()
        .unwrap_or(PLAINTEXT)
}

/// Highlighting class for a declared language, e.g. `"hljs language-python"`.
pub fn language_class(language: &str) -> String {
    format!("hljs language-{}", canonical_language(language))
}

/// Extract the canonical name back out of a class produced by [`language_class`].
pub fn class_language(class: &str) -> &str {
    class
        .rsplit_once("language-")
        .map(|(_, lang)| lang)
        .unwrap_or(PLAINTEXT)
}

/// syntect lookup token for a canonical name. syntect keys most syntaxes by
/// file extension, so a few names need translating.
fn syntax_token(canonical: &str) -> &str {
    match canonical {
        "python" => "py",
        "javascript" => "js",
        "typescript" => "ts",
        "csharp" => "cs",
        "ruby" => "rb",
        "rust" => "rs",
        "markdown" => "md",
        "bash" | "shell" => "sh",
        "kotlin" => "kt",
        other => other,
    }
}

fn find_syntax(canonical: &str) -> &'static SyntaxReference {
    if canonical == PLAINTEXT {
        return SYNTAX_SET.find_syntax_plain_text();
    }
    SYNTAX_SET
        .find_syntax_by_token(syntax_token(canonical))
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

/// Render `content` as 24-bit ANSI colour according to `class`.
///
/// Lines that fail to highlight are emitted verbatim. Plaintext content is
/// returned unchanged.
pub fn highlight_to_ansi(content: &str, class: &str) -> String {
    let canonical = class_language(class);
    if canonical == PLAINTEXT {
        return content.to_string();
    }

    let syntax = find_syntax(canonical);
    let theme = match THEME_SET.themes.get(THEME) {
        Some(t) => t,
        None => return content.to_string(),
    };
    let mut highlighter = HighlightLines::new(syntax, theme);

    let mut out = String::with_capacity(content.len() * 2);
    for line in LinesWithEndings::from(content) {
        match highlighter.highlight_line(line, &SYNTAX_SET) {
            Ok(ranges) => {
                for (style, text) in ranges {
                    let (body, newline) = match text.strip_suffix('\n') {
                        Some(stripped) => (stripped, "\n"),
                        None => (text, ""),
                    };
                    if !body.is_empty() {
                        let fg = style.foreground;
                        let mut piece = body.truecolor(fg.r, fg.g, fg.b);
                        if style.font_style.contains(FontStyle::BOLD) {
                            piece = piece.bold();
                        }
                        if style.font_style.contains(FontStyle::ITALIC) {
                            piece = piece.italic();
                        }
                        out.push_str(&piece.to_string());
                    }
                    out.push_str(newline);
                }
            }
            Err(_) => out.push_str(line),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("PY", "python")]
    #[case("py", "python")]
    #[case("Python", "python")]
    #[case("js", "javascript")]
    #[case("TS", "typescript")]
    #[case("c++", "cpp")]
    #[case("C#", "csharp")]
    #[case("md", "markdown")]
    #[case("sh", "shell")]
    #[case("bash", "bash")]
    #[case("lisp", "plaintext")]
    #[case("", "plaintext")]
    fn canonical_names(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(canonical_language(input), expected);
    }

    #[test]
    fn class_for_python_upper() {
        assert_eq!(language_class("PY"), "hljs language-python");
    }

    #[test]
    fn class_for_unmapped_falls_back() {
        assert_eq!(language_class("lisp"), "hljs language-plaintext");
    }

    #[test]
    fn surrounding_whitespace_ignored() {
        assert_eq!(canonical_language("  rust \n"), "rust");
    }

    #[test]
    fn class_language_inverts_language_class() {
        assert_eq!(class_language(&language_class("Rust")), "rust");
        assert_eq!(class_language("garbage"), PLAINTEXT);
    }

    #[test]
    fn plaintext_is_not_coloured() {
        let src = "(defun f (x) x)\n";
        assert_eq!(highlight_to_ansi(src, &language_class("lisp")), src);
    }

    #[test]
    fn rust_is_coloured_and_keeps_text() {
        colored::control::set_override(true);
        let src = "fn main() {}\n";
        let out = highlight_to_ansi(src, &language_class("rust"));
        assert!(out.contains("\x1b["), "expected ANSI escapes: {out:?}");
        assert!(out.contains("main"));
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn common_languages_have_grammars() {
        for lang in ["python", "rust", "javascript", "go", "java", "html", "css"] {
            assert_ne!(
                find_syntax(lang).name,
                SYNTAX_SET.find_syntax_plain_text().name,
                "missing grammar for {lang}"
            );
        }
    }

    proptest! {
        #[test]
        fn mapping_ignores_case(idx in 0usize..29, upper in proptest::collection::vec(any::<bool>(), 0..12)) {
            let keys: Vec<&str> = LANGUAGE_MAP.keys().copied().collect();
            let key = keys[idx % keys.len()];
            let mixed: String = key
                .chars()
                .enumerate()
                .map(|(i, c)| if upper.get(i).copied().unwrap_or(false) { c.to_ascii_uppercase() } else { c })
                .collect();
            prop_assert_eq!(canonical_language(&mixed), canonical_language(key));
        }
    }
}
