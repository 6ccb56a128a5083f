//! Text file classification and SCCS to Subversion keyword translation.

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::bytes::{NoExpand, Regex};
use std::borrow::Cow;

use crate::config::DEFAULT_TEXT_PATTERNS;
use crate::error::ConvertResult;

/// Keywords Subversion expands in text files.
pub const KEYWORDS_VALUE: &str = "LastChangedDate LastChangedRevision LastChangedBy HeadURL Id";

/// Line ending style for text files.
pub const EOL_STYLE_VALUE: &str = "native";

/// SCCS markers and their Subversion replacements, applied in order.
const KEYWORD_RULES: &[(&str, &[u8])] = &[
    (r"%W%\s+%G%", b"$Id$"),
    (r"%W%", b"$URL$"),
    (r"%G%", b"$LastChangedDate$"),
];

/// Decides from a file name whether a file is text.
#[derive(Debug, Clone)]
pub struct TextClassifier {
    set: GlobSet,
}

impl TextClassifier {
    /// Build from the default patterns plus `extra`.
    pub fn new(extra: &[String]) -> ConvertResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in DEFAULT_TEXT_PATTERNS {
            builder.add(Glob::new(pattern)?);
        }
        for pattern in extra {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            set: builder.build()?,
        })
    }

    /// Whether the file at repository path `path` is text.
    /// Only the final path component is matched.
    pub fn is_text(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        self.set.is_match(name)
    }
}

/// Rewrites SCCS keyword markers into Subversion keywords.
#[derive(Debug, Clone)]
pub struct KeywordTranslator {
    rules: Vec<(Regex, &'static [u8])>,
}

impl KeywordTranslator {
    pub fn new() -> ConvertResult<Self> {
        let mut rules = Vec::with_capacity(KEYWORD_RULES.len());
        for (pattern, replacement) in KEYWORD_RULES {
            rules.push((Regex::new(pattern)?, *replacement));
        }
        Ok(Self { rules })
    }

    /// Translate `input`; borrowed when no marker was present.
    pub fn translate<'a>(&self, input: &'a [u8]) -> Cow<'a, [u8]> {
        let mut current = Cow::Borrowed(input);
        for (re, replacement) in &self.rules {
            let replaced = match re.replace_all(&current, NoExpand(replacement)) {
                Cow::Owned(bytes) => Some(bytes),
                Cow::Borrowed(_) => None,
            };
            if let Some(bytes) = replaced {
                current = Cow::Owned(bytes);
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns() {
        let classifier = TextClassifier::new(&[]).unwrap();
        assert!(classifier.is_text("proj/src/main.c"));
        assert!(classifier.is_text("proj/Makefile"));
        assert!(classifier.is_text("proj/makefile"));
        assert!(classifier.is_text("lib/Foo.pm"));
        assert!(classifier.is_text("boot.S"));
        assert!(!classifier.is_text("proj/logo.gif"));
        assert!(!classifier.is_text("proj/README"));
        // matching is on the file name only
        assert!(!classifier.is_text("proj.c/logo.gif"));
    }

    #[test]
    fn test_case_sensitive() {
        let classifier = TextClassifier::new(&[]).unwrap();
        assert!(classifier.is_text("a.C"));
        assert!(!classifier.is_text("a.H"));
    }

    #[test]
    fn test_extra_patterns() {
        let classifier = TextClassifier::new(&["*.txt".to_string()]).unwrap();
        assert!(classifier.is_text("doc/notes.txt"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(TextClassifier::new(&["[".to_string()]).is_err());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let first = TextClassifier::new(&[]).unwrap();
        let second = TextClassifier::new(&[]).unwrap();
        for name in ["a.c", "b.gif", "Makefile", "x.java", "y.o"] {
            assert_eq!(first.is_text(name), second.is_text(name));
            assert_eq!(first.is_text(name), first.is_text(name));
        }
    }

    #[test]
    fn test_translate_keywords() {
        let translator = KeywordTranslator::new().unwrap();
        let input = b"static char sccsid[] = \"%W%\t%G%\";\n/* %W% */\n/* %G% */\n";
        let output = translator.translate(input);
        assert_eq!(
            &output[..],
            &b"static char sccsid[] = \"$Id$\";\n/* $URL$ */\n/* $LastChangedDate$ */\n"[..]
        );
        assert!(matches!(output, Cow::Owned(_)));
    }

    #[test]
    fn test_translate_without_markers_is_borrowed() {
        let translator = KeywordTranslator::new().unwrap();
        let output = translator.translate(b"int main() { return 0; }\n");
        assert!(matches!(output, Cow::Borrowed(_)));
    }
}
