//! Marker scanning
//!
//! A raw value is scanned left to right for
//! - `$$`: an escaped marker, never a substitution
//! - `$` followed by zero or more of `[A-Za-z0-9_]`: a substitution of that identifier
//!
//! The scan is non-overlapping, so `$$$foo` is an escape followed by `$foo`.
use crate::expand::{EscapeMode, Expansions};
use regex::{Captures, Regex};
use std::sync::OnceLock;

pub const MARKER: &str = "$";
pub const ESCAPED_MARKER: &str = "$$";

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // the escape alternative must come first: leftmost-first matching decides `$$`
        Regex::new(r"\$\$|\$([A-Za-z0-9_]*)").expect("marker pattern must compile")
    })
}

/// Identifiers referenced by the markers of `value` in order of appearance (with repeats)
fn markers(value: &str) -> impl Iterator<Item = &str> {
    marker_pattern()
        .captures_iter(value)
        .filter_map(|captures| captures.get(1).map(|name| name.as_str()))
}

/// Returns `true` if `value` contains no substitution marker
///
/// Escaped markers do not count: `$$literal` is expanded.
pub fn is_expanded(value: &str) -> bool {
    markers(value).next().is_none()
}

/// Distinct identifiers referenced by `value`, in order of first appearance
///
/// A bare `$` references the empty identifier `""`.
pub fn extract_dependencies(value: &str) -> Vec<String> {
    let unique: indexmap::IndexSet<&str> = markers(value).collect();
    unique.into_iter().map(str::to_owned).collect()
}

/// Replace every marker of `raw` with the value of its identifier
///
/// Identifiers missing from `values` are replaced with nothing. Substituted text is
/// inserted verbatim and never scanned again.
pub fn substitute(raw: &str, values: &Expansions, escapes: EscapeMode) -> String {
    marker_pattern()
        .replace_all(raw, |captures: &Captures| match captures.get(1) {
            None => match escapes {
                EscapeMode::Preserve => ESCAPED_MARKER,
                EscapeMode::Collapse => MARKER,
            },
            Some(name) => values
                .get(name.as_str())
                .map(String::as_str)
                .unwrap_or_default(),
        })
        .into_owned()
}

/// A variable as it was given, before expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVariable {
    pub id: String,
    pub raw_value: String,
    pub dependencies: Vec<String>,
}

impl RawVariable {
    pub fn parse(id: impl Into<String>, raw_value: impl Into<String>) -> Self {
        let raw_value = raw_value.into();
        let dependencies = extract_dependencies(&raw_value);

        Self {
            id: id.into(),
            raw_value,
            dependencies,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Dependencies that have no value in `values` yet
    pub fn missing<'a>(&'a self, values: &'a Expansions) -> impl Iterator<Item = &'a str> {
        self.dependencies
            .iter()
            .map(String::as_str)
            .filter(|dependency| !values.contains_key(*dependency))
    }

    /// Final value given the final values of the dependencies
    pub fn expand(&self, values: &Expansions, escapes: EscapeMode) -> String {
        substitute(&self.raw_value, values, escapes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::variables;
    use pretty_assertions::assert_eq;

    #[test]
    fn dependencies() {
        let cases: &[(&str, &[&str])] = &[
            ("$HOME/$$foo/$bar/$baz/SOME_THING", &["HOME", "bar", "baz"]),
            ("$HOME", &["HOME"]),
            ("$foo$bar", &["foo", "bar"]),
            ("$foo$bar$foo", &["foo", "bar"]),
            ("$$$foo", &["foo"]),
            ("SOME_THING", &[]),
        ];

        for (value, expected) in cases {
            assert_eq!(extract_dependencies(value), *expected, "value: {value}");
        }
    }

    #[test]
    fn bare_marker_is_empty_identifier() {
        assert_eq!(extract_dependencies("5$ or $"), vec![String::new()]);
        assert_eq!(extract_dependencies("$/$a"), vec!["".to_string(), "a".into()]);
    }

    #[test]
    fn identifiers_are_ascii_words() {
        assert_eq!(extract_dependencies("$a-b.$c_1é"), vec!["a", "c_1"]);
    }

    #[test]
    fn expanded() {
        assert!(is_expanded("foo/$$bar/baz"));
        assert!(!is_expanded("foo/$bar/baz"));
        assert!(!is_expanded("$$foo/$bar"));
        assert!(is_expanded("foo/bar/baz"));
        assert!(is_expanded("$$$$"));
        assert!(!is_expanded("$$$"));
    }

    #[test]
    fn substitute_in_one_pass() {
        let values = variables! {
            "foo" => "$bar",
            "bar" => "never",
            "foobar" => "long",
        };

        assert_eq!(
            substitute("$foo|$foobar|$$foo", &values, EscapeMode::Preserve),
            "$bar|long|$$foo"
        );
        assert_eq!(
            substitute("$foo|$foobar|$$foo", &values, EscapeMode::Collapse),
            "$bar|long|$foo"
        );
    }

    #[test]
    fn substitute_missing_with_nothing() {
        let values = variables! { "a" => "1" };
        assert_eq!(
            substitute("<$a><$b><$>", &values, EscapeMode::Preserve),
            "<1><><>"
        );
    }

    #[test]
    fn raw_variable() {
        let raw = RawVariable::parse("all", "$x/$y/$x");
        assert_eq!(raw.dependencies, vec!["x", "y"]);
        assert!(!raw.is_expanded());

        let values = variables! { "x" => "X" };
        assert_eq!(raw.missing(&values).collect::<Vec<_>>(), vec!["y"]);
        assert_eq!(raw.expand(&values, EscapeMode::Preserve), "X//X");

        assert!(RawVariable::parse("lit", "$$literal").is_expanded());
    }
}
