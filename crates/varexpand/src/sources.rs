//! collection of variable documents (variables and path to source file)
//!
//! [VariableSources] tracks
//! - the source path
//! - the variables of each document in document order
//! and defines a numeric index for each entry. Once added those indices are stable (removal is not possible)
//!
//! Two document formats are understood:
//! - dotenv style: `KEY=VALUE` lines, `#` comments, optional `export ` and optional matching quotes
//! - hcl: root attributes with a string, number or bool value
use crate::expand::{Expansions, Variables};
use hcl_edit::structure::{Body, Structure};
use std::path::Path;

#[derive(Default, Debug)]
pub struct VariableSources {
    sources: Vec<Source>,
    entries: Vec<(usize, String, String)>,
}

impl VariableSources {
    /// Inserts and indexes a document
    pub fn insert(&mut self, document: Variables, path: impl Into<Option<std::path::PathBuf>>) {
        let source_index = self.sources.len();
        self.sources.push(path.into());

        for (key, value) in document {
            self.entries.push((source_index, key, value));
        }
    }

    pub fn get_entry(&self, index: usize) -> SourceEntry<'_> {
        let (source_index, key, value) = &self.entries[index];
        (index, &self.sources[*source_index], key.as_str(), value.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = SourceEntry<'_>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, (source_index, key, value))| {
                (index, &self.sources[*source_index], key.as_str(), value.as_str())
            })
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Source of the entry that wins for `key`
    pub fn source_of(&self, key: &str) -> Option<&Source> {
        self.entries()
            .filter(|(_, _, entry_key, _)| *entry_key == key)
            .last()
            .map(|(_, source, _, _)| source)
    }

    /// All variables, later documents override earlier ones
    pub fn to_variables(&self) -> Variables {
        let mut variables = Variables::default();
        for (_, source, key, value) in self.entries() {
            if variables.insert(key.to_string(), value.to_string()).is_some() {
                tracing::debug!(%key, ?source, "override");
            }
        }
        variables
    }
}

impl VariableSources {
    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        let document = match file_path.extension().and_then(|ext| ext.to_str()) {
            Some("hcl") => parse_hcl(&file_contents)?,
            _ => parse_dotenv(&file_contents)?,
        };

        self.insert(document, Some(file_path));
        Ok(())
    }

    /// Loads every `*.env` and `*vars.hcl` file of a directory in file name order
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut file_paths = vec![];

        let read_dir = std::fs::read_dir(dir_path)?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let file_name = dir_entry.file_name().to_string_lossy().into_owned();
            let is_variables_file = file_name.ends_with(".env") || file_name.ends_with("vars.hcl");
            if !is_variables_file {
                continue;
            }

            file_paths.push(dir_entry.path());
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound);
        }

        file_paths.sort();
        for file_path in file_paths {
            self.load_file(&file_path)?;
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
    #[error("Malformed line {line}, expected KEY=VALUE")]
    MalformedLine { line: usize },
    #[error("Unsupported value for '{key}', expected a string, number or bool")]
    UnsupportedExpression { key: String },
    #[error("Unexpected block '{ident}', only attributes are allowed")]
    UnexpectedBlock { ident: String },
}

impl From<Variables> for VariableSources {
    fn from(value: Variables) -> Self {
        let mut sources = VariableSources::default();
        sources.insert(value, None);
        sources
    }
}

/// Parse a dotenv style document
///
/// Lines are numbered from 1 in errors.
pub fn parse_dotenv(contents: &str) -> Result<Variables, LoadError> {
    let mut variables = Variables::default();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            return Err(LoadError::MalformedLine { line: index + 1 });
        };

        let key = key.trim();
        let is_identifier =
            !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !is_identifier {
            return Err(LoadError::MalformedLine { line: index + 1 });
        }

        variables.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    Ok(variables)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Parse an hcl document of root attributes
pub fn parse_hcl(contents: &str) -> Result<Variables, LoadError> {
    let body: Body = hcl_edit::parser::parse_body(contents)?;
    let mut variables = Variables::default();

    for structure in body.into_iter() {
        let attribute = match structure {
            Structure::Attribute(attribute) => attribute,
            Structure::Block(block) => {
                return Err(LoadError::UnexpectedBlock {
                    ident: block.ident.value().as_str().to_string(),
                })
            }
        };

        let key = attribute.key.value().as_str().to_string();
        let expression: hcl::Expression = attribute.value.into();
        let value = match expression {
            hcl::Expression::String(value) => value,
            hcl::Expression::Number(number) => number.to_string(),
            hcl::Expression::Bool(bool) => bool.to_string(),
            hcl::Expression::TemplateExpr(template_expr) => literal_template(&template_expr)
                .ok_or_else(|| LoadError::UnsupportedExpression { key: key.clone() })?,
            _ => return Err(LoadError::UnsupportedExpression { key }),
        };

        variables.insert(key, value);
    }

    Ok(variables)
}

/// Text of a template without interpolations or directives
fn literal_template(template_expr: &hcl::TemplateExpr) -> Option<String> {
    let template = hcl::Template::from_expr(template_expr).ok()?;
    template
        .elements()
        .iter()
        .map(|element| match element {
            hcl::template::Element::Literal(literal) => Some(literal.as_str()),
            _ => None,
        })
        .collect()
}

/// Render expansions as `KEY=VALUE` lines
pub fn render_dotenv(expansions: &Expansions) -> String {
    expansions
        .iter()
        .map(|(key, value)| format!("{key}={value}\n"))
        .collect()
}

/// Utility macro to create [Variables](crate::expand::Variables)
///
/// ```
/// # use varexpand::variables;
/// let vars = variables! {
///   "HOME" => "/home/someone",
///   "BIN" => "$HOME/bin",
/// };
/// assert_eq!(vars["BIN"], "$HOME/bin");
/// ```
#[macro_export]
macro_rules! variables {
    { $($key:expr => $value:expr),* $(,)? } => {{
        #[allow(unused_mut)]
        let mut vars = $crate::expand::Variables::default();
        $(
            vars.insert(::std::string::String::from($key), ::std::string::String::from($value));
        )*

        vars
    }};
}

pub type Source = Option<std::path::PathBuf>;
pub type SourceEntry<'a> = (usize, &'a Source, &'a str, &'a str);

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::variables;
    use pretty_assertions::assert_eq;

    #[test]
    fn dotenv() {
        let variables = parse_dotenv(
            r#"
            # comment
            HOME=/user/home
            export BIN = $HOME/bin
            QUOTED="with spaces"
            SINGLE='$$kept'
            EMPTY=
            "#,
        )
        .unwrap();

        assert_eq!(
            variables,
            variables! {
                "HOME" => "/user/home",
                "BIN" => "$HOME/bin",
                "QUOTED" => "with spaces",
                "SINGLE" => "$$kept",
                "EMPTY" => "",
            }
        );
    }

    #[test]
    fn dotenv_malformed() {
        assert!(matches!(
            parse_dotenv("A=1\nnot an assignment"),
            Err(LoadError::MalformedLine { line: 2 })
        ));
        assert!(matches!(
            parse_dotenv("bad-key=1"),
            Err(LoadError::MalformedLine { line: 1 })
        ));
    }

    #[test]
    fn hcl() {
        let variables = parse_hcl(
            r#"
            HOME = "/user/home"
            BIN = "$HOME/bin"
            PORT = 8080
            DEBUG = true
            "#,
        )
        .unwrap();

        assert_eq!(
            variables,
            variables! {
                "HOME" => "/user/home",
                "BIN" => "$HOME/bin",
                "PORT" => "8080",
                "DEBUG" => "true",
            }
        );
    }

    #[test]
    fn hcl_rejects_blocks_and_expressions() {
        assert!(matches!(
            parse_hcl("block {}"),
            Err(LoadError::UnexpectedBlock { ident }) if ident == "block"
        ));
        assert!(matches!(
            parse_hcl("list = [1, 2]"),
            Err(LoadError::UnsupportedExpression { key }) if key == "list"
        ));
        assert!(matches!(
            parse_hcl("not = valid = hcl"),
            Err(LoadError::HclParseFailed(_))
        ));
    }

    #[test]
    fn later_documents_override() {
        let mut sources = VariableSources::default();
        sources.insert(variables! { "A" => "1", "B" => "2" }, Some("one.env".into()));
        sources.insert(variables! { "B" => "3" }, Some("two.env".into()));

        assert_eq!(sources.source_count(), 2);
        assert_eq!(sources.entries().count(), 3);
        assert_eq!(sources.get_entry(2), (2, &Some("two.env".into()), "B", "3"));
        assert_eq!(sources.source_of("B"), Some(&Some("two.env".into())));
        assert_eq!(sources.source_of("C"), None);
        assert_eq!(sources.to_variables(), variables! { "A" => "1", "B" => "3" });
    }

    #[test]
    fn load_directory_in_name_order() {
        let dir = std::env::temp_dir().join(format!("varexpand-sources-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.env"), "A=from_b\n").unwrap();
        std::fs::write(dir.join("a.env"), "A=from_a\nB=$A\n").unwrap();
        std::fs::write(dir.join("vars.hcl"), "C = \"c\"\n").unwrap();
        std::fs::write(dir.join("ignored.txt"), "A=ignored\n").unwrap();

        let mut sources = VariableSources::default();
        sources.load_directory(&dir).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(sources.source_count(), 3);
        assert_eq!(
            sources.to_variables(),
            variables! { "A" => "from_b", "B" => "$A", "C" => "c" }
        );
    }

    #[test]
    fn render() {
        let rendered = render_dotenv(&variables! { "A" => "1", "B" => "$$2" });
        assert_eq!(rendered, "A=1\nB=$$2\n");
    }
}
