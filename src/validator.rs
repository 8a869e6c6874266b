//! XML Schema validation
//!
//! [`SchemaValidator`] checks a document against an XSD and returns every
//! violation found in one full pass instead of stopping at the first. Each
//! call owns a fresh issue list, so a validator can be shared freely between
//! threads and reused without issues leaking from one call into the next.
//!
//! Two modes are supported:
//!
//! - [`ValidationMode::FileSystem`]: `document` and `schema` are paths on disk.
//!   The schema is parsed from its path (so relative includes resolve) and the
//!   document is validated in a single streaming pass.
//! - [`ValidationMode::InMemory`]: `document` and `schema` are XML text. The
//!   document is parsed into a tree and the tree is validated.
//!
//! In both modes the document is first checked for well-formedness; a
//! malformed document is a hard error, not a schema issue.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::convert::EnumDescription;
use crate::error::{LibXml2Error, Result, ToolkitError};
use crate::libxml2::{DiagnosticLevel, LibXml2Wrapper, XmlDiagnostic, XmlSchemaPtr};
use crate::require::{self, Require};

/// How the `document` and `schema` inputs of [`SchemaValidator::validate`] are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ValidationMode {
    /// Inputs are paths to files on disk
    #[default]
    FileSystem,
    /// Inputs are XML text
    InMemory,
}

impl EnumDescription for ValidationMode {
    const TABLE: &'static [(Self, &'static str, &'static str)] = &[
        (
            ValidationMode::FileSystem,
            "file-system",
            "document and schema are paths on disk",
        ),
        (
            ValidationMode::InMemory,
            "in-memory",
            "document and schema are XML text",
        ),
    ];
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<ValidationMode> for String {
    fn from(mode: ValidationMode) -> Self {
        mode.name().to_string()
    }
}

impl TryFrom<String> for ValidationMode {
    type Error = ToolkitError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl FromStr for ValidationMode {
    type Err = ToolkitError;

    /// Accepts `file-system`/`filesystem` and `in-memory`/`inmemory`, ignoring case
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "filesystem" => Ok(ValidationMode::FileSystem),
            "inmemory" => Ok(ValidationMode::InMemory),
            _ => Err(ToolkitError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl EnumDescription for Severity {
    const TABLE: &'static [(Self, &'static str, &'static str)] = &[
        (Severity::Error, "error", "schema violation"),
        (Severity::Warning, "warning", "schema warning"),
    ];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One schema violation found during a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaIssue {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl SchemaIssue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// `line N, column M` / `line N`, or `None` when no position is known
    pub fn position(&self) -> Option<String> {
        match (self.line, self.column) {
            (Some(line), Some(column)) => Some(format!("line {}, column {}", line, column)),
            (Some(line), None) => Some(format!("line {}", line)),
            _ => None,
        }
    }
}

impl From<XmlDiagnostic> for SchemaIssue {
    fn from(diagnostic: XmlDiagnostic) -> Self {
        let severity = match diagnostic.level {
            DiagnosticLevel::Warning => Severity::Warning,
            DiagnosticLevel::Error | DiagnosticLevel::Fatal => Severity::Error,
        };
        Self {
            severity,
            message: diagnostic.message,
            line: diagnostic.line,
            column: diagnostic.column,
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position() {
            Some(position) => write!(f, "{} at {}: {}", self.severity, position, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Outcome for one document of a batch
#[derive(Debug)]
pub struct DocumentValidation {
    pub path: PathBuf,
    pub result: Result<Vec<SchemaIssue>>,
}

impl DocumentValidation {
    /// True when the document was validated and produced no issues
    pub fn is_valid(&self) -> bool {
        matches!(&self.result, Ok(issues) if issues.is_empty())
    }
}

/// Validates XML documents against XML Schemas through libxml2
pub struct SchemaValidator {
    libxml2: LibXml2Wrapper,
    threads: usize,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            libxml2: LibXml2Wrapper::new(),
            threads: num_cpus::get(),
        }
    }

    /// Use `threads` workers for [`SchemaValidator::validate_files`]
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        Require::param("threads")
            .message("batch validation needs at least one worker")
            .greater_than(0, threads)?;
        self.threads = threads;
        Ok(self)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Validate `document` against `schema`
    ///
    /// `namespace` is the target namespace the schema must declare; `None` or
    /// an empty string means "no expectation" and accepts whatever the schema
    /// declares.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for blank inputs, `FileNotFound` for missing paths in
    /// file-system mode, `NamespaceMismatch`, `SchemaParsing` and
    /// `MalformedDocument`. Schema violations are returned as issues.
    #[tracing::instrument(skip(self, document, schema, namespace), fields(namespace = namespace.unwrap_or("")))]
    pub fn validate(
        &self,
        mode: ValidationMode,
        document: &str,
        schema: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<SchemaIssue>> {
        require::not_null("document", document)?;
        require::not_null("schema", schema)?;
        let namespace = normalize_namespace(namespace);

        let issues = match mode {
            ValidationMode::FileSystem => {
                self.validate_from_file_system(Path::new(document), Path::new(schema), namespace)?
            }
            ValidationMode::InMemory => self.validate_in_memory(document, schema, namespace)?,
        };

        tracing::debug!(issues = issues.len(), "validation pass complete");
        Ok(issues)
    }

    /// Validate many documents on disk against one schema, in parallel
    ///
    /// The schema is parsed once. Results keep the order of `documents`; a
    /// document that cannot be validated records its error without affecting
    /// the others.
    #[tracing::instrument(skip(self, documents), fields(schema = %schema_path.display(), count = documents.len()))]
    pub fn validate_files(
        &self,
        schema_path: &Path,
        documents: &[PathBuf],
        namespace: Option<&str>,
    ) -> Result<Vec<DocumentValidation>> {
        require::not_empty("documents", Some(documents))?;
        let schema = self.load_schema_file(schema_path, normalize_namespace(namespace))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| ToolkitError::ThreadPool(e.to_string()))?;

        let results = pool.install(|| {
            documents
                .par_iter()
                .map(|path| DocumentValidation {
                    path: path.clone(),
                    result: self.validate_file_against(&schema, path),
                })
                .collect::<Vec<_>>()
        });

        tracing::debug!(
            invalid = results.iter().filter(|r| !r.is_valid()).count(),
            "batch validation complete"
        );
        Ok(results)
    }

    fn validate_from_file_system(
        &self,
        document_path: &Path,
        schema_path: &Path,
        namespace: Option<&str>,
    ) -> Result<Vec<SchemaIssue>> {
        ensure_exists(document_path)?;
        let schema = self.load_schema_file(schema_path, namespace)?;
        self.validate_file_against(&schema, document_path)
    }

    fn validate_in_memory(
        &self,
        document: &str,
        schema: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<SchemaIssue>> {
        let schema = self
            .libxml2
            .parse_schema_from_memory(schema.as_bytes())
            .map_err(|e| engine_error(e, "<memory>"))?;
        check_namespace(&schema, namespace)?;
        let doc = self
            .libxml2
            .read_document_from_memory(document.as_bytes())
            .map_err(|e| engine_error(e, "<memory>"))?;

        let diagnostics = self.libxml2.validate_document(&schema, &doc)?;
        Ok(diagnostics.into_iter().map(SchemaIssue::from).collect())
    }

    fn load_schema_file(&self, schema_path: &Path, namespace: Option<&str>) -> Result<XmlSchemaPtr> {
        ensure_exists(schema_path)?;
        let schema = self
            .libxml2
            .parse_schema_from_file(schema_path)
            .map_err(|e| engine_error(e, &schema_path.display().to_string()))?;
        check_namespace(&schema, namespace)?;
        Ok(schema)
    }

    fn validate_file_against(
        &self,
        schema: &XmlSchemaPtr,
        document_path: &Path,
    ) -> Result<Vec<SchemaIssue>> {
        ensure_exists(document_path)?;
        let source_name = document_path.display().to_string();

        // Well-formedness first: a streaming pass over a malformed file reports no usable diagnostics.
        drop(
            self.libxml2
                .read_document_from_file(document_path)
                .map_err(|e| engine_error(e, &source_name))?,
        );

        let diagnostics = self
            .libxml2
            .validate_file(schema, document_path)
            .map_err(|e| engine_error(e, &source_name))?;
        Ok(diagnostics.into_iter().map(SchemaIssue::from).collect())
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Empty namespaces mean "no namespace"
fn normalize_namespace(namespace: Option<&str>) -> Option<&str> {
    namespace.filter(|ns| !ns.is_empty())
}

/// Compares against the schema's parsed `targetNamespace`; a schema without one declares `""`
fn check_namespace(schema: &XmlSchemaPtr, expected: Option<&str>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let actual = schema.target_namespace().unwrap_or_default();
    if actual != expected {
        return Err(ToolkitError::NamespaceMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(ToolkitError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn engine_error(err: LibXml2Error, source_name: &str) -> ToolkitError {
    match err {
        LibXml2Error::SchemaParseFailed { details } => ToolkitError::SchemaParsing {
            source_name: source_name.to_string(),
            details,
        },
        LibXml2Error::NotWellFormed { details } => ToolkitError::MalformedDocument {
            source_name: source_name.to_string(),
            details,
        },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMESPACED_XSD: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:orders"
           elementFormDefault="qualified">
  <xs:element name="order" type="xs:string"/>
</xs:schema>"#;

    const PLAIN_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="order" type="xs:string"/>
</xs:schema>"#;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("file-system".parse::<ValidationMode>().unwrap(), ValidationMode::FileSystem);
        assert_eq!("FileSystem".parse::<ValidationMode>().unwrap(), ValidationMode::FileSystem);
        assert_eq!("in-memory".parse::<ValidationMode>().unwrap(), ValidationMode::InMemory);
        assert_eq!("IN_MEMORY".parse::<ValidationMode>().unwrap(), ValidationMode::InMemory);

        let err = "network".parse::<ValidationMode>().unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidMode(ref m) if m == "network"));
    }

    #[test]
    fn test_mode_display_round_trips() {
        for mode in [ValidationMode::FileSystem, ValidationMode::InMemory] {
            assert_eq!(mode.to_string().parse::<ValidationMode>().unwrap(), mode);
        }
    }

    fn parse(schema: &str) -> XmlSchemaPtr {
        LibXml2Wrapper::new()
            .parse_schema_from_memory(schema.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_mode_serde_accepts_every_spelling() {
        #[derive(Deserialize)]
        struct Settings {
            mode: ValidationMode,
        }

        for (text, expected) in [
            ("file-system", ValidationMode::FileSystem),
            ("filesystem", ValidationMode::FileSystem),
            ("in_memory", ValidationMode::InMemory),
            ("InMemory", ValidationMode::InMemory),
        ] {
            let settings: Settings = toml::from_str(&format!("mode = \"{text}\"")).unwrap();
            assert_eq!(settings.mode, expected, "{text}");
        }

        assert!(toml::from_str::<Settings>("mode = \"network\"").is_err());
        assert_eq!(
            serde_json::to_string(&ValidationMode::InMemory).unwrap(),
            "\"in-memory\""
        );
    }

    #[test]
    fn test_check_namespace() {
        let namespaced = parse(NAMESPACED_XSD);
        let plain = parse(PLAIN_XSD);
        assert!(check_namespace(&namespaced, None).is_ok());
        assert!(check_namespace(&namespaced, Some("urn:orders")).is_ok());
        assert!(check_namespace(&plain, None).is_ok());
        assert!(check_namespace(&plain, Some("urn:orders")).is_err());

        match check_namespace(&namespaced, Some("urn:other")).unwrap_err() {
            ToolkitError::NamespaceMismatch { expected, actual } => {
                assert_eq!(expected, "urn:other");
                assert_eq!(actual, "urn:orders");
            }
            other => panic!("Expected NamespaceMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_namespace_is_no_namespace() {
        assert_eq!(normalize_namespace(Some("")), None);
        assert_eq!(normalize_namespace(None), None);
        assert_eq!(normalize_namespace(Some("urn:x")), Some("urn:x"));
    }

    #[test]
    fn test_issue_display() {
        let issue = SchemaIssue {
            severity: Severity::Error,
            message: "Element 'x': This element is not expected.".to_string(),
            line: Some(3),
            column: None,
        };
        assert_eq!(
            issue.to_string(),
            "error at line 3: Element 'x': This element is not expected."
        );

        let warning = SchemaIssue {
            severity: Severity::Warning,
            message: "w".to_string(),
            line: None,
            column: None,
        };
        assert_eq!(warning.to_string(), "warning: w");
        assert!(!warning.is_error());
    }

    #[test]
    fn test_issue_from_diagnostic() {
        let issue = SchemaIssue::from(XmlDiagnostic {
            level: DiagnosticLevel::Fatal,
            message: "boom".to_string(),
            line: Some(1),
            column: Some(4),
        });
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.position().as_deref(), Some("line 1, column 4"));
    }

    #[test]
    fn test_blank_inputs_are_rejected() {
        let validator = SchemaValidator::new();
        let err = validator
            .validate(ValidationMode::InMemory, " ", PLAIN_XSD, None)
            .unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidArgument { ref param, .. } if param == "document"));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = SchemaValidator::new().with_threads(0).err().unwrap();
        assert!(matches!(err, ToolkitError::OutOfRange { .. }));
        assert_eq!(SchemaValidator::new().with_threads(3).unwrap().threads(), 3);
    }

    #[test]
    fn test_in_memory_namespace_mismatch_is_hard_error() {
        let validator = SchemaValidator::new();
        let doc = r#"<order xmlns="urn:orders">x</order>"#;
        let result = validator.validate(ValidationMode::InMemory, doc, NAMESPACED_XSD, Some("urn:nope"));
        assert!(matches!(result, Err(ToolkitError::NamespaceMismatch { .. })));

        let issues = validator
            .validate(ValidationMode::InMemory, doc, NAMESPACED_XSD, Some("urn:orders"))
            .unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_namespace_in_leading_comment_is_ignored() {
        let schema = r#"<?xml version="1.0"?>
<!-- was: <xs:schema targetNamespace="urn:old"> -->
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:new"
           elementFormDefault="qualified">
  <xs:element name="order" type="xs:string"/>
</xs:schema>"#;
        let doc = r#"<order xmlns="urn:new">x</order>"#;

        let issues = SchemaValidator::new()
            .validate(ValidationMode::InMemory, doc, schema, Some("urn:new"))
            .unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_escaped_namespace_compares_unescaped() {
        let schema = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:a&amp;b"
           elementFormDefault="qualified">
  <xs:element name="order" type="xs:string"/>
</xs:schema>"#;
        let doc = r#"<order xmlns="urn:a&amp;b">x</order>"#;

        let issues = SchemaValidator::new()
            .validate(ValidationMode::InMemory, doc, schema, Some("urn:a&b"))
            .unwrap();
        assert!(issues.is_empty());
    }
}
