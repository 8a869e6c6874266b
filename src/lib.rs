//! # validate-toolkit Library
//!
//! Input validation building blocks: precondition guards, a `key=value`
//! argument table, mergeable validation reports, an XML Schema validator
//! backed by libxml2, and small XML element helpers.

pub mod arguments;
pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod json;
pub mod libxml2;
pub mod output;
pub mod report;
pub mod require;
pub mod validator;
pub mod xml;

pub use arguments::{ArgumentSource, ArgumentTable};
pub use cli::{Cli, VerbosityLevel};
pub use config::{Config, ConfigManager};
pub use error::{ArgumentError, ArgumentErrorReason, Result, ToolkitError};
pub use json::{JsonFormatting, JsonSettings};
pub use libxml2::{LibXml2Wrapper, XmlSchemaPtr};
pub use output::Output;
pub use report::{ValidationFinding, ValidationReport};
pub use require::Require;
pub use validator::{DocumentValidation, SchemaIssue, SchemaValidator, Severity, ValidationMode};
