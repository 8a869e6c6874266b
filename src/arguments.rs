//! Flat `--key=value` argument tables
//!
//! [`ArgumentTable`] turns raw tokens into an immutable, case-insensitive
//! lookup. Parsing never stops at the first bad token: every malformed or
//! duplicate token is collected and reported once through
//! [`ToolkitError::MalformedArguments`].

use std::collections::BTreeMap;

use crate::error::{ArgumentError, ArgumentErrorReason, Result, ToolkitError};
use crate::require;

/// Marker stripped from every token before splitting
const OPTION_MARKER: &str = "--";

/// Read access to a parsed set of arguments
#[cfg_attr(test, mockall::automock)]
pub trait ArgumentSource {
    /// Value stored for `name` (case-insensitive); blank values count as missing
    fn argument_value(&self, name: &str) -> Result<String>;

    /// Every parsed argument, keyed by lower-cased name
    fn all_arguments(&self) -> BTreeMap<String, String>;
}

/// Immutable case-insensitive key/value table built from flat tokens
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgumentTable {
    arguments: BTreeMap<String, String>,
}

impl ArgumentTable {
    /// Parse a non-empty sequence of `--key=value` tokens
    ///
    /// Every occurrence of `--` is removed from a token before it is split on
    /// `=`. A token must then contain exactly one `=` with a non-empty key in
    /// front of it; the value may be empty. Keys are lower-cased, and a key
    /// seen twice is reported as an error rather than overwritten.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for an empty token sequence and
    /// `MalformedArguments` listing every bad token otherwise.
    pub fn parse<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<S> = tokens.into_iter().collect();
        require::not_empty("args", Some(&tokens))?;

        let mut arguments = BTreeMap::new();
        let mut errors = Vec::new();

        for token in &tokens {
            let token = token.as_ref();
            match split_token(token) {
                Ok((key, value)) => {
                    if arguments.contains_key(&key) {
                        errors.push(ArgumentError {
                            token: token.to_string(),
                            reason: ArgumentErrorReason::DuplicateKey(key),
                        });
                        continue;
                    }
                    arguments.insert(key, value);
                }
                Err(reason) => errors.push(ArgumentError {
                    token: token.to_string(),
                    reason,
                }),
            }
        }

        if !errors.is_empty() {
            tracing::debug!(
                malformed = errors.len(),
                total = tokens.len(),
                "rejecting argument tokens"
            );
            return Err(ToolkitError::MalformedArguments { errors });
        }

        Ok(Self { arguments })
    }

    /// Parse the current process arguments, skipping the program name
    pub fn from_env() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    /// Look up `name` case-insensitively
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `name` is blank, `MissingValue` when the key is
    /// absent or maps to a blank value.
    pub fn get_argument_value(&self, name: &str) -> Result<&str> {
        require::not_null("argument_name", name)?;

        match self.arguments.get(&name.to_lowercase()) {
            Some(value) if !value.trim().is_empty() => Ok(value.as_str()),
            _ => Err(ToolkitError::MissingValue {
                name: name.to_string(),
            }),
        }
    }

    /// Like [`ArgumentTable::get_argument_value`] but treats a missing value as `None`
    pub fn find(&self, name: &str) -> Result<Option<&str>> {
        match self.get_argument_value(name) {
            Ok(value) => Ok(Some(value)),
            Err(ToolkitError::MissingValue { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read-only view of the whole table
    pub fn arguments(&self) -> &BTreeMap<String, String> {
        &self.arguments
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

impl ArgumentSource for ArgumentTable {
    fn argument_value(&self, name: &str) -> Result<String> {
        self.get_argument_value(name).map(str::to_string)
    }

    fn all_arguments(&self) -> BTreeMap<String, String> {
        self.arguments.clone()
    }
}

fn split_token(token: &str) -> std::result::Result<(String, String), ArgumentErrorReason> {
    let stripped = token.replace(OPTION_MARKER, "");
    let parts: Vec<&str> = stripped.split('=').collect();

    if parts.len() != 2 {
        return Err(ArgumentErrorReason::NotKeyValue);
    }
    if parts[0].is_empty() {
        return Err(ArgumentErrorReason::EmptyKey);
    }

    Ok((parts[0].to_lowercase(), parts[1].to_string()))
}
