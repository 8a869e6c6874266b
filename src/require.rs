//! Precondition contracts
//!
//! Guards for checking method inputs before any stateful work happens. Every
//! guard is pure: it either returns `Ok(())` or fails with
//! [`ToolkitError::InvalidArgument`] / [`ToolkitError::OutOfRange`] naming the
//! offending parameter. Guards never log.
//!
//! The free functions cover the common case; [`Require`] lets a caller attach
//! a message to the error.
//!
//! ```
//! use validate_toolkit::require::{self, Require};
//!
//! let args = vec!["--mode=in-memory".to_string()];
//! require::not_empty("args", Some(&args)).unwrap();
//! Require::param("threads")
//!     .message("at least one worker is needed")
//!     .greater_than(0, 4)
//!     .unwrap();
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::error::{Result, ToolkitError};

/// Whether a value counts as absent for [`Require::not_null`]
///
/// `None` is absent; strings are absent when empty or whitespace-only.
pub trait Presence {
    fn is_absent(&self) -> bool;
}

impl Presence for str {
    fn is_absent(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Presence for String {
    fn is_absent(&self) -> bool {
        self.as_str().is_absent()
    }
}

impl Presence for Path {
    fn is_absent(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

impl Presence for PathBuf {
    fn is_absent(&self) -> bool {
        self.as_path().is_absent()
    }
}

impl<T: Presence> Presence for Option<T> {
    fn is_absent(&self) -> bool {
        match self {
            Some(value) => value.is_absent(),
            None => true,
        }
    }
}

impl<T: Presence + ?Sized> Presence for &T {
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: Presence + ?Sized> Presence for Box<T> {
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T> Presence for [T] {
    fn is_absent(&self) -> bool {
        false
    }
}

impl<T> Presence for Vec<T> {
    fn is_absent(&self) -> bool {
        false
    }
}

macro_rules! always_present {
    ($($ty:ty),*) => {
        $(impl Presence for $ty {
            fn is_absent(&self) -> bool {
                false
            }
        })*
    };
}

always_present!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// A parameter under test, optionally carrying the message for the failure
#[derive(Debug, Clone, Copy)]
pub struct Require<'a> {
    param: &'a str,
    message: &'a str,
}

impl<'a> Require<'a> {
    pub fn param(param: &'a str) -> Self {
        Self { param, message: "" }
    }

    pub fn message(mut self, message: &'a str) -> Self {
        self.message = message;
        self
    }

    /// Fails with `InvalidArgument` when `value` is absent or a blank string
    pub fn not_null<V: Presence + ?Sized>(&self, value: &V) -> Result<()> {
        if value.is_absent() {
            return Err(self.invalid_argument());
        }
        Ok(())
    }

    /// Fails with `InvalidArgument` when the sequence is absent and with
    /// `OutOfRange` when it has no elements
    pub fn not_empty<I: IntoIterator>(&self, value: Option<I>) -> Result<()> {
        match value {
            None => Err(self.invalid_argument()),
            Some(items) => {
                if items.into_iter().next().is_none() {
                    Err(self.out_of_range())
                } else {
                    Ok(())
                }
            }
        }
    }

    pub fn greater_than_or_equal<T: PartialOrd + Display>(&self, min: T, actual: T) -> Result<()> {
        if actual >= min {
            return Ok(());
        }
        Err(self.out_of_range_for(format_args!("{} is not >= {}", actual, min)))
    }

    pub fn greater_than<T: PartialOrd + Display>(&self, min: T, actual: T) -> Result<()> {
        if actual > min {
            return Ok(());
        }
        Err(self.out_of_range_for(format_args!("{} is not > {}", actual, min)))
    }

    pub fn less_than_or_equal<T: PartialOrd + Display>(&self, max: T, actual: T) -> Result<()> {
        if actual <= max {
            return Ok(());
        }
        Err(self.out_of_range_for(format_args!("{} is not <= {}", actual, max)))
    }

    pub fn less_than<T: PartialOrd + Display>(&self, max: T, actual: T) -> Result<()> {
        if actual < max {
            return Ok(());
        }
        Err(self.out_of_range_for(format_args!("{} is not < {}", actual, max)))
    }

    fn invalid_argument(&self) -> ToolkitError {
        ToolkitError::InvalidArgument {
            param: self.param.to_string(),
            message: self.message.to_string(),
        }
    }

    fn out_of_range(&self) -> ToolkitError {
        ToolkitError::OutOfRange {
            param: self.param.to_string(),
            message: self.message.to_string(),
        }
    }

    // Caller-supplied messages take precedence over the generated comparison text.
    fn out_of_range_for(&self, comparison: std::fmt::Arguments<'_>) -> ToolkitError {
        let message = if self.message.is_empty() {
            comparison.to_string()
        } else {
            self.message.to_string()
        };
        ToolkitError::OutOfRange {
            param: self.param.to_string(),
            message,
        }
    }
}

pub fn not_null<V: Presence + ?Sized>(param: &str, value: &V) -> Result<()> {
    Require::param(param).not_null(value)
}

pub fn not_empty<I: IntoIterator>(param: &str, value: Option<I>) -> Result<()> {
    Require::param(param).not_empty(value)
}

pub fn greater_than_or_equal<T: PartialOrd + Display>(param: &str, min: T, actual: T) -> Result<()> {
    Require::param(param).greater_than_or_equal(min, actual)
}

pub fn greater_than<T: PartialOrd + Display>(param: &str, min: T, actual: T) -> Result<()> {
    Require::param(param).greater_than(min, actual)
}

pub fn less_than_or_equal<T: PartialOrd + Display>(param: &str, max: T, actual: T) -> Result<()> {
    Require::param(param).less_than_or_equal(max, actual)
}

pub fn less_than<T: PartialOrd + Display>(param: &str, max: T, actual: T) -> Result<()> {
    Require::param(param).less_than(max, actual)
}
