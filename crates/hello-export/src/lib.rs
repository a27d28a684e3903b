//! # hello-export - a single text export for any host
//!
//! This crate holds the one function every binding in this workspace exposes,
//! together with the small registration layer the bindings use to publish it.
//!
//! ## The export
//!
//! `hello` takes an optional piece of text and returns a greeting:
//!
//! | Argument      | Result            |
//! |---------------|-------------------|
//! | none          | `"Hello World!"`  |
//! | `"world"`     | `"hello, world!"` |
//!
//! The function is pure. The same input always produces the same bytes and no
//! call touches any state outside its own return value.
//!
//! ## Registration
//!
//! Hosts differ in how they accept exports: a JS object populated by a
//! wasm-bindgen module, a static symbol table for a C ABI library, or an
//! in-process [`ExportTable`]. Each of these is a [`Registrar`]. The embedding
//! layer calls [`init`] exactly once after loading the module; `init` performs
//! one [`Registrar::register`] call with [`ExportedFunction::hello`].
//!
//! ```
//! use hello_export::{init, ExportTable, EXPORT_NAME};
//!
//! let mut exports = ExportTable::new();
//! init(&mut exports).unwrap();
//!
//! assert_eq!(exports.len(), 1);
//! assert_eq!(exports.call(EXPORT_NAME, Some("world")).unwrap(), "hello, world!");
//! assert_eq!(exports.call(EXPORT_NAME, None).unwrap(), "Hello World!");
//! ```
//!
//! A second `init` against the same registrar is rejected with
//! [`BindingError::DuplicateExport`] rather than overwriting the first entry.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod error;
mod table;

pub use error::BindingError;
pub use table::{init, ExportTable, Registrar};

/// Name the export is published under.
pub const EXPORT_NAME: &str = "hello";

/// Returned when `hello` is called without an argument.
pub const FIXED_GREETING: &str = "Hello World!";

pub const GREETING_PREFIX: &str = "hello, ";
pub const GREETING_SUFFIX: &str = "!";

/// Builds the greeting for `name`.
///
/// ```
/// assert_eq!(hello_export::hello(Some("rust")), "hello, rust!");
/// assert_eq!(hello_export::hello(None), "Hello World!");
/// ```
pub fn hello(name: Option<&str>) -> String {
    match name {
        None => FIXED_GREETING.to_string(),
        Some(name) => {
            let mut out =
                String::with_capacity(GREETING_PREFIX.len() + name.len() + GREETING_SUFFIX.len());
            out.push_str(GREETING_PREFIX);
            out.push_str(name);
            out.push_str(GREETING_SUFFIX);
            out
        }
    }
}

/// Kind of value a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ParamKind {
    /// Text that may be omitted by the caller.
    OptionalText,
}

/// Kind of value a function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValueKind {
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExportSignature {
    pub params: Vec<ParamKind>,
    pub returns: ValueKind,
}

/// Host-neutral description of an export, suitable for comparing what a
/// loaded module exposes against what this crate registers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExportDescriptor {
    pub name: String,
    pub signature: ExportSignature,
}

/// A named, stateless text function that can be handed to a [`Registrar`].
#[derive(Clone, Copy)]
pub struct ExportedFunction {
    name: &'static str,
    imp: fn(Option<&str>) -> String,
}

impl ExportedFunction {
    /// The `hello` export.
    pub const fn hello() -> Self {
        Self {
            name: EXPORT_NAME,
            imp: hello,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn signature(&self) -> ExportSignature {
        ExportSignature {
            params: vec![ParamKind::OptionalText],
            returns: ValueKind::Text,
        }
    }

    pub fn describe(&self) -> ExportDescriptor {
        ExportDescriptor {
            name: self.name.to_string(),
            signature: self.signature(),
        }
    }

    pub fn invoke(&self, arg: Option<&str>) -> String {
        (self.imp)(arg)
    }
}

impl std::fmt::Debug for ExportedFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
