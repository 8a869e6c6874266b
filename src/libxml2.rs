//! LibXML2 FFI Wrapper Module
//!
//! Safe wrapper around the parts of libxml2 needed for XML Schema validation:
//! schema parsing (from memory or from a path), document parsing, tree
//! validation, and streaming file validation.
//!
//! No mature pure Rust XSD validator exists, so validation is delegated to
//! libxml2 through direct FFI. Diagnostics are captured through libxml2's
//! structured error callbacks into a buffer owned by each call, so concurrent
//! calls never share diagnostic state.
//!
//! ## Thread Safety
//!
//! - **Schema parsing** is NOT thread-safe in libxml2 and is serialized behind
//!   a process-wide lock.
//! - **Validation** is thread-safe as long as every thread uses its own
//!   validation context; parsed schemas can be shared through [`XmlSchemaPtr`].

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use libc::{c_char, c_int, c_uint, c_void};

use crate::error::{LibXml2Error, LibXml2Result};

static LIBXML2_INIT: Once = Once::new();

/// Serializes schema parsing, which libxml2 does not support concurrently
static SCHEMA_PARSE_LOCK: Mutex<()> = Mutex::new(());

/// Parser options for instance documents: XML_PARSE_NOERROR | XML_PARSE_NOWARNING | XML_PARSE_NONET
const DOCUMENT_PARSE_OPTIONS: c_int = 32 | 64 | 2048;

// xmlErrorLevel values
const XML_ERR_WARNING: c_int = 1;
const XML_ERR_ERROR: c_int = 2;
const XML_ERR_FATAL: c_int = 3;

/// Leading fields of libxml2's `xmlSchema`; the rest stays opaque
#[repr(C)]
pub struct XmlSchema {
    _name: *const c_char,
    target_namespace: *const c_char,
    _private: [u8; 0],
}

/// ## Opaque libxml2 structures

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

/// Layout of libxml2's `xmlError`
#[repr(C)]
pub struct XmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *const XmlError)>;

#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();

    // Schema parsing
    pub fn xmlSchemaNewMemParserCtxt(
        buffer: *const c_char,
        size: c_int,
    ) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaNewParserCtxt(url: *const c_char) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation
    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
    pub fn xmlSchemaValidateFile(
        ctxt: *mut XmlSchemaValidCtxt,
        file_name: *const c_char,
        options: c_uint,
    ) -> c_int;

    // Document parsing
    pub fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlReadFile(filename: *const c_char, encoding: *const c_char, options: c_int)
    -> *mut XmlDoc;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);

    pub fn xmlGetLastError() -> *const XmlError;
    pub fn xmlResetLastError();
}

/// Severity libxml2 attached to a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Warning,
    Error,
    Fatal,
}

/// One message reported by libxml2 through a structured error callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDiagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    /// 1-based line, when libxml2 knows it
    pub line: Option<u32>,
    /// 1-based column, when libxml2 knows it
    pub column: Option<u32>,
}

impl XmlDiagnostic {
    /// # Safety
    ///
    /// `error` must be null or point to a live `xmlError`.
    unsafe fn from_raw(error: *const XmlError) -> Option<Self> {
        if error.is_null() {
            return None;
        }
        let error = unsafe { &*error };

        let level = match error.level {
            XML_ERR_WARNING => DiagnosticLevel::Warning,
            XML_ERR_ERROR => DiagnosticLevel::Error,
            XML_ERR_FATAL => DiagnosticLevel::Fatal,
            _ => return None,
        };

        let message = if error.message.is_null() {
            format!("libxml2 error code {}", error.code)
        } else {
            unsafe { CStr::from_ptr(error.message) }
                .to_string_lossy()
                .trim()
                .to_string()
        };

        Some(Self {
            level,
            message,
            line: positive(error.line),
            column: positive(error.int2),
        })
    }
}

fn positive(value: c_int) -> Option<u32> {
    u32::try_from(value).ok().filter(|v| *v > 0)
}

/// Callback for libxml2 to report diagnostics (structured)
unsafe extern "C" fn collect_diagnostic(user_data: *mut c_void, error: *const XmlError) {
    if user_data.is_null() {
        return;
    }
    let diagnostics = unsafe { &mut *(user_data as *mut Vec<XmlDiagnostic>) };

    if let Some(diagnostic) = unsafe { XmlDiagnostic::from_raw(error) } {
        diagnostics.push(diagnostic);
    }
}

/// Thread-safe wrapper for libxml2 schema pointer with proper resource management
#[derive(Debug)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

// Safety: parsed xmlSchema structures are read-only during validation.
unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// `ptr` must have been returned by `xmlSchemaParse` and must not be freed elsewhere.
    unsafe fn from_raw(ptr: *mut XmlSchema) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }

        Some(XmlSchemaPtr {
            inner: Arc::new(XmlSchemaInner {
                ptr,
                _phantom: PhantomData,
            }),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }

    /// `targetNamespace` declared on the parsed schema, `None` when absent
    ///
    /// The value comes from the parsed root element, so comments are skipped
    /// and character references are already resolved.
    pub fn target_namespace(&self) -> Option<String> {
        // Safety: the pointer is non-null and owned by `inner` for as long as self lives;
        // the string is interned in the schema's dictionary.
        let ns = unsafe { (*self.inner.ptr).target_namespace };
        if ns.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(ns) }.to_string_lossy().into_owned())
    }
}

impl Clone for XmlSchemaPtr {
    fn clone(&self) -> Self {
        XmlSchemaPtr {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlSchemaFree(self.ptr);
            }
            self.ptr = std::ptr::null_mut();
        }
    }
}

/// Owned parsed document, freed on drop
#[derive(Debug)]
pub struct XmlDocPtr {
    ptr: *mut XmlDoc,
}

impl Drop for XmlDocPtr {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlFreeDoc(self.ptr);
            }
        }
    }
}

/// Safe access to libxml2 parsing and schema validation
pub struct LibXml2Wrapper {
    _phantom: PhantomData<()>,
}

impl LibXml2Wrapper {
    /// Initializes libxml2 exactly once per process
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });

        LibXml2Wrapper {
            _phantom: PhantomData,
        }
    }

    /// Parse an XML schema held in memory
    ///
    /// # Errors
    ///
    /// `SchemaParseFailed` with every parser diagnostic when the schema is invalid.
    pub fn parse_schema_from_memory(&self, schema_data: &[u8]) -> LibXml2Result<XmlSchemaPtr> {
        let size = c_int::try_from(schema_data.len()).map_err(|_| LibXml2Error::InputTooLarge {
            size: schema_data.len(),
        })?;

        let _guard = SCHEMA_PARSE_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let parser_ctxt =
            unsafe { xmlSchemaNewMemParserCtxt(schema_data.as_ptr() as *const c_char, size) };
        if parser_ctxt.is_null() {
            return Err(LibXml2Error::MemoryAllocation);
        }

        unsafe { Self::parse_schema_with(parser_ctxt) }
    }

    /// Parse an XML schema from a path, resolving includes relative to it
    pub fn parse_schema_from_file(&self, schema_path: &Path) -> LibXml2Result<XmlSchemaPtr> {
        let c_path = path_to_cstring(schema_path)?;

        let _guard = SCHEMA_PARSE_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let parser_ctxt = unsafe { xmlSchemaNewParserCtxt(c_path.as_ptr()) };
        if parser_ctxt.is_null() {
            return Err(LibXml2Error::MemoryAllocation);
        }

        unsafe { Self::parse_schema_with(parser_ctxt) }
    }

    /// # Safety
    ///
    /// `parser_ctxt` must be a fresh, non-null parser context; it is freed here.
    unsafe fn parse_schema_with(
        parser_ctxt: *mut XmlSchemaParserCtxt,
    ) -> LibXml2Result<XmlSchemaPtr> {
        let mut diagnostics: Vec<XmlDiagnostic> = Vec::new();

        let schema_ptr = unsafe {
            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(collect_diagnostic),
                &mut diagnostics as *mut Vec<XmlDiagnostic> as *mut c_void,
            );
            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);
            schema_ptr
        };

        match unsafe { XmlSchemaPtr::from_raw(schema_ptr) } {
            Some(schema) => Ok(schema),
            None => Err(LibXml2Error::SchemaParseFailed {
                details: join_diagnostics(&diagnostics, "schema could not be parsed"),
            }),
        }
    }

    /// Parse a document held in memory into a tree
    ///
    /// # Errors
    ///
    /// `NotWellFormed` when the text is not a well-formed XML document.
    pub fn read_document_from_memory(&self, document: &[u8]) -> LibXml2Result<XmlDocPtr> {
        let size = c_int::try_from(document.len()).map_err(|_| LibXml2Error::InputTooLarge {
            size: document.len(),
        })?;

        unsafe {
            xmlResetLastError();
            let doc = xmlReadMemory(
                document.as_ptr() as *const c_char,
                size,
                std::ptr::null(),
                std::ptr::null(),
                DOCUMENT_PARSE_OPTIONS,
            );
            Self::wrap_document(doc)
        }
    }

    /// Parse a document from disk into a tree
    pub fn read_document_from_file(&self, document_path: &Path) -> LibXml2Result<XmlDocPtr> {
        let c_path = path_to_cstring(document_path)?;

        unsafe {
            xmlResetLastError();
            let doc = xmlReadFile(c_path.as_ptr(), std::ptr::null(), DOCUMENT_PARSE_OPTIONS);
            Self::wrap_document(doc)
        }
    }

    unsafe fn wrap_document(doc: *mut XmlDoc) -> LibXml2Result<XmlDocPtr> {
        if !doc.is_null() {
            return Ok(XmlDocPtr { ptr: doc });
        }

        let details = unsafe { XmlDiagnostic::from_raw(xmlGetLastError()) }
            .map(|d| describe(&d))
            .unwrap_or_else(|| "document is not well-formed".to_string());
        Err(LibXml2Error::NotWellFormed { details })
    }

    /// Validate a parsed document tree against a schema
    ///
    /// Every diagnostic libxml2 reports during the pass is returned, in
    /// document order. Safe to call concurrently with a shared schema.
    pub fn validate_document(
        &self,
        schema: &XmlSchemaPtr,
        document: &XmlDocPtr,
    ) -> LibXml2Result<Vec<XmlDiagnostic>> {
        self.with_valid_ctxt(schema, |valid_ctxt| unsafe {
            xmlSchemaValidateDoc(valid_ctxt, document.ptr)
        })
    }

    /// Validate a document on disk in a single streaming pass
    pub fn validate_file(
        &self,
        schema: &XmlSchemaPtr,
        file_path: &Path,
    ) -> LibXml2Result<Vec<XmlDiagnostic>> {
        let c_path = path_to_cstring(file_path)?;

        self.with_valid_ctxt(schema, |valid_ctxt| unsafe {
            xmlSchemaValidateFile(valid_ctxt, c_path.as_ptr(), 0)
        })
    }

    fn with_valid_ctxt<F>(&self, schema: &XmlSchemaPtr, run: F) -> LibXml2Result<Vec<XmlDiagnostic>>
    where
        F: FnOnce(*mut XmlSchemaValidCtxt) -> c_int,
    {
        let valid_ctxt = unsafe { xmlSchemaNewValidCtxt(schema.as_ptr()) };
        if valid_ctxt.is_null() {
            return Err(LibXml2Error::ValidationContextCreationFailed);
        }

        let mut diagnostics: Vec<XmlDiagnostic> = Vec::new();
        let code = unsafe {
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(collect_diagnostic),
                &mut diagnostics as *mut Vec<XmlDiagnostic> as *mut c_void,
            );
            let code = run(valid_ctxt);
            xmlSchemaFreeValidCtxt(valid_ctxt);
            code
        };

        if code < 0 {
            return Err(LibXml2Error::InternalError { code });
        }

        if code > 0 && diagnostics.is_empty() {
            tracing::warn!(code, "libxml2 rejected the document without reporting a diagnostic");
            diagnostics.push(XmlDiagnostic {
                level: DiagnosticLevel::Error,
                message: format!("document failed schema validation (libxml2 code {})", code),
                line: None,
                column: None,
            });
        }

        Ok(diagnostics)
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

fn path_to_cstring(path: &Path) -> LibXml2Result<CString> {
    let text = path.to_string_lossy();
    CString::new(text.as_bytes()).map_err(|_| LibXml2Error::InteriorNul {
        input: text.into_owned(),
    })
}

fn describe(diagnostic: &XmlDiagnostic) -> String {
    match (diagnostic.line, diagnostic.column) {
        (Some(line), Some(column)) => format!("{}:{}: {}", line, column, diagnostic.message),
        (Some(line), None) => format!("{}: {}", line, diagnostic.message),
        _ => diagnostic.message.clone(),
    }
}

fn join_diagnostics(diagnostics: &[XmlDiagnostic], fallback: &str) -> String {
    if diagnostics.is_empty() {
        return fallback.to_string();
    }
    diagnostics
        .iter()
        .map(describe)
        .collect::<Vec<_>>()
        .join("; ")
}
