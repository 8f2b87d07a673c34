//! PDF module
//!
//! Page rendering and embedded-text access via MuPDF.

mod parser;

pub use parser::{PdfError, PdfMetadata, PdfParser};

#[cfg(test)]
pub(crate) use parser::test_support;
