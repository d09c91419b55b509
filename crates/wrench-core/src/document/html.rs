//! HTML rendering of an [`InvoiceDocument`] through an askama template.
//!
//! The template lives in `templates/invoice.html`; askama escapes every
//! interpolated value.

use askama::Template;

use super::InvoiceDocument;
use crate::error::{CoreError, CoreResult};

#[derive(Template)]
#[template(path = "invoice.html")]
struct InvoiceHtml<'a> {
    doc: &'a InvoiceDocument,
}

/// Renders the document as a standalone HTML page.
pub fn render_html(doc: &InvoiceDocument) -> CoreResult<String> {
    InvoiceHtml { doc }
        .render()
        .map_err(|e| CoreError::Render(e.to_string()))
}
