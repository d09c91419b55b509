//! # PDF Rendering
//!
//! A small PDF 1.4 writer for invoice documents.
//!
//! ## File Layout
//! ```text
//! %PDF-1.4
//! 1 0 obj  Catalog
//! 2 0 obj  Pages (Kids = every page object)
//! 3 0 obj  Font F1  Helvetica       (WinAnsiEncoding)
//! 4 0 obj  Font F2  Helvetica-Bold  (WinAnsiEncoding)
//! 5 0 obj  Page 1        6 0 obj  Content stream 1
//! 7 0 obj  Page 2        8 0 obj  Content stream 2   ...
//! xref / trailer / startxref / %%EOF
//! ```
//!
//! Output depends only on the [`InvoiceDocument`]: no creation date, no
//! document ID, no compression. Rendering the same document twice yields
//! identical bytes.
//!
//! Text uses the standard base-14 fonts with WinAnsiEncoding: Latin-1 plus
//! the typographic punctuation and `€` WinAnsi adds. Any other character
//! prints as `?`. The HTML document keeps the original text.

use super::{DocumentLine, DocumentRow, InvoiceDocument};

// =============================================================================
// Page Geometry (points, US Letter)
// =============================================================================

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 54.0;
const RIGHT_EDGE: f32 = PAGE_WIDTH - MARGIN;
const FOOTER_Y: f32 = 30.0;

const BODY_SIZE: f32 = 10.0;
const ROW_HEIGHT: f32 = 14.0;
const SMALL_ROW_HEIGHT: f32 = 13.0;

const QTY_RIGHT: f32 = 380.0;
const UNIT_PRICE_RIGHT: f32 = 470.0;
const TOTALS_LABEL_X: f32 = 360.0;
const META_LABEL_X: f32 = 360.0;
const META_VALUE_X: f32 = 430.0;

const DESCRIPTION_WRAP: usize = 48;
const NOTES_WRAP: usize = 95;

// =============================================================================
// Public API
// =============================================================================

/// Renders the document as PDF bytes.
///
/// ## Example
/// ```rust,ignore
/// let doc = InvoiceDocument::build(&invoice, &customer, &shop)?;
/// std::fs::write("invoice.pdf", render_pdf(&doc))?;
/// ```
pub fn render_pdf(doc: &InvoiceDocument) -> Vec<u8> {
    let pages = lay_out(doc);
    write_file(&pages)
}

// =============================================================================
// Text Helpers
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Advance width in 1/1000 em. Exact for the characters amounts use.
fn glyph_width(c: char) -> u32 {
    match c {
        '0'..='9' | '$' => 556,
        ',' | '.' | ' ' => 278,
        '-' => 333,
        _ => 556,
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(glyph_width).sum::<u32>() as f32 * size / 1000.0
}

/// The WinAnsiEncoding byte for `ch`, if the standard fonts can show it.
fn win_ansi(ch: char) -> Option<u8> {
    let byte = match ch {
        ' '..='~' => ch as u8,
        '\u{A0}'..='\u{FF}' => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Writes `text` as a PDF literal string in WinAnsi bytes.
fn push_literal(out: &mut Vec<u8>, text: &str) {
    out.push(b'(');
    for ch in text.chars() {
        let byte = win_ansi(ch).unwrap_or(b'?');
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out.push(b')');
}

/// Greedy word wrap by character count. Words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

// =============================================================================
// Layout
// =============================================================================

/// Accumulates content streams, starting a new page when a block would run
/// into the bottom margin.
struct Layout {
    pages: Vec<Vec<u8>>,
    current: Vec<u8>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Starts a new page if `height` does not fit. Returns whether it did.
    fn ensure(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }

    fn text_at(&mut self, x: f32, y: f32, font: Font, size: f32, text: &str) {
        self.current.extend_from_slice(
            format!("BT /{} {} Tf {:.2} {:.2} Td ", font.resource(), size, x, y).as_bytes(),
        );
        push_literal(&mut self.current, text);
        self.current.extend_from_slice(b" Tj ET\n");
    }

    fn text(&mut self, x: f32, font: Font, size: f32, text: &str) {
        let y = self.y;
        self.text_at(x, y, font, size, text);
    }

    fn text_right(&mut self, right: f32, font: Font, size: f32, text: &str) {
        let x = right - text_width(text, size);
        self.text(x, font, size, text);
    }

    fn rule(&mut self) {
        self.current.extend_from_slice(
            format!(
                "0.5 w {:.2} {:.2} m {:.2} {:.2} l S\n",
                MARGIN, self.y, RIGHT_EDGE, self.y
            )
            .as_bytes(),
        );
    }

    /// Closes the last page and stamps page footers.
    fn finish(mut self, footer: &str) -> Vec<Vec<u8>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.new_page();
        }

        let total = self.pages.len();
        let mut pages = std::mem::take(&mut self.pages);
        for (index, page) in pages.iter_mut().enumerate() {
            let mut stamp = Layout {
                pages: Vec::new(),
                current: std::mem::take(page),
                y: FOOTER_Y,
            };
            let label = format!("{}  Page {} of {}", footer, index + 1, total);
            stamp.text_right(RIGHT_EDGE, Font::Regular, 8.0, &label);
            *page = stamp.current;
        }
        pages
    }
}

fn lay_out(doc: &InvoiceDocument) -> Vec<Vec<u8>> {
    let mut layout = Layout::new();

    header(&mut layout, doc);
    bill_to(&mut layout, &doc.customer_lines);
    items_table(&mut layout, &doc.lines);
    totals(&mut layout, &doc.totals_rows);

    if !doc.notes.is_empty() {
        let lines: Vec<String> = doc
            .notes
            .iter()
            .flat_map(|line| wrap(line, NOTES_WRAP))
            .collect();
        section(&mut layout, "Notes", &lines);
    }

    if !doc.refund_rows.is_empty() {
        let lines: Vec<String> = doc
            .refund_rows
            .iter()
            .map(|row| format!("{}: {}", row.label, row.value))
            .flat_map(|line| wrap(&line, NOTES_WRAP))
            .collect();
        section(&mut layout, "Refund", &lines);
    }

    let footer = doc
        .invoice_rows
        .first()
        .map(|row| row.value.as_str())
        .unwrap_or_default();
    layout.finish(footer)
}

fn header(layout: &mut Layout, doc: &InvoiceDocument) {
    layout.text(MARGIN, Font::Bold, 18.0, &doc.shop_name);
    layout.text_right(RIGHT_EDGE, Font::Bold, 20.0, "INVOICE");
    layout.advance(22.0);

    let rows = doc.shop_lines.len().max(doc.invoice_rows.len());
    for i in 0..rows {
        if let Some(line) = doc.shop_lines.get(i) {
            layout.text(MARGIN, Font::Regular, BODY_SIZE, line);
        }
        if let Some(row) = doc.invoice_rows.get(i) {
            layout.text(META_LABEL_X, Font::Bold, BODY_SIZE, &row.label);
            layout.text(META_VALUE_X, Font::Regular, BODY_SIZE, &row.value);
        }
        layout.advance(SMALL_ROW_HEIGHT);
    }

    layout.advance(4.0);
    layout.rule();
    layout.advance(20.0);
}

fn bill_to(layout: &mut Layout, lines: &[String]) {
    layout.ensure(ROW_HEIGHT + SMALL_ROW_HEIGHT * lines.len() as f32);
    layout.text(MARGIN, Font::Bold, 11.0, "Bill To");
    layout.advance(ROW_HEIGHT);
    for line in lines {
        layout.text(MARGIN, Font::Regular, BODY_SIZE, line);
        layout.advance(SMALL_ROW_HEIGHT);
    }
    layout.advance(12.0);
}

fn table_header(layout: &mut Layout) {
    layout.text(MARGIN, Font::Bold, BODY_SIZE, "Description");
    layout.text_right(QTY_RIGHT, Font::Bold, BODY_SIZE, "Qty");
    layout.text_right(UNIT_PRICE_RIGHT, Font::Bold, BODY_SIZE, "Unit Price");
    layout.text_right(RIGHT_EDGE, Font::Bold, BODY_SIZE, "Total");
    layout.advance(6.0);
    layout.rule();
    layout.advance(ROW_HEIGHT);
}

fn items_table(layout: &mut Layout, lines: &[DocumentLine]) {
    layout.ensure(ROW_HEIGHT * 3.0);
    table_header(layout);

    for line in lines {
        let description = wrap(&line.description, DESCRIPTION_WRAP);
        if layout.ensure(ROW_HEIGHT * description.len() as f32) {
            table_header(layout);
        }

        layout.text_right(QTY_RIGHT, Font::Regular, BODY_SIZE, &line.quantity);
        layout.text_right(UNIT_PRICE_RIGHT, Font::Regular, BODY_SIZE, &line.unit_price);
        layout.text_right(RIGHT_EDGE, Font::Regular, BODY_SIZE, &line.line_total);
        for part in &description {
            layout.text(MARGIN, Font::Regular, BODY_SIZE, part);
            layout.advance(ROW_HEIGHT);
        }
    }

    layout.advance(-8.0);
    layout.rule();
    layout.advance(18.0);
}

fn totals(layout: &mut Layout, rows: &[DocumentRow]) {
    layout.ensure(ROW_HEIGHT * rows.len() as f32);

    for (i, row) in rows.iter().enumerate() {
        let font = if i + 1 == rows.len() {
            Font::Bold
        } else {
            Font::Regular
        };
        layout.text(TOTALS_LABEL_X, font, BODY_SIZE, &row.label);
        layout.text_right(RIGHT_EDGE, font, BODY_SIZE, &row.value);
        layout.advance(ROW_HEIGHT);
    }
}

fn section(layout: &mut Layout, title: &str, lines: &[String]) {
    layout.advance(10.0);
    layout.ensure(ROW_HEIGHT + SMALL_ROW_HEIGHT);
    layout.text(MARGIN, Font::Bold, 11.0, title);
    layout.advance(ROW_HEIGHT);

    for line in lines {
        layout.ensure(SMALL_ROW_HEIGHT);
        layout.text(MARGIN, Font::Regular, BODY_SIZE, line);
        layout.advance(SMALL_ROW_HEIGHT);
    }
}

// =============================================================================
// File Assembly
// =============================================================================

/// First object number used by page/content pairs.
const FIRST_PAGE_OBJECT: usize = 5;

fn write_file(pages: &[Vec<u8>]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();

    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");

    let mut object = |out: &mut Vec<u8>, id: usize, body: &[u8]| {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    };

    object(&mut out, 1, b"<< /Type /Catalog /Pages 2 0 R >>");
    object(
        &mut out,
        2,
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()).as_bytes(),
    );
    object(
        &mut out,
        3,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    object(
        &mut out,
        4,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );

    for (i, content) in pages.iter().enumerate() {
        let page_id = FIRST_PAGE_OBJECT + 2 * i;
        let content_id = page_id + 1;

        object(
            &mut out,
            page_id,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH, PAGE_HEIGHT, content_id
            )
            .as_bytes(),
        );

        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content);
        stream.extend_from_slice(b"\nendstream");
        object(&mut out, content_id, &stream);
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );

    out
}

// =============================================================================
// Unit Tests
// =============================================================================
