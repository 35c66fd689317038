//! Layout analysis for PDF pages.
//!
//! Text is pulled out of the content stream with its position, font and
//! size, grouped into lines by baseline, and lines are grouped into
//! paragraphs by spacing, font size and indentation.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::model::{Alignment, Paragraph, TextRun, TextStyle};

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue};

/// Left and right text margin of the generated document, in points.
pub const PAGE_MARGIN: f32 = 72.0;

/// Average glyph advance as a fraction of the font size.
const AVG_CHAR_WIDTH: f32 = 0.5;

/// TJ adjustments larger than this (in thousandths of an em) read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A text span with position and style information.
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
    /// Font family, cleaned of subset prefixes and style suffixes
    pub font_name: String,
    /// Whether the font appears to be bold
    pub is_bold: bool,
    /// Whether the font appears to be italic
    pub is_italic: bool,
}

impl TextSpan {
    /// Create a new text span from a PDF base font name.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, base_font: &str) -> Self {
        let lower = base_font.to_lowercase();
        let is_bold = lower.contains("bold") || lower.contains("black") || lower.contains("heavy");
        let is_italic = lower.contains("italic") || lower.contains("oblique");
        let width = estimate_width(&text, font_size);

        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name: font_family(base_font),
            is_bold,
            is_italic,
        }
    }

    /// Right edge of the span.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Convert into a document run carrying the span's formatting.
    pub fn to_run(&self) -> TextRun {
        TextRun::styled(self.text.clone(), self.style())
    }

    fn style(&self) -> TextStyle {
        TextStyle {
            bold: self.is_bold,
            italic: self.is_italic,
            font_name: (!self.font_name.is_empty()).then(|| self.font_name.clone()),
            font_size: Some(round_half_point(self.font_size)),
        }
    }
}

/// A text line composed of spans on the same baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The spans in this line, sorted by X position
    pub spans: Vec<TextSpan>,
    /// Y position (baseline)
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
    /// Dominant font size in this line
    pub font_size: f32,
}

impl TextLine {
    /// Create a new text line from spans.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.total_cmp(&b.x));

        let total_chars: usize = spans.iter().map(|s| s.text.chars().count()).sum();
        let font_size = if total_chars > 0 {
            spans
                .iter()
                .map(|s| s.font_size * s.text.chars().count() as f32)
                .sum::<f32>()
                / total_chars as f32
        } else {
            spans.first().map(|s| s.font_size).unwrap_or(0.0)
        };

        let y = spans.first().map(|s| s.y).unwrap_or(0.0);
        let x = spans.first().map(|s| s.x).unwrap_or(0.0);

        Self {
            spans,
            y,
            x,
            font_size,
        }
    }

    /// Right edge of the line.
    pub fn right(&self) -> f32 {
        self.spans.iter().map(|s| s.right()).fold(self.x, f32::max)
    }

    /// Combined text of all spans with inferred word spacing.
    pub fn text(&self) -> String {
        let mut paragraph = Paragraph::new();
        append_spans(&mut paragraph, &self.spans);
        paragraph.plain_text()
    }
}

/// Append spans to a paragraph, inserting a space where the horizontal gap
/// between two spans reads as a word break.
pub fn append_spans(paragraph: &mut Paragraph, spans: &[TextSpan]) {
    for (i, span) in spans.iter().enumerate() {
        if i > 0 && needs_space(&spans[i - 1], span) {
            paragraph.add_run(TextRun::styled(" ", spans[i - 1].style()));
        }
        paragraph.add_run(span.to_run());
    }
}

fn needs_space(prev: &TextSpan, curr: &TextSpan) -> bool {
    if prev.text.ends_with(char::is_whitespace) || curr.text.starts_with(char::is_whitespace) {
        return false;
    }

    let gap = curr.x - prev.right();
    let char_count = curr.text.chars().count().max(1);
    let avg_char_width = curr.width / char_count as f32;
    if gap <= avg_char_width * 0.2 {
        return false;
    }

    let prev_spaceless = prev
        .text
        .chars()
        .last()
        .map(is_spaceless_script_char)
        .unwrap_or(false);
    let curr_spaceless = curr
        .text
        .chars()
        .next()
        .map(is_spaceless_script_char)
        .unwrap_or(false);
    !(prev_spaceless && curr_spaceless)
}

/// A paragraph produced by layout analysis, with its vertical position.
#[derive(Debug, Clone)]
pub struct PositionedParagraph {
    /// Baseline of the first line (PDF coordinates, larger is higher)
    pub top_y: f32,
    /// The paragraph
    pub paragraph: Paragraph,
}

/// Extracts text spans from page content streams.
pub struct LayoutAnalyzer<'a, B: PdfBackend> {
    backend: &'a B,
}

impl<'a, B: PdfBackend> LayoutAnalyzer<'a, B> {
    /// Create a new layout analyzer.
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Extract text spans from a page with position and font information.
    pub fn extract_page_spans(&self, page: PageId) -> Result<Vec<TextSpan>> {
        let fonts: HashMap<Vec<u8>, String> = self
            .backend
            .page_fonts(page)?
            .into_iter()
            .map(|f| (f.name, f.base_font))
            .collect();

        let content = self.backend.page_content(page)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }
        let ops = self.backend.decode_content(&content)?;
        Ok(self.spans_from_ops(page, &ops, &fonts))
    }

    /// Interpret content stream operations into positioned spans.
    pub fn spans_from_ops(
        &self,
        page: PageId,
        ops: &[ContentOp],
        fonts: &HashMap<Vec<u8>, String>,
    ) -> Vec<TextSpan> {
        let mut spans = Vec::new();
        let mut state = TextState::default();

        for op in ops {
            match op.operator.as_str() {
                "q" => state.ctm_stack.push(state.ctm),
                "Q" => {
                    if let Some(ctm) = state.ctm_stack.pop() {
                        state.ctm = ctm;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_operands(op) {
                        state.ctm = m.multiply(&state.ctm);
                    }
                }
                "BT" => {
                    state.in_text = true;
                    state.tm = Matrix::IDENTITY;
                    state.tlm = Matrix::IDENTITY;
                }
                "ET" => state.in_text = false,
                "Tf" => {
                    if let Some(PdfValue::Name(name)) = op.operands.first() {
                        state.font_base = fonts
                            .get(name)
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                        state.font_resource = name.clone();
                    }
                    state.font_size = op.number(1).unwrap_or(12.0);
                }
                "TL" => state.leading = op.number(0).unwrap_or(0.0),
                "Td" => state.move_line(op.number(0).unwrap_or(0.0), op.number(1).unwrap_or(0.0)),
                "TD" => {
                    let ty = op.number(1).unwrap_or(0.0);
                    state.leading = -ty;
                    state.move_line(op.number(0).unwrap_or(0.0), ty);
                }
                "Tm" => {
                    if let Some(m) = matrix_operands(op) {
                        state.tm = m;
                        state.tlm = m;
                    }
                }
                "T*" => state.next_line(),
                "Tj" => {
                    if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                        let text = self.backend.decode_text(page, &state.font_resource, bytes);
                        self.show_text(&mut state, text, 0.0, &mut spans);
                    }
                }
                "TJ" => {
                    if let Some(PdfValue::Array(items)) = op.operands.first() {
                        let (text, adjustment) = self.decode_tj(page, &state, items);
                        self.show_text(&mut state, text, adjustment, &mut spans);
                    }
                }
                "'" | "\"" => {
                    state.next_line();
                    let idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(PdfValue::Str(bytes)) = op.operands.get(idx) {
                        let text = self.backend.decode_text(page, &state.font_resource, bytes);
                        self.show_text(&mut state, text, 0.0, &mut spans);
                    }
                }
                _ => {}
            }
        }

        spans
    }

    /// Decode a TJ array, turning large negative kerning into spaces.
    ///
    /// Returns the text and the summed positioning adjustment in text space.
    fn decode_tj(&self, page: PageId, state: &TextState, items: &[PdfValue]) -> (String, f32) {
        let mut combined = String::new();
        let mut adjustment = 0.0;

        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    combined.push_str(&self.backend.decode_text(page, &state.font_resource, bytes));
                }
                PdfValue::Integer(_) | PdfValue::Real(_) => {
                    let n = super::backend::get_number_from_value(item).unwrap_or(0.0);
                    adjustment -= n / 1000.0 * state.font_size;
                    if -n > TJ_SPACE_THRESHOLD
                        && !combined.is_empty()
                        && !combined.ends_with(char::is_whitespace)
                        && !combined
                            .chars()
                            .last()
                            .map(is_spaceless_script_char)
                            .unwrap_or(false)
                    {
                        combined.push(' ');
                    }
                }
                _ => {}
            }
        }

        (combined, adjustment)
    }

    fn show_text(&self, state: &mut TextState, text: String, adjustment: f32, spans: &mut Vec<TextSpan>) {
        if !state.in_text {
            return;
        }

        let text: String = text.nfc().collect();
        let advance = estimate_width(&text, state.font_size) + adjustment;

        if !text.trim().is_empty() {
            let rendering = state.tm.multiply(&state.ctm);
            let effective_size = state.font_size * rendering.vertical_scale();
            spans.push(TextSpan::new(
                text,
                rendering.e,
                rendering.f,
                effective_size,
                &state.font_base,
            ));
        }

        state.tm = Matrix::translation(advance, 0.0).multiply(&state.tm);
    }
}

/// Graphics and text state tracked while walking a content stream.
#[derive(Debug, Clone)]
struct TextState {
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    in_text: bool,
    font_resource: Vec<u8>,
    font_base: String,
    font_size: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            in_text: false,
            font_resource: Vec::new(),
            font_base: String::new(),
            font_size: 12.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }
}

/// A 2D affine transform in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

fn matrix_operands(op: &ContentOp) -> Option<Matrix> {
    Some(Matrix {
        a: op.number(0)?,
        b: op.number(1)?,
        c: op.number(2)?,
        d: op.number(3)?,
        e: op.number(4)?,
        f: op.number(5)?,
    })
}

/// Group spans into lines by baseline, top to bottom.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let y_tolerance = span.font_size * 0.3;
        match current_y {
            Some(y) if (span.y - y).abs() <= y_tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }

    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }

    lines
}

/// Group lines into paragraphs.
///
/// `page_width` is used to recognise centred lines and to express
/// indentation relative to the document margin.
pub fn group_lines_into_paragraphs(
    lines: Vec<TextLine>,
    page_width: f32,
    preserve_line_breaks: bool,
) -> Vec<PositionedParagraph> {
    if lines.is_empty() {
        return Vec::new();
    }

    let avg_spacing = average_line_spacing(&lines);
    let mut groups: Vec<Vec<TextLine>> = Vec::new();

    for line in lines {
        let breaks = match groups.last().and_then(|g| g.last()) {
            Some(prev) => should_break_paragraph(prev, &line, avg_spacing),
            None => true,
        };
        if breaks {
            groups.push(vec![line]);
        } else if let Some(group) = groups.last_mut() {
            group.push(line);
        }
    }

    let mut paragraphs = Vec::with_capacity(groups.len());
    let mut prev_bottom: Option<(f32, f32)> = None;

    for group in groups {
        let first = &group[0];
        let top_y = first.y;
        let mut paragraph = Paragraph::new();

        for (i, line) in group.iter().enumerate() {
            if i > 0 {
                if preserve_line_breaks {
                    paragraph.add_line_break();
                } else if let Some(last) = group[i - 1].spans.last() {
                    paragraph.add_run(TextRun::styled(" ", last.style()));
                }
            }
            append_spans(&mut paragraph, &line.spans);
        }

        let indent = first.x - PAGE_MARGIN;
        if indent > 1.0 {
            paragraph.style.indent_left = Some(indent.round());
        }
        if group.len() == 1 && is_centered(first, page_width) {
            paragraph.style.alignment = Alignment::Center;
            paragraph.style.indent_left = None;
        }
        if let Some((bottom_y, size)) = prev_bottom {
            let extra = (bottom_y - top_y) - size * 1.2;
            if extra > 2.0 {
                paragraph.style.space_before = Some(extra.round());
            }
        }

        if let Some(last) = group.last() {
            prev_bottom = Some((last.y, last.font_size));
        }
        paragraphs.push(PositionedParagraph { top_y, paragraph });
    }

    paragraphs
}

fn average_line_spacing(lines: &[TextLine]) -> f32 {
    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (w[0].y - w[1].y).abs())
        .filter(|s| *s > 0.1)
        .collect();

    if spacings.is_empty() {
        return 12.0;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

fn should_break_paragraph(prev: &TextLine, curr: &TextLine, avg_spacing: f32) -> bool {
    let spacing = (prev.y - curr.y).abs();
    if spacing > avg_spacing * 1.5 || spacing > prev.font_size * 2.0 {
        return true;
    }

    if (prev.font_size - curr.font_size).abs() > 1.0 {
        return true;
    }

    (prev.x - curr.x).abs() > 20.0
}

fn is_centered(line: &TextLine, page_width: f32) -> bool {
    let left_gap = line.x;
    let right_gap = page_width - line.right();
    left_gap > PAGE_MARGIN * 1.5 && (left_gap - right_gap).abs() < page_width * 0.03
}

/// Estimate the advance width of `text` at `font_size`.
pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVG_CHAR_WIDTH
}

/// Round a font size to the nearest half point (the DOCX size unit).
pub fn round_half_point(size: f32) -> f32 {
    (size * 2.0).round() / 2.0
}

/// Turn a PDF base font name into a family name a word processor knows.
///
/// `ABCDEF+TimesNewRomanPS-BoldMT` → `Times New Roman`,
/// `Arial,Italic` → `Arial`, `ComicSansMS` → `Comic Sans MS`.
pub fn font_family(base_font: &str) -> String {
    static SUBSET: OnceLock<Regex> = OnceLock::new();
    static VENDOR: OnceLock<Regex> = OnceLock::new();
    static CAMEL: OnceLock<Regex> = OnceLock::new();

    let subset = SUBSET.get_or_init(|| Regex::new(r"^[A-Z]{6}\+").expect("valid regex"));
    let vendor = VENDOR.get_or_init(|| Regex::new(r"(PSMT|PS|MT)$").expect("valid regex"));
    let camel = CAMEL.get_or_init(|| Regex::new(r"([a-z])([A-Z])").expect("valid regex"));

    let name = subset.replace(base_font.trim(), "");
    let family = name.split(['-', ',']).next().unwrap_or_default();
    let family = vendor.replace(family, "");
    camel.replace_all(&family, "$1 $2").trim().to_string()
}

/// Check if character is from a script that doesn't use word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::model::InlineContent;
    use crate::parser::backend::BackendFontInfo;
    use std::collections::BTreeMap;

    /// Backend whose text decoding is plain UTF-8; only `decode_text` is exercised.
    struct Utf8Backend;

    impl PdfBackend for Utf8Backend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::new()
        }
        fn page_size(&self, _page: PageId) -> (f32, f32) {
            (612.0, 792.0)
        }
        fn page_fonts(&self, _page: PageId) -> Result<Vec<BackendFontInfo>> {
            Ok(Vec::new())
        }
        fn page_content(&self, _page: PageId) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn decode_content(&self, _data: &[u8]) -> Result<Vec<ContentOp>> {
            Ok(Vec::new())
        }
        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            String::from_utf8_lossy(bytes).to_string()
        }
        fn info_entry(&self, _key: &[u8]) -> Option<String> {
            None
        }
        fn version(&self) -> String {
            "1.7".to_string()
        }
        fn is_encrypted(&self) -> bool {
            false
        }
    }

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp::new(operator, operands)
    }

    fn num(n: i64) -> PdfValue {
        PdfValue::Integer(n)
    }

    fn text(s: &str) -> PdfValue {
        PdfValue::Str(s.as_bytes().to_vec())
    }

    fn fonts() -> HashMap<Vec<u8>, String> {
        let mut fonts = HashMap::new();
        fonts.insert(b"F1".to_vec(), "ABCDEF+Helvetica".to_string());
        fonts.insert(b"F2".to_vec(), "Helvetica-Bold".to_string());
        fonts
    }

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text.to_string(), x, y, 12.0, "Helvetica")
    }

    #[test]
    fn test_font_family_cleanup() {
        assert_eq!(font_family("ABCDEF+TimesNewRomanPS-BoldMT"), "Times New Roman");
        assert_eq!(font_family("Arial,Italic"), "Arial");
        assert_eq!(font_family("ArialMT"), "Arial");
        assert_eq!(font_family("ComicSansMS"), "Comic Sans MS");
        assert_eq!(font_family("Helvetica-Bold"), "Helvetica");
        assert_eq!(font_family("Calibri"), "Calibri");
    }

    #[test]
    fn test_text_span_style_detection() {
        let bold = TextSpan::new("x".into(), 0.0, 0.0, 12.0, "Helvetica-Bold");
        assert!(bold.is_bold);
        assert!(!bold.is_italic);

        let italic = TextSpan::new("x".into(), 0.0, 0.0, 12.0, "Times-Oblique");
        assert!(italic.is_italic);
        assert_eq!(italic.font_name, "Times");
    }

    #[test]
    fn test_spans_from_ops_positions() {
        let backend = Utf8Backend;
        let analyzer = LayoutAnalyzer::new(&backend);
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), num(12)]),
            op("Td", vec![num(72), num(700)]),
            op("Tj", vec![text("Hello")]),
            op("Tf", vec![PdfValue::Name(b"F2".to_vec()), num(12)]),
            op("Tj", vec![text("World")]),
            op("TL", vec![num(14)]),
            op("T*", vec![]),
            op("Tj", vec![text("Next line")]),
            op("ET", vec![]),
        ];

        let spans = analyzer.spans_from_ops((1, 0), &ops, &fonts());
        assert_eq!(spans.len(), 3);

        assert_eq!(spans[0].text, "Hello");
        assert_eq!((spans[0].x, spans[0].y), (72.0, 700.0));
        assert_eq!(spans[0].font_name, "Helvetica");
        assert!(!spans[0].is_bold);

        // The second Tj starts after the estimated advance of "Hello".
        assert_eq!(spans[1].x, 72.0 + 5.0 * 6.0);
        assert!(spans[1].is_bold);

        assert_eq!(spans[2].y, 686.0);
        assert_eq!(spans[2].x, 72.0);
    }

    #[test]
    fn test_spans_outside_text_object_ignored() {
        let backend = Utf8Backend;
        let analyzer = LayoutAnalyzer::new(&backend);
        let ops = vec![op("Tj", vec![text("stray")])];
        assert!(analyzer.spans_from_ops((1, 0), &ops, &fonts()).is_empty());
    }

    #[test]
    fn test_tj_kerning_inserts_space() {
        let backend = Utf8Backend;
        let analyzer = LayoutAnalyzer::new(&backend);
        let ops = vec![
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), num(10)]),
            op("Tm", vec![num(1), num(0), num(0), num(1), num(100), num(500)]),
            op(
                "TJ",
                vec![PdfValue::Array(vec![text("Cursive"), num(-250), text("writing")])],
            ),
            op("ET", vec![]),
        ];
        let spans = analyzer.spans_from_ops((1, 0), &ops, &fonts());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Cursive writing");
        assert_eq!((spans[0].x, spans[0].y), (100.0, 500.0));
    }

    #[test]
    fn test_cm_scales_font_size() {
        let backend = Utf8Backend;
        let analyzer = LayoutAnalyzer::new(&backend);
        let ops = vec![
            op("q", vec![]),
            op("cm", vec![num(2), num(0), num(0), num(2), num(10), num(20)]),
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), num(9)]),
            op("Td", vec![num(5), num(5)]),
            op("Tj", vec![text("Scaled")]),
            op("ET", vec![]),
            op("Q", vec![]),
        ];
        let spans = analyzer.spans_from_ops((1, 0), &ops, &fonts());
        assert_eq!(spans[0].font_size, 18.0);
        assert_eq!((spans[0].x, spans[0].y), (20.0, 30.0));
    }

    #[test]
    fn test_group_spans_into_lines() {
        let spans = vec![
            span("second", 72.0, 680.0),
            span("world", 110.0, 700.5),
            span("hello", 72.0, 700.0),
        ];
        let lines = group_spans_into_lines(spans);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "hello world");
        assert_eq!(lines[1].text(), "second");
    }

    #[test]
    fn test_paragraph_grouping_and_breaks() {
        let lines = group_spans_into_lines(vec![
            span("First line", 72.0, 700.0),
            span("continues here", 72.0, 686.0),
            span("New paragraph", 72.0, 640.0),
        ]);
        let paragraphs = group_lines_into_paragraphs(lines, 612.0, true);
        assert_eq!(paragraphs.len(), 2);

        let first = &paragraphs[0].paragraph;
        assert_eq!(first.plain_text(), "First line\ncontinues here");
        assert!(first.content.contains(&InlineContent::LineBreak));
        assert!(paragraphs[1].paragraph.style.space_before.is_some());
        assert!(paragraphs[0].top_y > paragraphs[1].top_y);
    }

    #[test]
    fn test_paragraph_reflow() {
        let lines = group_spans_into_lines(vec![
            span("First line", 72.0, 700.0),
            span("continues here", 72.0, 686.0),
        ]);
        let paragraphs = group_lines_into_paragraphs(lines, 612.0, false);
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].paragraph.plain_text(), "First line continues here");
    }

    #[test]
    fn test_indent_and_center() {
        let lines = group_spans_into_lines(vec![
            span("Indented", 108.0, 700.0),
            span("Title", 291.0, 750.0),
        ]);
        let paragraphs = group_lines_into_paragraphs(lines, 612.0, true);
        assert_eq!(paragraphs[0].paragraph.style.alignment, Alignment::Center);
        assert_eq!(paragraphs[1].paragraph.style.indent_left, Some(36.0));
    }

    #[test]
    fn test_run_carries_font() {
        let run = TextSpan::new("Hi".into(), 0.0, 0.0, 11.3, "ArialMT").to_run();
        assert_eq!(run.style.font_name.as_deref(), Some("Arial"));
        assert_eq!(run.style.font_size, Some(11.5));
    }
}
