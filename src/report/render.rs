//! Report renderer — paginates the formatted assessment into a printable
//! A4 document.
//!
//! Rendering is two stages. `layout()` is a pure function from content
//! blocks to positioned text runs on numbered pages — a throwaway
//! construction target with no shared state, so pagination rules are
//! testable without decoding PDF bytes. The second stage emits the runs
//! through `printpdf` with builtin Helvetica fonts.

use std::io::BufWriter;

use chrono::{DateTime, FixedOffset, Utc};
use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::format::{format_analysis, ContentBlock, Span};
use super::RenderError;
use crate::analysis::AnalysisOutcome;

/// Deterministic artifact name for downloads.
pub const REPORT_FILENAME: &str = "wound-care-recommendations.pdf";

// A4 portrait with a 20 mm margin band.
const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
const BULLET_INDENT_MM: f32 = 5.0;

const TITLE_PT: f32 = 16.0;
const SUBTITLE_PT: f32 = 11.0;
const STAMP_PT: f32 = 9.0;
const HEADING_PT: f32 = 12.0;
const BODY_PT: f32 = 10.0;
const DISCLAIMER_PT: f32 = 8.0;

const HEADING_STEP_MM: f32 = 6.0;
const BODY_STEP_MM: f32 = 5.0;
const DISCLAIMER_STEP_MM: f32 = 4.0;

/// Report timezone — fixed to AEST so the stamp is stable regardless of
/// where the process runs.
fn report_offset() -> FixedOffset {
    FixedOffset::east_opt(10 * 3600).expect("valid fixed offset")
}

/// Injected time source; lets tests pin the generated-at stamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&report_offset())
    }
}

/// Clock returning a constant instant.
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Fixed header and footer strings for the report.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub title: String,
    pub subtitle: String,
    pub disclaimer: String,
}

impl Default for ReportMeta {
    fn default() -> Self {
        Self {
            title: "Wound Care Recommendations".into(),
            subtitle: "AI-assisted analysis against validated clinical guidelines".into(),
            disclaimer: "This report is for limited educational and experimental purposes \
                         only. It is not a diagnosis. A qualified healthcare professional \
                         must assess the wound in person before any treatment decision."
                .into(),
        }
    }
}

// ─── Pure layout ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FontStyle {
    Regular,
    Bold,
}

/// One positioned piece of text on a page.
#[derive(Debug, Clone, PartialEq)]
struct TextRun {
    x_mm: f32,
    y_mm: f32,
    size_pt: f32,
    style: FontStyle,
    text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct PageLayout {
    runs: Vec<TextRun>,
}

/// Approximate advance width of one Helvetica character, in mm.
///
/// Builtin fonts carry no metrics in `printpdf`; half an em is the usual
/// average for Helvetica text and is consistent with character-count
/// wrapping throughout.
fn char_width_mm(size_pt: f32) -> f32 {
    size_pt * 0.3528 * 0.5
}

fn max_chars(size_pt: f32, width_mm: f32) -> usize {
    (width_mm / char_width_mm(size_pt)).max(1.0) as usize
}

/// A styled fragment of one wrapped line.
#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    strong: bool,
    text: String,
}

/// Greedy word-wrap over styled spans. Every returned line is a list of
/// fragments; an empty input yields a single empty line.
fn wrap_spans(spans: &[Span], limit: usize) -> Vec<Vec<Fragment>> {
    let mut lines: Vec<Vec<Fragment>> = Vec::new();
    let mut line: Vec<Fragment> = Vec::new();
    let mut line_len = 0usize;

    for span in spans {
        let strong = matches!(span, Span::Strong(_));
        for word in span.text().split_whitespace() {
            // Width accounting is per character, not per byte.
            let word_len = word.chars().count();
            if line_len + word_len + 1 > limit && line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            match line.last_mut() {
                Some(last) if last.strong == strong => {
                    last.text.push(' ');
                    line_len += 1;
                    last.text.push_str(word);
                }
                // Style boundary: the separating space always sticks to the
                // plain side so strong runs stay exactly the emphasized text.
                Some(last) => {
                    if strong {
                        last.text.push(' ');
                        line.push(Fragment {
                            strong,
                            text: word.to_string(),
                        });
                    } else {
                        line.push(Fragment {
                            strong,
                            text: format!(" {word}"),
                        });
                    }
                    line_len += 1;
                }
                None => line.push(Fragment {
                    strong,
                    text: word.to_string(),
                }),
            }
            line_len += word_len;
        }
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Cursor walking pages top to bottom.
struct LayoutCursor {
    pages: Vec<PageLayout>,
    y_mm: f32,
}

impl LayoutCursor {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y_mm: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn remaining(&self) -> f32 {
        self.y_mm - MARGIN_MM
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y_mm = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    /// Ensure at least `height_mm` fits on the current page.
    fn reserve(&mut self, height_mm: f32) {
        if self.remaining() < height_mm {
            self.new_page();
        }
    }

    fn advance(&mut self, height_mm: f32) {
        self.y_mm -= height_mm;
    }

    /// Emit one wrapped line of fragments starting at `x_mm`, breaking to a
    /// new page first if the line does not fit.
    fn emit_line(
        &mut self,
        fragments: &[Fragment],
        x_mm: f32,
        size_pt: f32,
        step_mm: f32,
        base_style: FontStyle,
    ) {
        self.reserve(step_mm);
        let mut x = x_mm;
        let page = self.pages.last_mut().expect("cursor always has a page");
        for fragment in fragments {
            if fragment.text.is_empty() {
                continue;
            }
            let style = if fragment.strong {
                FontStyle::Bold
            } else {
                base_style
            };
            page.runs.push(TextRun {
                x_mm: x,
                y_mm: self.y_mm,
                size_pt,
                style,
                text: fragment.text.clone(),
            });
            x += fragment.text.chars().count() as f32 * char_width_mm(size_pt);
        }
        self.advance(step_mm);
    }

    fn emit_plain(&mut self, text: &str, size_pt: f32, step_mm: f32, style: FontStyle) {
        let spans = [Span::Plain(text.to_string())];
        for line in wrap_spans(&spans, max_chars(size_pt, CONTENT_WIDTH_MM)) {
            self.emit_line(&line, MARGIN_MM, size_pt, step_mm, style);
        }
    }
}

/// Lay out the full report. Pure — same input, same pages.
fn layout(blocks: &[ContentBlock], meta: &ReportMeta, generated_at: &str) -> Vec<PageLayout> {
    let mut cursor = LayoutCursor::new();

    cursor.emit_plain(&meta.title, TITLE_PT, 9.0, FontStyle::Bold);
    cursor.emit_plain(&meta.subtitle, SUBTITLE_PT, 6.0, FontStyle::Regular);
    cursor.emit_plain(generated_at, STAMP_PT, 5.0, FontStyle::Regular);
    cursor.advance(4.0);

    for block in blocks {
        match block {
            ContentBlock::Heading(spans) => {
                let lines = wrap_spans(spans, max_chars(HEADING_PT, CONTENT_WIDTH_MM));
                // A heading never splits across a page boundary — if its
                // lines do not all fit, the whole block moves on.
                cursor.reserve(3.0 + lines.len() as f32 * HEADING_STEP_MM);
                cursor.advance(3.0);
                for line in lines {
                    cursor.emit_line(&line, MARGIN_MM, HEADING_PT, HEADING_STEP_MM, FontStyle::Bold);
                }
            }
            ContentBlock::BulletItem(spans) => {
                let indent = MARGIN_MM + BULLET_INDENT_MM;
                let limit = max_chars(BODY_PT, CONTENT_WIDTH_MM - BULLET_INDENT_MM - 4.0);
                for (i, mut line) in wrap_spans(spans, limit).into_iter().enumerate() {
                    if i == 0 {
                        line.insert(
                            0,
                            Fragment {
                                strong: false,
                                text: "· ".into(),
                            },
                        );
                    }
                    let x = if i == 0 { indent } else { indent + 2.0 * char_width_mm(BODY_PT) };
                    cursor.emit_line(&line, x, BODY_PT, BODY_STEP_MM, FontStyle::Regular);
                }
            }
            ContentBlock::Paragraph(spans) => {
                if block.plain_text().is_empty() {
                    // Blank paragraph: vertical spacing only.
                    cursor.reserve(BODY_STEP_MM);
                    cursor.advance(BODY_STEP_MM);
                    continue;
                }
                for line in wrap_spans(spans, max_chars(BODY_PT, CONTENT_WIDTH_MM)) {
                    cursor.emit_line(&line, MARGIN_MM, BODY_PT, BODY_STEP_MM, FontStyle::Regular);
                }
            }
        }
    }

    cursor.advance(6.0);
    cursor.emit_plain(&meta.disclaimer, DISCLAIMER_PT, DISCLAIMER_STEP_MM, FontStyle::Regular);

    cursor.pages
}

// ─── PDF emission ─────────────────────────────────────────────────────────────

fn format_stamp(now: DateTime<FixedOffset>) -> String {
    now.format("Generated: %d %B %Y, %H:%M AEST").to_string()
}

/// Render the current outcome into PDF bytes.
///
/// Fails with `NoContent` unless the outcome is a success — an empty report
/// must never be produced silently. The only side effect is the returned
/// buffer; callers persisting it name the artifact [`REPORT_FILENAME`].
pub fn render(
    outcome: &AnalysisOutcome,
    meta: &ReportMeta,
    clock: &dyn Clock,
) -> Result<Vec<u8>, RenderError> {
    let AnalysisOutcome::Success { raw_text } = outcome else {
        return Err(RenderError::NoContent);
    };

    let blocks = format_analysis(raw_text);
    let stamp = format_stamp(clock.now());
    let pages = layout(&blocks, meta, &stamp);

    let (doc, first_page, first_layer) = PdfDocument::new(
        &meta.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Pdf(format!("font error: {e}")))?;

    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(page_idx).get_layer(layer_idx)
        };
        for run in &page.runs {
            let font = match run.style {
                FontStyle::Regular => &regular,
                FontStyle::Bold => &bold,
            };
            layer.use_text(&run.text, run.size_pt, Mm(run.x_mm), Mm(run.y_mm), font);
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| RenderError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| RenderError::Pdf(format!("buffer error: {e}")))
}
