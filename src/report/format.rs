//! Response formatter — normalizes the model's lightweight-markup output
//! into an ordered sequence of content blocks.
//!
//! Two passes, deliberately separate: pass one is a line state machine that
//! decides the block kind (heading / bullet / paragraph), pass two resolves
//! inline `**bold**` emphasis within each block's text. Keeping the passes
//! independent means an emphasis marker can never change how a line is
//! segmented.

/// An inline run of text within a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Plain(String),
    Strong(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Strong(text) => text,
        }
    }
}

/// A normalized unit of model output. Order is the only relationship between
/// blocks — there is no nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Heading(Vec<Span>),
    Paragraph(Vec<Span>),
    BulletItem(Vec<Span>),
}

impl ContentBlock {
    /// The block's text with emphasis markers resolved away.
    pub fn plain_text(&self) -> String {
        self.spans().iter().map(Span::text).collect()
    }

    pub fn spans(&self) -> &[Span] {
        match self {
            Self::Heading(spans) | Self::Paragraph(spans) | Self::BulletItem(spans) => spans,
        }
    }
}

/// Heading marker recognized at the start of a line.
const HEADING_MARKER: &str = "### ";

/// Convert raw model output into content blocks.
///
/// Every input line maps to exactly one block; blank lines become empty
/// paragraphs rather than being dropped, so the block count always equals
/// the line count (a round-trip property the tests rely on).
pub fn format_analysis(raw_text: &str) -> Vec<ContentBlock> {
    raw_text.split('\n').map(classify_line).collect()
}

/// Pass one: decide the block kind for a single line.
fn classify_line(line: &str) -> ContentBlock {
    if let Some(rest) = line.strip_prefix(HEADING_MARKER) {
        return ContentBlock::Heading(parse_spans(rest));
    }

    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix('-') {
        return ContentBlock::BulletItem(parse_spans(rest.trim()));
    }

    ContentBlock::Paragraph(parse_spans(line))
}

/// Pass two: resolve `**text**` pairs into `Strong` spans.
///
/// An unmatched `**` stays literal. Single `*` markers are not emphasis and
/// pass through untouched.
fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        match rest[open + 2..].find("**") {
            Some(close) => {
                if open > 0 {
                    spans.push(Span::Plain(rest[..open].to_string()));
                }
                spans.push(Span::Strong(rest[open + 2..open + 2 + close].to_string()));
                rest = &rest[open + 2 + close + 2..];
            }
            None => break,
        }
    }

    if !rest.is_empty() || spans.is_empty() {
        spans.push(Span::Plain(rest.to_string()));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Vec<Span> {
        vec![Span::Plain(text.to_string())]
    }

    #[test]
    fn heading_line() {
        let blocks = format_analysis("### Assessment");
        assert_eq!(blocks, vec![ContentBlock::Heading(plain("Assessment"))]);
    }

    #[test]
    fn bullet_line_trims_after_marker() {
        let blocks = format_analysis("-   clean wound  ");
        assert_eq!(blocks, vec![ContentBlock::BulletItem(plain("clean wound"))]);
    }

    #[test]
    fn indented_bullet_is_recognized() {
        let blocks = format_analysis("  - apply dressing");
        assert_eq!(
            blocks,
            vec![ContentBlock::BulletItem(plain("apply dressing"))]
        );
    }

    #[test]
    fn plain_line_is_paragraph() {
        let blocks = format_analysis("Monitor daily.");
        assert_eq!(blocks, vec![ContentBlock::Paragraph(plain("Monitor daily."))]);
    }

    #[test]
    fn blank_lines_preserved_as_empty_paragraphs() {
        let blocks = format_analysis("a\n\n\nb");
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[1], ContentBlock::Paragraph(plain("")));
        assert_eq!(blocks[2], ContentBlock::Paragraph(plain("")));
    }

    #[test]
    fn block_count_equals_line_count() {
        let raw = "### H\n- one\n\ntext\n- two\n";
        assert_eq!(format_analysis(raw).len(), raw.split('\n').count());
    }

    #[test]
    fn four_hashes_is_not_a_heading() {
        let blocks = format_analysis("#### deeper");
        assert!(matches!(blocks[0], ContentBlock::Paragraph(_)));
    }

    #[test]
    fn emphasis_within_paragraph() {
        let blocks = format_analysis("watch for **infection** closely");
        assert_eq!(
            blocks[0],
            ContentBlock::Paragraph(vec![
                Span::Plain("watch for ".into()),
                Span::Strong("infection".into()),
                Span::Plain(" closely".into()),
            ])
        );
    }

    #[test]
    fn emphasis_within_heading_and_bullet() {
        let blocks = format_analysis("### **Urgent** findings\n- **redness** at edges");
        assert_eq!(
            blocks[0],
            ContentBlock::Heading(vec![
                Span::Strong("Urgent".into()),
                Span::Plain(" findings".into()),
            ])
        );
        assert_eq!(
            blocks[1],
            ContentBlock::BulletItem(vec![
                Span::Strong("redness".into()),
                Span::Plain(" at edges".into()),
            ])
        );
    }

    #[test]
    fn whole_line_emphasis() {
        let blocks = format_analysis("**note**");
        assert_eq!(
            blocks[0],
            ContentBlock::Paragraph(vec![Span::Strong("note".into())])
        );
    }

    #[test]
    fn unmatched_marker_stays_literal() {
        let blocks = format_analysis("a ** b");
        assert_eq!(blocks[0], ContentBlock::Paragraph(plain("a ** b")));
    }

    #[test]
    fn single_asterisk_is_not_emphasis() {
        let blocks = format_analysis("2 * 3 = 6");
        assert_eq!(blocks[0], ContentBlock::Paragraph(plain("2 * 3 = 6")));
    }

    #[test]
    fn formatting_is_deterministic() {
        let raw = "### A\n- b **c**\ntext";
        assert_eq!(format_analysis(raw), format_analysis(raw));
    }

    #[test]
    fn spec_scenario_blocks() {
        let blocks = format_analysis("### Assessment\n- clean wound\n**note**");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], ContentBlock::Heading(plain("Assessment")));
        assert_eq!(blocks[1], ContentBlock::BulletItem(plain("clean wound")));
        assert_eq!(
            blocks[2],
            ContentBlock::Paragraph(vec![Span::Strong("note".into())])
        );
    }

    // ── Round-trip ──

    /// Trivial de-formatter reversing the block tagging.
    fn to_line(block: &ContentBlock) -> String {
        match block {
            ContentBlock::Heading(_) => format!("### {}", block.plain_text()),
            ContentBlock::BulletItem(_) => format!("- {}", block.plain_text()),
            ContentBlock::Paragraph(_) => block.plain_text(),
        }
    }

    #[test]
    fn round_trip_without_emphasis_markers() {
        let raw = "### Assessment\n- clean wound edges\n- no exudate\n\nMonitor daily.\n### Plan\nRedress in 48 hours.";
        let lines: Vec<String> = format_analysis(raw).iter().map(to_line).collect();
        assert_eq!(lines.join("\n"), raw);
    }
}
