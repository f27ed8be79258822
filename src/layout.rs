//! Greedy line wrapping and fixed-canvas vertical placement.
//!
//! Everything here is pure: wrapping depends only on the text, the zone's
//! font and the caller-supplied measurement closure, so preview and export
//! contexts produce identical line sequences from identical inputs.

use crate::{
    error::ColorblockResult,
    render::{FontSpec, FontWeight},
    spec::{RenderSpec, TextAlign, Zone},
};

/// Cards are square by external contract (the target ad platform requires
/// 1080x1080); this must never become configurable.
pub const CANVAS_SIZE: u32 = 1080;

/// Horizontal padding reserved on both margins for all text zones.
pub const H_PADDING: f64 = 80.0;

/// Usable text width: `1080 - 2 * 80`.
pub const TEXT_MAX_WIDTH: f64 = CANVAS_SIZE as f64 - 2.0 * H_PADDING;

/// Fixed line-height multiplier for all zones.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Vertical gap between stacked zones.
pub const ZONE_GAP: f64 = 40.0;

/// Distance from the canvas bottom to the footer block.
pub const FOOTER_BOTTOM_MARGIN: f64 = 60.0;

/// Top anchor for the first stacked zone when all three zones are present.
pub const THREE_ZONE_TOP: f64 = 300.0;

/// Top anchor for the first stacked zone when one or two zones are present.
pub const TWO_ZONE_TOP: f64 = 400.0;

/// Shared anchor X for a given alignment, identical for every line in every
/// zone: left 80, center 540, right 1000.
pub fn anchor_x(align: TextAlign) -> f64 {
    match align {
        TextAlign::Left => H_PADDING,
        TextAlign::Center => CANVAS_SIZE as f64 / 2.0,
        TextAlign::Right => CANVAS_SIZE as f64 - H_PADDING,
    }
}

/// Greedily wrap `text` into lines no wider than `max_width_px`.
///
/// Manual breaks (`\n` / `\r\n`) are hard breaks; a blank or whitespace-only
/// manual line is preserved as one empty output line. Words are never broken
/// at character level: a single word wider than `max_width_px` is emitted
/// alone on its own line. Empty input yields an empty sequence.
pub fn wrap_text<M>(text: &str, max_width_px: f64, mut measure: M) -> ColorblockResult<Vec<String>>
where
    M: FnMut(&str) -> ColorblockResult<f64>,
{
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);

        if paragraph.trim().is_empty() {
            // Preserve the author's blank line without word-wrapping it.
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if measure(&candidate)? > max_width_px && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    Ok(lines)
}

/// One present zone with its wrapped lines and resolved vertical position.
#[derive(Clone, Debug)]
pub struct PlacedZone {
    pub zone: Zone,
    pub lines: Vec<String>,
    pub font: FontSpec,
    /// Baseline Y of the zone's first line.
    pub start_y: f64,
}

impl PlacedZone {
    pub fn line_height(&self) -> f64 {
        f64::from(self.font.size_px) * LINE_HEIGHT_FACTOR
    }

    pub fn block_height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height()
    }

    /// Baseline Y of line `i` within the zone.
    pub fn baseline_y(&self, i: usize) -> f64 {
        self.start_y + i as f64 * self.line_height()
    }
}

/// Complete text layout for one card: present zones in paint order
/// (heading, statement, footer) plus the shared horizontal anchor.
#[derive(Clone, Debug)]
pub struct CardLayout {
    pub zones: Vec<PlacedZone>,
    pub alignment: TextAlign,
    pub anchor_x: f64,
}

impl CardLayout {
    pub fn zone(&self, zone: Zone) -> Option<&PlacedZone> {
        self.zones.iter().find(|z| z.zone == zone)
    }
}

/// Wrap every present zone and resolve vertical placement on the canvas.
///
/// Placement rules:
/// - statement as the sole zone is vertically centered
///   (`(canvas - block)/2 + one line height`);
/// - otherwise zones stack top-down from 300 (three zones) or 400 (one or
///   two), advancing `block + 40` per placed zone;
/// - the footer, whenever present, is anchored to the canvas bottom
///   instead of the stacked cursor.
///
/// A sole heading deliberately does not get the centering treatment the
/// sole statement gets; that asymmetry is long-standing production
/// behavior, not an oversight.
pub fn layout_card<M>(spec: &RenderSpec, mut measure: M) -> ColorblockResult<CardLayout>
where
    M: FnMut(&str, &FontSpec) -> ColorblockResult<f64>,
{
    let mut zones = Vec::new();
    for zone in [Zone::Heading, Zone::Statement, Zone::Footer] {
        if !spec.zone_present(zone) {
            continue;
        }
        let font = FontSpec {
            size_px: spec.zone_font_size_px(zone),
            weight: if zone == Zone::Heading {
                FontWeight::Bold
            } else {
                FontWeight::Regular
            },
        };
        let lines = wrap_text(spec.zone_text(zone), TEXT_MAX_WIDTH, |s| measure(s, &font))?;
        zones.push(PlacedZone {
            zone,
            lines,
            font,
            start_y: 0.0,
        });
    }

    place_zones(&mut zones);

    Ok(CardLayout {
        zones,
        alignment: spec.text_alignment,
        anchor_x: anchor_x(spec.text_alignment),
    })
}

fn place_zones(zones: &mut [PlacedZone]) {
    let canvas = f64::from(CANVAS_SIZE);

    if let [sole] = zones
        && sole.zone == Zone::Statement
    {
        sole.start_y = (canvas - sole.block_height()) / 2.0 + sole.line_height();
        return;
    }

    let mut cursor = if zones.len() == 3 {
        THREE_ZONE_TOP
    } else {
        TWO_ZONE_TOP
    };
    for z in zones.iter_mut() {
        if z.zone == Zone::Footer {
            z.start_y = canvas - z.block_height() - FOOTER_BOTTOM_MARGIN;
        } else {
            z.start_y = cursor;
            cursor += z.block_height() + ZONE_GAP;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;

    // 10px per char keeps expected wrap points easy to reason about.
    fn char_width(s: &str) -> ColorblockResult<f64> {
        Ok(s.chars().count() as f64 * 10.0)
    }

    fn char_measure(s: &str, _font: &FontSpec) -> ColorblockResult<f64> {
        char_width(s)
    }

    #[test]
    fn wrap_is_deterministic() {
        let text = "the quick brown fox jumps over the lazy dog";
        let a = wrap_text(text, 120.0, char_width).unwrap();
        let b = wrap_text(text, 120.0, char_width).unwrap();
        assert_eq!(a, b);
        assert!(a.len() > 1);
    }

    #[test]
    fn wrapped_lines_respect_width_unless_single_word() {
        let text = "tiny incomprehensibilities word";
        let lines = wrap_text(text, 100.0, char_width).unwrap();
        for line in &lines {
            let fits = char_width(line).unwrap() <= 100.0;
            let single_word = !line.contains(' ');
            assert!(fits || single_word, "line {line:?} breaks the invariant");
        }
        // The over-wide word sits alone, unbroken.
        assert!(lines.contains(&"incomprehensibilities".to_string()));
    }

    #[test]
    fn blank_manual_line_is_preserved() {
        let lines = wrap_text("A\n\nB", 500.0, char_width).unwrap();
        assert_eq!(lines, vec!["A", "", "B"]);
    }

    #[test]
    fn whitespace_only_manual_line_is_one_empty_line() {
        let lines = wrap_text("A\n   \nB", 500.0, char_width).unwrap();
        assert_eq!(lines, vec!["A", "", "B"]);
    }

    #[test]
    fn manual_breaks_are_never_merged() {
        let lines = wrap_text("aa\nbb", 10_000.0, char_width).unwrap();
        assert_eq!(lines, vec!["aa", "bb"]);
    }

    #[test]
    fn crlf_breaks_like_lf() {
        let lines = wrap_text("aa\r\nbb", 10_000.0, char_width).unwrap();
        assert_eq!(lines, vec!["aa", "bb"]);
    }

    #[test]
    fn empty_input_yields_no_lines() {
        assert!(wrap_text("", 920.0, char_width).unwrap().is_empty());
    }

    #[test]
    fn anchor_x_values() {
        assert_eq!(anchor_x(TextAlign::Left), 80.0);
        assert_eq!(anchor_x(TextAlign::Center), 540.0);
        assert_eq!(anchor_x(TextAlign::Right), 1000.0);
    }

    fn spec_with(heading: Option<&str>, statement: &str, footer: Option<&str>) -> RenderSpec {
        RenderSpec {
            heading: heading.map(str::to_string),
            statement: statement.to_string(),
            footer: footer.map(str::to_string),
            heading_font_size_px: 48,
            statement_font_size_px: 60,
            footer_font_size_px: 36,
            background_color: Rgba8::rgb(0x4c, 0xaf, 0x50),
            ..RenderSpec::default()
        }
    }

    #[test]
    fn sole_statement_is_vertically_centered() {
        let spec = spec_with(None, "The quick brown fox jumps over the lazy dog", None);
        let layout = layout_card(&spec, char_measure).unwrap();

        assert_eq!(layout.zones.len(), 1);
        let stmt = layout.zone(Zone::Statement).unwrap();
        assert_eq!(
            stmt.start_y,
            (1080.0 - stmt.block_height()) / 2.0 + stmt.line_height()
        );
        assert_eq!(layout.anchor_x, 540.0);
        for line in &stmt.lines {
            assert!(char_width(line).unwrap() <= TEXT_MAX_WIDTH || !line.contains(' '));
        }
    }

    #[test]
    fn three_zones_stack_from_300_with_bottom_anchored_footer() {
        let spec = spec_with(Some("True or False?"), "Earth is flat", Some("Vote now"));
        let layout = layout_card(&spec, char_measure).unwrap();

        let heading = layout.zone(Zone::Heading).unwrap();
        let stmt = layout.zone(Zone::Statement).unwrap();
        let footer = layout.zone(Zone::Footer).unwrap();

        assert_eq!(heading.start_y, 300.0);
        let mut cursor = 300.0;
        cursor += heading.block_height() + 40.0;
        assert_eq!(stmt.start_y, cursor);
        // Stacking never decides the footer position.
        assert_eq!(footer.start_y, 1080.0 - footer.block_height() - 60.0);
    }

    #[test]
    fn two_zones_start_at_400() {
        let spec = spec_with(Some("Heading"), "Statement", None);
        let layout = layout_card(&spec, char_measure).unwrap();
        assert_eq!(layout.zone(Zone::Heading).unwrap().start_y, 400.0);
    }

    #[test]
    fn sole_heading_keeps_top_anchor_not_centering() {
        let spec = spec_with(Some("Heading"), "", None);
        let layout = layout_card(&spec, char_measure).unwrap();
        assert_eq!(layout.zones.len(), 1);
        assert_eq!(layout.zone(Zone::Heading).unwrap().start_y, 400.0);
    }

    #[test]
    fn sole_footer_anchors_to_bottom() {
        let spec = spec_with(None, "", Some("fine print"));
        let layout = layout_card(&spec, char_measure).unwrap();
        let footer = layout.zone(Zone::Footer).unwrap();
        assert_eq!(footer.start_y, 1080.0 - footer.block_height() - 60.0);
    }

    #[test]
    fn toggling_footer_never_rewraps_other_zones() {
        let without = spec_with(Some("A heading here"), "some longer statement text", None);
        let with = RenderSpec {
            footer: Some("vote now".to_string()),
            ..without.clone()
        };

        let a = layout_card(&without, char_measure).unwrap();
        let b = layout_card(&with, char_measure).unwrap();

        assert_eq!(
            a.zone(Zone::Heading).unwrap().lines,
            b.zone(Zone::Heading).unwrap().lines
        );
        assert_eq!(
            a.zone(Zone::Statement).unwrap().lines,
            b.zone(Zone::Statement).unwrap().lines
        );
    }

    #[test]
    fn line_baselines_advance_by_line_height() {
        let long = "statement ".repeat(30);
        let spec = spec_with(None, long.trim_end(), None);
        let layout = layout_card(&spec, char_measure).unwrap();
        let stmt = layout.zone(Zone::Statement).unwrap();
        assert!(stmt.lines.len() >= 2);
        for i in 0..stmt.lines.len() {
            assert_eq!(stmt.baseline_y(i), stmt.start_y + i as f64 * 72.0);
        }
    }

    #[test]
    fn all_zones_empty_yields_empty_layout() {
        let spec = spec_with(None, "", None);
        let layout = layout_card(&spec, char_measure).unwrap();
        assert!(layout.zones.is_empty());
    }
}
