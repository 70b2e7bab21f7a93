//! Face loading and text measurement on top of `ttf-parser`.
//!
//! The document templates use a single sans family in four variants
//! (regular/bold × upright/oblique). We probe well-known system locations
//! for DejaVu Sans; when nothing is found, synthetic Helvetica-like metrics
//! keep measurement and layout working (glyph painting then degrades, see
//! [`crate::raster`]).

use std::collections::HashMap;
use std::path::Path;

/// A loaded face plus the metrics layout needs. `bytes` stays owned here;
/// ttf-parser borrows from it on every use.
#[derive(Clone)]
pub struct FontData {
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

/// Face variant key.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub bold: bool,
    pub italic: bool,
}

/// All four variants, in load order.
const VARIANTS: [(bool, bool); 4] = [(false, false), (true, false), (false, true), (true, true)];

/// Candidate locations for DejaVu Sans, checked in order. The file stem is
/// completed per variant (`DejaVuSans-Bold.ttf` etc.).
const FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/dejavu-sans-fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "C:\\Windows\\Fonts",
];

fn variant_file(bold: bool, italic: bool) -> &'static str {
    match (bold, italic) {
        (false, false) => "DejaVuSans.ttf",
        (true, false) => "DejaVuSans-Bold.ttf",
        (false, true) => "DejaVuSans-Oblique.ttf",
        (true, true) => "DejaVuSans-BoldOblique.ttf",
    }
}

/// Holds the loaded face variants. Lookups never fail: a missing variant
/// resolves to the nearest loaded one, and with nothing loaded at all the
/// synthetic fallback metrics answer instead.
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    fallback: FontData,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            fonts: HashMap::new(),
            // Helvetica-like proportions on a 1000-unit em.
            fallback: FontData {
                bytes: Vec::new(),
                units_per_em: 1000.0,
                ascender: 750.0,
                descender: -250.0,
                line_gap: 0.0,
            },
        }
    }

    /// Register a TTF/OTF face for one variant.
    pub fn load_font(&mut self, bold: bool, italic: bool, bytes: Vec<u8>) -> Result<(), String> {
        let face =
            ttf_parser::Face::parse(&bytes, 0).map_err(|e| format!("font parse error: {e}"))?;
        let (units_per_em, ascender, descender, line_gap) = (
            face.units_per_em() as f32,
            face.ascender() as f32,
            face.descender() as f32,
            face.line_gap() as f32,
        );
        self.fonts.insert(
            FontKey { bold, italic },
            FontData {
                bytes,
                units_per_em,
                ascender,
                descender,
                line_gap,
            },
        );
        Ok(())
    }

    /// Probe the system font locations for every variant.
    pub fn load_system_fonts(&mut self) {
        for (bold, italic) in VARIANTS {
            let file = variant_file(bold, italic);
            for dir in FONT_DIRS {
                let path = Path::new(dir).join(file);
                if let Ok(bytes) = std::fs::read(&path) {
                    match self.load_font(bold, italic, bytes) {
                        Ok(()) => {
                            log::debug!("loaded {}", path.display());
                            break;
                        }
                        Err(e) => log::warn!("ignoring font {}: {e}", path.display()),
                    }
                }
            }
        }
        if self.fonts.is_empty() {
            log::warn!("no system fonts found; falling back to synthetic metrics");
        }
    }

    /// Font data for a variant: the variant itself, then its upright or
    /// regular stand-in, then the synthetic fallback.
    pub fn get(&self, bold: bool, italic: bool) -> &FontData {
        self.fonts
            .get(&FontKey { bold, italic })
            .or_else(|| self.fonts.get(&FontKey {
                bold,
                italic: false,
            }))
            .or_else(|| self.fonts.get(&FontKey {
                bold: false,
                italic: false,
            }))
            .unwrap_or(&self.fallback)
    }

    /// Raw face bytes for a variant, when a real font backs it.
    pub fn face_bytes(&self, bold: bool, italic: bool) -> Option<&[u8]> {
        let data = self.get(bold, italic);
        if data.bytes.is_empty() {
            None
        } else {
            Some(data.bytes.as_slice())
        }
    }

    /// Width of a string at `font_size` pt, summing glyph advances. Without
    /// real font bytes, an average character width stands in (0.5 × size,
    /// bold a tenth wider).
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool, italic: bool) -> f32 {
        let data = self.get(bold, italic);

        if data.bytes.is_empty() {
            let per_char = if bold { 0.55 } else { 0.5 };
            return text.chars().count() as f32 * font_size * per_char;
        }

        let Ok(face) = ttf_parser::Face::parse(&data.bytes, 0) else {
            return text.chars().count() as f32 * font_size * 0.5;
        };
        let scale = font_size / data.units_per_em;
        text.chars()
            .map(|ch| match face.glyph_index(ch) {
                Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                // Must stay in step with the advance the raster pass uses.
                None => font_size * 0.5,
            })
            .sum()
    }

    /// Line box height in pt.
    pub fn line_height_pt(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Ascender in pt for a variant.
    pub fn ascender_pt(&self, font_size: f32, bold: bool, italic: bool) -> f32 {
        let data = self.get(bold, italic);
        data.ascender * font_size / data.units_per_em
    }

    /// True when a real face (not synthetic metrics) backs the regular
    /// variant.
    pub fn has_real_fonts(&self) -> bool {
        !self.get(false, false).bytes.is_empty()
    }
}

impl Default for FontManager {
    fn default() -> Self {
        let mut manager = Self::new();
        manager.load_system_fonts();
        manager
    }
}

/// Greedy word-wrap against measured widths; returns at least one line.
/// Hard newlines in `text` always break.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if text.is_empty() || max_width <= 0.0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                // A single word never breaks, even when overlong.
                current = word.to_string();
                continue;
            }
            let candidate = format!("{current} {word}");
            if fonts.measure_text_width(&candidate, font_size, bold, italic) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic() -> FontManager {
        FontManager::new()
    }

    #[test]
    fn heuristic_text_width() {
        let mgr = synthetic();
        // 8 chars at half the font size each
        let w = mgr.measure_text_width("Rechnung", 16.0, false, false);
        assert!((w - 64.0).abs() < 0.1);
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = synthetic();
        let lines = wrap_text("Hello world foo bar", 16.0, false, false, 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }

    #[test]
    fn wrap_preserves_words() {
        let mgr = synthetic();
        let text = "Zahlung per Treuhandkonto sofort fällig";
        let lines = wrap_text(text, 10.0, false, false, 80.0, &mgr);
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn blank_paragraph_keeps_its_line() {
        let mgr = synthetic();
        let lines = wrap_text("oben\n\nunten", 10.0, false, false, 200.0, &mgr);
        assert_eq!(lines, vec!["oben", "", "unten"]);
    }

    #[test]
    fn every_variant_measurable() {
        let mgr = FontManager::default();
        for (bold, italic) in VARIANTS {
            let w = mgr.measure_text_width("Rechnung", 11.0, bold, italic);
            assert!(w > 0.0);
            assert!(mgr.ascender_pt(11.0, bold, italic) > 0.0);
        }
    }
}
