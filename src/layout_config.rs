//! Layout config – the intermediate representation between layout
//! computation and page capture. This is the "frozen" structure that
//! encodes exactly what goes on each document page, so rendering stays
//! pure and the rasterizer needs no display surface.

use serde::{Deserialize, Serialize};

/// A4 portrait in PDF points (1 pt = 1/72 inch): 210mm × 297mm.
pub const A4_WIDTH_PT: f32 = 595.28;
pub const A4_HEIGHT_PT: f32 = 841.89;

/// A complete document layout ready for capture, page by page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Title carried into the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    /// Pages in document order.
    pub pages: Vec<PageLayout>,
}

/// One document page: a flat list of positioned top-level boxes, each of
/// which may nest further boxes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A resolved rectangle on a page. Coordinates are absolute page points
/// with the origin at the top-left corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub background_color: Option<[f32; 4]>,
    pub border: Option<BorderEdges>,
    /// Corner radius in pt, applied to the background fill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f32>,

    /// At most one of `text` / `logo` is set; containers carry neither.
    pub text: Option<TextContent>,
    pub logo: Option<LogoContent>,

    pub children: Vec<LayoutBox>,
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            background_color: None,
            border: None,
            corner_radius: None,
            text: None,
            logo: None,
            children: Vec::new(),
        }
    }
}

/// Per-edge border widths sharing one colour. Edges of width 0 are not
/// drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderEdges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
    pub color: [f32; 4],
}

/// Text already broken into lines; wrapping happened during layout, so the
/// rasterizer only places glyphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    /// Line box height in pt (already multiplied out of the CSS-style
    /// factor).
    pub line_height: f32,
    pub text_align: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    /// Horizontal offset within the box; alignment is baked in here.
    pub x_offset: f32,
    /// Vertical offset of the line box from the top of the content area.
    pub y_offset: f32,
}

/// The brand shield mark: two stroked paths scaled into the box bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoContent {
    pub color: [f32; 4],
}

impl LayoutConfig {
    /// An empty A4 portrait layout.
    pub fn a4() -> Self {
        Self {
            title: Self::default_title(),
            page_width_pt: A4_WIDTH_PT,
            page_height_pt: A4_HEIGHT_PT,
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "belegwerk output".to_string()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_dimensions() {
        let config = LayoutConfig::a4();
        assert!((config.page_width_pt - 595.28).abs() < 0.01);
        assert!((config.page_height_pt - 841.89).abs() < 0.01);
        assert!(config.pages.is_empty());
    }

    #[test]
    fn json_round_trip() {
        let mut config = LayoutConfig::a4();
        let mut page = PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        };
        let mut lbox = LayoutBox::new(10.0, 20.0, 100.0, 50.0);
        lbox.background_color = Some([0.97, 0.98, 0.98, 1.0]);
        lbox.text = Some(TextContent {
            lines: vec![TextLine {
                text: "Gesamtbetrag".to_string(),
                x_offset: 0.0,
                y_offset: 0.0,
            }],
            font_size: 10.5,
            bold: true,
            italic: false,
            color: [0.0, 0.0, 0.0, 1.0],
            line_height: 14.7,
            text_align: "left".to_string(),
        });
        page.boxes.push(lbox);
        config.pages.push(page);

        let json = config.to_json();
        let back = LayoutConfig::from_json(&json).unwrap();
        assert_eq!(back.pages.len(), 1);
        assert_eq!(back.pages[0].boxes.len(), 1);
        let text = back.pages[0].boxes[0].text.as_ref().unwrap();
        assert_eq!(text.lines[0].text, "Gesamtbetrag");
        assert!(text.bold);
    }

    #[test]
    fn absent_corner_radius_is_not_serialized() {
        let lbox = LayoutBox::new(0.0, 0.0, 10.0, 10.0);
        let json = serde_json::to_string(&lbox).unwrap();
        assert!(!json.contains("corner_radius"));
    }
}
