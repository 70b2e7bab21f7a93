//! Page rasterizer – draws one laid-out page into an oversampled RGBA
//! pixmap, filling glyph outlines straight from the font tables, then
//! encodes the capture as PNG for PDF embedding.
//!
//! The pixmap starts as opaque white, so captures never carry
//! transparency into the PDF.

use image::ImageEncoder;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

use crate::fonts::FontManager;
use crate::layout_config::{LayoutBox, PageLayout, TextContent};

// Brand shield geometry, in its 100 x 115 viewBox.
const SHIELD_STROKE: f32 = 6.0;
const CHECK_STROKE: f32 = 8.0;
const LOGO_VIEW_W: f32 = 100.0;
const LOGO_VIEW_H: f32 = 115.0;

/// Rasterize one page at `scale` device pixels per point.
pub fn rasterize_page(
    page: &PageLayout,
    page_width_pt: f32,
    page_height_pt: f32,
    scale: f32,
    fonts: &FontManager,
) -> Result<Pixmap, String> {
    let width = (page_width_pt * scale).round() as u32;
    let height = (page_height_pt * scale).round() as u32;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| format!("cannot allocate a {width}x{height} page capture"))?;

    pixmap.fill(tiny_skia::Color::WHITE);

    if !fonts.has_real_fonts() {
        log::warn!("no usable font files found; text will be missing from page captures");
    }

    for lbox in &page.boxes {
        draw_box(&mut pixmap, lbox, scale, fonts);
    }

    Ok(pixmap)
}

/// Encode a capture as PNG (lossless).
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, String> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            &rgba,
            pixmap.width(),
            pixmap.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| format!("PNG encode failed: {e}"))?;
    Ok(out)
}

fn to_color(rgba: [f32; 4]) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        rgba[0].clamp(0.0, 1.0),
        rgba[1].clamp(0.0, 1.0),
        rgba[2].clamp(0.0, 1.0),
        rgba[3].clamp(0.0, 1.0),
    )
    .unwrap_or(tiny_skia::Color::BLACK)
}

fn solid_paint(rgba: [f32; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_color(rgba));
    paint.anti_alias = true;
    paint
}

fn fill_rect(pixmap: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, rgba: [f32; 4]) {
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    if let Some(rect) = Rect::from_xywh(x, y, w, h) {
        pixmap.fill_rect(rect, &solid_paint(rgba), Transform::identity(), None);
    }
}

/// Quadratic-corner approximation; collapses to a circle when the radius
/// covers both extents.
fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, r: f32) -> Option<tiny_skia::Path> {
    if 2.0 * r >= w && 2.0 * r >= h {
        return PathBuilder::from_circle(x + w / 2.0, y + h / 2.0, w.min(h) / 2.0);
    }
    let r = r.min(w / 2.0).min(h / 2.0);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

fn draw_box(pixmap: &mut Pixmap, lbox: &LayoutBox, scale: f32, fonts: &FontManager) {
    let x = lbox.x * scale;
    let y = lbox.y * scale;
    let w = lbox.width * scale;
    let h = lbox.height * scale;

    if let Some(bg) = lbox.background_color {
        match lbox.corner_radius {
            Some(radius) if radius > 0.0 => {
                if let Some(path) = rounded_rect_path(x, y, w, h, radius * scale) {
                    pixmap.fill_path(
                        &path,
                        &solid_paint(bg),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
            _ => fill_rect(pixmap, x, y, w, h, bg),
        }
    }

    if let Some(border) = &lbox.border {
        let color = border.color;
        if border.top > 0.0 {
            fill_rect(pixmap, x, y, w, border.top * scale, color);
        }
        if border.bottom > 0.0 {
            let bw = border.bottom * scale;
            fill_rect(pixmap, x, y + h - bw, w, bw, color);
        }
        if border.left > 0.0 {
            fill_rect(pixmap, x, y, border.left * scale, h, color);
        }
        if border.right > 0.0 {
            let bw = border.right * scale;
            fill_rect(pixmap, x + w - bw, y, bw, h, color);
        }
    }

    if let Some(text) = &lbox.text {
        draw_text(pixmap, lbox, text, scale, fonts);
    }

    if let Some(logo) = &lbox.logo {
        draw_logo(pixmap, x, y, w, h, logo.color);
    }

    for child in &lbox.children {
        draw_box(pixmap, child, scale, fonts);
    }
}

/// Collects a glyph outline, mapping font units (y-up) into device pixels
/// (y-down) around a baseline origin.
struct GlyphOutline {
    pb: PathBuilder,
    units_to_px: f32,
    origin_x: f32,
    baseline_y: f32,
}

impl ttf_parser::OutlineBuilder for GlyphOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        self.pb.move_to(
            self.origin_x + x * self.units_to_px,
            self.baseline_y - y * self.units_to_px,
        );
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.pb.line_to(
            self.origin_x + x * self.units_to_px,
            self.baseline_y - y * self.units_to_px,
        );
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.pb.quad_to(
            self.origin_x + x1 * self.units_to_px,
            self.baseline_y - y1 * self.units_to_px,
            self.origin_x + x * self.units_to_px,
            self.baseline_y - y * self.units_to_px,
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.pb.cubic_to(
            self.origin_x + x1 * self.units_to_px,
            self.baseline_y - y1 * self.units_to_px,
            self.origin_x + x2 * self.units_to_px,
            self.baseline_y - y2 * self.units_to_px,
            self.origin_x + x * self.units_to_px,
            self.baseline_y - y * self.units_to_px,
        );
    }

    fn close(&mut self) {
        self.pb.close();
    }
}

fn draw_text(
    pixmap: &mut Pixmap,
    lbox: &LayoutBox,
    text: &TextContent,
    scale: f32,
    fonts: &FontManager,
) {
    let Some(bytes) = fonts.face_bytes(text.bold, text.italic) else {
        return;
    };
    let face = match ttf_parser::Face::parse(bytes, 0) {
        Ok(face) => face,
        Err(_) => return,
    };

    let data = fonts.get(text.bold, text.italic);
    let ascender_pt = data.ascender * text.font_size / data.units_per_em;
    let descender_pt = data.descender * text.font_size / data.units_per_em;
    // Center the glyph run inside the line box, browser-style.
    let half_leading = ((text.line_height - (ascender_pt - descender_pt)) / 2.0).max(0.0);

    let units_to_px = text.font_size / data.units_per_em * scale;
    let paint = solid_paint(text.color);

    for line in &text.lines {
        let mut pen_x = (lbox.x + line.x_offset) * scale;
        let baseline_y = (lbox.y + line.y_offset + half_leading + ascender_pt) * scale;

        for ch in line.text.chars() {
            if let Some(glyph) = face.glyph_index(ch) {
                let mut outline = GlyphOutline {
                    pb: PathBuilder::new(),
                    units_to_px,
                    origin_x: pen_x,
                    baseline_y,
                };
                if face.outline_glyph(glyph, &mut outline).is_some() {
                    if let Some(path) = outline.pb.finish() {
                        pixmap.fill_path(
                            &path,
                            &paint,
                            FillRule::Winding,
                            Transform::identity(),
                            None,
                        );
                    }
                }
                pen_x += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * units_to_px;
            } else {
                // Keep advances in sync with text measurement.
                pen_x += 0.5 * text.font_size * scale;
            }
        }
    }
}

/// Stroke the brand shield into the box, preserving aspect ratio anchored
/// to the bottom center (the SVG's xMidYMax behaviour).
fn draw_logo(pixmap: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) {
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    let s = (w / LOGO_VIEW_W).min(h / LOGO_VIEW_H);
    let tx = x + (w - LOGO_VIEW_W * s) / 2.0;
    let ty = y + (h - LOGO_VIEW_H * s);
    let transform = Transform::from_row(s, 0.0, 0.0, s, tx, ty);
    let paint = solid_paint(color);

    let mut pb = PathBuilder::new();
    pb.move_to(50.0, 5.0);
    pb.line_to(90.0, 20.0);
    pb.line_to(90.0, 50.0);
    pb.cubic_to(90.0, 75.0, 50.0, 95.0, 50.0, 95.0);
    pb.cubic_to(50.0, 95.0, 10.0, 75.0, 10.0, 50.0);
    pb.line_to(10.0, 20.0);
    pb.close();
    if let Some(shield) = pb.finish() {
        let stroke = Stroke {
            width: SHIELD_STROKE,
            ..Stroke::default()
        };
        pixmap.stroke_path(&shield, &paint, &stroke, transform, None);
    }

    let mut pb = PathBuilder::new();
    pb.move_to(35.0, 50.0);
    pb.line_to(45.0, 60.0);
    pb.line_to(65.0, 40.0);
    if let Some(check) = pb.finish() {
        let stroke = Stroke {
            width: CHECK_STROKE,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        pixmap.stroke_path(&check, &paint, &stroke, transform, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_config::LogoContent;

    fn fonts() -> FontManager {
        FontManager::new()
    }

    fn empty_page() -> PageLayout {
        PageLayout {
            page_index: 0,
            boxes: Vec::new(),
        }
    }

    #[test]
    fn capture_scales_page_dimensions() {
        let pixmap = rasterize_page(&empty_page(), 595.28, 841.89, 4.0, &fonts()).unwrap();
        assert_eq!(pixmap.width(), 2381);
        assert_eq!(pixmap.height(), 3368);
    }

    #[test]
    fn background_is_opaque_white() {
        let pixmap = rasterize_page(&empty_page(), 100.0, 100.0, 1.0, &fonts()).unwrap();
        let px = pixmap.pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (255, 255, 255, 255));
        let px = pixmap.pixel(99, 99).unwrap();
        assert_eq!(px.alpha(), 255);
    }

    #[test]
    fn box_background_is_painted() {
        let mut page = empty_page();
        let mut lbox = LayoutBox::new(10.0, 10.0, 50.0, 50.0);
        lbox.background_color = Some([0.0, 0.0, 0.0, 1.0]);
        page.boxes.push(lbox);

        let pixmap = rasterize_page(&page, 100.0, 100.0, 1.0, &fonts()).unwrap();
        let inside = pixmap.pixel(35, 35).unwrap();
        assert_eq!((inside.red(), inside.green(), inside.blue()), (0, 0, 0));
        let outside = pixmap.pixel(5, 5).unwrap();
        assert_eq!((outside.red(), outside.green(), outside.blue()), (255, 255, 255));
    }

    #[test]
    fn borders_only_touch_their_edges() {
        let mut page = empty_page();
        let mut lbox = LayoutBox::new(10.0, 10.0, 80.0, 80.0);
        lbox.border = Some(crate::layout_config::BorderEdges {
            top: 2.0,
            right: 0.0,
            bottom: 0.0,
            left: 0.0,
            color: [0.0, 0.0, 0.0, 1.0],
        });
        page.boxes.push(lbox);

        let pixmap = rasterize_page(&page, 100.0, 100.0, 1.0, &fonts()).unwrap();
        let on_top_edge = pixmap.pixel(50, 11).unwrap();
        assert_eq!(on_top_edge.red(), 0);
        let on_bottom_edge = pixmap.pixel(50, 88).unwrap();
        assert_eq!(on_bottom_edge.red(), 255, "bottom edge has no border");
    }

    #[test]
    fn logo_leaves_marks() {
        let mut page = empty_page();
        let mut lbox = LayoutBox::new(0.0, 0.0, 100.0, 115.0);
        lbox.logo = Some(LogoContent {
            color: [0.788, 0.635, 0.153, 1.0],
        });
        page.boxes.push(lbox);

        let pixmap = rasterize_page(&page, 100.0, 115.0, 1.0, &fonts()).unwrap();
        let marked = pixmap
            .pixels()
            .iter()
            .filter(|p| p.red() != 255 || p.green() != 255 || p.blue() != 255)
            .count();
        assert!(marked > 100, "expected shield strokes, got {marked} marked pixels");
    }

    #[test]
    fn text_marks_pixels_with_real_fonts() {
        let fonts = FontManager::default();
        if !fonts.has_real_fonts() {
            return;
        }

        let mut page = empty_page();
        let mut lbox = LayoutBox::new(10.0, 10.0, 200.0, 30.0);
        lbox.text = Some(TextContent {
            lines: vec![crate::layout_config::TextLine {
                text: "Gesamtbetrag".to_string(),
                x_offset: 0.0,
                y_offset: 0.0,
            }],
            font_size: 14.0,
            bold: true,
            italic: false,
            color: [0.0, 0.0, 0.0, 1.0],
            line_height: 19.6,
            text_align: "left".to_string(),
        });
        page.boxes.push(lbox);

        let pixmap = rasterize_page(&page, 220.0, 50.0, 2.0, &fonts).unwrap();
        let marked = pixmap
            .pixels()
            .iter()
            .filter(|p| p.red() < 200)
            .count();
        assert!(marked > 50, "expected glyph coverage, got {marked} dark pixels");
    }

    #[test]
    fn png_has_signature() {
        let pixmap = rasterize_page(&empty_page(), 50.0, 50.0, 1.0, &fonts()).unwrap();
        let png = encode_png(&pixmap).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }

    #[test]
    fn zero_page_capture_is_rejected() {
        assert!(rasterize_page(&empty_page(), 0.0, 0.0, 4.0, &fonts()).is_err());
    }
}
