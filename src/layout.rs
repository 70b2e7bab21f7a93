//! Flexbox layout for one styled template tree per page, via Taffy. The
//! computed result comes back as the positioned [`LayoutBox`] tree the
//! rasterizer consumes.
//!
//! Every page is laid out against a fixed content box (page size minus
//! margins), so the root height is definite and a `flex_grow` body pins the
//! footer to the page bottom.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::fonts::{wrap_text, FontManager};
use crate::layout_config::{BorderEdges, LayoutBox, LogoContent, TextContent, TextLine};
use crate::style::{self, BlockStyle, StyledNode};

/// Side-table content attached to Taffy nodes.
#[derive(Debug, Clone)]
enum NodeContent {
    None,
    Text { lines: Vec<String> },
    Logo { color: style::Color },
}

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    styles: HashMap<NodeId, BlockStyle>,
    content: HashMap<NodeId, NodeContent>,
}

fn taffy_dim(d: style::Dimension) -> taffy::Dimension {
    match d {
        style::Dimension::Auto => taffy::Dimension::Auto,
        style::Dimension::Pt(v) => taffy::Dimension::Length(v),
        style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
    }
}

/// Top/right/bottom/left pt values as a fixed-length edge rect.
fn fixed_edges(top: f32, right: f32, bottom: f32, left: f32) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(top),
        right: LengthPercentage::Length(right),
        bottom: LengthPercentage::Length(bottom),
        left: LengthPercentage::Length(left),
    }
}

fn margin_edges(top: f32, right: f32, bottom: f32, left: f32) -> Rect<LengthPercentageAuto> {
    Rect {
        top: LengthPercentageAuto::Length(top),
        right: LengthPercentageAuto::Length(right),
        bottom: LengthPercentageAuto::Length(bottom),
        left: LengthPercentageAuto::Length(left),
    }
}

fn block_to_taffy(s: &BlockStyle) -> Style {
    Style {
        display: taffy::Display::Flex,
        flex_direction: match s.direction {
            style::FlexDirection::Row => taffy::FlexDirection::Row,
            style::FlexDirection::Column => taffy::FlexDirection::Column,
        },
        justify_content: Some(match s.justify_content {
            style::JustifyContent::Start => taffy::JustifyContent::Start,
            style::JustifyContent::End => taffy::JustifyContent::End,
            style::JustifyContent::Center => taffy::JustifyContent::Center,
            style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
        }),
        align_items: Some(match s.align_items {
            style::AlignItems::Start => taffy::AlignItems::Start,
            style::AlignItems::End => taffy::AlignItems::End,
            style::AlignItems::Center => taffy::AlignItems::Center,
            style::AlignItems::Stretch => taffy::AlignItems::Stretch,
        }),
        size: Size {
            width: taffy_dim(s.width),
            height: taffy_dim(s.height),
        },
        // Flex items may compress below their natural content size.
        min_size: Size {
            width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
                taffy::Dimension::Length(0.0)
            } else {
                taffy::Dimension::Auto
            },
            height: taffy_dim(s.min_height),
        },
        flex_grow: s.flex_grow,
        flex_shrink: s.flex_shrink,
        flex_basis: taffy_dim(s.flex_basis),
        margin: margin_edges(s.margin_top, s.margin_right, s.margin_bottom, s.margin_left),
        padding: fixed_edges(
            s.padding_top,
            s.padding_right,
            s.padding_bottom,
            s.padding_left,
        ),
        border: fixed_edges(s.border_top, s.border_right, s.border_bottom, s.border_left),
        gap: Size {
            width: LengthPercentage::Length(s.gap),
            height: LengthPercentage::Length(s.gap),
        },
        ..Default::default()
    }
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            styles: HashMap::new(),
            content: HashMap::new(),
        }
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> NodeId {
        match styled {
            StyledNode::Text { style, text } => self.build_text_node(text, style, parent_width),
            StyledNode::Block { style, children } => {
                self.build_block_node(style, children, parent_width)
            }
            StyledNode::Logo { style, color } => self.build_logo_node(style, *color),
        }
    }

    /// Resolve a styled width against the parent's content width.
    fn resolve_width(width: style::Dimension, parent_width: f32) -> f32 {
        match width {
            style::Dimension::Pt(w) => w,
            style::Dimension::Percent(p) => parent_width * p / 100.0,
            style::Dimension::Auto => parent_width,
        }
    }

    fn build_text_node(&mut self, text: &str, style: &BlockStyle, parent_width: f32) -> NodeId {
        let fonts = self.fonts;
        let wrap_width = Self::resolve_width(style.width, parent_width);
        let lines = wrap_text(
            text,
            style.font_size,
            style.bold,
            style.italic,
            wrap_width,
            fonts,
        );

        let measure =
            |line: &str| fonts.measure_text_width(line, style.font_size, style.bold, style.italic);
        let line_height = fonts.line_height_pt(style.font_size, style.line_height);
        let text_width = lines.iter().map(|l| measure(l)).fold(0.0_f32, f32::max);
        let text_height = lines.len() as f32 * line_height;

        // Non-left-aligned text must span its column so the per-line offsets
        // computed at extraction have room to work with.
        let taffy_width = match style.width {
            style::Dimension::Auto if style.text_align == style::TextAlign::Left => {
                Dimension::Length(text_width)
            }
            style::Dimension::Auto => Dimension::Length(wrap_width),
            other => taffy_dim(other),
        };

        let taffy_style = Style {
            size: Size {
                width: taffy_width,
                height: Dimension::Length(text_height),
            },
            margin: margin_edges(
                style.margin_top,
                style.margin_right,
                style.margin_bottom,
                style.margin_left,
            ),
            flex_grow: style.flex_grow,
            flex_shrink: style.flex_shrink,
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style).unwrap();
        self.styles.insert(node, style.clone());
        self.content.insert(node, NodeContent::Text { lines });
        node
    }

    fn build_logo_node(&mut self, style: &BlockStyle, color: style::Color) -> NodeId {
        let taffy_style = Style {
            size: Size {
                width: taffy_dim(style.width),
                height: taffy_dim(style.height),
            },
            margin: margin_edges(
                style.margin_top,
                style.margin_right,
                style.margin_bottom,
                style.margin_left,
            ),
            flex_shrink: 0.0,
            ..Default::default()
        };
        let node = self.taffy.new_leaf(taffy_style).unwrap();
        self.styles.insert(node, style.clone());
        self.content.insert(node, NodeContent::Logo { color });
        node
    }

    fn build_block_node(
        &mut self,
        style: &BlockStyle,
        children: &[StyledNode],
        parent_width: f32,
    ) -> NodeId {
        let my_width = Self::resolve_width(style.width, parent_width);
        let inner_width =
            my_width - style.padding_left - style.padding_right - style.border_left
                - style.border_right;

        // Estimate per-child build widths so text wraps to its real column.
        // Taffy computes the authoritative positions afterwards; this only
        // feeds word-wrapping.
        let child_widths: Vec<f32> = if style.direction == style::FlexDirection::Row {
            let gap_total = style.gap * children.len().saturating_sub(1) as f32;
            let mut fixed_total = 0.0f32;
            let mut flex_weight = 0.0f32;
            for child in children {
                match child.style().width {
                    style::Dimension::Auto => {
                        let grow = child.style().flex_grow;
                        flex_weight += if grow > 0.0 { grow } else { 1.0 };
                    }
                    dim => fixed_total += Self::resolve_width(dim, inner_width),
                }
            }
            let remaining = (inner_width - gap_total - fixed_total).max(0.0);
            children
                .iter()
                .map(|child| match child.style().width {
                    style::Dimension::Auto => {
                        let grow = child.style().flex_grow;
                        let weight = if grow > 0.0 { grow } else { 1.0 };
                        (remaining * weight / flex_weight.max(1.0)).max(1.0)
                    }
                    dim => Self::resolve_width(dim, inner_width),
                })
                .collect()
        } else {
            children
                .iter()
                .map(|child| Self::resolve_width(child.style().width, inner_width))
                .collect()
        };

        let child_nodes: Vec<NodeId> = children
            .iter()
            .zip(&child_widths)
            .map(|(child, &w)| self.build_node(child, w))
            .collect();

        let node = self
            .taffy
            .new_with_children(block_to_taffy(style), &child_nodes)
            .unwrap();
        self.styles.insert(node, style.clone());
        node
    }

    /// Extract the positioned box tree after layout. Coordinates accumulate
    /// so every box carries page-absolute x/y (origin: page top-left).
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> LayoutBox {
        let layout = self.taffy.layout(node).unwrap();
        let style = self.styles.get(&node).cloned().unwrap_or_default();
        let content = self.content.get(&node).cloned().unwrap_or(NodeContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let mut lb = LayoutBox::new(x, y, layout.size.width, layout.size.height);

        if !style.background.is_transparent() {
            lb.background_color = Some(style.background.as_rgba());
        }
        if style.corner_radius > 0.0 {
            let max_radius = layout.size.width.min(layout.size.height) / 2.0;
            lb.corner_radius = Some(style.corner_radius.min(max_radius));
        }
        if style.border_top > 0.0
            || style.border_right > 0.0
            || style.border_bottom > 0.0
            || style.border_left > 0.0
        {
            lb.border = Some(BorderEdges {
                top: style.border_top,
                right: style.border_right,
                bottom: style.border_bottom,
                left: style.border_left,
                color: style.border_color.as_rgba(),
            });
        }

        match content {
            NodeContent::Text { lines } => {
                let line_height = self
                    .fonts
                    .line_height_pt(style.font_size, style.line_height);
                let text_lines: Vec<TextLine> = lines
                    .iter()
                    .enumerate()
                    .map(|(i, line)| {
                        let line_w = self.fonts.measure_text_width(
                            line,
                            style.font_size,
                            style.bold,
                            style.italic,
                        );
                        let x_offset = match style.text_align {
                            style::TextAlign::Left => 0.0,
                            style::TextAlign::Center => {
                                ((layout.size.width - line_w) / 2.0).max(0.0)
                            }
                            style::TextAlign::Right => (layout.size.width - line_w).max(0.0),
                        };
                        TextLine {
                            text: line.clone(),
                            x_offset,
                            y_offset: i as f32 * line_height,
                        }
                    })
                    .collect();

                lb.text = Some(TextContent {
                    lines: text_lines,
                    font_size: style.font_size,
                    bold: style.bold,
                    italic: style.italic,
                    color: style.color.as_rgba(),
                    line_height,
                    text_align: match style.text_align {
                        style::TextAlign::Left => "left".to_string(),
                        style::TextAlign::Center => "center".to_string(),
                        style::TextAlign::Right => "right".to_string(),
                    },
                });
            }
            NodeContent::Logo { color } => {
                lb.logo = Some(LogoContent {
                    color: color.as_rgba(),
                });
            }
            NodeContent::None => {}
        }

        for &child in self.taffy.children(node).unwrap_or_default().iter() {
            lb.children.push(self.extract(child, x, y));
        }

        lb
    }
}

/// Lay out one page's template tree against a fixed page geometry and return
/// positioned boxes with page-absolute coordinates.
pub fn layout_page(
    page_tree: &StyledNode,
    page_width: f32,
    page_height: f32,
    margin: f32,
    fonts: &FontManager,
) -> Vec<LayoutBox> {
    let content_width = page_width - 2.0 * margin;
    let content_height = page_height - 2.0 * margin;

    let mut builder = LayoutBuilder::new(fonts);
    let root = builder.build_node(page_tree, content_width);

    // The page content box is definite in both axes so body growth can pin
    // the footer to the bottom edge.
    let mut root_style = builder.taffy.style(root).unwrap().clone();
    root_style.size = Size {
        width: Dimension::Length(content_width),
        height: Dimension::Length(content_height),
    };
    builder.taffy.set_style(root, root_style).unwrap();

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::Definite(content_height),
            },
        )
        .unwrap();

    let root_box = builder.extract(root, margin, margin);
    root_box.children
}
