//! Block styling – a flat style struct set directly by the document
//! templates and mapped onto Taffy by the layout engine. All lengths are in
//! PDF points.

/// Style for a single box in the template tree.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStyle {
    // Flex layout
    pub direction: FlexDirection,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Dimension,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_height: Dimension,

    // Spacing (pt)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Borders, per edge (pt)
    pub border_top: f32,
    pub border_right: f32,
    pub border_bottom: f32,
    pub border_left: f32,
    pub border_color: Color,

    // Typography
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,

    // Background
    pub background: Color,
    /// Corner radius in pt; `width.min(height) / 2` yields a circle.
    pub corner_radius: f32,
}

impl Default for BlockStyle {
    fn default() -> Self {
        Self {
            direction: FlexDirection::Column,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Dimension::Auto,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_height: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_top: 0.0,
            border_right: 0.0,
            border_bottom: 0.0,
            border_left: 0.0,
            border_color: Color::BLACK,
            font_size: 9.0,
            bold: false,
            italic: false,
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.4,
            background: Color::TRANSPARENT,
            corner_radius: 0.0,
        }
    }
}

impl BlockStyle {
    /// A flex-row container.
    pub fn row() -> Self {
        Self {
            direction: FlexDirection::Row,
            ..Self::default()
        }
    }

    /// A flex-column container (the default stacking mode).
    pub fn column() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Layout vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

/// Main-axis distribution of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
}

/// Cross-axis alignment of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// `Pt` is an absolute length; `Percent` resolves against the parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Pt(f32),
    Percent(f32),
}

/// RGBA colour with unit-range channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb8(0, 0, 0);
    pub const WHITE: Self = Self::rgb8(255, 255, 255);
    pub const TRANSPARENT: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    /// From the 0–255 hex-triplet notation the palette constants use.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.001
    }

    pub fn as_rgba(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

// ---------------------------------------------------------------------------
// Template tree
// ---------------------------------------------------------------------------

/// A styled node as built by the document templates, before layout.
#[derive(Debug, Clone, PartialEq)]
pub enum StyledNode {
    /// A container box.
    Block {
        style: BlockStyle,
        children: Vec<StyledNode>,
    },
    /// A leaf carrying wrappable text.
    Text { style: BlockStyle, text: String },
    /// The brand shield mark, drawn as vector strokes at raster time.
    Logo { style: BlockStyle, color: Color },
}

impl StyledNode {
    pub fn block(style: BlockStyle, children: Vec<StyledNode>) -> Self {
        Self::Block { style, children }
    }

    pub fn text(style: BlockStyle, text: impl Into<String>) -> Self {
        Self::Text {
            style,
            text: text.into(),
        }
    }

    pub fn logo(style: BlockStyle, color: Color) -> Self {
        Self::Logo { style, color }
    }

    pub fn style(&self) -> &BlockStyle {
        match self {
            Self::Block { style, .. } | Self::Text { style, .. } | Self::Logo { style, .. } => {
                style
            }
        }
    }
}
