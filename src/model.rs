use crate::fonts::FontFace;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Colour of a status line. Everything except a status line is drawn neutral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorTag {
    #[default]
    Neutral,
    Warning,
    Success,
}

impl ColorTag {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            ColorTag::Neutral => [0, 0, 0],
            ColorTag::Warning => [200, 30, 30],
            ColorTag::Success => [30, 130, 60],
        }
    }
}

/// Fixed canvas in millimetres, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 10.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn body_top(&self) -> f32 {
        self.margin
    }

    pub fn body_bottom(&self) -> f32 {
        self.height - self.margin
    }

    pub fn body_height(&self) -> f32 {
        self.body_bottom() - self.body_top()
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        PageGeometry::A4
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,        // points
    pub line_height: f32, // millimetres
    pub alignment: Alignment,
}

impl TextStyle {
    pub const fn new(face: FontFace, size: f32, line_height: f32) -> Self {
        Self {
            face,
            size,
            line_height,
            alignment: Alignment::Left,
        }
    }

    pub const fn aligned(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub const fn title() -> Self {
        Self::new(FontFace::Bold, 16.0, 10.0).aligned(Alignment::Center)
    }

    pub const fn subtitle() -> Self {
        Self::new(FontFace::Regular, 10.0, 5.0).aligned(Alignment::Center)
    }

    pub const fn section_heading() -> Self {
        Self::new(FontFace::Bold, 12.0, 10.0)
    }

    pub const fn subheading() -> Self {
        Self::new(FontFace::Bold, 11.0, 8.0)
    }

    pub const fn body() -> Self {
        Self::new(FontFace::Regular, 10.0, 5.0)
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::body()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableStyle {
    pub font_size: f32,
    pub line_height: f32,
    pub min_row_height: f32,
    pub cell_padding: f32,
    pub header_fill: [u8; 3],
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            font_size: 9.0,
            line_height: 4.5,
            min_row_height: 7.0,
            cell_padding: 1.0,
            header_fill: [200, 200, 200],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub col_widths: Vec<f32>, // millimetres
    pub col_alignments: Vec<Alignment>,
    pub style: TableStyle,
}

impl Table {
    pub fn alignment(&self, col: usize) -> Alignment {
        self.col_alignments.get(col).copied().unwrap_or(Alignment::Left)
    }

    pub fn total_width(&self) -> f32 {
        self.col_widths.iter().sum()
    }
}

/// Raw upload bytes. Decoding is deferred until the block is placed so that
/// one broken upload only affects its own block.
#[derive(Clone, Debug, Default)]
pub struct ImageData {
    pub label: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Header,
    Summary,
    Kpi,
    ProjectDetail(usize),
    Agenda,
}

#[derive(Clone, Debug)]
pub enum Block {
    /// Grey band across the top of the page carrying the report title.
    Banner {
        title: String,
        subtitle: String,
    },
    Heading {
        text: String,
        style: TextStyle,
    },
    Paragraph {
        text: String,
        style: TextStyle,
    },
    Table(Table),
    /// A single centred image scaled to `width`.
    Image {
        image: ImageData,
        width: f32,
    },
    SideBySideImages {
        left: ImageData,
        right: ImageData,
        box_width: f32,
        box_height: f32,
    },
    StatusLine {
        text: String,
        color: ColorTag,
    },
    Spacer(f32),
    PageBreak,
}

impl Block {
    /// Vertical extent at `width`, or `None` when it depends on decoded pixels.
    /// Splittable blocks report their full unsplit height.
    pub fn intrinsic_height(&self, width: f32, gutter: f32) -> Option<f32> {
        match self {
            Block::Banner { .. } => Some(
                TextStyle::title().line_height
                    + TextStyle::subtitle().line_height
                    + crate::pdf::BANNER_PADDING,
            ),
            Block::Heading { style, .. } => Some(style.line_height),
            Block::Paragraph { text, style } => {
                let lines = crate::pdf::wrap_text(text, style.face, style.size, width).len();
                Some(lines as f32 * style.line_height)
            }
            Block::StatusLine { text, .. } => {
                let style = TextStyle::body();
                let lines = crate::pdf::wrap_text(text, style.face, style.size, width).len();
                Some(lines as f32 * style.line_height)
            }
            Block::Table(table) => Some(crate::pdf::table_height(table, width)),
            Block::SideBySideImages { box_height, .. } => Some(box_height + gutter),
            Block::Image { .. } => None,
            Block::Spacer(h) => Some(*h),
            Block::PageBreak => Some(0.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SectionedBlock {
    pub section: Section,
    pub block: Block,
}

#[derive(Clone, Debug, Default)]
pub struct Document {
    pub title: String,
    pub blocks: Vec<SectionedBlock>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, section: Section, block: Block) {
        self.blocks.push(SectionedBlock { section, block });
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}
