use std::ops::{Deref, DerefMut};

use crate::fonts::FontFace;
use crate::model::{Alignment, ColorTag, PageGeometry, TextStyle};
use crate::raster::RasterImage;

/// Tolerance for float comparisons against the body bottom.
const EPSILON: f32 = 1e-3;

const BANNER_FILL: [u8; 3] = [240, 240, 240];
/// Band padding below the subtitle.
pub(crate) const BANNER_PADDING: f32 = 5.0;
const IMAGE_UNAVAILABLE: &str = "image unavailable";

/// Axis-aligned box in millimetres, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug)]
pub enum PlacedElement {
    /// One line of text; `frame` is the line box, the text is aligned inside it.
    Text {
        frame: Frame,
        text: String,
        face: FontFace,
        size: f32,
        color: [u8; 3],
        alignment: Alignment,
    },
    FillRect {
        frame: Frame,
        color: [u8; 3],
    },
    StrokeRect {
        frame: Frame,
    },
    /// `frame` is the reserved box; `drawn` is the aspect-fitted area inside it.
    Image {
        frame: Frame,
        drawn: Frame,
        image: RasterImage,
    },
}

impl PlacedElement {
    pub fn frame(&self) -> Frame {
        match self {
            PlacedElement::Text { frame, .. }
            | PlacedElement::FillRect { frame, .. }
            | PlacedElement::StrokeRect { frame }
            | PlacedElement::Image { frame, .. } => *frame,
        }
    }
}

#[derive(Debug)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub elements: Vec<PlacedElement>,
}

impl Page {
    fn blank(geometry: &PageGeometry) -> Self {
        Self {
            width: geometry.width,
            height: geometry.height,
            elements: Vec::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            PlacedElement::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, PlacedElement::Image { .. }))
            .count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    pub page_index: usize,
    pub y: f32,
}

/// Sequential placer over fixed-size pages. Content is never moved once placed.
pub struct LayoutEngine {
    geometry: PageGeometry,
    pages: Vec<Page>,
    cursor: Cursor,
    color: ColorTag,
}

/// Colour override that returns the engine to neutral when dropped.
pub struct ColorScope<'a> {
    engine: &'a mut LayoutEngine,
}

impl Deref for ColorScope<'_> {
    type Target = LayoutEngine;

    fn deref(&self) -> &LayoutEngine {
        &*self.engine
    }
}

impl DerefMut for ColorScope<'_> {
    fn deref_mut(&mut self) -> &mut LayoutEngine {
        &mut *self.engine
    }
}

impl Drop for ColorScope<'_> {
    fn drop(&mut self) {
        self.engine.color = ColorTag::Neutral;
    }
}

impl LayoutEngine {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            pages: vec![Page::blank(&geometry)],
            cursor: Cursor {
                page_index: 0,
                y: geometry.body_top(),
            },
            geometry,
            color: ColorTag::Neutral,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn color(&self) -> ColorTag {
        self.color
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    pub fn at_page_top(&self) -> bool {
        (self.cursor.y - self.geometry.body_top()).abs() < EPSILON
    }

    pub(super) fn remaining(&self) -> f32 {
        self.geometry.body_bottom() - self.cursor.y
    }

    fn new_page(&mut self) {
        self.pages.push(Page::blank(&self.geometry));
        self.cursor = Cursor {
            page_index: self.pages.len() - 1,
            y: self.geometry.body_top(),
        };
        log::debug!("PAGE break → page {}", self.cursor.page_index + 1);
    }

    /// Start a new page when `required_height` does not fit below the cursor.
    /// Returns whether a break happened. Content taller than a whole body is
    /// left on the current page when that page is still empty at the top, and
    /// the caller clips it.
    pub fn ensure_space(&mut self, required_height: f32) -> bool {
        if self.cursor.y + required_height <= self.geometry.body_bottom() + EPSILON {
            return false;
        }
        if self.at_page_top() {
            log::warn!(
                "block of {:.1}mm exceeds the page body ({:.1}mm); clipping",
                required_height,
                self.geometry.body_height()
            );
            return false;
        }
        self.new_page();
        true
    }

    pub fn force_page_break(&mut self) {
        self.new_page();
    }

    /// Vertical gap. Stops at the body bottom so the next placement breaks.
    pub fn advance(&mut self, height: f32) -> Cursor {
        self.descend(height);
        self.cursor
    }

    pub(super) fn descend(&mut self, height: f32) {
        self.cursor.y = (self.cursor.y + height).min(self.geometry.body_bottom());
    }

    /// Height available for an atomic unit after `ensure_space` ran.
    pub(super) fn clip_height(&self, height: f32) -> f32 {
        let remaining = self.remaining();
        if height > remaining + EPSILON {
            log::warn!("clipping {:.1}mm block to {:.1}mm", height, remaining);
            remaining.max(0.0)
        } else {
            height
        }
    }

    pub(super) fn push(&mut self, element: PlacedElement) {
        let page = self.cursor.page_index;
        self.pages[page].elements.push(element);
    }

    pub(super) fn push_text(&mut self, text: String, style: &TextStyle, frame: Frame) {
        if text.is_empty() {
            return;
        }
        let color = self.color.rgb();
        self.push(PlacedElement::Text {
            frame,
            text,
            face: style.face,
            size: style.size,
            color,
            alignment: style.alignment,
        });
    }

    fn line_frame(&self, height: f32) -> Frame {
        Frame::new(
            self.geometry.margin,
            self.cursor.y,
            self.geometry.content_width(),
            height,
        )
    }

    pub fn colored(&mut self, color: ColorTag) -> ColorScope<'_> {
        self.color = color;
        ColorScope { engine: self }
    }

    pub fn place_heading(&mut self, text: &str, style: &TextStyle) -> Cursor {
        self.ensure_space(style.line_height);
        let height = self.clip_height(style.line_height);
        let fitted = fit_to_width(text, style.face, style.size, self.geometry.content_width());
        let frame = self.line_frame(height);
        self.push_text(fitted, style, frame);
        self.descend(height);
        self.cursor
    }

    /// Wrapped text; each line is checked on its own so a paragraph may
    /// continue on the next page.
    pub fn place_paragraph(&mut self, text: &str, style: &TextStyle) -> usize {
        let lines = wrap_text(text, style.face, style.size, self.geometry.content_width());
        let count = lines.len();
        for line in lines {
            self.ensure_space(style.line_height);
            let height = self.clip_height(style.line_height);
            let frame = self.line_frame(height);
            self.push_text(line, style, frame);
            self.descend(height);
        }
        count
    }

    pub fn place_status_line(&mut self, text: &str, color: ColorTag, style: &TextStyle) -> usize {
        let mut scope = self.colored(color);
        scope.place_paragraph(text, style)
    }

    /// Two images side by side in identical boxes. The cursor always ends at
    /// `y_start + box_height + gutter`, however tall the rasters render.
    pub fn place_image_pair(
        &mut self,
        left: Option<RasterImage>,
        right: Option<RasterImage>,
        box_width: f32,
        box_height: f32,
        gutter: f32,
    ) -> Cursor {
        self.ensure_space(box_height + gutter);
        let box_height = self.clip_height(box_height);
        let y_start = self.cursor.y;
        let x_left = self.geometry.margin;
        let x_right = x_left + box_width + gutter;

        for (x, slot) in [(x_left, left), (x_right, right)] {
            self.place_in_box(slot, Frame::new(x, y_start, box_width, box_height));
        }

        self.cursor.y = (y_start + box_height + gutter).min(self.geometry.body_bottom());
        log::debug!(
            "IMAGE_PAIR page={} y_start={:.2} → y={:.2}",
            self.cursor.page_index + 1,
            y_start,
            self.cursor.y
        );
        self.cursor
    }

    fn place_in_box(&mut self, slot: Option<RasterImage>, frame: Frame) {
        match slot {
            Some(image) => {
                let drawn = fit_within(frame, image.aspect());
                self.push(PlacedElement::Image {
                    frame,
                    drawn,
                    image,
                });
            }
            None => {
                self.push(PlacedElement::StrokeRect { frame });
                let style = TextStyle::body().aligned(Alignment::Center);
                let line = Frame::new(
                    frame.x,
                    frame.y + (frame.height - style.line_height) / 2.0,
                    frame.width,
                    style.line_height.min(frame.height),
                );
                let mut scope = self.colored(ColorTag::Warning);
                scope.push_text(IMAGE_UNAVAILABLE.to_string(), &style, line);
            }
        }
    }

    /// One centred image `width` wide, its height following the raster's
    /// aspect ratio. Images taller than the body are scaled down to fit.
    pub fn place_image(&mut self, image: RasterImage, width: f32, gutter: f32) -> Cursor {
        let aspect = image.aspect();
        let mut width = width.min(self.geometry.content_width());
        let mut height = width * aspect;
        let max_height = (self.geometry.body_height() - gutter).max(1.0);
        if height > max_height {
            height = max_height;
            width = height / aspect;
            log::debug!("IMAGE scaled to {:.1}x{:.1}mm to fit the body", width, height);
        }

        self.ensure_space(height + gutter);
        let x = self.geometry.margin + (self.geometry.content_width() - width) / 2.0;
        let frame = Frame::new(x, self.cursor.y, width, height);
        self.push(PlacedElement::Image {
            frame,
            drawn: frame,
            image,
        });
        self.descend(height + gutter);
        self.cursor
    }

    /// Title band bleeding to the page edges, with a centred title and subtitle.
    pub fn place_banner(
        &mut self,
        title: &str,
        subtitle: &str,
        title_style: &TextStyle,
        subtitle_style: &TextStyle,
    ) -> Cursor {
        let text_height = title_style.line_height + subtitle_style.line_height;
        self.ensure_space(text_height + BANNER_PADDING);
        let y = self.cursor.y;
        let band_top = (y - self.geometry.margin).max(0.0);
        let band_bottom = (y + text_height + BANNER_PADDING).min(self.geometry.height);
        self.push(PlacedElement::FillRect {
            frame: Frame::new(0.0, band_top, self.geometry.width, band_bottom - band_top),
            color: BANNER_FILL,
        });

        let width = self.geometry.content_width();
        let title_frame = self.line_frame(title_style.line_height);
        self.push_text(fit_to_width(title, title_style.face, title_style.size, width), title_style, title_frame);
        self.descend(title_style.line_height);
        let subtitle_frame = self.line_frame(subtitle_style.line_height);
        self.push_text(
            fit_to_width(subtitle, subtitle_style.face, subtitle_style.size, width),
            subtitle_style,
            subtitle_frame,
        );
        self.descend(band_bottom - self.cursor.y);
        self.cursor
    }
}

/// Largest rect with the given aspect ratio (height / width) centred in `frame`.
fn fit_within(frame: Frame, aspect: f32) -> Frame {
    let mut width = frame.width;
    let mut height = width * aspect;
    if height > frame.height {
        height = frame.height;
        width = height / aspect;
    }
    Frame::new(
        frame.x + (frame.width - width) / 2.0,
        frame.y + (frame.height - height) / 2.0,
        width,
        height,
    )
}

/// Truncate single-line text with an ellipsis so it fits `max_width`.
pub(super) fn fit_to_width(text: &str, face: FontFace, size: f32, max_width: f32) -> String {
    if face.text_width(text, size) <= max_width {
        return text.to_string();
    }
    let mut fitted = text.to_string();
    while !fitted.is_empty() {
        fitted.pop();
        let candidate = format!("{}...", fitted.trim_end());
        if face.text_width(&candidate, size) <= max_width {
            return candidate;
        }
    }
    String::new()
}

fn split_long_word(word: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if face.text_width(&piece, size) > max_width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Greedy word wrap. `\n` is a hard break, a blank source line yields an
/// empty output line, and words wider than the line are split by characters.
/// Whitespace-only text yields no lines.
pub(crate) fn wrap_text(text: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let space_w = face.text_width(" ", size);
    let mut lines = Vec::new();

    for source_line in text.lines() {
        if source_line.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in source_line.split_whitespace() {
            let ww = face.text_width(word, size);
            if ww > max_width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = split_long_word(word, face, size, max_width);
                let last = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
                current_w = face.text_width(&last, size);
                current = last;
            } else if current.is_empty() {
                current.push_str(word);
                current_w = ww;
            } else if current_w + space_w + ww <= max_width + EPSILON {
                current.push(' ');
                current.push_str(word);
                current_w += space_w + ww;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_w = ww;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_page(height: f32) -> PageGeometry {
        PageGeometry {
            width: 210.0,
            height,
            margin: 10.0,
        }
    }

    #[test]
    fn wrap_respects_width() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(8);
        let lines = wrap_text(&text, FontFace::Regular, 10.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(FontFace::Regular.text_width(line, 10.0) <= 60.0 + EPSILON, "{line}");
        }
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn percent_heavy_line_stays_inside_content_width() {
        let lines = wrap_text(&"100% ".repeat(40), FontFace::Regular, 10.0, 190.0);
        // "100% " is 2835 units, so 19 fit in 190mm at 10pt.
        assert_eq!(lines[0].split(' ').count(), 19);
        for line in &lines {
            assert!(FontFace::Regular.text_width(line, 10.0) <= 190.0 + EPSILON, "{line}");
        }
    }

    #[test]
    fn wrap_keeps_blank_lines_and_hard_breaks() {
        let lines = wrap_text("Win: a\n\nRisk: b", FontFace::Regular, 10.0, 190.0);
        assert_eq!(lines, vec!["Win: a", "", "Risk: b"]);
        assert!(wrap_text("  \n ", FontFace::Regular, 10.0, 190.0).is_empty());
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, FontFace::Regular, 10.0, 20.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(FontFace::Regular.text_width(line, 10.0) <= 20.0 + EPSILON);
        }
    }

    #[test]
    fn heading_is_truncated_not_wrapped() {
        let fitted = fit_to_width(&"Long heading ".repeat(30), FontFace::Bold, 12.0, 50.0);
        assert!(fitted.ends_with("..."));
        assert!(FontFace::Bold.text_width(&fitted, 12.0) <= 50.0);
        assert_eq!(fit_to_width("Short", FontFace::Bold, 12.0, 50.0), "Short");
    }

    #[test]
    fn ensure_space_breaks_only_when_needed() {
        let mut engine = LayoutEngine::new(small_page(60.0)); // body 10..50
        assert!(!engine.ensure_space(40.0));
        engine.advance(30.0);
        assert!(!engine.ensure_space(10.0));
        assert!(engine.ensure_space(10.5));
        assert_eq!(engine.cursor(), Cursor { page_index: 1, y: 10.0 });
        assert_eq!(engine.pages().len(), 2);
    }

    #[test]
    fn oversized_block_at_page_top_does_not_loop() {
        let mut engine = LayoutEngine::new(small_page(60.0));
        assert!(!engine.ensure_space(100.0));
        assert_eq!(engine.pages().len(), 1);
    }

    #[test]
    fn advance_never_passes_body_bottom() {
        let mut engine = LayoutEngine::new(small_page(60.0));
        let cursor = engine.advance(500.0);
        assert_eq!(cursor.y, 50.0);
        assert_eq!(cursor.page_index, 0);
    }

    #[test]
    fn paragraph_splits_line_by_line() {
        let mut engine = LayoutEngine::new(small_page(60.0)); // 8 lines of 5mm per page
        let text = (1..=12).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let emitted = engine.place_paragraph(&text, &TextStyle::body());
        assert_eq!(emitted, 12);
        let pages = engine.pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].texts().count(), 8);
        assert_eq!(pages[1].texts().next(), Some("line 9"));
        assert_eq!(engine.cursor().y, 10.0 + 4.0 * 5.0);
    }

    #[test]
    fn status_color_is_scoped() {
        let mut engine = LayoutEngine::new(PageGeometry::A4);
        engine.place_status_line("late task", ColorTag::Warning, &TextStyle::body());
        assert_eq!(engine.color(), ColorTag::Neutral);
        engine.place_paragraph("next", &TextStyle::body());
        let colors: Vec<[u8; 3]> = engine.pages()[0]
            .elements
            .iter()
            .filter_map(|e| match e {
                PlacedElement::Text { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(colors, vec![ColorTag::Warning.rgb(), ColorTag::Neutral.rgb()]);
    }

    #[test]
    fn missing_pair_images_draw_placeholders_and_still_descend() {
        let mut engine = LayoutEngine::new(PageGeometry::A4);
        engine.advance(7.0);
        let before = engine.cursor().y;
        let after = engine.place_image_pair(None, None, 90.0, 50.0, 5.0);
        assert_eq!(after.y, before + 55.0);
        let page = &engine.pages()[0];
        assert_eq!(page.texts().filter(|t| *t == IMAGE_UNAVAILABLE).count(), 2);
        let boxes: Vec<Frame> = page
            .elements
            .iter()
            .filter(|e| matches!(e, PlacedElement::StrokeRect { .. }))
            .map(PlacedElement::frame)
            .collect();
        assert_eq!(boxes[0], Frame::new(10.0, before, 90.0, 50.0));
        assert_eq!(boxes[1], Frame::new(105.0, before, 90.0, 50.0));
    }

    #[test]
    fn fit_within_letterboxes() {
        let frame = Frame::new(0.0, 0.0, 90.0, 50.0);
        let wide = fit_within(frame, 0.25);
        assert_eq!((wide.width, wide.height), (90.0, 22.5));
        assert_eq!(wide.y, 13.75);
        let tall = fit_within(frame, 2.0);
        assert_eq!((tall.width, tall.height), (25.0, 50.0));
        assert_eq!(tall.x, 32.5);
    }

    #[test]
    fn banner_band_reaches_page_top() {
        let mut engine = LayoutEngine::new(PageGeometry::A4);
        let cursor = engine.place_banner(
            "WEEKLY REPORT: SALES",
            "Owner: Ana",
            &TextStyle::title(),
            &TextStyle::subtitle(),
        );
        assert_eq!(cursor.y, 30.0);
        match &engine.pages()[0].elements[0] {
            PlacedElement::FillRect { frame, .. } => {
                assert_eq!(*frame, Frame::new(0.0, 0.0, 210.0, 30.0));
            }
            other => panic!("expected band, got {other:?}"),
        }
    }
}
