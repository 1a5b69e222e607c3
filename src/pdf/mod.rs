mod layout;
mod table;

use std::time::Instant;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::fonts::{FontFace, PT_TO_MM, to_winansi_bytes};
use crate::model::{Alignment, Block, ColorTag, Document, ImageData, PageGeometry, TextStyle};
use crate::raster::{self, RasterImage};

pub use layout::{ColorScope, Cursor, Frame, LayoutEngine, Page, PlacedElement};
pub(crate) use layout::{BANNER_PADDING, wrap_text};
pub(crate) use table::table_height;

/// Space kept below (and between) images.
pub const IMAGE_GUTTER: f32 = 5.0;

const PRODUCER: &str = concat!("weekly-report-pdf ", env!("CARGO_PKG_VERSION"));

fn block_kind(block: &Block) -> &'static str {
    match block {
        Block::Banner { .. } => "banner",
        Block::Heading { .. } => "heading",
        Block::Paragraph { .. } => "paragraph",
        Block::Table(_) => "table",
        Block::Image { .. } => "image",
        Block::SideBySideImages { .. } => "image_pair",
        Block::StatusLine { .. } => "status",
        Block::Spacer(_) => "spacer",
        Block::PageBreak => "page_break",
    }
}

fn decode(image: &ImageData) -> Option<RasterImage> {
    match raster::normalize(&image.bytes) {
        Ok(raster) => Some(raster),
        Err(e) => {
            log::warn!("image '{}' unavailable: {e}", image.label);
            None
        }
    }
}

fn image_unavailable(engine: &mut LayoutEngine, labels: &[&str]) {
    let text = format!("[image unavailable: {}]", labels.join(", "));
    engine.place_status_line(&text, ColorTag::Warning, &TextStyle::body());
}

fn place_block(engine: &mut LayoutEngine, block: &Block) {
    match block {
        Block::Banner { title, subtitle } => {
            engine.place_banner(title, subtitle, &TextStyle::title(), &TextStyle::subtitle());
        }
        Block::Heading { text, style } => {
            engine.place_heading(text, style);
        }
        Block::Paragraph { text, style } => {
            engine.place_paragraph(text, style);
        }
        Block::Table(table) => {
            engine.place_table(table);
        }
        Block::Image { image, width } => match decode(image) {
            Some(raster) => {
                engine.place_image(raster, *width, IMAGE_GUTTER);
            }
            None => image_unavailable(engine, &[&image.label]),
        },
        Block::SideBySideImages {
            left,
            right,
            box_width,
            box_height,
        } => {
            let (l, r) = (decode(left), decode(right));
            if l.is_none() && r.is_none() {
                image_unavailable(engine, &[&left.label, &right.label]);
            } else {
                engine.place_image_pair(l, r, *box_width, *box_height, IMAGE_GUTTER);
            }
        }
        Block::StatusLine { text, color } => {
            engine.place_status_line(text, *color, &TextStyle::body());
        }
        Block::Spacer(height) => {
            engine.advance(*height);
        }
        Block::PageBreak => engine.force_page_break(),
    }
}

/// Lay out every block in order. Always yields at least one page.
pub fn paginate(doc: &Document, geometry: PageGeometry) -> Vec<Page> {
    let mut engine = LayoutEngine::new(geometry);
    let width = geometry.content_width();
    for (idx, entry) in doc.blocks.iter().enumerate() {
        let before = engine.cursor();
        place_block(&mut engine, &entry.block);
        let after = engine.cursor();
        log::debug!(
            "BLOCK {} {:?} {} need={:?} page={}→{} y={:.2}→{:.2}",
            idx,
            entry.section,
            block_kind(&entry.block),
            entry.block.intrinsic_height(width, IMAGE_GUTTER),
            before.page_index + 1,
            after.page_index + 1,
            before.y,
            after.y
        );
    }
    engine.into_pages()
}

pub fn render(doc: &Document, geometry: PageGeometry) -> Vec<u8> {
    let t0 = Instant::now();
    let pages = paginate(doc, geometry);
    let t_layout = t0.elapsed();

    let bytes = write_pdf(pages, &doc.title);
    let t_total = t0.elapsed();

    log::info!(
        "Render phases: layout={:.1}ms, serialize={:.1}ms ({} blocks, {} bytes)",
        t_layout.as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        doc.len(),
        bytes.len(),
    );
    bytes
}

const MM_TO_PT: f32 = 1.0 / PT_TO_MM;

/// Page-space converter: millimetres top-down to points bottom-up.
struct PageSpace {
    height_mm: f32,
}

impl PageSpace {
    fn x(&self, mm: f32) -> f32 {
        mm * MM_TO_PT
    }

    fn y(&self, mm: f32) -> f32 {
        (self.height_mm - mm) * MM_TO_PT
    }

    /// PDF rect (x, y of the lower-left corner, w, h) for a top-down frame.
    fn rect(&self, frame: &Frame) -> (f32, f32, f32, f32) {
        (
            self.x(frame.x),
            self.y(frame.bottom()),
            frame.width * MM_TO_PT,
            frame.height * MM_TO_PT,
        )
    }
}

fn set_fill(content: &mut Content, current: &mut Option<[u8; 3]>, color: [u8; 3]) {
    if *current != Some(color) {
        let [r, g, b] = color;
        content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        *current = Some(color);
    }
}

fn write_pdf(pages: Vec<Page>, title: &str) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    let font_refs: Vec<(FontFace, Ref)> = FontFace::ALL
        .iter()
        .map(|&face| {
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(face.base_font()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            (face, font_ref)
        })
        .collect();

    let page_ids: Vec<Ref> = (0..pages.len()).map(|_| alloc()).collect();
    let mut image_count = 0usize;

    for (page, &page_id) in pages.into_iter().zip(page_ids.iter()) {
        let content_id = alloc();
        let space = PageSpace {
            height_mm: page.height,
        };
        let mut content = Content::new();
        let mut current_fill: Option<[u8; 3]> = None;
        let mut xobjects: Vec<(String, Ref)> = Vec::new();

        for element in page.elements {
            match element {
                PlacedElement::Text {
                    frame,
                    text,
                    face,
                    size,
                    color,
                    alignment,
                } => {
                    let text_w = face.text_width(&text, size);
                    let x = match alignment {
                        Alignment::Left => frame.x,
                        Alignment::Center => frame.x + (frame.width - text_w) / 2.0,
                        Alignment::Right => frame.x + frame.width - text_w,
                    };
                    let baseline = frame.y + 0.5 * frame.height + 0.3 * size * PT_TO_MM;
                    set_fill(&mut content, &mut current_fill, color);
                    content
                        .begin_text()
                        .set_font(Name(face.pdf_name()), size)
                        .next_line(space.x(x), space.y(baseline))
                        .show(Str(&to_winansi_bytes(&text)))
                        .end_text();
                }
                PlacedElement::FillRect { frame, color } => {
                    let (x, y, w, h) = space.rect(&frame);
                    set_fill(&mut content, &mut current_fill, color);
                    content.rect(x, y, w, h).fill_nonzero();
                }
                PlacedElement::StrokeRect { frame } => {
                    let (x, y, w, h) = space.rect(&frame);
                    content.save_state();
                    content.set_line_width(0.2 * MM_TO_PT);
                    content.set_stroke_gray(0.0);
                    content.rect(x, y, w, h).stroke();
                    content.restore_state();
                }
                PlacedElement::Image { drawn, image, .. } => {
                    let xobj_ref = alloc();
                    image_count += 1;
                    let name = format!("Im{image_count}");
                    {
                        let mut xobj = pdf.image_xobject(xobj_ref, image.data());
                        xobj.filter(Filter::DctDecode);
                        xobj.width(image.pixel_width() as i32);
                        xobj.height(image.pixel_height() as i32);
                        xobj.color_space().device_rgb();
                        xobj.bits_per_component(8);
                    }
                    let (x, y, w, h) = space.rect(&drawn);
                    content.save_state();
                    content.transform([w, 0.0, 0.0, h, x, y]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                    xobjects.push((name, xobj_ref));
                }
            }
        }

        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_id, &compressed).filter(Filter::FlateDecode);

        let mut pdf_page = pdf.page(page_id);
        pdf_page
            .media_box(Rect::new(
                0.0,
                0.0,
                page.width * MM_TO_PT,
                page.height * MM_TO_PT,
            ))
            .parent(pages_id)
            .contents(content_id);
        let mut resources = pdf_page.resources();
        {
            let mut fonts = resources.fonts();
            for (face, font_ref) in &font_refs {
                fonts.pair(Name(face.pdf_name()), *font_ref);
            }
        }
        if !xobjects.is_empty() {
            let mut xobject_dict = resources.x_objects();
            for (name, xobj_ref) in &xobjects {
                xobject_dict.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);
    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr(PRODUCER));

    pdf.finish()
}
