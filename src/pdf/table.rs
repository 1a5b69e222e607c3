use crate::fonts::FontFace;
use crate::model::{PageGeometry, Table, TextStyle};

use super::layout::{Cursor, Frame, LayoutEngine, PlacedElement, wrap_text};

/// Column widths scaled to the content width when the table is wider than it.
/// A table without widths splits the content width evenly.
fn resolve_col_widths(table: &Table, content_width: f32) -> Vec<f32> {
    if table.col_widths.is_empty() {
        let ncols = table
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(table.header.len()))
            .max()
            .unwrap_or(0);
        if ncols == 0 {
            return Vec::new();
        }
        return vec![content_width / ncols as f32; ncols];
    }

    let total = table.total_width();
    if total > content_width && total > 0.0 {
        let scale = content_width / total;
        table.col_widths.iter().map(|w| w * scale).collect()
    } else {
        table.col_widths.clone()
    }
}

struct RowLayout {
    height: f32,
    cell_lines: Vec<Vec<String>>,
}

fn layout_row(cells: &[String], col_widths: &[f32], table: &Table, face: FontFace) -> RowLayout {
    let style = &table.style;
    if cells.len() > col_widths.len() {
        log::debug!(
            "TABLE row has {} cells for {} columns; extra cells dropped",
            cells.len(),
            col_widths.len()
        );
    }
    let cell_lines: Vec<Vec<String>> = col_widths
        .iter()
        .enumerate()
        .map(|(col, w)| {
            let text = cells.get(col).map(String::as_str).unwrap_or("");
            let text_w = (w - 2.0 * style.cell_padding).max(0.0);
            wrap_text(text, face, style.font_size, text_w)
        })
        .collect();
    let max_lines = cell_lines.iter().map(Vec::len).max().unwrap_or(0);
    let content_h = max_lines as f32 * style.line_height + 2.0 * style.cell_padding;
    RowLayout {
        height: content_h.max(style.min_row_height),
        cell_lines,
    }
}

fn row_layouts(table: &Table, col_widths: &[f32]) -> (Option<RowLayout>, Vec<RowLayout>) {
    let header = (!table.header.is_empty())
        .then(|| layout_row(&table.header, col_widths, table, FontFace::Bold));
    let rows = table
        .rows
        .iter()
        .map(|row| layout_row(row, col_widths, table, FontFace::Regular))
        .collect();
    (header, rows)
}

/// Unsplit height of the whole table at `content_width`.
pub(crate) fn table_height(table: &Table, content_width: f32) -> f32 {
    let col_widths = resolve_col_widths(table, content_width);
    let (header, rows) = row_layouts(table, &col_widths);
    header.iter().chain(rows.iter()).map(|r| r.height).sum()
}

impl LayoutEngine {
    /// Header once, then one atomic row at a time. The header is not repeated
    /// on pages the table continues onto.
    pub fn place_table(&mut self, table: &Table) -> Cursor {
        let geometry: PageGeometry = *self.geometry();
        let col_widths = resolve_col_widths(table, geometry.content_width());
        if col_widths.is_empty() {
            return self.cursor();
        }
        let (header, rows) = row_layouts(table, &col_widths);

        if let Some(header) = header {
            self.place_row(table, &col_widths, &header, FontFace::Bold, true, 0);
        }
        for (ri, layout) in rows.iter().enumerate() {
            self.place_row(table, &col_widths, layout, FontFace::Regular, false, ri + 1);
        }
        self.cursor()
    }

    fn place_row(
        &mut self,
        table: &Table,
        col_widths: &[f32],
        layout: &RowLayout,
        face: FontFace,
        is_header: bool,
        ri: usize,
    ) {
        let broke = self.ensure_space(layout.height);
        let row_h = self.clip_height(layout.height);
        let row_top = self.cursor().y;
        log::debug!(
            "TABLE row={} row_h={:.2} page={} row_top={:.2} break={}",
            ri,
            row_h,
            self.cursor().page_index + 1,
            row_top,
            broke
        );

        let style = &table.style;
        let visible_lines = if row_h < layout.height {
            ((row_h - 2.0 * style.cell_padding) / style.line_height).floor().max(0.0) as usize
        } else {
            usize::MAX
        };

        let mut cell_x = self.geometry().margin;
        for (col, (w, lines)) in col_widths.iter().zip(layout.cell_lines.iter()).enumerate() {
            let frame = Frame::new(cell_x, row_top, *w, row_h);
            if is_header {
                self.push(PlacedElement::FillRect {
                    frame,
                    color: style.header_fill,
                });
            }
            self.push(PlacedElement::StrokeRect { frame });

            let shown = lines.len().min(visible_lines);
            let text_style =
                TextStyle::new(face, style.font_size, style.line_height).aligned(table.alignment(col));
            let content_h = shown as f32 * style.line_height;
            let first_y = row_top + ((row_h - content_h) / 2.0).max(0.0);
            for (li, line) in lines.iter().take(shown).enumerate() {
                let line_frame = Frame::new(
                    cell_x + style.cell_padding,
                    first_y + li as f32 * style.line_height,
                    (w - 2.0 * style.cell_padding).max(0.0),
                    style.line_height,
                );
                self.push_text(line.clone(), &text_style, line_frame);
            }
            cell_x += w;
        }
        self.descend(row_h);
    }
}
