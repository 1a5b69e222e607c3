/// Points to millimetres.
pub(crate) const PT_TO_MM: f32 = 25.4 / 72.0;

/// The two standard Type1 faces every report uses. Neither is embedded, so
/// widths come from the AFM tables below rather than a font file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
}

impl FontFace {
    pub(crate) const ALL: [FontFace; 2] = [FontFace::Regular, FontFace::Bold];

    /// Resource name inside the page dictionary.
    pub(crate) fn pdf_name(self) -> &'static [u8] {
        match self {
            FontFace::Regular => b"F1",
            FontFace::Bold => b"F2",
        }
    }

    pub(crate) fn base_font(self) -> &'static [u8] {
        match self {
            FontFace::Regular => b"Helvetica",
            FontFace::Bold => b"Helvetica-Bold",
        }
    }

    fn widths_1000(self) -> &'static [u16; 224] {
        match self {
            FontFace::Regular => &HELVETICA,
            FontFace::Bold => &HELVETICA_BOLD,
        }
    }

    /// Width of `text` in millimetres at `size_pt`.
    pub(crate) fn text_width(self, text: &str, size_pt: f32) -> f32 {
        let widths = self.widths_1000();
        let units: f32 = to_winansi_bytes(text)
            .iter()
            .filter(|&&b| b >= 32)
            .map(|&b| widths[(b - 32) as usize] as f32)
            .sum();
        units * size_pt / 1000.0 * PT_TO_MM
    }
}

/// Map a single Unicode char to its WinAnsi byte.
fn char_to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x0020..=0x007E => Some(c as u8),
        0x00A0..=0x00FF => Some(c as u8),
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95), // bullet
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Control characters are dropped; anything else outside the code page becomes `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter(|c| !c.is_control())
        .map(|c| char_to_winansi(c).unwrap_or(b'?'))
        .collect()
}

/// Helvetica AFM advance widths (1000 units/em), WinAnsi codes 32..=255.
#[rustfmt::skip]
static HELVETICA: [u16; 224] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,  // 0X20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,  // 0X30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,  // 0X40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,  // 0X50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,  // 0X60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 350,  // 0X70
    556, 350, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,  // 0X80
    350, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 350, 500, 667,  // 0X90
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,  // 0XA0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,  // 0XB0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,  // 0XC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,  // 0XD0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,  // 0XE0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,  // 0XF0
];

/// Helvetica-Bold AFM advance widths (1000 units/em), WinAnsi codes 32..=255.
#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 224] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,  // 0X20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,  // 0X30
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,  // 0X40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,  // 0X50
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,  // 0X60
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 350,  // 0X70
    556, 350, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 350, 611, 350,  // 0X80
    350, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 350, 500, 667,  // 0X90
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,  // 0XA0
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,  // 0XB0
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,  // 0XC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,  // 0XD0
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,  // 0XE0
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,  // 0XF0
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmappable_chars_become_question_marks() {
        assert_eq!(to_winansi_bytes("a€b"), vec![b'a', 0x80, b'b']);
        assert_eq!(to_winansi_bytes("日本"), b"??".to_vec());
        assert_eq!(to_winansi_bytes("é\n"), vec![0xE9]);
    }

    #[test]
    fn bold_is_never_narrower() {
        for text in ["Revenue", "WEEKLY REPORT", "0% 100%", "   "] {
            let regular = FontFace::Regular.text_width(text, 10.0);
            let bold = FontFace::Bold.text_width(text, 10.0);
            assert!(bold >= regular, "{text}: {bold} < {regular}");
        }
    }

    #[test]
    fn widths_match_afm_metrics() {
        let mm = |units: f32| units * 10.0 / 1000.0 * PT_TO_MM;
        let close = |a: f32, b: f32| (a - b).abs() < 1e-4;
        assert!(close(FontFace::Regular.text_width("100%", 10.0), mm(3.0 * 556.0 + 889.0)));
        assert!(close(FontFace::Regular.text_width("W", 10.0), mm(944.0)));
        assert!(close(FontFace::Regular.text_width("@&=?", 10.0), mm(1015.0 + 667.0 + 584.0 + 556.0)));
        assert!(close(FontFace::Regular.text_width("CDGO", 10.0), mm(722.0 + 722.0 + 778.0 + 778.0)));
        assert!(close(FontFace::Bold.text_width("Var", 10.0), mm(667.0 + 556.0 + 389.0)));
        assert!(close(FontFace::Bold.text_width("\u{e9}", 10.0), mm(556.0)));
    }

    #[test]
    fn width_scales_with_size() {
        let w10 = FontFace::Regular.text_width("status", 10.0);
        let w20 = FontFace::Regular.text_width("status", 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-4);
        // "mm" at 1000pt: 2 * 833 units = 1666pt
        let mm = FontFace::Regular.text_width("mm", 1000.0);
        assert!((mm - 1666.0 * PT_TO_MM).abs() < 0.01);
    }
}
