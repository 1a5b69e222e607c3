#![allow(dead_code)]

use std::io::Cursor;

use chrono::NaiveDate;
use image::{ImageFormat, Rgba, RgbaImage};

use weekly_report_pdf::{ImageData, ProjectHighlight, ReportInput};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Solid-colour PNG of the given size.
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn upload(label: &str, width: u32, height: u32) -> ImageData {
    ImageData {
        label: label.into(),
        bytes: png_bytes(width, height, [40, 90, 200, 255]),
    }
}

/// Number of page objects in a serialised PDF. Content streams are
/// compressed, so only the page dictionaries match.
pub fn page_count(pdf: &[u8]) -> usize {
    let needle = b"/Type /Page";
    pdf.windows(needle.len() + 1)
        .filter(|w| &w[..needle.len()] == needle && w[needle.len()] != b's')
        .count()
}

pub fn sample_input() -> ReportInput {
    let mut input = ReportInput::new("Sales", date(2025, 1, 13));
    input.owner = "Ana Souza".into();
    input.summary.win = "Closed the distributor contract.".into();
    input.summary.risk = "Stock shortage in the south region.".into();
    input.summary.decision = "Approve the extra shipment.".into();
    input.projects = vec![ProjectHighlight {
        name: "CRM rollout".into(),
        status: "Pilot running with two teams".into(),
        images: vec![upload("before.png", 64, 48), upload("after.png", 48, 64)],
    }];
    input.agenda = "Finish the pilot review.\nPlan the regional training.".into();
    input
}
