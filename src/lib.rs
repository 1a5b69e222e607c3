mod error;
mod fonts;
pub mod model;
pub mod pdf;
pub mod raster;
pub mod report;

pub use error::Error;
pub use fonts::FontFace;
pub use model::{Block, ColorTag, Document, ImageData, PageGeometry, Section, Table, TextStyle};
pub use report::form::ReportForm;
pub use report::tasks::{MemoryTaskStore, TaskFilter, TaskRecord, TaskState, TaskStatus, TaskStore};
pub use report::{
    KpiCategory, KpiRow, ProjectHighlight, ReportInput, ReportSettings, Summary, build_document,
    report_file_name,
};

use std::path::Path;
use std::time::Instant;

use chrono::NaiveDate;

/// Build and render one report with the default A4 settings.
pub fn generate_report(
    input: &ReportInput,
    store: &dyn TaskStore,
    today: NaiveDate,
) -> Result<Vec<u8>, Error> {
    generate_report_with(input, store, today, &ReportSettings::default())
}

pub fn generate_report_with(
    input: &ReportInput,
    store: &dyn TaskStore,
    today: NaiveDate,
    settings: &ReportSettings,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let doc = report::build_document(input, store, today, settings)?;
    let t_build = t0.elapsed();

    let bytes = pdf::render(&doc, settings.geometry);
    let t_total = t0.elapsed();

    log::info!(
        "Timing: build={:.1}ms, render={:.1}ms, total={:.1}ms (output {} bytes)",
        t_build.as_secs_f64() * 1000.0,
        (t_total - t_build).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(bytes)
}

pub fn generate_report_to_file(
    input: &ReportInput,
    store: &dyn TaskStore,
    today: NaiveDate,
    output: &Path,
) -> Result<(), Error> {
    let bytes = generate_report(input, store, today)?;
    std::fs::write(output, &bytes).map_err(Error::Io)?;
    log::info!("Wrote {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}
