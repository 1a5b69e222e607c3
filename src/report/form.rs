use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Error;
use crate::model::ImageData;

use super::{KpiCategory, ProjectHighlight, ReportInput, Summary, default_kpis};

/// On-disk form: the same fields as [`ReportInput`], with uploads given as
/// paths relative to the form file.
#[derive(Clone, Debug, Deserialize)]
pub struct ReportForm {
    pub area: String,
    #[serde(default)]
    pub owner: String,
    pub week_start: NaiveDate,
    #[serde(default)]
    pub win: String,
    #[serde(default)]
    pub risk: String,
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub overview_image: Option<PathBuf>,
    #[serde(default)]
    pub projects: Vec<ProjectForm>,
    #[serde(default)]
    pub kpis: Vec<KpiCategory>,
    #[serde(default)]
    pub agenda: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProjectForm {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub images: Vec<PathBuf>,
}

/// An unreadable upload keeps its slot with no bytes; the renderer then
/// prints a placeholder instead of failing the report.
fn read_upload(base_dir: &Path, path: &Path) -> ImageData {
    let full = base_dir.join(path);
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = std::fs::read(&full).unwrap_or_else(|e| {
        log::warn!("cannot read image {}: {e}", full.display());
        Vec::new()
    });
    ImageData { label, bytes }
}

impl ReportForm {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_input(self, base_dir: &Path) -> ReportInput {
        let projects = self
            .projects
            .into_iter()
            .map(|p| ProjectHighlight {
                images: p.images.iter().map(|img| read_upload(base_dir, img)).collect(),
                name: p.name,
                status: p.status,
            })
            .collect();
        ReportInput {
            area: self.area,
            owner: self.owner,
            week_start: self.week_start,
            summary: Summary {
                win: self.win,
                risk: self.risk,
                decision: self.decision,
            },
            overview_image: self
                .overview_image
                .as_deref()
                .map(|p| read_upload(base_dir, p)),
            projects,
            kpis: if self.kpis.is_empty() {
                default_kpis()
            } else {
                self.kpis
            },
            agenda: self.agenda,
        }
    }

    /// Read a form file and resolve its uploads next to it.
    pub fn load(path: &Path) -> Result<ReportInput, Error> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        let form = Self::from_json(&json)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Ok(form.into_input(base_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_form_gets_defaults() {
        let form = ReportForm::from_json(r#"{"area": "Sales", "week_start": "2025-01-13"}"#).unwrap();
        let input = form.into_input(Path::new("."));
        assert_eq!(input.area, "Sales");
        assert_eq!(input.kpis, default_kpis());
        assert!(input.projects.is_empty());
        assert!(input.overview_image.is_none());
    }

    #[test]
    fn missing_upload_becomes_empty_image() {
        let form = ReportForm::from_json(
            r#"{
                "area": "Ops",
                "week_start": "2025-01-13",
                "projects": [{"name": "CRM", "images": ["does-not-exist.png"]}]
            }"#,
        )
        .unwrap();
        let input = form.into_input(Path::new("/nonexistent-dir"));
        let image = &input.projects[0].images[0];
        assert_eq!(image.label, "does-not-exist.png");
        assert!(image.bytes.is_empty());
    }

    #[test]
    fn bad_date_is_a_json_error() {
        let err = ReportForm::from_json(r#"{"area": "Ops", "week_start": "next monday"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
