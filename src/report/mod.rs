pub mod form;
pub mod tasks;

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::fonts::FontFace;
use crate::model::{
    Alignment, Block, ColorTag, Document, ImageData, PageGeometry, Section, Table, TableStyle,
    TextStyle,
};

use tasks::{TaskFilter, TaskRecord, TaskStore};

#[derive(Clone, Debug, Default)]
pub struct Summary {
    pub win: String,
    pub risk: String,
    pub decision: String,
}

#[derive(Clone, Debug, Default)]
pub struct ProjectHighlight {
    pub name: String,
    pub status: String,
    pub images: Vec<ImageData>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiRow {
    pub indicator: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub actual: String,
    #[serde(default)]
    pub variance: String,
}

impl KpiRow {
    pub fn new(indicator: &str, target: &str, actual: &str, variance: &str) -> Self {
        Self {
            indicator: indicator.into(),
            target: target.into(),
            actual: actual.into(),
            variance: variance.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiCategory {
    #[serde(default)]
    pub name: String,
    pub rows: Vec<KpiRow>,
}

/// The KPI table a fresh form starts with.
pub fn default_kpis() -> Vec<KpiCategory> {
    let rows = ["Revenue", "Leads/Sales", "Operational", "Other"]
        .into_iter()
        .map(|indicator| KpiRow::new(indicator, "-", "-", "0%"))
        .collect();
    vec![KpiCategory {
        name: String::new(),
        rows,
    }]
}

/// Everything one report is generated from. Assembled once per request.
#[derive(Clone, Debug)]
pub struct ReportInput {
    pub area: String,
    pub owner: String,
    /// Monday of the analysed week.
    pub week_start: NaiveDate,
    pub summary: Summary,
    pub overview_image: Option<ImageData>,
    pub projects: Vec<ProjectHighlight>,
    pub kpis: Vec<KpiCategory>,
    pub agenda: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start.format("%d/%m"), self.end.format("%d/%m"))
    }
}

impl ReportInput {
    pub fn new(area: impl Into<String>, week_start: NaiveDate) -> Self {
        Self {
            area: area.into(),
            owner: String::new(),
            week_start,
            summary: Summary::default(),
            overview_image: None,
            projects: Vec::new(),
            kpis: default_kpis(),
            agenda: String::new(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.area.trim().is_empty() {
            return Err(Error::MissingField("area"));
        }
        Ok(())
    }

    /// Monday to Friday of the analysed week.
    pub fn analysed_period(&self) -> Period {
        Period {
            start: self.week_start,
            end: self.week_start + Days::new(4),
        }
    }

    /// Monday to Friday of the following week.
    pub fn planned_period(&self) -> Period {
        let start = self.week_start + Days::new(7);
        Period {
            start,
            end: start + Days::new(4),
        }
    }
}

/// Layout knobs for one report; `Default` is the A4 report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportSettings {
    pub geometry: PageGeometry,
    pub single_image_width: f32,
    pub pair_box_width: f32,
    pub pair_box_height: f32,
    pub include_task_status: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::A4,
            single_image_width: 170.0,
            pair_box_width: 90.0,
            pair_box_height: 50.0,
            include_task_status: true,
        }
    }
}

pub fn report_file_name(input: &ReportInput) -> String {
    let area: String = input
        .area
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("Report_{}_{}.pdf", area, input.week_start.format("%Y-%m-%d"))
}

fn section_title() -> TextStyle {
    TextStyle::new(FontFace::Bold, 14.0, 10.0)
}

fn project_heading() -> TextStyle {
    TextStyle::new(FontFace::Bold, 12.0, 8.0)
}

fn kpi_table(category: &KpiCategory) -> Table {
    Table {
        header: ["Indicator", "Target", "Actual", "Var"]
            .into_iter()
            .map(String::from)
            .collect(),
        rows: category
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.indicator.clone(),
                    r.target.clone(),
                    r.actual.clone(),
                    r.variance.clone(),
                ]
            })
            .collect(),
        col_widths: vec![60.0, 40.0, 40.0, 40.0],
        col_alignments: vec![
            Alignment::Left,
            Alignment::Center,
            Alignment::Center,
            Alignment::Center,
        ],
        style: TableStyle::default(),
    }
}

/// One status line per task, coloured by its state on `today`.
pub fn task_status_line(record: &TaskRecord, today: NaiveDate) -> Block {
    let due = record
        .end_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "?".into());
    let state = record.state(today);
    let mut text = match state {
        Some(state) => format!("[{}] {}", state.label(), record.task),
        None => format!("[UNKNOWN] {}", record.task),
    };
    if !record.owner.trim().is_empty() {
        text.push_str(&format!(" - {}", record.owner.trim()));
    }
    text.push_str(&format!(" - due {due}"));
    if !record.note.trim().is_empty() {
        text.push_str(&format!(" ({})", record.note.trim()));
    }
    if record.end_date.is_none() {
        text.push_str(" (no valid end date)");
    }
    let color = state.map(|s| s.color()).unwrap_or(ColorTag::Neutral);
    Block::StatusLine { text, color }
}

fn push_images(doc: &mut Document, section: Section, images: &[ImageData], settings: &ReportSettings) {
    for chunk in images.chunks(2) {
        let block = match chunk {
            [left, right] => Block::SideBySideImages {
                left: left.clone(),
                right: right.clone(),
                box_width: settings.pair_box_width,
                box_height: settings.pair_box_height,
            },
            [single] => Block::Image {
                image: single.clone(),
                width: settings.single_image_width,
            },
            _ => continue,
        };
        doc.push(section, block);
    }
}

/// Build the ordered block list for one report. Fails before any layout when
/// a required field is missing.
pub fn build_document(
    input: &ReportInput,
    store: &dyn TaskStore,
    today: NaiveDate,
    settings: &ReportSettings,
) -> Result<Document, Error> {
    input.validate()?;
    let area = input.area.trim();
    let mut doc = Document::new(format!("Weekly report: {area}"));

    doc.push(
        Section::Header,
        Block::Banner {
            title: format!("WEEKLY REPORT: {}", area.to_uppercase()),
            subtitle: format!(
                "Owner: {} | Period: {}",
                input.owner.trim(),
                input.analysed_period()
            ),
        },
    );
    doc.push(Section::Header, Block::Spacer(5.0));

    doc.push(
        Section::Summary,
        Block::Heading {
            text: "1. EXECUTIVE SUMMARY".into(),
            style: TextStyle::section_heading(),
        },
    );
    doc.push(
        Section::Summary,
        Block::Paragraph {
            text: format!(
                "Win: {}\n\nRisk: {}\n\nDecision: {}",
                input.summary.win.trim(),
                input.summary.risk.trim(),
                input.summary.decision.trim()
            ),
            style: TextStyle::body(),
        },
    );
    doc.push(Section::Summary, Block::Spacer(5.0));

    doc.push(
        Section::Kpi,
        Block::Heading {
            text: "2. INDICATORS".into(),
            style: TextStyle::section_heading(),
        },
    );
    for category in &input.kpis {
        if !category.name.trim().is_empty() {
            doc.push(
                Section::Kpi,
                Block::Heading {
                    text: category.name.trim().to_string(),
                    style: TextStyle::subheading(),
                },
            );
        }
        doc.push(Section::Kpi, Block::Table(kpi_table(category)));
        doc.push(Section::Kpi, Block::Spacer(5.0));
    }

    doc.push(Section::Kpi, Block::PageBreak);
    doc.push(
        Section::ProjectDetail(0),
        Block::Heading {
            text: "3. PROJECTS AND EVIDENCE".into(),
            style: section_title(),
        },
    );
    if let Some(overview) = &input.overview_image {
        doc.push(Section::ProjectDetail(0), Block::Spacer(2.0));
        doc.push(
            Section::ProjectDetail(0),
            Block::Heading {
                text: "Overview".into(),
                style: TextStyle::subheading(),
            },
        );
        push_images(&mut doc, Section::ProjectDetail(0), std::slice::from_ref(overview), settings);
    }

    for (k, project) in input.projects.iter().enumerate() {
        let name = project.name.trim();
        if name.is_empty() {
            log::debug!("skipping project highlight {k} without a name");
            continue;
        }
        let section = Section::ProjectDetail(k + 1);
        doc.push(section, Block::Spacer(5.0));
        doc.push(
            section,
            Block::Heading {
                text: format!("Project: {name}"),
                style: project_heading(),
            },
        );
        doc.push(
            section,
            Block::Paragraph {
                text: format!("Status: {}", project.status.trim()),
                style: TextStyle::body(),
            },
        );

        if settings.include_task_status {
            let tasks = store.list_tasks(&TaskFilter::project(area, name))?;
            log::debug!("project '{name}': {} tasks", tasks.len());
            for record in &tasks {
                doc.push(section, task_status_line(record, today));
            }
        }

        if !project.images.is_empty() {
            doc.push(section, Block::Spacer(2.0));
            push_images(&mut doc, section, &project.images, settings);
        }
    }

    doc.push(Section::Agenda, Block::PageBreak);
    doc.push(
        Section::Agenda,
        Block::Heading {
            text: "4. AGENDA / NEXT STEPS".into(),
            style: TextStyle::section_heading(),
        },
    );
    doc.push(
        Section::Agenda,
        Block::Paragraph {
            text: format!("Planned week: {}", input.planned_period()),
            style: TextStyle::body(),
        },
    );
    doc.push(
        Section::Agenda,
        Block::Paragraph {
            text: input.agenda.clone(),
            style: TextStyle::body(),
        },
    );

    Ok(doc)
}
