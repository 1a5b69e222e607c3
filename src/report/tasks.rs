use std::cmp::Ordering;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;
use crate::model::ColorTag;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(alias = "Not Started", alias = "not_started")]
    NotStarted,
    #[serde(alias = "In Progress", alias = "in_progress")]
    InProgress,
    #[serde(alias = "blocked")]
    Blocked,
    #[serde(alias = "done")]
    Done,
}

/// One row of the external task store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub area: String,
    pub project: String,
    pub task: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    pub status: TaskStatus,
    #[serde(default)]
    pub note: String,
}

/// Accepts `YYYY-MM-DD` or `DD/MM/YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

/// Malformed or missing dates deserialize to `None` instead of failing the whole store.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let parsed = raw.as_deref().and_then(parse_date);
    if parsed.is_none() && raw.as_deref().is_some_and(|r| !r.trim().is_empty()) {
        log::debug!("unparseable task date {raw:?}");
    }
    Ok(parsed)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Late,
    Done,
    InProgress,
}

impl TaskState {
    pub fn color(self) -> ColorTag {
        match self {
            TaskState::Late => ColorTag::Warning,
            TaskState::Done => ColorTag::Success,
            TaskState::InProgress => ColorTag::Neutral,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskState::Late => "LATE",
            TaskState::Done => "DONE",
            TaskState::InProgress => "IN PROGRESS",
        }
    }
}

/// Done wins over lateness; an open task past its end date is late.
pub fn classify(end_date: NaiveDate, status: TaskStatus, today: NaiveDate) -> TaskState {
    if status == TaskStatus::Done {
        TaskState::Done
    } else if end_date < today {
        TaskState::Late
    } else {
        TaskState::InProgress
    }
}

impl TaskRecord {
    /// `None` when the end date is missing or malformed.
    pub fn state(&self, today: NaiveDate) -> Option<TaskState> {
        self.end_date.map(|end| classify(end, self.status, today))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskFilter {
    pub area: Option<String>,
    pub project: Option<String>,
}

impl TaskFilter {
    pub fn project(area: &str, project: &str) -> Self {
        Self {
            area: Some(area.to_string()),
            project: Some(project.to_string()),
        }
    }

    pub fn matches(&self, record: &TaskRecord) -> bool {
        let field_matches = |wanted: &Option<String>, actual: &str| {
            wanted
                .as_deref()
                .is_none_or(|w| w.trim().eq_ignore_ascii_case(actual.trim()))
        };
        field_matches(&self.area, &record.area) && field_matches(&self.project, &record.project)
    }
}

/// Narrow read/write interface over wherever tasks are kept.
pub trait TaskStore {
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>, Error>;
    fn append_task(&mut self, record: TaskRecord) -> Result<(), Error>;
    fn replace_project_tasks(&mut self, project: &str, records: Vec<TaskRecord>) -> Result<(), Error>;
}

fn date_order(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order by start date, then end date, then task name. Undated rows sort last.
pub fn sort_tasks(records: &mut [TaskRecord]) {
    records.sort_by(|a, b| {
        date_order(a.start_date, b.start_date)
            .then_with(|| date_order(a.end_date, b.end_date))
            .then_with(|| a.task.cmp(&b.task))
    });
}

#[derive(Clone, Debug, Default)]
pub struct MemoryTaskStore {
    records: Vec<TaskRecord>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<TaskRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON array of task records.
    pub fn from_json_reader(reader: impl Read) -> Result<Self, Error> {
        let records: Vec<TaskRecord> = serde_json::from_reader(reader)?;
        Ok(Self { records })
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        let store = Self::from_json_reader(std::io::BufReader::new(file))?;
        log::info!("Loaded {} tasks from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl TaskStore for MemoryTaskStore {
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>, Error> {
        let mut matching: Vec<TaskRecord> = self
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_tasks(&mut matching);
        Ok(matching)
    }

    fn append_task(&mut self, record: TaskRecord) -> Result<(), Error> {
        if record.task.trim().is_empty() {
            return Err(Error::TaskStore("task name is required".into()));
        }
        self.records.push(record);
        Ok(())
    }

    fn replace_project_tasks(&mut self, project: &str, records: Vec<TaskRecord>) -> Result<(), Error> {
        if let Some(stray) = records.iter().find(|r| r.project != project) {
            return Err(Error::TaskStore(format!(
                "task '{}' belongs to project '{}', not '{}'",
                stray.task, stray.project, project
            )));
        }
        self.records.retain(|r| r.project != project);
        self.records.extend(records);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(project: &str, task: &str, start: Option<NaiveDate>) -> TaskRecord {
        TaskRecord {
            area: "Sales".into(),
            project: project.into(),
            task: task.into(),
            owner: "Ana".into(),
            start_date: start,
            end_date: start,
            status: TaskStatus::InProgress,
            note: String::new(),
        }
    }

    #[test]
    fn overdue_open_task_is_late() {
        let state = classify(date(2024, 1, 1), TaskStatus::InProgress, date(2024, 6, 1));
        assert_eq!(state, TaskState::Late);
        assert_eq!(state.color(), ColorTag::Warning);
    }

    #[test]
    fn done_beats_late() {
        let state = classify(date(2024, 1, 1), TaskStatus::Done, date(2024, 6, 1));
        assert_eq!(state, TaskState::Done);
    }

    #[test]
    fn due_today_is_not_late() {
        let today = date(2024, 6, 1);
        for status in [TaskStatus::NotStarted, TaskStatus::InProgress, TaskStatus::Blocked] {
            assert_eq!(classify(today, status, today), TaskState::InProgress);
            assert_eq!(classify(date(2024, 5, 31), status, today), TaskState::Late);
        }
    }

    #[test]
    fn classification_is_deterministic() {
        let (end, today) = (date(2024, 3, 3), date(2024, 3, 4));
        let first = classify(end, TaskStatus::Blocked, today);
        assert!((0..10).all(|_| classify(end, TaskStatus::Blocked, today) == first));
    }

    #[test]
    fn lenient_dates() {
        let json = r#"[
            {"area":"Sales","project":"CRM","task":"a","start_date":"2024-01-02","end_date":"05/02/2024","status":"Done"},
            {"area":"Sales","project":"CRM","task":"b","start_date":"soon","end_date":"","status":"In Progress"},
            {"area":"Sales","project":"CRM","task":"c","status":"NotStarted"}
        ]"#;
        let store = MemoryTaskStore::from_json_reader(json.as_bytes()).unwrap();
        let tasks = store.list_tasks(&TaskFilter::default()).unwrap();
        assert_eq!(tasks[0].start_date, Some(date(2024, 1, 2)));
        assert_eq!(tasks[0].end_date, Some(date(2024, 2, 5)));
        assert_eq!(tasks[1].start_date, None);
        assert_eq!(tasks[1].end_date, None);
        assert_eq!(tasks[1].status, TaskStatus::InProgress);
        assert_eq!(tasks[1].state(date(2024, 6, 1)), None);
        assert_eq!(tasks[2].owner, "");
    }

    #[test]
    fn list_filters_and_sorts() {
        let mut store = MemoryTaskStore::new();
        store.append_task(record("CRM", "later", Some(date(2024, 3, 1)))).unwrap();
        store.append_task(record("CRM", "undated", None)).unwrap();
        store.append_task(record("CRM", "earlier", Some(date(2024, 1, 1)))).unwrap();
        store.append_task(record("ERP", "other", Some(date(2023, 1, 1)))).unwrap();

        let tasks = store.list_tasks(&TaskFilter::project("sales", "crm")).unwrap();
        let names: Vec<&str> = tasks.iter().map(|t| t.task.as_str()).collect();
        assert_eq!(names, ["earlier", "later", "undated"]);
    }

    #[test]
    fn append_rejects_unnamed_task() {
        let mut store = MemoryTaskStore::new();
        let err = store.append_task(record("CRM", "  ", None)).unwrap_err();
        assert!(matches!(err, Error::TaskStore(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn replace_project_tasks_swaps_only_that_project() {
        let mut store = MemoryTaskStore::from_records(vec![
            record("CRM", "old", None),
            record("ERP", "keep", None),
        ]);
        store
            .replace_project_tasks("CRM", vec![record("CRM", "new", None)])
            .unwrap();
        let names: Vec<String> = store
            .list_tasks(&TaskFilter::default())
            .unwrap()
            .into_iter()
            .map(|t| t.task)
            .collect();
        assert_eq!(names, ["keep", "new"]);

        let err = store
            .replace_project_tasks("CRM", vec![record("ERP", "stray", None)])
            .unwrap_err();
        assert!(matches!(err, Error::TaskStore(_)));
        assert_eq!(store.len(), 2);
    }
}
