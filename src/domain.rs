use std::{fmt, str::FromStr};

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::TITLE_MAX_CHARS;

const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    #[error("invalid {field} timestamp `{value}`")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// A note record that could not be turned back into a [`Note`].
///
/// `index` is the zero-based position of the record inside the `notes` array.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("note at index {index} is malformed: {source}")]
pub struct MalformedRecordError {
    pub index: usize,
    pub source: DomainError,
}

/// Rejections for user-submitted titles. The model itself only truncates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("title cannot exceed {max} characters")]
    TitleTooLong { max: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, ValueEnum)]
pub enum Category {
    Work,
    Home,
    Health,
    People,
    Documents,
    Finance,
    #[default]
    Misc,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Work,
        Category::Home,
        Category::Health,
        Category::People,
        Category::Documents,
        Category::Finance,
        Category::Misc,
    ];

    /// Display string, also the stored form in the notes file.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Home => "Home",
            Category::Health => "Health & Sport",
            Category::People => "People",
            Category::Documents => "Documents",
            Category::Finance => "Finance",
            Category::Misc => "Misc",
        }
    }

    /// Name used by notes files from the earlier desktop app. Accepted on load,
    /// never written.
    pub fn legacy_name(self) -> &'static str {
        match self {
            Category::Work => "Работа",
            Category::Home => "Дом",
            Category::Health => "Здоровье и Спорт",
            Category::People => "Люди",
            Category::Documents => "Документы",
            Category::Finance => "Финансы",
            Category::Misc => "Разное",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s || category.legacy_name() == s)
            .ok_or_else(|| DomainError::UnknownCategory(s.to_string()))
    }
}

pub fn truncate_title(title: &str) -> String {
    title.chars().take(TITLE_MAX_CHARS).collect()
}

/// Boundary check for titles typed by a user: trims surrounding whitespace and
/// rejects empty or over-long input instead of truncating it.
pub fn validate_title(raw: &str) -> Result<&str, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong {
            max: TITLE_MAX_CHARS,
        });
    }
    Ok(title)
}

/// Replacement values for [`Note::update`]. `None` and empty strings keep the
/// current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub category: Option<Category>,
    pub content: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    title: String,
    category: Category,
    content: String,
    created_at: DateTime<Local>,
    updated_at: DateTime<Local>,
}

impl Note {
    pub fn new(title: &str, category: Category, content: impl Into<String>) -> Self {
        Self::new_at(title, category, content, Local::now())
    }

    pub fn new_at(
        title: &str,
        category: Category,
        content: impl Into<String>,
        now: DateTime<Local>,
    ) -> Self {
        Self {
            title: truncate_title(title),
            category,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Local> {
        self.updated_at
    }

    /// Applies `changes` and refreshes `updated_at`, even when nothing changed.
    pub fn update(&mut self, changes: NoteChanges) {
        self.update_at(changes, Local::now());
    }

    pub fn update_at(&mut self, changes: NoteChanges, now: DateTime<Local>) {
        if let Some(title) = changes.title.filter(|title| !title.is_empty()) {
            self.title = truncate_title(&title);
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        if let Some(content) = changes.content.filter(|content| !content.is_empty()) {
            self.content = content;
        }
        // wall clock may step backwards
        self.updated_at = now.max(self.created_at);
    }

    pub fn to_record(&self) -> NoteRecord {
        NoteRecord {
            title: self.title.clone(),
            category: self.category.to_string(),
            content: self.content.clone(),
            created_at: format_timestamp(self.created_at),
            updated_at: format_timestamp(self.updated_at),
        }
    }

    pub fn from_record(record: NoteRecord) -> Result<Self, DomainError> {
        let category = record.category.parse()?;
        let created_at = parse_timestamp("created_at", &record.created_at)?;
        let updated_at = parse_timestamp("updated_at", &record.updated_at)?;

        Ok(Self {
            title: truncate_title(&record.title),
            category,
            content: record.content,
            created_at,
            updated_at: updated_at.max(created_at),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub title: String,
    pub category: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub notes: Vec<NoteRecord>,
}

/// Ordered note collection. Positions are both display order and the
/// addressing scheme for removal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Project {
    notes: Vec<Note>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Removes the note at `index`; out-of-range indices leave the project
    /// untouched and return `None`.
    pub fn remove_at(&mut self, index: usize) -> Option<Note> {
        (index < self.notes.len()).then(|| self.notes.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Note> {
        self.notes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn to_record(&self) -> ProjectRecord {
        ProjectRecord {
            notes: self.notes.iter().map(Note::to_record).collect(),
        }
    }

    pub fn from_record(record: ProjectRecord) -> Result<Self, MalformedRecordError> {
        let notes = record
            .notes
            .into_iter()
            .enumerate()
            .map(|(index, note)| {
                Note::from_record(note).map_err(|source| MalformedRecordError { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { notes })
    }
}

fn format_timestamp(timestamp: DateTime<Local>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Local>, DomainError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Local));
    }

    // offset-less ISO-8601 is read as local time
    NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .ok_or_else(|| DomainError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use chrono::Duration as ChronoDuration;

    use super::*;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 14, 9, 26, 53).unwrap()
    }

    fn titles(project: &Project) -> Vec<&str> {
        project.iter().map(Note::title).collect()
    }

    fn project_of(titles: &[&str]) -> Project {
        let mut project = Project::new();
        for title in titles {
            project.add_note(Note::new_at(title, Category::Misc, "", fixed_time()));
        }
        project
    }

    #[test]
    fn test_category_display_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>(), Ok(category));
        }
        assert_eq!(Category::Health.to_string(), "Health & Sport");
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let err = "NotARealCategory".parse::<Category>().unwrap_err();
        assert_eq!(
            err,
            DomainError::UnknownCategory("NotARealCategory".to_string())
        );
        assert!("work".parse::<Category>().is_err());
    }

    #[test]
    fn test_legacy_names_parse_but_display_stays_english() {
        assert_eq!("Дом".parse::<Category>(), Ok(Category::Home));
        assert_eq!("Здоровье и Спорт".parse::<Category>(), Ok(Category::Health));
        for category in Category::ALL {
            assert_eq!(category.legacy_name().parse::<Category>(), Ok(category));
        }

        let record = NoteRecord {
            title: "Отчёт".to_string(),
            category: "Работа".to_string(),
            content: String::new(),
            created_at: "2024-03-14T09:26:53".to_string(),
            updated_at: "2024-03-14T09:26:53".to_string(),
        };
        let note = Note::from_record(record).unwrap();
        assert_eq!(note.to_record().category, "Work");
    }

    #[test]
    fn test_new_note_truncates_long_title() {
        let long_title = "x".repeat(80);
        let note = Note::new(&long_title, Category::Work, "body");
        assert_eq!(note.title(), &long_title[..50]);
        assert_eq!(note.created_at(), note.updated_at());
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let title = "ж".repeat(60);
        let note = Note::new(&title, Category::People, "");
        assert_eq!(note.title().chars().count(), 50);
        assert_eq!(note.title(), "ж".repeat(50));
    }

    #[test]
    fn test_update_truncates_title() {
        let mut note = Note::new("short", Category::Work, "");
        note.update(NoteChanges {
            title: Some("y".repeat(51)),
            ..NoteChanges::default()
        });
        assert_eq!(note.title(), "y".repeat(50));
    }

    #[test]
    fn test_update_replaces_only_given_fields() {
        let mut note = Note::new("Buy milk", Category::Home, "2% milk, oat milk");
        let before = note.updated_at();
        thread::sleep(Duration::from_millis(2));

        note.update(NoteChanges {
            title: Some("Buy milk and eggs".to_string()),
            ..NoteChanges::default()
        });

        assert_eq!(note.title(), "Buy milk and eggs");
        assert_eq!(note.category(), Category::Home);
        assert_eq!(note.content(), "2% milk, oat milk");
        assert!(note.updated_at() > before);
    }

    #[test]
    fn test_update_ignores_empty_strings() {
        let mut note = Note::new_at("Title", Category::Finance, "content", fixed_time());
        note.update_at(
            NoteChanges {
                title: Some(String::new()),
                category: None,
                content: Some(String::new()),
            },
            fixed_time() + ChronoDuration::seconds(5),
        );
        assert_eq!(note.title(), "Title");
        assert_eq!(note.content(), "content");
        assert_eq!(note.category(), Category::Finance);
    }

    #[test]
    fn test_empty_update_still_touches_timestamp() {
        let mut note = Note::new_at("Title", Category::Misc, "", fixed_time());
        let later = fixed_time() + ChronoDuration::minutes(3);
        note.update_at(NoteChanges::default(), later);
        assert_eq!(note.updated_at(), later);
        assert_eq!(note.created_at(), fixed_time());
    }

    #[test]
    fn test_updated_at_never_precedes_created_at() {
        let mut note = Note::new_at("Title", Category::Misc, "", fixed_time());
        let offsets = [10, -3600, 0, 1, -1];
        for offset in offsets {
            note.update_at(
                NoteChanges::default(),
                fixed_time() + ChronoDuration::seconds(offset),
            );
            assert!(note.updated_at() >= note.created_at());
        }
    }

    #[test]
    fn test_note_record_uses_display_strings() {
        let note = Note::new_at("Checkup", Category::Health, "dentist", fixed_time());
        let record = note.to_record();
        assert_eq!(record.category, "Health & Sport");
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(Note::from_record(record), Ok(note));
    }

    #[test]
    fn test_record_preserves_subsecond_precision() {
        let now = Local::now();
        let note = Note::new_at("precise", Category::Work, "", now);
        let restored = Note::from_record(note.to_record()).unwrap();
        assert_eq!(restored.created_at(), now);
    }

    #[test]
    fn test_from_record_accepts_naive_iso_timestamps() {
        let record = NoteRecord {
            title: "Legacy".to_string(),
            category: "Documents".to_string(),
            content: String::new(),
            created_at: "2024-03-14T09:26:53.123456".to_string(),
            updated_at: "2024-03-14T09:26:53".to_string(),
        };
        let note = Note::from_record(record).unwrap();
        assert_eq!(note.category(), Category::Documents);
        assert_eq!(note.created_at().naive_local().to_string(), "2024-03-14 09:26:53.123456");
        assert!(note.updated_at() >= note.created_at());
    }

    #[test]
    fn test_from_record_rejects_bad_timestamp() {
        let mut record = Note::new("t", Category::Misc, "").to_record();
        record.updated_at = "yesterday".to_string();
        assert_eq!(
            Note::from_record(record),
            Err(DomainError::InvalidTimestamp {
                field: "updated_at",
                value: "yesterday".to_string(),
            })
        );
    }

    #[test]
    fn test_add_note_appends() {
        let mut project = project_of(&["a", "b"]);
        project.add_note(Note::new("c", Category::Work, ""));
        assert_eq!(titles(&project), ["a", "b", "c"]);
    }

    #[test]
    fn test_duplicates_are_allowed() {
        let project = project_of(&["same", "same"]);
        assert_eq!(project.len(), 2);
        assert_eq!(project.get(0), project.get(1));
    }

    #[test]
    fn test_remove_at_shifts_later_notes() {
        let mut project = project_of(&["a", "b", "c", "d"]);
        let removed = project.remove_at(1);
        assert_eq!(removed.map(|note| note.title().to_string()), Some("b".to_string()));
        assert_eq!(titles(&project), ["a", "c", "d"]);
    }

    #[test]
    fn test_remove_at_out_of_range_is_noop() {
        let mut project = project_of(&["a", "b"]);
        let before = project.clone();
        assert!(project.remove_at(2).is_none());
        assert!(project.remove_at(usize::MAX).is_none());
        assert_eq!(project, before);

        let mut empty = Project::new();
        assert!(empty.remove_at(0).is_none());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_project_record_round_trip() {
        let mut project = Project::new();
        project.add_note(Note::new("first", Category::Work, "alpha"));
        project.add_note(Note::new("второй", Category::Finance, "бюджет"));
        let mut edited = Note::new("third", Category::Home, "gamma");
        edited.update_at(NoteChanges::default(), Local::now() + ChronoDuration::hours(1));
        project.add_note(edited);

        let restored = Project::from_record(project.to_record()).unwrap();
        assert_eq!(restored, project);
    }

    #[test]
    fn test_from_record_reports_failing_position() {
        let mut record = project_of(&["ok", "bad", "ok"]).to_record();
        record.notes[1].category = "NotARealCategory".to_string();

        let err = Project::from_record(record).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(
            err.source,
            DomainError::UnknownCategory("NotARealCategory".to_string())
        );
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Groceries "), Ok("Groceries"));
        assert_eq!(validate_title("   "), Err(ValidationError::EmptyTitle));
        assert_eq!(
            validate_title(&"z".repeat(51)),
            Err(ValidationError::TitleTooLong { max: 50 })
        );
        assert!(validate_title(&"z".repeat(50)).is_ok());
    }
}
