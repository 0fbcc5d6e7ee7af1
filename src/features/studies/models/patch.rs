use serde_json::{Map, Value};

use super::StudyStatus;
use crate::shared::validation::{DOCUMENT_SLOT_REGEX, FIELD_SEGMENT_REGEX};

/// Top-level document fields a patch may write. Identity and lifecycle
/// fields (`id`, `ownerUid`, `status`, timestamps) are not addressable.
const DOCUMENT_FIELDS: &[&str] = &[
    "empresaNombre",
    "rfc",
    "giro",
    "questionnaire",
    "files",
    "analysisData",
    "reputationData",
];

/// Dotted path into a study document, e.g. `files.anexosPDF`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, String> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();

        if let Some(bad) = segments.iter().find(|s| !FIELD_SEGMENT_REGEX.is_match(s)) {
            return Err(format!("invalid segment '{}' in field path '{}'", bad, path));
        }

        if !DOCUMENT_FIELDS.contains(&segments[0].as_str()) {
            return Err(format!("field '{}' is not writable", segments[0]));
        }

        Ok(Self(segments))
    }

    /// Path of a document slot locator, `files.<slot>`
    pub fn document_slot(slot: &str) -> Result<Self, String> {
        if !DOCUMENT_SLOT_REGEX.is_match(slot) {
            return Err(format!("invalid document slot '{}'", slot));
        }
        Ok(Self(vec!["files".to_string(), slot.to_string()]))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Partial update of one study: an optional status write plus field writes.
/// Fields not named are left untouched; `updatedAt` is always refreshed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyPatch {
    pub status: Option<StudyStatus>,
    pub fields: Vec<(FieldPath, Value)>,
}

impl StudyPatch {
    pub fn status(status: StudyStatus) -> Self {
        Self {
            status: Some(status),
            fields: Vec::new(),
        }
    }

    pub fn set(mut self, path: FieldPath, value: Value) -> Self {
        self.fields.push((path, value));
        self
    }

    /// Write the field values into a document, creating intermediate objects
    pub fn apply_to(&self, document: &mut Value) {
        for (path, value) in &self.fields {
            set_path(document, path.segments(), value.clone());
        }
    }
}

fn set_path(target: &mut Value, segments: &[String], value: Value) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(map) = target else {
        return;
    };

    match segments {
        [] => {}
        [last] => {
            map.insert(last.clone(), value);
        }
        [first, rest @ ..] => {
            let child = map.entry(first.clone()).or_insert(Value::Null);
            set_path(child, rest, value);
        }
    }
}

/// Which studies a query returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyFilter {
    All,
    OwnedBy(String),
}
