use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub mod error;
pub mod portrait;

pub use error::{FocusError, HierarchyError, SnapshotError};
pub use portrait::normalize_portrait_path;

/// Identifier of a clan member, unique within one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MemberId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for MemberId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Gender as delivered by the data layer (`"M"` / `"F"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl From<Option<String>> for Gender {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::trim) {
            Some("M" | "m" | "male" | "Male") => Gender::Male,
            Some("F" | "f" | "female" | "Female") => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

impl From<Gender> for String {
    fn from(value: Gender) -> Self {
        match value {
            Gender::Male => "M".to_string(),
            Gender::Female => "F".to_string(),
            Gender::Unknown => String::new(),
        }
    }
}

/// Axis along which generations advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayoutDirection {
    /// Generations flow top to bottom.
    #[default]
    Vertical,
    /// Generations flow left to right.
    Horizontal,
}

/// One member of the clan as delivered in a snapshot.
///
/// Optional text fields treat an empty string the same as an absent key, which
/// is how the data layer encodes "no value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: MemberId,
    #[serde(default, deserialize_with = "non_empty_id")]
    pub parent_id: Option<MemberId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub generation: i32,
    #[serde(default)]
    pub generation_name: String,
    #[serde(default, alias = "mateName", deserialize_with = "non_empty")]
    pub spouse_name: Option<String>,
    #[serde(default, deserialize_with = "non_empty_id")]
    pub mother_id: Option<MemberId>,
    #[serde(default, deserialize_with = "non_empty")]
    pub birth_date: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub death_date: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub birth_place: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub death_place: Option<String>,
    #[serde(default, alias = "portrait_path", deserialize_with = "non_empty")]
    pub portrait_path: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub life_span: Option<String>,
}

impl MemberRecord {
    pub fn new(id: impl Into<MemberId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<MemberId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_generation(mut self, generation: i32, generation_name: impl Into<String>) -> Self {
        self.generation = generation;
        self.generation_name = generation_name.into();
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_portrait(mut self, path: impl Into<String>) -> Self {
        self.portrait_path = Some(path.into());
        self
    }

    /// True for the ancestor record (no parent reference).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Display life span: the explicit value, or `"YYYY"` / `"YYYY-YYYY"`
    /// taken from the birth and death dates.
    pub fn life_span(&self) -> Option<String> {
        if let Some(span) = &self.life_span {
            return Some(span.clone());
        }
        let birth = self.birth_date.as_deref().map(year_prefix)?;
        match self.death_date.as_deref().map(year_prefix) {
            Some(death) => Some(format!("{birth}-{death}")),
            None => Some(birth.to_string()),
        }
    }
}

fn year_prefix(date: &str) -> &str {
    match date.char_indices().nth(4) {
        Some((end, _)) => &date[..end],
        None => date,
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn non_empty_id<'de, D>(deserializer: D) -> Result<Option<MemberId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(non_empty(deserializer)?.map(MemberId))
}

/// Decode a JSON array of member records.
pub fn parse_snapshot(json: &str) -> Result<Vec<MemberRecord>, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}
