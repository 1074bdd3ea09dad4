use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::Validate;

use crate::auth::Permission;
use crate::collection::{Draft, Field, Record};

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,19}$").expect("phone pattern is valid"));

fn default_wilaya() -> String {
    "Algiers".to_string()
}

fn default_division() -> String {
    "Div 2".to_string()
}

fn default_health_flags() -> String {
    "None".to_string()
}

fn default_icon() -> String {
    "tools".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Student {
    pub id: i64,
    pub first_name_ar: String,
    pub last_name_ar: String,
    pub first_name_en: String,
    pub last_name_en: String,
    pub date_of_birth: Option<NaiveDate>,
    pub grade: Option<i64>,
    pub wilaya: String,
    pub email: Option<String>,
    pub student_phone: Option<String>,
    pub parent_phone: Option<String>,
    pub discord_id: Option<String>,
    pub codeforces_username: Option<String>,
    pub cses_username: Option<String>,
    pub division: String,
    pub health_flags: String,
    pub created_at: NaiveDateTime,
}

impl Student {
    pub fn has_health_flags(&self) -> bool {
        let flags = self.health_flags.trim();
        !flags.is_empty() && flags != "None"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct StudentDraft {
    #[validate(length(min = 1, max = 100, message = "Arabic first name is required"))]
    pub first_name_ar: String,
    #[validate(length(min = 1, max = 100, message = "Arabic last name is required"))]
    pub last_name_ar: String,
    #[validate(length(min = 1, max = 100, message = "English first name is required"))]
    pub first_name_en: String,
    #[validate(length(min = 1, max = 100, message = "English last name is required"))]
    pub last_name_en: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    #[validate(range(min = 1, max = 13, message = "Grade must be between 1 and 13"))]
    pub grade: Option<i64>,
    #[serde(default = "default_wilaya")]
    #[validate(length(min = 1, message = "Wilaya is required"))]
    pub wilaya: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub student_phone: Option<String>,
    #[serde(default)]
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub parent_phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub discord_id: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub codeforces_username: Option<String>,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub cses_username: Option<String>,
    #[serde(default = "default_division")]
    #[validate(length(min = 1, message = "Division is required"))]
    pub division: String,
    #[serde(default = "default_health_flags")]
    pub health_flags: String,
}

impl StudentDraft {
    /// A draft with the names set and every other field at its form default.
    pub fn named(
        first_name_ar: &str,
        last_name_ar: &str,
        first_name_en: &str,
        last_name_en: &str,
    ) -> Self {
        Self {
            first_name_ar: first_name_ar.to_string(),
            last_name_ar: last_name_ar.to_string(),
            first_name_en: first_name_en.to_string(),
            last_name_en: last_name_en.to_string(),
            date_of_birth: None,
            grade: None,
            wilaya: default_wilaya(),
            email: None,
            student_phone: None,
            parent_phone: None,
            discord_id: None,
            codeforces_username: None,
            cses_username: None,
            division: default_division(),
            health_flags: default_health_flags(),
        }
    }
}

impl Draft for StudentDraft {
    fn fields(&self) -> Vec<(&'static str, Field)> {
        vec![
            ("first_name_ar", Field::text(&self.first_name_ar)),
            ("last_name_ar", Field::text(&self.last_name_ar)),
            ("first_name_en", Field::text(&self.first_name_en)),
            ("last_name_en", Field::text(&self.last_name_en)),
            ("date_of_birth", Field::Date(self.date_of_birth)),
            ("grade", Field::Integer(self.grade)),
            ("wilaya", Field::text(&self.wilaya)),
            ("email", Field::Text(self.email.clone())),
            ("student_phone", Field::Text(self.student_phone.clone())),
            ("parent_phone", Field::Text(self.parent_phone.clone())),
            ("discord_id", Field::Text(self.discord_id.clone())),
            ("codeforces_username", Field::Text(self.codeforces_username.clone())),
            ("cses_username", Field::Text(self.cses_username.clone())),
            ("division", Field::text(&self.division)),
            ("health_flags", Field::text(&self.health_flags)),
        ]
    }
}

impl Record for Student {
    const TABLE: &'static str = "students";
    const LABEL: &'static str = "Student";
    const READ: Permission = Permission::ViewStudents;
    const WRITE: Permission = Permission::EditStudents;

    type Draft = StudentDraft;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeSlot {
    Morning,
    Afternoon,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 2] = [TimeSlot::Morning, TimeSlot::Afternoon];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "Morning",
            TimeSlot::Afternoon => "Afternoon",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown time slot: {0}")]
pub struct UnknownTimeSlot(String);

impl TryFrom<String> for TimeSlot {
    type Error = UnknownTimeSlot;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Morning" => Ok(TimeSlot::Morning),
            "Afternoon" => Ok(TimeSlot::Afternoon),
            _ => Err(UnknownTimeSlot(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct CampSession {
    pub id: i64,
    pub title: String,
    pub venue: String,
    pub date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub time_slot: TimeSlot,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CampSessionDraft {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Venue is required"))]
    pub venue: String,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
}

impl Draft for CampSessionDraft {
    fn fields(&self) -> Vec<(&'static str, Field)> {
        vec![
            ("title", Field::text(&self.title)),
            ("venue", Field::text(&self.venue)),
            ("date", Field::Date(Some(self.date))),
            ("time_slot", Field::text(self.time_slot.as_str())),
        ]
    }
}

impl Record for CampSession {
    const TABLE: &'static str = "camp_sessions";
    const LABEL: &'static str = "Camp session";
    const ORDER_BY: &'static str = "date ASC, time_slot DESC, id ASC";
    const READ: Permission = Permission::ViewLogistics;
    const WRITE: Permission = Permission::ManageSchedule;

    type Draft = CampSessionDraft;
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Resource {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub icon: String,
    pub count: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResourceDraft {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Category is required"))]
    pub category: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[validate(range(min = 0, message = "Count cannot be negative"))]
    pub count: i64,
}

impl Draft for ResourceDraft {
    fn fields(&self) -> Vec<(&'static str, Field)> {
        vec![
            ("name", Field::text(&self.name)),
            ("category", Field::text(&self.category)),
            ("icon", Field::text(&self.icon)),
            ("count", Field::Integer(Some(self.count))),
        ]
    }
}

impl Record for Resource {
    const TABLE: &'static str = "resources";
    const LABEL: &'static str = "Resource";
    const READ: Permission = Permission::ViewLogistics;
    const WRITE: Permission = Permission::ManageInventory;

    type Draft = ResourceDraft;
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub capacity: Option<i64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VenueDraft {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 1, message = "Capacity must be positive"))]
    pub capacity: Option<i64>,
}

impl Draft for VenueDraft {
    fn fields(&self) -> Vec<(&'static str, Field)> {
        vec![
            ("name", Field::text(&self.name)),
            ("capacity", Field::Integer(self.capacity)),
        ]
    }
}

impl Record for Venue {
    const TABLE: &'static str = "venues";
    const LABEL: &'static str = "Venue";
    const ORDER_BY: &'static str = "name ASC";
    const READ: Permission = Permission::ViewLogistics;
    const WRITE: Permission = Permission::ManageVenues;

    type Draft = VenueDraft;
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Problem {
    pub id: i64,
    pub title_en: String,
    pub link: String,
    pub is_en_done: bool,
    pub is_fr_done: bool,
    pub is_ar_done: bool,
    pub created_at: NaiveDateTime,
}

impl Problem {
    pub fn is_fully_translated(&self) -> bool {
        self.is_en_done && self.is_fr_done && self.is_ar_done
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProblemDraft {
    #[validate(length(min = 1, max = 200, message = "Problem title is required"))]
    pub title_en: String,
    #[validate(url(message = "Problem link must be a URL"))]
    pub link: String,
    #[serde(default)]
    pub is_en_done: bool,
    #[serde(default)]
    pub is_fr_done: bool,
    #[serde(default)]
    pub is_ar_done: bool,
}

impl Draft for ProblemDraft {
    fn fields(&self) -> Vec<(&'static str, Field)> {
        vec![
            ("title_en", Field::text(&self.title_en)),
            ("link", Field::text(&self.link)),
            ("is_en_done", Field::Flag(self.is_en_done)),
            ("is_fr_done", Field::Flag(self.is_fr_done)),
            ("is_ar_done", Field::Flag(self.is_ar_done)),
        ]
    }
}

impl Record for Problem {
    const TABLE: &'static str = "problems";
    const LABEL: &'static str = "Problem";
    const READ: Permission = Permission::ViewProblems;
    const WRITE: Permission = Permission::ManageProblems;

    type Draft = ProblemDraft;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_flags_of_none_are_not_flags() {
        let mut student = Student {
            id: 1,
            first_name_ar: "أمين".into(),
            last_name_ar: "بن علي".into(),
            first_name_en: "Amine".into(),
            last_name_en: "Benali".into(),
            date_of_birth: None,
            grade: Some(11),
            wilaya: "Oran".into(),
            email: None,
            student_phone: None,
            parent_phone: None,
            discord_id: None,
            codeforces_username: Some("amine_b".into()),
            cses_username: None,
            division: "Div 1".into(),
            health_flags: "None".into(),
            created_at: NaiveDateTime::default(),
        };
        assert!(!student.has_health_flags());

        student.health_flags = "  ".into();
        assert!(!student.has_health_flags());

        student.health_flags = "Peanut allergy".into();
        assert!(student.has_health_flags());
    }

    #[test]
    fn student_draft_validation() {
        let draft = StudentDraft::named("أمين", "بن علي", "Amine", "Benali");
        assert!(draft.validate().is_ok());

        let mut bad = draft.clone();
        bad.first_name_en = String::new();
        bad.student_phone = Some("call me".into());
        bad.grade = Some(20);
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("first_name_en"));
        assert!(fields.contains_key("student_phone"));
        assert!(fields.contains_key("grade"));

        let mut ok_phone = draft;
        ok_phone.parent_phone = Some("+213 555 12 34 56".into());
        assert!(ok_phone.validate().is_ok());
    }

    #[test]
    fn student_draft_fills_form_defaults() {
        let draft: StudentDraft = serde_json::from_str(
            r#"{"first_name_ar":"س","last_name_ar":"ل","first_name_en":"S","last_name_en":"L"}"#,
        )
        .unwrap();

        assert_eq!(draft.wilaya, "Algiers");
        assert_eq!(draft.division, "Div 2");
        assert_eq!(draft.health_flags, "None");
        assert_eq!(draft.fields().len(), 15);
    }

    #[test]
    fn time_slots_parse_strictly() {
        assert_eq!(TimeSlot::try_from("Morning".to_string()).unwrap(), TimeSlot::Morning);
        assert_eq!(TimeSlot::try_from("Afternoon".to_string()).unwrap(), TimeSlot::Afternoon);
        assert!(TimeSlot::try_from("morning".to_string()).is_err());
    }

    #[test]
    fn full_translation_needs_all_three_languages() {
        let mut problem = Problem {
            id: 1,
            title_en: "Two Sum".into(),
            link: "https://cses.fi/problemset/task/1640".into(),
            is_en_done: true,
            is_fr_done: true,
            is_ar_done: false,
            created_at: NaiveDateTime::default(),
        };
        assert!(!problem.is_fully_translated());
        problem.is_ar_done = true;
        assert!(problem.is_fully_translated());
    }
}
