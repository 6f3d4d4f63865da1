use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Identified;

pub const STUDENTS_RESOURCE: &str = "students";

/// Enrolled (or applying) student, as listed by the student dialogs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub level: Option<String>,
}

impl Identified for Student {
    fn identity(&self) -> String {
        self.id.clone()
    }
}
