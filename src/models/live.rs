use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruitedStudent {
    pub degree: String,
    pub branch: String,
    pub name: String,
}

/// One placement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub live_type: u8,
    /// Target company ID.
    pub company: String,
    pub recruits: i64,
    pub year: i32,
    pub semester: u8,
    pub students_recruited: Vec<RecruitedStudent>,
    pub ctc: String,
    pub benefits: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl Document for LiveRecord {
    const COLLECTION: &'static str = "live";

    fn id(&self) -> &str {
        &self.id
    }
}
