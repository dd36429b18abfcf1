use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewType {
    Technical,
    Behavioral,
    Mixed,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Technical => "Technical",
            InterviewType::Behavioral => "Behavioral",
            InterviewType::Mixed => "Mixed",
        }
    }
}

impl FromStr for InterviewType {
    type Err = String;

    /// Accepts any casing; anything unrecognised is an error rather than a silent `Mixed`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technical" => Ok(InterviewType::Technical),
            "behavioral" | "behavioural" => Ok(InterviewType::Behavioral),
            "mixed" => Ok(InterviewType::Mixed),
            other => Err(format!("unknown interview type '{other}'")),
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Pending,
    Completed,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Pending => "pending",
            InterviewStatus::Completed => "completed",
        }
    }
}

impl FromStr for InterviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InterviewStatus::Pending),
            "completed" => Ok(InterviewStatus::Completed),
            other => Err(format!("unknown interview status '{other}'")),
        }
    }
}

/// A generated interview. Only `status` and `completed_at` ever change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: String,
    pub user_id: String,
    pub role: String,
    #[serde(rename = "type")]
    pub interview_type: InterviewType,
    pub level: String,
    pub tech_stack: Vec<String>,
    pub questions: Vec<String>,
    /// Minutes. Zero disables the call countdown.
    pub duration: u32,
    pub status: InterviewStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub cover_image: String,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `interviews` table; enums are stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct InterviewRow {
    pub id: String,
    pub user_id: String,
    pub role: String,
    pub interview_type: String,
    pub level: String,
    pub tech_stack: Vec<String>,
    pub questions: Vec<String>,
    pub duration_minutes: i32,
    pub status: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub cover_image: String,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InterviewRow> for Interview {
    type Error = String;

    fn try_from(row: InterviewRow) -> Result<Self, Self::Error> {
        Ok(Interview {
            interview_type: row.interview_type.parse()?,
            status: row.status.parse()?,
            duration: u32::try_from(row.duration_minutes)
                .map_err(|_| format!("negative duration {}", row.duration_minutes))?,
            id: row.id,
            user_id: row.user_id,
            role: row.role,
            level: row.level,
            tech_stack: row.tech_stack,
            questions: row.questions,
            completed_at: row.completed_at,
            cover_image: row.cover_image,
            profile_picture_url: row.profile_picture_url,
            created_at: row.created_at,
        })
    }
}

/// Splits the comma-joined tech stack sent by the interview form.
pub fn split_tech_stack(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
