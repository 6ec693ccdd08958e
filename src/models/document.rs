use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;

// Review lifecycle for an uploaded document. Transitions happen only through
// the admin surface; the upload path always starts at Uploaded.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    InReview,
    Completed,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentStatus::Uploaded => "uploaded",
            DocumentStatus::InReview => "in_review",
            DocumentStatus::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DocumentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(DocumentStatus::Uploaded),
            "in_review" => Ok(DocumentStatus::InReview),
            "completed" => Ok(DocumentStatus::Completed),
            other => Err(AppError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Document {
    pub id: i64,
    pub user_id: i64,
    pub original_filename: String,  // untrusted input, kept for display only
    pub stored_filename: String,    // server-generated, collision resistant
    pub stored_path: String,        // only authoritative pointer to the bytes
    pub status: DocumentStatus,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_the_three_known_values() {
        assert_eq!("uploaded".parse::<DocumentStatus>().unwrap(), DocumentStatus::Uploaded);
        assert_eq!("in_review".parse::<DocumentStatus>().unwrap(), DocumentStatus::InReview);
        assert_eq!("completed".parse::<DocumentStatus>().unwrap(), DocumentStatus::Completed);
    }

    #[test]
    fn status_rejects_unknown_values() {
        assert!(matches!(
            "archived".parse::<DocumentStatus>(),
            Err(AppError::InvalidStatus(v)) if v == "archived"
        ));
        // Case matters: the wire format is exactly the snake_case strings
        assert!("Uploaded".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn status_display_round_trips() {
        for status in [DocumentStatus::Uploaded, DocumentStatus::InReview, DocumentStatus::Completed] {
            assert_eq!(status.to_string().parse::<DocumentStatus>().unwrap(), status);
        }
    }
}
