use crate::domain::submission::Submission;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) message: String,
    pub(crate) created_at: DateTime,
    pub(crate) updated_at: DateTime,
}

impl From<&Submission> for SubmissionRecord {
    fn from(submission: &Submission) -> Self {
        Self {
            name: submission.name.clone(),
            email: submission.email.clone(),
            message: submission.message.clone(),
            created_at: to_bson_datetime(submission.created_at),
            updated_at: to_bson_datetime(submission.updated_at),
        }
    }
}

fn to_bson_datetime(timestamp: OffsetDateTime) -> DateTime {
    let millis = i64::try_from(timestamp.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX);
    DateTime::from_millis(millis)
}
