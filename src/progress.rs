use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::syllabus::Subject;
use crate::time::Timestamp;

/// "{chapter}-{topic}" to whether it's been covered.
pub type TopicProgress = HashMap<String, bool>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    pub id: String,
    pub user_id: String,
    pub subject: Subject,
    pub topic_progress: TopicProgress,
    pub updated_at: Timestamp,
}

/// The body of a progress upload. The whole map is sent each time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub user_id: String,
    pub subject: Subject,
    pub topic_progress: TopicProgress,
}

impl ProgressData {
    pub fn from_update(id: String, update: ProgressUpdate, updated_at: Timestamp) -> Self {
        let ProgressUpdate {
            user_id,
            subject,
            topic_progress,
        } = update;

        Self {
            id,
            user_id,
            subject,
            topic_progress,
            updated_at,
        }
    }
}
