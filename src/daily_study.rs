use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStudy {
    pub id: String,
    pub user_id: String,
    pub study_plan: String,
    /// YYYY-MM-DD, taken as given
    pub date: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStudyUpdate {
    pub user_id: String,
    pub study_plan: String,
    pub date: String,
}

/// What a client sees for a day: the stored plan, or an empty one.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DailyStudyReply {
    Found(DailyStudy),
    #[serde(rename_all = "camelCase")]
    Empty { study_plan: String },
}

impl DailyStudy {
    pub fn from_update(id: String, update: DailyStudyUpdate, created_at: Timestamp) -> Self {
        let DailyStudyUpdate {
            user_id,
            study_plan,
            date,
        } = update;

        Self {
            id,
            user_id,
            study_plan,
            date,
            created_at,
        }
    }
}

impl From<Option<DailyStudy>> for DailyStudyReply {
    fn from(study: Option<DailyStudy>) -> Self {
        match study {
            Some(study) => Self::Found(study),
            None => Self::Empty {
                study_plan: String::new(),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_day_is_an_empty_plan() {
        let reply: DailyStudyReply = None.into();

        assert_eq!(
            serde_json::to_value(reply).unwrap(),
            serde_json::json!({ "studyPlan": "" })
        );
    }

    #[test]
    fn update_requires_every_field() {
        let r = serde_json::from_str::<DailyStudyUpdate>(r#"{"userId": "u1", "date": "2024-01-01"}"#);

        assert!(r.is_err());
    }
}
