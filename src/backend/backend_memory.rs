use std::collections::HashMap;

use log::trace;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::daily_study::{DailyStudy, DailyStudyUpdate};
use crate::progress::{ProgressData, ProgressUpdate};
use crate::syllabus::Subject;
use crate::time::Timestamp;
use crate::user::{NewUser, User};

type Result<T> = std::result::Result<T, ()>;

/// Everything lives in maps keyed by record id and is gone when the
/// process exits.
#[derive(Default)]
pub struct Backend {
    users: RwLock<HashMap<String, User>>,
    progress: RwLock<HashMap<String, ProgressData>>,
    daily_study: RwLock<HashMap<String, DailyStudy>>,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Backend {
    pub async fn get_user(&self, id: &str) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned()
    }

    pub async fn create_user(&self, new: NewUser) -> Result<User> {
        let user = User::from_new(new_id(), new);

        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());

        Ok(user)
    }

    pub async fn get_all_users(&self) -> Vec<User> {
        self.users.read().await.values().cloned().collect()
    }
}

impl Backend {
    pub async fn get_progress_data(&self, user_id: &str, subject: Subject) -> Option<ProgressData> {
        self.progress
            .read()
            .await
            .values()
            .find(|p| p.user_id == user_id && p.subject == subject)
            .cloned()
    }

    pub async fn get_all_progress_data(&self, user_id: &str) -> Vec<ProgressData> {
        self.progress
            .read()
            .await
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn upsert_progress_data(&self, update: ProgressUpdate) -> Result<ProgressData> {
        let now = Timestamp::now();
        let existing = self.get_progress_data(&update.user_id, update.subject).await;

        let record = match existing {
            Some(mut existing) => {
                trace!("replacing progress {}", existing.id);
                existing.topic_progress = update.topic_progress;
                existing.updated_at = now;
                existing
            }
            None => ProgressData::from_update(new_id(), update, now),
        };

        self.progress
            .write()
            .await
            .insert(record.id.clone(), record.clone());

        Ok(record)
    }
}

impl Backend {
    pub async fn get_daily_study(&self, user_id: &str, date: &str) -> Option<DailyStudy> {
        self.daily_study
            .read()
            .await
            .values()
            .find(|s| s.user_id == user_id && s.date == date)
            .cloned()
    }

    pub async fn upsert_daily_study(&self, update: DailyStudyUpdate) -> Result<DailyStudy> {
        let existing = self.get_daily_study(&update.user_id, &update.date).await;

        let record = match existing {
            Some(mut existing) => {
                trace!("replacing study plan {}", existing.id);
                existing.study_plan = update.study_plan;
                existing
            }
            None => DailyStudy::from_update(new_id(), update, Timestamp::now()),
        };

        self.daily_study
            .write()
            .await
            .insert(record.id.clone(), record.clone());

        Ok(record)
    }
}
