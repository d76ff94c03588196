use crate::daily_study::{DailyStudy, DailyStudyUpdate};
use crate::progress::{ProgressData, ProgressUpdate};
use crate::syllabus::Subject;
use crate::user::{NewUser, User};

#[derive(Debug)]
pub enum FindError {
    NotFound,
    Internal,
}

mod backend_firestore;
pub use backend_firestore::FirestoreConfig;

mod backend_memory;

/// Where records are kept. Picked once at startup.
pub enum Backend {
    Memory(backend_memory::Backend),
    Firestore(backend_firestore::Backend),
}

impl Backend {
    pub fn memory() -> Self {
        Self::Memory(backend_memory::Backend::new())
    }

    pub fn firestore(config: FirestoreConfig) -> Self {
        Self::Firestore(backend_firestore::Backend::new(config))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Firestore(_) => "firestore",
        }
    }
}

macro_rules! dispatch {
    ($self: expr, $method: ident($($arg: expr),*)) => {
        match $self {
            Backend::Memory(b) => b.$method($($arg),*).await,
            Backend::Firestore(b) => b.$method($($arg),*).await,
        }
    };
}

impl Backend {
    pub async fn get_user(&self, id: &str) -> Option<User> {
        dispatch!(self, get_user(id))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        dispatch!(self, get_user_by_username(username))
    }

    /// No check is made that `username` is free.
    pub async fn create_user(&self, new: NewUser) -> Result<User, ()> {
        dispatch!(self, create_user(new))
    }

    pub async fn get_all_users(&self) -> Vec<User> {
        dispatch!(self, get_all_users())
    }

    pub async fn get_progress_data(&self, user_id: &str, subject: Subject) -> Option<ProgressData> {
        dispatch!(self, get_progress_data(user_id, subject))
    }

    pub async fn get_all_progress_data(&self, user_id: &str) -> Vec<ProgressData> {
        dispatch!(self, get_all_progress_data(user_id))
    }

    /// Replace the topic map for `(user_id, subject)`, creating the record
    /// if there isn't one yet.
    pub async fn upsert_progress_data(&self, update: ProgressUpdate) -> Result<ProgressData, ()> {
        dispatch!(self, upsert_progress_data(update))
    }

    pub async fn get_daily_study(&self, user_id: &str, date: &str) -> Option<DailyStudy> {
        dispatch!(self, get_daily_study(user_id, date))
    }

    /// Replace the plan for `(user_id, date)`, creating the record if
    /// there isn't one yet.
    pub async fn upsert_daily_study(&self, update: DailyStudyUpdate) -> Result<DailyStudy, ()> {
        dispatch!(self, upsert_daily_study(update))
    }
}
