use std::result;

use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use warp::http;

use crate::backend::Backend;
use crate::daily_study::{DailyStudy, DailyStudyReply, DailyStudyUpdate};
use crate::progress::{ProgressData, ProgressUpdate};
use crate::syllabus::Summary;
use crate::user::{self, SafeUser};

pub struct StudySync(Backend);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Internal(&'static str),
    Unauthorized,
    BadRequest(&'static str),
    NotFound(&'static str),
}

pub type Result<T> = result::Result<T, Error>;

impl From<Error> for http::StatusCode {
    fn from(e: Error) -> Self {
        match e {
            Error::Internal(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
            Error::Unauthorized => http::StatusCode::UNAUTHORIZED,
            Error::BadRequest(_) => http::StatusCode::BAD_REQUEST,
            Error::NotFound(_) => http::StatusCode::NOT_FOUND,
        }
    }
}

impl Error {
    /// What the client is told.
    pub fn message(&self) -> &'static str {
        match *self {
            Error::Internal(msg) | Error::BadRequest(msg) | Error::NotFound(msg) => msg,
            Error::Unauthorized => "Invalid credentials",
        }
    }
}

impl warp::reject::Reject for Error {}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| {
            debug!("invalid login body: {e}");
            Error::BadRequest("Username and password required")
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LoginReply {
    pub user: SafeUser,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub user: SafeUser,
    #[serde(flatten)]
    pub progress: Summary,
}

impl StudySync {
    pub fn new(backend: Backend) -> Self {
        Self(backend)
    }

    /// Create the two fixed accounts, skipping any that already exist.
    pub async fn seed(&self) -> Result<()> {
        for new in user::seed_users() {
            let username = new.username.clone();

            if self.0.get_user_by_username(&username).await.is_some() {
                debug!("seed user {username} already present");
                continue;
            }

            self.0.create_user(new).await.map_err(|()| {
                error!("couldn't create seed user {username}");
                Error::Internal("Failed to create users")
            })?;
            info!("created seed user {username}");
        }

        Ok(())
    }

    pub async fn login(&self, attempt: LoginRequest) -> Result<LoginReply> {
        let (username, password) = match (attempt.username, attempt.password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
            _ => return Err(Error::BadRequest("Username and password required")),
        };

        let user = match self.0.get_user_by_username(&username).await {
            Some(user) => user,
            None => {
                warn!("rejecting unknown user {username}");
                return Err(Error::Unauthorized);
            }
        };

        if user.password != password {
            warn!("wrong password for user {username}");
            return Err(Error::Unauthorized);
        }

        info!("{username} login");
        Ok(LoginReply { user: user.into() })
    }

    pub async fn users(&self) -> Vec<SafeUser> {
        let users = self.0.get_all_users().await;
        trace!("{} users", users.len());

        users.into_iter().map(Into::into).collect()
    }

    /// The first user who isn't `user_id`.
    pub async fn partner(&self, user_id: &str) -> Result<SafeUser> {
        self.0
            .get_all_users()
            .await
            .into_iter()
            .find(|u| u.id != user_id)
            .map(Into::into)
            .ok_or(Error::NotFound("No partner found"))
    }

    pub async fn progress(&self, user_id: &str) -> Vec<ProgressData> {
        let progress = self.0.get_all_progress_data(user_id).await;
        trace!("{user_id}: {} progress records", progress.len());

        progress
    }

    pub async fn update_progress(&self, body: &[u8]) -> Result<ProgressData> {
        let update: ProgressUpdate = serde_json::from_slice(body).map_err(|e| {
            debug!("invalid progress upload: {e}");
            Error::BadRequest("Invalid progress data")
        })?;

        let user_id = update.user_id.clone();
        let subject = update.subject;
        let ticked = update.topic_progress.values().filter(|&&b| b).count();

        let stored = self.0.upsert_progress_data(update).await.map_err(|()| {
            Error::Internal("Failed to update progress data")
        })?;

        info!(
            "{user_id}: {} progress now {ticked} topics, at {}",
            subject.as_str(),
            stored.updated_at
        );
        Ok(stored)
    }

    pub async fn daily_study(&self, user_id: &str, date: &str) -> DailyStudyReply {
        let study = self.0.get_daily_study(user_id, date).await;
        trace!("{user_id} on {date}: plan found={}", study.is_some());

        study.into()
    }

    pub async fn update_daily_study(&self, body: &[u8]) -> Result<DailyStudy> {
        let update: DailyStudyUpdate = serde_json::from_slice(body).map_err(|e| {
            debug!("invalid daily study upload: {e}");
            Error::BadRequest("Invalid daily study data")
        })?;

        let user_id = update.user_id.clone();
        let date = update.date.clone();

        let stored = self.0.upsert_daily_study(update).await.map_err(|()| {
            Error::Internal("Failed to update daily study")
        })?;

        info!("{user_id} saved a study plan for {date}");
        Ok(stored)
    }

    pub async fn summary(&self, user_id: &str) -> Result<UserSummary> {
        let user = self
            .0
            .get_user(user_id)
            .await
            .ok_or(Error::NotFound("User not found"))?;

        let progress = Summary::from_progress(&self.0.get_all_progress_data(user_id).await);
        debug!("{}: {progress:?}", user.username);

        Ok(UserSummary {
            user: user.into(),
            progress,
        })
    }
}
