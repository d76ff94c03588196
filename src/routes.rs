use std::sync::Arc;

use log::{debug, error};
use serde::Serialize;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use crate::studysync::{self, LoginRequest, StudySync};
use crate::syllabus;

const MAX_BODY: u64 = 256 * 1024;

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
}

fn json_or_reject<T: Serialize>(r: studysync::Result<T>) -> Result<warp::reply::Json, Rejection> {
    r.map(|value| warp::reply::json(&value))
        .map_err(warp::reject::custom)
}

fn with_sync(
    sync: Arc<StudySync>,
) -> impl Filter<Extract = (Arc<StudySync>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || Arc::clone(&sync))
}

fn json_body() -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY).and(warp::body::bytes())
}

pub fn routes(
    sync: Arc<StudySync>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let login = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_sync(sync.clone()))
        .and_then(|body: Bytes, sync: Arc<StudySync>| async move {
            let attempt = LoginRequest::parse(&body).map_err(warp::reject::custom)?;
            json_or_reject(sync.login(attempt).await)
        });

    let users = {
        let all = warp::path!("api" / "users")
            .and(warp::get())
            .and(with_sync(sync.clone()))
            .then(|sync: Arc<StudySync>| async move { warp::reply::json(&sync.users().await) });

        let partner = warp::path!("api" / "users" / String / "partner")
            .and(warp::get())
            .and(with_sync(sync.clone()))
            .and_then(|user_id: String, sync: Arc<StudySync>| async move {
                json_or_reject(sync.partner(&user_id).await)
            });

        all.or(partner)
    };

    let progress = {
        let get = warp::path!("api" / "progress" / String)
            .and(warp::get())
            .and(with_sync(sync.clone()))
            .then(|user_id: String, sync: Arc<StudySync>| async move {
                warp::reply::json(&sync.progress(&user_id).await)
            });

        let upload = warp::path!("api" / "progress")
            .and(warp::post())
            .and(json_body())
            .and(with_sync(sync.clone()))
            .and_then(|body: Bytes, sync: Arc<StudySync>| async move {
                json_or_reject(sync.update_progress(&body).await)
            });

        get.or(upload)
    };

    let daily_study = {
        let get = warp::path!("api" / "daily-study" / String / String)
            .and(warp::get())
            .and(with_sync(sync.clone()))
            .then(|user_id: String, date: String, sync: Arc<StudySync>| async move {
                warp::reply::json(&sync.daily_study(&user_id, &date).await)
            });

        let upload = warp::path!("api" / "daily-study")
            .and(warp::post())
            .and(json_body())
            .and(with_sync(sync.clone()))
            .and_then(|body: Bytes, sync: Arc<StudySync>| async move {
                json_or_reject(sync.update_daily_study(&body).await)
            });

        get.or(upload)
    };

    let summary = warp::path!("api" / "summary" / String)
        .and(warp::get())
        .and(with_sync(sync))
        .and_then(|user_id: String, sync: Arc<StudySync>| async move {
            json_or_reject(sync.summary(&user_id).await)
        });

    let catalog = warp::path!("api" / "syllabus")
        .and(warp::get())
        .map(|| warp::reply::json(&syllabus::catalog()));

    login
        .or(users)
        .or(progress)
        .or(daily_study)
        .or(summary)
        .or(catalog)
        .recover(recover)
        .with(warp::log("studysync"))
}

/// Our own errors become `{"message": ...}`; anything else is left to warp.
async fn recover(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(e) = err.find::<studysync::Error>() {
        let status: StatusCode = (*e).into();
        if status.is_server_error() {
            error!("replying {status}: {e:?}");
        } else {
            debug!("replying {status}: {e:?}");
        }

        return Ok(warp::reply::with_status(
            warp::reply::json(&ErrorBody {
                message: e.message(),
            }),
            status,
        ));
    }

    Err(err)
}
