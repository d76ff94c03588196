use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

mod args;
use args::Args;

mod backend;
use backend::Backend;

mod studysync;
use studysync::StudySync;

mod routes;

mod daily_study;
mod progress;
mod syllabus;
mod time;
mod user;

#[tokio::main]
async fn main() -> ExitCode {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "studysync=info");
    }
    pretty_env_logger::init();

    let args = Args::parse();

    let addr = match args.addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("couldn't parse listen address: {e}");
            return ExitCode::FAILURE;
        }
    };

    let backend = match args.firestore() {
        Some(config) => Backend::firestore(config),
        None => Backend::memory(),
    };
    info!("storing records in {}", backend.name());

    let sync = StudySync::new(backend);
    if let Err(e) = sync.seed().await {
        error!("couldn't create default users: {e:?}");
        return ExitCode::FAILURE;
    }

    info!("listening on {addr}");
    warp::serve(routes::routes(Arc::new(sync)))
        .run(addr)
        .await;

    ExitCode::SUCCESS
}
