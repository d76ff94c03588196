use std::net::{AddrParseError, IpAddr, SocketAddr};

use clap::Parser;

use crate::backend::FirestoreConfig;

#[derive(Parser, Debug)]
pub struct Args {
    /// The address studysync should listen on. By default
    /// studysync will listen just on the IPv4 loopback.
    #[arg(short, long, env = "STUDYSYNC_ADDRESS")]
    address: Option<String>,

    /// The port studysync listens on.
    #[arg(short, long, env = "STUDYSYNC_PORT", default_value_t = 5000)]
    port: u16,

    /// Keep records in this Firestore project instead of in memory.
    #[arg(long, env = "FIRESTORE_PROJECT")]
    firestore_project: Option<String>,

    /// Firestore REST endpoint, e.g. an emulator's `http://localhost:8080/v1`.
    #[arg(
        long,
        env = "FIRESTORE_URL",
        default_value = "https://firestore.googleapis.com/v1"
    )]
    firestore_url: String,

    /// Web API key sent with each Firestore request.
    #[arg(long, env = "FIRESTORE_API_KEY", hide_env_values = true)]
    firestore_api_key: Option<String>,

    /// OAuth bearer token sent with each Firestore request.
    #[arg(long, env = "FIRESTORE_TOKEN", hide_env_values = true)]
    firestore_token: Option<String>,
}

impl Args {
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.address
            .as_deref()
            .unwrap_or("127.0.0.1")
            .parse()
            .map(|addr: IpAddr| (addr, self.port).into())
    }

    /// Firestore settings, if a project was given.
    pub fn firestore(&self) -> Option<FirestoreConfig> {
        let project = self.firestore_project.clone()?;

        Some(FirestoreConfig {
            base_url: self.firestore_url.clone(),
            project,
            api_key: self.firestore_api_key.clone(),
            token: self.firestore_token.clone(),
        })
    }
}
