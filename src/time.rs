use std::fmt;
use std::sync::OnceLock;

use log::warn;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime, UtcOffset};

#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    pub fn now() -> Self {
        OffsetDateTime::now_utc().into()
    }

    /// Parse an RFC 3339 timestamp as sent by the document store, shifted
    /// into the local offset.
    pub fn from_server(s: &str) -> Result<Self, time::error::Parse> {
        let when = OffsetDateTime::parse(s, &Rfc3339)?;
        Ok(Self(when.to_offset(local_offset())))
    }
}

fn local_offset() -> UtcOffset {
    static OFFSET: OnceLock<UtcOffset> = OnceLock::new();

    // fails on multi-threaded unix processes, so utc is the usual answer there
    *OFFSET.get_or_init(|| {
        UtcOffset::current_local_offset().unwrap_or_else(|e| {
            warn!("couldn't determine local offset, using utc: {e}");
            UtcOffset::UTC
        })
    })
}

impl From<OffsetDateTime> for Timestamp {
    fn from(when: OffsetDateTime) -> Self {
        Self(when)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(s) => write!(fmt, "{}", s),
            Err(_) => write!(fmt, "{}", self.0.unix_timestamp()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use ::time::macros::datetime;

    #[test]
    fn server_timestamps_keep_their_instant() {
        let ts = Timestamp::from_server("2024-05-01T10:30:00.123456Z").unwrap();

        assert_eq!(ts, Timestamp::from(datetime!(2024-05-01 10:30:00.123456 UTC)));
    }

    #[test]
    fn server_timestamps_reject_garbage() {
        assert!(Timestamp::from_server("yesterday").is_err());
    }

    #[test]
    fn serialises_as_rfc3339() {
        let when = datetime!(2024-01-02 03:04:05 UTC);
        let json = serde_json::to_string(&Timestamp::from(when)).unwrap();

        assert_eq!(json, "\"2024-01-02T03:04:05Z\"");
    }
}
