use chrono::{SecondsFormat, Utc};

/// Computes the value written to the store on a miss
pub trait ValueSource: Send + Sync + 'static {
    fn compute(&self) -> String;
}

/// Current UTC time in RFC 3339 with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`
#[derive(Clone, Copy, Debug, Default)]
pub struct UtcTimestamp;

impl ValueSource for UtcTimestamp {
    fn compute(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
