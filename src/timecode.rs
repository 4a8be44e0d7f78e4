pub const SECONDS_PER_HOUR: u64 = 3600;
pub const SECONDS_PER_MINUTE: u64 = 60;

pub fn encode(seconds: u64) -> String {
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = seconds % SECONDS_PER_MINUTE;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Parses `HH:MM:SS` leniently. Anything that is not three `:`-separated
/// parts is zero, and a part that is not a number counts as zero.
pub fn decode(value: &str) -> u64 {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 {
        return 0;
    }

    let field = |raw: &str| raw.trim().parse::<u64>().unwrap_or(0);
    let hours = field(parts[0]);
    let minutes = field(parts[1]);
    let seconds = field(parts[2]);

    hours
        .saturating_mul(SECONDS_PER_HOUR)
        .saturating_add(minutes.saturating_mul(SECONDS_PER_MINUTE))
        .saturating_add(seconds)
}

pub mod hms {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(u64),
        Other(IgnoredAny),
    }

    pub fn serialize<S>(seconds: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::encode(*seconds))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Raw::Text(text)) => super::decode(&text),
            Some(Raw::Seconds(seconds)) => seconds,
            Some(Raw::Other(IgnoredAny)) | None => 0,
        })
    }
}
