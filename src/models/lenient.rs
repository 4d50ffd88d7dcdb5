//! Deserializers that accept the shapes older clients persisted: numeric ids
//! and epoch-millisecond timestamps next to RFC 3339 strings.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
    Float(f64),
}

impl RawTimestamp {
    fn into_datetime<E: Error>(self) -> Result<DateTime<Utc>, E> {
        let millis = match self {
            RawTimestamp::Text(text) => {
                return DateTime::parse_from_rfc3339(&text)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| E::custom(format!("invalid timestamp {text:?}: {e}")));
            }
            RawTimestamp::Millis(ms) => ms,
            RawTimestamp::Float(ms) => ms as i64,
        };
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| E::custom(format!("timestamp out of range: {millis}")))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

pub fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    RawTimestamp::deserialize(deserializer)?.into_datetime()
}

pub fn optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Option::<RawTimestamp>::deserialize(deserializer)?
        .map(RawTimestamp::into_datetime)
        .transpose()
}

/// Ids are strings, but records written by older clients may carry numbers.
pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}
