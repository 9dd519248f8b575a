//! Serde helpers for blobs written by the browser client, which stores
//! numeric `Date.now()` ids, `toDateString()` days and locale clock times.

use serde::{de, Deserialize, Deserializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Uuid(Uuid),
    Millis(u64),
}

/// A uuid, or a numeric id mapped into the uuid space.
pub fn id<'de, D: Deserializer<'de>>(de: D) -> Result<Uuid, D::Error> {
    Ok(match RawId::deserialize(de)? {
        RawId::Uuid(id) => id,
        RawId::Millis(n) => Uuid::from_u128(u128::from(n)),
    })
}

/// `2024-05-10` or `Fri May 10 2024`.
pub fn day<'de, D: Deserializer<'de>>(de: D) -> Result<Date, D::Error> {
    let raw = String::deserialize(de)?;
    Date::parse(&raw, format_description!("[year]-[month]-[day]"))
        .or_else(|_| {
            Date::parse(
                &raw,
                format_description!("[weekday repr:short] [month repr:short] [day] [year]"),
            )
        })
        .map_err(de::Error::custom)
}

/// RFC 3339 timestamps; locale strings such as `7:05:12 AM` carry no date
/// and read as `None`.
pub fn timestamp<'de, D: Deserializer<'de>>(de: D) -> Result<Option<OffsetDateTime>, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| OffsetDateTime::parse(&s, &Rfc3339).ok()))
}
