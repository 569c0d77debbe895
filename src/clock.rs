use std::sync::Arc;

use time::{
    format_description::FormatItem, macros::format_description, Date, OffsetDateTime, UtcOffset,
};

use crate::error::AppError;

/// Calendar date as stored in documents and keys: `YYYY-MM-DD`.
pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

// Fixed width and always UTC, so stored timestamps sort lexically.
const STAMP_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6][offset_hour sign:mandatory]:[offset_minute]"
);

/// Serde adapter for local calendar dates.
pub mod day {
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        let text = date.format(&super::DATE_FORMAT).map_err(S::Error::custom)?;
        s.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let text = String::deserialize(d)?;
        Date::parse(&text, &super::DATE_FORMAT).map_err(D::Error::custom)
    }
}

/// Serde adapter for stored instants.
pub mod stamp {
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};
    use time::{OffsetDateTime, UtcOffset};

    pub fn serialize<S: Serializer>(at: &OffsetDateTime, s: S) -> Result<S::Ok, S::Error> {
        let text = at
            .to_offset(UtcOffset::UTC)
            .format(&super::STAMP_FORMAT)
            .map_err(S::Error::custom)?;
        s.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(d)?;
        OffsetDateTime::parse(&text, &super::STAMP_FORMAT).map_err(D::Error::custom)
    }
}

pub fn format_date(date: Date) -> String {
    date.format(&DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), &DATE_FORMAT)
        .map_err(|_| AppError::Validation(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

pub trait TimeSource: Send + Sync {
    fn now_utc(&self) -> OffsetDateTime;
}

pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Wall clock viewed at the café's fixed UTC offset.
#[derive(Clone)]
pub struct LocalClock {
    source: Arc<dyn TimeSource>,
    offset: UtcOffset,
}

impl LocalClock {
    pub fn system(offset: UtcOffset) -> Self {
        Self::with_source(Arc::new(SystemTime), offset)
    }

    pub fn with_source(source: Arc<dyn TimeSource>, offset: UtcOffset) -> Self {
        Self { source, offset }
    }

    pub fn now_utc(&self) -> OffsetDateTime {
        self.source.now_utc().to_offset(UtcOffset::UTC)
    }

    pub fn now(&self) -> OffsetDateTime {
        self.now_utc().to_offset(self.offset)
    }

    pub fn today(&self) -> Date {
        self.now().date()
    }

    pub fn hour(&self) -> u8 {
        self.now().hour()
    }
}

#[cfg(test)]
pub use manual::ManualTime;
