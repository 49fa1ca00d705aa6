use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};

/// 日桶：参考时区下的自然日，计数记录的分区键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayBucket(NaiveDate);

impl DayBucket {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// 由事件自身的 Unix 秒时间戳推导日桶（毫秒精度四舍五入）。
    ///
    /// 使用事件时间而不是到达时间，迟到的事件仍会落到正确的日桶。
    pub fn from_timestamp(seconds: f64, offset: FixedOffset) -> DomainResult<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(DomainError::invalid_event(
                "timestamp",
                format!("{seconds} is not a valid unix timestamp"),
            ));
        }
        let millis = (seconds * 1000.0).round();
        if millis > i64::MAX as f64 {
            return Err(DomainError::invalid_event("timestamp", "out of range"));
        }
        let instant = DateTime::<Utc>::from_timestamp_millis(millis as i64)
            .ok_or_else(|| DomainError::invalid_event("timestamp", "out of range"))?;
        Ok(Self::containing(instant, offset))
    }

    /// 某一时刻在参考时区下所属的日桶
    pub fn containing(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self(instant.with_timezone(&offset).date_naive())
    }

    /// 往前数 `days` 天的日桶
    pub fn days_before(&self, days: u32) -> Option<Self> {
        self.0.checked_sub_days(Days::new(u64::from(days))).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DayBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayBucket {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|e| DomainError::invalid_event("day", format!("{s}: {e}")))
    }
}

impl From<NaiveDate> for DayBucket {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

/// 反应（emoji）名称，例如 `tada`。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionName(String);

impl ReactionName {
    pub fn parse(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_event("reaction", "must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReactionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 做出反应的用户标识（Slack 用户 ID，例如 `U024BE7LH`）。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlackUserId(String);

impl SlackUserId {
    pub fn parse(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_event("user", "must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlackUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
