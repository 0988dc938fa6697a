// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Date/time helpers: remaining-life arithmetic, period identifiers and
//! formatting.

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Timelike, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Life expectancy used when the profile carries no override.
pub const DEFAULT_LIFE_EXPECTANCY: f64 = 75.0;

const DAYS_PER_YEAR: f64 = 365.25;
const WEEKS_PER_YEAR: f64 = 52.143;
const MONTHS_PER_YEAR: f64 = 12.0;
const MILLIS_PER_YEAR: f64 = 1000.0 * 60.0 * 60.0 * 24.0 * DAYS_PER_YEAR;

/// Errors from parsing birth date/time strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid time of day: {0}")]
    InvalidTime(String),
}

/// How a life-expectancy override is resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifeExpectancyPolicy {
    pub default_years: f64,
    /// When true, an override of exactly zero is treated as "unset".
    /// When false, zero is honoured and every unit comes out as zero.
    pub zero_means_default: bool,
}

impl Default for LifeExpectancyPolicy {
    fn default() -> Self {
        Self {
            default_years: DEFAULT_LIFE_EXPECTANCY,
            zero_means_default: true,
        }
    }
}

impl LifeExpectancyPolicy {
    /// Effective expectancy in years for an optional override.
    pub fn resolve(&self, override_years: Option<f64>) -> f64 {
        match override_years {
            None => self.default_years,
            Some(years) if years.is_nan() => self.default_years,
            Some(years) if years == 0.0 && self.zero_means_default => self.default_years,
            Some(years) => years,
        }
    }
}

/// Estimated time remaining, every unit floored and never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimeRemaining {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub years: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub months: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub weeks: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub days: u64,
}

/// Compute time remaining as of now, using the default policy.
pub fn calculate_time_remaining(
    birthdate: &str,
    birth_time: Option<&str>,
    life_expectancy: Option<f64>,
) -> Result<TimeRemaining, TimeError> {
    calculate_time_remaining_at(
        Utc::now(),
        birthdate,
        birth_time,
        life_expectancy,
        &LifeExpectancyPolicy::default(),
    )
}

/// Compute time remaining relative to `now`.
///
/// Age is measured in fractional years of 365.25 days. All four units are
/// derived from the same remaining-years value.
pub fn calculate_time_remaining_at(
    now: DateTime<Utc>,
    birthdate: &str,
    birth_time: Option<&str>,
    life_expectancy: Option<f64>,
    policy: &LifeExpectancyPolicy,
) -> Result<TimeRemaining, TimeError> {
    let born = parse_birth_instant(birthdate, birth_time)?;

    let age_years = (now - born).num_milliseconds() as f64 / MILLIS_PER_YEAR;
    let remaining_years = policy.resolve(life_expectancy) - age_years;

    Ok(TimeRemaining {
        years: floor_non_negative(remaining_years),
        months: floor_non_negative(remaining_years * MONTHS_PER_YEAR),
        weeks: floor_non_negative(remaining_years * WEEKS_PER_YEAR),
        days: floor_non_negative(remaining_years * DAYS_PER_YEAR),
    })
}

fn floor_non_negative(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u64
    } else {
        0
    }
}

/// Parse a birth date (`YYYY-MM-DD` or RFC 3339) with an optional `HH:MM`.
pub fn parse_birth_instant(
    birthdate: &str,
    birth_time: Option<&str>,
) -> Result<DateTime<Utc>, TimeError> {
    let birthdate = birthdate.trim();
    let date = match NaiveDate::parse_from_str(birthdate, "%Y-%m-%d") {
        Ok(date) => date.and_time(NaiveTime::MIN).and_utc(),
        Err(_) => DateTime::parse_from_rfc3339(birthdate)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| TimeError::InvalidDate(birthdate.to_string()))?,
    };

    match birth_time.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(date),
        Some(raw) => {
            let time = parse_hours_minutes(raw)?;
            Ok(date.date_naive().and_time(time).and_utc())
        }
    }
}

fn parse_hours_minutes(raw: &str) -> Result<NaiveTime, TimeError> {
    let invalid = || TimeError::InvalidTime(raw.to_string());

    let (hours, minutes) = raw.split_once(':').ok_or_else(invalid)?;
    let hours = hours.parse::<u32>().map_err(|_| invalid())?;
    let minutes = minutes.parse::<u32>().map_err(|_| invalid())?;

    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

// ─── Period identifiers ──────────────────────────────────────

/// Granularity tag attached to journal entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum PeriodType {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl PeriodType {
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodType::Day => "day",
            PeriodType::Week => "week",
            PeriodType::Month => "month",
            PeriodType::Year => "year",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(PeriodType::Day),
            "week" => Ok(PeriodType::Week),
            "month" => Ok(PeriodType::Month),
            "year" => Ok(PeriodType::Year),
            other => Err(format!("unknown period type: {other}")),
        }
    }
}

/// Resolution of `day` period identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayGranularity {
    /// `day-YYYY-MM-DD-HH-MM-SS`: entries written in different seconds land
    /// in different periods.
    #[default]
    Second,
    /// `day-YYYY-MM-DD`: one period per calendar day.
    Calendar,
}

impl FromStr for DayGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "second" | "seconds" => Ok(DayGranularity::Second),
            "calendar" | "day" => Ok(DayGranularity::Calendar),
            other => Err(format!("unknown day granularity: {other}")),
        }
    }
}

/// Period identifier for the current UTC instant.
pub fn generate_time_period_id(period_type: PeriodType) -> String {
    time_period_id_at(&Utc::now(), period_type, DayGranularity::Second)
}

/// Period identifier for an explicit instant.
///
/// Weeks use the ISO week and ISO week-year, so the last days of December can
/// belong to week 1 of the following year.
pub fn time_period_id_at<Tz: TimeZone>(
    now: &DateTime<Tz>,
    period_type: PeriodType,
    granularity: DayGranularity,
) -> String {
    match period_type {
        PeriodType::Day => match granularity {
            DayGranularity::Second => format!(
                "day-{:04}-{:02}-{:02}-{:02}-{:02}-{:02}",
                now.year(),
                now.month(),
                now.day(),
                now.hour(),
                now.minute(),
                now.second()
            ),
            DayGranularity::Calendar => format!(
                "day-{:04}-{:02}-{:02}",
                now.year(),
                now.month(),
                now.day()
            ),
        },
        PeriodType::Week => {
            let week = now.iso_week();
            format!("week-{}-{}", week.year(), week.week())
        }
        PeriodType::Month => format!("month-{}-{}", now.year(), now.month()),
        PeriodType::Year => format!("year-{}", now.year()),
    }
}

// ─── Formatting ──────────────────────────────────────────────

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Long-form date, e.g. "May 15, 1990".
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
