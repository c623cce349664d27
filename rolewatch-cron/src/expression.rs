//! Cron expression parsing and evaluation.
//!
//! Expressions use the five-field crontab layout understood by CI servers:
//!
//! ```text
//! minute  hour  day-of-month  month  day-of-week
//! 0-59    0-23  1-31          1-12   0-7 (0 and 7 are Sunday)
//! ```
//!
//! On top of the usual `*`, ranges, steps and lists, each field accepts the
//! hashed wildcard `H`, optionally ranged (`H(0-29)`) and stepped (`H/15`).
//! `H` picks a stable value derived from a seed, which spreads schedules that
//! would otherwise all fire at the same instant. Without a seed `H` resolves
//! to the first value of its range, so `H 0 * * *` fires at midnight.
//!
//! Every line of a multi-line expression is a separate schedule; blank lines
//! and `#` comments are skipped and the expression matches when any line does.

use crate::error::{CronError, CronResult};
use chrono::{DateTime, TimeZone, Timelike};
use cron::Schedule;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::str::FromStr;

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const DAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Bounds and naming rules for one crontab field.
#[derive(Debug, Clone, Copy)]
struct Field {
    name: &'static str,
    min: u32,
    max: u32,
    /// Upper bound used when `H` is not given an explicit range.
    hash_max: u32,
    names: &'static [&'static str],
    /// Numeric value of `names[0]`.
    name_base: u32,
}

const FIELDS: [Field; 5] = [
    Field {
        name: "minute",
        min: 0,
        max: 59,
        hash_max: 59,
        names: &[],
        name_base: 0,
    },
    Field {
        name: "hour",
        min: 0,
        max: 23,
        hash_max: 23,
        names: &[],
        name_base: 0,
    },
    // Hashed days stop at 28 so they exist in every month.
    Field {
        name: "day-of-month",
        min: 1,
        max: 31,
        hash_max: 28,
        names: &[],
        name_base: 0,
    },
    Field {
        name: "month",
        min: 1,
        max: 12,
        hash_max: 12,
        names: &MONTH_NAMES,
        name_base: 1,
    },
    Field {
        name: "day-of-week",
        min: 0,
        max: 7,
        hash_max: 6,
        names: &DAY_NAMES,
        name_base: 0,
    },
];

impl Field {
    fn is_day_of_week(&self) -> bool {
        self.names.len() == DAY_NAMES.len()
    }

    fn value(&self, token: &str) -> CronResult<u32> {
        let token = token.trim();
        let value = match token.parse::<u32>() {
            Ok(value) => value,
            Err(_) => self
                .names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(token))
                .map(|index| index as u32 + self.name_base)
                .ok_or_else(|| {
                    CronError::InvalidExpression(format!(
                        "'{}' is not a valid {} value",
                        token, self.name
                    ))
                })?,
        };

        if value < self.min || value > self.max {
            return Err(CronError::InvalidExpression(format!(
                "{} value {} is outside {}-{}",
                self.name, value, self.min, self.max
            )));
        }

        Ok(value)
    }

    fn range(&self, token: &str) -> CronResult<(u32, u32)> {
        let (lo, hi) = token.split_once('-').ok_or_else(|| {
            CronError::InvalidExpression(format!("'{}' is not a {} range", token, self.name))
        })?;
        let (lo, hi) = (self.value(lo)?, self.value(hi)?);
        if lo > hi {
            return Err(CronError::InvalidExpression(format!(
                "{} range {}-{} is reversed",
                self.name, lo, hi
            )));
        }
        Ok((lo, hi))
    }

    fn render(&self, values: &BTreeSet<u32>) -> String {
        if self.is_day_of_week() {
            // Sunday may be written as 0 or 7.
            let days: BTreeSet<u32> = values.iter().map(|v| v % 7).collect();
            return days
                .iter()
                .map(|d| DAY_NAMES[*d as usize])
                .collect::<Vec<_>>()
                .join(",");
        }
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Source of values for the `H` token.
#[derive(Debug, Clone)]
struct Hash {
    seed: Option<String>,
}

impl Hash {
    /// A value in `0..bound`, stable for a given seed and field.
    fn next(&self, field: &Field, bound: u32) -> u32 {
        let Some(seed) = &self.seed else {
            return 0;
        };
        if bound == 0 {
            return 0;
        }

        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(b":");
        hasher.update(field.name.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(bytes) % u64::from(bound)) as u32
    }
}

/// Parsed cron expression.
#[derive(Debug, Clone)]
pub struct CronExpression {
    schedules: Vec<Schedule>,
    expression: String,
}

impl CronExpression {
    /// Parse an unseeded cron expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use rolewatch_cron::CronExpression;
    ///
    /// // Every day at midnight
    /// let expr = CronExpression::parse("H 0 * * *").unwrap();
    ///
    /// // Every fifteen minutes during working hours on weekdays
    /// let expr = CronExpression::parse("*/15 9-17 * * MON-FRI").unwrap();
    ///
    /// // Once a week
    /// let expr = CronExpression::parse("@weekly").unwrap();
    /// ```
    pub fn parse(expression: &str) -> CronResult<Self> {
        Self::parse_with_seed(expression, None)
    }

    /// Parse a cron expression whose `H` tokens are derived from `seed`.
    pub fn parse_with_seed(expression: &str, seed: Option<&str>) -> CronResult<Self> {
        let hash = Hash {
            seed: seed.map(str::to_string),
        };

        let mut schedules = Vec::new();
        for line in expression.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let translated = translate_line(line, &hash)?;
            let schedule = Schedule::from_str(&translated)
                .map_err(|e| CronError::InvalidExpression(format!("{}: {}", line, e)))?;
            schedules.push(schedule);
        }

        if schedules.is_empty() {
            return Err(CronError::EmptyExpression);
        }

        Ok(Self {
            schedules,
            expression: expression.to_string(),
        })
    }

    /// Check whether the expression fires during the wall-clock minute of `time`.
    ///
    /// Seconds are ignored; the minute is read in `time`'s own zone.
    pub fn matches<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> bool {
        let Some(minute) = time
            .clone()
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
        else {
            return false;
        };

        self.schedules
            .iter()
            .any(|schedule| schedule.includes(minute.clone()))
    }

    /// Get the next execution time after the given time.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedules
            .iter()
            .filter_map(|schedule| schedule.after(after).next())
            .min()
    }

    /// Get the expression string.
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

fn expand_alias(line: &str) -> &str {
    match line {
        "@yearly" | "@annually" => "H H H H *",
        "@monthly" => "H H H * *",
        "@weekly" => "H H * * H",
        "@daily" => "H H * * *",
        "@midnight" => "H H(0-2) * * *",
        "@hourly" => "H * * * *",
        other => other,
    }
}

/// Rewrite a five-field line as the six-field form the `cron` crate evaluates.
fn translate_line(line: &str, hash: &Hash) -> CronResult<String> {
    let line = expand_alias(line);
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != FIELDS.len() {
        return Err(CronError::InvalidExpression(format!(
            "'{}' has {} fields, expected {}",
            line,
            parts.len(),
            FIELDS.len()
        )));
    }

    let mut translated = vec!["0".to_string()];
    for (part, field) in parts.iter().zip(FIELDS.iter()) {
        translated.push(translate_field(part, field, hash)?);
    }

    Ok(translated.join(" "))
}

fn translate_field(part: &str, field: &Field, hash: &Hash) -> CronResult<String> {
    if part == "*" {
        return Ok("*".to_string());
    }

    let mut values = BTreeSet::new();
    for item in part.split(',') {
        values.extend(expand_item(item, field, hash)?);
    }

    if values.is_empty() {
        return Err(CronError::InvalidExpression(format!(
            "{} field '{}' selects nothing",
            field.name, part
        )));
    }

    Ok(field.render(&values))
}

fn expand_item(item: &str, field: &Field, hash: &Hash) -> CronResult<Vec<u32>> {
    let (body, step) = match item.split_once('/') {
        Some((body, step)) => {
            let step = step.trim().parse::<u32>().ok().filter(|s| *s > 0).ok_or_else(|| {
                CronError::InvalidExpression(format!("invalid step in '{}'", item))
            })?;
            (body, Some(step))
        }
        None => (item, None),
    };

    if let Some(rest) = body.strip_prefix('H') {
        let (lo, hi) = if rest.is_empty() {
            (field.min, field.hash_max)
        } else {
            let inner = rest
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .ok_or_else(|| {
                    CronError::InvalidExpression(format!("malformed hash token '{}'", item))
                })?;
            field.range(inner)?
        };

        let width = hi - lo + 1;
        return match step {
            // `H/1` picks one value, like a bare `H`
            None | Some(1) => Ok(vec![lo + hash.next(field, width)]),
            Some(step) if step > width => Err(CronError::InvalidExpression(format!(
                "step {} in '{}' is larger than the range {}-{}",
                step, item, lo, hi
            ))),
            Some(step) => {
                let start = lo + hash.next(field, step);
                Ok((start..=hi).step_by(step as usize).collect())
            }
        };
    }

    let (lo, hi) = if body == "*" {
        (field.min, field.max)
    } else if body.contains('-') {
        field.range(body)?
    } else {
        let value = field.value(body)?;
        // `5/15` means "from 5 to the end of the field, every 15".
        (value, if step.is_some() { field.max } else { value })
    };

    Ok((lo..=hi).step_by(step.unwrap_or(1) as usize).collect())
}

/// Common cron expression presets.
pub struct CronPresets;

impl CronPresets {
    /// Every minute
    pub const EVERY_MINUTE: &'static str = "* * * * *";

    /// Every 15 minutes
    pub const EVERY_15_MINUTES: &'static str = "*/15 * * * *";

    /// Once an hour
    pub const HOURLY: &'static str = "H * * * *";

    /// Once a day during the midnight hour (the rotation default)
    pub const DAILY: &'static str = "H 0 * * *";

    /// Exactly at midnight
    pub const MIDNIGHT: &'static str = "0 0 * * *";

    /// Once a week on Sunday
    pub const WEEKLY: &'static str = "H 0 * * 0";

    /// Once a month on the 1st
    pub const MONTHLY: &'static str = "H 0 1 * *";
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn matches_in_hour(expr: &CronExpression, hour_start: &str) -> usize {
        let start = at(hour_start);
        (0..60)
            .filter(|m| expr.matches(&(start + chrono::Duration::minutes(*m))))
            .count()
    }

    #[test]
    fn test_parse_valid_expression() {
        assert!(CronExpression::parse("0 * * * *").is_ok());
        assert!(CronExpression::parse("H H(0-2) * * 1-5").is_ok());
    }

    #[test]
    fn test_parse_invalid_expression() {
        assert!(CronExpression::parse("invalid").is_err());
        assert!(CronExpression::parse("* * * *").is_err());
        assert!(CronExpression::parse("60 * * * *").is_err());
        assert!(CronExpression::parse("*/0 * * * *").is_err());
        assert!(CronExpression::parse("H(5-1) * * * *").is_err());
        assert!(CronExpression::parse("0 0 * * FOO").is_err());
    }

    #[test]
    fn test_parse_empty_expression() {
        assert!(matches!(
            CronExpression::parse("   \n# nothing here\n"),
            Err(CronError::EmptyExpression)
        ));
    }

    #[test]
    fn test_unseeded_hash_is_range_start() {
        let expr = CronExpression::parse("H 0 * * *").unwrap();
        assert!(expr.matches(&at("2024-03-05T00:00:00+00:00")));
        assert!(!expr.matches(&at("2024-03-05T00:01:00+00:00")));
        assert!(!expr.matches(&at("2024-03-05T01:00:00+00:00")));
    }

    #[test]
    fn test_seconds_are_ignored() {
        let expr = CronExpression::parse("0 0 * * *").unwrap();
        assert!(expr.matches(&at("2024-03-05T00:00:42+00:00")));
    }

    #[test]
    fn test_step_values() {
        let expr = CronExpression::parse("*/15 * * * *").unwrap();
        assert!(expr.matches(&at("2024-03-05T10:30:00+00:00")));
        assert!(!expr.matches(&at("2024-03-05T10:31:00+00:00")));
        assert_eq!(matches_in_hour(&expr, "2024-03-05T10:00:00+00:00"), 4);
    }

    #[test]
    fn test_day_of_week_numbers() {
        let weekdays = CronExpression::parse("0 9 * * 1-5").unwrap();
        // 2024-03-04 is a Monday, 2024-03-09 a Saturday.
        assert!(weekdays.matches(&at("2024-03-04T09:00:00+00:00")));
        assert!(!weekdays.matches(&at("2024-03-09T09:00:00+00:00")));

        let sunday = CronExpression::parse("0 0 * * 7").unwrap();
        assert!(sunday.matches(&at("2024-03-10T00:00:00+00:00")));
        let sunday_zero = CronExpression::parse("0 0 * * 0").unwrap();
        assert!(sunday_zero.matches(&at("2024-03-10T00:00:00+00:00")));
    }

    #[test]
    fn test_names() {
        let expr = CronExpression::parse("0 0 1 mar-apr mon-fri").unwrap();
        assert!(expr.matches(&at("2024-03-01T00:00:00+00:00")));
        assert!(!expr.matches(&at("2024-05-01T00:00:00+00:00")));
    }

    #[test]
    fn test_seeded_hash_is_stable_and_in_range() {
        let a = CronExpression::parse_with_seed("H * * * *", Some("role-changes")).unwrap();
        let b = CronExpression::parse_with_seed("H * * * *", Some("role-changes")).unwrap();

        assert_eq!(matches_in_hour(&a, "2024-03-05T10:00:00+00:00"), 1);
        let start = at("2024-03-05T10:00:00+00:00");
        for m in 0..60 {
            let t = start + chrono::Duration::minutes(m);
            assert_eq!(a.matches(&t), b.matches(&t));
        }
    }

    #[test]
    fn test_seeded_hash_with_range_and_step() {
        let expr = CronExpression::parse_with_seed("H(0-29)/10 * * * *", Some("audit")).unwrap();
        assert_eq!(matches_in_hour(&expr, "2024-03-05T10:00:00+00:00"), 3);
    }

    #[test]
    fn test_hash_step_of_one_picks_single_value() {
        let expr = CronExpression::parse("H/1 0 * * *").unwrap();
        assert_eq!(matches_in_hour(&expr, "2024-03-05T00:00:00+00:00"), 1);

        let expr = CronExpression::parse_with_seed("H(10-19)/1 * * * *", Some("roles")).unwrap();
        assert_eq!(matches_in_hour(&expr, "2024-03-05T10:00:00+00:00"), 1);
    }

    #[test]
    fn test_hash_step_larger_than_range_is_rejected() {
        assert!(matches!(
            CronExpression::parse("H/90 * * * *"),
            Err(CronError::InvalidExpression(_))
        ));
        assert!(CronExpression::parse("H(0-9)/11 * * * *").is_err());
        assert!(CronExpression::parse("H(0-9)/10 * * * *").is_ok());
    }

    #[test]
    fn test_aliases() {
        let daily = CronExpression::parse("@daily").unwrap();
        assert!(daily.matches(&at("2024-03-05T00:00:00+00:00")));
        assert!(!daily.matches(&at("2024-03-05T12:00:00+00:00")));

        let hourly = CronExpression::parse("@hourly").unwrap();
        assert_eq!(matches_in_hour(&hourly, "2024-03-05T10:00:00+00:00"), 1);
    }

    #[test]
    fn test_multi_line_expression() {
        let expr = CronExpression::parse("0 1 * * *\n# second run\n30 2 * * *").unwrap();
        assert!(expr.matches(&at("2024-03-05T01:00:00+00:00")));
        assert!(expr.matches(&at("2024-03-05T02:30:00+00:00")));
        assert!(!expr.matches(&at("2024-03-05T02:00:00+00:00")));
    }

    #[test]
    fn test_matches_uses_wall_clock_of_zone() {
        let expr = CronExpression::parse("0 0 * * *").unwrap();
        assert!(expr.matches(&at("2024-03-05T00:00:00+05:30")));
        assert!(!expr.matches(&at("2024-03-04T18:30:00+00:00")));
    }

    #[test]
    fn test_next_after() {
        let expr = CronExpression::parse("0 12 * * *").unwrap();
        let next = expr.next_after(&at("2024-03-05T08:00:00+00:00")).unwrap();
        assert_eq!(next, at("2024-03-05T12:00:00+00:00"));
    }

    #[test]
    fn test_presets() {
        assert!(CronExpression::parse(CronPresets::EVERY_MINUTE).is_ok());
        assert!(CronExpression::parse(CronPresets::DAILY).is_ok());
        assert!(CronExpression::parse(CronPresets::WEEKLY).is_ok());
        assert!(CronExpression::parse(CronPresets::MONTHLY).is_ok());
    }
}
