//! Cron evaluation: validation and next-instant computation.
//!
//! Expressions use the standard 5 fields (minute, hour, day-of-month, month,
//! day-of-week). The `cron` crate wants a leading seconds field and counts
//! days of the week from 1 = Sunday, so [`StandardCron`] pins seconds to 0
//! and rewrites numeric days (0 or 7 = Sunday) to their names first.
//!
//! When both day-of-month and day-of-week are restricted, a day matching
//! either field fires. The `cron` crate requires both to match, so such an
//! expression is evaluated as two schedules and the earlier instant wins.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use indexmap::IndexSet;

use crate::core::error::{Result, SchedulerError};

/// Longest accepted expression.
pub const MAX_EXPRESSION_LEN: usize = 50;

const DAY_NAMES: [&str; 8] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

/// Computes run instants from cron expressions.
pub trait CronEvaluator: Send + Sync {
    /// Check that `expression` is well formed.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidArgument`] for malformed expressions.
    fn validate(&self, expression: &str) -> Result<()>;

    /// First instant matching `expression` strictly after `reference`.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidArgument`] for malformed expressions or ones
    /// that never fire after `reference`.
    fn next_instant(&self, expression: &str, reference: DateTime<Utc>) -> Result<DateTime<Utc>>;
}

/// Standard 5-field cron backed by the `cron` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCron;

impl StandardCron {
    fn parse(expression: &str) -> Result<Vec<Schedule>> {
        normalize(expression)?
            .iter()
            .map(|normalized| {
                Schedule::from_str(normalized).map_err(|e| {
                    SchedulerError::invalid_argument(
                        "cron",
                        format!("`{expression}` must be a valid cron: {e}"),
                    )
                })
            })
            .collect()
    }
}

impl CronEvaluator for StandardCron {
    fn validate(&self, expression: &str) -> Result<()> {
        Self::parse(expression).map(|_| ())
    }

    fn next_instant(&self, expression: &str, reference: DateTime<Utc>) -> Result<DateTime<Utc>> {
        Self::parse(expression)?
            .iter()
            .filter_map(|schedule| schedule.after(&reference).next())
            .min()
            .ok_or_else(|| {
                SchedulerError::invalid_argument(
                    "cron",
                    format!("`{expression}` has no occurrence after {}", reference.to_rfc3339()),
                )
            })
    }
}

/// Rewrite a 5-field expression into one or two `cron` crate expressions.
fn normalize(expression: &str) -> Result<Vec<String>> {
    let trimmed = expression.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_EXPRESSION_LEN {
        return Err(SchedulerError::invalid_argument(
            "cron",
            format!("must be between 1 and {MAX_EXPRESSION_LEN} characters"),
        ));
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    let [minute, hour, day_of_month, month, day_of_week] = fields.as_slice() else {
        return Err(SchedulerError::invalid_argument(
            "cron",
            format!("`{trimmed}` must have 5 fields, found {}", fields.len()),
        ));
    };

    let both_restricted =
        !matches!(*day_of_month, "*" | "?") && !matches!(*day_of_week, "*" | "?");

    let day_of_week = day_of_week
        .split(',')
        .map(normalize_day_item)
        .collect::<Result<Vec<_>>>()?
        .join(",");

    let render = |dom: &str, dow: &str| format!("0 {minute} {hour} {dom} {month} {dow}");
    if both_restricted {
        Ok(vec![render(*day_of_month, "*"), render("*", &day_of_week)])
    } else {
        Ok(vec![render(*day_of_month, &day_of_week)])
    }
}

fn normalize_day_item(item: &str) -> Result<String> {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (item, None),
    };

    match (base.split_once('-'), step) {
        (Some((start, end)), Some(step)) => expand_stepped_range(start, end, step),
        // `cron` ranges cannot wrap past Saturday, so "x-7" becomes "x-SAT,SUN".
        (Some((start, "7")), None) => {
            let start = day_token(start)?;
            if start == "SUN" {
                Ok("SUN-SAT".to_string())
            } else {
                Ok(format!("{start}-SAT,SUN"))
            }
        }
        (Some((start, end)), None) => Ok(format!("{}-{}", day_token(start)?, day_token(end)?)),
        (None, Some(step)) => Ok(format!("{}/{step}", day_token(base)?)),
        (None, None) => day_token(base),
    }
}

/// List the days of a stepped range by name, e.g. "5-7/2" as "FRI,SUN".
fn expand_stepped_range(start: &str, end: &str, step: &str) -> Result<String> {
    let invalid = || {
        SchedulerError::invalid_argument(
            "cron",
            format!("day of week range `{start}-{end}/{step}` is invalid"),
        )
    };

    let (first, last) = (day_number(start)?, day_number(end)?);
    let step = step
        .parse::<usize>()
        .ok()
        .filter(|step| *step > 0)
        .ok_or_else(invalid)?;
    if first > last {
        return Err(invalid());
    }

    // 0 and 7 are both Sunday
    let days: IndexSet<&str> = (first..=last).step_by(step).map(|day| DAY_NAMES[day]).collect();
    Ok(days.into_iter().collect::<Vec<_>>().join(","))
}

fn day_number(token: &str) -> Result<usize> {
    token
        .parse::<usize>()
        .ok()
        .or_else(|| DAY_NAMES.iter().position(|name| name.eq_ignore_ascii_case(token)))
        .filter(|day| *day < DAY_NAMES.len())
        .ok_or_else(|| {
            SchedulerError::invalid_argument("cron", format!("day of week `{token}` is out of range 0-7"))
        })
}

fn day_token(token: &str) -> Result<String> {
    match token.parse::<usize>() {
        Ok(day) => DAY_NAMES.get(day).map(|name| (*name).to_string()).ok_or_else(|| {
            SchedulerError::invalid_argument("cron", format!("day of week `{day}` is out of range 0-7"))
        }),
        Err(_) => Ok(token.to_string()),
    }
}
