//! Order statistics over a range of archived days.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::Serialize;
use time::{Date, Duration};
use tracing::warn;

use crate::clock::{format_date, LocalClock};
use crate::error::AppError;
use crate::orders::repo::{list_active, list_archive_dates, list_completed};
use crate::orders::repo_types::CompletedOrder;
use crate::store::{DocumentStore, StoreResult};

mod dto;
pub mod handlers;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFilter {
    #[default]
    Daily,
    Weekly,
    Monthly,
    All,
}

impl FromStr for ReportFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "all" => Ok(Self::All),
            other => Err(AppError::Validation(format!(
                "unknown filter '{other}', expected daily, weekly, monthly or all"
            ))),
        }
    }
}

impl fmt::Display for ReportFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::All => "all",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStats {
    pub total: u32,
    pub completed: u32,
    pub pending: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResult {
    pub filter: ReportFilter,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub stats: ReportStats,
    pub total_orders: u32,
    pub item_counts: BTreeMap<String, u32>,
    pub slot_counts: BTreeMap<String, u32>,
    pub orders: Vec<CompletedOrder>,
}

/// Inclusive calendar range; empty when `start` is after `end`.
pub fn date_range(start: Date, end: Date) -> Vec<Date> {
    let mut days = Vec::new();
    let mut current = Some(start);
    while let Some(day) = current.filter(|d| *d <= end) {
        days.push(day);
        current = day.next_day();
    }
    days
}

/// The `[start, end]` a filter covers on `today`, before overrides.
fn default_range(filter: ReportFilter, today: Date) -> Option<(Date, Date)> {
    match filter {
        ReportFilter::Daily => Some((today, today)),
        ReportFilter::Weekly => Some((today - Duration::days(6), today)),
        ReportFilter::Monthly => Some((today - Duration::days(i64::from(today.day()) - 1), today)),
        ReportFilter::All => None,
    }
}

pub async fn get_reports(
    store: &dyn DocumentStore,
    clock: &LocalClock,
    filter: ReportFilter,
    start: Option<Date>,
    end: Option<Date>,
) -> StoreResult<ReportResult> {
    let today = clock.today();

    let range = default_range(filter, today).map(|(from, to)| match filter {
        ReportFilter::Daily => {
            let day = start.unwrap_or(from);
            (day, day)
        }
        _ => (start.unwrap_or(from), end.unwrap_or(to)),
    });

    let mut orders = Vec::new();
    match range {
        Some((from, to)) => {
            for day in date_range(from, to) {
                orders.extend(list_completed(store, day).await?);
            }
        }
        None => {
            for day in list_archive_dates(store).await? {
                for mut done in list_completed(store, day).await? {
                    done.order.date = day;
                    orders.push(done);
                }
            }
        }
    }

    let mut item_counts = BTreeMap::new();
    let mut slot_counts = BTreeMap::new();
    for done in &orders {
        *item_counts.entry(done.order.item.clone()).or_insert(0) += 1;
        *slot_counts.entry(done.order.slot.to_string()).or_insert(0) += 1;
    }
    let completed = orders.len() as u32;

    let pending = match range {
        Some((day, _)) if filter == ReportFilter::Daily && day == today => {
            match list_active(store, today).await {
                Ok(active) => active.len() as u32,
                Err(e) => {
                    warn!(error = %e, "could not count pending orders; reporting 0");
                    0
                }
            }
        }
        _ => 0,
    };
    let total = completed + pending;

    Ok(ReportResult {
        filter,
        start_date: range.map(|(from, _)| format_date(from)),
        end_date: range.map(|(_, to)| format_date(to)),
        stats: ReportStats {
            total,
            completed,
            pending,
        },
        total_orders: total,
        item_counts,
        slot_counts,
        orders,
    })
}
