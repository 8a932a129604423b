//! Shaping of upstream reports into their user-facing form

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use super::entity::{FormattedReport, RawReport, RawUser, ReportUser};

/// Joins a report with its owner
///
/// Returns `None` when the report lacks an id or a title. Dates that cannot
/// be parsed are dropped; the rest are sorted earliest first.
pub fn format_report(report: &RawReport, user: &RawUser) -> Option<FormattedReport> {
    let id = report.nid.clone().filter(|id| !id.is_empty())?;
    let title = report
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())?
        .to_string();

    let mut dates: Vec<DateTime<Utc>> = report.dates.iter().filter_map(parse_date).collect();
    dates.sort();

    Some(FormattedReport {
        id,
        title,
        body: report.body.clone().filter(|b| !b.trim().is_empty()),
        dates,
        location_desc: report.location_desc.clone(),
        images: report.images.clone(),
        permalink: report.permalink.clone(),
        user: format_user(report, user),
    })
}

fn format_user(report: &RawReport, user: &RawUser) -> ReportUser {
    let id = user
        .uid
        .clone()
        .or_else(|| report.uid.clone())
        .unwrap_or_default();

    let name = [user.realname.as_deref(), user.name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|n| !n.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    let image = match &user.picture {
        Some(Value::String(url)) if !url.is_empty() => Some(url.clone()),
        Some(Value::Object(map)) => map.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    ReportUser { id, name, image }
}

/// Parses a date given as `YYYY-MM-DD`, RFC 3339 or unix seconds
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    s.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
