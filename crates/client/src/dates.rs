//! Outgoing date normalisation.
//!
//! Date-only fields are sent as `YYYY-MM-DD`, timestamps as RFC 3339 in UTC,
//! whatever shape the caller built them in.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

const DATE_FIELDS: &[&str] = &[
    "startDate",
    "endDate",
    "plannedStart",
    "plannedEnd",
    "start_date",
    "end_date",
    "planned_start",
    "planned_end",
];

const TIMESTAMP_FIELDS: &[&str] = &["actualStart", "actualEnd", "actual_start", "actual_end"];

/// Rewrite known date fields of `value` in place, at any depth.
///
/// Values that do not parse as a date are left untouched for the server to
/// reject.
pub fn normalize_dates(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if let Value::String(raw) = field {
                    if DATE_FIELDS.contains(&key.as_str()) {
                        if let Some(date) = parse_date(raw) {
                            *raw = date.format("%Y-%m-%d").to_string();
                        }
                        continue;
                    }
                    if TIMESTAMP_FIELDS.contains(&key.as_str()) {
                        if let Some(at) = parse_timestamp(raw) {
                            *raw = at.to_rfc3339_opts(SecondsFormat::AutoSi, true);
                        }
                        continue;
                    }
                }
                normalize_dates(field);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_dates),
        _ => {}
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|at| at.date_naive()))
        .or_else(|| parse_naive_datetime(raw).map(|at| at.date()))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Some(at) = parse_naive_datetime(raw) {
        return Some(at.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

fn parse_naive_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn date_fields_lose_their_time() {
        let mut body = json!({
            "plannedStart": "2024-06-01T22:30:00Z",
            "plannedEnd": "2024-06-03 08:00:00",
            "startDate": "2024-06-01",
        });
        normalize_dates(&mut body);
        assert_eq!(
            body,
            json!({
                "plannedStart": "2024-06-01",
                "plannedEnd": "2024-06-03",
                "startDate": "2024-06-01",
            })
        );
    }

    #[test]
    fn timestamps_become_utc_rfc3339() {
        let mut body = json!({
            "actualStart": "2024-06-01T10:00:00+02:00",
            "actualEnd": "2024-06-03T09:15:00",
        });
        normalize_dates(&mut body);
        assert_eq!(body["actualStart"], "2024-06-01T08:00:00Z");
        assert_eq!(body["actualEnd"], "2024-06-03T09:15:00Z");
    }

    #[test]
    fn nested_and_unknown_values_are_handled() {
        let mut body = json!({
            "rents": [{"planned_start": "2024-06-01T00:00:00Z"}],
            "plannedEnd": "someday",
            "note": "2024-06-01T10:00:00Z",
            "actualEnd": null,
        });
        normalize_dates(&mut body);
        assert_eq!(body["rents"][0]["planned_start"], "2024-06-01");
        assert_eq!(body["plannedEnd"], "someday");
        assert_eq!(body["note"], "2024-06-01T10:00:00Z");
        assert!(body["actualEnd"].is_null());
    }
}
