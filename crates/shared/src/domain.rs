use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(ActivityId);
id_newtype!(ClientId);
id_newtype!(CategoryId);

/// Client reference embedded in every activity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityClient {
    pub id: ClientId,
    pub full_name: String,
    #[serde(default)]
    pub company: String,
}

/// A scheduled campaign send.
///
/// `brief` is rich text produced by the editor and is carried as opaque HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    #[serde(deserialize_with = "timestamp")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub brief: String,
    #[serde(default)]
    pub is_sent: bool,
    #[serde(
        default,
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub client: Option<ActivityClient>,
}

impl Activity {
    pub fn status_label(&self) -> &'static str {
        if self.is_sent {
            "Sent"
        } else {
            "Not Sent"
        }
    }
}

/// Parses an RFC 3339 timestamp, or a naive date-time or bare date read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{raw}'")))
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{raw}'"))),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCategory {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    pub id: ClientId,
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_category: Option<ClientCategory>,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub personal_information: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn activity_accepts_offset_and_naive_timestamps() {
        let row: Activity = serde_json::from_value(json!({
            "id": "act-1",
            "scheduledAt": "2026-03-14T09:00:00",
            "sentAt": "2026-03-14T11:30:00+07:00",
            "isSent": true,
            "client": null
        }))
        .expect("decode");
        assert_eq!(row.scheduled_at, Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap());
        assert_eq!(row.sent_at, Some(Utc.with_ymd_and_hms(2026, 3, 14, 4, 30, 0).unwrap()));
        assert_eq!(row.status_label(), "Sent");
    }

    #[test]
    fn empty_sent_at_reads_as_unsent() {
        let row: Activity = serde_json::from_value(json!({
            "id": "act-2",
            "scheduledAt": "2026-03-14 09:00:00.250",
            "sentAt": "",
        }))
        .expect("decode");
        assert_eq!(row.sent_at, None);
        assert_eq!(row.client, None);
    }

    #[test]
    fn timestamp_formats() {
        assert_eq!(
            parse_timestamp("2026-03-14"),
            Some(Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2026-03-14T09:00:00.000Z"),
            Some(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("next tuesday"), None);
    }
}
