//! Payloads submitted by the create/edit dialogs, with the checks the dialogs
//! run before anything is sent to the backend.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const RECEIVER_KINDS: [&str; 3] = ["Admin", "User", "Manager"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} has an invalid format: {value}")]
    InvalidFormat { field: &'static str, value: String },
    #[error("{field} must be one of Admin, User, Manager (got {value})")]
    UnknownOption { field: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityForm {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub receiver: String,
    /// Editor output, sent as-is.
    pub brief: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ActivityForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let date = required("date", &self.date)?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            ValidationError::InvalidFormat {
                field: "date",
                value: date.to_string(),
            }
        })?;

        let time = required("time", &self.time)?;
        NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| ValidationError::InvalidFormat {
            field: "time",
            value: time.to_string(),
        })?;

        one_of("receiver", &self.receiver)?;

        if html_text(&self.brief).trim().is_empty() {
            return Err(ValidationError::Required { field: "brief" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl UserForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("name", &self.name)?;
        one_of("type", &self.kind)?;
        Ok(())
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(value)
}

fn one_of(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let value = required(field, value)?;
    if RECEIVER_KINDS.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::UnknownOption {
            field,
            value: value.to_string(),
        })
    }
}

/// Text content of an HTML fragment. Tags are dropped, entities are left alone.
fn html_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    text.replace("&nbsp;", " ")
}
