use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::FieldErrors;

/// Declares a settings enum stored and transmitted as its exact wire string.
macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            fn allowed() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(format!("must be one of: {}", Self::allowed())),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum!(
    /// Display currency for prices and reports
    Currency { Usd => "USD", Rwf => "RWF" }
);

closed_enum!(
    /// UI language (English, Kinyarwanda)
    Language { En => "en", Rw => "rw" }
);

closed_enum!(Theme { Light => "light", Dark => "dark", System => "system" });

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_DATE_FORMAT: &str = "DD/MM/YYYY";
pub const MAX_DATE_FORMAT_LEN: usize = 32;
pub const DEFAULT_WORKING_DAYS: &[u8] = &[1, 2, 3, 4, 5, 6];

fn default_business_hours() -> (NaiveTime, NaiveTime) {
    (
        NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
        NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
    )
}

/// The single settings row owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: Uuid,
    pub currency: Currency,
    pub language: Language,
    pub timezone: String,
    pub date_format: String,
    pub theme: Theme,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub push_notifications: bool,
    pub low_stock_alerts: bool,
    pub daily_reports: bool,
    pub weekly_reports: bool,
    #[serde(with = "time_of_day")]
    pub business_hours_start: NaiveTime,
    #[serde(with = "time_of_day")]
    pub business_hours_end: NaiveTime,
    /// ISO weekday numbers, Monday = 1 … Sunday = 7
    pub working_days: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    /// Default-valued row for a user that has never saved settings
    pub fn defaults(user_id: Uuid, now: DateTime<Utc>) -> Self {
        let (start, end) = default_business_hours();
        Self {
            user_id,
            currency: Currency::Usd,
            language: Language::En,
            timezone: DEFAULT_TIMEZONE.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            theme: Theme::Light,
            email_notifications: true,
            sms_notifications: false,
            push_notifications: true,
            low_stock_alerts: true,
            daily_reports: false,
            weekly_reports: true,
            business_hours_start: start,
            business_hours_end: end,
            working_days: DEFAULT_WORKING_DAYS.to_vec(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a validated patch. Fields absent from the patch keep their value.
    ///
    /// Business hours are checked against the merged result, so a patch that
    /// only moves the start past the stored end is rejected.
    pub fn merged(&self, patch: &SettingsPatch) -> Result<UserSettings, FieldErrors> {
        let mut next = self.clone();

        if let Some(v) = patch.currency {
            next.currency = v;
        }
        if let Some(v) = patch.language {
            next.language = v;
        }
        if let Some(v) = &patch.timezone {
            next.timezone = v.clone();
        }
        if let Some(v) = &patch.date_format {
            next.date_format = v.clone();
        }
        if let Some(v) = patch.theme {
            next.theme = v;
        }
        if let Some(v) = patch.email_notifications {
            next.email_notifications = v;
        }
        if let Some(v) = patch.sms_notifications {
            next.sms_notifications = v;
        }
        if let Some(v) = patch.push_notifications {
            next.push_notifications = v;
        }
        if let Some(v) = patch.low_stock_alerts {
            next.low_stock_alerts = v;
        }
        if let Some(v) = patch.daily_reports {
            next.daily_reports = v;
        }
        if let Some(v) = patch.weekly_reports {
            next.weekly_reports = v;
        }
        if let Some(v) = patch.business_hours_start {
            next.business_hours_start = v;
        }
        if let Some(v) = patch.business_hours_end {
            next.business_hours_end = v;
        }
        if let Some(v) = &patch.working_days {
            next.working_days = v.clone();
        }

        if next.business_hours_start >= next.business_hours_end {
            let mut errors = FieldErrors::new();
            let field = if patch.business_hours_start.is_some() {
                "business_hours_start"
            } else {
                "business_hours_end"
            };
            errors.insert(
                field.to_string(),
                "business_hours_start must be earlier than business_hours_end".to_string(),
            );
            return Err(errors);
        }

        Ok(next)
    }

    /// Bump `updated_at` so it is strictly greater than the previous value.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.updated_at + Duration::microseconds(1);
        self.updated_at = if now > floor { now } else { floor };
    }
}

/// Raw `PUT /settings` body. Every field is optional; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatchRequest {
    pub currency: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub date_format: Option<String>,
    pub theme: Option<String>,
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub low_stock_alerts: Option<bool>,
    pub daily_reports: Option<bool>,
    pub weekly_reports: Option<bool>,
    pub business_hours_start: Option<String>,
    pub business_hours_end: Option<String>,
    pub working_days: Option<Vec<i64>>,
}

/// A patch whose individual fields have passed validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub currency: Option<Currency>,
    pub language: Option<Language>,
    pub timezone: Option<String>,
    pub date_format: Option<String>,
    pub theme: Option<Theme>,
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub low_stock_alerts: Option<bool>,
    pub daily_reports: Option<bool>,
    pub weekly_reports: Option<bool>,
    pub business_hours_start: Option<NaiveTime>,
    pub business_hours_end: Option<NaiveTime>,
    pub working_days: Option<Vec<u8>>,
}

impl SettingsPatchRequest {
    /// Validate every field, collecting all failures instead of stopping at the first.
    pub fn validate(self) -> Result<SettingsPatch, FieldErrors> {
        let mut errors = FieldErrors::new();

        let currency = parse_field(&mut errors, "currency", self.currency, |s| s.parse::<Currency>());
        let language = parse_field(&mut errors, "language", self.language, |s| s.parse::<Language>());
        let theme = parse_field(&mut errors, "theme", self.theme, |s| s.parse::<Theme>());
        let timezone = parse_field(&mut errors, "timezone", self.timezone, parse_timezone);
        let date_format = parse_field(&mut errors, "date_format", self.date_format, parse_date_format);
        let business_hours_start = parse_field(
            &mut errors,
            "business_hours_start",
            self.business_hours_start,
            time_of_day::parse,
        );
        let business_hours_end = parse_field(
            &mut errors,
            "business_hours_end",
            self.business_hours_end,
            time_of_day::parse,
        );
        let working_days = match self.working_days {
            None => None,
            Some(days) => match normalize_working_days(&days) {
                Ok(days) => Some(days),
                Err(msg) => {
                    errors.insert("working_days".to_string(), msg);
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(SettingsPatch {
            currency,
            language,
            timezone,
            date_format,
            theme,
            email_notifications: self.email_notifications,
            sms_notifications: self.sms_notifications,
            push_notifications: self.push_notifications,
            low_stock_alerts: self.low_stock_alerts,
            daily_reports: self.daily_reports,
            weekly_reports: self.weekly_reports,
            business_hours_start,
            business_hours_end,
            working_days,
        })
    }
}

fn parse_field<T>(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<String>,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Option<T> {
    let raw = raw?;
    match parse(&raw) {
        Ok(value) => Some(value),
        Err(msg) => {
            errors.insert(field.to_string(), msg);
            None
        }
    }
}

fn parse_timezone(raw: &str) -> Result<String, String> {
    raw.parse::<chrono_tz::Tz>()
        .map(|tz| tz.name().to_string())
        .map_err(|_| format!("'{}' is not a known IANA timezone", raw))
}

fn parse_date_format(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    if raw.chars().count() > MAX_DATE_FORMAT_LEN {
        return Err(format!("must be at most {} characters", MAX_DATE_FORMAT_LEN));
    }
    Ok(raw.to_string())
}

/// Deduplicate and sort weekday numbers; every entry must be within 1..=7.
pub fn normalize_working_days(days: &[i64]) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(days.len());
    for &day in days {
        let day = u8::try_from(day)
            .ok()
            .filter(|d| (1..=7).contains(d))
            .ok_or_else(|| format!("weekday {} is outside 1-7", day))?;
        out.push(day);
    }
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

/// `HH:MM` wire format for business hours. Input also accepts `HH:MM:SS`, truncated to the minute.
pub mod time_of_day {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Seconds are dropped so the stored value is exactly what gets serialized.
    pub fn parse(raw: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map(|t| t.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(t))
            .map_err(|_| format!("'{}' is not a time of day (HH:MM)", raw))
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
