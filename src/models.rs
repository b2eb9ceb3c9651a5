//! Request data model for report generation.
//!
//! These mirror the JSON shape produced by the screening frontend and its
//! document store: camelCase keys, every person/appointment field
//! best-effort, and dates either as Firebase-style `{ seconds }` objects or
//! plain strings. The builder never fails solely because an optional field
//! is absent; each has an `N/A` fallback or its section is omitted.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Everything one build call consumes. Treated as an immutable snapshot;
/// the builder holds no state across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub cancer_type: String,
    pub ai_results: AiResults,
    #[serde(default)]
    pub patient: Option<PatientInfo>,
    #[serde(default)]
    pub doctor: Option<DoctorInfo>,
    #[serde(default)]
    pub appointment: Option<AppointmentInfo>,
    #[serde(default)]
    pub input_image_url: Option<String>,
    #[serde(default)]
    pub result_image_url: Option<String>,
}

/// Output of the (external) analysis model, as stored on the screening
/// record. `confidence` is a percentage in 0–100.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResults {
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub additional_findings: Vec<String>,
    #[serde(default)]
    pub doctor_review: Option<String>,
    #[serde(default)]
    pub ai_model_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorInfo {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub appointment_date: Option<AppointmentDate>,
}

/// Appointment dates arrive either as Firebase timestamps (`{ "seconds":
/// 1640995200 }`) or as plain strings (RFC 3339 or `YYYY-MM-DD`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppointmentDate {
    Timestamp { seconds: i64 },
    Text(String),
}

fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let full = format!(
        "{} {}",
        first.unwrap_or_default().trim(),
        last.unwrap_or_default().trim()
    );
    let full = full.trim();
    if full.is_empty() {
        None
    } else {
        Some(full.to_string())
    }
}

impl PatientInfo {
    /// `"First Last"`, or `N/A` when both parts are missing.
    pub fn display_name(&self) -> String {
        join_name(self.first_name.as_deref(), self.last_name.as_deref())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

impl DoctorInfo {
    /// `"Dr. First Last"`, or `Dr. N/A` when both parts are missing.
    pub fn display_name(&self) -> String {
        let name = join_name(self.first_name.as_deref(), self.last_name.as_deref())
            .unwrap_or_else(|| "N/A".to_string());
        format!("Dr. {name}")
    }
}

/// Formats an appointment date for display. A missing or unparseable date
/// falls back the same way the original frontend did: current local time
/// for `None`, the raw text when a string will not parse.
pub fn format_date(date: Option<&AppointmentDate>) -> String {
    match date {
        None => now_display(),
        Some(AppointmentDate::Timestamp { seconds }) => DateTime::from_timestamp(*seconds, 0)
            .map(|dt| dt.with_timezone(&Local).format(DATE_DISPLAY_FORMAT).to_string())
            .unwrap_or_else(now_display),
        Some(AppointmentDate::Text(text)) => format_date_text(text),
    }
}

fn format_date_text(text: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return dt.with_timezone(&Local).format(DATE_DISPLAY_FORMAT).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    text.to_string()
}

/// Current local time in the report display format. Also used for the
/// generation footer.
pub fn now_display() -> String {
    Local::now().format(DATE_DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_upstream_json_shape() {
        let request: ReportRequest = serde_json::from_str(
            r#"{
                "cancerType": "Breast Cancer",
                "aiResults": {
                    "classification": "Benign",
                    "confidence": 95,
                    "additionalFindings": ["No suspicious masses detected"],
                    "doctorReview": "Results reviewed and confirmed.",
                    "aiModelVersion": "v2.1.0"
                },
                "patient": { "firstName": "John", "lastName": "Doe", "id": "P12345" },
                "appointment": { "id": "A67890", "appointmentDate": { "seconds": 1640995200 } },
                "doctor": { "firstName": "Jane", "lastName": "Smith", "id": "D001" },
                "inputImageUrl": "https://example.com/input.jpg",
                "resultImageUrl": "https://example.com/result.jpg"
            }"#,
        )
        .unwrap();

        assert_eq!(request.cancer_type, "Breast Cancer");
        assert_eq!(request.ai_results.confidence, Some(95.0));
        assert_eq!(request.ai_results.additional_findings.len(), 1);
        assert!(matches!(
            request.appointment.unwrap().appointment_date,
            Some(AppointmentDate::Timestamp { seconds: 1640995200 })
        ));
    }

    #[test]
    fn missing_optional_blocks_deserialize_to_none() {
        let request: ReportRequest = serde_json::from_str(
            r#"{ "cancerType": "Skin Cancer", "aiResults": {} }"#,
        )
        .unwrap();

        assert!(request.patient.is_none());
        assert!(request.doctor.is_none());
        assert!(request.ai_results.classification.is_none());
        assert!(request.ai_results.additional_findings.is_empty());
    }

    #[test]
    fn patient_name_joins_and_falls_back() {
        let patient = PatientInfo {
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            id: None,
        };
        assert_eq!(patient.display_name(), "John Doe");

        let only_first = PatientInfo {
            first_name: Some("John".into()),
            last_name: None,
            id: None,
        };
        assert_eq!(only_first.display_name(), "John");

        let empty = PatientInfo {
            first_name: None,
            last_name: None,
            id: None,
        };
        assert_eq!(empty.display_name(), "N/A");
    }

    #[test]
    fn doctor_name_carries_title() {
        let doctor = DoctorInfo {
            first_name: Some("Jane".into()),
            last_name: Some("Smith".into()),
            id: Some("D001".into()),
        };
        assert_eq!(doctor.display_name(), "Dr. Jane Smith");
    }

    #[test]
    fn timestamp_dates_format_to_display_form() {
        let formatted = format_date(Some(&AppointmentDate::Timestamp { seconds: 1640995200 }));
        assert!(formatted.starts_with("2021-12-31") || formatted.starts_with("2022-01-01"));
    }

    #[test]
    fn plain_date_strings_pass_through() {
        let formatted = format_date(Some(&AppointmentDate::Text("2024-03-15".into())));
        assert_eq!(formatted, "2024-03-15");
    }

    #[test]
    fn unparseable_date_text_is_shown_verbatim() {
        let formatted = format_date(Some(&AppointmentDate::Text("next Tuesday".into())));
        assert_eq!(formatted, "next Tuesday");
    }

    #[test]
    fn missing_date_falls_back_to_now() {
        assert!(!format_date(None).is_empty());
    }
}
