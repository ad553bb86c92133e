//! Database models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An operator account. Owns claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Login email (unique).
    pub email: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// An insurance claim under verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Claim {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Externally supplied claim number (unique).
    pub claim_number: String,
    /// Patient mobile number, used for SMS invitations.
    pub patient_mobile: String,
    /// Hospital city.
    pub hospital_city: String,
    /// Hospital state code.
    pub hospital_state: String,
    /// Preferred language.
    pub language: String,
    /// Operator-set status. Defaults to "open".
    pub status: String,
    /// Owning user.
    pub user_id: i64,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields accepted when creating or replacing a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClaim {
    pub claim_number: String,
    pub patient_mobile: String,
    pub hospital_city: String,
    pub hospital_state: String,
    pub language: String,
}

/// Status of a video verification session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MeetingStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

impl MeetingStatus {
    /// Lowercase name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Pending => "pending",
            MeetingStatus::Active => "active",
            MeetingStatus::Completed => "completed",
        }
    }

    /// Position in the nominal pending → active → completed sequence.
    pub fn rank(&self) -> u8 {
        match self {
            MeetingStatus::Pending => 0,
            MeetingStatus::Active => 1,
            MeetingStatus::Completed => 2,
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(MeetingStatus::Pending),
            "active" => Ok(MeetingStatus::Active),
            "completed" => Ok(MeetingStatus::Completed),
            other => Err(format!("unknown meeting status '{}'", other)),
        }
    }
}

/// One video verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Meeting {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Conference room name (unique).
    pub room_name: String,
    /// Session identifier handed to clients (unique).
    pub session_id: String,
    /// Claim under verification, if any.
    pub claim_id: Option<i64>,
    pub patient_name: Option<String>,
    pub procedure: Option<String>,
    /// Join link handed to the moderator.
    pub moderator_url: Option<String>,
    /// Join link handed to the patient.
    pub patient_url: Option<String>,
    pub status: MeetingStatus,
    /// Creation timestamp.
    pub created_at: String,
}

/// Fields for inserting a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewMeeting {
    pub room_name: String,
    pub session_id: String,
    pub claim_id: Option<i64>,
    pub patient_name: Option<String>,
    pub procedure: Option<String>,
    pub moderator_url: Option<String>,
    pub patient_url: Option<String>,
}

/// Location fix captured on the client at recording time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoSnapshot {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_m: Option<f64>,
}

impl GeoSnapshot {
    /// True when both coordinates are present.
    pub fn is_located(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// A stored video artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Recording {
    /// Auto-incrementing ID.
    pub id: i64,
    pub meeting_id: Option<i64>,
    /// Object storage key.
    pub storage_key: String,
    /// Public or presigned URL, when known.
    pub storage_url: Option<String>,
    pub mime_type: String,
    pub duration_sec: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geo_accuracy_m: Option<f64>,
    /// Creation timestamp.
    pub created_at: String,
}

impl Recording {
    /// Location snapshot carried by this recording.
    pub fn geo(&self) -> GeoSnapshot {
        GeoSnapshot {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_m: self.geo_accuracy_m,
        }
    }
}

/// Fields for inserting a recording.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecording {
    pub meeting_id: Option<i64>,
    pub storage_key: String,
    pub storage_url: Option<String>,
    pub mime_type: String,
    pub duration_sec: Option<i64>,
    pub geo: GeoSnapshot,
}

/// An entry in the per-claim geolocation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Geolocation {
    /// Auto-incrementing ID.
    pub id: i64,
    pub claim_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    /// Capture time.
    pub timestamp: String,
    /// Where the fix came from (e.g. "browser", "gps").
    pub source: String,
    /// Free-form JSON metadata.
    pub metadata: Option<String>,
}

/// Fields for appending to the geolocation log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGeolocation {
    pub claim_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    /// Capture time; `None` uses the insertion time.
    pub timestamp: Option<String>,
    pub source: String,
    pub metadata: Option<String>,
}

/// A patient/operator form submission. Audit only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FormSubmission {
    /// Auto-incrementing ID.
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub notes: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geo_accuracy_m: Option<f64>,
    pub claim_id: Option<i64>,
    /// Submission timestamp.
    pub captured_at: String,
}

/// Fields for inserting a form submission.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewFormSubmission {
    pub full_name: String,
    pub email: String,
    pub notes: Option<String>,
    pub geo: GeoSnapshot,
    pub claim_id: Option<i64>,
}
