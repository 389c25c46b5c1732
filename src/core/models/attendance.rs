use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::common::{ListParams, Order};
use super::filter::{DateFilter, Predicate, Value};
use crate::core::reshape::full_name;

pub const BRANCH: &str = "ar.branch_id";
pub const SEARCH: &[&str] = &["m.first_name", "m.last_name", "o.name", "s.name"];

pub fn default_order() -> Vec<Order> {
    vec![Order::desc("s.start_time"), Order::desc("ar.marked_at")]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkingMethod {
    #[default]
    Manual,
    QrCode,
    Kiosk,
    SelfCheckIn,
}

impl MarkingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkingMethod::Manual => "manual",
            MarkingMethod::QrCode => "qr_code",
            MarkingMethod::Kiosk => "kiosk",
            MarkingMethod::SelfCheckIn => "self_check_in",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Occasion {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttendanceSession {
    pub id: Uuid,
    pub occasion_id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AttendanceRecordRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub occasion_id: Uuid,
    pub session_id: Uuid,
    pub member_id: Uuid,
    pub present: bool,
    pub marked_by: Option<Uuid>,
    pub marking_method: String,
    pub marked_at: DateTime<Utc>,
    pub member_first_name: Option<String>,
    pub member_last_name: Option<String>,
    pub member_avatar_url: Option<String>,
    pub occasion_name: Option<String>,
    pub session_name: Option<String>,
    pub session_start_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub occasion_id: Uuid,
    pub session_id: Uuid,
    pub member_id: Uuid,
    pub present: bool,
    pub marked_by: Option<Uuid>,
    pub marking_method: String,
    pub marked_at: DateTime<Utc>,
    pub member_name: String,
    pub member_avatar: Option<String>,
    pub occasion_name: Option<String>,
    pub session_name: Option<String>,
    pub session_start_time: Option<DateTime<Utc>>,
}

impl From<AttendanceRecordRow> for AttendanceRecord {
    fn from(row: AttendanceRecordRow) -> Self {
        Self {
            member_name: full_name(row.member_first_name.as_deref(), row.member_last_name.as_deref()).unwrap_or_default(),
            member_avatar: row.member_avatar_url,
            id: row.id,
            organization_id: row.organization_id,
            branch_id: row.branch_id,
            occasion_id: row.occasion_id,
            session_id: row.session_id,
            member_id: row.member_id,
            present: row.present,
            marked_by: row.marked_by,
            marking_method: row.marking_method,
            marked_at: row.marked_at,
            occasion_name: row.occasion_name,
            session_name: row.session_name,
            session_start_time: row.session_start_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttendanceFilter {
    pub occasion_ids: Vec<Uuid>,
    pub session_ids: Vec<Uuid>,
    pub member_ids: Vec<Uuid>,
    pub present: Option<bool>,
    pub marking_method: Option<MarkingMethod>,
    pub date_filter: Option<DateFilter>,
    pub branch_ids: Vec<Uuid>,
    pub search: Option<String>,
}

impl AttendanceFilter {
    pub fn with_resolved_dates(mut self, today: chrono::NaiveDate) -> Self {
        self.date_filter = self.date_filter.map(|d| d.resolved(today));
        self
    }

    /// Same contract as the finance normalizer: one predicate per present key.
    pub fn normalize(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if !self.occasion_ids.is_empty() {
            predicates.push(Predicate::is_in("ar.occasion_id", self.occasion_ids.iter().copied()));
        }
        if !self.session_ids.is_empty() {
            predicates.push(Predicate::is_in("ar.session_id", self.session_ids.iter().copied()));
        }
        if !self.member_ids.is_empty() {
            predicates.push(Predicate::is_in("ar.member_id", self.member_ids.iter().copied()));
        }
        if let Some(present) = self.present {
            predicates.push(Predicate::eq("ar.present", present));
        }
        if let Some(method) = self.marking_method {
            predicates.push(Predicate::eq("ar.marking_method", method.as_str()));
        }
        if let Some(d) = &self.date_filter {
            if d.start.is_some() || d.end.is_some() {
                predicates.push(Predicate::Range {
                    field: "s.start_time::date",
                    min: d.start.map(Value::Date),
                    max: d.end.map(Value::Date),
                });
            }
        }
        if let Some(p) = self.search.as_deref().and_then(|s| Predicate::search(SEARCH, s)) {
            predicates.push(p);
        }
        predicates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceSortField {
    SessionStart,
    MarkedAt,
    Present,
}

impl AttendanceSortField {
    pub fn column(&self) -> &'static str {
        match self {
            AttendanceSortField::SessionStart => "s.start_time",
            AttendanceSortField::MarkedAt => "ar.marked_at",
            AttendanceSortField::Present => "ar.present",
        }
    }
}

pub type AttendanceListParams = ListParams<AttendanceFilter, AttendanceSortField>;

#[derive(Debug, Clone, Deserialize)]
pub struct MarkEntry {
    pub member_id: Uuid,
    pub present: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkAttendance {
    pub entries: Vec<MarkEntry>,
    #[serde(default)]
    pub marking_method: MarkingMethod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert {
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub occasion_id: Uuid,
    pub session_id: Uuid,
    pub member_id: Uuid,
    pub present: bool,
    pub marked_by: Uuid,
    pub marking_method: MarkingMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PresenceCount {
    pub present: bool,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub present_count: i64,
    pub absent_count: i64,
    pub total: i64,
    /// Percentage of marked members who were present.
    pub attendance_rate: f64,
}

impl SessionSummary {
    pub fn from_counts(session_id: Uuid, counts: &[PresenceCount]) -> Self {
        let present_count: i64 = counts.iter().filter(|c| c.present).map(|c| c.count).sum();
        let absent_count: i64 = counts.iter().filter(|c| !c.present).map(|c| c.count).sum();
        let total = present_count + absent_count;
        let attendance_rate = if total == 0 { 0.0 } else { (present_count as f64 * 10000.0 / total as f64).round() / 100.0 };
        Self {
            session_id,
            present_count,
            absent_count,
            total,
            attendance_rate,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_normalize_presence_and_method() {
        let filter = AttendanceFilter {
            present: Some(false),
            marking_method: Some(MarkingMethod::QrCode),
            ..default::default()
        };
        assert_eq!(filter.normalize(), vec![Predicate::eq("ar.present", false), Predicate::eq("ar.marking_method", "qr_code")]);
    }

    #[test]
    fn test_normalize_session_date_range() {
        let day = NaiveDate::from_ymd_opt(2024, 4, 7).unwrap();
        let filter = AttendanceFilter {
            date_filter: Some(DateFilter {
                preset: None,
                start: Some(day),
                end: Some(day),
            }),
            ..default::default()
        };
        assert_eq!(filter.normalize(), vec![Predicate::Range {
            field: "s.start_time::date",
            min: Some(Value::Date(day)),
            max: Some(Value::Date(day)),
        }]);
    }

    #[test]
    fn test_session_summary() {
        let id = Uuid::new_v4();
        let summary = SessionSummary::from_counts(id, &[PresenceCount { present: true, count: 2 }, PresenceCount { present: false, count: 1 }]);
        assert_eq!(summary.present_count, 2);
        assert_eq!(summary.absent_count, 1);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.attendance_rate, 66.67);
        assert_eq!(SessionSummary::from_counts(id, &[]).attendance_rate, 0.0);
    }
}
