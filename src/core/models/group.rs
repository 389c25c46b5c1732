use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::common::{ListParams, Order};
use super::filter::Predicate;
use crate::core::reshape::full_name;
use crate::error::Error;

pub const BRANCH: &str = "g.branch_id";
pub const SEARCH: &[&str] = &["g.name", "g.description"];

pub fn default_order() -> Vec<Order> {
    vec![Order::asc("g.name"), Order::desc("g.created_at")]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    Temporal,
    Permanent,
}

impl GroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Temporal => "temporal",
            GroupType::Permanent => "permanent",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "temporal" => Ok(GroupType::Temporal),
            "permanent" => Ok(GroupType::Permanent),
            _ => Err(Error::BusinessError(format!("invalid group type({})", s))),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    pub type_: String,
    pub is_closed: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_: GroupType,
    pub is_closed: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub member_count: i64,
}

impl TryFrom<GroupRow> for Group {
    type Error = Error;
    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        Ok(Self {
            type_: GroupType::parse(&row.type_)?,
            id: row.id,
            organization_id: row.organization_id,
            branch_id: row.branch_id,
            name: row.name,
            description: row.description,
            is_closed: row.is_closed,
            start_date: row.start_date,
            end_date: row.end_date,
            created_by: row.created_by,
            created_at: row.created_at,
            member_count: row.member_count,
        })
    }
}

impl Group {
    /// `active -> closed`, one way, temporal groups only.
    pub fn check_closable(&self) -> Result<(), Error> {
        match self.type_ {
            GroupType::Permanent => Err(Error::BusinessError("permanent groups cannot be closed".into())),
            GroupType::Temporal => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GroupFilter {
    #[serde(rename = "type")]
    pub type_: Option<GroupType>,
    pub is_closed: Option<bool>,
    pub branch_ids: Vec<Uuid>,
    pub search: Option<String>,
}

impl GroupFilter {
    pub fn normalize(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(t) = self.type_ {
            predicates.push(Predicate::eq("g.type", t.as_str()));
        }
        if let Some(closed) = self.is_closed {
            predicates.push(Predicate::eq("g.is_closed", closed));
        }
        if let Some(p) = self.search.as_deref().and_then(|s| Predicate::search(SEARCH, s)) {
            predicates.push(p);
        }
        predicates
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSortField {
    Name,
    CreatedAt,
    StartDate,
}

impl GroupSortField {
    pub fn column(&self) -> &'static str {
        match self {
            GroupSortField::Name => "g.name",
            GroupSortField::CreatedAt => "g.created_at",
            GroupSortField::StartDate => "g.start_date",
        }
    }
}

pub type GroupListParams = ListParams<GroupFilter, GroupSortField>;

#[derive(Debug, Clone, Deserialize)]
pub struct GroupCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_: GroupType,
    pub branch_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub data: GroupCreate,
}

/// Carries no `is_closed`: a closed group stays closed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub branch_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl GroupUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.branch_id.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }
}

pub fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), Error> {
    match (start, end) {
        (Some(s), Some(e)) if e < s => Err(Error::BusinessError("end date is before start date".into())),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupMemberRow {
    pub group_id: Uuid,
    pub member_id: Uuid,
    pub position: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub member_first_name: Option<String>,
    pub member_last_name: Option<String>,
    pub member_avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub member_id: Uuid,
    pub position: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub member_name: String,
    pub member_avatar: Option<String>,
}

impl From<GroupMemberRow> for GroupMember {
    fn from(row: GroupMemberRow) -> Self {
        Self {
            member_name: full_name(row.member_first_name.as_deref(), row.member_last_name.as_deref()).unwrap_or_default(),
            member_avatar: row.member_avatar_url,
            group_id: row.group_id,
            member_id: row.member_id,
            position: row.position,
            assigned_at: row.assigned_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignMember {
    pub member_id: Uuid,
    pub position: Option<String>,
}
