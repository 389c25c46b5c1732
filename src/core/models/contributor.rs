use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceType {
    Member,
    Group,
    TagItem,
    Church,
    Other,
    Unknown(String),
}

impl SourceType {
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("member") => SourceType::Member,
            Some("group") => SourceType::Group,
            Some("tag_item") => SourceType::TagItem,
            Some("church") => SourceType::Church,
            Some("other") | Some("") | None => SourceType::Other,
            Some(v) => SourceType::Unknown(v.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceType::Member => "member",
            SourceType::Group => "group",
            SourceType::TagItem => "tag_item",
            SourceType::Church => "church",
            SourceType::Other => "other",
            SourceType::Unknown(v) => v,
        }
    }
}

impl Serialize for SourceType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The joined columns a contributor can be resolved from.
#[derive(Debug, Clone, Default, FromRow)]
pub struct ContributorRow {
    pub source_type: Option<String>,
    pub source: Option<String>,
    pub member_first_name: Option<String>,
    pub member_last_name: Option<String>,
    pub member_avatar_url: Option<String>,
    pub group_name: Option<String>,
    pub tag_item_name: Option<String>,
    pub tag_item_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub name: String,
    pub avatar: Option<String>,
    pub tag_color: Option<String>,
}
