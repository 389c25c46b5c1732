use crate::core::models::contributor::{Contributor, ContributorRow, SourceType};

pub const CHURCH: &str = "Church";

pub fn full_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let name = [first, last].into_iter().flatten().map(str::trim).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Resolves display name, avatar and tag color of whoever a record is attributed to.
/// Anything that cannot be resolved from its relation falls back to the free-text source.
pub fn resolve_contributor(row: &ContributorRow) -> Contributor {
    let fallback = || row.source.clone().unwrap_or_default();
    match SourceType::parse(row.source_type.as_deref()) {
        SourceType::Member => Contributor {
            name: full_name(row.member_first_name.as_deref(), row.member_last_name.as_deref()).unwrap_or_else(fallback),
            avatar: row.member_avatar_url.clone(),
            tag_color: None,
        },
        SourceType::Group => Contributor {
            name: row.group_name.clone().unwrap_or_else(fallback),
            ..Default::default()
        },
        SourceType::TagItem => Contributor {
            name: row.tag_item_name.clone().unwrap_or_else(fallback),
            avatar: None,
            tag_color: row.tag_item_color.clone(),
        },
        SourceType::Church => Contributor {
            name: CHURCH.to_owned(),
            ..Default::default()
        },
        SourceType::Other | SourceType::Unknown(_) => Contributor {
            name: fallback(),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_member_contributor() {
        let row = ContributorRow {
            source_type: Some("member".into()),
            member_first_name: Some("Ama".into()),
            member_last_name: Some("Mensah".into()),
            member_avatar_url: Some("https://cdn/ama.png".into()),
            ..Default::default()
        };
        let c = resolve_contributor(&row);
        assert_eq!(c.name, "Ama Mensah");
        assert_eq!(c.avatar.as_deref(), Some("https://cdn/ama.png"));
        assert_eq!(c.tag_color, None);
    }

    #[test]
    fn test_member_without_names_falls_back_to_source() {
        let row = ContributorRow {
            source_type: Some("member".into()),
            source: Some("Anonymous".into()),
            ..Default::default()
        };
        assert_eq!(resolve_contributor(&row).name, "Anonymous");
    }

    #[test]
    fn test_tag_item_color() {
        let row = ContributorRow {
            source_type: Some("tag_item".into()),
            tag_item_name: Some("Choir".into()),
            tag_item_color: Some("#ff8800".into()),
            ..Default::default()
        };
        let c = resolve_contributor(&row);
        assert_eq!(c.name, "Choir");
        assert_eq!(c.tag_color.as_deref(), Some("#ff8800"));
    }

    #[test]
    fn test_church_ignores_other_fields() {
        let row = ContributorRow {
            source_type: Some("church".into()),
            source: Some("Visitor".into()),
            member_first_name: Some("Kofi".into()),
            group_name: Some("Youth".into()),
            tag_item_color: Some("#000".into()),
            ..Default::default()
        };
        let c = resolve_contributor(&row);
        assert_eq!(c.name, "Church");
        assert_eq!(c.tag_color, None);
    }

    #[test]
    fn test_unknown_source_type_uses_source() {
        let row = ContributorRow {
            source_type: Some("ministry".into()),
            source: Some("Outreach".into()),
            group_name: Some("Youth".into()),
            ..Default::default()
        };
        assert_eq!(resolve_contributor(&row).name, "Outreach");
        let row = ContributorRow::default();
        assert_eq!(resolve_contributor(&row).name, "");
    }

    #[test]
    fn test_full_name() {
        assert_eq!(full_name(Some(" Ama "), None).as_deref(), Some("Ama"));
        assert_eq!(full_name(Some(""), Some("")), None);
    }
}
