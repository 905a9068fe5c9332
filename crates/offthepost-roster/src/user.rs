//! User (player) data structures

use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::error::RosterError;
use crate::{Result, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique display name
    pub name: String,
    pub fav_team: Option<String>,
    /// e.g. FWD/MID/DEF/GK, free text
    pub preferred_position: Option<String>,
    /// Left/Right/Both, free text
    pub preferred_foot: Option<String>,
    pub nickname: Option<String>,
    /// URL or path of the profile picture
    pub profile_pic: Option<String>,
}

pub(crate) const USER_COLUMNS: &str =
    "id, name, fav_team, preferred_position, preferred_foot, nickname, profile_pic";

impl User {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            fav_team: row.get(2)?,
            preferred_position: row.get(3)?,
            preferred_foot: row.get(4)?,
            nickname: row.get(5)?,
            profile_pic: row.get(6)?,
        })
    }
}

/// Fields accepted when creating a user. Only `name` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    #[serde(default)]
    pub fav_team: Option<String>,
    #[serde(default)]
    pub preferred_position: Option<String>,
    #[serde(default)]
    pub preferred_foot: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

impl NewUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Trim every field, turn blank optionals into `None` and reject a blank name.
    pub(crate) fn normalized(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(RosterError::Validation("User name is required".to_string()));
        }

        Ok(Self {
            name,
            fav_team: normalize_text(self.fav_team),
            preferred_position: normalize_text(self.preferred_position),
            preferred_foot: normalize_text(self.preferred_foot),
            nickname: normalize_text(self.nickname),
            profile_pic: normalize_text(self.profile_pic),
        })
    }

    pub(crate) fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            fav_team: self.fav_team,
            preferred_position: self.preferred_position,
            preferred_foot: self.preferred_foot,
            nickname: self.nickname,
            profile_pic: self.profile_pic,
        }
    }
}

pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_trims_and_drops_blanks() {
        let user = NewUser {
            name: "  Khalid ".to_string(),
            fav_team: Some("Arsenal".to_string()),
            nickname: Some("   ".to_string()),
            ..NewUser::default()
        }
        .normalized()
        .unwrap();

        assert_eq!(user.name, "Khalid");
        assert_eq!(user.fav_team.as_deref(), Some("Arsenal"));
        assert_eq!(user.nickname, None);
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = NewUser::new(" ").normalized().unwrap_err();
        assert!(matches!(err, RosterError::Validation(_)));
    }

    #[test]
    fn test_deserialize_flat_map_with_missing_optionals() {
        let user: NewUser =
            serde_json::from_str(r#"{"name": "Mohamed", "preferred_foot": "Left"}"#).unwrap();
        assert_eq!(user.name, "Mohamed");
        assert_eq!(user.preferred_foot.as_deref(), Some("Left"));
        assert_eq!(user.fav_team, None);
    }
}
