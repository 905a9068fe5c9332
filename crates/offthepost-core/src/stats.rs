//! Player statistics
//!
//! Nothing here is stored. Every figure is counted from the goal, vote and
//! team-membership rows at read time, so it always reflects the latest
//! writes and deletes.

use rusqlite::Connection;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use offthepost_matchday::SessionId;
use offthepost_roster::{User, UserId, UserManager};
use offthepost_storage::{Database, Table};

use crate::error::CoreError;
use crate::Result;

/// A team a player has been on, with the group its session belongs to.
///
/// Serialized as its display label, `"Red (Sunday League)"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPlayed {
    pub team_name: String,
    pub group_name: String,
}

impl fmt::Display for TeamPlayed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.team_name, self.group_name)
    }
}

impl FromStr for TeamPlayed {
    type Err = String;

    /// The team name ends at the first `" ("`.
    fn from_str(label: &str) -> std::result::Result<Self, Self::Err> {
        label
            .strip_suffix(')')
            .and_then(|rest| rest.split_once(" ("))
            .map(|(team, group)| Self {
                team_name: team.to_string(),
                group_name: group.to_string(),
            })
            .ok_or_else(|| format!("expected \"Team (Group)\", got {label:?}"))
    }
}

impl Serialize for TeamPlayed {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TeamPlayed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(de::Error::custom)
    }
}

/// A user together with their aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub goals_scored: u32,
    pub assists: u32,
    pub mvp_wins: u32,
    pub teams_played: Vec<TeamPlayed>,
}

/// Votes received by one candidate in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvpTally {
    pub user_id: UserId,
    pub votes: u32,
}

pub struct Stats {
    db: Database,
    users: UserManager,
}

impl Stats {
    pub fn new(db: Database) -> Self {
        Self {
            users: UserManager::new(db.clone()),
            db,
        }
    }

    pub fn goals_scored_count(&self, user_id: UserId) -> Result<u32> {
        self.db
            .with_connection(|conn| -> Result<u32> { count_for_user(conn, GOALS_SCORED, user_id) })
    }

    pub fn assists_count(&self, user_id: UserId) -> Result<u32> {
        self.db
            .with_connection(|conn| -> Result<u32> { count_for_user(conn, ASSISTS, user_id) })
    }

    /// Every MVP vote the user has received, across all sessions
    pub fn mvp_wins_count(&self, user_id: UserId) -> Result<u32> {
        self.db
            .with_connection(|conn| -> Result<u32> { count_for_user(conn, VOTES_RECEIVED, user_id) })
    }

    /// Teams in membership order
    pub fn teams_played(&self, user_id: UserId) -> Result<Vec<TeamPlayed>> {
        self.db
            .with_connection(|conn| -> Result<Vec<TeamPlayed>> { teams_played(conn, user_id) })
    }

    pub fn user_profile(&self, user_id: UserId) -> Result<UserProfile> {
        let user = self.users.get_user(user_id)?;

        let profile = self.db.with_connection(|conn| -> Result<UserProfile> {
            Ok(UserProfile {
                goals_scored: count_for_user(conn, GOALS_SCORED, user_id)?,
                assists: count_for_user(conn, ASSISTS, user_id)?,
                mvp_wins: count_for_user(conn, VOTES_RECEIVED, user_id)?,
                teams_played: teams_played(conn, user_id)?,
                user,
            })
        })?;

        tracing::debug!(
            user_id,
            goals_scored = profile.goals_scored,
            assists = profile.assists,
            mvp_wins = profile.mvp_wins,
            "Built user profile"
        );

        Ok(profile)
    }

    /// Votes per candidate in one session, most votes first, ties by user id.
    /// Candidates without votes are not listed.
    pub fn mvp_tally(&self, session_id: SessionId) -> Result<Vec<MvpTally>> {
        self.db.with_connection(|conn| -> Result<Vec<MvpTally>> {
            require(conn, Table::Sessions, session_id)?;

            let mut stmt = conn.prepare(
                "SELECT voted_for_id, COUNT(*) AS votes FROM mvp_votes
                 WHERE session_id = ?1
                 GROUP BY voted_for_id
                 ORDER BY votes DESC, voted_for_id",
            )?;
            let tally = stmt
                .query_map([session_id], |row| {
                    Ok(MvpTally {
                        user_id: row.get(0)?,
                        votes: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            tracing::debug!(session_id, candidates = tally.len(), "Tallied MVP votes");
            Ok(tally)
        })
    }
}

impl Clone for Stats {
    fn clone(&self) -> Self {
        Self::new(self.db.clone())
    }
}

const GOALS_SCORED: &str = "SELECT COUNT(*) FROM goals WHERE scorer_id = ?1";
const ASSISTS: &str = "SELECT COUNT(*) FROM goals WHERE assist_id = ?1";
const VOTES_RECEIVED: &str = "SELECT COUNT(*) FROM mvp_votes WHERE voted_for_id = ?1";

fn require(conn: &Connection, table: Table, id: i64) -> Result<()> {
    if offthepost_storage::exists(conn, table, id)? {
        Ok(())
    } else {
        Err(CoreError::NotFound { entity: table, id })
    }
}

fn count_for_user(conn: &Connection, sql: &str, user_id: UserId) -> Result<u32> {
    require(conn, Table::Users, user_id)?;
    let count: u32 = conn.query_row(sql, [user_id], |row| row.get(0))?;
    tracing::debug!(user_id, count, "Counted user stat");
    Ok(count)
}

fn teams_played(conn: &Connection, user_id: UserId) -> Result<Vec<TeamPlayed>> {
    require(conn, Table::Users, user_id)?;

    let mut stmt = conn.prepare(
        "SELECT t.name, g.name
         FROM session_team_memberships m
         JOIN session_teams t ON t.id = m.session_team_id
         JOIN sessions s ON s.id = t.session_id
         JOIN play_groups g ON g.id = s.group_id
         WHERE m.user_id = ?1
         ORDER BY m.id",
    )?;
    let teams = stmt
        .query_map([user_id], |row| {
            Ok(TeamPlayed {
                team_name: row.get(0)?,
                group_name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(teams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use offthepost_matchday::{
        MatchLog, NewGoal, NewMvpVote, NewSession, NewSessionTeam, SessionManager,
    };
    use offthepost_roster::{GroupManager, NewGroup, NewUser};
    use offthepost_storage::ErrorKind;

    struct Fixture {
        stats: Stats,
        sessions: SessionManager,
        log: MatchLog,
        session_id: SessionId,
        red: i64,
        blue: i64,
        ade: UserId,
        bo: UserId,
        cy: UserId,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let users = UserManager::new(db.clone());
        let groups = GroupManager::new(db.clone());
        let sessions = SessionManager::new(db.clone());

        let ade = users.create_user(NewUser::new("Ade")).unwrap().id;
        let bo = users.create_user(NewUser::new("Bo")).unwrap().id;
        let cy = users.create_user(NewUser::new("Cy")).unwrap().id;
        let group = groups.create_group(NewGroup::new("Sunday League")).unwrap();
        let session = sessions
            .create_session(NewSession::new(group.id, Utc::now()))
            .unwrap();
        let red = sessions
            .create_team(NewSessionTeam::new(session.id, "Red"))
            .unwrap()
            .id;
        let blue = sessions
            .create_team(NewSessionTeam::new(session.id, "Blue"))
            .unwrap()
            .id;

        Fixture {
            stats: Stats::new(db.clone()),
            sessions,
            log: MatchLog::new(db),
            session_id: session.id,
            red,
            blue,
            ade,
            bo,
            cy,
        }
    }

    #[test]
    fn test_goal_and_assist_counts_follow_goal_rows() {
        let f = fixture();
        assert_eq!(f.stats.goals_scored_count(f.ade).unwrap(), 0);

        let first = f
            .log
            .record_goal(NewGoal::new(f.session_id, f.red, f.ade).assisted_by(f.bo))
            .unwrap();
        assert_eq!(f.stats.goals_scored_count(f.ade).unwrap(), 1);
        assert_eq!(f.stats.assists_count(f.bo).unwrap(), 1);

        f.log
            .record_goal(NewGoal::new(f.session_id, f.red, f.ade))
            .unwrap();
        assert_eq!(f.stats.goals_scored_count(f.ade).unwrap(), 2);
        assert_eq!(f.stats.assists_count(f.bo).unwrap(), 1);

        f.log.delete_goal(first.id).unwrap();
        assert_eq!(f.stats.goals_scored_count(f.ade).unwrap(), 1);
        assert_eq!(f.stats.assists_count(f.bo).unwrap(), 0);
    }

    #[test]
    fn test_mvp_wins_count_votes_received() {
        let f = fixture();
        f.log
            .cast_vote(NewMvpVote::new(f.session_id, f.bo, f.ade))
            .unwrap();
        f.log
            .cast_vote(NewMvpVote::new(f.session_id, f.cy, f.ade))
            .unwrap();
        f.log
            .cast_vote(NewMvpVote::new(f.session_id, f.ade, f.bo))
            .unwrap();

        assert_eq!(f.stats.mvp_wins_count(f.ade).unwrap(), 2);
        assert_eq!(f.stats.mvp_wins_count(f.bo).unwrap(), 1);
        assert_eq!(f.stats.mvp_wins_count(f.cy).unwrap(), 0);
    }

    #[test]
    fn test_mvp_tally_order() {
        let f = fixture();
        f.log
            .cast_vote(NewMvpVote::new(f.session_id, f.ade, f.cy))
            .unwrap();
        f.log
            .cast_vote(NewMvpVote::new(f.session_id, f.cy, f.bo))
            .unwrap();
        f.log
            .cast_vote(NewMvpVote::new(f.session_id, f.bo, f.cy))
            .unwrap();

        let tally = f.stats.mvp_tally(f.session_id).unwrap();
        assert_eq!(
            tally,
            vec![
                MvpTally {
                    user_id: f.cy,
                    votes: 2
                },
                MvpTally {
                    user_id: f.bo,
                    votes: 1
                },
            ]
        );
        assert_eq!(
            f.stats.mvp_tally(f.session_id + 100).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_teams_played_tracks_memberships() {
        let f = fixture();
        let on_red = f.sessions.add_team_member(f.red, f.ade).unwrap();
        f.sessions.add_team_member(f.blue, f.ade).unwrap();

        let teams = f.stats.teams_played(f.ade).unwrap();
        let labels: Vec<String> = teams.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["Red (Sunday League)", "Blue (Sunday League)"]);

        f.sessions.remove_team_member(on_red.id).unwrap();
        assert_eq!(
            f.stats.teams_played(f.ade).unwrap(),
            vec![TeamPlayed {
                team_name: "Blue".into(),
                group_name: "Sunday League".into(),
            }]
        );
    }

    #[test]
    fn test_team_played_label() {
        let team: TeamPlayed = "Red (Sunday League)".parse().unwrap();
        assert_eq!(
            team,
            TeamPlayed {
                team_name: "Red".into(),
                group_name: "Sunday League".into(),
            }
        );
        assert_eq!(team.to_string(), "Red (Sunday League)");
        assert_eq!(
            serde_json::to_string(&team).unwrap(),
            "\"Red (Sunday League)\""
        );

        assert!("Red".parse::<TeamPlayed>().is_err());
        assert!(serde_json::from_str::<TeamPlayed>("\"Red Sunday\"").is_err());
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let f = fixture();
        for err in [
            f.stats.goals_scored_count(999).unwrap_err(),
            f.stats.assists_count(999).unwrap_err(),
            f.stats.mvp_wins_count(999).unwrap_err(),
            f.stats.teams_played(999).unwrap_err(),
            f.stats.user_profile(999).unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[test]
    fn test_user_profile_serializes_flat() {
        let f = fixture();
        f.sessions.add_team_member(f.red, f.bo).unwrap();
        f.log
            .record_goal(NewGoal::new(f.session_id, f.red, f.bo).assisted_by(f.cy))
            .unwrap();
        f.log
            .cast_vote(NewMvpVote::new(f.session_id, f.ade, f.bo))
            .unwrap();

        let profile = f.stats.user_profile(f.bo).unwrap();
        assert_eq!(profile.user.name, "Bo");
        assert_eq!((profile.goals_scored, profile.assists, profile.mvp_wins), (1, 0, 1));

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["name"], "Bo");
        assert_eq!(json["goals_scored"], 1);
        assert_eq!(json["teams_played"], serde_json::json!(["Red (Sunday League)"]));
        assert!(json.get("user").is_none());

        let back: UserProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, profile);
    }
}
