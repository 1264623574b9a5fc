//! Shared domain models.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Aggregated counters attached to a listed game, nested under `_count`
/// in the wire format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GameCounts {
    /// Number of published ads for the game.
    pub ads: u32,
}

/// A single listed game as returned by the `/games` collection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    /// Opaque identifier assigned by the server.
    pub id: String,
    /// Human-readable game title.
    pub title: String,
    /// Banner image path or URL.
    #[serde(rename = "bannerUrl")]
    pub banner_url: String,
    /// Aggregated counters; currently only the ad count.
    #[serde(rename = "_count")]
    pub count: GameCounts,
}

impl GameSummary {
    /// Number of ads currently published for this game.
    pub fn ads(&self) -> u32 {
        self.count.ads
    }
}

/// Latest successfully fetched listing plus its fetch timestamp.
///
/// Fetch completions are applied in issue order: a completion whose
/// sequence number is not newer than the last applied one is discarded,
/// so a late arrival can never overwrite fresher data. Failures leave
/// the previous listing and timestamp untouched.
#[derive(Debug, Clone, Default)]
pub struct RefreshState {
    games: Vec<GameSummary>,
    last_updated: Option<DateTime<Local>>,
    applied_seq: u64,
}

impl RefreshState {
    /// Currently displayed listing, in server response order.
    pub fn games(&self) -> &[GameSummary] {
        &self.games
    }

    /// Completion time of the newest applied fetch, `None` until the
    /// first fetch succeeds.
    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    /// Apply a successful fetch completion, replacing the listing
    /// wholesale. Returns `false` when the completion is stale and was
    /// discarded.
    pub fn apply(
        &mut self,
        seq: u64,
        games: Vec<GameSummary>,
        fetched_at: DateTime<Local>,
    ) -> bool {
        if seq <= self.applied_seq {
            return false;
        }
        self.applied_seq = seq;
        self.games = games;
        self.last_updated = Some(fetched_at);
        true
    }
}

/// Days of the week selectable in an ad draft, Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeekDay {
    /// Sunday.
    Sunday,
    /// Monday.
    Monday,
    /// Tuesday.
    Tuesday,
    /// Wednesday.
    Wednesday,
    /// Thursday.
    Thursday,
    /// Friday.
    Friday,
    /// Saturday.
    Saturday,
}

impl WeekDay {
    /// All weekdays in display order.
    pub const ALL: [WeekDay; 7] = [
        WeekDay::Sunday,
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
        WeekDay::Saturday,
    ];

    /// One-letter label for the toggle row.
    pub fn short_label(&self) -> &'static str {
        match self {
            WeekDay::Sunday => "S",
            WeekDay::Monday => "M",
            WeekDay::Tuesday => "T",
            WeekDay::Wednesday => "W",
            WeekDay::Thursday => "T",
            WeekDay::Friday => "F",
            WeekDay::Saturday => "S",
        }
    }

    /// Full name used in logs and hints.
    pub fn name(&self) -> &'static str {
        match self {
            WeekDay::Sunday => "Sunday",
            WeekDay::Monday => "Monday",
            WeekDay::Tuesday => "Tuesday",
            WeekDay::Wednesday => "Wednesday",
            WeekDay::Thursday => "Thursday",
            WeekDay::Friday => "Friday",
            WeekDay::Saturday => "Saturday",
        }
    }

    /// Position within [`WeekDay::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// In-progress field values of the compose-ad form.
///
/// The draft is never persisted or submitted anywhere; it lives only
/// while the composer dialog is open and is dropped on cancel or
/// submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdDraft {
    /// Game the ad is for, free text.
    pub game: String,
    /// Player name or nickname.
    pub nickname: String,
    /// Years played, digits as typed.
    pub years_playing: String,
    /// Discord handle for contact.
    pub discord: String,
    /// Weekday availability, Sunday first. Each toggle is independent.
    pub week_days: [bool; 7],
    /// Start of the daily play window, as typed (`HH:MM`).
    pub hour_start: String,
    /// End of the daily play window, as typed. Not validated against
    /// the start.
    pub hour_end: String,
    /// Whether the player usually connects to voice chat.
    pub use_voice_channel: bool,
}

impl AdDraft {
    /// Whether the given day is toggled on.
    pub fn day_selected(&self, day: WeekDay) -> bool {
        self.week_days[day.index()]
    }

    /// Days currently toggled on, in display order.
    pub fn selected_days(&self) -> Vec<WeekDay> {
        WeekDay::ALL
            .into_iter()
            .filter(|day| self.day_selected(*day))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, title: &str, ads: u32) -> GameSummary {
        GameSummary {
            id: id.to_string(),
            title: title.to_string(),
            banner_url: format!("/{id}.png"),
            count: GameCounts { ads },
        }
    }

    #[test]
    fn decodes_wire_listing() {
        let body = r#"[{"id":"1","title":"League of Legends","bannerUrl":"/a.png","_count":{"ads":5}}]"#;
        let games: Vec<GameSummary> = serde_json::from_str(body).expect("valid listing");
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, "1");
        assert_eq!(games[0].title, "League of Legends");
        assert_eq!(games[0].banner_url, "/a.png");
        assert_eq!(games[0].ads(), 5);
    }

    #[test]
    fn decodes_empty_listing() {
        let games: Vec<GameSummary> = serde_json::from_str("[]").expect("valid listing");
        assert!(games.is_empty());
    }

    #[test]
    fn apply_replaces_listing_and_sets_timestamp() {
        let mut state = RefreshState::default();
        assert!(state.last_updated().is_none());

        let at = Local::now();
        assert!(state.apply(1, vec![summary("1", "Dota 2", 3)], at));
        assert_eq!(state.games().len(), 1);
        assert_eq!(state.last_updated(), Some(at));

        assert!(state.apply(2, Vec::new(), Local::now()));
        assert!(state.games().is_empty());
        assert!(state.last_updated().is_some());
    }

    #[test]
    fn apply_discards_stale_completions() {
        let mut state = RefreshState::default();
        let newer_at = Local::now();
        assert!(state.apply(2, vec![summary("2", "Valorant", 7)], newer_at));

        // A slower fetch issued earlier resolves afterwards; issue order wins.
        assert!(!state.apply(1, vec![summary("1", "CS2", 1)], Local::now()));
        assert_eq!(state.games().len(), 1);
        assert_eq!(state.games()[0].id, "2");
        assert_eq!(state.last_updated(), Some(newer_at));

        assert!(!state.apply(2, Vec::new(), Local::now()));
        assert_eq!(state.games()[0].id, "2");
    }

    #[test]
    fn draft_days_are_independent() {
        let mut draft = AdDraft::default();
        draft.week_days[WeekDay::Tuesday.index()] = true;
        assert!(draft.day_selected(WeekDay::Tuesday));
        for day in WeekDay::ALL {
            if day != WeekDay::Tuesday {
                assert!(!draft.day_selected(day), "{} flipped", day.name());
            }
        }

        draft.week_days[WeekDay::Saturday.index()] = true;
        assert_eq!(
            draft.selected_days(),
            vec![WeekDay::Tuesday, WeekDay::Saturday]
        );
    }
}
