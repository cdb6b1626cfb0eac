// Team tiers used to split degradation charts into readable groups

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Top,
    Mid,
    Bottom,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Top, Tier::Mid, Tier::Bottom];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Top => "Top Teams",
            Self::Mid => "Mid Teams",
            Self::Bottom => "Bottom Teams",
        }
    }

    /// Base name of the chart file for this tier
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Mid => "mid",
            Self::Bottom => "bottom",
        }
    }
}

/// Mapping of team name to tier, serialized as a plain JSON object
/// (`{"Ferrari": "top", ...}`)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct TeamTiers {
    teams: BTreeMap<String, Tier>,
}

impl Default for TeamTiers {
    /// The 2022 roster
    fn default() -> Self {
        let roster: [(&str, Tier); 10] = [
            ("Red Bull Racing", Tier::Top),
            ("Ferrari", Tier::Top),
            ("Mercedes", Tier::Top),
            ("McLaren", Tier::Mid),
            ("Alpine", Tier::Mid),
            ("Alfa Romeo", Tier::Bottom),
            ("AlphaTauri", Tier::Bottom),
            ("Haas F1 Team", Tier::Bottom),
            ("Aston Martin", Tier::Bottom),
            ("Williams", Tier::Bottom),
        ];
        roster.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<(S, Tier)> for TeamTiers {
    fn from_iter<I: IntoIterator<Item = (S, Tier)>>(iter: I) -> Self {
        Self {
            teams: iter
                .into_iter()
                .map(|(team, tier)| (team.into(), tier))
                .collect(),
        }
    }
}

impl TeamTiers {
    /// Tier of a team, `None` for teams missing from the roster
    pub fn tier_of(&self, team: &str) -> Option<Tier> {
        self.teams.get(team).copied()
    }

    pub fn teams_in(&self, tier: Tier) -> Vec<&str> {
        self.teams
            .iter()
            .filter(|(_, t)| **t == tier)
            .map(|(team, _)| team.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster() {
        let tiers = TeamTiers::default();
        assert_eq!(tiers.len(), 10);
        assert_eq!(tiers.tier_of("Ferrari"), Some(Tier::Top));
        assert_eq!(tiers.tier_of("Alpine"), Some(Tier::Mid));
        assert_eq!(tiers.tier_of("Williams"), Some(Tier::Bottom));
        assert_eq!(tiers.tier_of("Brawn GP"), None);
        assert_eq!(tiers.teams_in(Tier::Mid), vec!["Alpine", "McLaren"]);
    }

    #[test]
    fn test_tiers_json_format() {
        let tiers: TeamTiers =
            serde_json::from_str(r#"{"Sauber": "bottom", "Ferrari": "top"}"#).unwrap();
        assert_eq!(tiers.tier_of("Sauber"), Some(Tier::Bottom));
        assert_eq!(tiers.tier_of("Red Bull Racing"), None);

        let json = serde_json::to_string(&tiers).unwrap();
        assert_eq!(json, r#"{"Ferrari":"top","Sauber":"bottom"}"#);
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let result = serde_json::from_str::<TeamTiers>(r#"{"Sauber": "backmarker"}"#);
        assert!(result.is_err());
    }
}
