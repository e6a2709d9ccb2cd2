//! Data-driven classification of placement types.
//!
//! Mode and scaling decisions dispatch on type names and actor profiles.
//! The predicate lists are domain data that evolves with the game dumps, so
//! they live in configuration structs with vendor defaults instead of being
//! branched on in the pipeline.

use std::collections::HashMap;

/// Auxiliary actor database: type name to profile category.
///
/// Loaded from the vendor actor-info dump; misses are tolerated everywhere
/// this is consulted.
#[derive(Debug, Clone, Default)]
pub struct ActorDb {
    profiles: HashMap<String, String>,
}

impl ActorDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, profile: impl Into<String>) {
        self.profiles.insert(name.into(), profile.into());
    }

    pub fn profile(&self, name: &str) -> Option<&str> {
        self.profiles.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl FromIterator<(String, String)> for ActorDb {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        ActorDb {
            profiles: iter.into_iter().collect(),
        }
    }
}

/// Allow-list rules deciding whether an object spawns in last-boss mode.
///
/// An object fails the test when its profile (unless the name is exempt) or
/// its name matches any veto entry. The veto applies to whole generation
/// groups: see the pipeline, which disqualifies every member of a component
/// containing one failing object.
#[derive(Debug, Clone)]
pub struct LastBossRules {
    /// Names whose profile veto is skipped.
    pub exempt_names: Vec<String>,
    /// Profiles vetoed by exact match.
    pub veto_profiles: Vec<String>,
    /// Profiles vetoed by substring.
    pub veto_profile_substrings: Vec<String>,
    /// Names vetoed by exact match.
    pub veto_names: Vec<String>,
    /// Names vetoed by substring.
    pub veto_name_substrings: Vec<String>,
}

impl Default for LastBossRules {
    fn default() -> Self {
        LastBossRules {
            exempt_names: vec!["Enemy_GanonBeast".into()],
            veto_profiles: vec![
                "Enemy".into(),
                "GelEnemy".into(),
                "SandWorm".into(),
                "Prey".into(),
                "Dragon".into(),
                "Guardian".into(),
            ],
            veto_profile_substrings: vec!["NPC".into()],
            veto_names: vec!["Enemy_Guardian_A".into()],
            veto_name_substrings: vec!["Entrance".into(), "WarpPoint".into(), "Terminal".into()],
        }
    }
}

impl LastBossRules {
    /// Whether a single object of this type passes the allow test.
    pub fn allows(&self, name: &str, actors: &ActorDb) -> bool {
        if !self.exempt_names.iter().any(|n| n == name) {
            if let Some(profile) = actors.profile(name) {
                if self.veto_profiles.iter().any(|p| p == profile) {
                    return false;
                }
                if self.veto_profile_substrings.iter().any(|s| profile.contains(s)) {
                    return false;
                }
            }
        }
        if self.veto_names.iter().any(|n| n == name) {
            return false;
        }
        if self.veto_name_substrings.iter().any(|s| name.contains(s)) {
            return false;
        }
        true
    }
}

/// Types whose `LevelSensorMode` parameter is published as the scaling
/// column. Everything else stores null.
#[derive(Debug, Clone)]
pub struct ScaleRules {
    pub prefixes: Vec<String>,
}

impl Default for ScaleRules {
    fn default() -> Self {
        ScaleRules {
            prefixes: vec!["Weapon_".into(), "Enemy_".into()],
        }
    }
}

impl ScaleRules {
    pub fn applies(&self, name: &str) -> bool {
        self.prefixes.iter().any(|p| name.starts_with(p))
    }
}
