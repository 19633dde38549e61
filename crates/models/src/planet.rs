use serde::Serialize;
use serde_json::Value;

use crate::user::UserRecord;

/// Planets offered by the public bank lookup.
pub const PUBLIC_PLANETS: [&str; 5] = ["jupiter", "mars", "venus", "mercury", "neptune"];

pub fn is_public_planet(planet: &str) -> bool {
    PUBLIC_PLANETS.contains(&planet)
}

/// All users stored under one planet. Built on demand for the admin
/// console; never written back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanetCollection {
    pub id: String,
    pub users: Vec<UserRecord>,
}

impl PlanetCollection {
    /// Group the value stored at `planets` by planet id. Planets and users are
    /// sorted by key; entries that are not objects are skipped.
    pub fn from_tree(tree: Value) -> Vec<PlanetCollection> {
        let Value::Object(planets) = tree else {
            return Vec::new();
        };
        let mut out: Vec<PlanetCollection> = planets
            .into_iter()
            .map(|(id, users)| {
                let mut users: Vec<UserRecord> = match users {
                    Value::Object(map) => map
                        .into_iter()
                        .filter_map(|(key, value)| UserRecord::from_stored(&key, value))
                        .collect(),
                    _ => Vec::new(),
                };
                users.sort_by(|a, b| a.username.cmp(&b.username));
                PlanetCollection { id, users }
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn find(&self, username: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.username == username)
    }
}
