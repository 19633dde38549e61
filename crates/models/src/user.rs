use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{errors::ModelError, lenient};

/// Sentinel stored in `bagage` when a user carries nothing ("none").
pub const BAGGAGE_NONE: &str = "لا يوجد";
pub const DEFAULT_BALANCE: &str = "0";
pub const DEFAULT_WARNINGS: &str = "0";

/// Role labels a bank user can hold. Stored and served as their Arabic
/// label; input may use either the label or the English variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rank {
    #[default]
    Member,
    Moderator,
    Leader,
    Minister,
    Judge,
    Queen,
}

impl Rank {
    pub const ALL: [Rank; 6] = [
        Rank::Member,
        Rank::Moderator,
        Rank::Leader,
        Rank::Minister,
        Rank::Judge,
        Rank::Queen,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Rank::Member => "عضو",
            Rank::Moderator => "مشرف",
            Rank::Leader => "قائد",
            Rank::Minister => "وزير",
            Rank::Judge => "قاضي",
            Rank::Queen => "ملكة",
        }
    }

    fn english(&self) -> &'static str {
        match self {
            Rank::Member => "member",
            Rank::Moderator => "moderator",
            Rank::Leader => "leader",
            Rank::Minister => "minister",
            Rank::Judge => "judge",
            Rank::Queen => "queen",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Rank {
    type Err = ModelError;

    /// Accepts the stored Arabic label or the English variant name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Rank::ALL
            .into_iter()
            .find(|r| r.label() == s || r.english().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::validation(format!("unknown rank {s:?}")))
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Rank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Unknown labels written by other clients read back as the base role.
fn lenient_rank<'de, D>(deserializer: D) -> Result<Rank, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = lenient::string(deserializer)?;
    Ok(raw.parse().unwrap_or_default())
}

/// A bank account stored at `planets/{planet}/{username}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, deserialize_with = "lenient::string")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub balance: String,
    #[serde(default, deserialize_with = "lenient_rank")]
    pub rank: Rank,
    #[serde(default, deserialize_with = "lenient::string")]
    pub bagage: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub warnings: String,
}

/// Input for creating a user; blank fields take the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub rank: Option<Rank>,
    #[serde(default)]
    pub bagage: Option<String>,
    #[serde(default)]
    pub warnings: Option<String>,
}

/// Partial update of an existing user. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub rank: Option<Rank>,
    #[serde(default)]
    pub bagage: Option<String>,
    #[serde(default)]
    pub warnings: Option<String>,
}

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

impl UserRecord {
    /// The single place new-record defaults are applied, shared by the
    /// single-add form and bulk import.
    pub fn normalize_new(input: NewUser) -> Result<UserRecord, ModelError> {
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(ModelError::validation("username required"));
        }
        Ok(UserRecord {
            username,
            balance: or_default(input.balance, DEFAULT_BALANCE),
            rank: input.rank.unwrap_or_default(),
            bagage: or_default(input.bagage, BAGGAGE_NONE),
            warnings: or_default(input.warnings, DEFAULT_WARNINGS),
        })
    }

    /// Field map as written to the store.
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("username".into(), Value::String(self.username));
        fields.insert("balance".into(), Value::String(self.balance));
        fields.insert("rank".into(), Value::String(self.rank.label().to_string()));
        fields.insert("bagage".into(), Value::String(self.bagage));
        fields.insert("warnings".into(), Value::String(self.warnings));
        fields
    }

    /// Read a stored record, taking the username from its key.
    pub fn from_stored(key: &str, value: Value) -> Option<UserRecord> {
        if !value.is_object() {
            return None;
        }
        let mut record: UserRecord = serde_json::from_value(value).ok()?;
        record.username = key.to_string();
        Some(record)
    }

    /// Fields shown on the public bank card (identity fields are left out).
    pub fn public_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("balance", self.balance.clone()),
            ("rank", self.rank.label().to_string()),
            ("bagage", self.bagage.clone()),
            ("warnings", self.warnings.clone()),
        ]
    }
}

impl UserPatch {
    /// Build the merge payload for the user stored under `key`.
    ///
    /// The username is always written back so the stored field keeps
    /// matching its key; a patch that tries to rename the user is rejected.
    pub fn into_fields(self, key: &str) -> Result<Map<String, Value>, ModelError> {
        if let Some(name) = &self.username {
            if name.trim() != key {
                return Err(ModelError::validation(format!(
                    "username {name:?} does not match record key {key:?}"
                )));
            }
        }
        let mut fields = Map::new();
        if let Some(v) = self.balance {
            fields.insert("balance".into(), Value::String(v.trim().to_string()));
        }
        if let Some(r) = self.rank {
            fields.insert("rank".into(), Value::String(r.label().to_string()));
        }
        if let Some(v) = self.bagage {
            fields.insert("bagage".into(), Value::String(v.trim().to_string()));
        }
        if let Some(v) = self.warnings {
            fields.insert("warnings".into(), Value::String(v.trim().to_string()));
        }
        if fields.is_empty() {
            return Err(ModelError::validation("nothing to update"));
        }
        fields.insert("username".into(), Value::String(key.to_string()));
        Ok(fields)
    }
}

/// Keep only Arabic letters and whitespace, as the public lookup form does.
pub fn sanitize_nickname(raw: &str) -> String {
    raw.chars()
        .filter(|c| ('\u{0621}'..='\u{064A}').contains(c) || c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_applies_defaults() {
        let rec = UserRecord::normalize_new(NewUser { username: " sara ".into(), balance: Some("50".into()), ..Default::default() }).unwrap();
        assert_eq!(rec.username, "sara");
        assert_eq!(rec.balance, "50");
        assert_eq!(rec.rank, Rank::Member);
        assert_eq!(rec.bagage, BAGGAGE_NONE);
        assert_eq!(rec.warnings, "0");
    }

    #[test]
    fn normalize_treats_blank_as_missing() {
        let rec = UserRecord::normalize_new(NewUser {
            username: "ali".into(),
            balance: Some("  ".into()),
            bagage: Some("".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(rec.balance, "0");
        assert_eq!(rec.bagage, BAGGAGE_NONE);
    }

    #[test]
    fn normalize_requires_username() {
        assert!(UserRecord::normalize_new(NewUser::default()).is_err());
    }

    #[test]
    fn rank_serializes_as_label() {
        let fields = UserRecord::normalize_new(NewUser { username: "a".into(), rank: Some(Rank::Judge), ..Default::default() })
            .unwrap()
            .into_fields();
        assert_eq!(fields["rank"], json!("قاضي"));
        assert_eq!(fields.len(), 5);
    }

    #[test]
    fn rank_parses_either_name() {
        assert_eq!("queen".parse::<Rank>().unwrap(), Rank::Queen);
        assert_eq!("وزير".parse::<Rank>().unwrap(), Rank::Minister);
        assert!("emperor".parse::<Rank>().is_err());
    }

    #[test]
    fn rank_input_accepts_label_or_name() {
        assert_eq!(serde_json::from_value::<Rank>(json!("queen")).unwrap(), Rank::Queen);
        assert_eq!(serde_json::from_value::<Rank>(json!("Leader")).unwrap(), Rank::Leader);
        assert_eq!(serde_json::from_value::<Rank>(json!("وزير")).unwrap(), Rank::Minister);
        let err = serde_json::from_value::<Rank>(json!("emperor")).unwrap_err();
        assert!(err.to_string().contains("unknown rank"));
        assert_eq!(serde_json::to_value(Rank::Queen).unwrap(), json!("ملكة"));

        let input: NewUser = serde_json::from_value(json!({ "username": "a", "rank": "judge" })).unwrap();
        assert_eq!(input.rank, Some(Rank::Judge));
    }

    #[test]
    fn stored_record_is_read_leniently() {
        let rec = UserRecord::from_stored("ali", json!({ "username": "old", "balance": 100, "rank": "???" })).unwrap();
        assert_eq!(rec.username, "ali");
        assert_eq!(rec.balance, "100");
        assert_eq!(rec.rank, Rank::Member);
        assert_eq!(rec.warnings, "");
        assert!(UserRecord::from_stored("ali", json!("scalar")).is_none());
    }

    #[test]
    fn patch_writes_only_named_fields() {
        let fields = UserPatch { balance: Some("7".into()), ..Default::default() }.into_fields("ali").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["balance"], json!("7"));
        assert_eq!(fields["username"], json!("ali"));
    }

    #[test]
    fn patch_cannot_rename() {
        let patch = UserPatch { username: Some("bob".into()), balance: Some("1".into()), ..Default::default() };
        assert!(patch.into_fields("ali").is_err());
    }

    #[test]
    fn empty_patch_rejected() {
        assert!(UserPatch { username: Some("ali".into()), ..Default::default() }.into_fields("ali").is_err());
    }

    #[test]
    fn sanitize_strips_latin_and_digits() {
        assert_eq!(sanitize_nickname("علي1 x"), "علي ");
        assert_eq!(sanitize_nickname("sara"), "");
    }
}
