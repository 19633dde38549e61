use std::fmt;

use crate::errors::ModelError;

/// Longest key the hosted database accepts, in bytes.
const MAX_SEGMENT_BYTES: usize = 768;
const FORBIDDEN: [char; 6] = ['.', '#', '$', '[', ']', '/'];

pub const PLANETS_ROOT: &str = "planets";
pub const SHOP_ROOT: &str = "shop";
pub const ADMINS_ROOT: &str = "admins";

/// A validated slash-delimited address of one node in the store,
/// e.g. `planets/mars/ali`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordPath {
    segments: Vec<String>,
}

impl RecordPath {
    /// Parse a slash-delimited path. Leading, trailing and repeated slashes are ignored.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let segments: Vec<String> = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        if segments.is_empty() {
            return Err(ModelError::validation("path must name at least one key"));
        }
        for seg in &segments {
            validate_segment(seg)?;
        }
        Ok(Self { segments })
    }

    /// Extend the path by one key.
    pub fn child(&self, key: &str) -> Result<Self, ModelError> {
        validate_segment(key)?;
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(Self { segments })
    }

    pub fn planets() -> Self {
        Self { segments: vec![PLANETS_ROOT.to_string()] }
    }

    pub fn shop() -> Self {
        Self { segments: vec![SHOP_ROOT.to_string()] }
    }

    /// `planets/{planet}`
    pub fn planet(planet: &str) -> Result<Self, ModelError> {
        Self::planets().child(planet)
    }

    /// `planets/{planet}/{nickname}`
    pub fn user(planet: &str, nickname: &str) -> Result<Self, ModelError> {
        Self::planet(planet)?.child(nickname)
    }

    /// `shop/{id}`
    pub fn shop_item(id: &str) -> Result<Self, ModelError> {
        Self::shop().child(id)
    }

    /// `admins/{identity}`
    pub fn admin(identity_id: &str) -> Result<Self, ModelError> {
        Self { segments: vec![ADMINS_ROOT.to_string()] }.child(identity_id)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last key of the path.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Percent-encoded form, suitable for splicing into a URL path.
    pub fn to_url_path(&self) -> String {
        self.segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

fn validate_segment(seg: &str) -> Result<(), ModelError> {
    if seg.trim().is_empty() {
        return Err(ModelError::validation("path key must not be blank"));
    }
    if seg.len() > MAX_SEGMENT_BYTES {
        return Err(ModelError::validation(format!("path key longer than {MAX_SEGMENT_BYTES} bytes")));
    }
    if let Some(c) = seg.chars().find(|c| FORBIDDEN.contains(c) || c.is_control()) {
        return Err(ModelError::validation(format!("path key {seg:?} contains forbidden character {c:?}")));
    }
    Ok(())
}
