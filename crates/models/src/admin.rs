use serde::Deserialize;
use serde_json::Value;

/// Allow-list entry stored at `admins/{identity}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AdminEntry {
    #[serde(default)]
    pub allowed: bool,
}

impl AdminEntry {
    /// Read an entry as stored. `allowed` must be a JSON boolean; any other
    /// type, or a value that is not an object, is not an entry.
    pub fn from_stored(value: &Value) -> Option<AdminEntry> {
        AdminEntry::deserialize(value).ok()
    }

    /// Only a literal boolean `true` grants access. Strings, numbers and
    /// missing fields do not.
    pub fn grants_access(value: &Value) -> bool {
        AdminEntry::from_stored(value).is_some_and(|entry| entry.allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_true_only() {
        assert!(AdminEntry::grants_access(&json!({ "allowed": true })));
        assert!(!AdminEntry::grants_access(&json!({ "allowed": false })));
        assert!(!AdminEntry::grants_access(&json!({ "allowed": "true" })));
        assert!(!AdminEntry::grants_access(&json!({ "allowed": 1 })));
        assert!(!AdminEntry::grants_access(&json!({})));
        assert!(!AdminEntry::grants_access(&json!(true)));
    }

    #[test]
    fn entry_reads_strict_bool() {
        assert_eq!(AdminEntry::from_stored(&json!({ "allowed": true, "note": "x" })), Some(AdminEntry { allowed: true }));
        assert_eq!(AdminEntry::from_stored(&json!({})), Some(AdminEntry { allowed: false }));
        assert_eq!(AdminEntry::from_stored(&json!({ "allowed": "true" })), None);
        assert_eq!(AdminEntry::from_stored(&json!("allowed")), None);
    }
}
