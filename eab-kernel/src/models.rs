use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Détail par défaut d'une détection sans `detail`
pub const DEFAULT_DETAIL: &str = "N/A";
/// Raison par défaut d'un ban sans `reason`
pub const DEFAULT_BAN_REASON: &str = "Rule violation";
/// Seul type de ban qui porte une expiration
pub const TEMP_BAN_TYPE: &str = "temp";
/// Durée d'un ban temporaire : 60 jours en ms
pub const TEMP_BAN_DURATION_MS: i64 = 60 * 24 * 60 * 60 * 1000;
/// Fenêtre de liveness : au-delà, un HWID est offline
pub const ONLINE_WINDOW_MS: i64 = 15_000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Detection {
    pub hwid: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub detail: String,
    pub time: String, // ISO-8601 ms UTC, assigné à la réception
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ban {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub reason: String,
    pub expiry: Option<i64>, // null = permanent
}

impl Ban {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expiry, Some(expiry) if now_ms > expiry)
    }
}

// Corps entrants : tout est optionnel, la présence est vérifiée par le store
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct HeartbeatIn {
    pub hwid: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct DetectionIn {
    pub hwid: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub detail: Option<Value>, // libre : non-string = défaut
}

impl DetectionIn {
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_ref().and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct BanIn {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub reason: Option<Value>,
}

impl BanIn {
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_ref().and_then(Value::as_str)
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Offline,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostStatus {
    pub hwid: String,
    pub status: Presence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BanStatus {
    pub user_id: String,
    #[serde(flatten)]
    pub verdict: BanVerdict,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BanVerdict {
    Clean,
    Banned { ban: Ban },
}

pub type HeartbeatsMap = HashMap<String, i64>;
pub type DetectionStats = HashMap<String, usize>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ban_status_shape() {
        let clean = BanStatus { user_id: "u1".into(), verdict: BanVerdict::Clean };
        assert_eq!(serde_json::to_value(&clean).unwrap(), json!({"userId": "u1", "status": "clean"}));

        let ban = Ban { user_id: "u1".into(), kind: "perm".into(), reason: "x".into(), expiry: None };
        let banned = BanStatus { user_id: "u1".into(), verdict: BanVerdict::Banned { ban } };
        assert_eq!(
            serde_json::to_value(&banned).unwrap(),
            json!({
                "userId": "u1",
                "status": "banned",
                "ban": {"userId": "u1", "type": "perm", "reason": "x", "expiry": null}
            })
        );
    }

    #[test]
    fn test_offline_status_omits_last_seen() {
        let st = HostStatus { hwid: "abc".into(), status: Presence::Offline, last_seen: None };
        assert_eq!(serde_json::to_value(&st).unwrap(), json!({"hwid": "abc", "status": "offline"}));
    }

    #[test]
    fn test_incoming_fields_are_optional() {
        let d: DetectionIn = serde_json::from_str(r#"{"hwid":"h"}"#).unwrap();
        assert_eq!(d.hwid.as_deref(), Some("h"));
        assert!(d.kind.is_none());

        let b: BanIn = serde_json::from_str(r#"{"userId":"u","type":"temp"}"#).unwrap();
        assert_eq!(b.user_id.as_deref(), Some("u"));
        assert_eq!(b.kind.as_deref(), Some("temp"));
        assert!(b.reason().is_none());
    }

    #[test]
    fn test_non_string_optional_fields_are_tolerated() {
        let d: DetectionIn = serde_json::from_str(r#"{"hwid":"h","type":"aimbot","detail":42}"#).unwrap();
        assert_eq!(d.kind.as_deref(), Some("aimbot"));
        assert_eq!(d.detail(), None);

        let d: DetectionIn = serde_json::from_str(r#"{"hwid":"h","type":"aimbot","detail":null}"#).unwrap();
        assert_eq!(d.detail(), None);

        let b: BanIn = serde_json::from_str(r#"{"userId":"u","type":"perm","reason":{"code":7}}"#).unwrap();
        assert_eq!(b.reason(), None);

        let b: BanIn = serde_json::from_str(r#"{"userId":"u","type":"perm","reason":"chargeback"}"#).unwrap();
        assert_eq!(b.reason(), Some("chargeback"));
    }

    #[test]
    fn test_temp_ban_duration() {
        assert_eq!(TEMP_BAN_DURATION_MS, 5_184_000_000);
    }
}
