// Lectures dérivées du TelemetryStore : presence, stats, validité des bans

use crate::models::{
    BanStatus, BanVerdict, Detection, DetectionStats, HostStatus, Presence, ONLINE_WINDOW_MS,
};
use crate::store::{unix_ms, TelemetryStore};
use time::OffsetDateTime;

impl TelemetryStore {
    pub fn status(&self, hwid: &str) -> HostStatus {
        self.status_at(hwid, OffsetDateTime::now_utc())
    }

    pub fn status_at(&self, hwid: &str, now: OffsetDateTime) -> HostStatus {
        let last_seen = self.heartbeats.lock().get(hwid).copied();
        let Some(last_seen) = last_seen else {
            return HostStatus { hwid: hwid.to_string(), status: Presence::Offline, last_seen: None };
        };

        let online = unix_ms(now) - last_seen < ONLINE_WINDOW_MS;
        HostStatus {
            hwid: hwid.to_string(),
            status: if online { Presence::Online } else { Presence::Offline },
            last_seen: Some(last_seen),
        }
    }

    pub fn list_detections(&self) -> Vec<Detection> {
        self.detections.lock().clone()
    }

    pub fn detection_stats(&self) -> DetectionStats {
        let mut stats = DetectionStats::new();
        for d in self.detections.lock().iter() {
            *stats.entry(d.kind.clone()).or_insert(0) += 1;
        }
        stats
    }

    pub fn ban_status(&self, user_id: &str) -> BanStatus {
        self.ban_status_at(user_id, OffsetDateTime::now_utc())
    }

    /// Premier ban trouvé pour cet utilisateur (ordre d'insertion), pas le plus récent.
    pub fn ban_status_at(&self, user_id: &str, now: OffsetDateTime) -> BanStatus {
        let first = self.bans.lock().iter().find(|b| b.user_id == user_id).cloned();

        let verdict = match first {
            Some(ban) if !ban.is_expired(unix_ms(now)) => BanVerdict::Banned { ban },
            _ => BanVerdict::Clean,
        };
        BanStatus { user_id: user_id.to_string(), verdict }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::datetime, Duration};

    #[test]
    fn test_heartbeat_then_status_is_online() {
        let store = TelemetryStore::new();
        store.record_heartbeat(Some("hw-1")).unwrap();
        assert_eq!(store.status("hw-1").status, Presence::Online);
    }

    #[test]
    fn test_unknown_hwid_is_offline_without_last_seen() {
        let store = TelemetryStore::new();
        let st = store.status("never-seen");
        assert_eq!(st.status, Presence::Offline);
        assert_eq!(st.last_seen, None);
    }

    #[test]
    fn test_liveness_window() {
        let store = TelemetryStore::new();
        let t0 = datetime!(2024-01-01 00:00:00 UTC);
        let last_seen = store.record_heartbeat_at(Some("hw-1"), t0).unwrap();

        let st = store.status_at("hw-1", t0 + Duration::milliseconds(14_999));
        assert_eq!(st.status, Presence::Online);

        let st = store.status_at("hw-1", t0 + Duration::milliseconds(15_000));
        assert_eq!(st.status, Presence::Offline);
        assert_eq!(st.last_seen, Some(last_seen));
    }

    #[test]
    fn test_detection_stats_counts_per_type() {
        let store = TelemetryStore::new();
        for _ in 0..3 {
            store.append_detection(Some("hw-1"), Some("aimbot"), None).unwrap();
        }
        for _ in 0..2 {
            store.append_detection(Some("hw-2"), Some("speedhack"), None).unwrap();
        }

        let stats = store.detection_stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["aimbot"], 3);
        assert_eq!(stats["speedhack"], 2);
        assert!(!stats.contains_key("wallhack"));
    }

    #[test]
    fn test_list_detections_keeps_insertion_order() {
        let store = TelemetryStore::new();
        store.append_detection(Some("a"), Some("aimbot"), None).unwrap();
        store.append_detection(Some("b"), Some("speedhack"), None).unwrap();
        store.append_detection(Some("c"), Some("aimbot"), None).unwrap();

        let hwids: Vec<_> = store.list_detections().into_iter().map(|d| d.hwid).collect();
        assert_eq!(hwids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_temp_ban_expires_at_read_time() {
        let store = TelemetryStore::new();
        let t0 = datetime!(2024-01-01 00:00:00 UTC);
        store.append_ban_at(Some("u1"), Some("temp"), None, t0).unwrap();

        let before = store.ban_status_at("u1", t0 + Duration::days(59));
        assert!(matches!(before.verdict, BanVerdict::Banned { .. }));

        let after = store.ban_status_at("u1", t0 + Duration::days(60) + Duration::milliseconds(1));
        assert_eq!(after.verdict, BanVerdict::Clean);
        assert_eq!(store.bans_recorded(), 1);
    }

    #[test]
    fn test_permanent_ban_never_expires() {
        let store = TelemetryStore::new();
        let t0 = datetime!(2024-01-01 00:00:00 UTC);
        store.append_ban_at(Some("u1"), Some("perm"), None, t0).unwrap();

        let much_later = store.ban_status_at("u1", t0 + Duration::days(3650));
        assert!(matches!(much_later.verdict, BanVerdict::Banned { .. }));
    }

    #[test]
    fn test_ban_lookup_uses_first_match() {
        let store = TelemetryStore::new();
        let t0 = datetime!(2024-01-01 00:00:00 UTC);
        store.append_ban_at(Some("u1"), Some("temp"), Some("first"), t0).unwrap();
        store.append_ban_at(Some("u1"), Some("perm"), Some("second"), t0).unwrap();

        // le ban permanent ne masque pas l'expiration du premier
        let later = store.ban_status_at("u1", t0 + Duration::days(61));
        assert_eq!(later.verdict, BanVerdict::Clean);

        match store.ban_status_at("u1", t0).verdict {
            BanVerdict::Banned { ban } => assert_eq!(ban.reason, "first"),
            other => panic!("expected banned, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_user_is_clean() {
        let store = TelemetryStore::new();
        assert_eq!(store.ban_status("nobody").verdict, BanVerdict::Clean);
    }
}
