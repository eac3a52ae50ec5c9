/**
 * TELEMETRY STORE - État en mémoire du kernel EAB
 *
 * RÔLE : Trois tables (heartbeats, détections, bans) partagées entre handlers HTTP.
 * Chaque table a son propre mutex : aucune écriture perdue sous requêtes concurrentes.
 *
 * SÉMANTIQUE : heartbeats écrasés par HWID, détections et bans en append-only.
 * Rien n'est jamais supprimé, l'expiration des bans est évaluée à la lecture (cf. queries.rs).
 */

use crate::models::{
    Ban, Detection, HeartbeatsMap, DEFAULT_BAN_REASON, DEFAULT_DETAIL, TEMP_BAN_DURATION_MS,
    TEMP_BAN_TYPE,
};
use parking_lot::Mutex;
use std::sync::Arc;
use time::{macros::format_description, OffsetDateTime, UtcOffset};

pub type Shared<T> = Arc<Mutex<T>>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("missing required field: {0}")]
    InvalidInput(&'static str),
}

/// Horodatage unix en millisecondes
pub fn unix_ms(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// ISO-8601 UTC à la milliseconde, ex. 2024-03-10T12:30:00.000Z
pub fn iso_millis(at: OffsetDateTime) -> String {
    at.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
        .unwrap_or_default()
}

/// Champ requis : absent ou vide = manquant
fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, StoreError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(StoreError::InvalidInput(field)),
    }
}

fn or_default(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

#[derive(Clone, Default)]
pub struct TelemetryStore {
    pub(crate) heartbeats: Shared<HeartbeatsMap>,
    pub(crate) detections: Shared<Vec<Detection>>,
    pub(crate) bans: Shared<Vec<Ban>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_heartbeat(&self, hwid: Option<&str>) -> Result<i64, StoreError> {
        self.record_heartbeat_at(hwid, OffsetDateTime::now_utc())
    }

    pub fn record_heartbeat_at(&self, hwid: Option<&str>, now: OffsetDateTime) -> Result<i64, StoreError> {
        let hwid = required(hwid, "hwid")?;
        let last_seen = unix_ms(now);
        self.heartbeats.lock().insert(hwid.to_string(), last_seen);
        Ok(last_seen)
    }

    pub fn append_detection(
        &self,
        hwid: Option<&str>,
        kind: Option<&str>,
        detail: Option<&str>,
    ) -> Result<Detection, StoreError> {
        self.append_detection_at(hwid, kind, detail, OffsetDateTime::now_utc())
    }

    pub fn append_detection_at(
        &self,
        hwid: Option<&str>,
        kind: Option<&str>,
        detail: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Detection, StoreError> {
        let hwid = required(hwid, "hwid")?;
        let kind = required(kind, "type")?;

        let detection = Detection {
            hwid: hwid.to_string(),
            kind: kind.to_string(),
            detail: or_default(detail, DEFAULT_DETAIL),
            time: iso_millis(now),
        };
        self.detections.lock().push(detection.clone());
        Ok(detection)
    }

    pub fn append_ban(
        &self,
        user_id: Option<&str>,
        kind: Option<&str>,
        reason: Option<&str>,
    ) -> Result<Ban, StoreError> {
        self.append_ban_at(user_id, kind, reason, OffsetDateTime::now_utc())
    }

    pub fn append_ban_at(
        &self,
        user_id: Option<&str>,
        kind: Option<&str>,
        reason: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Ban, StoreError> {
        let user_id = required(user_id, "userId")?;
        let kind = required(kind, "type")?;

        // seul "temp" expire, tout le reste est permanent
        let expiry = (kind == TEMP_BAN_TYPE).then(|| unix_ms(now) + TEMP_BAN_DURATION_MS);

        let ban = Ban {
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            reason: or_default(reason, DEFAULT_BAN_REASON),
            expiry,
        };
        self.bans.lock().push(ban.clone());
        Ok(ban)
    }

    pub fn hosts_tracked(&self) -> usize {
        self.heartbeats.lock().len()
    }

    pub fn detections_logged(&self) -> usize {
        self.detections.lock().len()
    }

    pub fn bans_recorded(&self) -> usize {
        self.bans.lock().len()
    }
}
