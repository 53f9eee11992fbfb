//! Data returned by the HoYoLAB API.
//!
//! Only the fields this program relies on are typed. Everything else is kept in the
//! `extra` maps so templates can still reach it.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// UTC offset of the timestamps in the daily reward history.
const SERVICE_OFFSET_SECS: i32 = 8 * 3600;

/// A Genshin Impact account bound to the session cookies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameAccount {
    #[serde(alias = "game_uid", deserialize_with = "number_from_string")]
    pub uid: u64,
    pub region: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub level: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GameAccount {
    /// Builds an account from a bare uid, deriving its server from the uid prefix.
    pub fn from_uid(uid: u64) -> Result<Self, Error> {
        Ok(GameAccount {
            uid,
            region: region_of(uid).ok_or(Error::UnknownRegion(uid))?.to_string(),
            nickname: String::new(),
            level: 0,
            extra: Map::new(),
        })
    }
}

/// Server id for a uid. The leading digits before the last eight identify it.
pub fn region_of(uid: u64) -> Option<&'static str> {
    let digits = uid.to_string();
    if digits.len() < 9 {
        return None;
    }
    match &digits[..digits.len() - 8] {
        "1" | "2" | "3" => Some("cn_gf01"),
        "5" => Some("cn_qd01"),
        "6" => Some("os_usa"),
        "7" => Some("os_euro"),
        "8" | "18" => Some("os_asia"),
        "9" => Some("os_cht"),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameAccountList {
    #[serde(default)]
    pub list: Vec<BoundRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoundRole {
    pub game_biz: String,
    #[serde(flatten)]
    pub account: GameAccount,
}

/// Player role info shown on the record card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerInfo {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub level: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The account's record card: role, stats, characters and explorations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(default)]
    pub role: PlayerInfo,
    #[serde(default)]
    pub stats: Map<String, Value>,
    #[serde(default)]
    pub avatars: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub index: u32,
    #[serde(default)]
    pub star: u32,
    #[serde(default)]
    pub max_star: u32,
    #[serde(default)]
    pub levels: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Results of one Spiral Abyss cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpiralAbyss {
    #[serde(default)]
    pub schedule_id: u64,
    #[serde(default)]
    pub max_floor: String,
    #[serde(default)]
    pub total_star: u32,
    #[serde(default)]
    pub total_battle_times: u32,
    #[serde(default)]
    pub total_win_times: u32,
    #[serde(default)]
    pub floors: Vec<Floor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AbyssCycles {
    pub current: SpiralAbyss,
    pub previous: SpiralAbyss,
}

impl AbyssCycles {
    /// The cycle worth reporting. A current cycle without cleared floors has not been
    /// started yet, so the previous one is shown instead.
    pub fn effective(&self) -> &SpiralAbyss {
        if self.current.floors.is_empty() {
            &self.previous
        } else {
            &self.current
        }
    }
}

/// Everything shown about the player: record card, detailed characters, both abyss
/// cycles and the current events.
#[derive(Debug, Clone, Serialize)]
pub struct UserStatsSnapshot {
    pub account: GameAccount,
    pub info: GameRecord,
    pub characters: Vec<Value>,
    pub abyss: AbyssCycles,
    pub activities: Map<String, Value>,
}

/// Picks the abyss cycle to render from a stats snapshot.
pub fn select_abyss(snapshot: &UserStatsSnapshot) -> &SpiralAbyss {
    snapshot.abyss.effective()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiaryIncome {
    #[serde(default)]
    pub current_primogems: i64,
    #[serde(default)]
    pub current_mora: i64,
    #[serde(default)]
    pub last_primogems: i64,
    #[serde(default)]
    pub last_mora: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Primogem and mora income of the current month.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diary {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub day_data: DiaryIncome,
    #[serde(default)]
    pub month_data: DiaryIncome,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Daily check-in progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardInfo {
    #[serde(default)]
    pub total_sign_day: u32,
    #[serde(default)]
    pub today: String,
    #[serde(default)]
    pub is_sign: bool,
    #[serde(default)]
    pub first_bind: bool,
    #[serde(default)]
    pub month_last_day: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterList {
    #[serde(default)]
    pub avatars: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimedReward {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "cnt")]
    pub amount: u32,
    #[serde(default)]
    pub icon: String,
    #[serde(alias = "created_at", deserialize_with = "service_time")]
    pub time: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimedRewardPage {
    #[serde(default)]
    pub list: Vec<ClaimedReward>,
}

fn number_from_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Parses `2023-01-01 00:00:00`, which the service reports in UTC+8.
fn service_time<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<FixedOffset>, D::Error> {
    use serde::de::Error as _;

    let text = String::deserialize(deserializer)?;
    if let Ok(time) = DateTime::parse_from_rfc3339(&text) {
        return Ok(time);
    }
    let naive = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S").map_err(D::Error::custom)?;
    FixedOffset::east_opt(SERVICE_OFFSET_SECS)
        .and_then(|offset| offset.from_local_datetime(&naive).single())
        .ok_or_else(|| D::Error::custom(format!("invalid reward time {text}")))
}
