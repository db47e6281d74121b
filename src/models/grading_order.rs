use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

const HOUR: i64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedTier {
    Standard,
    Express,
    Priority,
}

impl SpeedTier {
    /// Wait between payment and the start of grading, in seconds.
    pub fn delay_secs(self) -> i64 {
        match self {
            SpeedTier::Priority => 48 * HOUR,
            SpeedTier::Express => 120 * HOUR,
            SpeedTier::Standard => 168 * HOUR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpeedTier::Standard => "standard",
            SpeedTier::Express => "express",
            SpeedTier::Priority => "priority",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingStatus {
    Queued,
    Grading,
    Done,
}

impl GradingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GradingStatus::Queued => "queued",
            GradingStatus::Grading => "grading",
            GradingStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingOrder {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub owner_id: ObjectId,
    pub speed_tier: SpeedTier,

    #[serde(default)]
    pub paid_at: Option<i64>,
    pub status: GradingStatus,

    #[serde(default)]
    pub grading_started_at: Option<i64>,

    // shown in the notification copy when present
    #[serde(default)]
    pub card_name: Option<String>,
}
