use serde::{Deserialize, Serialize};

/// Client control message, tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlCommand {
    /// Re-seed the conversation; empty fields fall back to session defaults
    #[serde(rename = "init")]
    Init {
        #[serde(default)]
        system: String,
        #[serde(default)]
        user: String,
    },
    #[serde(rename = "hangup")]
    Hangup,
    #[serde(rename = "go")]
    ManualTrigger,
    #[serde(rename = "up")]
    VolumeUp,
    #[serde(rename = "down")]
    VolumeDown,
    #[serde(rename = "fast")]
    SpeedUp,
    #[serde(rename = "late")]
    SpeedDown,
    #[serde(other)]
    Unknown,
}

impl ControlCommand {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
