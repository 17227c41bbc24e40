use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub message: String,
    pub vote: u32,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoryEntry {
    // The backend sends "" when no action led to this entry (the opening narration)
    #[serde(default, deserialize_with = "empty_as_none")]
    pub story_action: Option<String>,
    pub narration_result: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub narration_image_url: Option<String>,
}

impl StoryEntry {
    pub fn new(story_action: Option<&str>, narration_result: &str) -> Self {
        Self {
            story_action: story_action.map(str::to_string),
            narration_result: narration_result.to_string(),
            narration_image_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInfo {
    pub seconds_remaining: f64,
    pub total_seconds: f64,
}

impl TimeInfo {
    /// Checks the countdown bounds: `0 <= seconds_remaining <= total_seconds`
    /// and `total_seconds > 0`.
    pub fn validate(&self) -> Result<(), String> {
        if !self.seconds_remaining.is_finite() || !self.total_seconds.is_finite() {
            return Err("time values must be finite".to_string());
        }
        if self.total_seconds <= 0.0 {
            return Err(format!("total_seconds must be positive, got {}", self.total_seconds));
        }
        if self.seconds_remaining < 0.0 {
            return Err(format!(
                "seconds_remaining must not be negative, got {}",
                self.seconds_remaining
            ));
        }
        if self.seconds_remaining > self.total_seconds {
            return Err(format!(
                "seconds_remaining {} exceeds total_seconds {}",
                self.seconds_remaining, self.total_seconds
            ));
        }
        Ok(())
    }
}

// Opaque reference to a generated image (data URI or URL)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Everything the viewer knows at one poll tick. Built once by the
/// reconciler and never mutated afterwards; a newer snapshot replaces it
/// wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub fetched_at: DateTime<Utc>,
    pub proposals: Vec<Proposal>,
    pub story_history: Vec<StoryEntry>,
    pub time_info: Option<TimeInfo>,
    pub generated_image: Option<ImageRef>,
}

impl Snapshot {
    // Published before the first tick completes
    pub fn initial() -> Self {
        Self {
            tick: 0,
            fetched_at: Utc::now(),
            proposals: Vec::new(),
            story_history: Vec::new(),
            time_info: None,
            generated_image: None,
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_entry_treats_empty_action_as_absent() {
        let entry: StoryEntry = serde_json::from_str(
            r#"{"story_action": "", "narration_result": "start", "narration_image_url": ""}"#,
        )
        .unwrap();
        assert_eq!(entry.story_action, None);
        assert_eq!(entry.narration_image_url, None);
        assert_eq!(entry.narration_result, "start");
    }

    #[test]
    fn story_entry_accepts_null_or_missing_action() {
        let entry: StoryEntry =
            serde_json::from_str(r#"{"story_action": null, "narration_result": "start"}"#).unwrap();
        assert_eq!(entry, StoryEntry::new(None, "start"));

        let entry: StoryEntry = serde_json::from_str(r#"{"narration_result": "start"}"#).unwrap();
        assert_eq!(entry, StoryEntry::new(None, "start"));
    }

    #[test]
    fn story_entry_requires_narration() {
        let result: Result<Vec<StoryEntry>, _> =
            serde_json::from_str(r#"[{"story_action": "open the door"}]"#);
        assert!(result.is_err());

        let result: Result<Vec<StoryEntry>, _> =
            serde_json::from_str(r#"[{"unexpected": 1}, {"story_action": "go left"}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn proposal_rejects_negative_votes() {
        let result: Result<Proposal, _> =
            serde_json::from_str(r#"{"message": "go left", "vote": -1, "user": "a"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn time_info_accepts_integer_seconds() {
        let info: TimeInfo =
            serde_json::from_str(r#"{"seconds_remaining": 30, "total_seconds": 60}"#).unwrap();
        assert_eq!(info.seconds_remaining, 30.0);
        assert!(info.validate().is_ok());
    }

    #[test]
    fn time_info_validation_rejects_out_of_range_values() {
        let cases = [
            TimeInfo { seconds_remaining: -1.0, total_seconds: 60.0 },
            TimeInfo { seconds_remaining: 10.0, total_seconds: 0.0 },
            TimeInfo { seconds_remaining: 61.0, total_seconds: 60.0 },
            TimeInfo { seconds_remaining: f64::NAN, total_seconds: 60.0 },
        ];
        for info in cases {
            assert!(info.validate().is_err(), "{info:?} should be rejected");
        }
    }
}
