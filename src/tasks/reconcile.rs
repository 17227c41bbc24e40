use crate::error::ProviderError;
use crate::models::{ImageRef, Proposal, Snapshot, StoryEntry, TimeInfo};
use crate::voting::sort_by_votes;
use chrono::Utc;
use log::warn;
use std::sync::Arc;
use tokio::sync::watch;

// Raw outcome of one fetch cycle, before any fallback is applied
#[derive(Debug)]
pub struct TickResults {
    pub proposals: Result<Vec<Proposal>, ProviderError>,
    pub story_history: Result<Vec<StoryEntry>, ProviderError>,
    pub time_info: Result<Option<TimeInfo>, ProviderError>,
    // None when no image was requested this tick
    pub generated_image: Option<Result<Option<ImageRef>, ProviderError>>,
}

/// Builds the next snapshot from a tick's results.
///
/// Any resource that failed keeps the value from `previous`, so a tick
/// always yields a complete snapshot. A story history shorter than the
/// previous one counts as a failure: history only grows.
pub fn reconcile(previous: &Snapshot, tick: u64, results: TickResults) -> Snapshot {
    let mut proposals = match results.proposals {
        Ok(proposals) => proposals,
        Err(e) => {
            warn!("Tick {}: keeping previous proposals: {}", tick, e);
            previous.proposals.clone()
        }
    };
    sort_by_votes(&mut proposals);

    let story_history = match results.story_history {
        Ok(history) if history.len() >= previous.story_history.len() => history,
        Ok(history) => {
            warn!(
                "Tick {}: story history shrank from {} to {} entries, keeping previous",
                tick,
                previous.story_history.len(),
                history.len()
            );
            previous.story_history.clone()
        }
        Err(e) => {
            warn!("Tick {}: keeping previous story history: {}", tick, e);
            previous.story_history.clone()
        }
    };

    let time_info = match results.time_info {
        Ok(time_info) => time_info,
        Err(e) => {
            warn!("Tick {}: keeping previous time info: {}", tick, e);
            previous.time_info
        }
    };

    // An empty image response means nothing new was generated
    let generated_image = match results.generated_image {
        Some(Ok(Some(image))) => Some(image),
        Some(Ok(None)) | None => previous.generated_image.clone(),
        Some(Err(e)) => {
            warn!("Tick {}: keeping previous image: {}", tick, e);
            previous.generated_image.clone()
        }
    };

    Snapshot {
        tick,
        fetched_at: Utc::now(),
        proposals,
        story_history,
        time_info,
        generated_image,
    }
}

/// Publishes `snapshot` unless the channel already holds the same or a
/// newer tick. Returns whether it was published.
pub fn publish_if_newer(tx: &watch::Sender<Arc<Snapshot>>, snapshot: Snapshot) -> bool {
    let mut snapshot = Some(snapshot);
    tx.send_if_modified(|current| match snapshot.take() {
        Some(next) if next.tick > current.tick => {
            *current = Arc::new(next);
            true
        }
        _ => false,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    Idle,
    Fetching(u64),
    Publishing(u64),
}

/// Drives ticks through Idle -> Fetching -> Publishing -> Idle. Anything
/// other than Idle is the in-flight flag: a second tick cannot begin
/// until the first finishes.
#[derive(Debug)]
pub struct TickCycle {
    phase: TickPhase,
    last_tick: u64,
}

impl TickCycle {
    pub fn new(last_tick: u64) -> Self {
        Self {
            phase: TickPhase::Idle,
            last_tick,
        }
    }

    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    pub fn in_flight(&self) -> bool {
        self.phase != TickPhase::Idle
    }

    // Returns the new tick number, or None while another tick is in flight
    pub fn begin(&mut self) -> Option<u64> {
        if self.in_flight() {
            return None;
        }
        self.last_tick += 1;
        self.phase = TickPhase::Fetching(self.last_tick);
        Some(self.last_tick)
    }

    pub fn publishing(&mut self, tick: u64) -> bool {
        if self.phase != TickPhase::Fetching(tick) {
            return false;
        }
        self.phase = TickPhase::Publishing(tick);
        true
    }

    pub fn finish(&mut self) {
        self.phase = TickPhase::Idle;
    }
}
