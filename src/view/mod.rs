pub mod follow;
pub mod terminal;

use crate::models::{Proposal, Snapshot};
use crate::voting::{percentage, progress_color, sort_by_votes, total_votes, Rgb, COUNTDOWN_COLOR};
use log::debug;
use std::fmt::Write;

pub use follow::{AutoFollow, FollowSignal, FollowTarget};

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct StoryCard {
    pub action: Option<String>,
    pub narration: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProposalRow {
    pub rank: usize,
    pub message: String,
    pub user: String,
    pub vote: u32,
    pub percentage: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Countdown {
    // No proposals yet this turn
    Empty,
    // Proposals exist but the vote timer has not been reported
    Loading,
    Progress {
        seconds_remaining: f64,
        total_seconds: f64,
        percentage: f64,
        color: Rgb,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub story: Vec<StoryCard>,
    pub proposals: Vec<ProposalRow>,
    pub total_votes: u64,
    pub countdown: Countdown,
    pub generated_image: Option<String>,
}

/// Derives everything the rendering surface shows from one snapshot.
/// Pure: the snapshot is only read, proposals are ordered on a copy.
pub fn present(snapshot: &Snapshot) -> View {
    let mut ordered: Vec<Proposal> = snapshot.proposals.clone();
    sort_by_votes(&mut ordered);

    let total = total_votes(&ordered);
    let proposals = ordered
        .into_iter()
        .enumerate()
        .map(|(index, proposal)| {
            let share = percentage(f64::from(proposal.vote), total as f64);
            ProposalRow {
                rank: index + 1,
                message: proposal.message,
                user: proposal.user,
                vote: proposal.vote,
                percentage: share,
                color: progress_color(share),
            }
        })
        .collect::<Vec<_>>();

    let countdown = match (proposals.is_empty(), snapshot.time_info) {
        (true, _) => Countdown::Empty,
        (false, None) => Countdown::Loading,
        (false, Some(time)) => Countdown::Progress {
            seconds_remaining: time.seconds_remaining,
            total_seconds: time.total_seconds,
            percentage: percentage(time.seconds_remaining, time.total_seconds),
            color: COUNTDOWN_COLOR,
        },
    };

    let story = snapshot
        .story_history
        .iter()
        .map(|entry| StoryCard {
            action: entry.story_action.clone(),
            narration: entry.narration_result.clone(),
            image_url: entry.narration_image_url.clone(),
        })
        .collect();

    View {
        story,
        proposals,
        total_votes: total,
        countdown,
        generated_image: snapshot
            .generated_image
            .as_ref()
            .map(|image| image.as_str().to_string()),
    }
}

/// Whatever draws the view. The presenter renders every snapshot and asks
/// the surface to jump to the newest item only when a list's tail moved.
pub trait RenderSurface {
    fn render(&mut self, view: &View);

    fn scroll_to_newest(&mut self, target: FollowTarget);
}

pub struct Presenter<S: RenderSurface> {
    surface: S,
    follow: AutoFollow,
}

impl<S: RenderSurface> Presenter<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            follow: AutoFollow::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn show(&mut self, snapshot: &Snapshot) -> FollowSignal {
        let view = present(snapshot);
        self.surface.render(&view);

        let signal = self.follow.observe(snapshot);
        for target in signal.targets() {
            debug!("Tick {}: following newest {}", snapshot.tick, target);
            self.surface.scroll_to_newest(target);
        }
        signal
    }
}

fn bar(percentage: f64) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn bar_line(percentage: f64, count: impl std::fmt::Display, total: impl std::fmt::Display) -> String {
    format!("{} {:.2}% ({} out of {})", bar(percentage), percentage, count, total)
}

// Plain-text layout: story column first, then the proposals column
pub fn render_text(view: &View) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "== Story ==");
    for card in &view.story {
        let _ = writeln!(out);
        if let Some(action) = &card.action {
            let _ = writeln!(out, "Action: {}", action);
        }
        let _ = writeln!(out, "Result: {}", card.narration);
        if let Some(url) = &card.image_url {
            let _ = writeln!(out, "Image: {}", url);
        }
    }
    if let Some(image) = &view.generated_image {
        let _ = writeln!(out);
        let _ = writeln!(out, "Illustration: {}", image);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "== Proposals ==");
    match &view.countdown {
        Countdown::Empty => {
            let _ = writeln!(out, "No proposals.");
        }
        Countdown::Loading => {
            let _ = writeln!(out, "Loading vote timer...");
        }
        Countdown::Progress {
            seconds_remaining,
            total_seconds,
            percentage,
            color,
        } => {
            let _ = writeln!(
                out,
                "Time left {} {}",
                bar_line(*percentage, seconds_remaining, total_seconds),
                color
            );
        }
    }
    for row in &view.proposals {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}: {} [{}]", row.rank, row.message, row.user);
        let _ = writeln!(
            out,
            "   {} {}",
            bar_line(row.percentage, row.vote, view.total_votes),
            row.color
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageRef, StoryEntry, TimeInfo};

    fn proposal(message: &str, vote: u32, user: &str) -> Proposal {
        Proposal {
            message: message.to_string(),
            vote,
            user: user.to_string(),
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        renders: Vec<View>,
        scrolls: Vec<FollowTarget>,
    }

    impl RenderSurface for RecordingSurface {
        fn render(&mut self, view: &View) {
            self.renders.push(view.clone());
        }

        fn scroll_to_newest(&mut self, target: FollowTarget) {
            self.scrolls.push(target);
        }
    }

    #[test]
    fn single_proposal_gets_full_share() {
        let snapshot = Snapshot {
            proposals: vec![proposal("go left", 2, "a")],
            story_history: vec![StoryEntry::new(None, "start")],
            time_info: Some(TimeInfo { seconds_remaining: 30.0, total_seconds: 60.0 }),
            ..Snapshot::initial()
        };

        let view = present(&snapshot);
        assert_eq!(view.total_votes, 2);
        assert_eq!(view.proposals.len(), 1);
        assert_eq!(view.proposals[0].percentage, 100.0);
        assert_eq!(view.proposals[0].color, Rgb { r: 0, g: 255, b: 0 });
        match view.countdown {
            Countdown::Progress { percentage, color, .. } => {
                assert_eq!(percentage, 50.0);
                assert_eq!(color, COUNTDOWN_COLOR);
            }
            other => panic!("expected progress bar, got {other:?}"),
        }
        assert_eq!(
            view.story,
            vec![StoryCard { action: None, narration: "start".to_string(), image_url: None }]
        );
    }

    #[test]
    fn present_sorts_a_copy() {
        let snapshot = Snapshot {
            proposals: vec![proposal("a", 3, "u1"), proposal("b", 5, "u2"), proposal("c", 1, "u3")],
            ..Snapshot::initial()
        };
        let before = snapshot.clone();

        let view = present(&snapshot);
        let ranked: Vec<(usize, &str)> =
            view.proposals.iter().map(|row| (row.rank, row.message.as_str())).collect();
        assert_eq!(ranked, vec![(1, "b"), (2, "a"), (3, "c")]);
        assert_eq!(snapshot, before);
    }

    #[test]
    fn display_order_matches_publish_order_on_ties() {
        let mut published = vec![
            proposal("first", 5, "u1"),
            proposal("low", 2, "u2"),
            proposal("second", 5, "u3"),
        ];
        sort_by_votes(&mut published);
        let snapshot = Snapshot { proposals: published.clone(), ..Snapshot::initial() };

        let shown: Vec<String> = present(&snapshot).proposals.into_iter().map(|row| row.message).collect();
        let expected: Vec<String> = published.into_iter().map(|p| p.message).collect();
        assert_eq!(shown, vec!["first", "second", "low"]);
        assert_eq!(shown, expected);
    }

    #[test]
    fn zero_votes_show_zero_percent() {
        let snapshot = Snapshot {
            proposals: vec![proposal("a", 0, "u1"), proposal("b", 0, "u2")],
            ..Snapshot::initial()
        };
        let view = present(&snapshot);
        assert_eq!(view.total_votes, 1);
        assert!(view.proposals.iter().all(|row| row.percentage == 0.0));
    }

    #[test]
    fn countdown_states() {
        let empty = Snapshot {
            time_info: Some(TimeInfo { seconds_remaining: 5.0, total_seconds: 20.0 }),
            ..Snapshot::initial()
        };
        assert_eq!(present(&empty).countdown, Countdown::Empty);

        let loading = Snapshot {
            proposals: vec![proposal("a", 1, "u1")],
            ..Snapshot::initial()
        };
        assert_eq!(present(&loading).countdown, Countdown::Loading);
    }

    #[test]
    fn render_text_omits_missing_action_line() {
        let snapshot = Snapshot {
            proposals: vec![proposal("go left", 2, "a")],
            story_history: vec![
                StoryEntry::new(None, "start"),
                StoryEntry::new(Some("go left"), "a dark corridor"),
            ],
            time_info: Some(TimeInfo { seconds_remaining: 30.0, total_seconds: 60.0 }),
            generated_image: Some(ImageRef("https://img.example/1.png".to_string())),
            ..Snapshot::initial()
        };

        let text = render_text(&present(&snapshot));
        assert_eq!(text.matches("Action:").count(), 1);
        assert!(text.contains("Action: go left"));
        assert!(text.contains("Result: start"));
        assert!(text.contains("Illustration: https://img.example/1.png"));
        assert!(text.contains("1: go left [a]"));
        assert!(text.contains("100.00% (2 out of 2) #00ff00"));
        assert!(text.contains("50.00% (30 out of 60) #eb9500"));
    }

    #[test]
    fn render_text_empty_state() {
        let text = render_text(&present(&Snapshot::initial()));
        assert!(text.contains("No proposals."));
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0.0), format!("[{}]", ".".repeat(BAR_WIDTH)));
        assert_eq!(bar(100.0), format!("[{}]", "#".repeat(BAR_WIDTH)));
        assert_eq!(bar(50.0).matches('#').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn presenter_scrolls_only_on_change() {
        let mut presenter = Presenter::new(RecordingSurface::default());
        let first = Snapshot {
            tick: 1,
            story_history: vec![StoryEntry::new(None, "start")],
            ..Snapshot::initial()
        };

        assert_eq!(presenter.show(&first), FollowSignal { proposals: false, story: true });
        presenter.show(&first);

        let grown = Snapshot {
            tick: 2,
            story_history: vec![
                StoryEntry::new(None, "start"),
                StoryEntry::new(Some("go left"), "a dark corridor"),
            ],
            ..Snapshot::initial()
        };
        presenter.show(&grown);

        let surface = presenter.into_surface();
        assert_eq!(surface.renders.len(), 3);
        assert_eq!(surface.scrolls, vec![FollowTarget::Story, FollowTarget::Story]);
    }
}
