use crate::models::{Proposal, Snapshot, StoryEntry};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowTarget {
    Proposals,
    Story,
}

impl fmt::Display for FollowTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowTarget::Proposals => write!(f, "proposals"),
            FollowTarget::Story => write!(f, "story"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowSignal {
    pub proposals: bool,
    pub story: bool,
}

impl FollowSignal {
    pub fn is_empty(&self) -> bool {
        !self.proposals && !self.story
    }

    pub fn targets(&self) -> impl Iterator<Item = FollowTarget> {
        let proposals = self.proposals.then_some(FollowTarget::Proposals);
        let story = self.story.then_some(FollowTarget::Story);
        proposals.into_iter().chain(story)
    }
}

// Length plus last element: enough to tell growth and tail replacement apart
#[derive(Debug, Clone, PartialEq)]
struct Tail<T> {
    len: usize,
    last: Option<T>,
}

impl<T: Clone + PartialEq> Tail<T> {
    fn of(items: &[T]) -> Self {
        Self {
            len: items.len(),
            last: items.last().cloned(),
        }
    }

    // An empty list has nothing to scroll to
    fn changed_from(&self, previous: Option<&Tail<T>>) -> bool {
        self.last.is_some() && previous != Some(self)
    }
}

/// Decides when the view should jump to the newest item. Only a change in
/// a list's tail counts; rendering the same data again emits nothing.
#[derive(Debug, Default)]
pub struct AutoFollow {
    proposals: Option<Tail<Proposal>>,
    story: Option<Tail<StoryEntry>>,
}

impl AutoFollow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, snapshot: &Snapshot) -> FollowSignal {
        let proposals = Tail::of(&snapshot.proposals);
        let story = Tail::of(&snapshot.story_history);

        let signal = FollowSignal {
            proposals: proposals.changed_from(self.proposals.as_ref()),
            story: story.changed_from(self.story.as_ref()),
        };

        self.proposals = Some(proposals);
        self.story = Some(story);
        signal
    }
}
