use serde::{Deserialize, Serialize};

/// Feed status of one camera pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FeedState {
    /// No frame read yet
    #[default]
    Connecting,
    Live,
    /// Consecutive failed ticks since the feed was last live
    Reconnecting { attempts: u64 },
    /// Serving the static placeholder; there is no device behind this feed
    Offline,
    Stopped,
}

impl FeedState {
    pub fn can_transition_to(&self, target: &FeedState) -> bool {
        use FeedState::*;

        matches!(
            (self, target),
            (Connecting, Live)
                | (Connecting, Reconnecting { .. })
                | (Connecting, Offline)
                | (Live, Reconnecting { .. })
                | (Reconnecting { .. }, Reconnecting { .. })
                | (Reconnecting { .. }, Live)
                | (Reconnecting { .. }, Offline)
                | (_, Stopped)
        ) && *self != Stopped
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Connecting => "Connecting",
            Self::Live => "Live",
            Self::Reconnecting { .. } => "Reconnecting",
            Self::Offline => "Offline",
            Self::Stopped => "Stopped",
        }
    }

    /// The last tick produced a real frame
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Live | Self::Offline)
    }
}
