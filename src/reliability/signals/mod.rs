//! Independent, pure analyses over a [`NormalizedTimeline`].

mod churn;
mod gaps;
mod overlap;
mod progression;

pub use churn::{analyze_churn, ChurnReport, SwitchTrigger};
pub use gaps::{analyze_gaps, Gap, GapReport};
pub use overlap::{detect_overlaps, OverlapPair, OverlapReport};
pub use progression::{
    analyze_rank_progression, RankProgressionReport, RankTransition, TransitionKind,
    UnrankedContract,
};

use super::scoring::ScoringConfig;
use super::timeline::NormalizedTimeline;

/// Output of every extractor for one timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    pub overlaps: OverlapReport,
    pub gaps: GapReport,
    pub churn: ChurnReport,
    pub rank_progression: RankProgressionReport,
}

pub fn extract_signals(timeline: &NormalizedTimeline, config: &ScoringConfig) -> SignalSet {
    SignalSet {
        overlaps: detect_overlaps(timeline, config),
        gaps: analyze_gaps(timeline, config),
        churn: analyze_churn(timeline, config),
        rank_progression: analyze_rank_progression(timeline, config),
    }
}
