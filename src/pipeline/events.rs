//! Pipeline events
//!
//! Emitted as the `event` field of tracing events, one per stage.

use std::fmt;

/// Observable pipeline events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Filter compiled and applied
    FilterApplied,
    /// Filter failed to compile; records left unfiltered
    FilterDegraded,
    /// Post-filter total counted
    TotalCounted,
    /// Overall aggregates computed
    AggregatesComputed,
    /// Effective sort keys assembled
    SortAssembled,
    /// Page window applied
    PageApplied,
    /// Group tree built
    GroupsBuilt,
}

impl PipelineEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineEvent::FilterApplied => "FILTER_APPLIED",
            PipelineEvent::FilterDegraded => "FILTER_DEGRADED",
            PipelineEvent::TotalCounted => "TOTAL_COUNTED",
            PipelineEvent::AggregatesComputed => "AGGREGATES_COMPUTED",
            PipelineEvent::SortAssembled => "SORT_ASSEMBLED",
            PipelineEvent::PageApplied => "PAGE_APPLIED",
            PipelineEvent::GroupsBuilt => "GROUPS_BUILT",
        }
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        for event in [
            PipelineEvent::FilterApplied,
            PipelineEvent::FilterDegraded,
            PipelineEvent::TotalCounted,
            PipelineEvent::AggregatesComputed,
            PipelineEvent::SortAssembled,
            PipelineEvent::PageApplied,
            PipelineEvent::GroupsBuilt,
        ] {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
        assert_eq!(PipelineEvent::FilterDegraded.to_string(), "FILTER_DEGRADED");
    }
}
