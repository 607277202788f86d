// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline of descriptive events shown while the replay plays.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A captioned moment on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Elapsed time at which this event becomes current
    pub trigger_seconds: f32,
    /// Text shown while this event is current
    pub description: String,
}

impl TimelineEvent {
    /// Create a new event
    pub fn new(trigger_seconds: f32, description: impl Into<String>) -> Self {
        Self {
            trigger_seconds,
            description: description.into(),
        }
    }
}

/// Errors raised while building a timeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    /// No events were given
    #[error("Timeline has no events")]
    Empty,

    /// The first event does not start at zero, leaving a gap with no caption
    #[error("First timeline event must trigger at 0s, found {0}s")]
    FirstTriggerNotZero(f32),

    /// An event has a NaN or infinite trigger time
    #[error("Timeline event {0} has a non-finite trigger time")]
    NonFinite(usize),

    /// Events are not sorted by trigger time
    #[error("Timeline event {index} triggers before the event preceding it")]
    OutOfOrder {
        /// Index of the offending event
        index: usize,
    },
}

/// Ordered, immutable list of timeline events
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
}

impl Timeline {
    /// Build a timeline from events sorted by trigger time.
    pub fn new(events: Vec<TimelineEvent>) -> Result<Self, TimelineError> {
        let first = events.first().ok_or(TimelineError::Empty)?;
        if let Some(index) = events.iter().position(|e| !e.trigger_seconds.is_finite()) {
            return Err(TimelineError::NonFinite(index));
        }
        if first.trigger_seconds != 0.0 {
            return Err(TimelineError::FirstTriggerNotZero(first.trigger_seconds));
        }
        if let Some(index) = events
            .windows(2)
            .position(|w| w[1].trigger_seconds < w[0].trigger_seconds)
        {
            return Err(TimelineError::OutOfOrder { index: index + 1 });
        }

        Ok(Self { events })
    }

    /// All events in trigger order
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Index of the most recent event at `seconds`.
    ///
    /// Times before the first trigger (including negative times and NaN)
    /// select the first event.
    pub fn index_at(&self, seconds: f32) -> usize {
        self.events
            .iter()
            .rposition(|e| e.trigger_seconds <= seconds)
            .unwrap_or(0)
    }

    /// Most recent event at `seconds`
    pub fn event_at(&self, seconds: f32) -> &TimelineEvent {
        &self.events[self.index_at(seconds)]
    }

    /// Description of the most recent event at `seconds`
    pub fn description_at(&self, seconds: f32) -> &str {
        &self.event_at(seconds).description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    fn approach_timeline() -> Timeline {
        Timeline::new(Scenario::default().events).unwrap()
    }

    #[test]
    fn test_step_lookup() {
        let timeline = approach_timeline();
        assert!(timeline.description_at(0.0).starts_with("T-60s"));
        assert!(timeline.description_at(29.0).starts_with("T-60s"));
        assert!(timeline.description_at(30.0).starts_with("T-30s"));
        assert!(timeline.description_at(52.0).starts_with("T-10s"));
        assert!(timeline.description_at(55.0).starts_with("T-5s"));
        assert!(timeline.description_at(60.0).starts_with("T-0s"));
        assert!(timeline.description_at(61.0).starts_with("T-0s"));
    }

    #[test]
    fn test_before_first_trigger() {
        let timeline = approach_timeline();
        assert_eq!(timeline.index_at(-5.0), 0);
        assert_eq!(timeline.index_at(f32::NAN), 0);
        assert_eq!(timeline.event_at(-1.0), &timeline.events()[0]);
    }

    #[test]
    fn test_index_is_monotonic() {
        let timeline = approach_timeline();
        let mut previous = 0;
        for step in -10..=700 {
            let index = timeline.index_at(step as f32 / 10.0);
            assert!(index >= previous);
            previous = index;
        }
        assert_eq!(previous, timeline.events().len() - 1);
    }

    #[test]
    fn test_equal_triggers_pick_the_later_event() {
        let timeline = Timeline::new(vec![
            TimelineEvent::new(0.0, "start"),
            TimelineEvent::new(5.0, "first"),
            TimelineEvent::new(5.0, "second"),
        ])
        .unwrap();
        assert_eq!(timeline.description_at(5.0), "second");
        assert_eq!(timeline.description_at(4.9), "start");
    }

    #[test]
    fn test_validation() {
        assert_eq!(Timeline::new(Vec::new()).unwrap_err(), TimelineError::Empty);
        assert_eq!(
            Timeline::new(vec![TimelineEvent::new(1.0, "late")]).unwrap_err(),
            TimelineError::FirstTriggerNotZero(1.0)
        );
        assert_eq!(
            Timeline::new(vec![
                TimelineEvent::new(0.0, "a"),
                TimelineEvent::new(10.0, "b"),
                TimelineEvent::new(5.0, "c"),
            ])
            .unwrap_err(),
            TimelineError::OutOfOrder { index: 2 }
        );
        assert_eq!(
            Timeline::new(vec![
                TimelineEvent::new(0.0, "a"),
                TimelineEvent::new(f32::INFINITY, "b"),
            ])
            .unwrap_err(),
            TimelineError::NonFinite(1)
        );
    }
}
