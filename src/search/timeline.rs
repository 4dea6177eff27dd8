//! Staged narration shown while a search runs.
//!
//! A [`NarrationTimeline`] is an ordered list of `(offset, text)` points,
//! each offset measured from the start of the search. The orchestrator walks
//! it with a single timer; the texts say nothing about what the remote
//! service is actually doing.

use std::time::Duration;

use crate::conversation::prompts;
use crate::errors::TimelineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationPoint {
    pub offset: Duration,
    pub text: String,
}

impl NarrationPoint {
    pub fn new(offset: Duration, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationTimeline {
    points: Vec<NarrationPoint>,
}

impl NarrationTimeline {
    /// Build a timeline, rejecting offsets that are not strictly increasing.
    pub fn new(points: Vec<NarrationPoint>) -> Result<Self, TimelineError> {
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].offset <= pair[0].offset {
                return Err(TimelineError::NotIncreasing {
                    index: index + 1,
                    offset: pair[1].offset,
                });
            }
        }
        Ok(Self { points })
    }

    /// The four-step narration used unless configured otherwise.
    pub fn standard() -> Self {
        Self {
            points: prompts::NARRATION
                .iter()
                .map(|(offset_ms, text)| NarrationPoint::new(Duration::from_millis(*offset_ms), *text))
                .collect(),
        }
    }

    pub fn points(&self) -> &[NarrationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Check that every point fires strictly before `window` ends, so all of
    /// them are shown ahead of the search's terminal message.
    pub fn check_window(&self, window: Duration) -> Result<(), TimelineError> {
        match self
            .points
            .iter()
            .enumerate()
            .find(|(_, point)| point.offset >= window)
        {
            Some((index, point)) => Err(TimelineError::OutsideWindow {
                index,
                offset: point.offset,
                window,
            }),
            None => Ok(()),
        }
    }
}

impl Default for NarrationTimeline {
    fn default() -> Self {
        Self::standard()
    }
}
