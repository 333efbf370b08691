//! Animation triggers: `animation-trigger-*`.
//!
//! A trigger ties an animation's playback to a range of a timeline. The
//! engine resolves the trigger's timeline and range boundaries at recalc and
//! replaces a running animation's trigger when the resolved data changes
//! structurally.

use crate::style::RangeOffset;
use crate::timeline::TimelineId;

/// `animation-trigger-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
  /// Plays once on entering the range.
  Once,
  /// Restarts each time the range is entered.
  Repeat,
  /// Plays forward on enter, backward on exit.
  Alternate,
  /// Plays while inside the range, pauses outside.
  State,
}

/// A resolved trigger. Boundaries keep their specified form; the attached
/// timeline resolves them to concrete progress when it ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrigger {
  pub kind: TriggerKind,
  /// `None` when the trigger's timeline could not be resolved; such a
  /// trigger never fires.
  pub timeline: Option<TimelineId>,
  pub range_start: RangeOffset,
  pub range_end: RangeOffset,
  pub exit_range_start: RangeOffset,
  pub exit_range_end: RangeOffset,
}

impl AnimationTrigger {
  /// Structural equality used to decide whether a running animation's
  /// trigger must be replaced.
  pub fn matches(&self, other: &AnimationTrigger) -> bool {
    self == other
  }
}
