//! The animation update: a pure diff computed against an element's new
//! style. Calculators only fill this in; nothing mutates live animation
//! state until the update is applied, so a recalc that computes the same
//! styles twice yields the same update twice.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::animation::AnimationId;
use crate::keyframes::KeyframeEffectModel;
use crate::properties::PropertyHandle;
use crate::style::{RangeOffset, ScopedName};
use crate::timeline::TimelineId;
use crate::timing::Timing;
use crate::trigger::AnimationTrigger;
use crate::values::PropertyValue;

/// A CSS animation to start.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCssAnimation {
  pub name: String,
  /// Position among same-named entries of `animation-name`.
  pub name_index: usize,
  pub model: KeyframeEffectModel,
  /// Effect timing, with the timing function already moved onto the
  /// keyframes.
  pub timing: Timing,
  /// Timing as written in style, timing function included; recalc matching
  /// compares against this.
  pub specified_timing: Timing,
  pub timeline: Option<TimelineId>,
  pub paused_by_style: bool,
  pub range_start: RangeOffset,
  pub range_end: RangeOffset,
  pub trigger: Option<AnimationTrigger>,
  pub rule_version: u64,
}

/// Changes to a running CSS animation.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedCssAnimation {
  pub animation: AnimationId,
  pub model: KeyframeEffectModel,
  /// Effect timing, timing function already moved onto the keyframes.
  pub timing: Timing,
  /// Timing as written in style, for the next recalc's matching.
  pub specified_timing: Timing,
  pub rule_version: u64,
  pub timeline: Option<TimelineId>,
  pub timeline_changed: bool,
  pub range_start: RangeOffset,
  pub range_end: RangeOffset,
  pub range_changed: bool,
  pub trigger: Option<AnimationTrigger>,
  pub trigger_changed: bool,
}

/// A transition to start.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransition {
  pub property: PropertyHandle,
  /// Start value, possibly picked up mid-flight from a reversed transition.
  pub from: PropertyValue,
  pub to: PropertyValue,
  /// The value the transition would have started from had it not been
  /// interrupted; interruption detection compares against this.
  pub reversing_adjusted_start: PropertyValue,
  pub reversing_shortening_factor: f64,
  /// Timing with duration and delay already scaled by the shortening
  /// factor.
  pub timing: Timing,
  pub model: KeyframeEffectModel,
}

/// Everything one recalc decided to change about an element's animations.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnimationUpdate {
  pub new_animations: Vec<NewCssAnimation>,
  pub updated_animations: Vec<UpdatedCssAnimation>,
  /// Indices into the element's running-animation list.
  pub cancelled_animation_indices: Vec<usize>,
  pub animations_with_pause_toggled: Vec<usize>,

  pub new_transitions: FxHashMap<PropertyHandle, NewTransition>,
  pub cancelled_transitions: FxHashSet<PropertyHandle>,
  /// Transitions past their end that can be retired without a cancel event.
  pub finished_transitions: FxHashSet<PropertyHandle>,

  /// `None` removes the named timeline. Keys are complete per kind: a
  /// non-empty map replaces the element's whole set of that kind.
  pub changed_scroll_timelines: Option<FxHashMap<ScopedName, Option<TimelineId>>>,
  pub changed_view_timelines: Option<FxHashMap<ScopedName, Option<TimelineId>>>,
  pub changed_deferred_timelines: Option<FxHashMap<ScopedName, Option<TimelineId>>>,
  /// Attaching timeline -> deferred timeline, `None` detaches.
  pub changed_timeline_attachments: FxHashMap<TimelineId, Option<TimelineId>>,

  pub active_interpolations_for_animations: FxHashMap<PropertyHandle, PropertyValue>,
  pub active_interpolations_for_transitions: FxHashMap<PropertyHandle, PropertyValue>,
}

impl AnimationUpdate {
  pub fn start_transition(&mut self, transition: NewTransition) {
    self.finished_transitions.remove(&transition.property);
    self.new_transitions.insert(transition.property.clone(), transition);
  }

  /// Retracts a transition queued this recalc, for the zero-duration rule.
  pub fn unstart_transition(&mut self, property: &PropertyHandle) {
    self.new_transitions.remove(property);
  }

  pub fn cancel_transition(&mut self, property: PropertyHandle) {
    self.finished_transitions.remove(&property);
    self.cancelled_transitions.insert(property);
  }

  pub fn finish_transition(&mut self, property: PropertyHandle) {
    self.finished_transitions.insert(property);
  }

  /// Whether applying this update would change anything. The active
  /// interpolation maps are recomputed outputs, not mutations, and do not
  /// count: an idempotent recalc with running effects still reports empty.
  pub fn is_empty(&self) -> bool {
    self.new_animations.is_empty()
      && self.updated_animations.is_empty()
      && self.cancelled_animation_indices.is_empty()
      && self.animations_with_pause_toggled.is_empty()
      && self.new_transitions.is_empty()
      && self.cancelled_transitions.is_empty()
      && self.finished_transitions.is_empty()
      && self.changed_scroll_timelines.is_none()
      && self.changed_view_timelines.is_none()
      && self.changed_deferred_timelines.is_none()
      && self.changed_timeline_attachments.is_empty()
  }

  pub fn clear(&mut self) {
    *self = AnimationUpdate::default();
  }
}
