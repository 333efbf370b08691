//! Animation objects: the playback state that outlives individual style
//! recalcs. A CSS animation or transition owns a keyframe model, a timeline
//! attachment and start/hold times; everything else is recomputed from style
//! each recalc.

use rustc_hash::FxHashMap;

use crate::engine::ElementId;
use crate::events::PhaseDelegate;
use crate::keyframes::KeyframeEffectModel;
use crate::properties::PropertyHandle;
use crate::style::RangeOffset;
use crate::timeline::TimelineId;
use crate::timing::Timing;
use crate::trigger::AnimationTrigger;

/// Handle to an animation in the host's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationId(pub u32);

/// What created this animation.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationKind {
  CssAnimation {
    name: String,
    /// Position among same-named items in `animation-name`, for matching
    /// across recalcs.
    name_index: usize,
  },
  CssTransition {
    property: PropertyHandle,
    /// Monotonic per-recalc counter; orders competing transition events.
    generation: u64,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPlayState {
  Idle,
  Running,
  Paused,
  Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
  pub id: AnimationId,
  pub kind: AnimationKind,
  pub target: ElementId,
  /// `None` detaches the effect from time entirely.
  pub timeline: Option<TimelineId>,
  pub model: KeyframeEffectModel,
  pub specified_timing: Timing,
  /// In the timeline's units.
  pub start_time: Option<f64>,
  pub hold_time: Option<f64>,
  pub playback_rate: f64,
  pub paused: bool,
  pub range_start: RangeOffset,
  pub range_end: RangeOffset,
  pub trigger: Option<AnimationTrigger>,
  /// Whether the trigger's range currently contains the timeline progress.
  pub trigger_inside: bool,
  /// Whether the trigger ever fired; `once` triggers fire at most once.
  pub trigger_fired: bool,
  /// Set when script changed the corresponding aspect; style updates then
  /// leave it alone.
  pub ignore_css_play_state: bool,
  pub ignore_css_timeline: bool,
  pub ignore_css_range: bool,
  pub delegate: PhaseDelegate,
  pub cancelled: bool,
  /// Whether the effect currently runs on the compositor; replacement
  /// transitions inherit the start time in that case.
  pub on_compositor: bool,
}

impl Animation {
  pub fn new(id: AnimationId, kind: AnimationKind, target: ElementId) -> Self {
    Self {
      id,
      kind,
      target,
      timeline: None,
      model: KeyframeEffectModel {
        keyframes: Vec::new(),
        default_composite: Default::default(),
        has_named_range_keyframes: false,
      },
      specified_timing: Timing::default(),
      start_time: None,
      hold_time: None,
      playback_rate: 1.0,
      paused: false,
      range_start: RangeOffset::Normal,
      range_end: RangeOffset::Normal,
      trigger: None,
      trigger_inside: false,
      trigger_fired: false,
      ignore_css_play_state: false,
      ignore_css_timeline: false,
      ignore_css_range: false,
      delegate: PhaseDelegate::default(),
      cancelled: false,
      on_compositor: false,
    }
  }

  /// Local time on the effect's own axis, given the timeline's current
  /// time. A held animation reports its hold time regardless.
  pub fn local_time(&self, timeline_time: Option<f64>) -> Option<f64> {
    if self.cancelled {
      return None;
    }
    if let Some(hold) = self.hold_time {
      return Some(hold);
    }
    match (self.start_time, timeline_time) {
      (Some(start), Some(now)) => Some((now - start) * self.playback_rate),
      _ => None,
    }
  }

  pub fn play_state(&self, timeline_time: Option<f64>) -> AnimationPlayState {
    if self.cancelled {
      return AnimationPlayState::Idle;
    }
    if self.paused {
      return AnimationPlayState::Paused;
    }
    match self.local_time(timeline_time) {
      None => AnimationPlayState::Idle,
      Some(local) => {
        let end = self.specified_timing.end_time();
        if self.playback_rate > 0.0 && local >= end || self.playback_rate < 0.0 && local <= 0.0 {
          AnimationPlayState::Finished
        } else {
          AnimationPlayState::Running
        }
      }
    }
  }

  /// Freezes the current time as a hold time.
  pub fn pause(&mut self, timeline_time: Option<f64>) {
    if self.paused {
      return;
    }
    self.hold_time = self.local_time(timeline_time).or(Some(0.0));
    self.start_time = None;
    self.paused = true;
  }

  /// Resumes from the hold time, rebasing the start time on the timeline.
  pub fn unpause(&mut self, timeline_time: Option<f64>) {
    if !self.paused {
      return;
    }
    self.paused = false;
    let hold = self.hold_time.take().unwrap_or(0.0);
    match timeline_time {
      Some(now) if self.playback_rate != 0.0 => {
        self.start_time = Some(now - hold / self.playback_rate);
      }
      _ => {
        // Timeline inactive: stay held until it ticks.
        self.hold_time = Some(hold);
      }
    }
  }

  /// Tears the animation down. The caller reports the cancel event with
  /// timing captured before this call.
  pub fn cancel(&mut self) {
    self.cancelled = true;
    self.start_time = None;
    self.hold_time = None;
    self.on_compositor = false;
  }
}

/// Owns every animation the host has created.
#[derive(Debug, Default)]
pub struct AnimationArena {
  animations: FxHashMap<u32, Animation>,
  next: u32,
}

impl AnimationArena {
  pub fn create(&mut self, kind: AnimationKind, target: ElementId) -> AnimationId {
    let id = AnimationId(self.next);
    self.next += 1;
    self.animations.insert(id.0, Animation::new(id, kind, target));
    id
  }

  pub fn get(&self, id: AnimationId) -> Option<&Animation> {
    self.animations.get(&id.0)
  }

  pub fn get_mut(&mut self, id: AnimationId) -> Option<&mut Animation> {
    self.animations.get_mut(&id.0)
  }

  pub fn remove(&mut self, id: AnimationId) -> Option<Animation> {
    self.animations.remove(&id.0)
  }
}
