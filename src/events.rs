//! Animation and transition DOM events.
//!
//! Each running effect keeps an event delegate: the timing phase and
//! iteration it last reported. After every sample the delegate compares the
//! new phase against the stored one and enqueues the events the transition
//! between those phases implies. Events are only materialized when the host
//! registered a listener for them.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::engine::ElementId;
use crate::timing::{interval_end, interval_start, iteration_elapsed_time, Timing, TimingPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationEventType {
  AnimationStart,
  AnimationIteration,
  AnimationEnd,
  AnimationCancel,
  TransitionRun,
  TransitionStart,
  TransitionEnd,
  TransitionCancel,
}

impl AnimationEventType {
  pub fn name(self) -> &'static str {
    match self {
      AnimationEventType::AnimationStart => "animationstart",
      AnimationEventType::AnimationIteration => "animationiteration",
      AnimationEventType::AnimationEnd => "animationend",
      AnimationEventType::AnimationCancel => "animationcancel",
      AnimationEventType::TransitionRun => "transitionrun",
      AnimationEventType::TransitionStart => "transitionstart",
      AnimationEventType::TransitionEnd => "transitionend",
      AnimationEventType::TransitionCancel => "transitioncancel",
    }
  }
}

bitflags! {
  /// Which event kinds the host has listeners for. Unlistened events are
  /// never built.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
  pub struct ListenerFlags: u8 {
    const ANIMATION_START = 1 << 0;
    const ANIMATION_ITERATION = 1 << 1;
    const ANIMATION_END = 1 << 2;
    const ANIMATION_CANCEL = 1 << 3;
    const TRANSITION_RUN = 1 << 4;
    const TRANSITION_START = 1 << 5;
    const TRANSITION_END = 1 << 6;
    const TRANSITION_CANCEL = 1 << 7;
  }
}

impl ListenerFlags {
  fn listens(self, kind: AnimationEventType) -> bool {
    let flag = match kind {
      AnimationEventType::AnimationStart => ListenerFlags::ANIMATION_START,
      AnimationEventType::AnimationIteration => ListenerFlags::ANIMATION_ITERATION,
      AnimationEventType::AnimationEnd => ListenerFlags::ANIMATION_END,
      AnimationEventType::AnimationCancel => ListenerFlags::ANIMATION_CANCEL,
      AnimationEventType::TransitionRun => ListenerFlags::TRANSITION_RUN,
      AnimationEventType::TransitionStart => ListenerFlags::TRANSITION_START,
      AnimationEventType::TransitionEnd => ListenerFlags::TRANSITION_END,
      AnimationEventType::TransitionCancel => ListenerFlags::TRANSITION_CANCEL,
    };
    self.contains(flag)
  }
}

/// A queued `animation*` or `transition*` event.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationEvent {
  pub target: ElementId,
  /// Animation name, or transitioned property name.
  pub name: String,
  pub kind: AnimationEventType,
  /// Elapsed time in the effect's own units (seconds, or progress percent
  /// for scroll-driven effects).
  pub elapsed: f64,
}

/// Events pending dispatch by the host.
#[derive(Debug, Default)]
pub struct EventQueue {
  pub listeners: ListenerFlags,
  events: Vec<AnimationEvent>,
}

impl EventQueue {
  pub fn enqueue(&mut self, target: ElementId, name: &str, kind: AnimationEventType, elapsed: f64) {
    if !self.listeners.listens(kind) {
      return;
    }
    self.events.push(AnimationEvent {
      target,
      name: name.to_string(),
      kind,
      elapsed,
    });
  }

  pub fn drain(&mut self) -> Vec<AnimationEvent> {
    std::mem::take(&mut self.events)
  }

  pub fn len(&self) -> usize {
    self.events.len()
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }
}

type Emitted = SmallVec<[(AnimationEventType, f64); 3]>;

fn phase_events(
  previous: TimingPhase,
  current: TimingPhase,
  timing: &Timing,
  transition: bool,
  cancel_elapsed: f64,
) -> Emitted {
  use AnimationEventType::*;
  use TimingPhase::*;
  let mut out = Emitted::new();
  if previous == current {
    return out;
  }
  let start = if transition { TransitionStart } else { AnimationStart };
  let end = if transition { TransitionEnd } else { AnimationEnd };
  let cancel = if transition { TransitionCancel } else { AnimationCancel };

  let entered_from_front = matches!(previous, None | Before) && matches!(current, Active | After);
  let entered_from_back = previous == After && matches!(current, Active | Before);
  if entered_from_front {
    if transition {
      out.push((TransitionRun, interval_start(timing)));
    }
    out.push((start, interval_start(timing)));
  } else if entered_from_back {
    out.push((start, interval_end(timing)));
  }

  if current == After {
    out.push((end, interval_end(timing)));
  } else if current == Before && matches!(previous, Active | After) {
    out.push((end, interval_start(timing)));
  }

  if current == None && !matches!(previous, None | After) {
    out.push((cancel, cancel_elapsed));
  }
  out
}

/// Per-effect event state, compared against each new sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseDelegate {
  pub previous_phase: TimingPhase,
  pub previous_iteration: Option<f64>,
}

impl Default for PhaseDelegate {
  fn default() -> Self {
    Self {
      previous_phase: TimingPhase::None,
      previous_iteration: None,
    }
  }
}

impl PhaseDelegate {
  /// Reports a new animation sample; enqueues start/iteration/end/cancel.
  pub fn on_animation_sample(
    &mut self,
    queue: &mut EventQueue,
    target: ElementId,
    name: &str,
    timing: &Timing,
    phase: TimingPhase,
    current_iteration: Option<f64>,
    cancel_elapsed: f64,
  ) {
    for (kind, elapsed) in phase_events(self.previous_phase, phase, timing, false, cancel_elapsed) {
      queue.enqueue(target, name, kind, elapsed);
    }
    if phase == TimingPhase::Active && self.previous_phase == TimingPhase::Active {
      if let (Some(prev), Some(cur)) = (self.previous_iteration, current_iteration) {
        if prev != cur {
          queue.enqueue(
            target,
            name,
            AnimationEventType::AnimationIteration,
            iteration_elapsed_time(timing, cur, prev),
          );
        }
      }
    }
    self.previous_phase = phase;
    self.previous_iteration = current_iteration;
  }

  /// Reports a new transition sample.
  pub fn on_transition_sample(
    &mut self,
    queue: &mut EventQueue,
    target: ElementId,
    property: &str,
    timing: &Timing,
    phase: TimingPhase,
    cancel_elapsed: f64,
  ) {
    for (kind, elapsed) in phase_events(self.previous_phase, phase, timing, true, cancel_elapsed) {
      queue.enqueue(target, property, kind, elapsed);
    }
    self.previous_phase = phase;
  }
}
