//! Effect timing: specified timing data, timing functions and the phase /
//! progress arithmetic shared by animations and transitions.

/// Playback direction for iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationDirection {
  Normal,
  Reverse,
  Alternate,
  AlternateReverse,
}

/// Fill behavior outside the active interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
  None,
  Forwards,
  Backwards,
  Both,
}

/// Declarative play state from `animation-play-state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
  Running,
  Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPosition {
  Start,
  End,
  JumpNone,
  JumpBoth,
}

/// A computed easing function.
#[derive(Debug, Clone, PartialEq)]
pub enum TimingFunction {
  Linear,
  CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
  Steps { count: u32, position: StepPosition },
}

impl TimingFunction {
  pub const EASE: TimingFunction = TimingFunction::CubicBezier {
    x1: 0.25,
    y1: 0.1,
    x2: 0.25,
    y2: 1.0,
  };

  pub fn evaluate(&self, t: f64) -> f64 {
    match self {
      TimingFunction::Linear => t,
      TimingFunction::CubicBezier { x1, y1, x2, y2 } => bezier_evaluate(*x1, *y1, *x2, *y2, t),
      TimingFunction::Steps { count, position } => steps_evaluate(*count, *position, t),
    }
  }
}

fn bezier_x(x1: f64, x2: f64, s: f64) -> f64 {
  // Cubic with endpoints at 0 and 1: 3(1-s)^2 s x1 + 3(1-s) s^2 x2 + s^3.
  let inv = 1.0 - s;
  3.0 * inv * inv * s * x1 + 3.0 * inv * s * s * x2 + s * s * s
}

fn bezier_evaluate(x1: f64, y1: f64, x2: f64, y2: f64, t: f64) -> f64 {
  if t <= 0.0 {
    return 0.0;
  }
  if t >= 1.0 {
    return 1.0;
  }
  // Solve x(s) = t by bisection; precision is plenty for event timing.
  let mut lo = 0.0;
  let mut hi = 1.0;
  let mut s = t;
  for _ in 0..32 {
    let x = bezier_x(x1, x2, s);
    if (x - t).abs() < 1e-7 {
      break;
    }
    if x < t {
      lo = s;
    } else {
      hi = s;
    }
    s = (lo + hi) * 0.5;
  }
  let inv = 1.0 - s;
  3.0 * inv * inv * s * y1 + 3.0 * inv * s * s * y2 + s * s * s
}

fn steps_evaluate(count: u32, position: StepPosition, t: f64) -> f64 {
  let count = count.max(1) as f64;
  let jumps = match position {
    StepPosition::Start | StepPosition::End => count,
    StepPosition::JumpNone => (count - 1.0).max(1.0),
    StepPosition::JumpBoth => count + 1.0,
  };
  let mut step = (t * count).floor();
  if matches!(position, StepPosition::Start | StepPosition::JumpBoth) {
    step += 1.0;
  }
  (step / jumps).clamp(0.0, 1.0)
}

/// Specified timing for one effect, in seconds. For scroll-driven effects the
/// unit is timeline-progress percentage points instead, after normalization
/// by the owning animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
  pub start_delay: f64,
  pub end_delay: f64,
  /// `None` means `auto`: the active interval stretches to the timeline.
  pub iteration_duration: Option<f64>,
  /// May be `f64::INFINITY`.
  pub iteration_count: f64,
  pub direction: AnimationDirection,
  pub fill_mode: FillMode,
  pub timing_function: TimingFunction,
}

impl Default for Timing {
  fn default() -> Self {
    Self {
      start_delay: 0.0,
      end_delay: 0.0,
      iteration_duration: Some(0.0),
      iteration_count: 1.0,
      direction: AnimationDirection::Normal,
      fill_mode: FillMode::None,
      timing_function: TimingFunction::Linear,
    }
  }
}

impl Timing {
  pub fn iteration_duration_or_zero(&self) -> f64 {
    self.iteration_duration.unwrap_or(0.0)
  }

  pub fn active_duration(&self) -> f64 {
    let d = self.iteration_duration_or_zero() * self.iteration_count;
    if d.is_nan() {
      0.0
    } else {
      d
    }
  }

  pub fn end_time(&self) -> f64 {
    (self.start_delay + self.active_duration() + self.end_delay).max(0.0)
  }
}

/// Timing phase of an effect at a given local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingPhase {
  /// No local time: idle or cancelled.
  None,
  Before,
  Active,
  After,
}

/// One evaluation of an effect's timing model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSample {
  pub phase: TimingPhase,
  /// Transformed (eased, directed) progress in [0, 1], when the effect is
  /// producing a value (active, or filling).
  pub progress: Option<f64>,
  pub current_iteration: Option<f64>,
}

impl TimingSample {
  pub const IDLE: TimingSample = TimingSample {
    phase: TimingPhase::None,
    progress: None,
    current_iteration: None,
  };
}

/// Evaluates phase and progress at `local_time`. `None` local time means the
/// effect is idle.
pub fn sample_timing(timing: &Timing, local_time: Option<f64>) -> TimingSample {
  let Some(local) = local_time else {
    return TimingSample::IDLE;
  };
  let active_duration = timing.active_duration();
  let before_boundary = timing.start_delay;
  let after_boundary = timing.start_delay + active_duration;

  let phase = if local < before_boundary {
    TimingPhase::Before
  } else if local < after_boundary || active_duration == 0.0 && local < after_boundary + 1e-12 {
    if active_duration == 0.0 {
      TimingPhase::After
    } else {
      TimingPhase::Active
    }
  } else {
    TimingPhase::After
  };

  let active_time = match phase {
    TimingPhase::Before => match timing.fill_mode {
      FillMode::Backwards | FillMode::Both => Some(0.0),
      _ => None,
    },
    TimingPhase::Active => Some(local - timing.start_delay),
    TimingPhase::After => match timing.fill_mode {
      FillMode::Forwards | FillMode::Both => Some(active_duration),
      _ => None,
    },
    TimingPhase::None => None,
  };

  let Some(active_time) = active_time else {
    return TimingSample {
      phase,
      progress: None,
      current_iteration: None,
    };
  };

  let (iteration, iteration_progress) = iteration_and_progress(timing, active_time);
  let directed = directed_progress(timing.direction, iteration, iteration_progress);
  let transformed = timing.timing_function.evaluate(directed);
  TimingSample {
    phase,
    progress: Some(transformed),
    current_iteration: Some(iteration),
  }
}

/// Active time with a forced `fill: both`, used for cancel-event elapsed
/// times per css-transitions-2.
pub fn active_time_with_fill_both(timing: &Timing, local_time: Option<f64>, phase: TimingPhase) -> Option<f64> {
  let local = local_time?;
  match phase {
    TimingPhase::None => None,
    TimingPhase::Before => Some(0.0),
    TimingPhase::Active => Some(local - timing.start_delay),
    TimingPhase::After => Some(timing.active_duration()),
  }
}

fn iteration_and_progress(timing: &Timing, active_time: f64) -> (f64, f64) {
  let duration = timing.iteration_duration_or_zero();
  if duration == 0.0 {
    let iteration = (timing.iteration_count - 1.0).max(0.0);
    let progress = if active_time >= 0.0 { 1.0 } else { 0.0 };
    return (iteration.floor(), progress);
  }
  let overall = active_time / duration;
  let at_end = (active_time - timing.active_duration()).abs() < 1e-12;
  if at_end && timing.iteration_count > 0.0 && timing.iteration_count.is_finite() {
    return ((timing.iteration_count.ceil() - 1.0).max(0.0), {
      let rem = timing.iteration_count % 1.0;
      if rem == 0.0 {
        1.0
      } else {
        rem
      }
    });
  }
  (overall.floor(), overall.fract())
}

fn directed_progress(direction: AnimationDirection, iteration: f64, progress: f64) -> f64 {
  let forwards = match direction {
    AnimationDirection::Normal => true,
    AnimationDirection::Reverse => false,
    AnimationDirection::Alternate => iteration as u64 % 2 == 0,
    AnimationDirection::AlternateReverse => iteration as u64 % 2 == 1,
  };
  if forwards {
    progress
  } else {
    1.0 - progress
  }
}

/// The start time implied by a start delay: a negative delay starts the
/// effect with non-zero elapsed time.
pub fn start_time_from_delay(start_delay: f64) -> f64 {
  (-start_delay).max(0.0)
}

/// Elapsed time reported on `*start` events fired while entering the active
/// interval from the front.
pub fn interval_start(timing: &Timing) -> f64 {
  (-timing.start_delay).min(timing.active_duration()).max(0.0)
}

/// Elapsed time reported when entering from the back (playing backwards) or
/// finishing.
pub fn interval_end(timing: &Timing) -> f64 {
  (timing.end_time() - timing.start_delay)
    .min(timing.active_duration())
    .max(0.0)
}

/// Elapsed time for an `animationiteration` event: the boundary between the
/// previous and current iteration.
pub fn iteration_elapsed_time(timing: &Timing, current_iteration: f64, previous_iteration: f64) -> f64 {
  let boundary = if previous_iteration > current_iteration {
    current_iteration + 1.0
  } else {
    current_iteration
  };
  timing.iteration_duration_or_zero() * boundary
}
