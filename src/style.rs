//! Computed style input to the update engine.
//!
//! The engine never parses CSS. The embedding style system hands it a
//! [`ComputedStyle`] per element and recalc: the coordinating list-valued
//! `animation-*` / `transition-*` / `*-timeline-*` properties, already
//! computed, plus a flat map of the animatable property values the element
//! currently has. List properties follow the CSS repeat rule: shorter lists
//! wrap around the length of `animation-name` (or `transition-property`).

use rustc_hash::FxHashMap;

use crate::keyframes::CompositeOperation;
use crate::properties::{PropertyHandle, PropertyId};
use crate::timing::{AnimationDirection, FillMode, PlayState, Timing, TimingFunction};
use crate::trigger::TriggerKind;
use crate::values::PropertyValue;

/// Identifies a tree scope (document or shadow root). Scope 0 is the
/// document; larger distances from an element mean outer scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeScopeId(pub u32);

impl TreeScopeId {
  pub const DOCUMENT: TreeScopeId = TreeScopeId(0);
}

/// A `<dashed-ident>` together with the tree scope it was declared in.
/// Names only match within (or from inner scopes looking out at) their
/// declaring scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedName {
  pub name: String,
  pub tree_scope: TreeScopeId,
}

impl ScopedName {
  pub fn document(name: &str) -> Self {
    Self {
      name: name.to_string(),
      tree_scope: TreeScopeId::DOCUMENT,
    }
  }

  pub fn in_scope(name: &str, tree_scope: TreeScopeId) -> Self {
    Self {
      name: name.to_string(),
      tree_scope,
    }
  }
}

/// Scroll axis for scroll and view timelines, resolved against the writing
/// mode at progress-evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimelineAxis {
  Block,
  Inline,
  X,
  Y,
}

/// Which scroll container an anonymous `scroll()` timeline tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scroller {
  Nearest,
  Root,
  SelfElement,
}

/// `view-timeline-inset`, in pixels from each end of the scrollport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimelineInset {
  pub start: f64,
  pub end: f64,
}

/// Computed value of one item of `animation-timeline`.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleTimeline {
  /// The document timeline.
  Auto,
  /// No timeline: the animation holds its start value.
  None,
  Named(ScopedName),
  Scroll { scroller: Scroller, axis: TimelineAxis },
  View { axis: TimelineAxis, inset: TimelineInset },
}

/// Named segments of a view timeline's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedRange {
  Cover,
  Contain,
  Entry,
  EntryCrossing,
  Exit,
  ExitCrossing,
}

impl NamedRange {
  pub fn name(self) -> &'static str {
    match self {
      NamedRange::Cover => "cover",
      NamedRange::Contain => "contain",
      NamedRange::Entry => "entry",
      NamedRange::EntryCrossing => "entry-crossing",
      NamedRange::Exit => "exit",
      NamedRange::ExitCrossing => "exit-crossing",
    }
  }
}

/// A keyframe offset expressed against a named timeline range, e.g.
/// `entry 25%`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineOffset {
  pub range: NamedRange,
  /// Percentage within the named range, 0..=100.
  pub percent: f64,
}

/// One boundary of `animation-range` or a trigger range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RangeOffset {
  /// `normal`: the timeline's own boundary.
  #[default]
  Normal,
  /// Percentage of the full timeline, 0..=100.
  Percent(f64),
  Named(TimelineOffset),
}

/// Display values the engine reacts to. `none` tears all effects down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
  None,
  Contents,
  #[default]
  Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritingMode {
  #[default]
  HorizontalTb,
  VerticalRl,
  VerticalLr,
}

/// The computed `animation-*` lists. All lists are non-empty; `names` sets
/// the item count and the rest wrap around.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationStyle {
  /// `None` entries are `animation-name: none`.
  pub names: Vec<Option<String>>,
  pub timelines: Vec<StyleTimeline>,
  /// `None` is `animation-duration: auto`.
  pub durations: Vec<Option<f64>>,
  pub delays: Vec<f64>,
  pub timing_functions: Vec<TimingFunction>,
  pub iteration_counts: Vec<f64>,
  pub directions: Vec<AnimationDirection>,
  pub fill_modes: Vec<FillMode>,
  pub play_states: Vec<PlayState>,
  pub compositions: Vec<CompositeOperation>,
  pub range_starts: Vec<RangeOffset>,
  pub range_ends: Vec<RangeOffset>,
  pub trigger_types: Vec<Option<TriggerKind>>,
  pub trigger_timelines: Vec<StyleTimeline>,
  pub trigger_range_starts: Vec<RangeOffset>,
  pub trigger_range_ends: Vec<RangeOffset>,
  pub trigger_exit_range_starts: Vec<RangeOffset>,
  pub trigger_exit_range_ends: Vec<RangeOffset>,
}

impl Default for AnimationStyle {
  fn default() -> Self {
    Self {
      names: vec![None],
      timelines: vec![StyleTimeline::Auto],
      durations: vec![Some(0.0)],
      delays: vec![0.0],
      timing_functions: vec![TimingFunction::EASE],
      iteration_counts: vec![1.0],
      directions: vec![AnimationDirection::Normal],
      fill_modes: vec![FillMode::None],
      play_states: vec![PlayState::Running],
      compositions: vec![CompositeOperation::Replace],
      range_starts: vec![RangeOffset::Normal],
      range_ends: vec![RangeOffset::Normal],
      trigger_types: vec![None],
      trigger_timelines: vec![StyleTimeline::Auto],
      trigger_range_starts: vec![RangeOffset::Normal],
      trigger_range_ends: vec![RangeOffset::Normal],
      trigger_exit_range_starts: vec![RangeOffset::Normal],
      trigger_exit_range_ends: vec![RangeOffset::Normal],
    }
  }
}

/// List repeat: index modulo the list's own length.
pub(crate) fn repeated<T: Clone>(list: &[T], index: usize) -> T {
  list[index % list.len()].clone()
}

impl AnimationStyle {
  /// Number of animation items, driven by `animation-name`.
  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.iter().all(|n| n.is_none())
  }

  pub fn name(&self, index: usize) -> Option<&str> {
    self.names[index].as_deref()
  }

  pub fn timeline(&self, index: usize) -> StyleTimeline {
    repeated(&self.timelines, index)
  }

  pub fn play_state(&self, index: usize) -> PlayState {
    repeated(&self.play_states, index)
  }

  pub fn composition(&self, index: usize) -> CompositeOperation {
    repeated(&self.compositions, index)
  }

  pub fn range_start(&self, index: usize) -> RangeOffset {
    repeated(&self.range_starts, index)
  }

  pub fn range_end(&self, index: usize) -> RangeOffset {
    repeated(&self.range_ends, index)
  }

  /// Specified timing for item `index`. The timing function here is the
  /// whole-animation one; the keyframe builder moves it onto keyframes.
  pub fn timing(&self, index: usize) -> Timing {
    Timing {
      start_delay: repeated(&self.delays, index),
      end_delay: 0.0,
      iteration_duration: repeated(&self.durations, index),
      iteration_count: repeated(&self.iteration_counts, index),
      direction: repeated(&self.directions, index),
      fill_mode: repeated(&self.fill_modes, index),
      timing_function: repeated(&self.timing_functions, index),
    }
  }
}

/// Computed value of one item of `transition-property`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionProperty {
  All,
  None,
  Css(PropertyId),
  Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionBehavior {
  #[default]
  Normal,
  AllowDiscrete,
}

/// The computed `transition-*` lists. Absent entirely when the style has no
/// transition declarations at all, which skips the calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionStyle {
  pub properties: Vec<TransitionProperty>,
  pub durations: Vec<f64>,
  pub delays: Vec<f64>,
  pub timing_functions: Vec<TimingFunction>,
  pub behaviors: Vec<TransitionBehavior>,
}

impl Default for TransitionStyle {
  fn default() -> Self {
    Self {
      properties: vec![TransitionProperty::All],
      durations: vec![0.0],
      delays: vec![0.0],
      timing_functions: vec![TimingFunction::EASE],
      behaviors: vec![TransitionBehavior::Normal],
    }
  }
}

impl TransitionStyle {
  pub fn len(&self) -> usize {
    self.properties.len()
  }

  pub fn is_empty(&self) -> bool {
    self.properties.is_empty()
  }

  pub fn duration(&self, index: usize) -> f64 {
    repeated(&self.durations, index)
  }

  pub fn delay(&self, index: usize) -> f64 {
    repeated(&self.delays, index)
  }

  pub fn timing_function(&self, index: usize) -> TimingFunction {
    repeated(&self.timing_functions, index)
  }

  pub fn behavior(&self, index: usize) -> TransitionBehavior {
    repeated(&self.behaviors, index)
  }
}

/// A declared `scroll-timeline` on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTimelineStyle {
  pub name: ScopedName,
  pub axis: TimelineAxis,
}

/// A declared `view-timeline` on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTimelineStyle {
  pub name: ScopedName,
  pub axis: TimelineAxis,
  pub inset: TimelineInset,
}

/// Everything the update engine reads off an element's computed style.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComputedStyle {
  pub display: Display,
  pub writing_mode: WritingMode,
  pub animations: AnimationStyle,
  /// `None` when the style declares no transitions; this is distinct from a
  /// default `transition: all 0s` block.
  pub transitions: Option<TransitionStyle>,
  pub scroll_timelines: Vec<ScrollTimelineStyle>,
  pub view_timelines: Vec<ViewTimelineStyle>,
  /// `timeline-scope` names hoisted onto this element as deferred timelines.
  pub timeline_scope: Vec<ScopedName>,
  /// Animatable property values on this style.
  pub properties: FxHashMap<PropertyHandle, PropertyValue>,
}

impl ComputedStyle {
  pub fn property(&self, property: &PropertyHandle) -> Option<&PropertyValue> {
    self.properties.get(property)
  }

  pub fn set_property(&mut self, property: PropertyHandle, value: PropertyValue) {
    self.properties.insert(property, value);
  }

  pub fn with_property(mut self, property: impl Into<PropertyHandle>, value: PropertyValue) -> Self {
    self.properties.insert(property.into(), value);
    self
  }

  /// Whether the coordinating animation lists differ between two styles.
  /// Used to skip the animation calculator when nothing relevant changed.
  pub fn animation_data_equivalent(&self, other: &ComputedStyle) -> bool {
    self.animations == other.animations
  }

  pub fn transition_data_equivalent(&self, other: &ComputedStyle) -> bool {
    self.transitions == other.transitions
  }
}
