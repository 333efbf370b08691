//! Property identity and classification.
//!
//! The engine works on a closed set of longhand property ids plus registered
//! custom properties. Classification answers three questions the calculators
//! ask constantly: is a property allowed to be animated at all, does it have
//! a smooth interpolation by default, and what does `transition-property:
//! all` (or a shorthand) expand to.

use std::fmt;

/// Longhand and shorthand CSS properties known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
  // Animatable longhands.
  Opacity,
  Color,
  BackgroundColor,
  Transform,
  Width,
  Height,
  Left,
  Top,
  MarginTop,
  MarginRight,
  MarginBottom,
  MarginLeft,
  // Discrete-only longhands.
  Display,
  Visibility,
  // Shorthands (expanded before any transition decision).
  Margin,
  // Animation-defining properties; never themselves animated.
  AnimationName,
  AnimationDuration,
  AnimationDelay,
  AnimationTimingFunction,
  AnimationIterationCount,
  AnimationDirection,
  AnimationFillMode,
  AnimationPlayState,
  AnimationComposition,
  AnimationTimeline,
  AnimationRangeStart,
  AnimationRangeEnd,
  AnimationTriggerType,
  AnimationTriggerTimeline,
  AnimationTriggerRangeStart,
  AnimationTriggerRangeEnd,
  AnimationTriggerExitRangeStart,
  AnimationTriggerExitRangeEnd,
  TransitionProperty,
  TransitionDuration,
  TransitionDelay,
  TransitionTimingFunction,
  TransitionBehavior,
  ScrollTimelineName,
  ScrollTimelineAxis,
  ViewTimelineName,
  ViewTimelineAxis,
  ViewTimelineInset,
  TimelineScope,
}

/// Longhands that `transition-property: all` expands to when only smoothly
/// interpolable properties participate.
const TRANSITIONABLE: &[PropertyId] = &[
  PropertyId::Opacity,
  PropertyId::Color,
  PropertyId::BackgroundColor,
  PropertyId::Transform,
  PropertyId::Width,
  PropertyId::Height,
  PropertyId::Left,
  PropertyId::Top,
  PropertyId::MarginTop,
  PropertyId::MarginRight,
  PropertyId::MarginBottom,
  PropertyId::MarginLeft,
];

/// The additional discrete longhands picked up by `all` when
/// `transition-behavior: allow-discrete` is in effect.
const TRANSITIONABLE_DISCRETE: &[PropertyId] = &[PropertyId::Display, PropertyId::Visibility];

const MARGIN_LONGHANDS: &[PropertyId] = &[
  PropertyId::MarginTop,
  PropertyId::MarginRight,
  PropertyId::MarginBottom,
  PropertyId::MarginLeft,
];

impl PropertyId {
  pub fn name(self) -> &'static str {
    match self {
      PropertyId::Opacity => "opacity",
      PropertyId::Color => "color",
      PropertyId::BackgroundColor => "background-color",
      PropertyId::Transform => "transform",
      PropertyId::Width => "width",
      PropertyId::Height => "height",
      PropertyId::Left => "left",
      PropertyId::Top => "top",
      PropertyId::MarginTop => "margin-top",
      PropertyId::MarginRight => "margin-right",
      PropertyId::MarginBottom => "margin-bottom",
      PropertyId::MarginLeft => "margin-left",
      PropertyId::Display => "display",
      PropertyId::Visibility => "visibility",
      PropertyId::Margin => "margin",
      PropertyId::AnimationName => "animation-name",
      PropertyId::AnimationDuration => "animation-duration",
      PropertyId::AnimationDelay => "animation-delay",
      PropertyId::AnimationTimingFunction => "animation-timing-function",
      PropertyId::AnimationIterationCount => "animation-iteration-count",
      PropertyId::AnimationDirection => "animation-direction",
      PropertyId::AnimationFillMode => "animation-fill-mode",
      PropertyId::AnimationPlayState => "animation-play-state",
      PropertyId::AnimationComposition => "animation-composition",
      PropertyId::AnimationTimeline => "animation-timeline",
      PropertyId::AnimationRangeStart => "animation-range-start",
      PropertyId::AnimationRangeEnd => "animation-range-end",
      PropertyId::AnimationTriggerType => "animation-trigger-type",
      PropertyId::AnimationTriggerTimeline => "animation-trigger-timeline",
      PropertyId::AnimationTriggerRangeStart => "animation-trigger-range-start",
      PropertyId::AnimationTriggerRangeEnd => "animation-trigger-range-end",
      PropertyId::AnimationTriggerExitRangeStart => "animation-trigger-exit-range-start",
      PropertyId::AnimationTriggerExitRangeEnd => "animation-trigger-exit-range-end",
      PropertyId::TransitionProperty => "transition-property",
      PropertyId::TransitionDuration => "transition-duration",
      PropertyId::TransitionDelay => "transition-delay",
      PropertyId::TransitionTimingFunction => "transition-timing-function",
      PropertyId::TransitionBehavior => "transition-behavior",
      PropertyId::ScrollTimelineName => "scroll-timeline-name",
      PropertyId::ScrollTimelineAxis => "scroll-timeline-axis",
      PropertyId::ViewTimelineName => "view-timeline-name",
      PropertyId::ViewTimelineAxis => "view-timeline-axis",
      PropertyId::ViewTimelineInset => "view-timeline-inset",
      PropertyId::TimelineScope => "timeline-scope",
    }
  }

  /// Properties that define animations or timelines are never themselves
  /// transitioned or animated; doing so would let an animation rewrite its
  /// own definition mid-flight.
  pub fn is_animation_affecting(self) -> bool {
    matches!(
      self,
      PropertyId::AnimationName
        | PropertyId::AnimationDuration
        | PropertyId::AnimationDelay
        | PropertyId::AnimationTimingFunction
        | PropertyId::AnimationIterationCount
        | PropertyId::AnimationDirection
        | PropertyId::AnimationFillMode
        | PropertyId::AnimationPlayState
        | PropertyId::AnimationComposition
        | PropertyId::AnimationTimeline
        | PropertyId::AnimationRangeStart
        | PropertyId::AnimationRangeEnd
        | PropertyId::AnimationTriggerType
        | PropertyId::AnimationTriggerTimeline
        | PropertyId::AnimationTriggerRangeStart
        | PropertyId::AnimationTriggerRangeEnd
        | PropertyId::AnimationTriggerExitRangeStart
        | PropertyId::AnimationTriggerExitRangeEnd
        | PropertyId::TransitionProperty
        | PropertyId::TransitionDuration
        | PropertyId::TransitionDelay
        | PropertyId::TransitionTimingFunction
        | PropertyId::TransitionBehavior
        | PropertyId::ScrollTimelineName
        | PropertyId::ScrollTimelineAxis
        | PropertyId::ViewTimelineName
        | PropertyId::ViewTimelineAxis
        | PropertyId::ViewTimelineInset
        | PropertyId::TimelineScope
    )
  }

  pub fn is_shorthand(self) -> bool {
    matches!(self, PropertyId::Margin)
  }

  /// The longhands a shorthand expands to; empty for longhands.
  pub fn longhands(self) -> &'static [PropertyId] {
    match self {
      PropertyId::Margin => MARGIN_LONGHANDS,
      _ => &[],
    }
  }

  /// Whether the property has a smooth interpolation by default. Discrete
  /// properties only transition under `transition-behavior: allow-discrete`.
  pub fn is_interpolable(self) -> bool {
    TRANSITIONABLE.contains(&self)
  }

  /// Compositor-eligible properties need their endpoint values snapshotted
  /// when a transition effect model is built.
  pub fn is_compositable(self) -> bool {
    matches!(self, PropertyId::Opacity | PropertyId::Transform)
  }

  /// Expansion of `transition-property: all`.
  pub fn all_transitionable(with_discrete: bool) -> impl Iterator<Item = PropertyId> {
    TRANSITIONABLE.iter().copied().chain(
      with_discrete
        .then_some(TRANSITIONABLE_DISCRETE)
        .unwrap_or(&[])
        .iter()
        .copied(),
    )
  }
}

/// A property reference: a known longhand or a registered custom property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyHandle {
  Css(PropertyId),
  Custom(String),
}

impl PropertyHandle {
  pub fn custom(name: &str) -> Self {
    PropertyHandle::Custom(name.to_string())
  }

  pub fn is_custom(&self) -> bool {
    matches!(self, PropertyHandle::Custom(_))
  }

  pub fn is_animation_affecting(&self) -> bool {
    match self {
      PropertyHandle::Css(id) => id.is_animation_affecting(),
      PropertyHandle::Custom(_) => false,
    }
  }

  pub fn is_compositable(&self) -> bool {
    match self {
      PropertyHandle::Css(id) => id.is_compositable(),
      PropertyHandle::Custom(_) => false,
    }
  }
}

impl fmt::Display for PropertyHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PropertyHandle::Css(id) => f.write_str(id.name()),
      PropertyHandle::Custom(name) => f.write_str(name),
    }
  }
}

impl From<PropertyId> for PropertyHandle {
  fn from(id: PropertyId) -> Self {
    PropertyHandle::Css(id)
  }
}
