#![allow(dead_code)]

use fastanim::engine::{ElementId, EngineFlags, Host};
use fastanim::keyframes::{KeyframeBlock, KeyframeOffset};
use fastanim::properties::PropertyId;
use fastanim::style::{
  AnimationStyle, ComputedStyle, TransitionProperty, TransitionStyle, TreeScopeId,
};
use fastanim::timing::TimingFunction;
use fastanim::values::PropertyValue;

pub fn host() -> Host {
  Host::new(EngineFlags::default())
}

/// A two-keyframe fade: opacity 0 at 0%, 1 at 100%.
pub fn fade_blocks() -> Vec<KeyframeBlock> {
  vec![
    KeyframeBlock {
      offsets: vec![KeyframeOffset::Percent(0.0)],
      easing: None,
      composite: None,
      properties: vec![(PropertyId::Opacity.into(), PropertyValue::Number(0.0))],
    },
    KeyframeBlock {
      offsets: vec![KeyframeOffset::Percent(1.0)],
      easing: None,
      composite: None,
      properties: vec![(PropertyId::Opacity.into(), PropertyValue::Number(1.0))],
    },
  ]
}

pub fn register_fade(host: &mut Host) {
  host.register_keyframes(TreeScopeId::DOCUMENT, "fade", fade_blocks());
}

pub fn animation_style(name: &str, duration: f64) -> AnimationStyle {
  AnimationStyle {
    names: vec![Some(name.to_string())],
    durations: vec![Some(duration)],
    timing_functions: vec![TimingFunction::Linear],
    ..AnimationStyle::default()
  }
}

pub fn style_with_animation(name: &str, duration: f64) -> ComputedStyle {
  ComputedStyle {
    animations: animation_style(name, duration),
    ..ComputedStyle::default()
  }
}

pub fn transition_style(property: PropertyId, duration: f64) -> TransitionStyle {
  TransitionStyle {
    properties: vec![TransitionProperty::Css(property)],
    durations: vec![duration],
    timing_functions: vec![TimingFunction::Linear],
    ..TransitionStyle::default()
  }
}

/// Base style with `transition: opacity <duration>` and an opacity value.
pub fn opacity_style(opacity: f32, duration: f64) -> ComputedStyle {
  ComputedStyle {
    transitions: Some(transition_style(PropertyId::Opacity, duration)),
    ..ComputedStyle::default()
  }
  .with_property(PropertyId::Opacity, PropertyValue::Number(opacity))
}

pub fn new_element(host: &mut Host) -> ElementId {
  host.create_element(None, TreeScopeId::DOCUMENT)
}
