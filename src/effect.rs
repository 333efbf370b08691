//! Inert effects: a keyframe model plus a frozen timing snapshot, sampled
//! without a live animation. The pending-update machinery uses them to carry
//! "what would this animation produce right now" across the gap between
//! computing a diff and committing it, and the transition calculator uses
//! them to reconstruct before-change style.

use rustc_hash::FxHashMap;

use crate::keyframes::KeyframeEffectModel;
use crate::properties::PropertyHandle;
use crate::style::ComputedStyle;
use crate::timing::{sample_timing, Timing, TimingSample};
use crate::values::PropertyValue;

/// Playback state borrowed from the owning animation (or the absence of
/// one) at snapshot time.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectProxy {
  Animation {
    paused: bool,
    inherited_time: Option<f64>,
    playback_rate: f64,
  },
  Transition {
    inherited_time: Option<f64>,
  },
}

impl EffectProxy {
  pub fn inherited_time(&self) -> Option<f64> {
    match self {
      EffectProxy::Animation { inherited_time, .. } => *inherited_time,
      EffectProxy::Transition { inherited_time } => *inherited_time,
    }
  }

  pub fn playback_rate(&self) -> f64 {
    match self {
      EffectProxy::Animation { playback_rate, .. } => *playback_rate,
      EffectProxy::Transition { .. } => 1.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InertEffect {
  pub model: KeyframeEffectModel,
  pub timing: Timing,
  pub proxy: EffectProxy,
}

impl InertEffect {
  pub fn new(model: KeyframeEffectModel, timing: Timing, proxy: EffectProxy) -> Self {
    Self { model, timing, proxy }
  }

  pub fn timing_sample(&self) -> TimingSample {
    sample_timing(&self.timing, self.proxy.inherited_time())
  }

  /// Samples every property of the model at the proxy's local time.
  pub fn sample(&self, underlying: &ComputedStyle) -> FxHashMap<PropertyHandle, PropertyValue> {
    match self.timing_sample().progress {
      Some(progress) => self.model.sample(progress, underlying),
      None => FxHashMap::default(),
    }
  }

  pub fn sample_property(
    &self,
    property: &PropertyHandle,
    underlying: &ComputedStyle,
  ) -> Option<PropertyValue> {
    let progress = self.timing_sample().progress?;
    self.model.sample_property(property, progress, underlying)
  }
}
