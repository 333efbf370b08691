//! Keyframe models: building an effect model from an `@keyframes` rule and
//! sampling it at a progress value.
//!
//! Building follows the cascade rules for `@keyframes`: a block may list
//! several offsets (each gets a clone of the block's keyframe), blocks are
//! processed in reverse source order so that later blocks win per property,
//! and keyframes with equal offset, easing and composite merge into one.
//! Boundary keyframes are not synthesized here; sampling fills 0% and 100%
//! from the underlying style on demand.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::properties::PropertyHandle;
use crate::style::{ComputedStyle, NamedRange, TimelineOffset, TreeScopeId};
use crate::timing::TimingFunction;
use crate::values::{composite_add, interpolate, interpolate_discrete, PropertyValue};

/// `animation-composition` / per-keyframe `composite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompositeOperation {
  #[default]
  Replace,
  Add,
  Accumulate,
}

/// Where a keyframe sits on its effect's progress axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyframeOffset {
  /// Fraction in 0..=1.
  Percent(f64),
  /// Resolved against a named view-timeline range at sample time.
  Named(TimelineOffset),
}

/// One block of an `@keyframes` rule as delivered by the style system.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeBlock {
  pub offsets: Vec<KeyframeOffset>,
  /// Overrides the animation's timing function for this keyframe.
  pub easing: Option<TimingFunction>,
  /// Overrides `animation-composition` for this keyframe.
  pub composite: Option<CompositeOperation>,
  pub properties: Vec<(PropertyHandle, PropertyValue)>,
}

/// A named `@keyframes` rule. `version` increments whenever the rule's
/// content changes, so calculators can detect stale models cheaply.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframesRule {
  pub name: String,
  pub tree_scope: TreeScopeId,
  pub version: u64,
  pub blocks: Vec<KeyframeBlock>,
}

/// A single merged keyframe.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
  pub offset: KeyframeOffset,
  pub easing: TimingFunction,
  /// `None` falls back to the model's default composite.
  pub composite: Option<CompositeOperation>,
  pub properties: Vec<(PropertyHandle, PropertyValue)>,
}

impl Keyframe {
  pub fn property(&self, property: &PropertyHandle) -> Option<&PropertyValue> {
    self
      .properties
      .iter()
      .find(|(p, _)| p == property)
      .map(|(_, v)| v)
  }
}

/// A built keyframe effect model.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeEffectModel {
  pub keyframes: Vec<Keyframe>,
  pub default_composite: CompositeOperation,
  /// True when any keyframe uses a named-range offset; such models must be
  /// rebuilt whenever their timeline attachment changes.
  pub has_named_range_keyframes: bool,
}

/// Hashable identity of an offset, for per-offset property capture.
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
enum OffsetKey {
  Percent(u64),
  Named(NamedRange, u64),
}

fn offset_key(offset: &KeyframeOffset) -> OffsetKey {
  match offset {
    KeyframeOffset::Percent(p) => OffsetKey::Percent(p.to_bits()),
    KeyframeOffset::Named(t) => OffsetKey::Named(t.range, t.percent.to_bits()),
  }
}

/// Builds the effect model for one animation from its `@keyframes` rule.
///
/// `default_easing` is the animation's `animation-timing-function`; it
/// becomes the easing of keyframes that do not declare their own, and the
/// caller resets the effect-level timing function to linear afterwards.
pub fn build_keyframe_model(
  rule: &KeyframesRule,
  default_easing: &TimingFunction,
  default_composite: CompositeOperation,
) -> KeyframeEffectModel {
  // Each keyframe carries the index of its earliest contributing block, so
  // keyframes sharing an offset sort in source order afterwards.
  let mut keyframes: Vec<(Keyframe, usize)> = Vec::new();
  // (offset, easing index-by-value, composite) -> position in `keyframes`.
  let mut merge_index: FxHashMap<OffsetKey, Vec<usize>> = FxHashMap::default();
  // Properties already captured at each offset. Later source blocks run
  // first (reverse iteration) and win.
  let mut captured: FxHashMap<OffsetKey, FxHashSet<PropertyHandle>> = FxHashMap::default();
  let mut has_named_range_keyframes = false;

  for (source, block) in rule.blocks.iter().enumerate().rev() {
    let easing = block.easing.clone().unwrap_or_else(|| default_easing.clone());
    for offset in &block.offsets {
      if matches!(offset, KeyframeOffset::Named(_)) {
        has_named_range_keyframes = true;
      }
      let key = offset_key(offset);
      let captured_here = captured.entry(key).or_default();
      let mut properties = Vec::new();
      for (property, value) in &block.properties {
        if property.is_animation_affecting() {
          continue;
        }
        if !captured_here.insert(property.clone()) {
          continue;
        }
        properties.push((property.clone(), value.clone()));
      }

      let slot = merge_index.entry(key).or_default();
      let existing = slot.iter().copied().find(|&i| {
        keyframes[i].0.easing == easing && keyframes[i].0.composite == block.composite
      });
      match existing {
        Some(i) => {
          keyframes[i].0.properties.extend(properties);
          // Reverse iteration, so the merged keyframe ends up placed where
          // its earliest block was.
          keyframes[i].1 = source;
        }
        None => {
          slot.push(keyframes.len());
          keyframes.push((
            Keyframe {
              offset: *offset,
              easing: easing.clone(),
              composite: block.composite,
              properties,
            },
            source,
          ));
        }
      }
    }
  }

  // Percent keyframes in offset order, named-range keyframes after them;
  // equal offsets keep source order.
  keyframes.sort_by(|a, b| {
    let rank = |k: &Keyframe| match k.offset {
      KeyframeOffset::Percent(p) => (0, p),
      KeyframeOffset::Named(_) => (1, 0.0),
    };
    let (ra, pa) = rank(&a.0);
    let (rb, pb) = rank(&b.0);
    ra.cmp(&rb)
      .then(pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal))
      .then(a.1.cmp(&b.1))
  });

  KeyframeEffectModel {
    keyframes: keyframes.into_iter().map(|(k, _)| k).collect(),
    default_composite,
    has_named_range_keyframes,
  }
}

/// Builds the two-keyframe model a transition runs on.
pub fn transition_model(property: PropertyHandle, from: PropertyValue, to: PropertyValue) -> KeyframeEffectModel {
  KeyframeEffectModel {
    keyframes: vec![
      Keyframe {
        offset: KeyframeOffset::Percent(0.0),
        easing: TimingFunction::Linear,
        composite: None,
        properties: vec![(property.clone(), from)],
      },
      Keyframe {
        offset: KeyframeOffset::Percent(1.0),
        easing: TimingFunction::Linear,
        composite: None,
        properties: vec![(property, to)],
      },
    ],
    default_composite: CompositeOperation::Replace,
    has_named_range_keyframes: false,
  }
}

struct PropertyKeyframe<'a> {
  offset: f64,
  easing: &'a TimingFunction,
  composite: CompositeOperation,
  value: &'a PropertyValue,
}

impl KeyframeEffectModel {
  /// Every property any percent keyframe mentions.
  pub fn properties(&self) -> FxHashSet<PropertyHandle> {
    let mut out = FxHashSet::default();
    for keyframe in &self.keyframes {
      if matches!(keyframe.offset, KeyframeOffset::Named(_)) {
        continue;
      }
      for (property, _) in &keyframe.properties {
        out.insert(property.clone());
      }
    }
    out
  }

  /// Whether the model animates `property`.
  pub fn affects(&self, property: &PropertyHandle) -> bool {
    self
      .keyframes
      .iter()
      .any(|k| k.property(property).is_some())
  }

  /// Samples every property at `progress`, filling missing 0% and 100%
  /// keyframes from `underlying`. Keyframes with unresolved named-range
  /// offsets do not participate.
  pub fn sample(
    &self,
    progress: f64,
    underlying: &ComputedStyle,
  ) -> FxHashMap<PropertyHandle, PropertyValue> {
    let mut out = FxHashMap::default();
    for property in self.properties() {
      if let Some(value) = self.sample_property(&property, progress, underlying) {
        out.insert(property, value);
      }
    }
    out
  }

  /// Samples one property at `progress`.
  pub fn sample_property(
    &self,
    property: &PropertyHandle,
    progress: f64,
    underlying: &ComputedStyle,
  ) -> Option<PropertyValue> {
    let underlying_value = underlying.property(property);
    let mut frames: Vec<PropertyKeyframe> = Vec::new();
    for keyframe in &self.keyframes {
      let KeyframeOffset::Percent(offset) = keyframe.offset else {
        continue;
      };
      if let Some(value) = keyframe.property(property) {
        frames.push(PropertyKeyframe {
          offset,
          easing: &keyframe.easing,
          composite: keyframe.composite.unwrap_or(self.default_composite),
          value,
        });
      }
    }
    if frames.is_empty() {
      return None;
    }

    let linear = TimingFunction::Linear;
    if frames[0].offset > 0.0 {
      if let Some(value) = underlying_value {
        frames.insert(
          0,
          PropertyKeyframe {
            offset: 0.0,
            easing: &linear,
            composite: CompositeOperation::Replace,
            value,
          },
        );
      }
    }
    if frames[frames.len() - 1].offset < 1.0 {
      if let Some(value) = underlying_value {
        frames.push(PropertyKeyframe {
          offset: 1.0,
          easing: &linear,
          composite: CompositeOperation::Replace,
          value,
        });
      }
    }

    let resolve = |frame: &PropertyKeyframe| -> PropertyValue {
      match frame.composite {
        CompositeOperation::Replace => frame.value.clone(),
        CompositeOperation::Add | CompositeOperation::Accumulate => match underlying_value {
          Some(under) => composite_add(under, frame.value),
          None => frame.value.clone(),
        },
      }
    };

    if progress <= frames[0].offset {
      return Some(resolve(&frames[0]));
    }
    let last = frames.len() - 1;
    if progress >= frames[last].offset {
      return Some(resolve(&frames[last]));
    }
    let mut i = 0;
    while i + 1 < frames.len() && frames[i + 1].offset <= progress {
      i += 1;
    }
    let (a, b) = (&frames[i], &frames[i + 1]);
    let span = b.offset - a.offset;
    let local = if span > 0.0 { (progress - a.offset) / span } else { 1.0 };
    let eased = a.easing.evaluate(local);
    let from = resolve(a);
    let to = resolve(b);
    Some(match interpolate(&from, &to, eased as f32) {
      Some(value) => value,
      None => interpolate_discrete(&from, &to, eased as f32),
    })
  }
}
