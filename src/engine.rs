//! The update engine host.
//!
//! [`Host`] owns the element records, the animation and timeline arenas, the
//! `@keyframes` registry and the event queue. A style recalc drives it in
//! two steps: [`Host::calculate_update`] diffs an element's new computed
//! style against its running animations and stores a pending
//! [`AnimationUpdate`]; [`Host::maybe_apply_pending_update`] commits that
//! diff transactionally. Nothing observable changes between the two calls,
//! so recomputing the same style twice produces the same (empty) follow-up
//! diff.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::animation::{Animation, AnimationArena, AnimationId, AnimationKind};
use crate::effect::{EffectProxy, InertEffect};
use crate::error::{Error, Result};
use crate::events::EventQueue;
use crate::keyframes::{build_keyframe_model, transition_model, KeyframeBlock, KeyframeEffectModel, KeyframesRule};
use crate::properties::{PropertyHandle, PropertyId};
use crate::style::{
  repeated, AnimationStyle, ComputedStyle, Display, RangeOffset, ScopedName, Scroller, StyleTimeline,
  TransitionProperty, TreeScopeId,
};
use crate::timeline::{
  scroll_timeline_progress, timeline_matches, view_timeline_progress, AxisScrollState, DeferredAttachments,
  ScrollReference, ScrollTimelineDef, Timeline, TimelineArena, TimelineId, TimelineKind, ViewSubject,
  ViewTimelineDef,
};
use crate::timing::{
  active_time_with_fill_both, sample_timing, start_time_from_delay, PlayState, Timing, TimingFunction,
  TimingPhase,
};
use crate::trigger::{AnimationTrigger, TriggerKind};
use crate::update::{AnimationUpdate, NewCssAnimation, NewTransition, UpdatedCssAnimation};
use crate::values::PropertyValue;

/// Handle to an element registered with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);

/// Behavior switches injected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFlags {
  /// Restrict named timeline lookup to the declaring tree scope and the
  /// document scope.
  pub tree_scoped_timelines: bool,
  /// Enable `animation-trigger-*` resolution.
  pub animation_triggers: bool,
}

impl Default for EngineFlags {
  fn default() -> Self {
    Self {
      tree_scoped_timelines: true,
      animation_triggers: true,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
  UpdatesCalculated,
  UpdatesApplied,
  AnimationsStarted,
  AnimationsCancelled,
  TransitionsStarted,
  TransitionsCancelled,
}

/// Receives engine counters; inject one to forward them elsewhere.
pub trait MetricsSink {
  fn count(&mut self, metric: Metric, delta: u64);
}

/// Built-in counter set; always maintained by the host.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
  pub updates_calculated: u64,
  pub updates_applied: u64,
  pub animations_started: u64,
  pub animations_cancelled: u64,
  pub transitions_started: u64,
  pub transitions_cancelled: u64,
}

impl MetricsSink for Metrics {
  fn count(&mut self, metric: Metric, delta: u64) {
    let slot = match metric {
      Metric::UpdatesCalculated => &mut self.updates_calculated,
      Metric::UpdatesApplied => &mut self.updates_applied,
      Metric::AnimationsStarted => &mut self.animations_started,
      Metric::AnimationsCancelled => &mut self.animations_cancelled,
      Metric::TransitionsStarted => &mut self.transitions_started,
      Metric::TransitionsCancelled => &mut self.transitions_cancelled,
    };
    *slot += delta;
  }
}

/// A CSS animation owned by an element, as matched across recalcs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningAnimation {
  pub animation: AnimationId,
  pub name: String,
  pub name_index: usize,
  /// Timing as written in style, timing function included.
  pub specified_timing: Timing,
  pub rule_version: u64,
}

/// A transition owned by an element. At most one per property; a finished
/// transition is retained so that re-setting the same target stays moot.
#[derive(Debug, Clone, PartialEq)]
pub struct RunningTransition {
  pub animation: AnimationId,
  pub from: PropertyValue,
  pub to: PropertyValue,
  pub reversing_adjusted_start: PropertyValue,
  pub reversing_shortening_factor: f64,
  pub finished: bool,
}

/// Per-element animation state.
#[derive(Debug, Default)]
pub struct CssAnimations {
  pub running_animations: Vec<RunningAnimation>,
  pub transitions: FxHashMap<PropertyHandle, RunningTransition>,
  pub timeline_data: crate::timeline::TimelineData,
  pub pending_update: AnimationUpdate,
  /// Animation interpolations from the previous recalc; transitions must
  /// not start on properties these cover.
  pub previous_active_interpolations_for_animations: FxHashMap<PropertyHandle, PropertyValue>,
}

#[derive(Debug)]
pub struct ElementNode {
  pub parent: Option<ElementId>,
  pub tree_scope: TreeScopeId,
  pub style: Option<ComputedStyle>,
  pub css: CssAnimations,
}

/// Geometry last reported for a scroll or view timeline, kept so named
/// ranges and triggers can resolve without re-asking layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollSnapshot {
  pub state: AxisScrollState,
  pub subject: Option<ViewSubject>,
  pub inset: crate::style::TimelineInset,
}

pub struct Host {
  elements: FxHashMap<u32, ElementNode>,
  next_element: u32,
  pub animations: AnimationArena,
  pub timelines: TimelineArena,
  pub document_timeline: TimelineId,
  deferred_attachments: FxHashMap<TimelineId, DeferredAttachments>,
  scroll_snapshots: FxHashMap<TimelineId, ScrollSnapshot>,
  keyframes: FxHashMap<(TreeScopeId, String), KeyframesRule>,
  transition_generation: u64,
  pub events: EventQueue,
  pub flags: EngineFlags,
  pub metrics: Metrics,
  sink: Option<Box<dyn MetricsSink>>,
}

impl Host {
  pub fn new(flags: EngineFlags) -> Self {
    let mut timelines = TimelineArena::default();
    let document_timeline = timelines.insert(Timeline {
      kind: TimelineKind::Document,
      current_time: Some(0.0),
    });
    Self {
      elements: FxHashMap::default(),
      next_element: 0,
      animations: AnimationArena::default(),
      timelines,
      document_timeline,
      deferred_attachments: FxHashMap::default(),
      scroll_snapshots: FxHashMap::default(),
      keyframes: FxHashMap::default(),
      transition_generation: 0,
      events: EventQueue::default(),
      flags,
      metrics: Metrics::default(),
      sink: None,
    }
  }

  pub fn with_sink(mut self, sink: Box<dyn MetricsSink>) -> Self {
    self.sink = Some(sink);
    self
  }

  fn record(&mut self, metric: Metric) {
    self.metrics.count(metric, 1);
    if let Some(sink) = &mut self.sink {
      sink.count(metric, 1);
    }
  }

  pub fn create_element(&mut self, parent: Option<ElementId>, tree_scope: TreeScopeId) -> ElementId {
    let id = ElementId(self.next_element);
    self.next_element += 1;
    self.elements.insert(
      id.0,
      ElementNode {
        parent,
        tree_scope,
        style: None,
        css: CssAnimations::default(),
      },
    );
    id
  }

  pub fn element(&self, id: ElementId) -> Result<&ElementNode> {
    self.elements.get(&id.0).ok_or(Error::UnknownElement(id.0))
  }

  fn element_mut(&mut self, id: ElementId) -> Result<&mut ElementNode> {
    self.elements.get_mut(&id.0).ok_or(Error::UnknownElement(id.0))
  }

  /// Registers (or replaces) an `@keyframes` rule. Returns the rule's
  /// version, which only advances when the content actually changed.
  pub fn register_keyframes(&mut self, tree_scope: TreeScopeId, name: &str, blocks: Vec<KeyframeBlock>) -> u64 {
    let key = (tree_scope, name.to_string());
    let version = match self.keyframes.get(&key) {
      Some(existing) if existing.blocks == blocks => existing.version,
      Some(existing) => existing.version + 1,
      None => 1,
    };
    self.keyframes.insert(
      key,
      KeyframesRule {
        name: name.to_string(),
        tree_scope,
        version,
        blocks,
      },
    );
    version
  }

  fn keyframes_rule(&self, tree_scope: TreeScopeId, name: &str) -> Option<&KeyframesRule> {
    self
      .keyframes
      .get(&(tree_scope, name.to_string()))
      .or_else(|| self.keyframes.get(&(TreeScopeId::DOCUMENT, name.to_string())))
  }

  pub fn timeline_time(&self, timeline: Option<TimelineId>) -> Option<f64> {
    timeline.and_then(|id| self.timelines.get(id)).and_then(|t| t.current_time)
  }

  fn next_transition_generation(&mut self) -> u64 {
    self.transition_generation += 1;
    self.transition_generation
  }

  // ---------------------------------------------------------------------
  // Timeline updates
  // ---------------------------------------------------------------------

  fn scope_distance(&self, wanted: TreeScopeId, declared: TreeScopeId) -> Option<u32> {
    if !self.flags.tree_scoped_timelines {
      return Some(0);
    }
    if wanted == declared {
      Some(0)
    } else if declared == TreeScopeId::DOCUMENT {
      Some(1)
    } else {
      None
    }
  }

  fn calculate_changed_scroll_timelines(
    &mut self,
    element: ElementId,
    new_style: &ComputedStyle,
  ) -> Option<FxHashMap<ScopedName, Option<TimelineId>>> {
    let existing = self.element(element).ok()?.css.timeline_data.scroll_timelines.clone();
    // Assume every existing timeline is going away, then erase the entries
    // the new style keeps alive so surviving timelines stay referentially
    // stable.
    let mut changed: FxHashMap<ScopedName, Option<TimelineId>> =
      existing.keys().map(|k| (k.clone(), None)).collect();
    let declared = new_style.scroll_timelines.clone();
    for decl in declared {
      if let Some(&tid) = existing.get(&decl.name) {
        let matches = matches!(
          self.timelines.get(tid).map(|t| &t.kind),
          Some(TimelineKind::Scroll(def)) if def.axis == decl.axis
        );
        if matches {
          changed.remove(&decl.name);
          continue;
        }
      }
      let tid = self.timelines.insert(Timeline::new(TimelineKind::Scroll(ScrollTimelineDef {
        reference: ScrollReference::Element(element),
        axis: decl.axis,
      })));
      changed.insert(decl.name.clone(), Some(tid));
    }
    if changed.is_empty() {
      None
    } else {
      Some(changed)
    }
  }

  fn calculate_changed_view_timelines(
    &mut self,
    element: ElementId,
    new_style: &ComputedStyle,
  ) -> Option<FxHashMap<ScopedName, Option<TimelineId>>> {
    let existing = self.element(element).ok()?.css.timeline_data.view_timelines.clone();
    let mut changed: FxHashMap<ScopedName, Option<TimelineId>> =
      existing.keys().map(|k| (k.clone(), None)).collect();
    let declared = new_style.view_timelines.clone();
    for decl in declared {
      if let Some(&tid) = existing.get(&decl.name) {
        let matches = matches!(
          self.timelines.get(tid).map(|t| &t.kind),
          Some(TimelineKind::View(def)) if def.axis == decl.axis && def.inset == decl.inset
        );
        if matches {
          changed.remove(&decl.name);
          continue;
        }
      }
      let tid = self.timelines.insert(Timeline::new(TimelineKind::View(ViewTimelineDef {
        subject: element,
        axis: decl.axis,
        inset: decl.inset,
      })));
      changed.insert(decl.name.clone(), Some(tid));
    }
    if changed.is_empty() {
      None
    } else {
      Some(changed)
    }
  }

  fn calculate_changed_deferred_timelines(
    &mut self,
    element: ElementId,
    new_style: &ComputedStyle,
  ) -> Option<FxHashMap<ScopedName, Option<TimelineId>>> {
    let existing = self.element(element).ok()?.css.timeline_data.deferred_timelines.clone();
    let mut changed: FxHashMap<ScopedName, Option<TimelineId>> =
      existing.keys().map(|k| (k.clone(), None)).collect();
    for name in new_style.timeline_scope.clone() {
      if existing.contains_key(&name) {
        changed.remove(&name);
        continue;
      }
      let tid = self.timelines.insert(Timeline::new(TimelineKind::Deferred));
      changed.insert(name, Some(tid));
    }
    if changed.is_empty() {
      None
    } else {
      Some(changed)
    }
  }

  fn overlaid(
    map: &FxHashMap<ScopedName, TimelineId>,
    changes: &Option<FxHashMap<ScopedName, Option<TimelineId>>>,
  ) -> FxHashMap<ScopedName, TimelineId> {
    let mut out = map.clone();
    if let Some(changes) = changes {
      for (name, change) in changes {
        match change {
          Some(id) => {
            out.insert(name.clone(), *id);
          }
          None => {
            out.remove(name);
          }
        }
      }
    }
    out
  }

  /// Resolves a named timeline against the inclusive ancestor chain,
  /// observing pending updates so that mid-recalc resolution already sees
  /// this recalc's timelines. Nearest element wins; within one element,
  /// scroll timelines shadow view timelines shadow deferred ones, and a
  /// closer tree scope wins among same-kind candidates.
  fn find_timeline_for_name(
    &self,
    element: ElementId,
    wanted: &ScopedName,
    own_update: &AnimationUpdate,
  ) -> Option<TimelineId> {
    let mut node = Some(element);
    while let Some(id) = node {
      let el = self.elements.get(&id.0)?;
      let update = if id == element { own_update } else { &el.css.pending_update };
      let maps = [
        Self::overlaid(&el.css.timeline_data.scroll_timelines, &update.changed_scroll_timelines),
        Self::overlaid(&el.css.timeline_data.view_timelines, &update.changed_view_timelines),
        Self::overlaid(&el.css.timeline_data.deferred_timelines, &update.changed_deferred_timelines),
      ];
      let mut best: Option<(u32, usize, TimelineId)> = None;
      for (rank, map) in maps.iter().enumerate() {
        for (name, tid) in map {
          if name.name != wanted.name {
            continue;
          }
          let Some(distance) = self.scope_distance(wanted.tree_scope, name.tree_scope) else {
            continue;
          };
          let candidate = (distance, rank, *tid);
          if best.map(|b| (candidate.0, candidate.1) < (b.0, b.1)).unwrap_or(true) {
            best = Some(candidate);
          }
        }
      }
      if let Some((_, _, tid)) = best {
        return Some(tid);
      }
      node = el.parent;
    }
    None
  }

  fn find_ancestor_deferred_timeline(
    &self,
    element: ElementId,
    wanted: &ScopedName,
    own_update: &AnimationUpdate,
  ) -> Option<TimelineId> {
    let mut node = Some(element);
    while let Some(id) = node {
      let el = self.elements.get(&id.0)?;
      let update = if id == element { own_update } else { &el.css.pending_update };
      let deferred = Self::overlaid(&el.css.timeline_data.deferred_timelines, &update.changed_deferred_timelines);
      let mut best: Option<(u32, TimelineId)> = None;
      for (name, tid) in &deferred {
        if name.name != wanted.name {
          continue;
        }
        if let Some(distance) = self.scope_distance(wanted.tree_scope, name.tree_scope) {
          if best.map(|b| distance < b.0).unwrap_or(true) {
            best = Some((distance, *tid));
          }
        }
      }
      if let Some((_, tid)) = best {
        return Some(tid);
      }
      node = el.parent;
    }
    None
  }

  fn calculate_changed_timeline_attachments(
    &self,
    element: ElementId,
    update: &AnimationUpdate,
  ) -> FxHashMap<TimelineId, Option<TimelineId>> {
    let Ok(el) = self.element(element) else {
      return FxHashMap::default();
    };
    let mut named = Self::overlaid(&el.css.timeline_data.scroll_timelines, &update.changed_scroll_timelines);
    named.extend(Self::overlaid(&el.css.timeline_data.view_timelines, &update.changed_view_timelines));

    let mut desired: FxHashMap<TimelineId, TimelineId> = FxHashMap::default();
    for (name, tid) in &named {
      if let Some(deferred) = self.find_ancestor_deferred_timeline(element, name, update) {
        desired.insert(*tid, deferred);
      }
    }
    let existing = &el.css.timeline_data.timeline_attachments;
    let mut changed = FxHashMap::default();
    for (attaching, deferred) in existing {
      if desired.get(attaching) != Some(deferred) {
        changed.insert(*attaching, desired.get(attaching).copied());
      }
    }
    for (attaching, deferred) in &desired {
      if !existing.contains_key(attaching) {
        changed.insert(*attaching, Some(*deferred));
      }
    }
    changed
  }

  /// Resolves one item of `animation-timeline`, creating anonymous
  /// timelines as needed and reusing a matching existing one.
  fn compute_timeline(
    &mut self,
    element: ElementId,
    style_timeline: &StyleTimeline,
    own_update: &AnimationUpdate,
    existing: Option<TimelineId>,
  ) -> Option<TimelineId> {
    match style_timeline {
      StyleTimeline::Auto => Some(self.document_timeline),
      StyleTimeline::None => None,
      StyleTimeline::Named(name) => self.find_timeline_for_name(element, name, own_update),
      StyleTimeline::Scroll { scroller, axis } => {
        if let Some(tid) = existing {
          if let Some(t) = self.timelines.get(tid) {
            if timeline_matches(t, style_timeline, element) {
              return Some(tid);
            }
          }
        }
        let reference = match scroller {
          Scroller::Root => ScrollReference::Root,
          Scroller::Nearest => ScrollReference::Nearest(element),
          Scroller::SelfElement => ScrollReference::Element(element),
        };
        Some(self.timelines.insert(Timeline::new(TimelineKind::Scroll(ScrollTimelineDef {
          reference,
          axis: *axis,
        }))))
      }
      StyleTimeline::View { axis, inset } => {
        if let Some(tid) = existing {
          if let Some(t) = self.timelines.get(tid) {
            if timeline_matches(t, style_timeline, element) {
              return Some(tid);
            }
          }
        }
        Some(self.timelines.insert(Timeline::new(TimelineKind::View(ViewTimelineDef {
          subject: element,
          axis: *axis,
          inset: *inset,
        }))))
      }
    }
  }

  fn compute_trigger(
    &mut self,
    element: ElementId,
    index: usize,
    animations: &AnimationStyle,
    own_update: &AnimationUpdate,
  ) -> Option<AnimationTrigger> {
    if !self.flags.animation_triggers {
      return None;
    }
    let kind: TriggerKind = repeated(&animations.trigger_types, index)?;
    let style_timeline = repeated(&animations.trigger_timelines, index);
    // Triggers fall back to the document timeline rather than going
    // timeline-less.
    let timeline = self
      .compute_timeline(element, &style_timeline, own_update, None)
      .or(Some(self.document_timeline));
    Some(AnimationTrigger {
      kind,
      timeline,
      range_start: repeated(&animations.trigger_range_starts, index),
      range_end: repeated(&animations.trigger_range_ends, index),
      exit_range_start: repeated(&animations.trigger_exit_range_starts, index),
      exit_range_end: repeated(&animations.trigger_exit_range_ends, index),
    })
  }

  // ---------------------------------------------------------------------
  // Animation update
  // ---------------------------------------------------------------------

  fn calculate_animation_update(
    &mut self,
    element: ElementId,
    new_style: &ComputedStyle,
    update: &mut AnimationUpdate,
  ) {
    let (running, tree_scope) = {
      let el = self.elements.get(&element.0).unwrap();
      (el.css.running_animations.clone(), el.tree_scope)
    };
    let mut cancel = vec![true; running.len()];
    // (model, timing, local time) per effect that survives this recalc, in
    // item order, for the active-interpolation pass.
    let mut sampled: Vec<(KeyframeEffectModel, Timing, Option<f64>)> = Vec::new();

    let animations = &new_style.animations;
    if new_style.display != Display::None {
      let mut occurrences: FxHashMap<String, usize> = FxHashMap::default();
      for i in 0..animations.len() {
        let Some(name) = animations.name(i) else {
          continue;
        };
        let name = name.to_string();
        let slot = occurrences.entry(name.clone()).or_insert(0);
        let name_index = *slot;
        *slot += 1;

        let Some(rule) = self.keyframes_rule(tree_scope, &name).cloned() else {
          continue;
        };
        // Snapshot the timing as written before the timing function moves
        // onto the keyframes; matching compares against this snapshot, so a
        // change to animation-timing-function alone still misses the fast
        // path.
        let specified_timing = animations.timing(i);
        let mut timing = specified_timing.clone();
        let default_easing = timing.timing_function.clone();
        // The item-level timing function lives on the keyframes; the effect
        // itself runs linear.
        timing.timing_function = TimingFunction::Linear;
        let model = build_keyframe_model(&rule, &default_easing, animations.composition(i));
        let play_state = animations.play_state(i);
        let range_start = animations.range_start(i);
        let range_end = animations.range_end(i);
        let trigger = self.compute_trigger(element, i, animations, update);

        let matched = running
          .iter()
          .enumerate()
          .find(|(j, r)| cancel[*j] && r.name == name && r.name_index == name_index);
        match matched {
          Some((j, r)) => {
            cancel[j] = false;
            let existing = self.animations.get(r.animation).unwrap();
            let existing_timeline = existing.timeline;
            let ignore_timeline = existing.ignore_css_timeline;
            let ignore_range = existing.ignore_css_range;
            let ignore_play_state = existing.ignore_css_play_state;
            let existing_paused = existing.paused;
            let existing_range = (existing.range_start, existing.range_end);
            let existing_trigger = existing.trigger.clone();
            let existing_model = existing.model.clone();
            let existing_timing = existing.specified_timing.clone();
            let local = existing.local_time(self.timeline_time(existing_timeline));

            let timeline = if ignore_timeline {
              existing_timeline
            } else {
              self.compute_timeline(element, &animations.timeline(i), update, existing_timeline)
            };
            let timeline_changed = !ignore_timeline && timeline != existing_timeline;
            let range_changed =
              !ignore_range && (range_start != existing_range.0 || range_end != existing_range.1);
            let trigger_changed = trigger != existing_trigger;

            if !ignore_play_state && (play_state == PlayState::Paused) != existing_paused {
              update.animations_with_pause_toggled.push(j);
            }

            let idempotent = r.rule_version == rule.version
              && r.specified_timing == specified_timing
              && !timeline_changed
              && !range_changed
              && !trigger_changed;
            if idempotent {
              sampled.push((existing_model, existing_timing, local));
            } else {
              trace!(name = %name, index = i, "updating css animation");
              sampled.push((model.clone(), timing.clone(), local));
              update.updated_animations.push(UpdatedCssAnimation {
                animation: r.animation,
                model,
                timing,
                specified_timing,
                rule_version: rule.version,
                timeline,
                timeline_changed,
                range_start,
                range_end,
                range_changed,
                trigger,
                trigger_changed,
              });
            }
          }
          None => {
            trace!(name = %name, index = i, "starting css animation");
            let timeline = self.compute_timeline(element, &animations.timeline(i), update, None);
            sampled.push((model.clone(), timing.clone(), Some(0.0)));
            update.new_animations.push(NewCssAnimation {
              name,
              name_index,
              model,
              timing,
              specified_timing,
              timeline,
              paused_by_style: play_state == PlayState::Paused,
              range_start,
              range_end,
              trigger,
              rule_version: rule.version,
            });
          }
        }
      }
    }

    for (j, flagged) in cancel.iter().enumerate() {
      if *flagged {
        update.cancelled_animation_indices.push(j);
      }
    }

    for (model, timing, local) in &sampled {
      let effect = InertEffect::new(
        model.clone(),
        timing.clone(),
        EffectProxy::Animation {
          paused: false,
          inherited_time: *local,
          playback_rate: 1.0,
        },
      );
      for (property, value) in effect.sample(new_style) {
        update.active_interpolations_for_animations.insert(property, value);
      }
    }
  }

  // ---------------------------------------------------------------------
  // Transition update
  // ---------------------------------------------------------------------

  fn calculate_transition_update(
    &mut self,
    element: ElementId,
    new_style: &ComputedStyle,
    update: &mut AnimationUpdate,
  ) {
    struct TransitionSnapshot {
      property: PropertyHandle,
      model: KeyframeEffectModel,
      timing: Timing,
      local_time: Option<f64>,
      phase: TimingPhase,
      progress: Option<f64>,
      to: PropertyValue,
      reversing_adjusted_start: PropertyValue,
      reversing_shortening_factor: f64,
      generation: u64,
      finished: bool,
    }

    let el = self.elements.get(&element.0).unwrap();
    let old_style = el.style.clone();
    let has_transitions = !el.css.transitions.is_empty();
    if new_style.transitions.is_none() && !has_transitions {
      return;
    }

    let mut snapshots: Vec<TransitionSnapshot> = Vec::new();
    for (property, running) in &el.css.transitions {
      let Some(animation) = self.animations.get(running.animation) else {
        continue;
      };
      let local = animation.local_time(self.timeline_time(animation.timeline));
      let sample = sample_timing(&animation.specified_timing, local);
      snapshots.push(TransitionSnapshot {
        property: property.clone(),
        model: animation.model.clone(),
        timing: animation.specified_timing.clone(),
        local_time: local,
        phase: sample.phase,
        progress: sample.progress,
        to: running.to.clone(),
        reversing_adjusted_start: running.reversing_adjusted_start.clone(),
        reversing_shortening_factor: running.reversing_shortening_factor,
        generation: match &animation.kind {
          AnimationKind::CssTransition { generation, .. } => *generation,
          _ => 0,
        },
        finished: running.finished,
      });
    }
    snapshots.sort_by_key(|s| s.generation);

    // Before-change style: the previous style with running transitions
    // advanced to the current moment, built only if some property needs it.
    let mut before_change: Option<ComputedStyle> = None;
    let mut before_change_value = |property: &PropertyHandle| -> Option<PropertyValue> {
      let old = old_style.as_ref()?;
      let style = before_change.get_or_insert_with(|| {
        let mut style = old.clone();
        for snap in &snapshots {
          if snap.finished {
            continue;
          }
          let effect = InertEffect::new(
            snap.model.clone(),
            snap.timing.clone(),
            EffectProxy::Transition {
              inherited_time: snap.local_time,
            },
          );
          if let Some(value) = effect.sample_property(&snap.property, old) {
            style.set_property(snap.property.clone(), value);
          }
        }
        style
      });
      style.property(property).cloned()
    };

    // Properties the CSS animations machinery owns this recalc or owned
    // last recalc; transitions never fire on them.
    let mut animated: FxHashSet<PropertyHandle> = update
      .active_interpolations_for_animations
      .keys()
      .cloned()
      .collect();
    animated.extend(el.css.previous_active_interpolations_for_animations.keys().cloned());

    // Expand transition-property; a later item owning the same property
    // wins.
    let mut item_for_property: FxHashMap<PropertyHandle, usize> = FxHashMap::default();
    if new_style.display != Display::None {
      if let Some(transitions) = &new_style.transitions {
        for (i, entry) in transitions.properties.iter().enumerate() {
          match entry {
            TransitionProperty::None => {}
            TransitionProperty::All => {
              let discrete =
                transitions.behavior(i) == crate::style::TransitionBehavior::AllowDiscrete;
              for id in PropertyId::all_transitionable(discrete) {
                item_for_property.insert(id.into(), i);
              }
            }
            TransitionProperty::Css(id) => {
              if id.is_shorthand() {
                for longhand in id.longhands() {
                  item_for_property.insert((*longhand).into(), i);
                }
              } else {
                item_for_property.insert((*id).into(), i);
              }
            }
            TransitionProperty::Custom(name) => {
              item_for_property.insert(PropertyHandle::custom(name), i);
            }
          }
        }
      }
    }
    let listed: FxHashSet<PropertyHandle> = item_for_property.keys().cloned().collect();

    if let Some(transitions) = &new_style.transitions {
      for (property, &item) in &item_for_property {
        if property.is_animation_affecting() || animated.contains(property) {
          continue;
        }
        let running = snapshots.iter().find(|s| &s.property == property);
        let Some(to) = new_style.property(property).cloned() else {
          if running.is_some() {
            update.cancel_transition(property.clone());
          }
          continue;
        };
        if let Some(run) = running {
          // Same target: the running (or retained finished) transition
          // already covers this; restarting would visibly snap.
          if run.to == to {
            continue;
          }
        }
        let Some(from) = before_change_value(property) else {
          if running.is_some() {
            update.cancel_transition(property.clone());
          }
          continue;
        };

        let mut reversing_adjusted_start = from.clone();
        let mut shortening = 1.0f64;
        if let Some(run) = running {
          update.cancel_transition(property.clone());
          if !run.finished && run.reversing_adjusted_start == to {
            let progress = run.progress.unwrap_or(0.0);
            shortening =
              (progress * run.reversing_shortening_factor + (1.0 - run.reversing_shortening_factor))
                .clamp(0.0, 1.0);
            reversing_adjusted_start = run.to.clone();
          }
        }

        if from == to {
          continue;
        }
        let discrete_pair = !from.can_interpolate_to(&to);
        if discrete_pair
          && transitions.behavior(item) != crate::style::TransitionBehavior::AllowDiscrete
        {
          continue;
        }

        let duration = transitions.duration(item) * shortening;
        let mut delay = transitions.delay(item);
        if delay < 0.0 {
          delay *= shortening;
        }
        if duration + delay <= 0.0 {
          update.unstart_transition(property);
          continue;
        }

        trace!(property = %property, duration, "starting transition");
        let timing = Timing {
          start_delay: delay,
          end_delay: 0.0,
          iteration_duration: Some(duration),
          iteration_count: 1.0,
          direction: crate::timing::AnimationDirection::Normal,
          fill_mode: crate::timing::FillMode::Both,
          timing_function: transitions.timing_function(item),
        };
        let model = transition_model(property.clone(), from.clone(), to.clone());
        update.start_transition(NewTransition {
          property: property.clone(),
          from,
          to,
          reversing_adjusted_start,
          reversing_shortening_factor: shortening,
          timing,
          model,
        });
      }
    }

    // Retention pass over what's still running.
    for snap in &snapshots {
      let property = &snap.property;
      if update.new_transitions.contains_key(property)
        || update.cancelled_transitions.contains(property)
      {
        continue;
      }
      if animated.contains(property) || !listed.contains(property) {
        update.cancel_transition(property.clone());
        continue;
      }
      if snap.phase == TimingPhase::After && !snap.finished {
        update.finish_transition(property.clone());
      }
    }

    // Active interpolations: continuing transitions at their current
    // progress, then this recalc's new transitions at their start.
    let old_for_sampling = old_style.unwrap_or_default();
    for snap in &snapshots {
      if snap.finished
        || update.cancelled_transitions.contains(&snap.property)
        || update.new_transitions.contains_key(&snap.property)
      {
        continue;
      }
      if let Some(progress) = snap.progress {
        if let Some(value) = snap.model.sample_property(&snap.property, progress, &old_for_sampling) {
          update
            .active_interpolations_for_transitions
            .insert(snap.property.clone(), value);
        }
      }
    }
    let queued: Vec<(PropertyHandle, KeyframeEffectModel, Timing)> = update
      .new_transitions
      .iter()
      .map(|(p, t)| (p.clone(), t.model.clone(), t.timing.clone()))
      .collect();
    for (property, model, timing) in queued {
      let effect = InertEffect::new(
        model,
        timing,
        EffectProxy::Transition {
          inherited_time: Some(0.0),
        },
      );
      if let Some(value) = effect.sample_property(&property, &old_for_sampling) {
        update.active_interpolations_for_transitions.insert(property, value);
      }
    }
  }

  // ---------------------------------------------------------------------
  // Calculate / apply
  // ---------------------------------------------------------------------

  /// Diffs `new_style` against the element's running state. The result is
  /// stored as the element's pending update and returned; live animations
  /// are untouched.
  pub fn calculate_update(&mut self, element: ElementId, new_style: &ComputedStyle) -> Result<&AnimationUpdate> {
    self.element(element)?;
    self.record(Metric::UpdatesCalculated);
    let mut update = AnimationUpdate::default();
    update.changed_scroll_timelines = self.calculate_changed_scroll_timelines(element, new_style);
    update.changed_view_timelines = self.calculate_changed_view_timelines(element, new_style);
    update.changed_deferred_timelines = self.calculate_changed_deferred_timelines(element, new_style);
    update.changed_timeline_attachments = self.calculate_changed_timeline_attachments(element, &update);
    self.calculate_animation_update(element, new_style, &mut update);
    self.calculate_transition_update(element, new_style, &mut update);
    let el = self.elements.get_mut(&element.0).unwrap();
    el.css.pending_update = update;
    Ok(&el.css.pending_update)
  }

  fn cancel_effect(&mut self, id: AnimationId) {
    let Some(animation) = self.animations.get(id) else {
      return;
    };
    let tl_time = self.timeline_time(animation.timeline);
    let animation = self.animations.get_mut(id).unwrap();
    let local = animation.local_time(tl_time);
    let phase = animation.delegate.previous_phase;
    let cancel_elapsed = active_time_with_fill_both(&animation.specified_timing, local, phase).unwrap_or(0.0);
    let target = animation.target;
    let timing = animation.specified_timing.clone();
    animation.cancel();
    match animation.kind.clone() {
      AnimationKind::CssAnimation { name, .. } => {
        animation
          .delegate
          .on_animation_sample(&mut self.events, target, &name, &timing, TimingPhase::None, None, cancel_elapsed);
      }
      AnimationKind::CssTransition { property, .. } => {
        animation.delegate.on_transition_sample(
          &mut self.events,
          target,
          &property.to_string(),
          &timing,
          TimingPhase::None,
          cancel_elapsed,
        );
      }
    }
  }

  fn notify_effect(&mut self, id: AnimationId) {
    let Some(animation) = self.animations.get(id) else {
      return;
    };
    if animation.cancelled {
      return;
    }
    let tl_time = self.timeline_time(animation.timeline);
    let animation = self.animations.get_mut(id).unwrap();
    let local = animation.local_time(tl_time);
    let sample = sample_timing(&animation.specified_timing, local);
    let cancel_elapsed =
      active_time_with_fill_both(&animation.specified_timing, local, sample.phase).unwrap_or(0.0);
    let target = animation.target;
    let timing = animation.specified_timing.clone();
    match animation.kind.clone() {
      AnimationKind::CssAnimation { name, .. } => {
        animation.delegate.on_animation_sample(
          &mut self.events,
          target,
          &name,
          &timing,
          sample.phase,
          sample.current_iteration,
          cancel_elapsed,
        );
      }
      AnimationKind::CssTransition { property, .. } => {
        animation.delegate.on_transition_sample(
          &mut self.events,
          target,
          &property.to_string(),
          &timing,
          sample.phase,
          cancel_elapsed,
        );
      }
    }
  }

  fn apply_timeline_changes(&mut self, element: ElementId, update: &AnimationUpdate) {
    let el = self.elements.get_mut(&element.0).unwrap();
    let data = &mut el.css.timeline_data;
    let mut freed: Vec<TimelineId> = Vec::new();
    for (map, changes) in [
      (&mut data.scroll_timelines, &update.changed_scroll_timelines),
      (&mut data.view_timelines, &update.changed_view_timelines),
      (&mut data.deferred_timelines, &update.changed_deferred_timelines),
    ] {
      if let Some(changes) = changes {
        for (name, change) in changes {
          match change {
            Some(id) => {
              if let Some(old) = map.insert(name.clone(), *id) {
                if old != *id {
                  freed.push(old);
                }
              }
            }
            None => {
              if let Some(old) = map.remove(name) {
                freed.push(old);
              }
            }
          }
        }
      }
    }
    for (attaching, target) in &update.changed_timeline_attachments {
      if let Some(previous) = data.timeline_attachments.remove(attaching) {
        if let Some(atts) = self.deferred_attachments.get_mut(&previous) {
          atts.attached.retain(|t| t != attaching);
        }
      }
      if let Some(deferred) = target {
        data.timeline_attachments.insert(*attaching, *deferred);
        self
          .deferred_attachments
          .entry(*deferred)
          .or_default()
          .attached
          .push(*attaching);
      }
    }
    // A deferred timeline only carries time while exactly one timeline is
    // attached.
    for (attaching, target) in &update.changed_timeline_attachments {
      let _ = attaching;
      if let Some(deferred) = target {
        let time = match self.deferred_attachments.get(deferred).and_then(|a| a.single()) {
          Some(source) => self.timelines.get(source).and_then(|t| t.current_time),
          None => None,
        };
        if let Some(t) = self.timelines.get_mut(*deferred) {
          t.current_time = time;
        }
      }
    }
    // Replaced and removed declarations give their timelines back to the
    // arena; a stale id held by a not-yet-updated animation resolves to an
    // inactive timeline until its next recalc rebinds it.
    for id in freed {
      self.timelines.remove(id);
      self.scroll_snapshots.remove(&id);
      self.deferred_attachments.remove(&id);
    }
  }

  /// Commits the element's pending update. `new_style` becomes the
  /// element's old style for the next recalc.
  pub fn maybe_apply_pending_update(&mut self, element: ElementId, new_style: &ComputedStyle) -> Result<()> {
    let el = self.element_mut(element)?;
    let update = std::mem::take(&mut el.css.pending_update);
    el.css.previous_active_interpolations_for_animations =
      update.active_interpolations_for_animations.clone();
    el.style = Some(new_style.clone());
    if update.is_empty() {
      return Ok(());
    }
    self.record(Metric::UpdatesApplied);
    debug!(
      element = element.0,
      new_animations = update.new_animations.len(),
      updated = update.updated_animations.len(),
      cancelled = update.cancelled_animation_indices.len(),
      new_transitions = update.new_transitions.len(),
      "applying pending update"
    );

    self.apply_timeline_changes(element, &update);

    // Pause toggles first: their indices refer to the pre-cancellation
    // running list.
    for &index in &update.animations_with_pause_toggled {
      let id = self.elements.get(&element.0).unwrap().css.running_animations[index].animation;
      let (tl_time, paused) = {
        let a = self.animations.get(id).unwrap();
        (self.timeline_time(a.timeline), a.paused)
      };
      let animation = self.animations.get_mut(id).unwrap();
      if paused {
        animation.unpause(tl_time);
      } else {
        animation.pause(tl_time);
      }
    }

    let mut cancelled = update.cancelled_animation_indices.clone();
    cancelled.sort_unstable_by(|a, b| b.cmp(a));
    for index in cancelled {
      let record = self.elements.get_mut(&element.0).unwrap().css.running_animations.remove(index);
      self.cancel_effect(record.animation);
      self.animations.remove(record.animation);
      self.record(Metric::AnimationsCancelled);
    }

    for upd in &update.updated_animations {
      let tl_now = self.timeline_time(upd.timeline);
      if let Some(animation) = self.animations.get_mut(upd.animation) {
        animation.model = upd.model.clone();
        animation.specified_timing = upd.timing.clone();
        if upd.timeline_changed && !animation.ignore_css_timeline {
          animation.timeline = upd.timeline;
          if animation.start_time.is_some() {
            animation.start_time = tl_now.or(Some(0.0));
          }
        }
        if upd.range_changed && !animation.ignore_css_range {
          animation.range_start = upd.range_start;
          animation.range_end = upd.range_end;
        }
        if upd.trigger_changed {
          animation.trigger = upd.trigger.clone();
          animation.trigger_fired = false;
          animation.trigger_inside = false;
        }
      }
      let el = self.elements.get_mut(&element.0).unwrap();
      if let Some(record) = el.css.running_animations.iter_mut().find(|r| r.animation == upd.animation) {
        record.specified_timing = upd.specified_timing.clone();
        record.rule_version = upd.rule_version;
      }
      self.notify_effect(upd.animation);
    }

    for new in &update.new_animations {
      let id = self.animations.create(
        AnimationKind::CssAnimation {
          name: new.name.clone(),
          name_index: new.name_index,
        },
        element,
      );
      let tl_now = self.timeline_time(new.timeline);
      let progress_based = new
        .timeline
        .and_then(|t| self.timelines.get(t))
        .map(|t| t.is_progress_based())
        .unwrap_or(false);
      {
        let animation = self.animations.get_mut(id).unwrap();
        animation.model = new.model.clone();
        animation.specified_timing = new.timing.clone();
        animation.timeline = new.timeline;
        animation.range_start = new.range_start;
        animation.range_end = new.range_end;
        animation.trigger = new.trigger.clone();
        if new.trigger.is_some() {
          // Held until the trigger fires.
          animation.hold_time = Some(0.0);
        } else if progress_based {
          animation.start_time = Some(0.0);
        } else {
          animation.start_time = tl_now;
        }
        if new.paused_by_style {
          animation.pause(tl_now);
        }
      }
      let el = self.elements.get_mut(&element.0).unwrap();
      el.css.running_animations.push(RunningAnimation {
        animation: id,
        name: new.name.clone(),
        name_index: new.name_index,
        specified_timing: new.specified_timing.clone(),
        rule_version: new.rule_version,
      });
      self.record(Metric::AnimationsStarted);
      self.notify_effect(id);
    }

    // A transition cancelled in favour of a replacement (same property also
    // in new_transitions) hands its start time over when the compositor was
    // driving it, so playback stays seamless.
    let mut retargeted_start: FxHashMap<PropertyHandle, f64> = FxHashMap::default();
    for property in &update.cancelled_transitions {
      let removed = self.elements.get_mut(&element.0).unwrap().css.transitions.remove(property);
      if let Some(running) = removed {
        if update.new_transitions.contains_key(property) {
          if let Some(a) = self.animations.get(running.animation) {
            if a.on_compositor {
              if let Some(start) = a.start_time {
                retargeted_start.insert(property.clone(), start);
              }
            }
          }
        }
        self.cancel_effect(running.animation);
        self.animations.remove(running.animation);
        self.record(Metric::TransitionsCancelled);
      }
    }

    for property in &update.finished_transitions {
      let el = self.elements.get_mut(&element.0).unwrap();
      if let Some(running) = el.css.transitions.get_mut(property) {
        running.finished = true;
      }
    }

    for (property, new_transition) in &update.new_transitions {
      let mut inherited_start = retargeted_start.get(property).copied();
      let replaced = self.elements.get_mut(&element.0).unwrap().css.transitions.remove(property);
      if let Some(old) = replaced {
        if let Some(a) = self.animations.get(old.animation) {
          if a.on_compositor {
            inherited_start = a.start_time;
          }
        }
        self.animations.remove(old.animation);
      }
      let generation = self.next_transition_generation();
      let id = self.animations.create(
        AnimationKind::CssTransition {
          property: property.clone(),
          generation,
        },
        element,
      );
      let now = self.timeline_time(Some(self.document_timeline));
      {
        let animation = self.animations.get_mut(id).unwrap();
        animation.model = new_transition.model.clone();
        animation.specified_timing = new_transition.timing.clone();
        animation.timeline = Some(self.document_timeline);
        animation.start_time = inherited_start.or(now);
      }
      let el = self.elements.get_mut(&element.0).unwrap();
      el.css.transitions.insert(
        property.clone(),
        RunningTransition {
          animation: id,
          from: new_transition.from.clone(),
          to: new_transition.to.clone(),
          reversing_adjusted_start: new_transition.reversing_adjusted_start.clone(),
          reversing_shortening_factor: new_transition.reversing_shortening_factor,
          finished: false,
        },
      );
      self.record(Metric::TransitionsStarted);
      self.notify_effect(id);
    }

    Ok(())
  }

  /// One-call recalc: calculate, then apply.
  pub fn recalc(&mut self, element: ElementId, new_style: &ComputedStyle) -> Result<AnimationUpdate> {
    let update = self.calculate_update(element, new_style)?.clone();
    self.maybe_apply_pending_update(element, new_style)?;
    Ok(update)
  }

  /// Tears down every animation and transition on the element, firing
  /// cancel events. Used when the element leaves the document.
  pub fn cancel_all(&mut self, element: ElementId) -> Result<()> {
    let el = self.element_mut(element)?;
    let animations: Vec<AnimationId> = el.css.running_animations.drain(..).map(|r| r.animation).collect();
    let transitions: Vec<AnimationId> = el.css.transitions.drain().map(|(_, t)| t.animation).collect();
    el.css.pending_update.clear();
    el.css.previous_active_interpolations_for_animations.clear();
    for id in animations {
      self.cancel_effect(id);
      self.animations.remove(id);
      self.record(Metric::AnimationsCancelled);
    }
    for id in transitions {
      self.cancel_effect(id);
      self.animations.remove(id);
      self.record(Metric::TransitionsCancelled);
    }
    Ok(())
  }

  // ---------------------------------------------------------------------
  // Script overrides
  // ---------------------------------------------------------------------

  /// Pauses or resumes an animation from script; style-driven play-state
  /// changes stop affecting it afterwards.
  pub fn set_play_state_override(&mut self, id: AnimationId, paused: bool) -> Result<()> {
    let tl_time = {
      let a = self.animations.get(id).ok_or(Error::UnknownAnimation(id.0))?;
      self.timeline_time(a.timeline)
    };
    let animation = self.animations.get_mut(id).unwrap();
    animation.ignore_css_play_state = true;
    if paused {
      animation.pause(tl_time);
    } else {
      animation.unpause(tl_time);
    }
    Ok(())
  }

  /// Reattaches an animation to a timeline from script.
  pub fn set_timeline_override(&mut self, id: AnimationId, timeline: Option<TimelineId>) -> Result<()> {
    let animation = self.animations.get_mut(id).ok_or(Error::UnknownAnimation(id.0))?;
    animation.ignore_css_timeline = true;
    animation.timeline = timeline;
    Ok(())
  }

  pub fn set_range_override(&mut self, id: AnimationId, start: RangeOffset, end: RangeOffset) -> Result<()> {
    let animation = self.animations.get_mut(id).ok_or(Error::UnknownAnimation(id.0))?;
    animation.ignore_css_range = true;
    animation.range_start = start;
    animation.range_end = end;
    Ok(())
  }

  /// Reports whether the compositor currently drives this effect. A
  /// transition replaced while composited hands its start time to the
  /// replacement.
  pub fn set_compositor_status(&mut self, id: AnimationId, on_compositor: bool) -> Result<()> {
    let animation = self.animations.get_mut(id).ok_or(Error::UnknownAnimation(id.0))?;
    animation.on_compositor = on_compositor;
    Ok(())
  }

  // ---------------------------------------------------------------------
  // Timelines: progress reporting and triggers
  // ---------------------------------------------------------------------

  pub fn update_scroll_timeline(&mut self, id: TimelineId, state: AxisScrollState) -> Result<()> {
    let timeline = self.timelines.get_mut(id).ok_or(Error::UnknownTimeline(id.0))?;
    timeline.current_time = scroll_timeline_progress(&state).map(|p| p * 100.0);
    self.scroll_snapshots.insert(
      id,
      ScrollSnapshot {
        state,
        subject: None,
        inset: Default::default(),
      },
    );
    self.mirror_into_deferred(id);
    Ok(())
  }

  pub fn update_view_timeline(&mut self, id: TimelineId, subject: ViewSubject, state: AxisScrollState) -> Result<()> {
    let timeline = self.timelines.get_mut(id).ok_or(Error::UnknownTimeline(id.0))?;
    let inset = match &timeline.kind {
      TimelineKind::View(def) => def.inset,
      _ => Default::default(),
    };
    timeline.current_time = view_timeline_progress(&subject, &state, inset).map(|p| p * 100.0);
    self.scroll_snapshots.insert(
      id,
      ScrollSnapshot {
        state,
        subject: Some(subject),
        inset,
      },
    );
    self.mirror_into_deferred(id);
    Ok(())
  }

  fn mirror_into_deferred(&mut self, source: TimelineId) {
    let targets: Vec<TimelineId> = self
      .deferred_attachments
      .iter()
      .filter(|(_, atts)| atts.single() == Some(source))
      .map(|(deferred, _)| *deferred)
      .collect();
    let time = self.timelines.get(source).and_then(|t| t.current_time);
    for deferred in targets {
      if let Some(t) = self.timelines.get_mut(deferred) {
        t.current_time = time;
      }
      if let Some(snapshot) = self.scroll_snapshots.get(&source).copied() {
        self.scroll_snapshots.insert(deferred, snapshot);
      }
    }
  }

  fn resolve_range_fraction(&self, timeline: TimelineId, offset: &RangeOffset, is_end: bool) -> f64 {
    match offset {
      RangeOffset::Normal => {
        if is_end {
          1.0
        } else {
          0.0
        }
      }
      RangeOffset::Percent(p) => p / 100.0,
      RangeOffset::Named(named) => {
        let fallback = if is_end { 1.0 } else { 0.0 };
        let Some(snapshot) = self.scroll_snapshots.get(&timeline) else {
          return fallback;
        };
        let Some(subject) = snapshot.subject else {
          return fallback;
        };
        crate::timeline::named_range_progress(named.range, named.percent, &subject, &snapshot.state, snapshot.inset)
          .unwrap_or(fallback)
      }
    }
  }

  /// Re-evaluates every trigger against its timeline's current progress.
  pub fn poll_triggers(&mut self) {
    if !self.flags.animation_triggers {
      return;
    }
    let running: Vec<AnimationId> = self
      .elements
      .values()
      .flat_map(|el| el.css.running_animations.iter().map(|r| r.animation))
      .collect();
    for id in running {
      let Some(animation) = self.animations.get(id) else {
        continue;
      };
      let Some(trigger) = animation.trigger.clone() else {
        continue;
      };
      let Some(timeline) = trigger.timeline else {
        continue;
      };
      let Some(time) = self.timeline_time(Some(timeline)) else {
        continue;
      };
      let progress = time / 100.0;
      let enter_start = self.resolve_range_fraction(timeline, &trigger.range_start, false);
      let enter_end = self.resolve_range_fraction(timeline, &trigger.range_end, true);
      let exit_start = match trigger.exit_range_start {
        RangeOffset::Normal => enter_start,
        ref other => self.resolve_range_fraction(timeline, other, false),
      };
      let exit_end = match trigger.exit_range_end {
        RangeOffset::Normal => enter_end,
        ref other => self.resolve_range_fraction(timeline, other, true),
      };
      let inside_enter = progress >= enter_start && progress <= enter_end;
      let inside_exit = progress >= exit_start && progress <= exit_end;

      let was_inside = animation.trigger_inside;
      let fired = animation.trigger_fired;
      let doc_now = self.timeline_time(Some(self.document_timeline));
      let animation = self.animations.get_mut(id).unwrap();
      if !was_inside && inside_enter {
        animation.trigger_inside = true;
        match trigger.kind {
          TriggerKind::Once => {
            if !fired {
              animation.trigger_fired = true;
              Self::trigger_play(animation, doc_now);
            }
          }
          TriggerKind::Repeat => {
            animation.trigger_fired = true;
            Self::trigger_restart(animation, doc_now);
          }
          TriggerKind::Alternate => {
            animation.trigger_fired = true;
            Self::trigger_set_direction(animation, doc_now, 1.0);
          }
          TriggerKind::State => {
            animation.trigger_fired = true;
            Self::trigger_play(animation, doc_now);
          }
        }
      } else if was_inside && !inside_exit {
        animation.trigger_inside = false;
        match trigger.kind {
          TriggerKind::Once | TriggerKind::Repeat => {}
          TriggerKind::Alternate => Self::trigger_set_direction(animation, doc_now, -1.0),
          TriggerKind::State => animation.pause(doc_now),
        }
      }
      self.notify_effect(id);
    }
  }

  fn trigger_play(animation: &mut Animation, now: Option<f64>) {
    if animation.paused {
      animation.unpause(now);
      return;
    }
    let hold = animation.hold_time.take().unwrap_or(0.0);
    match now {
      Some(now) if animation.playback_rate != 0.0 => {
        // A negative delay means the triggered animation starts mid-flight.
        let offset = hold.max(start_time_from_delay(animation.specified_timing.start_delay));
        animation.start_time = Some(now - offset / animation.playback_rate);
      }
      _ => animation.hold_time = Some(hold),
    }
  }

  fn trigger_restart(animation: &mut Animation, now: Option<f64>) {
    animation.hold_time = None;
    animation.start_time = now;
  }

  fn trigger_set_direction(animation: &mut Animation, now: Option<f64>, rate: f64) {
    let tl_time = now;
    let local = animation.local_time(tl_time).unwrap_or(0.0);
    animation.playback_rate = rate;
    animation.hold_time = None;
    match tl_time {
      Some(now) if rate != 0.0 => animation.start_time = Some(now - local / rate),
      _ => animation.hold_time = Some(local),
    }
  }

  /// Advances the document timeline and reports timing events for every
  /// live effect.
  pub fn tick(&mut self, now: f64) {
    if let Some(t) = self.timelines.get_mut(self.document_timeline) {
      t.current_time = Some(now);
    }
    self.poll_triggers();
    let effects: Vec<AnimationId> = self
      .elements
      .values()
      .flat_map(|el| {
        el.css
          .running_animations
          .iter()
          .map(|r| r.animation)
          .chain(el.css.transitions.values().map(|t| t.animation))
      })
      .collect();
    for id in effects {
      self.notify_effect(id);
    }
  }
}
