use crate::common::*;

use fastanim::engine::Host;
use fastanim::events::{AnimationEventType, ListenerFlags};
use fastanim::style::ComputedStyle;

fn listening_host() -> Host {
  let mut host = host();
  host.events.listeners = ListenerFlags::all();
  host
}

#[test]
fn animation_start_fires_on_creation() {
  let mut host = listening_host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  let events = host.events.drain();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, AnimationEventType::AnimationStart);
  assert_eq!(events[0].name, "fade");
  assert_eq!(events[0].target, el);
  assert_eq!(events[0].elapsed, 0.0);
}

#[test]
fn animation_end_fires_when_the_clock_passes_the_interval() {
  let mut host = listening_host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  host.events.drain();

  host.tick(2.5);
  let events = host.events.drain();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, AnimationEventType::AnimationEnd);
  assert_eq!(events[0].elapsed, 2.0);
}

#[test]
fn animation_iteration_fires_at_iteration_boundaries() {
  let mut host = listening_host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  let mut style = style_with_animation("fade", 1.0);
  style.animations.iteration_counts = vec![3.0];
  host.recalc(el, &style).unwrap();
  host.events.drain();

  host.tick(0.5);
  assert!(host.events.is_empty());

  host.tick(1.5);
  let events = host.events.drain();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, AnimationEventType::AnimationIteration);
  assert_eq!(events[0].elapsed, 1.0);
}

#[test]
fn cancelling_mid_flight_reports_the_active_time() {
  let mut host = listening_host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  host.tick(0.5);
  host.events.drain();

  host.recalc(el, &ComputedStyle::default()).unwrap();
  let events = host.events.drain();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, AnimationEventType::AnimationCancel);
  assert_eq!(events[0].elapsed, 0.5);
}

#[test]
fn transitions_fire_run_start_then_end() {
  let mut host = listening_host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  assert!(host.events.is_empty());

  host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();
  let kinds: Vec<_> = host.events.drain().into_iter().map(|e| e.kind).collect();
  assert_eq!(
    kinds,
    vec![
      AnimationEventType::TransitionRun,
      AnimationEventType::TransitionStart
    ]
  );

  host.tick(1.5);
  let events = host.events.drain();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, AnimationEventType::TransitionEnd);
  assert_eq!(events[0].name, "opacity");
  assert_eq!(events[0].elapsed, 1.0);
}

#[test]
fn delayed_transition_defers_run_and_start() {
  let mut host = listening_host();
  let el = new_element(&mut host);
  let style = |v: f32| {
    let mut s = opacity_style(v, 1.0);
    s.transitions.as_mut().unwrap().delays = vec![0.5];
    s
  };
  host.recalc(el, &style(1.0)).unwrap();
  host.recalc(el, &style(0.0)).unwrap();
  // Still in the delay: nothing to report yet.
  assert!(host.events.is_empty());

  host.tick(0.6);
  let events = host.events.drain();
  let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
  assert_eq!(
    kinds,
    vec![
      AnimationEventType::TransitionRun,
      AnimationEventType::TransitionStart
    ]
  );
  assert_eq!(events[0].elapsed, 0.0);
}

#[test]
fn unlisting_a_transition_fires_cancel() {
  let mut host = listening_host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();
  host.tick(0.25);
  host.events.drain();

  let mut unlisted = opacity_style(0.0, 1.0);
  unlisted.transitions = None;
  host.recalc(el, &unlisted).unwrap();
  let events = host.events.drain();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, AnimationEventType::TransitionCancel);
  assert_eq!(events[0].name, "opacity");
  assert_eq!(events[0].elapsed, 0.25);
}

#[test]
fn unlistened_events_are_never_queued() {
  let mut host = host();
  host.events.listeners = ListenerFlags::ANIMATION_END;
  register_fade(&mut host);
  let el = new_element(&mut host);

  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  assert!(host.events.is_empty());
  host.tick(2.5);
  let events = host.events.drain();
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].kind, AnimationEventType::AnimationEnd);
}
