use crate::common::*;

use fastanim::properties::{PropertyHandle, PropertyId};
use fastanim::style::{
  ComputedStyle, Display, TransitionBehavior, TransitionProperty, TransitionStyle,
};
use fastanim::values::PropertyValue;

fn opacity() -> PropertyHandle {
  PropertyId::Opacity.into()
}

#[test]
fn first_style_never_starts_transitions() {
  let mut host = host();
  let el = new_element(&mut host);
  let update = host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  assert!(update.new_transitions.is_empty());
}

#[test]
fn value_change_starts_a_transition() {
  let mut host = host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();

  let update = host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();
  let t = update.new_transitions.get(&opacity()).unwrap();
  assert_eq!(t.from, PropertyValue::Number(1.0));
  assert_eq!(t.to, PropertyValue::Number(0.0));
  assert_eq!(t.reversing_shortening_factor, 1.0);
  // Until it progresses, the transition pins the old value.
  assert_eq!(
    update.active_interpolations_for_transitions.get(&opacity()),
    Some(&PropertyValue::Number(1.0))
  );
  assert_eq!(host.element(el).unwrap().css.transitions.len(), 1);
  assert_eq!(host.metrics.transitions_started, 1);
}

#[test]
fn unchanged_value_is_moot() {
  let mut host = host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  let update = host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  assert!(update.is_empty());
}

#[test]
fn zero_combined_duration_starts_nothing() {
  let mut host = host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 0.0)).unwrap();
  let update = host.recalc(el, &opacity_style(0.0, 0.0)).unwrap();
  assert!(update.new_transitions.is_empty());
}

#[test]
fn retarget_replaces_the_running_transition() {
  let mut host = host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();

  // New target mid-flight: cancel and restart from the current value.
  host.tick(0.5);
  let update = host.recalc(el, &opacity_style(0.25, 1.0)).unwrap();
  assert!(update.cancelled_transitions.contains(&opacity()));
  let t = update.new_transitions.get(&opacity()).unwrap();
  assert_eq!(t.to, PropertyValue::Number(0.25));
  assert_eq!(t.from, PropertyValue::Number(0.5));
  // Not a reversal, so no shortening.
  assert_eq!(t.reversing_shortening_factor, 1.0);
  assert_eq!(host.element(el).unwrap().css.transitions.len(), 1);
}

#[test]
fn reversal_shortens_the_return_leg() {
  let mut host = host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();

  // Reverse halfway: the new transition runs at half duration.
  host.tick(0.5);
  let update = host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  let t = update.new_transitions.get(&opacity()).unwrap();
  assert_eq!(t.reversing_shortening_factor, 0.5);
  assert_eq!(t.timing.iteration_duration, Some(0.5));
  assert_eq!(t.from, PropertyValue::Number(0.5));
  assert_eq!(t.to, PropertyValue::Number(1.0));
  assert_eq!(t.reversing_adjusted_start, PropertyValue::Number(0.0));

  // Reversing the reversal compounds the factor: 0.5 * 0.5 + 0.5 = 0.75.
  host.tick(0.75);
  let update = host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();
  let t = update.new_transitions.get(&opacity()).unwrap();
  assert_eq!(t.reversing_shortening_factor, 0.75);
  assert_eq!(t.timing.iteration_duration, Some(0.75));
}

#[test]
fn negative_delay_scales_with_the_shortening_factor() {
  let mut host = host();
  let el = new_element(&mut host);
  let style = |v: f32| {
    let mut s = opacity_style(v, 1.0);
    s.transitions.as_mut().unwrap().delays = vec![-0.4];
    s
  };
  host.recalc(el, &style(1.0)).unwrap();
  host.recalc(el, &style(0.0)).unwrap();
  host.tick(0.1); // local 0.1, plus 0.4 of negative delay: halfway.
  let update = host.recalc(el, &style(1.0)).unwrap();
  let t = update.new_transitions.get(&opacity()).unwrap();
  assert_eq!(t.reversing_shortening_factor, 0.5);
  assert!((t.timing.start_delay + 0.2).abs() < 1e-9);
}

#[test]
fn css_animated_properties_do_not_transition() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  let style = |v: f32| {
    let mut s = opacity_style(v, 1.0);
    s.animations = animation_style("fade", 2.0);
    s
  };
  host.recalc(el, &style(1.0)).unwrap();
  let update = host.recalc(el, &style(0.3)).unwrap();
  assert!(update.new_transitions.is_empty());
}

#[test]
fn properties_animated_last_recalc_still_do_not_transition() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  let mut with_animation = opacity_style(1.0, 1.0);
  with_animation.animations = animation_style("fade", 2.0);
  host.recalc(el, &with_animation).unwrap();

  // The animation goes away and opacity changes in the same recalc; the
  // previous recalc's animation still owns the property.
  let update = host.recalc(el, &opacity_style(0.3, 1.0)).unwrap();
  assert!(update.new_transitions.is_empty());
}

#[test]
fn discrete_properties_need_allow_discrete() {
  let mut host = host();
  let el = new_element(&mut host);
  let style = |display_value: &str, behavior: TransitionBehavior| {
    ComputedStyle {
      transitions: Some(TransitionStyle {
        properties: vec![TransitionProperty::Css(PropertyId::Visibility)],
        durations: vec![1.0],
        behaviors: vec![behavior],
        ..TransitionStyle::default()
      }),
      ..ComputedStyle::default()
    }
    .with_property(PropertyId::Visibility, PropertyValue::keyword(display_value))
  };

  host.recalc(el, &style("visible", TransitionBehavior::Normal)).unwrap();
  let update = host.recalc(el, &style("hidden", TransitionBehavior::Normal)).unwrap();
  assert!(update.new_transitions.is_empty());

  host.recalc(el, &style("visible", TransitionBehavior::AllowDiscrete)).unwrap();
  let update = host
    .recalc(el, &style("hidden", TransitionBehavior::AllowDiscrete))
    .unwrap();
  assert_eq!(update.new_transitions.len(), 1);
}

#[test]
fn unlisting_a_property_cancels_its_transition() {
  let mut host = host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();

  let mut unlisted = opacity_style(0.0, 1.0);
  unlisted.transitions = Some(TransitionStyle {
    properties: vec![TransitionProperty::Css(PropertyId::Width)],
    durations: vec![1.0],
    ..TransitionStyle::default()
  });
  let update = host.recalc(el, &unlisted).unwrap();
  assert!(update.cancelled_transitions.contains(&opacity()));
  assert!(host.element(el).unwrap().css.transitions.is_empty());
}

#[test]
fn display_none_cancels_running_transitions() {
  let mut host = host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();

  let mut hidden = opacity_style(0.0, 1.0);
  hidden.display = Display::None;
  let update = host.recalc(el, &hidden).unwrap();
  assert!(update.cancelled_transitions.contains(&opacity()));
}

#[test]
fn finished_transitions_are_retained_and_stay_moot() {
  let mut host = host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();

  host.tick(2.0);
  let update = host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();
  assert!(update.finished_transitions.contains(&opacity()));
  let el_state = host.element(el).unwrap();
  assert!(el_state.css.transitions.get(&opacity()).unwrap().finished);

  // Same target again: still nothing to do.
  let update = host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();
  assert!(update.is_empty());

  // A different target starts a fresh, full-length transition.
  let update = host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  let t = update.new_transitions.get(&opacity()).unwrap();
  assert_eq!(t.reversing_shortening_factor, 1.0);
  assert_eq!(t.timing.iteration_duration, Some(1.0));
}

#[test]
fn transition_all_expands_to_longhands() {
  let mut host = host();
  let el = new_element(&mut host);
  let style = |opacity: f32, width: f32| {
    ComputedStyle {
      transitions: Some(TransitionStyle {
        durations: vec![1.0],
        ..TransitionStyle::default()
      }),
      ..ComputedStyle::default()
    }
    .with_property(PropertyId::Opacity, PropertyValue::Number(opacity))
    .with_property(PropertyId::Width, PropertyValue::Px(width))
  };
  host.recalc(el, &style(1.0, 10.0)).unwrap();
  let update = host.recalc(el, &style(0.0, 20.0)).unwrap();
  assert_eq!(update.new_transitions.len(), 2);
  assert!(update.new_transitions.contains_key(&opacity()));
  assert!(update.new_transitions.contains_key(&PropertyId::Width.into()));
}

#[test]
fn composited_transitions_hand_their_start_time_to_replacements() {
  let mut host = host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  host.tick(0.5);
  host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();
  let first = host.element(el).unwrap().css.transitions.get(&opacity()).unwrap().animation;
  assert_eq!(host.animations.get(first).unwrap().start_time, Some(0.5));
  host.set_compositor_status(first, true).unwrap();

  // Retargeting mid-flight keeps the composited start time.
  host.tick(0.75);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  let second = host.element(el).unwrap().css.transitions.get(&opacity()).unwrap().animation;
  assert_ne!(second, first);
  assert_eq!(host.animations.get(second).unwrap().start_time, Some(0.5));
}

#[test]
fn transition_generations_order_replacements() {
  let mut host = host();
  let el = new_element(&mut host);
  host.recalc(el, &opacity_style(1.0, 1.0)).unwrap();
  host.recalc(el, &opacity_style(0.0, 1.0)).unwrap();
  let first = host.element(el).unwrap().css.transitions.get(&opacity()).unwrap().animation;
  host.tick(0.5);
  host.recalc(el, &opacity_style(0.25, 1.0)).unwrap();
  let second = host.element(el).unwrap().css.transitions.get(&opacity()).unwrap().animation;
  assert_ne!(first, second);
}
