use crate::common::*;

use fastanim::animation::AnimationPlayState;
use fastanim::properties::PropertyId;
use fastanim::style::{ComputedStyle, Display, TreeScopeId};
use fastanim::timing::{PlayState, TimingFunction};
use fastanim::values::PropertyValue;

#[test]
fn starting_an_animation_creates_a_running_animation() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  let update = host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  assert_eq!(update.new_animations.len(), 1);
  assert_eq!(update.new_animations[0].name, "fade");
  // At local time zero a fade contributes its start value.
  assert_eq!(
    update.active_interpolations_for_animations.get(&PropertyId::Opacity.into()),
    Some(&PropertyValue::Number(0.0))
  );
  assert_eq!(host.element(el).unwrap().css.running_animations.len(), 1);
  assert_eq!(host.metrics.animations_started, 1);
}

#[test]
fn recalculating_the_same_style_is_idempotent() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  let style = style_with_animation("fade", 2.0);

  host.recalc(el, &style).unwrap();
  let id = host.element(el).unwrap().css.running_animations[0].animation;
  let update = host.recalc(el, &style).unwrap();
  assert!(update.is_empty());
  // The animation object survives untouched.
  assert_eq!(host.element(el).unwrap().css.running_animations[0].animation, id);
}

#[test]
fn unknown_keyframes_name_starts_nothing() {
  let mut host = host();
  let el = new_element(&mut host);
  let update = host.recalc(el, &style_with_animation("missing", 2.0)).unwrap();
  assert!(update.is_empty());
}

#[test]
fn removing_the_name_cancels_the_animation() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  let update = host.recalc(el, &ComputedStyle::default()).unwrap();
  assert_eq!(update.cancelled_animation_indices, vec![0]);
  assert!(host.element(el).unwrap().css.running_animations.is_empty());
  assert_eq!(host.metrics.animations_cancelled, 1);
}

#[test]
fn display_none_cancels_all_animations() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  let mut hidden = style_with_animation("fade", 2.0);
  hidden.display = Display::None;
  let update = host.recalc(el, &hidden).unwrap();
  assert_eq!(update.cancelled_animation_indices, vec![0]);
  assert!(update.new_animations.is_empty());
}

#[test]
fn duplicate_names_match_by_occurrence_index() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  let mut style = style_with_animation("fade", 2.0);
  style.animations.names.push(Some("fade".to_string()));
  style.animations.durations = vec![Some(2.0), Some(4.0)];
  host.recalc(el, &style).unwrap();
  assert_eq!(host.element(el).unwrap().css.running_animations.len(), 2);

  // Dropping the second occurrence cancels only that one.
  let update = host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  assert_eq!(update.cancelled_animation_indices, vec![1]);
  assert!(update.new_animations.is_empty());
  assert!(update.updated_animations.is_empty());
  assert_eq!(host.element(el).unwrap().css.running_animations.len(), 1);
}

#[test]
fn timing_change_updates_in_place() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  let before = host.element(el).unwrap().css.running_animations[0].animation;
  let update = host.recalc(el, &style_with_animation("fade", 5.0)).unwrap();
  assert_eq!(update.updated_animations.len(), 1);
  assert!(update.new_animations.is_empty());
  assert!(update.cancelled_animation_indices.is_empty());
  let record = &host.element(el).unwrap().css.running_animations[0];
  assert_eq!(record.animation, before);
  assert_eq!(record.specified_timing.iteration_duration, Some(5.0));
}

#[test]
fn timing_function_change_rebuilds_the_effect() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();

  let mut eased = style_with_animation("fade", 2.0);
  eased.animations.timing_functions = vec![TimingFunction::EASE];
  let update = host.recalc(el, &eased).unwrap();
  assert_eq!(update.updated_animations.len(), 1);
  // The new easing lands on the keyframes; the effect itself stays linear.
  assert_eq!(
    update.updated_animations[0].timing.timing_function,
    TimingFunction::Linear
  );
  assert_eq!(
    update.updated_animations[0].model.keyframes[0].easing,
    TimingFunction::EASE
  );
  // Same style again settles back into the fast path.
  assert!(host.recalc(el, &eased).unwrap().is_empty());
}

#[test]
fn keyframes_content_change_updates_the_model() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  let style = style_with_animation("fade", 2.0);
  host.recalc(el, &style).unwrap();

  // Same rule name, new content: the running animation is retargeted, not
  // restarted.
  let mut blocks = fade_blocks();
  blocks[1].properties[0].1 = PropertyValue::Number(0.5);
  host.register_keyframes(TreeScopeId::DOCUMENT, "fade", blocks);
  let update = host.recalc(el, &style).unwrap();
  assert_eq!(update.updated_animations.len(), 1);
  assert!(update.cancelled_animation_indices.is_empty());
}

#[test]
fn play_state_toggle_pauses_without_restarting() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  let id = host.element(el).unwrap().css.running_animations[0].animation;

  let mut paused = style_with_animation("fade", 2.0);
  paused.animations.play_states = vec![PlayState::Paused];
  let update = host.recalc(el, &paused).unwrap();
  assert_eq!(update.animations_with_pause_toggled, vec![0]);
  assert!(update.updated_animations.is_empty());
  let animation = host.animations.get(id).unwrap();
  assert_eq!(animation.play_state(None), AnimationPlayState::Paused);

  let update = host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  assert_eq!(update.animations_with_pause_toggled, vec![0]);
  let now = host.timeline_time(Some(host.document_timeline));
  assert_eq!(
    host.animations.get(id).unwrap().play_state(now),
    AnimationPlayState::Running
  );
}

#[test]
fn script_play_state_override_sticks() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  let id = host.element(el).unwrap().css.running_animations[0].animation;

  host.set_play_state_override(id, true).unwrap();
  // Style still says running; the override wins and no toggle is queued.
  let update = host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();
  assert!(update.animations_with_pause_toggled.is_empty());
  assert_eq!(
    host.animations.get(id).unwrap().play_state(None),
    AnimationPlayState::Paused
  );
}

#[test]
fn cancel_all_tears_down_every_effect() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  host.recalc(el, &style_with_animation("fade", 2.0)).unwrap();

  host.cancel_all(el).unwrap();
  assert!(host.element(el).unwrap().css.running_animations.is_empty());
  assert_eq!(host.metrics.animations_cancelled, 1);
}
