use crate::common::*;

use fastanim::engine::{ElementId, EngineFlags, Host};
use fastanim::style::{
  ComputedStyle, NamedRange, RangeOffset, ScopedName, ScrollTimelineStyle, StyleTimeline,
  TimelineAxis, TimelineOffset, ViewTimelineStyle,
};
use fastanim::timeline::{AxisScrollState, TimelineId, ViewSubject};
use fastanim::trigger::TriggerKind;

fn triggered_style(kind: TriggerKind, start: RangeOffset, end: RangeOffset) -> ComputedStyle {
  let mut style = style_with_animation("fade", 2.0);
  style.animations.trigger_types = vec![Some(kind)];
  style.animations.trigger_timelines = vec![StyleTimeline::Named(ScopedName::document("scroller"))];
  style.animations.trigger_range_starts = vec![start];
  style.animations.trigger_range_ends = vec![end];
  style.scroll_timelines = vec![ScrollTimelineStyle {
    name: ScopedName::document("scroller"),
    axis: TimelineAxis::Block,
  }];
  style
}

fn scroller_timeline(host: &Host, el: ElementId) -> TimelineId {
  *host
    .element(el)
    .unwrap()
    .css
    .timeline_data
    .scroll_timelines
    .get(&ScopedName::document("scroller"))
    .unwrap()
}

fn scroll_to(host: &mut Host, tl: TimelineId, offset: f64) {
  host
    .update_scroll_timeline(
      tl,
      AxisScrollState {
        offset,
        max_offset: 100.0,
        viewport_size: 50.0,
      },
    )
    .unwrap();
}

fn running_animation(host: &Host, el: ElementId) -> fastanim::animation::AnimationId {
  host.element(el).unwrap().css.running_animations[0].animation
}

#[test]
fn animations_with_triggers_start_held() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  // No explicit trigger timeline: it falls back to the document timeline.
  let mut style = style_with_animation("fade", 2.0);
  style.animations.trigger_types = vec![Some(TriggerKind::Once)];
  host.recalc(el, &style).unwrap();

  let animation = host.animations.get(running_animation(&host, el)).unwrap();
  assert_eq!(animation.hold_time, Some(0.0));
  assert_eq!(animation.start_time, None);
  assert_eq!(
    animation.trigger.as_ref().unwrap().timeline,
    Some(host.document_timeline)
  );
}

#[test]
fn once_trigger_fires_on_entering_its_range() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  let style = triggered_style(
    TriggerKind::Once,
    RangeOffset::Percent(25.0),
    RangeOffset::Percent(75.0),
  );
  host.recalc(el, &style).unwrap();
  let id = running_animation(&host, el);
  let tl = scroller_timeline(&host, el);

  // Outside the range: still held.
  scroll_to(&mut host, tl, 0.0);
  host.poll_triggers();
  assert_eq!(host.animations.get(id).unwrap().hold_time, Some(0.0));

  scroll_to(&mut host, tl, 50.0);
  host.poll_triggers();
  let animation = host.animations.get(id).unwrap();
  assert!(animation.trigger_fired);
  assert_eq!(animation.hold_time, None);
  assert_eq!(animation.start_time, Some(0.0));
}

#[test]
fn once_trigger_does_not_refire() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  let style = triggered_style(
    TriggerKind::Once,
    RangeOffset::Percent(25.0),
    RangeOffset::Percent(75.0),
  );
  host.recalc(el, &style).unwrap();
  let id = running_animation(&host, el);
  let tl = scroller_timeline(&host, el);

  scroll_to(&mut host, tl, 50.0);
  host.poll_triggers();
  assert_eq!(host.animations.get(id).unwrap().start_time, Some(0.0));

  // Leave and re-enter after the clock moved; a once trigger stays fired.
  host.tick(1.0);
  scroll_to(&mut host, tl, 90.0);
  host.poll_triggers();
  scroll_to(&mut host, tl, 50.0);
  host.poll_triggers();
  assert_eq!(host.animations.get(id).unwrap().start_time, Some(0.0));
}

#[test]
fn repeat_trigger_restarts_on_each_entry() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  let style = triggered_style(
    TriggerKind::Repeat,
    RangeOffset::Percent(25.0),
    RangeOffset::Percent(75.0),
  );
  host.recalc(el, &style).unwrap();
  let id = running_animation(&host, el);
  let tl = scroller_timeline(&host, el);

  scroll_to(&mut host, tl, 50.0);
  host.poll_triggers();
  assert_eq!(host.animations.get(id).unwrap().start_time, Some(0.0));

  host.tick(1.0);
  scroll_to(&mut host, tl, 90.0);
  host.poll_triggers();
  scroll_to(&mut host, tl, 50.0);
  host.poll_triggers();
  assert_eq!(host.animations.get(id).unwrap().start_time, Some(1.0));
}

#[test]
fn state_trigger_pauses_outside_its_exit_range() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  let style = triggered_style(
    TriggerKind::State,
    RangeOffset::Percent(25.0),
    RangeOffset::Percent(75.0),
  );
  host.recalc(el, &style).unwrap();
  let id = running_animation(&host, el);
  let tl = scroller_timeline(&host, el);

  scroll_to(&mut host, tl, 50.0);
  host.poll_triggers();
  assert!(!host.animations.get(id).unwrap().paused);

  scroll_to(&mut host, tl, 90.0);
  host.poll_triggers();
  assert!(host.animations.get(id).unwrap().paused);

  scroll_to(&mut host, tl, 50.0);
  host.poll_triggers();
  assert!(!host.animations.get(id).unwrap().paused);
}

#[test]
fn alternate_trigger_reverses_on_exit() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  let style = triggered_style(
    TriggerKind::Alternate,
    RangeOffset::Percent(25.0),
    RangeOffset::Percent(75.0),
  );
  host.recalc(el, &style).unwrap();
  let id = running_animation(&host, el);
  let tl = scroller_timeline(&host, el);

  scroll_to(&mut host, tl, 50.0);
  host.poll_triggers();
  assert_eq!(host.animations.get(id).unwrap().playback_rate, 1.0);

  scroll_to(&mut host, tl, 90.0);
  host.poll_triggers();
  assert_eq!(host.animations.get(id).unwrap().playback_rate, -1.0);

  scroll_to(&mut host, tl, 50.0);
  host.poll_triggers();
  assert_eq!(host.animations.get(id).unwrap().playback_rate, 1.0);
}

#[test]
fn trigger_change_rearms_the_trigger() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);
  let style = triggered_style(
    TriggerKind::Once,
    RangeOffset::Percent(25.0),
    RangeOffset::Percent(75.0),
  );
  host.recalc(el, &style).unwrap();
  let id = running_animation(&host, el);
  let tl = scroller_timeline(&host, el);
  scroll_to(&mut host, tl, 50.0);
  host.poll_triggers();
  assert!(host.animations.get(id).unwrap().trigger_fired);

  let rearmed = triggered_style(
    TriggerKind::Once,
    RangeOffset::Percent(60.0),
    RangeOffset::Percent(75.0),
  );
  let update = host.recalc(el, &rearmed).unwrap();
  assert_eq!(update.updated_animations.len(), 1);
  assert!(update.updated_animations[0].trigger_changed);
  let animation = host.animations.get(id).unwrap();
  assert!(!animation.trigger_fired);
  assert!(!animation.trigger_inside);
}

#[test]
fn disabling_triggers_starts_animations_immediately() {
  let mut host = Host::new(EngineFlags {
    animation_triggers: false,
    ..EngineFlags::default()
  });
  register_fade(&mut host);
  let el = new_element(&mut host);
  let style = triggered_style(
    TriggerKind::Once,
    RangeOffset::Percent(25.0),
    RangeOffset::Percent(75.0),
  );
  host.recalc(el, &style).unwrap();

  let animation = host.animations.get(running_animation(&host, el)).unwrap();
  assert!(animation.trigger.is_none());
  assert_eq!(animation.start_time, Some(0.0));
}

#[test]
fn named_range_boundaries_resolve_against_view_geometry() {
  let mut host = host();
  register_fade(&mut host);
  let el = new_element(&mut host);

  let mut style = style_with_animation("fade", 2.0);
  style.animations.trigger_types = vec![Some(TriggerKind::Once)];
  style.animations.trigger_timelines = vec![StyleTimeline::Named(ScopedName::document("vt"))];
  style.animations.trigger_range_starts = vec![RangeOffset::Named(TimelineOffset {
    range: NamedRange::Entry,
    percent: 10.0,
  })];
  style.animations.trigger_range_ends = vec![RangeOffset::Named(TimelineOffset {
    range: NamedRange::Entry,
    percent: 100.0,
  })];
  style.view_timelines = vec![ViewTimelineStyle {
    name: ScopedName::document("vt"),
    axis: TimelineAxis::Block,
    inset: Default::default(),
  }];
  host.recalc(el, &style).unwrap();
  let id = running_animation(&host, el);
  let tl = *host
    .element(el)
    .unwrap()
    .css
    .timeline_data
    .view_timelines
    .get(&ScopedName::document("vt"))
    .unwrap();
  let subject = ViewSubject {
    start: 500.0,
    size: 50.0,
  };

  // Subject still out of view: its entry range has not begun.
  host
    .update_view_timeline(
      tl,
      subject,
      AxisScrollState {
        offset: 300.0,
        max_offset: 1000.0,
        viewport_size: 100.0,
      },
    )
    .unwrap();
  host.poll_triggers();
  assert!(!host.animations.get(id).unwrap().trigger_fired);

  // Subject partially entered: inside the entry range.
  host
    .update_view_timeline(
      tl,
      subject,
      AxisScrollState {
        offset: 425.0,
        max_offset: 1000.0,
        viewport_size: 100.0,
      },
    )
    .unwrap();
  host.poll_triggers();
  assert!(host.animations.get(id).unwrap().trigger_fired);
}
