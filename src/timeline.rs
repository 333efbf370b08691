//! Timelines: document, scroll, view and deferred.
//!
//! Scroll and view timelines express their current time as a percentage of
//! scroll progress (0..=100); the document timeline reports seconds. A
//! deferred timeline (declared by `timeline-scope`) carries no progress of
//! its own and mirrors its single attached timeline.

use rustc_hash::FxHashMap;

use crate::engine::ElementId;
use crate::style::{ScopedName, Scroller, StyleTimeline, TimelineAxis, TimelineInset, WritingMode};

/// Handle to a timeline in the host's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineId(pub u32);

/// What a scroll timeline tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTimelineDef {
  pub reference: ScrollReference,
  pub axis: TimelineAxis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollReference {
  /// A named timeline's declaring element, or `scroll(self)`.
  Element(ElementId),
  /// `scroll(nearest)` resolved from this element.
  Nearest(ElementId),
  /// `scroll(root)`.
  Root,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewTimelineDef {
  pub subject: ElementId,
  pub axis: TimelineAxis,
  pub inset: TimelineInset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimelineKind {
  Document,
  Scroll(ScrollTimelineDef),
  View(ViewTimelineDef),
  /// Declared by `timeline-scope`; mirrors its attached timelines.
  Deferred,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
  pub kind: TimelineKind,
  /// Seconds for the document timeline, progress percent for scroll and
  /// view timelines. `None` while inactive.
  pub current_time: Option<f64>,
}

impl Timeline {
  pub fn new(kind: TimelineKind) -> Self {
    Self {
      kind,
      current_time: None,
    }
  }

  pub fn is_active(&self) -> bool {
    self.current_time.is_some()
  }

  pub fn is_progress_based(&self) -> bool {
    !matches!(self.kind, TimelineKind::Document)
  }
}

/// Arena of all timelines the host has created. Ids are never reused, so a
/// stale id held across a replacement resolves to no timeline at all.
#[derive(Debug, Default)]
pub struct TimelineArena {
  timelines: FxHashMap<u32, Timeline>,
  next: u32,
}

impl TimelineArena {
  pub fn insert(&mut self, timeline: Timeline) -> TimelineId {
    let id = TimelineId(self.next);
    self.next += 1;
    self.timelines.insert(id.0, timeline);
    id
  }

  pub fn get(&self, id: TimelineId) -> Option<&Timeline> {
    self.timelines.get(&id.0)
  }

  pub fn get_mut(&mut self, id: TimelineId) -> Option<&mut Timeline> {
    self.timelines.get_mut(&id.0)
  }

  pub fn remove(&mut self, id: TimelineId) -> Option<Timeline> {
    self.timelines.remove(&id.0)
  }
}

/// Per-element timeline bookkeeping: the named timelines this element
/// declares and the attachments routed through its deferred timelines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineData {
  pub scroll_timelines: FxHashMap<ScopedName, TimelineId>,
  pub view_timelines: FxHashMap<ScopedName, TimelineId>,
  pub deferred_timelines: FxHashMap<ScopedName, TimelineId>,
  /// Attaching timeline -> deferred timeline it feeds.
  pub timeline_attachments: FxHashMap<TimelineId, TimelineId>,
}

impl TimelineData {
  pub fn is_empty(&self) -> bool {
    self.scroll_timelines.is_empty()
      && self.view_timelines.is_empty()
      && self.deferred_timelines.is_empty()
      && self.timeline_attachments.is_empty()
  }
}

/// Attachments on a deferred timeline, kept symmetric with
/// [`TimelineData::timeline_attachments`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeferredAttachments {
  pub attached: Vec<TimelineId>,
}

impl DeferredAttachments {
  /// A deferred timeline only ticks while exactly one timeline is attached.
  pub fn single(&self) -> Option<TimelineId> {
    match self.attached.as_slice() {
      [one] => Some(*one),
      _ => None,
    }
  }
}

/// Whether an existing anonymous timeline can be reused for a computed
/// `animation-timeline` value, avoiding a cancel-and-restart.
pub fn timeline_matches(existing: &Timeline, wanted: &StyleTimeline, owner: ElementId) -> bool {
  match (&existing.kind, wanted) {
    (TimelineKind::Scroll(def), StyleTimeline::Scroll { scroller, axis }) => {
      def.axis == *axis
        && def.reference
          == match scroller {
            Scroller::Root => ScrollReference::Root,
            Scroller::Nearest => ScrollReference::Nearest(owner),
            Scroller::SelfElement => ScrollReference::Element(owner),
          }
    }
    (TimelineKind::View(def), StyleTimeline::View { axis, inset }) => {
      def.subject == owner && def.axis == *axis && def.inset == *inset
    }
    _ => false,
  }
}

/// Physical scroll direction after resolving a logical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalAxis {
  Horizontal,
  Vertical,
}

pub fn physical_axis(axis: TimelineAxis, writing_mode: WritingMode) -> PhysicalAxis {
  match axis {
    TimelineAxis::X => PhysicalAxis::Horizontal,
    TimelineAxis::Y => PhysicalAxis::Vertical,
    TimelineAxis::Block => match writing_mode {
      WritingMode::HorizontalTb => PhysicalAxis::Vertical,
      _ => PhysicalAxis::Horizontal,
    },
    TimelineAxis::Inline => match writing_mode {
      WritingMode::HorizontalTb => PhysicalAxis::Horizontal,
      _ => PhysicalAxis::Vertical,
    },
  }
}

/// Scroll state of one axis of a scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisScrollState {
  pub offset: f64,
  pub max_offset: f64,
  pub viewport_size: f64,
}

/// Progress of a scroll timeline, as a fraction. `None` when the container
/// does not scroll on this axis, which leaves the timeline inactive.
pub fn scroll_timeline_progress(state: &AxisScrollState) -> Option<f64> {
  if state.max_offset <= 0.0 {
    return None;
  }
  Some((state.offset / state.max_offset).clamp(0.0, 1.0))
}

/// Position of a view timeline's subject along the scroll axis, in the
/// scroller's content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSubject {
  pub start: f64,
  pub size: f64,
}

/// The scroll-offset interval of the `cover` range, adjusted by insets.
fn cover_bounds(subject: &ViewSubject, state: &AxisScrollState, inset: TimelineInset) -> (f64, f64) {
  let start = subject.start - state.viewport_size + inset.end;
  let end = subject.start + subject.size - inset.start;
  (start, end)
}

/// Progress of a view timeline over its `cover` range, as a fraction.
pub fn view_timeline_progress(
  subject: &ViewSubject,
  state: &AxisScrollState,
  inset: TimelineInset,
) -> Option<f64> {
  let (start, end) = cover_bounds(subject, state, inset);
  if end <= start {
    return None;
  }
  Some(((state.offset - start) / (end - start)).clamp(0.0, 1.0))
}

/// Scroll-offset bounds of a named range of a view timeline.
pub fn named_range_bounds(
  range: crate::style::NamedRange,
  subject: &ViewSubject,
  state: &AxisScrollState,
  inset: TimelineInset,
) -> (f64, f64) {
  use crate::style::NamedRange;
  let (cover_start, cover_end) = cover_bounds(subject, state, inset);
  let viewport = state.viewport_size - inset.start - inset.end;
  let fits = subject.size <= viewport;
  match range {
    NamedRange::Cover => (cover_start, cover_end),
    NamedRange::Contain => {
      // Fully visible (or fully covering, when larger than the viewport).
      if fits {
        (cover_start + subject.size, cover_end - subject.size)
      } else {
        (cover_start + viewport, cover_end - viewport)
      }
    }
    NamedRange::Entry => {
      let len = subject.size.min(viewport);
      (cover_start, cover_start + len)
    }
    NamedRange::EntryCrossing => (cover_start, cover_start + subject.size),
    NamedRange::Exit => {
      let len = subject.size.min(viewport);
      (cover_end - len, cover_end)
    }
    NamedRange::ExitCrossing => (cover_end - subject.size, cover_end),
  }
}

/// Converts a named-range offset to a fraction of the timeline's full range.
pub fn named_range_progress(
  range: crate::style::NamedRange,
  percent: f64,
  subject: &ViewSubject,
  state: &AxisScrollState,
  inset: TimelineInset,
) -> Option<f64> {
  let (cover_start, cover_end) = cover_bounds(subject, state, inset);
  if cover_end <= cover_start {
    return None;
  }
  let (start, end) = named_range_bounds(range, subject, state, inset);
  let offset = start + (end - start) * (percent / 100.0);
  Some(((offset - cover_start) / (cover_end - cover_start)).clamp(0.0, 1.0))
}
