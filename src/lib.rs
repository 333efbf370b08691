//! fastanim: the declarative half of a CSS animation engine.
//!
//! Given a freshly computed style for an element, this crate decides which
//! CSS Animations and CSS Transitions should be running, what keyframe and
//! timeline data they carry, and which `animation*`/`transition*` events must
//! fire as effects move through their timing phases.
//!
//! The crate deliberately stops at the *decision* boundary: it consumes
//! already-computed style data (see [`style::ComputedStyle`]) and produces an
//! [`update::AnimationUpdate`] diff plus a stream of queued events. Parsing,
//! cascade, layout and paint belong to the embedding engine.

pub mod animation;
pub mod effect;
pub mod engine;
pub mod error;
pub mod events;
pub mod keyframes;
pub mod properties;
pub mod style;
pub mod timeline;
pub mod timing;
pub mod trigger;
pub mod update;
pub mod values;

pub use engine::{ElementId, EngineFlags, Host, Metrics, MetricsSink};
pub use error::{Error, Result};
pub use properties::{PropertyHandle, PropertyId};
pub use style::ComputedStyle;
pub use update::AnimationUpdate;
pub use values::{PropertyValue, Rgba};
