//! Computed property values and interpolation.
//!
//! The update engine does not parse CSS; it receives computed values from the
//! style collaborator and only needs to compare and interpolate them. The
//! value model here is therefore small: numbers, lengths, colors, transform
//! lists and opaque keywords. Keyword pairs never interpolate smoothly and
//! fall back to the discrete rules in the transition calculator.

use serde::{Deserialize, Serialize};

/// An RGBA color with 8-bit channels and a float alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: f32,
}

impl Rgba {
  pub const BLACK: Rgba = Rgba {
    r: 0,
    g: 0,
    b: 0,
    a: 1.0,
  };

  pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
    Self { r, g, b, a }
  }
}

/// A single component of a computed `transform` list.
///
/// Lengths are pre-resolved to pixels by the style collaborator; the engine
/// never sees percentages here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
  Translate(f32, f32),
  TranslateX(f32),
  TranslateY(f32),
  Scale(f32, f32),
  /// Rotation in degrees.
  Rotate(f32),
  /// Skew angles in degrees.
  Skew(f32, f32),
  /// Row-major 2D matrix `[a, b, c, d, e, f]`.
  Matrix([f32; 6]),
}

/// A computed property value as consumed by the update engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
  Number(f32),
  /// A length resolved to pixels.
  Px(f32),
  Percent(f32),
  Color(Rgba),
  Transform(Vec<Transform>),
  /// Any non-interpolable computed value, compared by identity text.
  Keyword(String),
}

impl PropertyValue {
  pub fn keyword(text: &str) -> Self {
    PropertyValue::Keyword(text.to_string())
  }

  /// Whether `self -> other` has a smooth interpolation. Mirrors the merge
  /// probe the transition calculator runs before starting a transition.
  pub fn can_interpolate_to(&self, other: &PropertyValue) -> bool {
    interpolate(self, other, 0.5).is_some()
  }
}

pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
  a + (b - a) * t
}

fn lerp_color(a: Rgba, b: Rgba, t: f32) -> Rgba {
  let lerp_chan =
    |ca: u8, cb: u8| -> u8 { lerp(ca as f32, cb as f32, t).round().clamp(0.0, 255.0) as u8 };
  Rgba::new(
    lerp_chan(a.r, b.r),
    lerp_chan(a.g, b.g),
    lerp_chan(a.b, b.b),
    lerp(a.a, b.a, t),
  )
}

fn compose_transform(t: &Transform) -> [f32; 6] {
  match t {
    Transform::Translate(x, y) => [1.0, 0.0, 0.0, 1.0, *x, *y],
    Transform::TranslateX(x) => [1.0, 0.0, 0.0, 1.0, *x, 0.0],
    Transform::TranslateY(y) => [1.0, 0.0, 0.0, 1.0, 0.0, *y],
    Transform::Scale(sx, sy) => [*sx, 0.0, 0.0, *sy, 0.0, 0.0],
    Transform::Rotate(deg) => {
      let (s, c) = deg.to_radians().sin_cos();
      [c, s, -s, c, 0.0, 0.0]
    }
    Transform::Skew(ax, ay) => [1.0, ay.to_radians().tan(), ax.to_radians().tan(), 1.0, 0.0, 0.0],
    Transform::Matrix(m) => *m,
  }
}

fn multiply(a: &[f32; 6], b: &[f32; 6]) -> [f32; 6] {
  [
    a[0] * b[0] + a[2] * b[1],
    a[1] * b[0] + a[3] * b[1],
    a[0] * b[2] + a[2] * b[3],
    a[1] * b[2] + a[3] * b[3],
    a[0] * b[4] + a[2] * b[5] + a[4],
    a[1] * b[4] + a[3] * b[5] + a[5],
  ]
}

fn compose_transform_list(list: &[Transform]) -> [f32; 6] {
  let mut m = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
  for component in list {
    m = multiply(&m, &compose_transform(component));
  }
  m
}

fn lerp_matrix(a: &[f32; 6], b: &[f32; 6], t: f32) -> [f32; 6] {
  let mut m = [0.0; 6];
  for i in 0..6 {
    m[i] = lerp(a[i], b[i], t);
  }
  m
}

fn interpolate_transform_pair(a: &Transform, b: &Transform, t: f32) -> Option<Transform> {
  let next = match (a, b) {
    (Transform::Translate(ax, ay), Transform::Translate(bx, by)) => {
      Transform::Translate(lerp(*ax, *bx, t), lerp(*ay, *by, t))
    }
    (Transform::TranslateX(ax), Transform::TranslateX(bx)) => {
      Transform::TranslateX(lerp(*ax, *bx, t))
    }
    (Transform::TranslateY(ay), Transform::TranslateY(by)) => {
      Transform::TranslateY(lerp(*ay, *by, t))
    }
    (Transform::Scale(ax, ay), Transform::Scale(bx, by)) => {
      Transform::Scale(lerp(*ax, *bx, t), lerp(*ay, *by, t))
    }
    (Transform::Rotate(ad), Transform::Rotate(bd)) => Transform::Rotate(lerp(*ad, *bd, t)),
    (Transform::Skew(ax, ay), Transform::Skew(bx, by)) => {
      Transform::Skew(lerp(*ax, *bx, t), lerp(*ay, *by, t))
    }
    (Transform::Matrix(ma), Transform::Matrix(mb)) => Transform::Matrix(lerp_matrix(ma, mb, t)),
    _ => return None,
  };
  Some(next)
}

fn interpolate_transform_lists(a: &[Transform], b: &[Transform], t: f32) -> Vec<Transform> {
  if a.len() == b.len() {
    let mut out = Vec::with_capacity(a.len());
    let mut matched = true;
    for (ta, tb) in a.iter().zip(b.iter()) {
      match interpolate_transform_pair(ta, tb, t) {
        Some(next) => out.push(next),
        None => {
          matched = false;
          break;
        }
      }
    }
    if matched {
      return out;
    }
  }
  // Structure mismatch: collapse both sides to a matrix and blend that.
  let ma = compose_transform_list(a);
  let mb = compose_transform_list(b);
  vec![Transform::Matrix(lerp_matrix(&ma, &mb, t))]
}

/// Interpolates between two computed values at progress `t`, or `None` when
/// the pair has no smooth interpolation (discrete by default).
pub fn interpolate(a: &PropertyValue, b: &PropertyValue, t: f32) -> Option<PropertyValue> {
  match (a, b) {
    (PropertyValue::Number(x), PropertyValue::Number(y)) => {
      Some(PropertyValue::Number(lerp(*x, *y, t)))
    }
    (PropertyValue::Px(x), PropertyValue::Px(y)) => Some(PropertyValue::Px(lerp(*x, *y, t))),
    (PropertyValue::Percent(x), PropertyValue::Percent(y)) => {
      Some(PropertyValue::Percent(lerp(*x, *y, t)))
    }
    (PropertyValue::Color(x), PropertyValue::Color(y)) => {
      Some(PropertyValue::Color(lerp_color(*x, *y, t)))
    }
    (PropertyValue::Transform(x), PropertyValue::Transform(y)) => Some(PropertyValue::Transform(
      interpolate_transform_lists(x, y, t),
    )),
    _ => None,
  }
}

/// Flips a discrete pair at the 50% boundary, per the CSS rules for
/// `transition-behavior: allow-discrete`.
pub fn interpolate_discrete(a: &PropertyValue, b: &PropertyValue, t: f32) -> PropertyValue {
  if t < 0.5 {
    a.clone()
  } else {
    b.clone()
  }
}

/// Composites `value` onto `underlying` for additive keyframes. Values with
/// no additive behavior replace the underlying value.
pub fn composite_add(underlying: &PropertyValue, value: &PropertyValue) -> PropertyValue {
  match (underlying, value) {
    (PropertyValue::Number(u), PropertyValue::Number(v)) => PropertyValue::Number(u + v),
    (PropertyValue::Px(u), PropertyValue::Px(v)) => PropertyValue::Px(u + v),
    (PropertyValue::Percent(u), PropertyValue::Percent(v)) => PropertyValue::Percent(u + v),
    (PropertyValue::Transform(u), PropertyValue::Transform(v)) => {
      let mut list = u.clone();
      list.extend(v.iter().copied());
      PropertyValue::Transform(list)
    }
    _ => value.clone(),
  }
}
