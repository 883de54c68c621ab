//! Troupe Core
//!
//! Foundational types shared by the Troupe scene-graph toolkit:
//!
//! - **Geometry**: points, sizes, rectangles, colors
//! - **Transforms**: 2D affine transforms with anchor-relative composition
//! - **Properties**: typed property values addressed by opaque string keys
//! - **Events**: input event payloads and observer-list dispatch
//!
//! The crate is deliberately small; everything stateful (actors, stages,
//! timelines) lives in `troupe_scene` and `troupe_animation` on top of
//! these primitives.

pub mod event;
pub mod geometry;
pub mod property;
pub mod transform;

pub use event::{HandlerId, Handlers, InputEvent, PointerButton};
pub use geometry::{Color, Point, Rect, Size, Vec2};
pub use property::{PropertyError, PropertyKind, PropertyTarget, PropertyValue};
pub use transform::Affine2D;
