//! Actors: positionable, paintable nodes of the scene graph.
//!
//! Actors live in a [`Stage`](crate::stage::Stage)-owned arena and are
//! addressed by generational [`ActorId`]s. Holding an id never keeps an
//! actor alive; after destruction the id simply stops resolving, which is
//! the post-destroy nullification contract external observers rely on.
//!
//! Variant actor kinds are a tagged enum ([`ActorKind`]) rather than a
//! class hierarchy; embedder-defined kinds hang off the `Content`
//! capability trait.

use std::any::Any;

use slotmap::new_key_type;
use smallvec::SmallVec;
use troupe_core::{
    Color, Point, PropertyError, PropertyKind, PropertyTarget, PropertyValue, Rect, Size, Vec2,
};

use crate::modifier::{Action, Constraint, Effect};

new_key_type! {
    /// Generational handle to an actor in a stage's arena
    pub struct ActorId;
}

/// Embedder-defined actor content.
///
/// The paint backend receives the content by reference and may downcast
/// through `as_any` to reach its concrete type.
pub trait Content {
    /// Preferred size, if the content has one
    fn natural_size(&self) -> Option<Size> {
        None
    }

    /// Refine hit testing within the actor's bounds.
    ///
    /// `local` is in the actor's coordinate space; the default accepts the
    /// whole allocation.
    fn hit(&self, _local: Point, _size: Size) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any;
}

/// What an actor paints
pub enum ActorKind {
    /// Pure container; paints nothing and is transparent to picking
    Group,
    /// A solid-colored rectangle covering the actor's allocation
    Rectangle { color: Color },
    /// Embedder-defined content
    Content(Box<dyn Content>),
}

impl ActorKind {
    /// Whether a local-space point hits this kind
    pub(crate) fn hit(&self, local: Point, size: Size) -> bool {
        match self {
            ActorKind::Group => false,
            ActorKind::Rectangle { .. } => true,
            ActorKind::Content(content) => content.hit(local, size),
        }
    }
}

impl std::fmt::Debug for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorKind::Group => write!(f, "Group"),
            ActorKind::Rectangle { color } => write!(f, "Rectangle({color:?})"),
            ActorKind::Content(_) => write!(f, "Content"),
        }
    }
}

/// A node of the scene graph.
///
/// Constructed with the builder methods and inserted into a stage via
/// [`Stage::create_actor`](crate::stage::Stage::create_actor); all further
/// mutation goes through the stage so repaints are scheduled.
pub struct Actor {
    pub(crate) name: Option<String>,
    pub(crate) kind: ActorKind,
    pub(crate) parent: Option<ActorId>,
    pub(crate) children: SmallVec<[ActorId; 4]>,
    pub(crate) position: Point,
    pub(crate) size: Size,
    pub(crate) depth: f32,
    pub(crate) scale: Vec2,
    pub(crate) rotation: f32,
    pub(crate) anchor: Point,
    pub(crate) opacity: u8,
    pub(crate) visible: bool,
    pub(crate) reactive: bool,
    pub(crate) clip: Option<Rect>,
    pub(crate) actions: Vec<Box<dyn Action>>,
    pub(crate) constraints: Vec<Box<dyn Constraint>>,
    pub(crate) effects: Vec<Box<dyn Effect>>,
}

impl Actor {
    pub fn new(kind: ActorKind) -> Self {
        let size = match &kind {
            ActorKind::Content(content) => content.natural_size().unwrap_or(Size::ZERO),
            _ => Size::ZERO,
        };
        Self {
            name: None,
            kind,
            parent: None,
            children: SmallVec::new(),
            position: Point::ZERO,
            size,
            depth: 0.0,
            scale: Vec2::ONE,
            rotation: 0.0,
            anchor: Point::ZERO,
            opacity: 255,
            visible: true,
            reactive: false,
            clip: None,
            actions: Vec::new(),
            constraints: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// A pure container actor
    pub fn group() -> Self {
        Self::new(ActorKind::Group)
    }

    /// A solid-colored rectangle actor
    pub fn rectangle(color: Color) -> Self {
        Self::new(ActorKind::Rectangle { color })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Builders
    // ─────────────────────────────────────────────────────────────────────

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Size::new(width, height);
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_scale(mut self, sx: f32, sy: f32) -> Self {
        self.scale = Vec2::new(sx, sy);
        self
    }

    /// Rotation in radians about the anchor point
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_anchor(mut self, x: f32, y: f32) -> Self {
        self.anchor = Point::new(x, y);
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    /// Eligible for hit testing and input dispatch
    pub fn reactive(mut self) -> Self {
        self.reactive = true;
        self
    }

    pub fn with_clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &ActorKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<ActorId> {
        self.parent
    }

    /// Children in insertion (sibling) order
    pub fn children(&self) -> &[ActorId] {
        &self.children
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_reactive(&self) -> bool {
        self.reactive
    }

    pub fn clip(&self) -> Option<Rect> {
        self.clip
    }
}

impl PropertyTarget for Actor {
    fn property(&self, key: &str) -> std::result::Result<PropertyValue, PropertyError> {
        match key {
            "x" => Ok(self.position.x.into()),
            "y" => Ok(self.position.y.into()),
            "width" => Ok(self.size.width.into()),
            "height" => Ok(self.size.height.into()),
            "depth" => Ok(self.depth.into()),
            "scale-x" => Ok(self.scale.x.into()),
            "scale-y" => Ok(self.scale.y.into()),
            "rotation" => Ok(self.rotation.into()),
            "anchor-x" => Ok(self.anchor.x.into()),
            "anchor-y" => Ok(self.anchor.y.into()),
            "opacity" => Ok(PropertyValue::Float(self.opacity as f32)),
            "visible" => Ok(self.visible.into()),
            "reactive" => Ok(self.reactive.into()),
            "color" => match &self.kind {
                ActorKind::Rectangle { color } => Ok((*color).into()),
                _ => Err(PropertyError::UnknownProperty(key.to_owned())),
            },
            _ => Err(PropertyError::UnknownProperty(key.to_owned())),
        }
    }

    fn set_property(
        &mut self,
        key: &str,
        value: PropertyValue,
    ) -> std::result::Result<(), PropertyError> {
        let mismatch = |expected: PropertyKind| PropertyError::TypeMismatch {
            key: key.to_owned(),
            expected,
            got: value.kind(),
        };
        match key {
            "x" | "y" | "width" | "height" | "depth" | "scale-x" | "scale-y" | "rotation"
            | "anchor-x" | "anchor-y" | "opacity" => {
                let v = value.as_float().ok_or_else(|| mismatch(PropertyKind::Float))?;
                match key {
                    "x" => self.position.x = v,
                    "y" => self.position.y = v,
                    "width" => self.size.width = v,
                    "height" => self.size.height = v,
                    "depth" => self.depth = v,
                    "scale-x" => self.scale.x = v,
                    "scale-y" => self.scale.y = v,
                    "rotation" => self.rotation = v,
                    "anchor-x" => self.anchor.x = v,
                    "anchor-y" => self.anchor.y = v,
                    "opacity" => self.opacity = v.round().clamp(0.0, 255.0) as u8,
                    _ => unreachable!(),
                }
                Ok(())
            }
            "visible" | "reactive" => {
                let v = value.as_bool().ok_or_else(|| mismatch(PropertyKind::Bool))?;
                match key {
                    "visible" => self.visible = v,
                    "reactive" => self.reactive = v,
                    _ => unreachable!(),
                }
                Ok(())
            }
            "color" => match &mut self.kind {
                ActorKind::Rectangle { color } => {
                    *color = value.as_color().ok_or_else(|| mismatch(PropertyKind::Color))?;
                    Ok(())
                }
                _ => Err(PropertyError::UnknownProperty(key.to_owned())),
            },
            _ => Err(PropertyError::UnknownProperty(key.to_owned())),
        }
    }
}
