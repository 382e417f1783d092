mod color;

pub use color::Color;

use std::fmt;

use crate::math::Point3;

slotmap::new_key_type! {
    /// Opaque handle to a figure owned by a render back end.
    pub struct FigureId;
}

/// The four primitive kinds a back end knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FigureKind {
    /// A sphere drawn for a particle.
    Ball,
    /// A link drawn between two ball figures.
    Bond,
    /// A line segment (cell edges, user lines).
    Line,
    /// A filled triangle (cutting-plane cross-sections).
    Triangle,
}

impl fmt::Display for FigureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ball => "ball",
            Self::Bond => "bond",
            Self::Line => "line",
            Self::Triangle => "triangle",
        };
        f.write_str(name)
    }
}

/// Geometry of a figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FigureShape {
    /// Sphere at `center` with the given diameter.
    Ball { center: Point3, diameter: f64 },
    /// Link between two ball figures; follows them as they move.
    Bond { a: FigureId, b: FigureId },
    /// Straight segment.
    Line { start: Point3, end: Point3 },
    /// Triangle with vertices in drawing order.
    Triangle { vertices: [Point3; 3] },
}

impl FigureShape {
    /// Returns the kind of primitive this shape describes.
    #[must_use]
    pub fn kind(&self) -> FigureKind {
        match self {
            Self::Ball { .. } => FigureKind::Ball,
            Self::Bond { .. } => FigureKind::Bond,
            Self::Line { .. } => FigureKind::Line,
            Self::Triangle { .. } => FigureKind::Triangle,
        }
    }
}

/// A renderable primitive as handed to a back end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Figure {
    /// What to draw.
    pub shape: FigureShape,
    /// Fill or stroke color.
    pub color: Color,
    /// Hidden figures stay allocated but are skipped when drawing.
    pub drawable: bool,
}

impl Figure {
    /// Creates a drawable ball figure.
    #[must_use]
    pub fn ball(center: Point3, diameter: f64, color: Color) -> Self {
        Self::new(FigureShape::Ball { center, diameter }, color)
    }

    /// Creates a drawable bond figure between two ball figures.
    #[must_use]
    pub fn bond(a: FigureId, b: FigureId, color: Color) -> Self {
        Self::new(FigureShape::Bond { a, b }, color)
    }

    /// Creates a drawable line figure.
    #[must_use]
    pub fn line(start: Point3, end: Point3, color: Color) -> Self {
        Self::new(FigureShape::Line { start, end }, color)
    }

    /// Creates a drawable triangle figure.
    #[must_use]
    pub fn triangle(vertices: [Point3; 3], color: Color) -> Self {
        Self::new(FigureShape::Triangle { vertices }, color)
    }

    fn new(shape: FigureShape, color: Color) -> Self {
        Self {
            shape,
            color,
            drawable: true,
        }
    }

    /// Returns the kind of this figure.
    #[must_use]
    pub fn kind(&self) -> FigureKind {
        self.shape.kind()
    }
}

/// A per-frame change pushed to an existing figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FigureUpdate {
    /// Move and resize a ball, and recolor it.
    Ball {
        center: Point3,
        diameter: f64,
        color: Color,
    },
    /// Move the endpoints of a line.
    Line { start: Point3, end: Point3 },
    /// Overwrite the vertices of a triangle.
    Triangle { vertices: [Point3; 3] },
    /// Recolor any figure.
    Color(Color),
}

impl FigureUpdate {
    /// The figure kind this update applies to, or `None` if it applies to all.
    #[must_use]
    pub fn target_kind(&self) -> Option<FigureKind> {
        match self {
            Self::Ball { .. } => Some(FigureKind::Ball),
            Self::Line { .. } => Some(FigureKind::Line),
            Self::Triangle { .. } => Some(FigureKind::Triangle),
            Self::Color(_) => None,
        }
    }
}
