use crate::figure::Color;
use crate::math::{Aabb, Point3};

/// Display settings consumed by the scene driver each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    /// Number of periodic image shells drawn around the cell.
    pub image_shells: u32,
    /// Draw overflow images of particles that cross a periodic face.
    pub draw_overflow: bool,
    /// Draw the cell edges.
    pub show_boundary: bool,
    /// Particles outside this box are hidden and cell edges are clamped
    /// into it. `None` disables the check.
    pub display_bounds: Option<Aabb>,
    /// Color of the cell edges.
    pub boundary_color: Color,
    /// Color of cutting-plane cross-sections.
    pub plane_color: Color,
    /// Color of user line segments.
    pub line_color: Color,
    /// Diameter used for particles whose type does not define one.
    pub default_diameter: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            image_shells: 0,
            draw_overflow: false,
            show_boundary: true,
            display_bounds: None,
            boundary_color: Color::WHITE,
            plane_color: Color::YELLOW.translucent(0.5),
            line_color: Color::WHITE,
            default_diameter: 1.0,
        }
    }
}

impl SceneConfig {
    /// Returns `true` if `position` passes the display-bounds check.
    #[must_use]
    pub fn in_bounds(&self, position: &Point3) -> bool {
        self.display_bounds.map_or(true, |b| b.contains(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    #[test]
    fn defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.image_shells, 0);
        assert!(!config.draw_overflow);
        assert!(config.show_boundary);
        assert!(config.plane_color.is_translucent());
        assert!(config.in_bounds(&Point3::new(1e9, 0.0, 0.0)));
    }

    #[test]
    fn display_bounds_filter() {
        let config = SceneConfig {
            display_bounds: Some(Aabb::centered(&Vector3::repeat(2.0))),
            ..SceneConfig::default()
        };
        assert!(config.in_bounds(&Point3::new(0.5, -1.0, 1.0)));
        assert!(!config.in_bounds(&Point3::new(0.0, 0.0, 1.5)));
    }
}
