//! Geometry primitives: points, obstacles, and distance helpers.
//!
//! All coordinates live in an abstract 2D plane; "km" is nominal and no
//! unit conversion happens anywhere in the engine.

use serde::{Deserialize, Serialize};

/// A point in the abstract 2D plane. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both components are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A circular exclusion zone. A point on the boundary counts as inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub location: Coordinate,
    pub radius: f64,
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Whether `point` lies inside `obstacle` (boundary inclusive).
#[must_use]
pub fn is_inside_obstacle(point: Coordinate, obstacle: &Obstacle) -> bool {
    distance(point, obstacle.location) <= obstacle.radius
}

/// Total length of a route: sum of consecutive segment lengths.
/// Routes with fewer than two points have length zero.
#[must_use]
pub fn route_distance(points: &[Coordinate]) -> f64 {
    points.windows(2).map(|pair| distance(pair[0], pair[1])).sum()
}

/// Whether any route *vertex* lies inside any obstacle.
///
/// Only vertices are checked, not the segments between them; a segment may
/// still cross an obstacle undetected. This is a deliberate approximation,
/// not true segment-circle intersection.
#[must_use]
pub fn route_intersects_any_obstacle(points: &[Coordinate], obstacles: &[Obstacle]) -> bool {
    points
        .iter()
        .any(|point| obstacles.iter().any(|obstacle| is_inside_obstacle(*point, obstacle)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_three_four_five() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(3.0, 4.0);
        assert_eq!(distance(a, b), 5.0);
    }

    #[test]
    fn test_distance_zero_for_equal_points() {
        let p = Coordinate::new(5.0, 5.0);
        assert_eq!(distance(p, p), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Coordinate::new(-5.0, -5.0);
        let b = Coordinate::new(5.0, 5.0);
        assert_eq!(distance(a, b), distance(b, a));
        assert!((distance(a, b) - 14.14).abs() < 0.01);
    }

    #[test]
    fn test_obstacle_boundary_inclusive() {
        let obstacle = Obstacle {
            location: Coordinate::new(0.0, 0.0),
            radius: 5.0,
        };
        assert!(is_inside_obstacle(Coordinate::new(5.0, 0.0), &obstacle));
        assert!(is_inside_obstacle(Coordinate::new(0.0, 0.0), &obstacle));
        assert!(!is_inside_obstacle(Coordinate::new(5.01, 0.0), &obstacle));
    }

    #[test]
    fn test_route_distance() {
        let route = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(3.0, 4.0),
            Coordinate::new(3.0, 0.0),
        ];
        assert_eq!(route_distance(&route), 9.0);
        assert_eq!(route_distance(&route[..1]), 0.0);
        assert_eq!(route_distance(&[]), 0.0);
    }

    #[test]
    fn test_route_obstacle_check_uses_vertices() {
        let obstacles = [Obstacle {
            location: Coordinate::new(5.0, 0.0),
            radius: 1.0,
        }];
        // Segment crosses the obstacle but no vertex is inside it.
        let crossing = [Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 0.0)];
        assert!(!route_intersects_any_obstacle(&crossing, &obstacles));

        let touching = [Coordinate::new(0.0, 0.0), Coordinate::new(5.0, 1.0)];
        assert!(route_intersects_any_obstacle(&touching, &obstacles));
    }
}
