//! Route construction: nearest-neighbor ordering with obstacle fallback.

use skyfleet_domain::geo::{distance, route_intersects_any_obstacle, Coordinate, Obstacle};

/// Build an ordered route from `start` through every destination and back
/// to `start`.
///
/// Destinations are visited in nearest-neighbor order (ties broken by
/// input order). If any vertex of the resulting route falls inside an
/// obstacle, the route degrades to plain input order without further
/// obstacle checking. The fallback is best-effort, not a guaranteed
/// obstacle-free path. Obstacles are tested against vertices only, so a
/// segment may still cross an exclusion zone.
#[must_use]
pub fn plan_route(
    start: Coordinate,
    destinations: &[Coordinate],
    obstacles: &[Obstacle],
) -> Vec<Coordinate> {
    if destinations.is_empty() {
        return vec![start, start];
    }
    if destinations.len() == 1 {
        return vec![start, destinations[0], start];
    }

    let mut route = Vec::with_capacity(destinations.len() + 2);
    route.push(start);

    let mut unvisited = destinations.to_vec();
    let mut current = start;

    while !unvisited.is_empty() {
        let mut nearest = 0;
        let mut nearest_distance = distance(current, unvisited[0]);
        for (i, point) in unvisited.iter().enumerate().skip(1) {
            let d = distance(current, *point);
            if d < nearest_distance {
                nearest_distance = d;
                nearest = i;
            }
        }
        let next = unvisited.remove(nearest);
        route.push(next);
        current = next;
    }

    route.push(start);

    if route_intersects_any_obstacle(&route, obstacles) {
        let mut fallback = Vec::with_capacity(destinations.len() + 2);
        fallback.push(start);
        fallback.extend_from_slice(destinations);
        fallback.push(start);
        return fallback;
    }

    route
}
