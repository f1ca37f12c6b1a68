// src/geometry/mod.rs
//! Геометрические примитивы: точки, треугольники, полигоны и предикаты над ними.

pub mod point;
pub mod polygon;
pub mod ring;
pub mod triangle;

pub use point::Point;
pub use polygon::{AdjacencyInfo, Polygon};
pub use triangle::Triangle;

/// Результат пересечения двух отрезков.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentIntersection {
    /// Отрезки не пересекаются (в том числе параллельны).
    None,
    /// Одна общая точка.
    Crossing(Point),
    /// Отрезки лежат на одной прямой и перекрываются.
    Overlap,
}

impl SegmentIntersection {
    #[must_use]
    pub fn intersects(self) -> bool {
        !matches!(self, SegmentIntersection::None)
    }
}

/// Параметрическое пересечение отрезков `a1-a2` и `b1-b2`.
#[must_use]
pub fn segment_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> SegmentIntersection {
    let r = a2 - a1;
    let s = b2 - b1;
    let qp = b1 - a1;
    let denom = r.cross(s);

    if denom == 0.0 {
        if qp.cross(r) != 0.0 {
            // параллельны, но не на одной прямой
            return SegmentIntersection::None;
        }
        let rr = r.dot(r);
        if rr == 0.0 {
            return SegmentIntersection::None;
        }
        let t0 = qp.dot(r) / rr;
        let t1 = t0 + s.dot(r) / rr;
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        return if hi >= 0.0 && lo <= 1.0 {
            SegmentIntersection::Overlap
        } else {
            SegmentIntersection::None
        };
    }

    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        SegmentIntersection::Crossing(a1 + r * t)
    } else {
        SegmentIntersection::None
    }
}

/// Лежит ли `p` слева от направленной прямой `a → b`.
#[inline]
#[must_use]
pub fn is_left_of(a: Point, b: Point, p: Point) -> bool {
    (b - a).cross(p - a) > 0.0
}

/// Ориентированная площадь кольца (формула шнурования).
#[must_use]
pub fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in ring.iter().enumerate() {
        let q = ring[(i + 1) % ring.len()];
        sum += p.cross(q);
    }
    sum / 2.0
}

/// Проверка «точка в полигоне» по правилу чёт-нечет.
#[must_use]
pub fn point_in_polygon(p: Point, ring: &[Point]) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for (i, a) in ring.iter().enumerate() {
        let b = ring[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Расстояние от точки до отрезка.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Середина ограничивающего прямоугольника набора точек.
#[must_use]
pub fn bounding_box_center(points: &[Point]) -> Point {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if points.is_empty() {
        return Point::default();
    }
    Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
}

/// Есть ли у кольца пересекающиеся несмежные рёбра (включая замыкающее).
#[must_use]
pub fn ring_is_simple(ring: &[Point]) -> bool {
    find_crossing(ring).is_none()
}

/// Первая пара несмежных пересекающихся рёбер `(i, j)`, `i < j`, где ребро `k`
/// идёт от `ring[k]` к `ring[(k + 1) % n]`.
#[must_use]
pub fn find_crossing(ring: &[Point]) -> Option<(usize, usize)> {
    let n = ring.len();
    if n < 4 {
        return None;
    }
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                // смежны через замыкание
                continue;
            }
            let hit = segment_intersection(ring[i], ring[(i + 1) % n], ring[j], ring[(j + 1) % n]);
            if hit.intersects() {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ]
    }

    #[test]
    fn crossing_segments_meet_at_a_point() {
        let hit = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0),
        );
        assert_eq!(hit, SegmentIntersection::Crossing(Point::new(1.0, 1.0)));
    }

    #[test]
    fn parallel_and_collinear_cases_are_distinguished() {
        let parallel = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(2.0, 1.0),
        );
        assert_eq!(parallel, SegmentIntersection::None);

        let overlap = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(3.0, 0.0),
        );
        assert_eq!(overlap, SegmentIntersection::Overlap);

        let disjoint = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        );
        assert_eq!(disjoint, SegmentIntersection::None);
    }

    #[test]
    fn area_sign_follows_winding() {
        let mut ring = square();
        assert_relative_eq!(signed_area(&ring), 4.0);
        ring.reverse();
        assert_relative_eq!(signed_area(&ring), -4.0);
    }

    #[test]
    fn even_odd_point_in_polygon() {
        let ring = square();
        assert!(point_in_polygon(Point::new(1.0, 1.0), &ring));
        assert!(!point_in_polygon(Point::new(3.0, 1.0), &ring));
        assert!(!point_in_polygon(Point::new(-0.5, 1.0), &ring));
    }

    #[test]
    fn bow_tie_is_not_simple() {
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 2.0),
        ];
        assert_eq!(find_crossing(&ring), Some((0, 2)));
        assert!(ring_is_simple(&square()));
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(4.0, 0.0);
        assert_relative_eq!(distance_to_segment(Point::new(2.0, 3.0), a, b), 3.0);
        assert_relative_eq!(distance_to_segment(Point::new(7.0, 4.0), a, b), 5.0);
    }
}
