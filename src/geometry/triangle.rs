use super::Point;
use crate::error::TopologyError;
use serde::Serialize;

/// Треугольник с описанной окружностью. Чистое значение: смежность хранится
/// в триангуляции по индексам.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Triangle {
    pub vertices: [Point; 3],
    pub circumcenter: Point,
    pub circumradius_sq: f64,
    pub centroid: Point,
}

impl Triangle {
    /// Строит треугольник. Нулевой определитель (коллинеарные вершины)
    /// считается ошибкой топологии.
    pub fn new(a: Point, b: Point, c: Point) -> Result<Self, TopologyError> {
        let circumcenter = circumcenter(a, b, c).ok_or(TopologyError::DegenerateTriangle { a, b, c })?;
        Ok(Self {
            vertices: [a, b, c],
            circumcenter,
            circumradius_sq: circumcenter.distance_sq(a),
            centroid: Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0),
        })
    }

    /// Лежит ли точка внутри описанной окружности (граница включается).
    #[inline]
    #[must_use]
    pub fn circumcircle_contains(&self, p: Point) -> bool {
        p.distance_sq(self.circumcenter) <= self.circumradius_sq
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        let [a, b, c] = self.vertices;
        ((b - a).cross(c - a) / 2.0).abs()
    }
}

/// Центр описанной окружности через определитель серединных перпендикуляров.
fn circumcenter(a: Point, b: Point, c: Point) -> Option<Point> {
    let d = (a.x - c.x) * (b.y - c.y) - (b.x - c.x) * (a.y - c.y);
    if d == 0.0 {
        return None;
    }

    let ha = ((a.x - c.x) * (a.x + c.x) + (a.y - c.y) * (a.y + c.y)) / 2.0;
    let hb = ((b.x - c.x) * (b.x + c.x) + (b.y - c.y) * (b.y + c.y)) / 2.0;

    let x = (ha * (b.y - c.y) - hb * (a.y - c.y)) / d;
    let y = (hb * (a.x - c.x) - ha * (b.x - c.x)) / d;
    Some(Point::new(x, y))
}
