// src/triangulation.rs
//! Инкрементальная триангуляция Делоне (Bowyer–Watson) по точкам берега и
//! случайным внутренним точкам, связывание соседних треугольников и отбор
//! треугольников суши.

use crate::error::{GenerationError, TopologyError};
use crate::geometry::{Point, Polygon, Triangle, point_in_polygon};
use rand::Rng;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Во сколько раз сигнальный треугольник больше ограничивающего прямоугольника.
const SENTINEL_SCALE: f64 = 50.0;

/// Треугольник триангуляции: индексы вершин в общем массиве точек и геометрия.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub ids: [usize; 3],
    pub shape: Triangle,
}

impl Face {
    fn new(ids: [usize; 3], points: &[Point]) -> Result<Self, TopologyError> {
        let shape = Triangle::new(points[ids[0]], points[ids[1]], points[ids[2]])?;
        Ok(Self { ids, shape })
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.ids;
        [(a, b), (b, c), (c, a)]
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Треугольники суши с симметричной смежностью по общим рёбрам.
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    pub triangles: Vec<Triangle>,
    pub adjacency: Vec<BTreeSet<usize>>,
}

impl Triangulation {
    #[must_use]
    pub fn land_area(&self) -> f64 {
        self.triangles.iter().map(Triangle::area).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Лежит ли точка внутри хотя бы одного кольца суши.
#[must_use]
pub fn is_on_land(p: Point, landmass: &[Polygon]) -> bool {
    landmass.iter().any(|ring| point_in_polygon(p, ring.vertices()))
}

/// Случайные точки внутри суши: равномерно по карте с отбраковкой.
pub fn place_seed_points<R: Rng>(
    rng: &mut R,
    landmass: &[Polygon],
    width: f64,
    height: f64,
    count: usize,
    max_attempts: usize,
) -> Result<Vec<Point>, GenerationError> {
    let mut points = Vec::with_capacity(count);
    for index in 0..count {
        let placed = (0..max_attempts)
            .map(|_| Point::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height)))
            .find(|&p| is_on_land(p, landmass));
        match placed {
            Some(p) => points.push(p),
            None => {
                return Err(GenerationError::SeedPlacementExhausted {
                    index,
                    attempts: max_attempts,
                });
            }
        }
    }
    Ok(points)
}

/// Триангуляция Делоне набора точек. Индексы в `Face::ids` ссылаются на `points`.
///
/// Точки должны быть попарно различны; совпадающие точки дают вырожденный
/// треугольник и ошибку.
pub fn bowyer_watson(points: &[Point]) -> Result<Vec<Face>, TopologyError> {
    let n = points.len();
    if n < 3 {
        return Ok(Vec::new());
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let delta = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid = Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);

    let mut arena = points.to_vec();
    arena.push(Point::new(mid.x - SENTINEL_SCALE * delta, mid.y - delta));
    arena.push(Point::new(mid.x + SENTINEL_SCALE * delta, mid.y - delta));
    arena.push(Point::new(mid.x, mid.y + SENTINEL_SCALE * delta));

    let mut faces = vec![Face::new([n, n + 1, n + 2], &arena)?];

    for (index, &p) in points.iter().enumerate() {
        let (bad, good): (Vec<Face>, Vec<Face>) =
            faces.into_iter().partition(|f| f.shape.circumcircle_contains(p));

        // граница полости состоит из рёбер, которые встречаются ровно в одном плохом треугольнике
        let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
        for face in &bad {
            for (a, b) in face.edges() {
                *edge_count.entry(edge_key(a, b)).or_insert(0) += 1;
            }
        }

        faces = good;
        for face in &bad {
            for (a, b) in face.edges() {
                if edge_count[&edge_key(a, b)] == 1 {
                    faces.push(Face::new([a, b, index], &arena)?);
                }
            }
        }
    }

    faces.retain(|f| f.ids.iter().all(|&v| v < n));
    Ok(faces)
}

/// Смежность треугольников: соседи имеют общее ребро.
#[must_use]
pub fn link_adjacent(faces: &[Face]) -> Vec<BTreeSet<usize>> {
    let mut by_edge: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (t, face) in faces.iter().enumerate() {
        for (a, b) in face.edges() {
            by_edge.entry(edge_key(a, b)).or_default().push(t);
        }
    }

    let mut adjacency = vec![BTreeSet::new(); faces.len()];
    for owners in by_edge.values() {
        for (i, &t) in owners.iter().enumerate() {
            for &u in &owners[i + 1..] {
                adjacency[t].insert(u);
                adjacency[u].insert(t);
            }
        }
    }
    adjacency
}

/// Полный этап триангуляции: точки колец + внутренние точки, затем отбор
/// треугольников, чей центроид лежит на суше.
pub fn triangulate_land(landmass: &[Polygon], seed_points: &[Point]) -> Result<Triangulation, GenerationError> {
    let mut seen = HashSet::new();
    let points: Vec<Point> = landmass
        .iter()
        .flat_map(|ring| ring.vertices().iter().copied())
        .chain(seed_points.iter().copied())
        .filter(|p| seen.insert((p.x.to_bits(), p.y.to_bits())))
        .collect();

    let faces = bowyer_watson(&points)?;
    let adjacency = link_adjacent(&faces);

    let mut remap = vec![None; faces.len()];
    let mut triangles = Vec::new();
    for (t, face) in faces.iter().enumerate() {
        if is_on_land(face.shape.centroid, landmass) {
            remap[t] = Some(triangles.len());
            triangles.push(face.shape);
        }
    }

    let adjacency: Vec<BTreeSet<usize>> = faces
        .iter()
        .enumerate()
        .filter(|&(t, _)| remap[t].is_some())
        .map(|(t, _)| adjacency[t].iter().filter_map(|&u| remap[u]).collect())
        .collect();

    tracing::debug!(
        target: "countrygen::triangulation",
        points = points.len(),
        triangles = faces.len(),
        land_triangles = triangles.len(),
        "triangulation.built"
    );

    Ok(Triangulation { triangles, adjacency })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::signed_area;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn convex_sample() -> Vec<Point> {
        vec![
            p(0.0, 0.0),
            p(4.0, 0.3),
            p(6.0, 2.5),
            p(5.0, 5.2),
            p(1.2, 6.0),
            p(-1.5, 3.0),
            p(2.0, 2.2),
            p(3.1, 3.4),
        ]
    }

    #[test]
    fn square_with_center_gives_four_triangles() {
        let points = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(0.5, 0.5)];
        let faces = bowyer_watson(&points).unwrap();
        assert_eq!(faces.len(), 4);
        let area: f64 = faces.iter().map(|f| f.shape.area()).sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-12);
        assert!(faces.iter().all(|f| f.ids.contains(&4)));
    }

    #[test]
    fn triangulation_covers_convex_hull_and_is_delaunay() {
        let points = convex_sample();
        let faces = bowyer_watson(&points).unwrap();

        let hull_area = signed_area(&points[..6]).abs();
        let area: f64 = faces.iter().map(|f| f.shape.area()).sum();
        assert_relative_eq!(area, hull_area, epsilon = 1e-9);

        for face in &faces {
            for (i, q) in points.iter().enumerate() {
                if face.ids.contains(&i) {
                    continue;
                }
                let d = q.distance_sq(face.shape.circumcenter);
                assert!(d >= face.shape.circumradius_sq - 1e-9, "point {i} inside circumcircle");
            }
        }
    }

    #[test]
    fn adjacency_is_symmetric_and_shares_an_edge() {
        let faces = bowyer_watson(&convex_sample()).unwrap();
        let adjacency = link_adjacent(&faces);
        for (t, neighbours) in adjacency.iter().enumerate() {
            assert!(neighbours.len() <= 3);
            for &u in neighbours {
                assert!(adjacency[u].contains(&t));
                let shared = faces[t].ids.iter().filter(|v| faces[u].ids.contains(v)).count();
                assert_eq!(shared, 2);
            }
        }
    }

    #[test]
    fn duplicate_input_points_are_dropped_before_insertion() {
        let ring = Polygon::new(convex_sample()[..6].to_vec());
        let seeds = vec![p(2.0, 2.2), p(2.0, 2.2), p(3.1, 3.4)];
        let tri = triangulate_land(&[ring.clone()], &seeds).unwrap();
        assert!(!tri.is_empty());
        assert_relative_eq!(tri.land_area(), ring.area(), epsilon = 1e-9);
    }

    #[test]
    fn only_land_triangles_are_kept() {
        // вогнутая «подкова»: часть треугольников оболочки лежит в воде
        let ring = Polygon::new(vec![
            p(0.0, 0.0),
            p(6.0, 0.1),
            p(6.2, 6.0),
            p(4.1, 6.1),
            p(4.0, 2.0),
            p(2.1, 2.1),
            p(2.0, 6.2),
            p(-0.1, 6.0),
        ]);
        let tri = triangulate_land(std::slice::from_ref(&ring), &[p(1.0, 1.0), p(5.1, 1.2)]).unwrap();

        for t in &tri.triangles {
            assert!(point_in_polygon(t.centroid, ring.vertices()));
        }
        for (t, neighbours) in tri.adjacency.iter().enumerate() {
            for &u in neighbours {
                assert!(tri.adjacency[u].contains(&t));
            }
        }
        assert!(!tri.is_empty());
    }

    #[test]
    fn seed_points_land_inside_the_landmass() {
        let ring = Polygon::new(vec![p(10.0, 10.0), p(90.0, 12.0), p(80.0, 85.0), p(15.0, 70.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let points = place_seed_points(&mut rng, std::slice::from_ref(&ring), 100.0, 100.0, 50, 1000).unwrap();
        assert_eq!(points.len(), 50);
        assert!(points.iter().all(|&q| point_in_polygon(q, ring.vertices())));
    }

    #[test]
    fn seed_placement_gives_up_after_bounded_attempts() {
        let far_away = Polygon::new(vec![p(1000.0, 1000.0), p(1001.0, 1000.0), p(1001.0, 1001.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = place_seed_points(&mut rng, &[far_away], 10.0, 10.0, 3, 25).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::SeedPlacementExhausted { index: 0, attempts: 25 }
        ));
    }
}
