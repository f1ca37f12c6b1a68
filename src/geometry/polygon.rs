// src/geometry/polygon.rs
//! Полигон (кольцо вершин + площадь) и его слияние с соседом по общей границе.
//!
//! Слияние не пересчитывает площадь с нуля: площадь аддитивна, а кольцо
//! склеивается из двух частей по максимальной общей цепочке вершин.

use super::ring::{Direction, offset_index, rotate_ring_so_range_is_contiguous};
use super::{Point, signed_area};
use crate::error::TopologyError;
use serde::Serialize;

/// Общая граница двух полигонов: непрерывная цепочка общих вершин
/// (минимум две) и её суммарная длина.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjacencyInfo {
    vertices: Vec<Point>,
    length: f64,
}

impl AdjacencyInfo {
    #[must_use]
    pub fn new(vertices: Vec<Point>) -> Self {
        let length = vertices.windows(2).map(|w| w[0].distance(w[1])).sum();
        Self { vertices, length }
    }

    /// Общие вершины в порядке прямого обхода полигона, для которого
    /// вычислялась смежность.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Суммарная длина общих рёбер.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Общая цепочка в индексах: на `self` она идёт вперёд от `local_start`,
/// на другом полигоне от `other_start` в направлении `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SharedRun {
    local_start: usize,
    other_start: usize,
    direction: Direction,
    len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    vertices: Vec<Point>,
    area: f64,
}

impl Polygon {
    #[must_use]
    pub fn new(vertices: Vec<Point>) -> Self {
        let area = signed_area(&vertices).abs();
        Self { vertices, area }
    }

    /// Пустой полигон: при первом слиянии просто принимает вершины соседа.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            area: 0.0,
        }
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Кэшированная площадь (не пересчитывается при слиянии).
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Максимальная общая цепочка вершин с `other`, если полигоны смежны.
    ///
    /// Если цепочек несколько (сосед касается в двух местах), берётся самая
    /// длинная; при равной длине первая в порядке обхода `self`. Слияние по
    /// такой цепочке оставляет вторую общей: кольцо проходит её дважды и не
    /// является простым, пока район внутри петли не поглощён и встречные
    /// рёбра не схлопнулись в шипы.
    ///
    /// Цепочка, обошедшая кольцо целиком и вернувшаяся в свою первую вершину
    /// (кольцо соседа касается себя в этой вершине), обрезается до длины
    /// кольца: такой полигон поглощается целиком. Длина границы при этом
    /// считается по всем общим рёбрам.
    #[must_use]
    pub fn adjacency_info(&self, other: &Polygon) -> Option<AdjacencyInfo> {
        let cap = self.vertices.len().min(other.vertices.len());
        self.shared_runs(other)
            .into_iter()
            .map(|run| {
                let mut info = AdjacencyInfo::new(self.run_vertices(run));
                info.vertices.truncate(cap);
                info
            })
            .fold(None, |best: Option<AdjacencyInfo>, info| match best {
                Some(b) if b.length >= info.length => Some(b),
                _ => Some(info),
            })
    }

    /// Поглощает `other` по общей границе `info`.
    ///
    /// Внутренние вершины общей цепочки удаляются из обоих колец, остаток
    /// `other` вклеивается в разрыв так, чтобы сохранить направление обхода
    /// `self`. Площадь просто складывается.
    pub fn merge_with(&mut self, other: &Polygon, info: &AdjacencyInfo) -> Result<(), TopologyError> {
        if self.vertices.is_empty() {
            self.vertices.clone_from(&other.vertices);
            self.area = other.area;
            return Ok(());
        }

        let run = self.locate_run(other, info.vertices())?;
        let n = self.vertices.len();
        let m = other.vertices.len();
        let k = run.len;
        if k == n && k == m {
            return Err(TopologyError::IdenticalRings);
        }

        let mut local = std::mem::take(&mut self.vertices);
        let local_end = offset_index(run.local_start, n, k as isize - 1);
        rotate_ring_so_range_is_contiguous(&mut local, run.local_start, local_end, Direction::Forward);

        // конец цепочки, собственный остаток, начало цепочки
        let mut merged = local.split_off(k - 1);
        merged.push(local[0]);

        if k < m {
            // иначе `other` целиком окружён кольцом `self`: вклеивать нечего
            let mut remote = other.vertices.clone();
            let other_end = offset_index(run.other_start, m, (k as isize - 1) * run.direction.step());
            let range = rotate_ring_so_range_is_contiguous(&mut remote, run.other_start, other_end, run.direction);
            let mut rest = remote.split_off(range.end);
            if run.direction == Direction::Forward {
                rest.reverse();
            }
            merged.extend(rest);
        }

        remove_spikes(&mut merged);
        self.vertices = merged;
        self.area += other.area;
        Ok(())
    }

    fn run_vertices(&self, run: SharedRun) -> Vec<Point> {
        let n = self.vertices.len();
        (0..run.len)
            .map(|l| self.vertices[(run.local_start + l) % n])
            .collect()
    }

    /// Все максимальные общие цепочки, найденные по совпадающим рёбрам.
    fn shared_runs(&self, other: &Polygon) -> Vec<SharedRun> {
        let n = self.vertices.len();
        let m = other.vertices.len();
        if n < 2 || m < 2 {
            return Vec::new();
        }

        // для ребра i -> i+1 на self: где оно лежит на other и в какую сторону
        let edges: Vec<Option<(usize, Direction)>> = (0..n)
            .map(|i| other.find_edge(self.vertices[i], self.vertices[(i + 1) % n]))
            .collect();

        let continues = |prev: usize, cur: usize| match (edges[prev], edges[cur]) {
            (Some((jp, dp)), Some((j, d))) => d == dp && j == offset_index(jp, m, dp.step()),
            _ => false,
        };

        let Some(origin) = (0..n).find(|&i| !continues((i + n - 1) % n, i)) else {
            // каждое ребро общее: кольцо self целиком лежит на other
            return match edges[0] {
                Some((j, direction)) if m > n => vec![SharedRun {
                    local_start: 0,
                    other_start: j,
                    direction,
                    len: n,
                }],
                _ => Vec::new(),
            };
        };

        let mut runs = Vec::new();
        let mut current: Option<SharedRun> = None;
        for step in 0..n {
            let i = (origin + step) % n;
            match edges[i] {
                Some((j, direction)) => {
                    if let Some(run) = current.as_mut() {
                        if continues((i + n - 1) % n, i) {
                            run.len += 1;
                            continue;
                        }
                        runs.push(*run);
                    }
                    current = Some(SharedRun {
                        local_start: i,
                        other_start: j,
                        direction,
                        len: 2,
                    });
                }
                None => {
                    if let Some(run) = current.take() {
                        runs.push(run);
                    }
                }
            }
        }
        if let Some(run) = current {
            runs.push(run);
        }
        runs
    }

    /// Ищет ребро `a -> b` на кольце: индекс `a` и направление к `b`.
    fn find_edge(&self, a: Point, b: Point) -> Option<(usize, Direction)> {
        let n = self.vertices.len();
        self.vertices
            .iter()
            .enumerate()
            .filter(|&(_, v)| *v == a)
            .find_map(|(j, _)| {
                if self.vertices[(j + 1) % n] == b {
                    Some((j, Direction::Forward))
                } else if self.vertices[(j + n - 1) % n] == b {
                    Some((j, Direction::Backward))
                } else {
                    None
                }
            })
    }

    /// Находит цепочку на кольце: индекс первой вершины и направление.
    fn find_chain(&self, chain: &[Point]) -> Option<(usize, Direction)> {
        let n = self.vertices.len();
        if chain.len() < 2 || chain.len() > n {
            return None;
        }
        for (start, _) in self.vertices.iter().enumerate().filter(|&(_, v)| *v == chain[0]) {
            for direction in [Direction::Forward, Direction::Backward] {
                let matches = chain.iter().enumerate().all(|(l, p)| {
                    self.vertices[offset_index(start, n, l as isize * direction.step())] == *p
                });
                if matches {
                    return Some((start, direction));
                }
            }
        }
        None
    }

    /// Сопоставляет цепочку из `AdjacencyInfo` с обоими кольцами. Цепочка
    /// могла быть вычислена с любой стороны, поэтому на `self` она
    /// нормализуется к прямому обходу.
    fn locate_run(&self, other: &Polygon, chain: &[Point]) -> Result<SharedRun, TopologyError> {
        let n = self.vertices.len();
        let (start, direction) = self.find_chain(chain).ok_or(TopologyError::SharedRunNotFound)?;

        let reversed: Vec<Point>;
        let (local_start, chain) = match direction {
            Direction::Forward => (start, chain),
            Direction::Backward => {
                reversed = chain.iter().rev().copied().collect();
                (offset_index(start, n, -(chain.len() as isize - 1)), reversed.as_slice())
            }
        };

        let (other_start, direction) = other.find_chain(chain).ok_or(TopologyError::SharedRunNotFound)?;
        Ok(SharedRun {
            local_start,
            other_start,
            direction,
            len: chain.len(),
        })
    }
}

/// Убирает подряд идущие дубликаты и нулевые «шипы» вида `x, y, x`.
fn remove_spikes(ring: &mut Vec<Point>) {
    loop {
        ring.dedup();
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        let n = ring.len();
        if n < 3 {
            return;
        }
        let Some(i) = (0..n).find(|&i| ring[(i + n - 1) % n] == ring[(i + 1) % n]) else {
            return;
        };
        let next = (i + 1) % n;
        ring.remove(i.max(next));
        ring.remove(i.min(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ring_is_simple;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn unit_square() -> Polygon {
        Polygon::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)])
    }

    fn assert_merged(merged: &Polygon, expected_area: f64) {
        assert_relative_eq!(merged.area(), expected_area, epsilon = 1e-9);
        assert_relative_eq!(signed_area(merged.vertices()).abs(), expected_area, epsilon = 1e-9);
        assert!(ring_is_simple(merged.vertices()));
    }

    #[test]
    fn squares_sharing_an_edge_merge_into_rectangle() {
        let mut a = unit_square();
        let b = Polygon::new(vec![p(1.0, 0.0), p(2.0, 0.0), p(2.0, 1.0), p(1.0, 1.0)]);

        let info = a.adjacency_info(&b).unwrap();
        assert_eq!(info.vertices(), &[p(1.0, 0.0), p(1.0, 1.0)]);
        assert_relative_eq!(info.length(), 1.0);

        a.merge_with(&b, &info).unwrap();
        assert_eq!(a.len(), 6);
        assert_merged(&a, 2.0);
        // направление обхода self сохраняется
        assert!(signed_area(a.vertices()) > 0.0);
    }

    #[test]
    fn opposite_winding_is_spliced_in_reverse() {
        let mut a = unit_square();
        let b = Polygon::new(vec![p(1.0, 1.0), p(2.0, 1.0), p(2.0, 0.0), p(1.0, 0.0)]);
        let info = a.adjacency_info(&b).unwrap();
        a.merge_with(&b, &info).unwrap();
        assert_merged(&a, 2.0);
        assert!(signed_area(a.vertices()) > 0.0);
    }

    #[test]
    fn shared_run_across_index_zero() {
        // общее ребро совпадает с замыкающим ребром кольца a
        let mut a = Polygon::new(vec![p(1.0, 1.0), p(0.0, 1.0), p(0.0, 0.0), p(1.0, 0.0)]);
        let b = Polygon::new(vec![p(2.0, 1.0), p(1.0, 1.0), p(1.0, 0.0), p(2.0, 0.0)]);
        let info = a.adjacency_info(&b).unwrap();
        assert_eq!(info.len(), 2);
        a.merge_with(&b, &info).unwrap();
        assert_merged(&a, 2.0);
    }

    #[test]
    fn long_shared_chain_drops_interior_vertices() {
        let mut a = Polygon::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.5), p(1.0, 1.0), p(0.0, 1.0)]);
        let b = Polygon::new(vec![p(1.0, 0.0), p(2.0, 0.0), p(2.0, 1.0), p(1.0, 1.0), p(1.0, 0.5)]);

        let info = a.adjacency_info(&b).unwrap();
        assert_eq!(info.vertices(), &[p(1.0, 0.0), p(1.0, 0.5), p(1.0, 1.0)]);

        a.merge_with(&b, &info).unwrap();
        assert!(!a.vertices().contains(&p(1.0, 0.5)));
        assert_eq!(a.len(), 6);
        assert_merged(&a, 2.0);
    }

    #[test]
    fn chain_found_from_the_other_side_still_merges() {
        let a = Polygon::new(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.5), p(1.0, 1.0), p(0.0, 1.0)]);
        let mut b = Polygon::new(vec![p(1.0, 0.0), p(2.0, 0.0), p(2.0, 1.0), p(1.0, 1.0), p(1.0, 0.5)]);

        // цепочка в порядке обхода a, а поглощает b
        let info = a.adjacency_info(&b).unwrap();
        b.merge_with(&a, &info).unwrap();
        assert_merged(&b, 2.0);
        assert_eq!(b.len(), 6);
    }

    #[test]
    fn wholly_wrapped_polygon_is_absorbed() {
        let mut outer = Polygon::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(2.0, 1.0), p(0.0, 4.0)]);
        let notch = Polygon::new(vec![p(4.0, 4.0), p(2.0, 1.0), p(0.0, 4.0)]);
        assert_relative_eq!(outer.area(), 10.0);

        let info = outer.adjacency_info(&notch).unwrap();
        assert_eq!(info.len(), notch.len());

        outer.merge_with(&notch, &info).unwrap();
        assert_eq!(outer.len(), 4);
        assert_merged(&outer, 16.0);
    }

    #[test]
    fn wrapping_polygon_absorbed_into_smaller_one() {
        let mut notch = Polygon::new(vec![p(4.0, 4.0), p(2.0, 1.0), p(0.0, 4.0)]);
        let outer = Polygon::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(2.0, 1.0), p(0.0, 4.0)]);

        let info = notch.adjacency_info(&outer).unwrap();
        notch.merge_with(&outer, &info).unwrap();
        assert_eq!(notch.len(), 4);
        assert_merged(&notch, 16.0);
    }

    /// Район, огибающий треугольник и касающийся себя в (0, 0), и сам треугольник.
    fn pinched_ring_and_enclosed_triangle() -> (Polygon, Polygon) {
        let ring = Polygon::new(vec![
            p(0.0, 0.0),
            p(-3.0, -3.0),
            p(8.0, -3.0),
            p(8.0, 6.0),
            p(-3.0, 6.0),
            p(0.0, 0.0),
            p(2.0, 2.0),
            p(4.0, 0.0),
        ]);
        let triangle = Polygon::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(2.0, 2.0)]);
        (ring, triangle)
    }

    fn enclosing_pentagon() -> Vec<Point> {
        vec![p(-3.0, -3.0), p(8.0, -3.0), p(8.0, 6.0), p(-3.0, 6.0), p(0.0, 0.0)]
    }

    #[test]
    fn enclosed_triangle_absorbs_pinched_ring() {
        let (ring, mut triangle) = pinched_ring_and_enclosed_triangle();
        assert_relative_eq!(ring.area(), 81.5);

        let info = triangle.adjacency_info(&ring).unwrap();
        // все три ребра общие, цепочка не длиннее кольца треугольника
        assert_eq!(info.len(), 3);
        assert_relative_eq!(info.length(), 4.0 + 2.0 * 8f64.sqrt(), epsilon = 1e-12);

        triangle.merge_with(&ring, &info).unwrap();
        assert_eq!(triangle.vertices(), enclosing_pentagon().as_slice());
        assert_merged(&triangle, 85.5);
    }

    #[test]
    fn pinched_ring_absorbs_enclosed_triangle() {
        let (mut ring, triangle) = pinched_ring_and_enclosed_triangle();

        let info = ring.adjacency_info(&triangle).unwrap();
        assert_eq!(info.vertices(), &[p(0.0, 0.0), p(2.0, 2.0), p(4.0, 0.0)]);

        ring.merge_with(&triangle, &info).unwrap();
        assert_eq!(ring.vertices(), enclosing_pentagon().as_slice());
        assert_merged(&ring, 85.5);
    }

    #[test]
    fn empty_polygon_adopts_the_other() {
        let mut empty = Polygon::empty();
        let square = unit_square();
        let info = AdjacencyInfo::new(vec![p(0.0, 0.0), p(1.0, 0.0)]);
        empty.merge_with(&square, &info).unwrap();
        assert_eq!(empty, square);
    }

    #[test]
    fn disjoint_polygons_are_not_adjacent() {
        let a = unit_square();
        let b = Polygon::new(vec![p(5.0, 5.0), p(6.0, 5.0), p(6.0, 6.0)]);
        assert!(a.adjacency_info(&b).is_none());

        // общая вершина без общего ребра не считается смежностью
        let c = Polygon::new(vec![p(1.0, 1.0), p(2.0, 1.0), p(2.0, 2.0)]);
        assert!(a.adjacency_info(&c).is_none());
    }

    #[test]
    fn merging_with_wrong_chain_fails() {
        let mut a = unit_square();
        let b = Polygon::new(vec![p(1.0, 0.0), p(2.0, 0.0), p(2.0, 1.0), p(1.0, 1.0)]);
        let bogus = AdjacencyInfo::new(vec![p(0.0, 0.0), p(0.0, 1.0), p(7.0, 7.0)]);
        assert_eq!(a.merge_with(&b, &bogus), Err(TopologyError::SharedRunNotFound));
        // кольцо не тронуто
        assert_eq!(a, unit_square());
    }

    #[test]
    fn identical_rings_cannot_merge() {
        let mut a = unit_square();
        let b = unit_square();
        let info = AdjacencyInfo::new(a.vertices().to_vec());
        assert_eq!(a.merge_with(&b, &info), Err(TopologyError::IdenticalRings));
    }

    #[test]
    fn spikes_are_removed() {
        let mut ring = vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(1.0, 1.0)];
        remove_spikes(&mut ring);
        assert_eq!(ring, vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]);
    }
}
