// src/coastline.rs
//! Береговая линия: обход зашумлённого эллипса с разрешением самопересечений
//!
//! Точки эллипса смещаются двумя независимыми полями шума. Если новое ребро
//! пересекает одно из уже уложенных, петля либо откалывается в остров, либо
//! разворачивается на месте. В конце все кольца распутываются окончательно и
//! одним общим аффинным преобразованием вписываются в размер карты.

use crate::config::CoastlineSettings;
use crate::error::GenerationError;
use crate::geometry::{Point, Polygon, find_crossing, is_left_of, segment_intersection, signed_area};
use crate::noise::NoiseField;
use std::f64::consts::TAU;

/// Построитель береговой линии для карты `width × height`.
pub struct CoastlineBuilder<'a> {
    settings: &'a CoastlineSettings,
    width: f64,
    height: f64,
    noise_x: &'a NoiseField,
    noise_y: &'a NoiseField,
}

impl<'a> CoastlineBuilder<'a> {
    #[must_use]
    pub fn new(
        settings: &'a CoastlineSettings,
        width: f64,
        height: f64,
        noise_x: &'a NoiseField,
        noise_y: &'a NoiseField,
    ) -> Self {
        Self {
            settings,
            width,
            height,
            noise_x,
            noise_y,
        }
    }

    /// Кольца суши: первое материк, остальные острова.
    pub fn build(&self) -> Result<Vec<Polygon>, GenerationError> {
        let s = self.settings;
        let center = Point::new(self.width / 2.0, self.height / 2.0);
        let rx = self.width * s.ellipse_scale / 2.0;
        let ry = self.height * s.ellipse_scale / 2.0;
        let amplitude = (s.noise_amplitude * rx.min(ry)) as f32;
        let step = TAU / s.boundary_points as f64;

        let mut walk = CoastWalk::new(s.island_trim, s.min_island_points);
        for k in 0..s.boundary_points {
            let theta = TAU - k as f64 * step;
            let base = Point::new(center.x + rx * theta.cos(), center.y + ry * theta.sin());
            let offset = Point::new(
                f64::from(self.noise_x.sample(base.x, base.y, s.noise_frequency, amplitude)),
                f64::from(self.noise_y.sample(base.x, base.y, s.noise_frequency, amplitude)),
            );
            walk.push(base + offset);
        }

        let islands_found = walk.islands.len();
        let walked_points = walk.mainland.len();
        let mut rings = Vec::with_capacity(islands_found + 1);
        rings.push(walk.mainland);
        rings.extend(walk.islands);

        for ring in &mut rings {
            untangle(ring, s.max_untangle_passes);
        }
        rings.retain(|ring| ring.len() >= 3 && signed_area(ring) != 0.0);

        // петля у самого начала обхода может отколоть почти всю сушу,
        // поэтому материком считается самое большое кольцо
        let largest = rings
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| signed_area(a).abs().total_cmp(&signed_area(b).abs()))
            .map(|(i, _)| i)
            .ok_or(GenerationError::DegenerateCoastline { points: walked_points })?;
        rings.swap(0, largest);

        fit_to_bounds(&mut rings, self.width, self.height, s.margin);

        tracing::debug!(
            target: "countrygen::coastline",
            mainland_points = rings[0].len(),
            islands_found,
            islands_kept = rings.len() - 1,
            "coastline.built"
        );

        Ok(rings.into_iter().map(Polygon::new).collect())
    }
}

/// Состояние обхода: растущее кольцо материка и отколовшиеся острова.
#[derive(Debug, Default)]
struct CoastWalk {
    mainland: Vec<Point>,
    islands: Vec<Vec<Point>>,
    island_trim: usize,
    min_island_points: usize,
}

impl CoastWalk {
    fn new(island_trim: usize, min_island_points: usize) -> Self {
        Self {
            island_trim,
            min_island_points,
            ..Self::default()
        }
    }

    fn push(&mut self, p: Point) {
        if self.mainland.last() == Some(&p) {
            return;
        }
        self.mainland.push(p);

        let m = self.mainland.len();
        if m < 4 {
            return;
        }
        let (a, b) = (self.mainland[m - 2], self.mainland[m - 1]);

        // последнее ребро смежно с новым, а первое может касаться замыкания
        for i in (1..m - 3).rev() {
            let (c, d) = (self.mainland[i], self.mainland[i + 1]);
            if !segment_intersection(a, b, c, d).intersects() {
                continue;
            }
            if is_left_of(a, b, d) {
                self.chop(i);
            } else {
                self.mainland[i + 1..m - 1].reverse();
            }
            return;
        }
    }

    /// Отрезает всё после `i` как кандидата в острова.
    fn chop(&mut self, i: usize) {
        let loop_points = self.mainland.split_off(i + 1);
        let trim = self.island_trim;
        if loop_points.len() <= 2 * trim {
            return;
        }
        let island = &loop_points[trim..loop_points.len() - trim];
        if island.len() > self.min_island_points {
            self.islands.push(island.to_vec());
        }
    }
}

/// Разворачивает участки кольца между пересекающимися рёбрами, пока
/// пересечения не исчезнут или не кончится лимит проходов.
fn untangle(ring: &mut Vec<Point>, max_passes: usize) {
    ring.dedup();
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    for _ in 0..max_passes {
        let Some((i, j)) = find_crossing(ring) else {
            return;
        };
        ring[i + 1..=j].reverse();
    }
    tracing::warn!(
        target: "countrygen::coastline",
        points = ring.len(),
        max_passes,
        "coastline.untangle.pass_cap_reached"
    );
}

/// Общее масштабирование и сдвиг, вписывающие все кольца в карту с полями.
fn fit_to_bounds(rings: &mut [Vec<Point>], width: f64, height: f64, margin: f64) {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in rings.iter().flatten() {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let span_x = max_x - min_x;
    let span_y = max_y - min_y;
    if !(span_x > 0.0 && span_y > 0.0) {
        return;
    }

    let scale = (width * (1.0 - 2.0 * margin) / span_x).min(height * (1.0 - 2.0 * margin) / span_y);
    let offset_x = (width - span_x * scale) / 2.0;
    let offset_y = (height - span_y * scale) / 2.0;

    for p in rings.iter_mut().flatten() {
        *p = Point::new((p.x - min_x) * scale + offset_x, (p.y - min_y) * scale + offset_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ring_is_simple;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn open_chain_is_simple(chain: &[Point]) -> bool {
        for i in 0..chain.len().saturating_sub(1) {
            for j in (i + 2)..chain.len() - 1 {
                if segment_intersection(chain[i], chain[i + 1], chain[j], chain[j + 1]).intersects() {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn crossing_to_the_left_chops_the_loop() {
        let mut walk = CoastWalk::new(2, 3);
        for q in [p(-5.0, 0.0), p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(5.0, 10.0), p(5.0, -5.0)] {
            walk.push(q);
        }
        assert_eq!(walk.mainland, vec![p(-5.0, 0.0), p(0.0, 0.0)]);
        // петля из четырёх точек слишком мала после обрезки краёв
        assert!(walk.islands.is_empty());
    }

    #[test]
    fn large_chopped_loop_becomes_an_island() {
        let mut walk = CoastWalk::new(2, 3);
        let mut points = vec![p(-5.0, 0.0), p(0.0, 0.0), p(10.0, 0.0)];
        for k in 0..=8 {
            let angle = f64::from(k) * std::f64::consts::PI / 8.0;
            points.push(p(10.0 + 5.0 * angle.sin() * 2.0, 10.0 * (1.0 - angle.cos()) / 2.0 + 0.5));
        }
        points.push(p(5.0, 10.0));
        points.push(p(5.0, -5.0));
        for q in points {
            walk.push(q);
        }
        assert_eq!(walk.mainland, vec![p(-5.0, 0.0), p(0.0, 0.0)]);
        assert_eq!(walk.islands.len(), 1);
        assert!(walk.islands[0].len() > 3);
    }

    #[test]
    fn crossing_to_the_right_reverses_the_loop() {
        let mut walk = CoastWalk::new(2, 3);
        for q in [p(15.0, 0.0), p(10.0, 0.0), p(0.0, 0.0), p(0.0, 10.0), p(5.0, 10.0), p(5.0, -5.0)] {
            walk.push(q);
        }
        assert_eq!(walk.mainland.len(), 6);
        assert!(walk.islands.is_empty());
        assert!(open_chain_is_simple(&walk.mainland));
        assert_eq!(walk.mainland[2], p(5.0, 10.0));
    }

    #[test]
    fn untangle_fixes_bow_tie() {
        let mut ring = vec![p(0.0, 0.0), p(2.0, 2.0), p(2.0, 0.0), p(0.0, 2.0)];
        untangle(&mut ring, 10);
        assert!(ring_is_simple(&ring));
        assert!((signed_area(&ring).abs() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn rings_are_fitted_inside_the_map() {
        let mut rings = vec![
            vec![p(-10.0, -10.0), p(10.0, -10.0), p(10.0, 10.0)],
            vec![p(20.0, 0.0), p(30.0, 0.0), p(30.0, 5.0)],
        ];
        fit_to_bounds(&mut rings, 400.0, 200.0, 0.05);

        let all: Vec<Point> = rings.iter().flatten().copied().collect();
        let min_x = all.iter().map(|q| q.x).fold(f64::INFINITY, f64::min);
        let max_x = all.iter().map(|q| q.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = all.iter().map(|q| q.y).fold(f64::INFINITY, f64::min);
        let max_y = all.iter().map(|q| q.y).fold(f64::NEG_INFINITY, f64::max);

        // облако 40×20 масштабируется по ширине: 360 / 40 = 9
        assert!((min_x - 20.0).abs() < 1e-9 && (max_x - 380.0).abs() < 1e-9);
        assert!((min_y - 10.0).abs() < 1e-9 && (max_y - 190.0).abs() < 1e-9);
    }

    #[test]
    fn built_rings_are_simple_and_inside_bounds() {
        let settings = CoastlineSettings::default();
        for seed in 0..6 {
            let nx = NoiseField::new(seed, settings.noise_octaves, settings.noise_persistence);
            let ny = NoiseField::new(seed + 100, settings.noise_octaves, settings.noise_persistence);
            let rings = CoastlineBuilder::new(&settings, 800.0, 700.0, &nx, &ny).build().unwrap();

            assert!(!rings.is_empty());
            for ring in &rings {
                assert!(ring.area() > 0.0);
                assert!(ring_is_simple(ring.vertices()), "seed {seed}: ring not simple");
                for q in ring.vertices() {
                    assert!((-1e-9..=800.0 + 1e-9).contains(&q.x));
                    assert!((-1e-9..=700.0 + 1e-9).contains(&q.y));
                }
            }
        }
    }
}
