// src/attributes.rs
//! Демография районов из составных пространственных эффектов
//!
//! Каждый показатель задаётся упорядоченным списком эффектов, который
//! сворачивается по району начиная с нуля. Эффекты бывают трёх видов:
//! - шум в центре района;
//! - радиальное затухание от точки (города, столицы);
//! - произвольная функция от накопленного значения и района.
//!
//! Показатели считаются по очереди, поэтому пользовательский эффект может
//! опираться на уже посчитанные (плотность зависит от урбанизации и т.д.).

use crate::config::AttributeSettings;
use crate::district::{District, DistrictId};
use crate::geometry::{Point, Polygon, distance_to_segment};
use crate::noise::NoiseField;
use rand::Rng;
use rand::seq::index;
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;

/// Демографические показатели района. Все скаляры лежат в `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Demographics {
    pub population: u64,
    pub population_density: f32,
    pub urbanisation: f32,
    pub coastalness: f32,
    pub wealth: f32,
    pub age: f32,
    pub education: f32,
    pub health: f32,
    pub geographic_divide: f32,
}

/// Один шаг свёртки показателя.
pub enum DistrictEffect<'a> {
    /// `acc + amplitude * noise(center * frequency)`
    Noise {
        field: NoiseField,
        frequency: f64,
        amplitude: f32,
    },
    /// `acc + magnitude * max(1 - d / falloff, 0)`, `d`: расстояние до центра района
    RadialFalloff {
        center: Point,
        magnitude: f32,
        falloff: f64,
    },
    Custom(Box<dyn Fn(f32, &District) -> f32 + 'a>),
}

impl DistrictEffect<'_> {
    #[must_use]
    pub fn accumulate(&self, acc: f32, district: &District) -> f32 {
        match self {
            Self::Noise {
                field,
                frequency,
                amplitude,
            } => {
                let c = district.center();
                acc + field.sample(c.x, c.y, *frequency, *amplitude)
            }
            Self::RadialFalloff {
                center,
                magnitude,
                falloff,
            } => acc + magnitude * radial_falloff(center.distance(district.center()), *falloff),
            Self::Custom(effect) => effect(acc, district),
        }
    }
}

impl fmt::Debug for DistrictEffect<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noise {
                field,
                frequency,
                amplitude,
            } => f
                .debug_struct("Noise")
                .field("field", field)
                .field("frequency", frequency)
                .field("amplitude", amplitude)
                .finish(),
            Self::RadialFalloff {
                center,
                magnitude,
                falloff,
            } => f
                .debug_struct("RadialFalloff")
                .field("center", center)
                .field("magnitude", magnitude)
                .field("falloff", falloff)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Сворачивает эффекты по району, начиная с нуля.
#[must_use]
pub fn evaluate(effects: &[DistrictEffect<'_>], district: &District) -> f32 {
    effects.iter().fold(0.0, |acc, effect| effect.accumulate(acc, district))
}

fn radial_falloff(distance: f64, falloff: f64) -> f32 {
    if falloff <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / falloff).max(0.0) as f32
}

/// Расстояние от точки до ближайшего ребра любого кольца суши.
#[must_use]
pub fn distance_to_coast(p: Point, landmass: &[Polygon]) -> f64 {
    landmass
        .iter()
        .flat_map(|ring| {
            let v = ring.vertices();
            (0..v.len()).map(move |i| distance_to_segment(p, v[i], v[(i + 1) % v.len()]))
        })
        .fold(f64::INFINITY, f64::min)
}

/// Заполняет демографию всех районов. Возвращает районы-города, первый из них столица.
pub fn apply_demographics<R: Rng>(
    rng: &mut R,
    districts: &mut [District],
    landmass: &[Polygon],
    settings: &AttributeSettings,
) -> Vec<DistrictId> {
    if districts.is_empty() {
        return Vec::new();
    }

    let land_area: f64 = districts.iter().map(District::area).sum();
    // характерный радиус суши
    let scale = (land_area / PI).sqrt();

    let city_count = settings.city_count.min(districts.len());
    let cities: Vec<DistrictId> = index::sample(rng, districts.len(), city_count)
        .into_iter()
        .map(|i| districts[i].id)
        .collect();
    let city_centers: Vec<Point> = cities.iter().map(|id| districts[id.0].center()).collect();

    // проекция на случайную ось через всю страну
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    let axis = Point::new(angle.cos(), angle.sin());
    let projections: Vec<f64> = districts.iter().map(|d| d.center().dot(axis)).collect();
    let lo = projections.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = projections.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = (hi - lo).max(f64::EPSILON);

    let mut noise = |amplitude: f32| DistrictEffect::Noise {
        field: NoiseField::new(rng.r#gen(), 3, 0.5),
        frequency: settings.urban_noise_frequency,
        amplitude,
    };

    let coast_falloff = 0.15 * scale;
    let coast = [DistrictEffect::Custom(Box::new(|_: f32, d: &District| {
        radial_falloff(distance_to_coast(d.center(), landmass), coast_falloff)
    }))];
    fill(districts, &coast, |demo, v| demo.coastalness = v);

    let mut urban: Vec<DistrictEffect<'_>> = city_centers
        .iter()
        .enumerate()
        .map(|(i, &center)| DistrictEffect::RadialFalloff {
            center,
            magnitude: if i == 0 { 1.0 } else { 0.7 },
            falloff: if i == 0 { 0.45 * scale } else { 0.3 * scale },
        })
        .collect();
    urban.push(noise(0.15));
    fill(districts, &urban, |demo, v| demo.urbanisation = v);

    let density = [
        DistrictEffect::Custom(Box::new(|_: f32, d: &District| {
            0.1 + 0.7 * d.demographics.urbanisation + 0.2 * d.demographics.coastalness
        })),
        noise(0.1),
    ];
    fill(districts, &density, |demo, v| demo.population_density = v);

    let mut wealth = vec![DistrictEffect::Custom(Box::new(|_: f32, d: &District| {
        0.3 + 0.4 * d.demographics.urbanisation
    }))];
    if let Some(&capital) = city_centers.first() {
        wealth.push(DistrictEffect::RadialFalloff {
            center: capital,
            magnitude: 0.2,
            falloff: 0.6 * scale,
        });
    }
    wealth.push(noise(0.2));
    fill(districts, &wealth, |demo, v| demo.wealth = v);

    let age = [
        DistrictEffect::Custom(Box::new(|_: f32, d: &District| 0.6 - 0.3 * d.demographics.urbanisation)),
        noise(0.2),
    ];
    fill(districts, &age, |demo, v| demo.age = v);

    let education = [
        DistrictEffect::Custom(Box::new(|_: f32, d: &District| {
            0.2 + 0.5 * d.demographics.wealth + 0.2 * d.demographics.urbanisation
        })),
        noise(0.1),
    ];
    fill(districts, &education, |demo, v| demo.education = v);

    let health = [
        DistrictEffect::Custom(Box::new(|_: f32, d: &District| {
            0.4 + 0.4 * d.demographics.wealth - 0.2 * d.demographics.age
        })),
        noise(0.1),
    ];
    fill(districts, &health, |demo, v| demo.health = v);

    let divide = [
        DistrictEffect::Custom(Box::new(move |_: f32, d: &District| {
            ((d.center().dot(axis) - lo) / span) as f32
        })),
        noise(0.1),
    ];
    fill(districts, &divide, |demo, v| demo.geographic_divide = v);

    for d in districts.iter_mut() {
        let people = f64::from(d.demographics.population_density) * d.area() * settings.population_per_unit_area;
        d.demographics.population = people.round().max(0.0) as u64;
    }

    let total: u64 = districts.iter().map(District::population).sum();
    tracing::info!(
        target: "countrygen::attributes",
        cities = cities.len(),
        population = total,
        "attributes.applied"
    );
    cities
}

/// Считает один показатель для всех районов и обрезает его в `[0, 1]`.
fn fill(districts: &mut [District], effects: &[DistrictEffect<'_>], set: impl Fn(&mut Demographics, f32)) {
    for district in districts.iter_mut() {
        let value = evaluate(effects, district).clamp(0.0, 1.0);
        set(&mut district.demographics, value);
    }
}
