// src/region/mod.rs
//! Регионы: группы районов с примерно равным населением.
//!
//! Сначала случайные районы становятся зёрнами регионов, затем каждый район
//! уходит к ближайшему зерну, после чего пограничные районы перекладываются
//! между регионами, пока это уменьшает разброс населения.

use crate::config::RegionSettings;
use crate::district::{District, DistrictId};
use crate::error::GenerationError;
use crate::geometry::Point;
use rand::Rng;
use rand::seq::index;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RegionId(pub usize);

#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    districts: BTreeSet<DistrictId>,
    population: u64,
    area: f64,
}

impl Region {
    #[must_use]
    pub fn new(id: RegionId) -> Self {
        Self {
            id,
            name: format!("Region_{}", id.0),
            districts: BTreeSet::new(),
            population: 0,
            area: 0.0,
        }
    }

    #[must_use]
    pub fn districts(&self) -> &BTreeSet<DistrictId> {
        &self.districts
    }

    #[must_use]
    pub fn population(&self) -> u64 {
        self.population
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.districts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }

    /// Добавляет район и обновляет его обратную ссылку и итоги региона.
    pub fn add_district(&mut self, district: &mut District) {
        if self.districts.insert(district.id) {
            self.population += district.population();
            self.area += district.area();
        }
        district.set_region(Some(self.id));
    }

    pub fn remove_district(&mut self, district: &mut District) -> bool {
        if !self.districts.remove(&district.id) {
            return false;
        }
        self.population -= district.population();
        self.area -= district.area();
        district.set_region(None);
        true
    }
}

/// Итоги выравнивания населения.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EqualizationReport {
    pub target_population: f64,
    pub passes: usize,
    pub forced_moves: usize,
    pub balancing_moves: usize,
    pub cap_hit: bool,
    /// `Σ (население региона − цель)²` после выравнивания
    pub deviation: f64,
}

/// Кандидат на перенос в другой регион.
struct Candidate {
    district: DistrictId,
    ratio: f64,
}

pub struct RegionAllocator<'a> {
    settings: &'a RegionSettings,
}

impl<'a> RegionAllocator<'a> {
    #[must_use]
    pub fn new(settings: &'a RegionSettings) -> Self {
        Self { settings }
    }

    /// Полный цикл: зёрна, назначение по близости, выравнивание.
    ///
    /// Идентификаторы районов должны совпадать с их позициями в срезе.
    pub fn allocate<R: Rng>(
        &self,
        rng: &mut R,
        districts: &mut [District],
        region_count: usize,
    ) -> Result<(Vec<Region>, EqualizationReport), GenerationError> {
        let (mut regions, seeds) = seed_regions(rng, districts, region_count)?;
        assign_nearest(&mut regions, &seeds, districts);
        tracing::info!(
            target: "countrygen::regions",
            regions = regions.len(),
            districts = districts.len(),
            "regions.assigned"
        );

        let report = self.equalize(&mut regions, districts);
        tracing::info!(
            target: "countrygen::regions",
            passes = report.passes,
            forced = report.forced_moves,
            balancing = report.balancing_moves,
            deviation = report.deviation,
            "regions.equalized"
        );
        Ok((regions, report))
    }

    /// Переносит пограничные районы, пока проход что-то меняет.
    pub fn equalize(&self, regions: &mut [Region], districts: &mut [District]) -> EqualizationReport {
        let total: u64 = regions.iter().map(Region::population).sum();
        let target = total as f64 / regions.len().max(1) as f64;
        let mut report = EqualizationReport {
            target_population: target,
            ..EqualizationReport::default()
        };

        for _ in 0..self.settings.max_equalization_passes {
            report.passes += 1;
            let mut changed = false;

            for r in 0..regions.len() {
                let origin = regions[r].id;
                for candidate in border_candidates(&regions[r], districts) {
                    if regions[r].len() <= 1 {
                        break;
                    }
                    // предыдущие переносы могли поменять окружение района
                    let Some((same, destination, _)) = neighbourhood(districts, candidate.district, origin) else {
                        continue;
                    };
                    let forced = same == 0;
                    let population = districts[candidate.district.0].population();
                    if !forced
                        && !improves(
                            regions[r].population(),
                            regions[destination.0].population(),
                            population,
                            target,
                        )
                    {
                        continue;
                    }

                    let district = &mut districts[candidate.district.0];
                    regions[r].remove_district(district);
                    regions[destination.0].add_district(district);
                    changed = true;
                    if forced {
                        report.forced_moves += 1;
                    } else {
                        report.balancing_moves += 1;
                    }
                    tracing::trace!(
                        target: "countrygen::regions",
                        district = %candidate.district,
                        from = origin.0,
                        to = destination.0,
                        forced,
                        ratio = candidate.ratio,
                        "regions.district.moved"
                    );
                }
            }

            if !changed {
                report.deviation = deviation(regions, target);
                return report;
            }
        }

        report.cap_hit = true;
        report.deviation = deviation(regions, target);
        tracing::warn!(
            target: "countrygen::regions",
            passes = report.passes,
            "regions.equalize.pass_cap_reached"
        );
        report
    }
}

/// Случайные районы-зёрна без повторов: по одному на регион.
fn seed_regions<R: Rng>(
    rng: &mut R,
    districts: &mut [District],
    region_count: usize,
) -> Result<(Vec<Region>, Vec<Point>), GenerationError> {
    if region_count == 0 || region_count > districts.len() {
        return Err(GenerationError::TooFewDistricts {
            available: districts.len(),
            requested: region_count,
        });
    }

    let mut regions = Vec::with_capacity(region_count);
    let mut seeds = Vec::with_capacity(region_count);
    for (r, d) in index::sample(rng, districts.len(), region_count).into_iter().enumerate() {
        let mut region = Region::new(RegionId(r));
        seeds.push(districts[d].center());
        region.add_district(&mut districts[d]);
        regions.push(region);
    }
    Ok((regions, seeds))
}

/// Каждый ещё не назначенный район уходит к ближайшему зерну;
/// при равенстве расстояний побеждает меньший номер региона.
fn assign_nearest(regions: &mut [Region], seeds: &[Point], districts: &mut [District]) {
    for district in districts.iter_mut().filter(|d| d.region().is_none()) {
        let center = district.center();
        let nearest = seeds
            .iter()
            .enumerate()
            .map(|(r, seed)| (r, seed.distance_sq(center)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(r, _)| r);
        if let Some(r) = nearest {
            regions[r].add_district(district);
        }
    }
}

/// Соседи района вне региона `origin`: (число соседей в своём регионе,
/// регион с наибольшим числом соседей, это число). `None`, если все соседи свои.
fn neighbourhood(districts: &[District], id: DistrictId, origin: RegionId) -> Option<(usize, RegionId, usize)> {
    let mut same = 0;
    let mut others: BTreeMap<RegionId, usize> = BTreeMap::new();
    for n in districts[id.0].adjacent() {
        match districts[n.0].region() {
            Some(r) if r == origin => same += 1,
            Some(r) => *others.entry(r).or_insert(0) += 1,
            None => {}
        }
    }
    let (destination, count) = others
        .into_iter()
        .fold(None, |best: Option<(RegionId, usize)>, (r, c)| match best {
            Some((_, bc)) if bc >= c => best,
            _ => Some((r, c)),
        })?;
    Some((same, destination, count))
}

/// Пограничные районы региона в порядке убывания «чужеродности»:
/// отношение соседей в регионе назначения к соседям в своём.
fn border_candidates(region: &Region, districts: &[District]) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = region
        .districts()
        .iter()
        .filter_map(|&id| {
            let (same, _, count) = neighbourhood(districts, id, region.id)?;
            let ratio = if same == 0 {
                f64::INFINITY
            } else {
                count as f64 / same as f64
            };
            Some(Candidate { district: id, ratio })
        })
        .collect();
    candidates.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
    candidates
}

/// Строго ли уменьшается разброс двух регионов при переносе `population`.
fn improves(origin: u64, destination: u64, population: u64, target: f64) -> bool {
    let (o, d, p) = (origin as f64, destination as f64, population as f64);
    let before = (o - target).powi(2) + (d - target).powi(2);
    let after = (o - p - target).powi(2) + (d + p - target).powi(2);
    after < before
}

fn deviation(regions: &[Region], target: f64) -> f64 {
    regions.iter().map(|r| (r.population() as f64 - target).powi(2)).sum()
}
