// src/district/merge.rs
//! Слияние треугольников в районы примерно равной площади.
//!
//! 1. Рост: район меньше целевой площади вливается в соседа, тоже меньшего
//!    целевой, с самой длинной общей границей. Проходы повторяются, пока
//!    слияния не прекратятся.
//! 2. Очистка: район меньше `target / cleanup_divisor` вливается в лучшего
//!    соседа любого размера.
//! 3. Удаление: район меньше `target / deletion_divisor` выбрасывается.
//!    Его площадь пропадает и учитывается в отчёте.

use crate::config::MergeSettings;
use crate::district::{District, DistrictArena, DistrictId};
use crate::error::TopologyError;
use crate::geometry::AdjacencyInfo;
use serde::Serialize;

/// Итоги слияния для журнала и результата генерации.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    pub target_area: f64,
    pub growth_passes: usize,
    pub growth_merges: usize,
    pub cleanup_merges: usize,
    pub deleted: usize,
    pub deleted_area: f64,
}

pub struct DistrictMerger<'a> {
    settings: &'a MergeSettings,
    target_area: f64,
}

impl<'a> DistrictMerger<'a> {
    /// `target_area = total_area / desired_count`.
    #[must_use]
    pub fn new(settings: &'a MergeSettings, total_area: f64, desired_count: usize) -> Self {
        Self {
            settings,
            target_area: total_area / desired_count.max(1) as f64,
        }
    }

    #[must_use]
    pub fn target_area(&self) -> f64 {
        self.target_area
    }

    /// Все три фазы подряд.
    pub fn run(&self, arena: &mut DistrictArena) -> Result<MergeReport, TopologyError> {
        let mut report = MergeReport {
            target_area: self.target_area,
            ..MergeReport::default()
        };

        let (passes, merges) = self.grow(arena)?;
        report.growth_passes = passes;
        report.growth_merges = merges;
        tracing::info!(
            target: "countrygen::districts",
            passes,
            merges,
            remaining = arena.len(),
            target_area = self.target_area,
            "districts.growth.done"
        );

        report.cleanup_merges = self.cleanup_small(arena)?;
        let (deleted, deleted_area) = self.delete_slivers(arena);
        report.deleted = deleted;
        report.deleted_area = deleted_area;

        tracing::info!(
            target: "countrygen::districts",
            cleanup_merges = report.cleanup_merges,
            deleted,
            deleted_area,
            districts = arena.len(),
            "districts.cleanup.done"
        );
        Ok(report)
    }

    /// Фаза роста до неподвижной точки. Возвращает (проходы, слияния).
    pub fn grow(&self, arena: &mut DistrictArena) -> Result<(usize, usize), TopologyError> {
        let target = self.target_area;
        let mut passes = 0;
        let mut total = 0;
        loop {
            passes += 1;
            let mut merged = 0;
            for id in arena.ids() {
                let Some(district) = arena.get(id) else {
                    continue; // поглощён ранее в этом проходе
                };
                if district.area() >= target {
                    continue;
                }
                if let Some((partner, info)) = best_neighbour(arena, id, |n| n.area() < target)? {
                    arena.absorb(partner, id, &info)?;
                    merged += 1;
                }
            }
            total += merged;
            if merged == 0 {
                return Ok((passes, total));
            }
        }
    }

    /// Мелкие районы вливаются в лучшего соседа без ограничения размера.
    pub fn cleanup_small(&self, arena: &mut DistrictArena) -> Result<usize, TopologyError> {
        let threshold = self.target_area / self.settings.cleanup_divisor;
        let mut merged = 0;
        for id in arena.ids() {
            let Some(district) = arena.get(id) else {
                continue;
            };
            if district.area() >= threshold {
                continue;
            }
            if let Some((partner, info)) = best_neighbour(arena, id, |_| true)? {
                arena.absorb(partner, id, &info)?;
                merged += 1;
            }
        }
        Ok(merged)
    }

    /// Удаляет оставшиеся осколки. Возвращает их число и суммарную площадь.
    pub fn delete_slivers(&self, arena: &mut DistrictArena) -> (usize, f64) {
        let threshold = self.target_area / self.settings.deletion_divisor;
        let slivers: Vec<DistrictId> = arena.iter().filter(|d| d.area() < threshold).map(|d| d.id).collect();

        let mut area = 0.0;
        for id in &slivers {
            if let Some(removed) = arena.delete(*id) {
                tracing::debug!(
                    target: "countrygen::districts",
                    district = %removed.id,
                    area = removed.area(),
                    "districts.sliver.deleted"
                );
                area += removed.area();
            }
        }
        (slivers.len(), area)
    }
}

/// Сосед с самой длинной общей границей среди прошедших фильтр.
/// При равенстве побеждает меньший идентификатор.
fn best_neighbour(
    arena: &DistrictArena,
    id: DistrictId,
    eligible: impl Fn(&District) -> bool,
) -> Result<Option<(DistrictId, AdjacencyInfo)>, TopologyError> {
    let district = arena.get(id).ok_or(TopologyError::UnknownDistrict(id.0))?;

    let mut best: Option<(DistrictId, AdjacencyInfo)> = None;
    for &n in district.adjacent() {
        let neighbour = arena.get(n).ok_or(TopologyError::UnknownDistrict(n.0))?;
        if !eligible(neighbour) {
            continue;
        }
        let info = arena.adjacency_info(id, n)?;
        if best.as_ref().is_none_or(|(_, b)| info.length() > b.length()) {
            best = Some((n, info));
        }
    }
    Ok(best)
}
