// src/geometry/ring.rs
//! Работа с циклическими последовательностями вершин.
//!
//! Все операции слияния полигонов опираются на эти две функции, поэтому
//! арифметика индексов с переходом через ноль сосредоточена здесь.

use std::ops::Range;

/// Направление обхода кольца.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// Шаг индекса: `+1` или `-1`.
    #[must_use]
    pub fn step(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Следующий индекс в кольце длины `len` в заданном направлении.
#[must_use]
pub fn wrap_index(index: usize, len: usize, direction: Direction) -> usize {
    offset_index(index, len, direction.step())
}

/// Индекс `index + offset` по модулю `len`.
#[must_use]
pub fn offset_index(index: usize, len: usize, offset: isize) -> usize {
    debug_assert!(len > 0, "empty ring");
    (index as isize + offset).rem_euclid(len as isize) as usize
}

/// Поворачивает хранилище кольца так, чтобы диапазон от `start` до `end`
/// (включительно, в направлении `direction`) стал непрерывным срезом.
///
/// Циклический порядок вершин не меняется. Возвращается диапазон, который
/// после поворота занимают вершины: для `Forward` первой в нём окажется
/// `start`, для `Backward` первой будет `end` (хранилище всегда идёт «вперёд»).
pub fn rotate_ring_so_range_is_contiguous<T>(
    ring: &mut [T],
    start: usize,
    end: usize,
    direction: Direction,
) -> Range<usize> {
    let len = ring.len();
    if len == 0 {
        return 0..0;
    }
    let (first, span) = match direction {
        Direction::Forward => (start, (end as isize - start as isize).rem_euclid(len as isize)),
        Direction::Backward => (end, (start as isize - end as isize).rem_euclid(len as isize)),
    };
    ring.rotate_left(first);
    0..span as usize + 1
}
