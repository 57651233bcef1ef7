use crate::chromosome::Chromosome;
use crate::data::Catalog;
use itertools::Itertools;

// Penalty weights. Teacher and room double-bookings are hard constraints;
// the rest are soft.
const TEACHER_CONFLICT_WEIGHT: f64 = 1.0;
const ROOM_CONFLICT_WEIGHT: f64 = 1.0;
const CAPACITY_VIOLATION_WEIGHT: f64 = 0.8;
const CONSECUTIVE_OVERRUN_WEIGHT: f64 = 0.5;
const PREFERENCE_VIOLATION_WEIGHT: f64 = 0.3;

/// A teacher may take at most this many back-to-back periods.
const MAX_CONSECUTIVE_SLOTS: usize = 3;

/// Scores candidate timetables against the catalog they were built from.
///
/// `score` maps a weighted sum of constraint violations into `(0, 1]` via
/// `1 / (1 + penalty)`; a conflict-free chromosome scores exactly 1. The
/// individual counters are public so tests and diagnostics can target one
/// constraint at a time.
pub struct FitnessEvaluator<'a> {
    catalog: &'a Catalog,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        FitnessEvaluator { catalog }
    }

    pub fn score(&self, chromosome: &Chromosome) -> f64 {
        let penalty = self.teacher_conflicts(chromosome) as f64 * TEACHER_CONFLICT_WEIGHT
            + self.room_conflicts(chromosome) as f64 * ROOM_CONFLICT_WEIGHT
            + self.capacity_violations(chromosome) as f64 * CAPACITY_VIOLATION_WEIGHT
            + self.consecutive_overruns(chromosome) as f64 * CONSECUTIVE_OVERRUN_WEIGHT
            + self.preference_violations(chromosome) as f64 * PREFERENCE_VIOLATION_WEIGHT;
        1.0 / (1.0 + penalty)
    }

    /// Unordered gene pairs sharing (day, slot) and the same teacher.
    pub fn teacher_conflicts(&self, chromosome: &Chromosome) -> usize {
        let genes = &chromosome.genes;
        let mut conflicts = 0;
        for (i, a) in genes.iter().enumerate() {
            for b in &genes[i + 1..] {
                if a.day == b.day && a.slot == b.slot && a.teacher == b.teacher {
                    conflicts += 1;
                }
            }
        }
        conflicts
    }

    /// Unordered gene pairs sharing (day, slot) and the same classroom.
    pub fn room_conflicts(&self, chromosome: &Chromosome) -> usize {
        let genes = &chromosome.genes;
        let mut conflicts = 0;
        for (i, a) in genes.iter().enumerate() {
            for b in &genes[i + 1..] {
                if a.day == b.day && a.slot == b.slot && a.classroom == b.classroom {
                    conflicts += 1;
                }
            }
        }
        conflicts
    }

    /// Genes whose session has more students than the assigned room seats.
    pub fn capacity_violations(&self, chromosome: &Chromosome) -> usize {
        chromosome
            .genes
            .iter()
            .filter(|gene| {
                match (
                    self.catalog.sessions.get(gene.session),
                    self.catalog.classrooms.get(gene.classroom),
                ) {
                    (Some(session), Some(classroom)) => session.students > classroom.capacity,
                    _ => false,
                }
            })
            .count()
    }

    /// Excess length of consecutive-slot runs per teacher per day.
    ///
    /// Each maximal run of strictly consecutive slot indices longer than
    /// [`MAX_CONSECUTIVE_SLOTS`] contributes its excess.
    pub fn consecutive_overruns(&self, chromosome: &Chromosome) -> usize {
        let per_teacher_day = chromosome
            .genes
            .iter()
            .map(|gene| ((gene.teacher, gene.day), gene.slot))
            .into_group_map();

        let mut overrun = 0;
        for (_, mut slots) in per_teacher_day {
            slots.sort_unstable();
            let mut run = 1;
            for pair in slots.windows(2) {
                if pair[1] == pair[0] + 1 {
                    run += 1;
                } else {
                    if run > MAX_CONSECUTIVE_SLOTS {
                        overrun += run - MAX_CONSECUTIVE_SLOTS;
                    }
                    run = 1;
                }
            }
            if run > MAX_CONSECUTIVE_SLOTS {
                overrun += run - MAX_CONSECUTIVE_SLOTS;
            }
        }
        overrun
    }

    /// Genes scheduled at a (day, slot) where the assigned teacher is
    /// marked unavailable. The builder filters on availability up front,
    /// but mutation may move a gene onto a blocked slot; this re-validates.
    pub fn preference_violations(&self, chromosome: &Chromosome) -> usize {
        chromosome
            .genes
            .iter()
            .filter(|gene| match self.catalog.teachers.get(gene.teacher) {
                Some(teacher) => !teacher.availability.is_free(gene.day, gene.slot),
                None => false,
            })
            .count()
    }
}
