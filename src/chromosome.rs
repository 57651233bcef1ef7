use crate::data::{Catalog, DAYS, SLOTS_PER_DAY, Timetable, TimetableCell};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

/// One scheduled occurrence: a (day, slot, session, teacher, classroom)
/// assignment. The entity fields are indices into the catalog the
/// chromosome was built against; genes never own entity data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gene {
    pub day: usize,
    pub slot: usize,
    pub session: usize,
    pub teacher: usize,
    pub classroom: usize,
}

/// One complete candidate timetable: an ordered sequence of genes.
///
/// Duplicate (day, slot, teacher) or (day, slot, classroom) pairs are not
/// an invariant violation; the fitness evaluator penalizes them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chromosome {
    pub genes: Vec<Gene>,
}

impl Chromosome {
    pub fn new(genes: Vec<Gene>) -> Self {
        Chromosome { genes }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Projects the chromosome onto the 5x8 display grid. When two genes
    /// land on the same (day, slot) — a conflict the search failed to
    /// remove — the later gene wins the cell.
    pub fn to_timetable(&self, catalog: &Catalog) -> Timetable {
        let mut timetable = Timetable::empty();
        for gene in &self.genes {
            let (Some(session), Some(teacher), Some(classroom)) = (
                catalog.sessions.get(gene.session),
                catalog.teachers.get(gene.teacher),
                catalog.classrooms.get(gene.classroom),
            ) else {
                continue;
            };
            if gene.day < DAYS && gene.slot < SLOTS_PER_DAY {
                timetable.days[gene.day][gene.slot] = Some(TimetableCell {
                    session: session.name.clone(),
                    teacher: teacher.name.clone(),
                    room: classroom.room_number.clone(),
                });
            }
        }
        timetable
    }
}

/// Builds one candidate timetable from the catalog.
///
/// For every required occurrence of every session, days and slots are
/// probed in shuffled order until a (day, slot) is found with at least one
/// subject-qualified available teacher and one large-enough available
/// room; one of each is then picked uniformly at random. An occurrence
/// with no feasible slot is dropped rather than failing the build; the
/// returned count lets callers surface that degradation instead of
/// inferring it from a short chromosome.
pub fn build<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> (Chromosome, usize) {
    let mut genes = Vec::new();
    let mut dropped = 0;
    let mut days: Vec<usize> = (0..DAYS).collect();
    let mut slots: Vec<usize> = (0..SLOTS_PER_DAY).collect();

    for (session_idx, session) in catalog.sessions.iter().enumerate() {
        for _ in 0..session.sessions_per_week {
            days.shuffle(rng);
            let mut placed = false;

            'occurrence: for &day in &days {
                slots.shuffle(rng);
                for &slot in &slots {
                    let qualified: Vec<usize> = catalog
                        .teachers
                        .iter()
                        .enumerate()
                        .filter(|(_, t)| {
                            t.teaches(&session.subject) && t.availability.is_free(day, slot)
                        })
                        .map(|(idx, _)| idx)
                        .collect();
                    let suitable: Vec<usize> = catalog
                        .classrooms
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| {
                            c.capacity >= session.students && c.availability.is_free(day, slot)
                        })
                        .map(|(idx, _)| idx)
                        .collect();

                    if let (Some(&teacher), Some(&classroom)) =
                        (qualified.choose(rng), suitable.choose(rng))
                    {
                        genes.push(Gene {
                            day,
                            slot,
                            session: session_idx,
                            teacher,
                            classroom,
                        });
                        placed = true;
                        break 'occurrence;
                    }
                }
            }

            if !placed {
                dropped += 1;
            }
        }
    }

    (Chromosome { genes }, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Availability, Classroom, Session, Teacher};
    use crate::fitness::FitnessEvaluator;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn teacher(id: u32, name: &str, subjects: &[&str], availability: Availability) -> Teacher {
        Teacher {
            id,
            name: name.to_string(),
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            availability,
        }
    }

    fn classroom(id: u32, room_number: &str, capacity: u32) -> Classroom {
        Classroom {
            id,
            room_number: room_number.to_string(),
            capacity,
            availability: Availability::full(),
        }
    }

    fn session(id: u32, subject: &str, students: u32, per_week: u32) -> Session {
        Session {
            id,
            name: subject.to_string(),
            subject: subject.to_string(),
            students,
            sessions_per_week: per_week,
        }
    }

    #[test]
    fn single_feasible_session_yields_one_perfect_gene() {
        let catalog = Catalog {
            sessions: vec![session(1, "Mathematics", 25, 1)],
            teachers: vec![teacher(1, "Ada Price", &["Mathematics"], Availability::full())],
            classrooms: vec![classroom(1, "101", 30)],
        };
        let mut rng = StdRng::seed_from_u64(42);

        let (chromosome, dropped) = build(&catalog, &mut rng);

        assert_eq!(chromosome.len(), 1);
        assert_eq!(dropped, 0);
        let gene = chromosome.genes[0];
        assert_eq!((gene.session, gene.teacher, gene.classroom), (0, 0, 0));
        assert_eq!(FitnessEvaluator::new(&catalog).score(&chromosome), 1.0);
    }

    #[test]
    fn every_required_occurrence_is_placed_when_feasible() {
        let catalog = Catalog {
            sessions: vec![
                session(1, "Mathematics", 25, 3),
                session(2, "Physics", 20, 2),
            ],
            teachers: vec![
                teacher(1, "Ada Price", &["Mathematics"], Availability::full()),
                teacher(2, "Ben Osei", &["Physics"], Availability::full()),
            ],
            classrooms: vec![classroom(1, "101", 30), classroom(2, "102", 30)],
        };
        let mut rng = StdRng::seed_from_u64(7);

        let (chromosome, dropped) = build(&catalog, &mut rng);

        assert_eq!(chromosome.len(), 5);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn infeasible_occurrences_are_dropped_and_counted() {
        // No teacher covers Chemistry; both Chemistry occurrences drop.
        let catalog = Catalog {
            sessions: vec![session(1, "Chemistry", 20, 2), session(2, "Mathematics", 20, 1)],
            teachers: vec![teacher(1, "Ada Price", &["Mathematics"], Availability::full())],
            classrooms: vec![classroom(1, "101", 30)],
        };
        let mut rng = StdRng::seed_from_u64(3);

        let (chromosome, dropped) = build(&catalog, &mut rng);

        assert_eq!(chromosome.len(), 1);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn builder_respects_capacity_and_availability_filters() {
        // Teacher only free Monday slot 0; only the large room fits.
        let mut grid = [[false; SLOTS_PER_DAY]; DAYS];
        grid[0][0] = true;
        let catalog = Catalog {
            sessions: vec![session(1, "Mathematics", 35, 1)],
            teachers: vec![teacher(1, "Ada Price", &["Mathematics"], Availability::from_grid(grid))],
            classrooms: vec![classroom(1, "101", 30), classroom(2, "Aula", 80)],
        };
        let mut rng = StdRng::seed_from_u64(11);

        let (chromosome, dropped) = build(&catalog, &mut rng);

        assert_eq!(dropped, 0);
        assert_eq!(chromosome.len(), 1);
        let gene = chromosome.genes[0];
        assert_eq!((gene.day, gene.slot), (0, 0));
        assert_eq!(gene.classroom, 1);
    }

    #[test]
    fn empty_catalog_builds_empty_chromosome() {
        let catalog = Catalog {
            sessions: vec![],
            teachers: vec![],
            classrooms: vec![],
        };
        let mut rng = StdRng::seed_from_u64(0);

        let (chromosome, dropped) = build(&catalog, &mut rng);

        assert!(chromosome.is_empty());
        assert_eq!(dropped, 0);
    }

    #[test]
    fn timetable_projection_places_genes_in_cells() {
        let catalog = Catalog {
            sessions: vec![session(1, "Mathematics", 25, 1)],
            teachers: vec![teacher(1, "Ada Price", &["Mathematics"], Availability::full())],
            classrooms: vec![classroom(1, "101", 30)],
        };
        let chromosome = Chromosome::new(vec![Gene {
            day: 2,
            slot: 5,
            session: 0,
            teacher: 0,
            classroom: 0,
        }]);

        let timetable = chromosome.to_timetable(&catalog);

        let cell = timetable.cell(2, 5).expect("cell should be filled");
        assert_eq!(cell.session, "Mathematics");
        assert_eq!(cell.teacher, "Ada Price");
        assert_eq!(cell.room, "101");
        assert!(timetable.cell(0, 0).is_none());
    }
}
