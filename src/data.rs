use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type TeacherId = u32;
pub type ClassroomId = u32;
pub type SessionId = u32;

/// Fixed weekly calendar: 5 teaching days of 8 periods each.
pub const DAYS: usize = 5;
pub const SLOTS_PER_DAY: usize = 8;

pub const DAY_NAMES: [&str; DAYS] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];
pub const SLOT_NAMES: [&str; SLOTS_PER_DAY] =
    ["9:00", "10:00", "11:00", "12:00", "1:00", "2:00", "3:00", "4:00"];

/// Weekly availability grid, day x slot -> free.
///
/// Wire format is a map from lowercase day name to an 8-element bool array.
/// Missing days are treated as fully unavailable; short rows are padded
/// with `false`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "AvailabilityWire", into = "AvailabilityWire")]
pub struct Availability {
    grid: [[bool; SLOTS_PER_DAY]; DAYS],
}

impl Availability {
    /// Grid with every slot of every day free.
    pub fn full() -> Self {
        Availability {
            grid: [[true; SLOTS_PER_DAY]; DAYS],
        }
    }

    pub fn from_grid(grid: [[bool; SLOTS_PER_DAY]; DAYS]) -> Self {
        Availability { grid }
    }

    pub fn is_free(&self, day: usize, slot: usize) -> bool {
        self.grid
            .get(day)
            .and_then(|row| row.get(slot))
            .copied()
            .unwrap_or(false)
    }
}

#[derive(Serialize, Deserialize)]
struct AvailabilityWire {
    #[serde(default)]
    monday: Vec<bool>,
    #[serde(default)]
    tuesday: Vec<bool>,
    #[serde(default)]
    wednesday: Vec<bool>,
    #[serde(default)]
    thursday: Vec<bool>,
    #[serde(default)]
    friday: Vec<bool>,
}

impl From<AvailabilityWire> for Availability {
    fn from(wire: AvailabilityWire) -> Self {
        let rows = [
            wire.monday,
            wire.tuesday,
            wire.wednesday,
            wire.thursday,
            wire.friday,
        ];
        let mut grid = [[false; SLOTS_PER_DAY]; DAYS];
        for (day, row) in rows.into_iter().enumerate() {
            for (slot, free) in row.into_iter().take(SLOTS_PER_DAY).enumerate() {
                grid[day][slot] = free;
            }
        }
        Availability { grid }
    }
}

impl From<Availability> for AvailabilityWire {
    fn from(availability: Availability) -> Self {
        let mut rows = availability.grid.iter().map(|row| row.to_vec());
        AvailabilityWire {
            monday: rows.next().unwrap_or_default(),
            tuesday: rows.next().unwrap_or_default(),
            wednesday: rows.next().unwrap_or_default(),
            thursday: rows.next().unwrap_or_default(),
            friday: rows.next().unwrap_or_default(),
        }
    }
}

/// A course requiring a number of scheduled occurrences per week.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub subject: String,
    pub students: u32,
    #[serde(default = "default_sessions_per_week")]
    pub sessions_per_week: u32,
}

fn default_sessions_per_week() -> u32 {
    1
}

/// A teacher with the subjects they cover and their weekly availability.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    pub subjects: Vec<String>,
    pub availability: Availability,
}

impl Teacher {
    pub fn teaches(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }
}

/// A physical room with a seating capacity and weekly availability.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: ClassroomId,
    pub room_number: String,
    pub capacity: u32,
    pub availability: Availability,
}

/// The complete, immutable input to the engine.
///
/// Passed in explicitly by the caller; the engine never reads it from disk
/// or global state.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub sessions: Vec<Session>,
    pub teachers: Vec<Teacher>,
    pub classrooms: Vec<Classroom>,
}

/// One filled cell of the output grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableCell {
    pub session: String,
    pub teacher: String,
    pub room: String,
}

/// The formatted weekly timetable: a 5x8 grid of optional cells, a
/// read-only view derived from the best chromosome of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub days: Vec<Vec<Option<TimetableCell>>>,
}

impl Timetable {
    pub fn empty() -> Self {
        Timetable {
            days: vec![vec![None; SLOTS_PER_DAY]; DAYS],
        }
    }

    pub fn cell(&self, day: usize, slot: usize) -> Option<&TimetableCell> {
        self.days.get(day)?.get(slot)?.as_ref()
    }
}

impl fmt::Display for Timetable {
    /// Plain-text grid, one row per period with the days as columns.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WIDTH: usize = 28;
        write!(f, "{:>5} ", "")?;
        for day in DAY_NAMES {
            write!(f, "| {day:WIDTH$} ")?;
        }
        writeln!(f)?;
        for slot in 0..SLOTS_PER_DAY {
            write!(f, "{:>5} ", SLOT_NAMES[slot])?;
            for day in 0..DAYS {
                match self.cell(day, slot) {
                    Some(cell) => {
                        let text =
                            format!("{} / {} / Room {}", cell.session, cell.teacher, cell.room);
                        write!(f, "| {text:WIDTH$.WIDTH$} ")?;
                    }
                    None => write!(f, "| {:WIDTH$} ", "---")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
