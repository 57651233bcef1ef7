//! Deterministic demo catalog used to backfill request collections the
//! caller left out. Sized so a default engine run can reach a
//! conflict-free timetable: teacher coverage and room capacity
//! comfortably exceed the session load.

use crate::data::{Availability, Classroom, DAYS, SLOTS_PER_DAY, Session, Teacher};

pub fn sessions() -> Vec<Session> {
    [
        ("Advanced Mathematics", "Mathematics", 32, 3),
        ("Physics Mechanics", "Physics", 28, 2),
        ("Chemistry Lab", "Chemistry", 24, 2),
        ("Biology", "Biology", 30, 2),
        ("World History", "History", 35, 2),
        ("English Literature", "English", 33, 3),
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, (name, subject, students, sessions_per_week))| Session {
        id: idx as u32 + 1,
        name: name.to_string(),
        subject: subject.to_string(),
        students,
        sessions_per_week,
    })
    .collect()
}

pub fn teachers() -> Vec<Teacher> {
    [
        ("John Doe", vec!["Mathematics", "Physics"], full_week()),
        ("Jane Smith", vec!["Chemistry", "Biology"], mornings_and_afternoons()),
        ("Emily Brown", vec!["History", "English"], full_week()),
        ("Michael Lee", vec!["Mathematics", "English"], mornings_and_afternoons()),
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, (name, subjects, availability))| Teacher {
        id: idx as u32 + 1,
        name: name.to_string(),
        subjects: subjects.into_iter().map(str::to_string).collect(),
        availability,
    })
    .collect()
}

pub fn classrooms() -> Vec<Classroom> {
    [("101", 40), ("102", 35), ("201", 45), ("Lab 1", 30)]
        .into_iter()
        .enumerate()
        .map(|(idx, (room_number, capacity))| Classroom {
            id: idx as u32 + 1,
            room_number: room_number.to_string(),
            capacity,
            availability: full_week(),
        })
        .collect()
}

fn full_week() -> Availability {
    Availability::full()
}

/// Free every period except slot 3, the lunch break.
fn mornings_and_afternoons() -> Availability {
    let mut grid = [[true; SLOTS_PER_DAY]; DAYS];
    for row in &mut grid {
        row[3] = false;
    }
    Availability::from_grid(grid)
}
