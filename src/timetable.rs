use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{CampSession, TimeSlot, Venue};

#[derive(Debug, Serialize, Deserialize)]
pub struct TimetableDay {
    pub date: NaiveDate,
    pub weekday: String,
    pub morning: Vec<CampSession>,
    pub afternoon: Vec<CampSession>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Timetable {
    pub days: Vec<TimetableDay>,
    /// Sessions dated outside the configured camp days.
    pub outside_grid: usize,
}

/// Lays sessions onto the camp-days × {Morning, Afternoon} grid.
pub fn build_timetable(days: &[NaiveDate], sessions: &[CampSession]) -> Timetable {
    let grid = days
        .iter()
        .map(|day| {
            let slot = |time_slot: TimeSlot| -> Vec<CampSession> {
                sessions
                    .iter()
                    .filter(|s| s.date == *day && s.time_slot == time_slot)
                    .cloned()
                    .collect()
            };
            TimetableDay {
                date: *day,
                weekday: day.format("%A").to_string(),
                morning: slot(TimeSlot::Morning),
                afternoon: slot(TimeSlot::Afternoon),
            }
        })
        .collect();

    let outside_grid = sessions.iter().filter(|s| !days.contains(&s.date)).count();

    Timetable {
        days: grid,
        outside_grid,
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct VenueOccupancy {
    pub venue_id: i64,
    pub name: String,
    pub capacity: Option<i64>,
    pub sessions: usize,
    pub busy_percent: u32,
}

/// Share of the camp's slots each venue is booked for, capped at 100.
/// Sessions point at venues by name.
pub fn venue_occupancy(
    venues: &[Venue],
    sessions: &[CampSession],
    camp_days: usize,
) -> Vec<VenueOccupancy> {
    let total_slots = camp_days * TimeSlot::ALL.len();

    venues
        .iter()
        .map(|venue| {
            let booked = sessions.iter().filter(|s| s.venue == venue.name).count();
            let busy_percent = if total_slots == 0 {
                0
            } else {
                (booked * 100 / total_slots).min(100) as u32
            };
            VenueOccupancy {
                venue_id: venue.id,
                name: venue.name.clone(),
                capacity: venue.capacity,
                sessions: booked,
                busy_percent,
            }
        })
        .collect()
}
