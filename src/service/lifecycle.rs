use crate::models::tournament::Tournament;

/// Tournaments whose `[startDate, endDate]` window contains `now`.
/// Records with a missing or non-numeric bound are skipped.
pub fn list_active(tournaments: Vec<Tournament>, now: i64) -> Vec<Tournament> {
    tournaments.into_iter().filter(|t| t.is_active(now)).collect()
}

pub fn list_all(tournaments: Vec<Tournament>) -> Vec<Tournament> {
    tournaments
}
