use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::session::{EventSession, SessionBooking};

#[derive(thiserror::Error, Debug)]
pub enum SessionBookingError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Session not found")]
    SessionNotFound,

    #[error("This session is not open for booking")]
    BookingClosed,

    #[error("This session conflicts with another booked session: {0}")]
    Conflict(String),

    #[error("This session is fully booked")]
    Full,

    #[error("You have already booked this session")]
    AlreadyBooked,

    #[error("You have not booked this session")]
    NotBooked,
}

/// A session's time range. The day is the start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSlot {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn day(&self) -> NaiveDate {
        self.start.date()
    }

    /// Same day and intersecting as half-open ranges: a slot ending exactly
    /// when the other starts does not overlap it.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.day() == other.day() && self.start < other.end && self.end > other.start
    }
}

/// First already-booked session that overlaps the candidate
pub fn find_conflict<'a>(
    candidate: &EventSession,
    booked: &'a [EventSession],
) -> Option<&'a EventSession> {
    let slot = candidate.time_slot();
    booked
        .iter()
        .filter(|s| s.id != candidate.id)
        .find(|s| slot.overlaps(&s.time_slot()))
}

/// Books a session for a user.
///
/// Runs the overlap check against the user's bookings in the same event and
/// takes a spot only if one is left; both happen in one transaction that holds
/// the user's row lock so concurrent requests from the same user serialize.
#[tracing::instrument(skip(pool))]
pub async fn book_session(
    pool: &PgPool,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<EventSession, SessionBookingError> {
    let session = EventSession::find_by_id(pool, session_id)
        .await?
        .ok_or(SessionBookingError::SessionNotFound)?;

    if !session.allow_booking {
        return Err(SessionBookingError::BookingClosed);
    }

    let mut tx = pool.begin().await?;

    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let booked =
        EventSession::list_booked_by_user(&mut *tx, user_id, Some(session.event_id)).await?;

    if booked.iter().any(|s| s.id == session.id) {
        return Err(SessionBookingError::AlreadyBooked);
    }

    if let Some(conflict) = find_conflict(&session, &booked) {
        tracing::debug!(
            session_id = %session.id,
            conflicting_session_id = %conflict.id,
            "Session booking rejected: overlap"
        );
        return Err(SessionBookingError::Conflict(conflict.session_title.clone()));
    }

    if !EventSession::reserve_spot(&mut tx, session.id).await? {
        return Err(SessionBookingError::Full);
    }

    if !SessionBooking::create(&mut tx, session.id, user_id).await? {
        return Err(SessionBookingError::AlreadyBooked);
    }

    tx.commit().await?;

    tracing::info!(session_id = %session.id, user_id = %user_id, "Session booked");

    EventSession::find_by_id(pool, session.id)
        .await?
        .ok_or(SessionBookingError::SessionNotFound)
}

/// Cancels a user's session booking and frees the spot
#[tracing::instrument(skip(pool))]
pub async fn cancel_session_booking(
    pool: &PgPool,
    user_id: Uuid,
    session_id: Uuid,
) -> Result<(), SessionBookingError> {
    let mut tx = pool.begin().await?;

    if !SessionBooking::delete(&mut tx, session_id, user_id).await? {
        return Err(SessionBookingError::NotBooked);
    }
    EventSession::release_spot(&mut tx, session_id).await?;

    tx.commit().await?;

    tracing::info!(session_id = %session_id, user_id = %user_id, "Session booking cancelled");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn session(title: &str, start: NaiveDateTime, end: NaiveDateTime) -> EventSession {
        EventSession {
            id: Uuid::new_v4(),
            event_id: Uuid::nil(),
            session_title: title.to_string(),
            description: None,
            start_time: start,
            end_time: end,
            track: Some("Main".to_string()),
            session_type: Some("Talk".to_string()),
            talk_name: None,
            capacity: 50,
            booked_spots: 0,
            allow_booking: true,
        }
    }

    #[test]
    fn test_partial_overlap() {
        let a = TimeSlot::new(at(4, 9, 0), at(4, 10, 0));
        let b = TimeSlot::new(at(4, 9, 30), at(4, 10, 30));

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_touching_boundaries_do_not_overlap() {
        let a = TimeSlot::new(at(4, 9, 0), at(4, 10, 0));
        let b = TimeSlot::new(at(4, 10, 0), at(4, 11, 0));

        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_containment_overlaps() {
        let outer = TimeSlot::new(at(4, 9, 0), at(4, 12, 0));
        let inner = TimeSlot::new(at(4, 10, 0), at(4, 11, 0));

        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
        assert!(outer.overlaps(&outer));
    }

    #[test]
    fn test_different_days_never_overlap() {
        let a = TimeSlot::new(at(4, 9, 0), at(4, 10, 0));
        let b = TimeSlot::new(at(5, 9, 0), at(5, 10, 0));

        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_overlap_matches_interval_intersection() {
        // Every quarter-hour pair within one morning
        let slots: Vec<TimeSlot> = (0..8u32)
            .flat_map(|s| (s + 1..=8).map(move |e| (s, e)))
            .map(|(s, e)| {
                TimeSlot::new(
                    at(4, 9 + s / 4, (s % 4) * 15),
                    at(4, 9 + e / 4, (e % 4) * 15),
                )
            })
            .collect();

        for a in &slots {
            for b in &slots {
                let intersect = a.start.max(b.start) < a.end.min(b.end);
                assert_eq!(a.overlaps(b), intersect, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_find_conflict_returns_first_overlap() {
        let keynote = session("Keynote", at(4, 9, 0), at(4, 10, 0));
        let workshop = session("Workshop", at(4, 10, 0), at(4, 12, 0));
        let booked = vec![keynote.clone(), workshop.clone()];

        let panel = session("Panel", at(4, 9, 30), at(4, 10, 30));
        assert_eq!(
            find_conflict(&panel, &booked).map(|s| s.session_title.as_str()),
            Some("Keynote")
        );

        let lunch = session("Lunch", at(4, 12, 0), at(4, 13, 0));
        assert!(find_conflict(&lunch, &booked).is_none());
    }

    #[test]
    fn test_find_conflict_ignores_candidate_itself() {
        let keynote = session("Keynote", at(4, 9, 0), at(4, 10, 0));
        assert!(find_conflict(&keynote, std::slice::from_ref(&keynote)).is_none());
    }
}
