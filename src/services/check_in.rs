use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    check_in_scan::{CheckInScan, CreateCheckInScanData},
    ticket::Ticket,
};
use crate::services::qr_generator::{TicketCode, TicketCodeError};

#[derive(thiserror::Error, Debug)]
pub enum CheckInError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CheckInResult {
    Success { ticket: Ticket },
    InvalidSignature { error: String },
    TicketNotFound { ticket_id: Uuid },
    WrongEvent { ticket_id: Uuid, ticket_event_id: Uuid },
    TicketCancelled { ticket: Ticket },
    AlreadyCheckedIn { ticket: Ticket },
}

impl CheckInResult {
    /// Returns the result type as a string for the scan log
    pub fn result_type(&self) -> &'static str {
        match self {
            CheckInResult::Success { .. } => "success",
            CheckInResult::InvalidSignature { .. } => "invalid_signature",
            CheckInResult::TicketNotFound { .. } => "ticket_not_found",
            CheckInResult::WrongEvent { .. } => "wrong_event",
            CheckInResult::TicketCancelled { .. } => "ticket_cancelled",
            CheckInResult::AlreadyCheckedIn { .. } => "already_checked_in",
        }
    }

    /// Ticket the scan refers to, if it exists
    pub fn ticket_id(&self) -> Option<Uuid> {
        match self {
            CheckInResult::Success { ticket }
            | CheckInResult::TicketCancelled { ticket }
            | CheckInResult::AlreadyCheckedIn { ticket } => Some(ticket.id),
            CheckInResult::WrongEvent { ticket_id, .. } => Some(*ticket_id),
            CheckInResult::TicketNotFound { .. } | CheckInResult::InvalidSignature { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckInResult::Success { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInStats {
    pub event_id: Uuid,
    pub total_scans: i64,
    pub successful: i64,
    pub rejected: i64,
    pub unique_tickets: i64,
}

/// Decides the outcome for a ticket that was found
fn evaluate(ticket: Ticket, event_id: Uuid) -> CheckInResult {
    if ticket.event_id != event_id {
        CheckInResult::WrongEvent {
            ticket_id: ticket.id,
            ticket_event_id: ticket.event_id,
        }
    } else if !ticket.is_valid() {
        CheckInResult::TicketCancelled { ticket }
    } else if ticket.checked_in {
        CheckInResult::AlreadyCheckedIn { ticket }
    } else {
        CheckInResult::Success { ticket }
    }
}

/// Checks a scanned ticket code in at an event
///
/// 1. Verifies the code signature
/// 2. Looks up the ticket
/// 3. Checks event, status and prior check-in
/// 4. Marks the ticket checked in
/// 5. Records the scan whatever the outcome
#[tracing::instrument(skip(pool, signing_key, raw_code))]
pub async fn check_in(
    pool: &PgPool,
    signing_key: &[u8],
    event_id: Uuid,
    raw_code: &str,
    scanned_by: Option<Uuid>,
) -> Result<CheckInResult, CheckInError> {
    let result = match TicketCode::verify(raw_code, signing_key) {
        Err(e) => {
            tracing::warn!(error = %e, "Rejected ticket code");
            CheckInResult::InvalidSignature {
                error: match e {
                    TicketCodeError::Malformed => "Malformed ticket code".to_string(),
                    TicketCodeError::InvalidSignature => "Signature mismatch".to_string(),
                },
            }
        }
        Ok(code) => match Ticket::find_by_id(pool, code.ticket_id).await? {
            None => {
                tracing::warn!(ticket_id = %code.ticket_id, "Ticket not found");
                CheckInResult::TicketNotFound {
                    ticket_id: code.ticket_id,
                }
            }
            Some(ticket) => match evaluate(ticket, event_id) {
                CheckInResult::Success { ticket } => {
                    // A concurrent scan may have won the race
                    match Ticket::mark_checked_in(pool, ticket.id).await? {
                        Some(updated) => CheckInResult::Success { ticket: updated },
                        None => CheckInResult::AlreadyCheckedIn { ticket },
                    }
                }
                other => other,
            },
        },
    };

    CheckInScan::create(
        pool,
        CreateCheckInScanData {
            event_id,
            ticket_id: result.ticket_id(),
            scan_result: result.result_type().to_string(),
            raw_payload: Some(raw_code.chars().take(512).collect()),
            scanned_by,
        },
    )
    .await?;

    tracing::info!(
        event_id = %event_id,
        ticket_id = ?result.ticket_id(),
        result = result.result_type(),
        "Ticket scanned"
    );

    Ok(result)
}

/// Scan counts for an event
pub async fn stats(pool: &PgPool, event_id: Uuid) -> Result<CheckInStats, CheckInError> {
    let total_scans = CheckInScan::count_by_event_and_result(pool, event_id, None).await?;
    let successful =
        CheckInScan::count_by_event_and_result(pool, event_id, Some("success")).await?;
    let unique_tickets = CheckInScan::count_unique_tickets_by_event(pool, event_id).await?;

    Ok(CheckInStats {
        event_id,
        total_scans,
        successful,
        rejected: total_scans - successful,
        unique_tickets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket(event_id: Uuid, status: &str, checked_in: bool) -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            registration_id: Uuid::new_v4(),
            attendee_id: Uuid::new_v4(),
            event_id,
            ticket_type_id: Uuid::new_v4(),
            email: "kamau@example.com".to_string(),
            qr_code: String::new(),
            status: status.to_string(),
            checked_in,
            checked_in_at: None,
            issue_date: Utc::now(),
        }
    }

    #[test]
    fn test_evaluate_outcomes() {
        let event = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(evaluate(ticket(event, "Valid", false), event).result_type(), "success");
        assert_eq!(
            evaluate(ticket(other, "Valid", false), event).result_type(),
            "wrong_event"
        );
        assert_eq!(
            evaluate(ticket(event, "Cancelled", false), event).result_type(),
            "ticket_cancelled"
        );
        assert_eq!(
            evaluate(ticket(event, "Valid", true), event).result_type(),
            "already_checked_in"
        );
    }

    #[test]
    fn test_result_serializes_with_tag() {
        let result = CheckInResult::TicketNotFound {
            ticket_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["result"], "ticket_not_found");
        assert_eq!(result.ticket_id(), None);
        assert!(!result.is_success());
    }
}
