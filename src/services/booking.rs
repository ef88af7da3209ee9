use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::{
    discount::DiscountCode,
    event::Event,
    merchandise::Merchandise,
    registration::{
        AttendeeMerchandise, CreateAttendeeData, CreateRegistrationData, Registration,
        RegistrationAttendee,
    },
    ticket::{CreateTicketData, Ticket},
    ticket_type::TicketType,
};
use crate::services::pricing::{
    self, AttendeeSelection, BookingQuote, CartItem, PriceList, PricingError,
};
use crate::services::qr_generator::TicketCode;

#[derive(thiserror::Error, Debug)]
pub enum BookingError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("{0}")]
    Pricing(#[from] pricing::PricingError),

    #[error("Attendee {position}: {reason}")]
    InvalidAttendee { position: usize, reason: &'static str },

    #[error("A valid booker email is required")]
    InvalidEmail,

    #[error("Event not found")]
    EventNotFound,

    #[error("This event is not open for registration")]
    EventNotOpen,

    #[error("Invalid or inactive discount code")]
    InvalidDiscountCode,

    #[error("This event is fully booked")]
    FullyBooked,

    #[error("Not enough stock for {0}")]
    OutOfStock(String),
}

/// One attendee as submitted by the client. Prices are never taken from here.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendeeInput {
    #[serde(alias = "name")]
    pub full_name: String,
    pub email: String,
    pub ticket_type: Uuid,
    #[serde(default)]
    pub merchandise: Vec<CartItem>,
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub event_id: Uuid,
    pub email: String,
    pub user_id: Option<Uuid>,
    pub discount_code: Option<String>,
    pub attendees: Vec<AttendeeInput>,
    pub cart: Vec<CartItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedTicket {
    pub ticket_id: Uuid,
    pub attendee_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub ticket_type: Uuid,
    pub qr_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub registration_id: Uuid,
    pub confirmation_code: String,
    pub status: String,
    pub payment_status: String,
    pub tickets: Vec<IssuedTicket>,
    pub quote: BookingQuote,
}

pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

/// Checks every attendee has a name and an email
pub fn validate_attendees(attendees: &[AttendeeInput]) -> Result<(), BookingError> {
    if attendees.is_empty() {
        return Err(pricing::PricingError::NoAttendees.into());
    }

    for (index, attendee) in attendees.iter().enumerate() {
        let position = index + 1;
        if attendee.full_name.trim().is_empty() {
            return Err(BookingError::InvalidAttendee {
                position,
                reason: "full name is required",
            });
        }
        if !is_plausible_email(&attendee.email) {
            return Err(BookingError::InvalidAttendee {
                position,
                reason: "a valid email is required",
            });
        }
    }

    Ok(())
}

/// Total units of each merchandise across all attendees. Ordered by id so
/// concurrent bookings take row locks in the same order.
pub fn stock_demand(quote: &BookingQuote) -> Result<BTreeMap<Uuid, i32>, PricingError> {
    let mut demand: BTreeMap<Uuid, u32> = BTreeMap::new();
    for attendee in &quote.attendees {
        for item in &attendee.merchandise {
            let total = demand.entry(item.merchandise).or_insert(0);
            *total = pricing::add_quantities(*total, item.quantity)?;
        }
    }

    demand
        .into_iter()
        .map(|(id, quantity)| {
            i32::try_from(quantity)
                .map(|q| (id, q))
                .map_err(|_| PricingError::QuantityTooLarge)
        })
        .collect()
}

/// Whether `requested` more tickets fit next to `issued` valid ones. A missing
/// or non-positive capacity means the event is unlimited.
pub fn has_capacity(capacity: Option<i32>, issued: i64, requested: usize) -> bool {
    match capacity {
        Some(capacity) if capacity > 0 => {
            issued.saturating_add(requested as i64) <= i64::from(capacity)
        }
        _ => true,
    }
}

/// Everything needed to price a booking for one event
struct EventCatalog {
    event: Event,
    prices: PriceList,
    merchandise_names: HashMap<Uuid, String>,
    discount_amount: i64,
}

async fn load_catalog(
    pool: &PgPool,
    event_id: Uuid,
    discount_code: Option<&str>,
) -> Result<EventCatalog, BookingError> {
    let event = Event::find_by_id(pool, event_id)
        .await?
        .ok_or(BookingError::EventNotFound)?;

    if !event.is_published {
        return Err(BookingError::EventNotOpen);
    }

    let ticket_types = TicketType::list_by_event(pool, event.id).await?;
    let merchandise = Merchandise::list_by_event(pool, event.id).await?;

    let prices = PriceList {
        ticket_prices: ticket_types.iter().map(|t| (t.id, t.ticket_price)).collect(),
        merchandise_prices: merchandise.iter().map(|m| (m.id, m.price)).collect(),
    };
    let merchandise_names = merchandise
        .into_iter()
        .map(|m| (m.id, m.item_name))
        .collect();

    let discount_amount = match discount_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => {
            DiscountCode::find_active(pool, event.id, code)
                .await?
                .ok_or(BookingError::InvalidDiscountCode)?
                .amount
        }
        None => 0,
    };

    Ok(EventCatalog {
        event,
        prices,
        merchandise_names,
        discount_amount,
    })
}

fn selections(attendees: &[AttendeeInput]) -> Vec<AttendeeSelection> {
    attendees
        .iter()
        .map(|a| AttendeeSelection {
            ticket_type: a.ticket_type,
            merchandise: a.merchandise.clone(),
        })
        .collect()
}

/// Prices a booking with server-side prices without persisting anything
#[tracing::instrument(skip(pool, attendees, cart))]
pub async fn quote_booking(
    pool: &PgPool,
    event_id: Uuid,
    discount_code: Option<&str>,
    attendees: &[AttendeeInput],
    cart: &[CartItem],
) -> Result<BookingQuote, BookingError> {
    validate_attendees(attendees)?;

    let catalog = load_catalog(pool, event_id, discount_code).await?;

    let quote = pricing::quote(
        &selections(attendees),
        cart,
        &catalog.prices,
        catalog.discount_amount,
    )?;

    Ok(quote)
}

/// Creates a group booking
///
/// 1. Validates attendees and the booker email
/// 2. Loads the event, its prices and the discount code
/// 3. Prices the booking
/// 4. In one transaction: checks event capacity, takes merchandise stock,
///    inserts the registration, attendee lines and one signed ticket per
///    attendee
#[tracing::instrument(
    skip(pool, ticket_key, request),
    fields(event_id = %request.event_id, attendees = request.attendees.len())
)]
pub async fn create_booking(
    pool: &PgPool,
    ticket_key: &[u8],
    request: BookingRequest,
) -> Result<BookingConfirmation, BookingError> {
    use std::time::Instant;
    let start_time = Instant::now();

    // 1. Input
    validate_attendees(&request.attendees)?;
    if !is_plausible_email(&request.email) {
        return Err(BookingError::InvalidEmail);
    }

    // 2. Event catalog
    let catalog = load_catalog(pool, request.event_id, request.discount_code.as_deref()).await?;
    let event = &catalog.event;

    // 3. Pricing
    let quote = pricing::quote(
        &selections(&request.attendees),
        &request.cart,
        &catalog.prices,
        catalog.discount_amount,
    )?;

    tracing::debug!(
        total_amount = quote.total_amount,
        discount_applied = quote.discount_applied,
        discount_unallocated = quote.discount_unallocated,
        "Booking priced"
    );

    // 4. Persist
    let mut tx = pool.begin().await?;

    if event.capacity.is_some_and(|c| c > 0) {
        let issued = Ticket::count_valid_for_event_locked(&mut tx, event.id).await?;
        if !has_capacity(event.capacity, issued, request.attendees.len()) {
            tracing::info!(issued, capacity = ?event.capacity, "Booking rejected: event full");
            return Err(BookingError::FullyBooked);
        }
    }

    for (merchandise_id, quantity) in stock_demand(&quote)? {
        if !Merchandise::reserve_stock(&mut tx, merchandise_id, quantity).await? {
            let name = catalog
                .merchandise_names
                .get(&merchandise_id)
                .cloned()
                .unwrap_or_else(|| merchandise_id.to_string());
            return Err(BookingError::OutOfStock(name));
        }
    }

    let registration = Registration::create(
        &mut tx,
        CreateRegistrationData {
            event_id: event.id,
            email: request.email.trim().to_string(),
            user_id: request.user_id,
            discount_code: request.discount_code.clone().filter(|c| !c.trim().is_empty()),
            discount_amount: quote.discount_applied,
            total_amount: quote.total_amount,
            confirmation_code: pricing::confirmation_code(Utc::now()),
        },
    )
    .await?;

    let mut tickets = Vec::with_capacity(request.attendees.len());
    for (index, (input, line)) in request.attendees.iter().zip(&quote.attendees).enumerate() {
        let attendee = RegistrationAttendee::create(
            &mut tx,
            CreateAttendeeData {
                registration_id: registration.id,
                position: index as i32 + 1,
                full_name: input.full_name.trim().to_string(),
                email: input.email.trim().to_string(),
                ticket_type_id: line.ticket_type,
                ticket_price: line.ticket_price,
                merchandise_total: line.merchandise_total,
                discount_amount: line.discount_amount,
                total_amount: line.total_amount,
            },
        )
        .await?;

        for item in &line.merchandise {
            AttendeeMerchandise::create(
                &mut tx,
                attendee.id,
                item.merchandise,
                i32::try_from(item.quantity).map_err(|_| PricingError::QuantityTooLarge)?,
                item.price,
            )
            .await?;
        }

        let ticket_id = Uuid::new_v4();
        let qr_code = TicketCode::issue(ticket_id, ticket_key).encode();

        let ticket = Ticket::create(
            &mut tx,
            CreateTicketData {
                id: ticket_id,
                registration_id: registration.id,
                attendee_id: attendee.id,
                event_id: event.id,
                ticket_type_id: line.ticket_type,
                email: attendee.email.clone(),
                qr_code,
            },
        )
        .await?;

        tickets.push(IssuedTicket {
            ticket_id: ticket.id,
            attendee_id: attendee.id,
            full_name: attendee.full_name,
            email: ticket.email,
            ticket_type: ticket.ticket_type_id,
            qr_code: ticket.qr_code,
        });
    }

    tx.commit().await?;

    tracing::info!(
        registration_id = %registration.id,
        confirmation_code = %registration.confirmation_code,
        tickets = tickets.len(),
        total_amount = registration.total_amount,
        duration_ms = start_time.elapsed().as_millis(),
        "Booking created"
    );

    Ok(BookingConfirmation {
        registration_id: registration.id,
        confirmation_code: registration.confirmation_code,
        status: registration.status,
        payment_status: registration.payment_status,
        tickets,
        quote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pricing::{AttendeeQuote, PricedItem};

    fn attendee(name: &str, email: &str) -> AttendeeInput {
        AttendeeInput {
            full_name: name.to_string(),
            email: email.to_string(),
            ticket_type: Uuid::new_v4(),
            merchandise: vec![],
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(is_plausible_email("wanjiru@example.com"));
        assert!(!is_plausible_email("wanjiru.example.com"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("wanjiru@"));
    }

    #[test]
    fn test_validate_attendees() {
        assert!(matches!(
            validate_attendees(&[]),
            Err(BookingError::Pricing(pricing::PricingError::NoAttendees))
        ));

        let ok = vec![attendee("Wanjiru", "wanjiru@example.com")];
        assert!(validate_attendees(&ok).is_ok());

        let missing_name = vec![
            attendee("Wanjiru", "wanjiru@example.com"),
            attendee("  ", "otieno@example.com"),
        ];
        match validate_attendees(&missing_name) {
            Err(BookingError::InvalidAttendee { position, .. }) => assert_eq!(position, 2),
            other => panic!("unexpected: {other:?}"),
        }

        let bad_email = vec![attendee("Otieno", "otieno")];
        assert!(matches!(
            validate_attendees(&bad_email),
            Err(BookingError::InvalidAttendee { position: 1, .. })
        ));
    }

    #[test]
    fn test_attendee_input_defaults_merchandise() {
        let ticket_type = Uuid::new_v4();
        let input: AttendeeInput = serde_json::from_value(serde_json::json!({
            "full_name": "Achieng",
            "email": "achieng@example.com",
            "ticket_type": ticket_type,
        }))
        .unwrap();

        assert_eq!(input.ticket_type, ticket_type);
        assert!(input.merchandise.is_empty());
    }

    #[test]
    fn test_attendee_input_accepts_name_field() {
        let input: AttendeeInput = serde_json::from_value(serde_json::json!({
            "name": "Kamau",
            "email": "kamau@example.com",
            "ticket_type": Uuid::new_v4(),
        }))
        .unwrap();

        assert_eq!(input.full_name, "Kamau");
    }

    #[test]
    fn test_stock_demand_sums_across_attendees() {
        let shirt = Uuid::new_v4();
        let mug = Uuid::new_v4();
        let line = |items: Vec<(Uuid, u32)>| AttendeeQuote {
            ticket_type: Uuid::nil(),
            ticket_price: 0,
            merchandise: items
                .into_iter()
                .map(|(merchandise, quantity)| PricedItem {
                    merchandise,
                    quantity,
                    price: 10,
                    subtotal: 10 * i64::from(quantity),
                })
                .collect(),
            merchandise_total: 0,
            discount_amount: 0,
            total_amount: 0,
        };

        let quote = BookingQuote {
            attendees: vec![line(vec![(shirt, 3), (mug, 1)]), line(vec![(shirt, 2)])],
            ticket_total: 0,
            cart_total: 0,
            merchandise_total: 0,
            discount_amount: 0,
            discount_applied: 0,
            discount_unallocated: 0,
            total_amount: 0,
        };

        let demand = stock_demand(&quote).unwrap();
        assert_eq!(demand.get(&shirt), Some(&5));
        assert_eq!(demand.get(&mug), Some(&1));

        let oversized = BookingQuote {
            attendees: vec![
                line(vec![(shirt, pricing::MAX_QUANTITY)]),
                line(vec![(shirt, 1)]),
            ],
            ..quote
        };
        assert!(matches!(
            stock_demand(&oversized),
            Err(PricingError::QuantityTooLarge)
        ));
    }

    #[test]
    fn test_capacity_decision() {
        // No limit configured
        assert!(has_capacity(None, 10_000, 5));
        assert!(has_capacity(Some(0), 0, 1));
        assert!(has_capacity(Some(-3), 7, 1));

        // Exactly full after this booking
        assert!(has_capacity(Some(10), 8, 2));
        // One over
        assert!(!has_capacity(Some(10), 8, 3));
        assert!(!has_capacity(Some(10), 10, 1));
    }
}
