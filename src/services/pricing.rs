//! Group-booking arithmetic: splitting a shared merchandise cart across
//! attendees and totalling ticket, merchandise and discount amounts.
//!
//! Amounts are integer minor currency units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PricingError {
    #[error("At least one attendee is required")]
    NoAttendees,

    #[error("Unknown ticket type {0} for this event")]
    UnknownTicketType(Uuid),

    #[error("Unknown merchandise {0} for this event")]
    UnknownMerchandise(Uuid),

    #[error("Merchandise quantity must be at least 1")]
    InvalidQuantity,

    #[error("Merchandise quantity cannot exceed {}", MAX_QUANTITY)]
    QuantityTooLarge,

    #[error("Booking amount is too large")]
    AmountOverflow,

    #[error("Discount amount cannot be negative")]
    NegativeDiscount,
}

/// Largest quantity of one item on one line; quantities are stored as INTEGER
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// A merchandise reference and quantity, either in the shared cart or
/// allocated to one attendee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub merchandise: Uuid,
    pub quantity: u32,
}

/// Splits every cart item across `attendee_count` attendees.
///
/// Each attendee gets `quantity / n` units; the first `quantity % n`
/// attendees get one more. Zero allocations are left out.
pub fn distribute_cart(cart: &[CartItem], attendee_count: usize) -> Vec<Vec<CartItem>> {
    let mut allocations = vec![Vec::new(); attendee_count];
    if attendee_count == 0 {
        return allocations;
    }

    let n = attendee_count as u32;
    for item in cart {
        let per_attendee = item.quantity / n;
        let remainder = (item.quantity % n) as usize;

        for (index, attendee_items) in allocations.iter_mut().enumerate() {
            let quantity = per_attendee + u32::from(index < remainder);
            if quantity > 0 {
                attendee_items.push(CartItem {
                    merchandise: item.merchandise,
                    quantity,
                });
            }
        }
    }

    allocations
}

/// Adds `extra` into `items`, summing quantities of the same merchandise.
/// A summed quantity above `MAX_QUANTITY` is rejected.
pub fn merge_items(items: &mut Vec<CartItem>, extra: &[CartItem]) -> Result<(), PricingError> {
    for item in extra {
        match items.iter_mut().find(|i| i.merchandise == item.merchandise) {
            Some(existing) => existing.quantity = add_quantities(existing.quantity, item.quantity)?,
            None => items.push(*item),
        }
    }
    Ok(())
}

pub(crate) fn add_quantities(a: u32, b: u32) -> Result<u32, PricingError> {
    a.checked_add(b)
        .filter(|q| *q <= MAX_QUANTITY)
        .ok_or(PricingError::QuantityTooLarge)
}

fn line_amount(price: i64, quantity: u32) -> Result<i64, PricingError> {
    price
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::AmountOverflow)
}

fn checked_total(amounts: impl IntoIterator<Item = i64>) -> Result<i64, PricingError> {
    amounts
        .into_iter()
        .try_fold(0i64, |total, amount| total.checked_add(amount))
        .ok_or(PricingError::AmountOverflow)
}

/// Server-side prices for one event
#[derive(Debug, Clone, Default)]
pub struct PriceList {
    pub ticket_prices: HashMap<Uuid, i64>,
    pub merchandise_prices: HashMap<Uuid, i64>,
}

impl PriceList {
    fn ticket_price(&self, ticket_type: Uuid) -> Result<i64, PricingError> {
        self.ticket_prices
            .get(&ticket_type)
            .copied()
            .ok_or(PricingError::UnknownTicketType(ticket_type))
    }

    fn merchandise_price(&self, merchandise: Uuid) -> Result<i64, PricingError> {
        self.merchandise_prices
            .get(&merchandise)
            .copied()
            .ok_or(PricingError::UnknownMerchandise(merchandise))
    }
}

/// What one attendee selected before pricing
#[derive(Debug, Clone)]
pub struct AttendeeSelection {
    pub ticket_type: Uuid,
    pub merchandise: Vec<CartItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedItem {
    pub merchandise: Uuid,
    pub quantity: u32,
    pub price: i64,
    pub subtotal: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendeeQuote {
    pub ticket_type: Uuid,
    pub ticket_price: i64,
    pub merchandise: Vec<PricedItem>,
    pub merchandise_total: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingQuote {
    pub attendees: Vec<AttendeeQuote>,
    pub ticket_total: i64,
    pub cart_total: i64,
    pub merchandise_total: i64,
    pub discount_amount: i64,
    pub discount_applied: i64,
    /// Rounding loss from the even discount split; never charged or refunded
    pub discount_unallocated: i64,
    pub total_amount: i64,
}

/// Even per-attendee discount share. The remainder is dropped.
pub fn discount_share(discount_amount: i64, attendee_count: usize) -> i64 {
    if attendee_count == 0 {
        return 0;
    }
    discount_amount / attendee_count as i64
}

/// Prices a group booking: distributes the cart, looks up every price in
/// `prices` and splits the discount evenly.
pub fn quote(
    attendees: &[AttendeeSelection],
    cart: &[CartItem],
    prices: &PriceList,
    discount_amount: i64,
) -> Result<BookingQuote, PricingError> {
    if attendees.is_empty() {
        return Err(PricingError::NoAttendees);
    }
    if discount_amount < 0 {
        return Err(PricingError::NegativeDiscount);
    }
    let all_items = cart
        .iter()
        .chain(attendees.iter().flat_map(|a| a.merchandise.iter()));
    for item in all_items {
        if item.quantity == 0 {
            return Err(PricingError::InvalidQuantity);
        }
        if item.quantity > MAX_QUANTITY {
            return Err(PricingError::QuantityTooLarge);
        }
    }

    let mut cart_lines = Vec::with_capacity(cart.len());
    for item in cart {
        cart_lines.push(line_amount(prices.merchandise_price(item.merchandise)?, item.quantity)?);
    }
    let cart_total = checked_total(cart_lines)?;

    let distributed = distribute_cart(cart, attendees.len());
    let share = discount_share(discount_amount, attendees.len());

    let mut quotes = Vec::with_capacity(attendees.len());
    for (selection, cart_items) in attendees.iter().zip(distributed) {
        let ticket_price = prices.ticket_price(selection.ticket_type)?;

        let mut items = selection.merchandise.clone();
        merge_items(&mut items, &cart_items)?;

        let mut merchandise = Vec::with_capacity(items.len());
        for item in items {
            let price = prices.merchandise_price(item.merchandise)?;
            merchandise.push(PricedItem {
                merchandise: item.merchandise,
                quantity: item.quantity,
                price,
                subtotal: line_amount(price, item.quantity)?,
            });
        }
        let merchandise_total = checked_total(merchandise.iter().map(|i| i.subtotal))?;
        let gross = ticket_price
            .checked_add(merchandise_total)
            .ok_or(PricingError::AmountOverflow)?;

        quotes.push(AttendeeQuote {
            ticket_type: selection.ticket_type,
            ticket_price,
            merchandise,
            merchandise_total,
            discount_amount: share,
            total_amount: (gross - share).max(0),
        });
    }

    let discount_applied = share * quotes.len() as i64;

    Ok(BookingQuote {
        ticket_total: checked_total(quotes.iter().map(|q| q.ticket_price))?,
        merchandise_total: checked_total(quotes.iter().map(|q| q.merchandise_total))?,
        total_amount: checked_total(quotes.iter().map(|q| q.total_amount))?,
        attendees: quotes,
        cart_total,
        discount_amount,
        discount_applied,
        discount_unallocated: discount_amount - discount_applied,
    })
}

/// Booking confirmation code: `BK-` followed by the millisecond timestamp in
/// uppercase base 36
pub fn confirmation_code(at: DateTime<Utc>) -> String {
    format!("BK-{}", to_base36(at.timestamp_millis().unsigned_abs()))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(merchandise: Uuid, quantity: u32) -> CartItem {
        CartItem {
            merchandise,
            quantity,
        }
    }

    fn quantities(allocations: &[Vec<CartItem>], merchandise: Uuid) -> Vec<u32> {
        allocations
            .iter()
            .map(|items| {
                items
                    .iter()
                    .find(|i| i.merchandise == merchandise)
                    .map(|i| i.quantity)
                    .unwrap_or(0)
            })
            .collect()
    }

    #[test]
    fn test_seven_items_three_attendees() {
        let shirt = Uuid::new_v4();
        let allocations = distribute_cart(&[item(shirt, 7)], 3);

        assert_eq!(quantities(&allocations, shirt), vec![3, 2, 2]);
    }

    #[test]
    fn test_allocation_conserves_quantity() {
        let shirt = Uuid::new_v4();
        let mug = Uuid::new_v4();
        let cart = [item(shirt, 11), item(mug, 2)];

        for attendees in 1..=12 {
            let allocations = distribute_cart(&cart, attendees);
            assert_eq!(allocations.len(), attendees);
            for cart_item in &cart {
                let total: u32 = quantities(&allocations, cart_item.merchandise).iter().sum();
                assert_eq!(total, cart_item.quantity, "attendees = {attendees}");
            }
        }
    }

    #[test]
    fn test_remainder_goes_to_first_attendees() {
        let badge = Uuid::new_v4();

        for attendees in 1..=6usize {
            for quantity in 0..=20u32 {
                let allocations = distribute_cart(&[item(badge, quantity)], attendees);
                let got = quantities(&allocations, badge);
                let base = quantity / attendees as u32;
                let remainder = (quantity % attendees as u32) as usize;

                let extra: Vec<usize> = got
                    .iter()
                    .enumerate()
                    .filter(|(_, q)| **q == base + 1)
                    .map(|(i, _)| i)
                    .collect();

                if remainder > 0 {
                    assert_eq!(extra, (0..remainder).collect::<Vec<_>>());
                }
                assert!(got.iter().all(|q| *q == base || *q == base + 1));
            }
        }
    }

    #[test]
    fn test_zero_allocations_omitted() {
        let cap = Uuid::new_v4();
        let allocations = distribute_cart(&[item(cap, 1)], 3);

        assert_eq!(allocations[0], vec![item(cap, 1)]);
        assert!(allocations[1].is_empty());
        assert!(allocations[2].is_empty());
    }

    #[test]
    fn test_no_attendees_yields_no_allocations() {
        assert!(distribute_cart(&[item(Uuid::new_v4(), 4)], 0).is_empty());
    }

    #[test]
    fn test_merge_sums_same_item() {
        let shirt = Uuid::new_v4();
        let mug = Uuid::new_v4();
        let mut items = vec![item(shirt, 1)];

        merge_items(&mut items, &[item(shirt, 2), item(mug, 1)]).unwrap();

        assert_eq!(items, vec![item(shirt, 3), item(mug, 1)]);
    }

    #[test]
    fn test_merge_rejects_quantity_overflow() {
        let shirt = Uuid::new_v4();
        let mut items = vec![item(shirt, 1)];

        assert_eq!(
            merge_items(&mut items, &[item(shirt, u32::MAX)]),
            Err(PricingError::QuantityTooLarge)
        );
        assert_eq!(
            merge_items(&mut items, &[item(shirt, MAX_QUANTITY)]),
            Err(PricingError::QuantityTooLarge)
        );
        assert!(merge_items(&mut items, &[item(shirt, MAX_QUANTITY - 1)]).is_ok());
        assert_eq!(items[0].quantity, MAX_QUANTITY);
    }

    #[test]
    fn test_discount_rounding_loss() {
        // 100 over 3 attendees: 33 each, 1 unit is dropped
        assert_eq!(discount_share(100, 3), 33);
        assert_eq!(discount_share(100, 3) * 3, 99);
        assert_eq!(discount_share(100, 0), 0);
    }

    fn price_list(regular: Uuid, vip: Uuid, shirt: Uuid) -> PriceList {
        PriceList {
            ticket_prices: HashMap::from([(regular, 1000), (vip, 2500)]),
            merchandise_prices: HashMap::from([(shirt, 150)]),
        }
    }

    #[test]
    fn test_quote_group_booking() {
        let regular = Uuid::new_v4();
        let vip = Uuid::new_v4();
        let shirt = Uuid::new_v4();
        let prices = price_list(regular, vip, shirt);

        let attendees = vec![
            AttendeeSelection {
                ticket_type: vip,
                merchandise: vec![],
            },
            AttendeeSelection {
                ticket_type: regular,
                merchandise: vec![],
            },
            AttendeeSelection {
                ticket_type: regular,
                merchandise: vec![],
            },
        ];

        let quote = quote(&attendees, &[item(shirt, 7)], &prices, 100).unwrap();

        assert_eq!(quote.ticket_total, 4500);
        assert_eq!(quote.cart_total, 1050);
        assert_eq!(quote.merchandise_total, 1050);
        assert_eq!(quote.discount_applied, 99);
        assert_eq!(quote.discount_unallocated, 1);

        let first = &quote.attendees[0];
        assert_eq!(first.merchandise[0].quantity, 3);
        assert_eq!(first.merchandise_total, 450);
        assert_eq!(first.discount_amount, 33);
        assert_eq!(first.total_amount, 2500 + 450 - 33);

        assert_eq!(quote.attendees[1].merchandise_total, 300);
        assert_eq!(quote.total_amount, 4500 + 1050 - 99);
    }

    #[test]
    fn test_quote_merges_explicit_merchandise() {
        let regular = Uuid::new_v4();
        let shirt = Uuid::new_v4();
        let prices = price_list(regular, Uuid::new_v4(), shirt);

        let attendees = vec![AttendeeSelection {
            ticket_type: regular,
            merchandise: vec![item(shirt, 1)],
        }];

        let quote = quote(&attendees, &[item(shirt, 2)], &prices, 0).unwrap();

        assert_eq!(quote.attendees[0].merchandise[0].quantity, 3);
        assert_eq!(quote.cart_total, 300);
        assert_eq!(quote.merchandise_total, 450);
    }

    #[test]
    fn test_quote_total_never_negative() {
        let regular = Uuid::new_v4();
        let prices = price_list(regular, Uuid::new_v4(), Uuid::new_v4());
        let attendees = vec![AttendeeSelection {
            ticket_type: regular,
            merchandise: vec![],
        }];

        let quote = quote(&attendees, &[], &prices, 5000).unwrap();

        assert_eq!(quote.attendees[0].total_amount, 0);
        assert_eq!(quote.total_amount, 0);
    }

    #[test]
    fn test_quote_rejects_bad_input() {
        let regular = Uuid::new_v4();
        let shirt = Uuid::new_v4();
        let prices = price_list(regular, Uuid::new_v4(), shirt);
        let unknown = Uuid::new_v4();
        let valid = vec![AttendeeSelection {
            ticket_type: regular,
            merchandise: vec![],
        }];

        assert_eq!(
            quote(&[], &[], &prices, 0),
            Err(PricingError::NoAttendees)
        );
        assert_eq!(
            quote(
                &[AttendeeSelection {
                    ticket_type: unknown,
                    merchandise: vec![],
                }],
                &[],
                &prices,
                0
            ),
            Err(PricingError::UnknownTicketType(unknown))
        );
        assert_eq!(
            quote(&valid, &[item(unknown, 1)], &prices, 0),
            Err(PricingError::UnknownMerchandise(unknown))
        );
        assert_eq!(
            quote(&valid, &[item(shirt, 0)], &prices, 0),
            Err(PricingError::InvalidQuantity)
        );
        assert_eq!(
            quote(&valid, &[], &prices, -1),
            Err(PricingError::NegativeDiscount)
        );
    }

    #[test]
    fn test_quote_rejects_oversized_quantities() {
        let regular = Uuid::new_v4();
        let shirt = Uuid::new_v4();
        let prices = price_list(regular, Uuid::new_v4(), shirt);

        // Explicit line plus a near-maximal cart for the same item
        let with_shirt = vec![AttendeeSelection {
            ticket_type: regular,
            merchandise: vec![item(shirt, 1)],
        }];
        assert_eq!(
            quote(&with_shirt, &[item(shirt, u32::MAX)], &prices, 0),
            Err(PricingError::QuantityTooLarge)
        );
        assert_eq!(
            quote(&with_shirt, &[item(shirt, MAX_QUANTITY)], &prices, 0),
            Err(PricingError::QuantityTooLarge)
        );

        let plain = vec![AttendeeSelection {
            ticket_type: regular,
            merchandise: vec![],
        }];
        let quote = quote(&plain, &[item(shirt, MAX_QUANTITY)], &prices, 0).unwrap();
        assert_eq!(quote.attendees[0].merchandise[0].quantity, MAX_QUANTITY);
        assert_eq!(quote.cart_total, 150 * i64::from(MAX_QUANTITY));
    }

    #[test]
    fn test_quote_rejects_amount_overflow() {
        let regular = Uuid::new_v4();
        let gold_bar = Uuid::new_v4();
        let prices = PriceList {
            ticket_prices: HashMap::from([(regular, 1000)]),
            merchandise_prices: HashMap::from([(gold_bar, i64::MAX / 2)]),
        };
        let attendees = vec![AttendeeSelection {
            ticket_type: regular,
            merchandise: vec![],
        }];

        assert_eq!(
            quote(&attendees, &[item(gold_bar, 3)], &prices, 0),
            Err(PricingError::AmountOverflow)
        );
    }

    #[test]
    fn test_confirmation_code_format() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let code = confirmation_code(at);

        assert_eq!(code, format!("BK-{}", to_base36(1_700_000_000_000)));
        assert!(code.starts_with("BK-"));
        assert!(code[3..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_295), "ZZ");
    }
}
