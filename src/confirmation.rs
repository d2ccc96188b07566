//! Booking confirmation
//!
//! The confirmation screen reads the checkout hand-off parameters, then
//! fabricates the booking record: reference, PNRs, transaction id. Passenger
//! names, seats, contact and payment amount come from [`ConfirmationStub`],
//! not from what was typed at checkout.

use crate::checkout::{ContactInfo, PassengerType, PaymentMethod, Traveler};
use crate::details::{Baggage, Terminals};
use crate::pricing::{AddOns, PriceBreakdown};
use crate::query::{format_date, BookingContext, DateStyle, QueryParams};
use crate::{BookingError, TravelClass, TripType};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

const PNR_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const PNR_LENGTH: usize = 6;
const DEFAULT_ORIGIN: &str = "kanpur";
const DEFAULT_DESTINATION: &str = "lucknow";

/// Checkout hand-off, decoded from the confirmation URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub context: BookingContext,
    pub breakdown: PriceBreakdown,
    pub contact: ContactInfo,
    pub passengers: Vec<Traveler>,
    pub add_ons: AddOns,
    pub payment_method: PaymentMethod,
}

impl CheckoutSummary {
    pub fn from_params(params: &QueryParams) -> Self {
        let passengers = params
            .get("passengers")
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| match serde_json::from_str::<Vec<Traveler>>(raw) {
                Ok(passengers) => Some(passengers),
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed passengers parameter");
                    None
                }
            })
            .unwrap_or_default();
        let add_ons = params
            .get("addOns")
            .and_then(|raw| serde_json::from_str::<AddOns>(raw).ok())
            .unwrap_or_default();

        Self {
            context: BookingContext::from_params(params),
            breakdown: PriceBreakdown {
                base_price: params.get_u64_or("basePrice", 0),
                add_ons_total: params.get_u64_or("addOnsTotal", 0),
                taxes: params.get_u64_or("taxes", 0),
                total_price: params.get_u64_or("totalPrice", 0),
            },
            contact: ContactInfo {
                email: params.get_or("email", "").to_string(),
                phone: params.get_or("phone", "").to_string(),
                country_code: params.get_or("countryCode", "+91").to_string(),
            },
            passengers,
            add_ons,
            payment_method: params
                .get("paymentMethod")
                .and_then(|m| m.parse().ok())
                .unwrap_or_default(),
        }
    }
}

/// A named passenger with a seat, as printed on the ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAssignment {
    #[serde(rename = "type")]
    pub passenger_type: PassengerType,
    pub name: String,
    pub seat_number: String,
}

impl SeatAssignment {
    fn new(passenger_type: PassengerType, name: &str, seat_number: &str) -> Self {
        Self {
            passenger_type,
            name: name.to_string(),
            seat_number: seat_number.to_string(),
        }
    }
}

/// Placeholder data shown on every confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfirmationStub {
    /// First entry of each passenger type is used.
    pub passengers: Vec<SeatAssignment>,
    pub contact_email: String,
    pub contact_phone: String,
    pub payment_method: String,
    pub payment_amount: u64,
}

impl Default for ConfirmationStub {
    fn default() -> Self {
        Self {
            passengers: vec![
                SeatAssignment::new(PassengerType::Adult, "John Doe", "12A"),
                SeatAssignment::new(PassengerType::Child, "Jane Doe", "12B"),
                SeatAssignment::new(PassengerType::Infant, "Baby Doe", "Lap"),
            ],
            contact_email: "john.doe@email.com".to_string(),
            contact_phone: "+91 9876543210".to_string(),
            payment_method: "Credit Card".to_string(),
            payment_amount: 4500,
        }
    }
}

impl ConfirmationStub {
    fn passenger(&self, passenger_type: PassengerType) -> Option<&SeatAssignment> {
        self.passengers
            .iter()
            .find(|p| p.passenger_type == passenger_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightLeg {
    pub airline: String,
    pub airline_logo: String,
    pub flight_number: String,
    pub aircraft: String,
    pub from: String,
    pub from_city: String,
    pub to: String,
    pub to_city: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub departure_date: String,
    pub duration: String,
    pub terminal: Terminals,
    pub class: TravelClass,
    pub pnr: String,
}

impl FlightLeg {
    /// `Sat, Jun 1, 10:30`
    pub fn departure_display(&self) -> String {
        format!(
            "{}, {}",
            format_date(&self.departure_date, DateStyle::Short),
            self.departure_time
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSummary {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub method: String,
    pub amount: u64,
    pub transaction_id: String,
}

/// Terminal record of the flow; built once per confirmation view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_reference: String,
    pub status: String,
    pub booked_at: DateTime<Utc>,
    pub flight: FlightLeg,
    pub return_flight: Option<FlightLeg>,
    pub passengers: Vec<SeatAssignment>,
    pub contact: ContactSummary,
    pub payment: PaymentSummary,
    pub baggage: Baggage,
}

fn last_digits(value: i64, count: usize) -> String {
    let digits = value.to_string();
    digits[digits.len().saturating_sub(count)..].to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn generate_pnr<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..PNR_LENGTH)
        .filter_map(|_| PNR_ALPHABET.choose(&mut *rng).map(|b| *b as char))
        .collect()
}

/// Build the confirmation with the current time and thread-local RNG.
pub fn confirm(summary: &CheckoutSummary, stub: &ConfirmationStub) -> BookingConfirmation {
    synthesize(summary, stub, Utc::now(), &mut rand::thread_rng())
}

#[instrument(level = "info", skip_all, fields(flight_id = %summary.context.flight_id))]
pub fn synthesize<R: Rng + ?Sized>(
    summary: &CheckoutSummary,
    stub: &ConfirmationStub,
    now: DateTime<Utc>,
    rng: &mut R,
) -> BookingConfirmation {
    let query = &summary.context.query;
    let origin = match query.origin() {
        "" => DEFAULT_ORIGIN,
        origin => origin,
    };
    let destination = match query.destination() {
        "" => DEFAULT_DESTINATION,
        destination => destination,
    };
    let departure_date = match query.departure_date() {
        "" => now.format("%Y-%m-%d").to_string(),
        date => date.to_string(),
    };
    let millis = now.timestamp_millis();

    let mut leg = |from: &str, to: &str, flight_number: &str, times: (&str, &str), date: String, terminals: (&str, &str)| FlightLeg {
        airline: "IndiGo".to_string(),
        airline_logo: "🔵".to_string(),
        flight_number: flight_number.to_string(),
        aircraft: "Airbus A320".to_string(),
        from: from.to_uppercase(),
        from_city: capitalize(from),
        to: to.to_uppercase(),
        to_city: capitalize(to),
        departure_time: times.0.to_string(),
        arrival_time: times.1.to_string(),
        departure_date: date,
        duration: "2h 15m".to_string(),
        terminal: Terminals {
            departure: terminals.0.to_string(),
            arrival: terminals.1.to_string(),
        },
        class: query.travel_class,
        pnr: generate_pnr(&mut *rng),
    };

    let flight = leg(
        origin,
        destination,
        "6E 202",
        ("10:30", "12:45"),
        departure_date,
        ("Terminal 2", "Terminal 1"),
    );
    let return_flight = match (query.trip_type, query.return_date()) {
        (TripType::RoundTrip, Some(return_date)) => Some(leg(
            destination,
            origin,
            "6E 305",
            ("14:30", "16:45"),
            return_date.to_string(),
            ("Terminal 1", "Terminal 2"),
        )),
        _ => None,
    };

    let counts = query.passengers;
    let passengers = [
        (PassengerType::Adult, true),
        (PassengerType::Child, counts.children > 0),
        (PassengerType::Infant, counts.infants > 0),
    ]
    .into_iter()
    .filter(|(_, present)| *present)
    .filter_map(|(passenger_type, _)| stub.passenger(passenger_type).cloned())
    .collect();

    let confirmation = BookingConfirmation {
        booking_reference: format!("BK{}", last_digits(millis, 8)),
        status: "Confirmed".to_string(),
        booked_at: now,
        flight,
        return_flight,
        passengers,
        contact: ContactSummary {
            email: stub.contact_email.clone(),
            phone: stub.contact_phone.clone(),
        },
        payment: PaymentSummary {
            method: stub.payment_method.clone(),
            amount: stub.payment_amount,
            transaction_id: format!("TXN{}", last_digits(millis, 10)),
        },
        baggage: Baggage::for_class(query.travel_class),
    };
    info!(
        booking_reference = %confirmation.booking_reference,
        legs = 1 + usize::from(confirmation.return_flight.is_some()),
        "Booking confirmed"
    );
    confirmation
}

/// Buttons on the confirmation screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationAction {
    Download,
    Email,
    Share,
    Print,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Platform share sheet, when the host provides one
pub trait ShareTarget {
    fn share(&self, payload: &SharePayload) -> Result<(), BookingError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Completion message for the user.
    Notice(String),
    Shared,
    PrintRequested,
}

impl BookingConfirmation {
    pub fn booking_date_display(&self) -> String {
        self.booked_at.format("%B %-d, %Y at %I:%M %p").to_string()
    }

    pub fn share_payload(&self, page_url: &str) -> SharePayload {
        SharePayload {
            title: "Flight Booking Confirmation".to_string(),
            text: format!(
                "My flight booking is confirmed! Booking Reference: {}",
                self.booking_reference
            ),
            url: page_url.to_string(),
        }
    }

    /// Run a stub action. Nothing is sent anywhere; only `Share` reaches
    /// out, and only through `share_target`.
    pub fn perform(
        &self,
        action: ConfirmationAction,
        page_url: &str,
        share_target: Option<&dyn ShareTarget>,
    ) -> Result<ActionOutcome, BookingError> {
        debug!(?action, booking_reference = %self.booking_reference, "Confirmation action");
        let outcome = match action {
            ConfirmationAction::Download => {
                ActionOutcome::Notice("Downloading ticket as PDF...".to_string())
            }
            ConfirmationAction::Email => ActionOutcome::Notice(format!(
                "Confirmation email sent to {}",
                self.contact.email
            )),
            ConfirmationAction::Share => match share_target {
                Some(target) => {
                    target.share(&self.share_payload(page_url))?;
                    ActionOutcome::Shared
                }
                None => ActionOutcome::Notice("Booking link copied to clipboard!".to_string()),
            },
            ConfirmationAction::Print => ActionOutcome::PrintRequested,
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_717_236_000_123).unwrap()
    }

    fn confirm_with(params: &str) -> BookingConfirmation {
        let summary = CheckoutSummary::from_params(&QueryParams::parse(params));
        synthesize(&summary, &ConfirmationStub::default(), fixed_now(), &mut StdRng::seed_from_u64(1))
    }

    #[test]
    fn test_summary_reads_checkout_params() {
        let params = QueryParams::parse(
            "flightId=FL1003&totalPrice=8232&basePrice=7350&addOnsTotal=0&taxes=882\
             &email=a%40b.c&phone=123&paymentMethod=upi\
             &passengers=%5B%7B%22type%22%3A%22adult%22%2C%22firstName%22%3A%22Asha%22%7D%5D\
             &addOns=%7B%22meal%22%3Atrue%7D",
        );
        let summary = CheckoutSummary::from_params(&params);
        assert_eq!(summary.context.flight_id, "FL1003");
        assert_eq!(summary.breakdown.total_price, 8232);
        assert_eq!(summary.contact.email, "a@b.c");
        assert_eq!(summary.contact.country_code, "+91");
        assert_eq!(summary.payment_method, PaymentMethod::Upi);
        assert_eq!(summary.passengers.len(), 1);
        assert_eq!(summary.passengers[0].first_name, "Asha");
        assert!(summary.add_ons.meal);
    }

    #[test]
    fn test_summary_tolerates_garbage() {
        let summary = CheckoutSummary::from_params(&QueryParams::parse("passengers=%5Bnope&addOns=x&totalPrice=abc"));
        assert!(summary.passengers.is_empty());
        assert_eq!(summary.add_ons, AddOns::default());
        assert_eq!(summary.breakdown.total_price, 0);
        assert_eq!(summary.payment_method, PaymentMethod::Card);
    }

    #[test]
    fn test_reference_and_transaction_from_timestamp() {
        let booking = confirm_with("");
        assert_eq!(booking.booking_reference, "BK36000123");
        assert_eq!(booking.payment.transaction_id, "TXN7236000123");
        assert_eq!(booking.status, "Confirmed");
        assert_eq!(booking.payment.amount, 4500);
    }

    #[test]
    fn test_defaults_when_params_missing() {
        let booking = confirm_with("");
        assert_eq!(booking.flight.from, "KANPUR");
        assert_eq!(booking.flight.from_city, "Kanpur");
        assert_eq!(booking.flight.to_city, "Lucknow");
        assert_eq!(booking.flight.departure_date, "2024-06-01");
        assert!(booking.return_flight.is_none());
        assert_eq!(booking.passengers.len(), 1);
        assert_eq!(booking.passengers[0].name, "John Doe");
    }

    #[test]
    fn test_round_trip_adds_return_leg() {
        let booking = confirm_with("tripType=round-trip&from=del&to=bom&departureDate=2024-06-01&returnDate=2024-06-08&children=1&infants=1");
        let ret = booking.return_flight.as_ref().expect("return leg");
        assert_eq!(ret.from, "BOM");
        assert_eq!(ret.to, "DEL");
        assert_eq!(ret.flight_number, "6E 305");
        assert_eq!(ret.terminal.departure, "Terminal 1");
        assert_ne!(ret.pnr, booking.flight.pnr);
        let seats: Vec<_> = booking.passengers.iter().map(|p| p.seat_number.as_str()).collect();
        assert_eq!(seats, vec!["12A", "12B", "Lap"]);
        assert_eq!(booking.flight.departure_display(), "Sat, Jun 1, 10:30");
    }

    #[test]
    fn test_pnr_shape() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            let pnr = generate_pnr(&mut rng);
            assert_eq!(pnr.len(), 6);
            assert!(pnr.bytes().all(|b| PNR_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_stub_passengers_are_configurable() {
        let stub = ConfirmationStub {
            passengers: vec![SeatAssignment::new(PassengerType::Adult, "Asha Rao", "3C")],
            ..Default::default()
        };
        let summary = CheckoutSummary::from_params(&QueryParams::parse("children=2"));
        let booking = synthesize(&summary, &stub, fixed_now(), &mut StdRng::seed_from_u64(3));
        assert_eq!(booking.passengers, vec![SeatAssignment::new(PassengerType::Adult, "Asha Rao", "3C")]);
    }

    struct RecordingShare(RefCell<Vec<SharePayload>>);

    impl ShareTarget for RecordingShare {
        fn share(&self, payload: &SharePayload) -> Result<(), BookingError> {
            self.0.borrow_mut().push(payload.clone());
            Ok(())
        }
    }

    #[test]
    fn test_stub_actions() {
        let booking = confirm_with("");
        let url = "/flight/payments?flightId=FL1000";

        assert_eq!(
            booking.perform(ConfirmationAction::Email, url, None).unwrap(),
            ActionOutcome::Notice("Confirmation email sent to john.doe@email.com".to_string())
        );
        assert_eq!(
            booking.perform(ConfirmationAction::Share, url, None).unwrap(),
            ActionOutcome::Notice("Booking link copied to clipboard!".to_string())
        );
        assert_eq!(
            booking.perform(ConfirmationAction::Print, url, None).unwrap(),
            ActionOutcome::PrintRequested
        );

        let target = RecordingShare(RefCell::new(Vec::new()));
        assert_eq!(
            booking.perform(ConfirmationAction::Share, url, Some(&target)).unwrap(),
            ActionOutcome::Shared
        );
        let shared = target.0.borrow();
        assert_eq!(shared.len(), 1);
        assert!(shared[0].text.ends_with(&booking.booking_reference));
        assert_eq!(shared[0].url, url);
    }

    struct UnavailableShare;

    impl ShareTarget for UnavailableShare {
        fn share(&self, _payload: &SharePayload) -> Result<(), BookingError> {
            Err(BookingError::ShareFailed("share sheet dismissed".to_string()))
        }
    }

    #[test]
    fn test_share_failure_is_reported() {
        let booking = confirm_with("");
        let result = booking.perform(ConfirmationAction::Share, "/flight/payments", Some(&UnavailableShare));
        match result {
            Err(BookingError::ShareFailed(reason)) => assert_eq!(reason, "share sheet dismissed"),
            other => panic!("expected share failure, got {:?}", other),
        }
    }
}
