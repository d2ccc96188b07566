//! Flight details view
//!
//! Details are rebuilt from the flight id and the trip query alone. They do
//! not reuse the values sampled on the results screen, so the listed fare
//! comes from the class fare table.

use crate::pricing::PricingRules;
use crate::query::{BookingContext, QueryParams, TripQuery, CHECKOUT_PATH};
use crate::results::{Airline, CandidateFlight, AIRLINES};
use crate::{PassengerCounts, TravelClass};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DEFAULT_ORIGIN: &str = "DEL";
const DEFAULT_DESTINATION: &str = "BOM";

/// Ids with a known carrier; anything else is shown as the first entry.
const KNOWN_FLIGHTS: [&str; 6] = ["FL1000", "FL1001", "FL1002", "FL1003", "FL1004", "FL1005"];

pub fn airline_for(flight_id: &str) -> Airline {
    KNOWN_FLIGHTS
        .iter()
        .position(|id| *id == flight_id)
        .map(|i| AIRLINES[i])
        .unwrap_or(AIRLINES[0])
}

/// `6E` + (200 + n mod 100) where n is the numeric part of `FLnnnn`.
pub fn flight_number_for(flight_id: &str, airline: &Airline) -> String {
    let n = flight_id
        .trim_start_matches("FL")
        .parse::<u32>()
        .unwrap_or(0);
    format!("{}{}", airline.code, 200 + (n % 100))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminals {
    pub departure: String,
    pub arrival: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baggage {
    pub checkin: String,
    pub cabin: String,
}

impl Baggage {
    pub fn for_class(class: TravelClass) -> Self {
        let checkin = match class {
            TravelClass::Economy => "15 kg",
            TravelClass::PremiumEconomy => "20 kg",
            TravelClass::Business | TravelClass::First => "30 kg",
        };
        Self {
            checkin: checkin.to_string(),
            cabin: "7 kg".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDetails {
    #[serde(flatten)]
    pub flight: CandidateFlight,
    pub aircraft: String,
    pub terminal: Terminals,
    pub baggage: Baggage,
    pub amenities: Vec<String>,
    pub cancellation: String,
    pub reschedule: String,
}

impl FlightDetails {
    /// Fare for the whole party; infants pay the discounted fare.
    pub fn total_price(&self, rules: &PricingRules, passengers: &PassengerCounts) -> u64 {
        rules.base_fare(self.flight.price, passengers)
    }
}

#[instrument(level = "info", skip(query, rules), fields(class = %query.travel_class))]
pub fn resolve(flight_id: &str, query: &TripQuery, rules: &PricingRules) -> FlightDetails {
    let airline = airline_for(flight_id);
    let from = match query.origin() {
        "" => DEFAULT_ORIGIN.to_string(),
        origin => origin.to_uppercase(),
    };
    let to = match query.destination() {
        "" => DEFAULT_DESTINATION.to_string(),
        destination => destination.to_uppercase(),
    };

    let flight = CandidateFlight {
        id: flight_id.to_string(),
        airline: airline.name.to_string(),
        airline_code: airline.code.to_string(),
        airline_logo: airline.logo.to_string(),
        flight_number: flight_number_for(flight_id, &airline),
        from,
        to,
        departure_time: "10:30".to_string(),
        arrival_time: "12:45".to_string(),
        duration: "2h 15m".to_string(),
        stops: 0,
        price: rules.listed_fares.for_class(query.travel_class),
        seats_left: 12,
        class: query.travel_class,
    };
    debug!(airline = airline.name, price = flight.price, "Resolved flight details");

    FlightDetails {
        flight,
        aircraft: "Airbus A320".to_string(),
        terminal: Terminals {
            departure: "Terminal 2".to_string(),
            arrival: "Terminal 1".to_string(),
        },
        baggage: Baggage::for_class(query.travel_class),
        amenities: ["WiFi", "In-flight Entertainment", "Meals", "Power Outlets"]
            .iter()
            .map(|a| a.to_string())
            .collect(),
        cancellation: "Free cancellation up to 24 hours before departure".to_string(),
        reschedule: "Free reschedule up to 12 hours before departure".to_string(),
    }
}

/// "Book Now": forward the trip and flight to checkout.
pub fn book_now(context: &BookingContext) -> String {
    let params: QueryParams = context.to_params();
    params.to_url(CHECKOUT_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(params: &str) -> TripQuery {
        TripQuery::from_params(&QueryParams::parse(params))
    }

    #[test]
    fn test_known_and_unknown_ids() {
        assert_eq!(airline_for("FL1003").name, "Vistara");
        assert_eq!(airline_for("FL1011").name, "IndiGo");
        assert_eq!(airline_for("garbage").code, "6E");
    }

    #[test]
    fn test_flight_number_from_id() {
        let airline = airline_for("FL1004");
        assert_eq!(flight_number_for("FL1004", &airline), "I5204");
        assert_eq!(flight_number_for("FL1011", &AIRLINES[0]), "6E211");
        assert_eq!(flight_number_for("XYZ", &AIRLINES[0]), "6E200");
    }

    #[test]
    fn test_resolve_uses_class_fare_and_route() {
        let rules = PricingRules::default();
        let details = resolve("FL1001", &query("travelClass=business&from=del&to=bom"), &rules);
        assert_eq!(details.flight.airline, "Air India");
        assert_eq!(details.flight.price, 12500);
        assert_eq!(details.flight.from, "DEL");
        assert_eq!(details.flight.to, "BOM");
        assert_eq!(details.baggage.checkin, "30 kg");
        assert_eq!(details.baggage.cabin, "7 kg");
    }

    #[test]
    fn test_resolve_defaults_route() {
        let details = resolve("FL1000", &query(""), &PricingRules::default());
        assert_eq!(details.flight.from, "DEL");
        assert_eq!(details.flight.to, "BOM");
        assert_eq!(details.flight.price, 3500);
        assert_eq!(details.baggage.checkin, "15 kg");
    }

    #[test]
    fn test_total_price_discounts_infants() {
        let q = query("adults=2&children=1&infants=1&travelClass=economy");
        let details = resolve("FL1000", &q, &PricingRules::default());
        assert_eq!(details.total_price(&PricingRules::default(), &q.passengers), 3500 * 3 + 350);
    }

    #[test]
    fn test_book_now_forwards_everything() {
        let q = query("tripType=round-trip&from=DEL&to=BOM&departureDate=2024-06-01&returnDate=2024-06-08&adults=2");
        let url = book_now(&BookingContext::new("FL1002", q.clone()));
        assert!(url.starts_with("/flight/checkout?flightId=FL1002&"));

        let forwarded = BookingContext::from_params(&QueryParams::parse(&url));
        assert_eq!(forwarded.flight_id, "FL1002");
        assert_eq!(forwarded.query, q);
    }
}
