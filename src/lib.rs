//! # Flight Booking Library
//!
//! A mock flight booking flow: search form, generated results with filters and
//! sorting, flight details, a three-step checkout and a synthesized booking
//! confirmation. Every screen reads its input from URL query parameters and
//! produces the query for the next screen, so the whole flow is stateless
//! between steps.

pub mod checkout;
pub mod config;
pub mod confirmation;
pub mod details;
pub mod popular;
pub mod pricing;
pub mod query;
pub mod results;
pub mod search;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export main types for convenience
pub use checkout::{CheckoutFlow, CheckoutStep, PaymentMethod, Transition};
pub use config::BookingConfig;
pub use confirmation::{BookingConfirmation, CheckoutSummary};
pub use details::FlightDetails;
pub use pricing::{AddOns, PriceBreakdown, PricingRules};
pub use query::{BookingContext, QueryParams, TripQuery};
pub use results::{filter_and_sort, generate, CandidateFlight, ResultFilters, Selection, SortKey};
pub use search::SearchForm;

/// Error types for the booking library
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Parsing failed: {0}")]
    ParseError(String),

    #[error("Please fill in all required fields to search: {0}")]
    IncompleteSearch(String),

    #[error("Please fill in all required fields for step {step}: {}", missing.join(", "))]
    IncompleteStep { step: u8, missing: Vec<String> },

    #[error("Booking has already been submitted")]
    AlreadySubmitted,

    #[error("No passenger at position {0}")]
    InvalidPassenger(usize),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("JSON encoding failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O failed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Share failed: {0}")]
    ShareFailed(String),
}

/// Trip type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    OneWay,
    #[default]
    RoundTrip,
    MultiCity,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "one-way",
            TripType::RoundTrip => "round-trip",
            TripType::MultiCity => "multi-city",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripType {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "round-trip" | "roundtrip" => Ok(TripType::RoundTrip),
            "one-way" | "oneway" => Ok(TripType::OneWay),
            "multi-city" | "multicity" => Ok(TripType::MultiCity),
            _ => Err(BookingError::ParseError(format!("Invalid trip type: {}", s))),
        }
    }
}

/// Cabin class enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TravelClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Economy => "economy",
            TravelClass::PremiumEconomy => "premium-economy",
            TravelClass::Business => "business",
            TravelClass::First => "first",
        }
    }

    /// Human label, e.g. "Premium Economy".
    pub fn label(&self) -> &'static str {
        match self {
            TravelClass::Economy => "Economy",
            TravelClass::PremiumEconomy => "Premium Economy",
            TravelClass::Business => "Business",
            TravelClass::First => "First",
        }
    }
}

impl fmt::Display for TravelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelClass {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "economy" => Ok(TravelClass::Economy),
            "premium-economy" | "premium_economy" => Ok(TravelClass::PremiumEconomy),
            "business" => Ok(TravelClass::Business),
            "first" => Ok(TravelClass::First),
            _ => Err(BookingError::ParseError(format!("Invalid travel class: {}", s))),
        }
    }
}

/// Upper bound for each passenger type, matching the search form counters.
pub const MAX_PASSENGERS_PER_TYPE: u32 = 9;

/// Passenger configuration
///
/// At least one adult travels, and every infant sits on an adult's lap, so
/// `infants <= adults`. The search form keeps this invariant while editing;
/// [`PassengerCounts::normalized`] restores it for counts read from a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerCounts {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl Default for PassengerCounts {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
            infants: 0,
        }
    }
}

impl PassengerCounts {
    pub fn total(&self) -> u32 {
        self.seated().saturating_add(self.infants)
    }

    /// Passengers paying a full fare (adults and children).
    pub fn seated(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }

    /// Clamp counts read from outside into `1..=9` adults, `0..=9` children
    /// and at most one infant per adult.
    pub fn normalized(self) -> Self {
        let adults = self.adults.clamp(1, MAX_PASSENGERS_PER_TYPE);
        Self {
            adults,
            children: self.children.min(MAX_PASSENGERS_PER_TYPE),
            infants: self.infants.min(adults),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_type_parsing() {
        assert!(matches!("round-trip".parse::<TripType>(), Ok(TripType::RoundTrip)));
        assert!(matches!("one-way".parse::<TripType>(), Ok(TripType::OneWay)));
        assert!(matches!("multi-city".parse::<TripType>(), Ok(TripType::MultiCity)));
        assert!("invalid".parse::<TripType>().is_err());
    }

    #[test]
    fn test_travel_class_parsing() {
        assert!(matches!("economy".parse::<TravelClass>(), Ok(TravelClass::Economy)));
        assert!(matches!("premium-economy".parse::<TravelClass>(), Ok(TravelClass::PremiumEconomy)));
        assert!(matches!("business".parse::<TravelClass>(), Ok(TravelClass::Business)));
        assert!(matches!("first".parse::<TravelClass>(), Ok(TravelClass::First)));
        assert!("invalid".parse::<TravelClass>().is_err());
    }

    #[test]
    fn test_travel_class_round_trips_through_str() {
        for class in [
            TravelClass::Economy,
            TravelClass::PremiumEconomy,
            TravelClass::Business,
            TravelClass::First,
        ] {
            assert_eq!(class.as_str().parse::<TravelClass>().unwrap(), class);
        }
        assert_eq!(TravelClass::PremiumEconomy.label(), "Premium Economy");
    }

    #[test]
    fn test_passengers_default() {
        let passengers = PassengerCounts::default();
        assert_eq!(passengers.adults, 1);
        assert_eq!(passengers.children, 0);
        assert_eq!(passengers.infants, 0);
        assert_eq!(passengers.total(), 1);
    }

    #[test]
    fn test_passengers_normalized_clamps_counts() {
        let passengers = PassengerCounts {
            adults: u32::MAX,
            children: 40,
            infants: 12,
        }
        .normalized();
        assert_eq!(passengers.adults, 9);
        assert_eq!(passengers.children, 9);
        assert_eq!(passengers.infants, 9);
        assert_eq!(passengers.total(), 27);

        let unchecked = PassengerCounts { adults: u32::MAX, children: 1, infants: 1 };
        assert_eq!(unchecked.seated(), u32::MAX);
        assert_eq!(unchecked.total(), u32::MAX);
    }

    #[test]
    fn test_passengers_normalized() {
        let counts = PassengerCounts { adults: 0, children: 2, infants: 3 }.normalized();
        assert_eq!(counts, PassengerCounts { adults: 1, children: 2, infants: 1 });
    }

    #[test]
    fn test_incomplete_step_message() {
        let err = BookingError::IncompleteStep {
            step: 1,
            missing: vec!["email".to_string(), "phone".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields for step 1: email, phone"
        );
    }
}
