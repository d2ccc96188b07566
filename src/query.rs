//! Query-string contract between screens
//!
//! Each screen is driven entirely by URL query parameters. Readers here never
//! fail: a missing or malformed value falls back to its documented default so
//! a hand-edited URL degrades to placeholder data instead of an error.

use crate::{PassengerCounts, TravelClass, TripType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

/// Most segments a multi-city trip can hold.
pub const MAX_SEGMENTS: usize = 3;

pub const RESULTS_PATH: &str = "/flight/results";
pub const DETAILS_PATH: &str = "/flight/details";
pub const CHECKOUT_PATH: &str = "/flight/checkout";
pub const CONFIRMATION_PATH: &str = "/flight/payments";

/// Ordered `key=value` pairs of a URL query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=2`, with or without a leading `?` or a `/path?` prefix.
    pub fn parse(query: &str) -> Self {
        let query = match query.split_once('?') {
            Some((_, rest)) => rest,
            None => query,
        };
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key`, or `default` when absent or empty.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.get(key) {
            Some(v) if !v.is_empty() => v,
            _ => default,
        }
    }

    /// Integer value for `key`, or `default` when absent or not a number.
    pub fn get_u32_or(&self, key: &str, default: u32) -> u32 {
        self.get(key)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(default)
    }

    pub fn get_u64_or(&self, key: &str, default: u64) -> u64 {
        self.get(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u64)
            .unwrap_or(default)
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.pairs {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }

    /// `path?query` for handing to the router.
    pub fn to_url(&self, path: &str) -> String {
        format!("{}?{}", path, self.to_query_string())
    }
}

/// One leg of a multi-city trip
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub origin: String,
    pub destination: String,
    pub date: String,
}

impl Segment {
    pub fn new(origin: &str, destination: &str, date: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            date: date.to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.origin.is_empty() && !self.destination.is_empty() && !self.date.is_empty()
    }
}

/// Route part of a trip query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Itinerary {
    Direct {
        origin: String,
        destination: String,
        departure_date: String,
        return_date: Option<String>,
    },
    MultiCity { segments: Vec<Segment> },
}

/// The user's search intent, decoded once per navigation boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripQuery {
    pub trip_type: TripType,
    pub travel_class: TravelClass,
    pub passengers: PassengerCounts,
    pub itinerary: Itinerary,
}

impl Default for TripQuery {
    fn default() -> Self {
        Self {
            trip_type: TripType::RoundTrip,
            travel_class: TravelClass::Economy,
            passengers: PassengerCounts::default(),
            itinerary: Itinerary::Direct {
                origin: String::new(),
                destination: String::new(),
                departure_date: String::new(),
                return_date: None,
            },
        }
    }
}

impl TripQuery {
    pub fn from_params(params: &QueryParams) -> Self {
        let trip_type = params
            .get("tripType")
            .and_then(|v| v.parse::<TripType>().ok())
            .unwrap_or_default();
        let travel_class = params
            .get("travelClass")
            .and_then(|v| v.parse::<TravelClass>().ok())
            .unwrap_or_default();
        let passengers = PassengerCounts {
            adults: params.get_u32_or("adults", 1),
            children: params.get_u32_or("children", 0),
            infants: params.get_u32_or("infants", 0),
        }
        .normalized();

        let itinerary = match trip_type {
            TripType::MultiCity => {
                let segments = (0..MAX_SEGMENTS)
                    .take_while(|i| params.get(&format!("from{}", i)).is_some())
                    .map(|i| Segment {
                        origin: params.get_or(&format!("from{}", i), "").to_string(),
                        destination: params.get_or(&format!("to{}", i), "").to_string(),
                        date: params.get_or(&format!("date{}", i), "").to_string(),
                    })
                    .collect();
                Itinerary::MultiCity { segments }
            }
            TripType::OneWay | TripType::RoundTrip => Itinerary::Direct {
                origin: params.get_or("from", "").to_string(),
                destination: params.get_or("to", "").to_string(),
                departure_date: params.get_or("departureDate", "").to_string(),
                return_date: match trip_type {
                    TripType::RoundTrip => params
                        .get("returnDate")
                        .filter(|v| !v.is_empty())
                        .map(str::to_string),
                    _ => None,
                },
            },
        };

        let query = Self {
            trip_type,
            travel_class,
            passengers,
            itinerary,
        };
        debug!(?query, "Decoded trip query");
        query
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new()
            .with("tripType", self.trip_type.as_str())
            .with("travelClass", self.travel_class.as_str())
            .with("adults", self.passengers.adults.to_string())
            .with("children", self.passengers.children.to_string())
            .with("infants", self.passengers.infants.to_string());

        match &self.itinerary {
            Itinerary::Direct {
                origin,
                destination,
                departure_date,
                return_date,
            } => {
                params.set("from", origin.as_str());
                params.set("to", destination.as_str());
                params.set("departureDate", departure_date.as_str());
                if let Some(return_date) = return_date {
                    params.set("returnDate", return_date.as_str());
                }
            }
            Itinerary::MultiCity { segments } => {
                for (i, segment) in segments.iter().enumerate() {
                    params.set(format!("from{}", i), segment.origin.as_str());
                    params.set(format!("to{}", i), segment.destination.as_str());
                    params.set(format!("date{}", i), segment.date.as_str());
                }
            }
        }
        params
    }

    /// Origin of the first leg.
    pub fn origin(&self) -> &str {
        match &self.itinerary {
            Itinerary::Direct { origin, .. } => origin,
            Itinerary::MultiCity { segments } => {
                segments.first().map(|s| s.origin.as_str()).unwrap_or("")
            }
        }
    }

    /// Destination of the first leg.
    pub fn destination(&self) -> &str {
        match &self.itinerary {
            Itinerary::Direct { destination, .. } => destination,
            Itinerary::MultiCity { segments } => segments
                .first()
                .map(|s| s.destination.as_str())
                .unwrap_or(""),
        }
    }

    pub fn departure_date(&self) -> &str {
        match &self.itinerary {
            Itinerary::Direct { departure_date, .. } => departure_date,
            Itinerary::MultiCity { segments } => {
                segments.first().map(|s| s.date.as_str()).unwrap_or("")
            }
        }
    }

    pub fn return_date(&self) -> Option<&str> {
        match &self.itinerary {
            Itinerary::Direct { return_date, .. } => return_date.as_deref(),
            Itinerary::MultiCity { .. } => None,
        }
    }
}

/// Trip query plus the flight picked on the results screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingContext {
    pub flight_id: String,
    pub query: TripQuery,
}

impl BookingContext {
    pub const DEFAULT_FLIGHT_ID: &'static str = "FL1000";

    pub fn new(flight_id: impl Into<String>, query: TripQuery) -> Self {
        Self {
            flight_id: flight_id.into(),
            query,
        }
    }

    pub fn from_params(params: &QueryParams) -> Self {
        Self {
            flight_id: params
                .get_or("flightId", Self::DEFAULT_FLIGHT_ID)
                .to_string(),
            query: TripQuery::from_params(params),
        }
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new().with("flightId", self.flight_id.as_str());
        for (k, v) in self.query.to_params().iter() {
            params.set(k, v);
        }
        params
    }
}

/// Display styles for `YYYY-MM-DD` dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `Sat, Jun 1`
    Short,
    /// `Saturday, June 1, 2024`
    Long,
    /// `Jun 1, 2024`
    Medium,
    /// `Sat, Jun 1, 2024`
    Weekday,
}

/// Format an ISO date for display; empty or unparseable input renders as "".
pub fn format_date(date: &str, style: DateStyle) -> String {
    let Ok(date) = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") else {
        return String::new();
    };
    let pattern = match style {
        DateStyle::Short => "%a, %b %-d",
        DateStyle::Long => "%A, %B %-d, %Y",
        DateStyle::Medium => "%b %-d, %Y",
        DateStyle::Weekday => "%a, %b %-d, %Y",
    };
    date.format(pattern).to_string()
}
