//! Results generator and filter/sort engine
//!
//! Results are mock data: twelve candidates synthesized from the trip query.
//! Airline, route and class follow the query deterministically; price, times,
//! stops and seats are sampled from the supplied RNG.

use crate::pricing::PricingRules;
use crate::query::{BookingContext, TripQuery, DETAILS_PATH};
use crate::{BookingError, TravelClass};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, info, instrument};

/// Candidates generated per results view.
pub const CANDIDATE_COUNT: usize = 12;

/// Carrier identity shown on result cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Airline {
    pub name: &'static str,
    pub code: &'static str,
    pub logo: &'static str,
}

pub const AIRLINES: [Airline; 6] = [
    Airline { name: "IndiGo", code: "6E", logo: "🔵" },
    Airline { name: "Air India", code: "AI", logo: "🔴" },
    Airline { name: "SpiceJet", code: "SG", logo: "🔴" },
    Airline { name: "Vistara", code: "UK", logo: "🟣" },
    Airline { name: "AirAsia India", code: "I5", logo: "🔴" },
    Airline { name: "Go First", code: "G8", logo: "🟡" },
];

/// One synthesized flight offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFlight {
    pub id: String,
    pub airline: String,
    pub airline_code: String,
    pub airline_logo: String,
    pub flight_number: String,
    pub from: String,
    pub to: String,
    pub departure_time: String,
    pub arrival_time: String,
    /// `"2h 15m"`
    pub duration: String,
    pub stops: u8,
    pub price: u64,
    pub seats_left: u32,
    pub class: TravelClass,
}

impl CandidateFlight {
    pub fn duration_minutes(&self) -> u32 {
        parse_duration_minutes(&self.duration).unwrap_or(u32::MAX)
    }
}

/// Parse `"2h 15m"` (either part optional) into minutes.
pub fn parse_duration_minutes(duration: &str) -> Option<u32> {
    static DURATION_RE: OnceLock<Regex> = OnceLock::new();
    let re = DURATION_RE.get_or_init(|| {
        Regex::new(r"^\s*(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*$").expect("duration pattern is valid")
    });
    let captures = re.captures(duration)?;
    let hours = captures.get(1);
    let minutes = captures.get(2);
    if hours.is_none() && minutes.is_none() {
        return None;
    }
    let hours = hours.map_or(Ok(0), |m| m.as_str().parse::<u32>()).ok()?;
    let minutes = minutes.map_or(Ok(0), |m| m.as_str().parse::<u32>()).ok()?;
    Some(hours * 60 + minutes)
}

pub fn format_duration(hours: f64) -> String {
    let whole = hours.floor();
    format!("{}h {}m", whole as u32, ((hours - whole) * 60.0).floor() as u32)
}

fn clock(hour: u32, minute: u32) -> String {
    format!("{:02}:{:02}", hour, minute)
}

/// Generate candidates with the thread-local RNG.
pub fn generate(query: &TripQuery, rules: &PricingRules) -> Vec<CandidateFlight> {
    generate_with_rng(query, rules, &mut rand::thread_rng())
}

#[instrument(level = "info", skip_all, fields(class = %query.travel_class))]
pub fn generate_with_rng<R: Rng + ?Sized>(
    query: &TripQuery,
    rules: &PricingRules,
    rng: &mut R,
) -> Vec<CandidateFlight> {
    let base_price = rules.search_base_fares.for_class(query.travel_class);
    let max_offset = base_price * 8 / 10;
    let from = query.origin().to_uppercase();
    let to = query.destination().to_uppercase();

    let flights: Vec<CandidateFlight> = (0..CANDIDATE_COUNT)
        .map(|i| {
            let airline = AIRLINES[i % AIRLINES.len()];
            let stops: u8 = rng.gen_range(0..=2);
            let departure_hour: u32 = rng.gen_range(6..22);
            let duration = 1.0 + rng.gen::<f64>() * 3.0 + f64::from(stops) * 1.5;
            let price = base_price + if max_offset > 0 { rng.gen_range(0..max_offset) } else { 0 };
            let departure_time = clock(departure_hour, rng.gen_range(0..60));
            let arrival_hour = (departure_hour + duration.floor() as u32) % 24;
            let arrival_time = clock(arrival_hour, rng.gen_range(0..60));

            CandidateFlight {
                id: format!("FL{}", 1000 + i),
                airline: airline.name.to_string(),
                airline_code: airline.code.to_string(),
                airline_logo: airline.logo.to_string(),
                flight_number: format!("{}{}", airline.code, 200 + i),
                from: from.clone(),
                to: to.clone(),
                departure_time,
                arrival_time,
                duration: format_duration(duration),
                stops,
                price,
                seats_left: rng.gen_range(5..25),
                class: query.travel_class,
            }
        })
        .collect();

    info!(count = flights.len(), base_price, "Generated candidate flights");
    flights
}

/// Multi-select filter state: everything, or an explicit non-empty set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection<T: Ord> {
    All,
    Specific(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: Ord> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Specific(values) => values.contains(value),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn select_all(&mut self) {
        *self = Selection::All;
    }

    /// Check or uncheck one value. Checking replaces `All`; unchecking the
    /// last value reverts to `All`.
    pub fn set(&mut self, value: T, checked: bool) {
        match self {
            Selection::All => {
                if checked {
                    *self = Selection::Specific(BTreeSet::from([value]));
                }
            }
            Selection::Specific(values) => {
                if checked {
                    values.insert(value);
                } else {
                    values.remove(&value);
                    if values.is_empty() {
                        *self = Selection::All;
                    }
                }
            }
        }
    }

    pub fn toggle(&mut self, value: T) {
        let checked = match self {
            Selection::All => true,
            Selection::Specific(values) => !values.contains(&value),
        };
        self.set(value, checked);
    }

    pub fn from_values<I: IntoIterator<Item = T>>(values: I) -> Self {
        let values: BTreeSet<T> = values.into_iter().collect();
        if values.is_empty() {
            Selection::All
        } else {
            Selection::Specific(values)
        }
    }
}

/// Inclusive price bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

impl PriceRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: u64) -> bool {
        self.min <= price && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::new(0, PricingRules::default().price_ceiling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Cheapest,
    Fastest,
    Earliest,
}

impl FromStr for SortKey {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cheapest" | "price" => Ok(SortKey::Cheapest),
            "fastest" | "duration" => Ok(SortKey::Fastest),
            "earliest" | "departure" => Ok(SortKey::Earliest),
            _ => Err(BookingError::ParseError(format!("Invalid sort key: {}", s))),
        }
    }
}

/// Filter and sort state of the results sidebar
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultFilters {
    pub stops: Selection<u8>,
    pub airlines: Selection<String>,
    pub price_range: PriceRange,
    pub sort_by: SortKey,
}

impl ResultFilters {
    /// Filters reset to everything, keeping the sort order.
    pub fn reset(&mut self, price_ceiling: u64) {
        self.stops.select_all();
        self.airlines.select_all();
        self.price_range = PriceRange::new(0, price_ceiling);
    }

    pub fn accepts(&self, flight: &CandidateFlight) -> bool {
        self.stops.matches(&flight.stops)
            && self.airlines.matches(&flight.airline)
            && self.price_range.contains(flight.price)
    }
}

/// Apply every active filter (logical AND) and stable-sort by `sort_by`.
pub fn filter_and_sort(candidates: &[CandidateFlight], filters: &ResultFilters) -> Vec<CandidateFlight> {
    let mut result: Vec<CandidateFlight> = candidates
        .iter()
        .filter(|f| filters.accepts(f))
        .cloned()
        .collect();

    match filters.sort_by {
        SortKey::Cheapest => result.sort_by_key(|f| f.price),
        SortKey::Fastest => result.sort_by_key(|f| f.duration_minutes()),
        SortKey::Earliest => result.sort_by(|a, b| a.departure_time.cmp(&b.departure_time)),
    }

    debug!(
        candidates = candidates.len(),
        matched = result.len(),
        sort_by = ?filters.sort_by,
        "Filtered and sorted results"
    );
    result
}

/// "Select": open the details screen for one result.
pub fn select_flight(flight: &CandidateFlight, query: &TripQuery) -> String {
    BookingContext::new(flight.id.clone(), query.clone())
        .to_params()
        .to_url(DETAILS_PATH)
}
