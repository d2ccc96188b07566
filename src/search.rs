//! Search form state
//!
//! Collects a [`TripQuery`] field by field. Passenger counters keep
//! `adults >= 1` and `infants <= adults` after every edit, and the multi-city
//! list always holds between two and three segments.

use crate::query::{Itinerary, Segment, TripQuery, MAX_SEGMENTS, RESULTS_PATH};
use crate::{BookingError, PassengerCounts, TravelClass, TripType, MAX_PASSENGERS_PER_TYPE};
use tracing::{debug, info, instrument};

/// Segments a fresh multi-city form starts with; also the removal floor.
pub const MIN_SEGMENTS: usize = 2;

/// Field of a multi-city segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentField {
    Origin,
    Destination,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
    pub trip_type: TripType,
    pub travel_class: TravelClass,
    passengers: PassengerCounts,
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: String,
    segments: Vec<Segment>,
}

impl Default for SearchForm {
    fn default() -> Self {
        Self {
            trip_type: TripType::RoundTrip,
            travel_class: TravelClass::Economy,
            passengers: PassengerCounts::default(),
            origin: String::new(),
            destination: String::new(),
            departure_date: String::new(),
            return_date: String::new(),
            segments: vec![Segment::default(); MIN_SEGMENTS],
        }
    }
}

impl SearchForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passengers(&self) -> PassengerCounts {
        self.passengers
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Step the adult counter. Never drops below one; infants follow the
    /// adult count down.
    pub fn change_adults(&mut self, delta: i32) {
        let adults = step_counter(self.passengers.adults, delta, 1);
        self.passengers.adults = adults;
        if self.passengers.infants > adults {
            self.passengers.infants = adults;
        }
    }

    pub fn change_children(&mut self, delta: i32) {
        self.passengers.children = step_counter(self.passengers.children, delta, 0);
    }

    /// Step the infant counter. An increase past the adult count is ignored.
    pub fn change_infants(&mut self, delta: i32) {
        let infants = step_counter(self.passengers.infants, delta, 0);
        if infants <= self.passengers.adults {
            self.passengers.infants = infants;
        }
    }

    /// Whether the "+" control for infants is enabled.
    pub fn can_add_infant(&self) -> bool {
        self.passengers.infants < self.passengers.adults
    }

    pub fn swap_cities(&mut self) {
        std::mem::swap(&mut self.origin, &mut self.destination);
    }

    /// Append an empty segment. Returns false when the list is already full.
    pub fn add_segment(&mut self) -> bool {
        if self.segments.len() >= MAX_SEGMENTS {
            return false;
        }
        self.segments.push(Segment::default());
        true
    }

    /// Remove the segment at `index`. The first two segments are permanent.
    pub fn remove_segment(&mut self, index: usize) -> bool {
        if index < MIN_SEGMENTS || index >= self.segments.len() {
            return false;
        }
        self.segments.remove(index);
        true
    }

    pub fn update_segment(
        &mut self,
        index: usize,
        field: SegmentField,
        value: &str,
    ) -> Result<(), BookingError> {
        let segment = self.segments.get_mut(index).ok_or_else(|| {
            BookingError::ParseError(format!("No flight segment at position {}", index))
        })?;
        let target = match field {
            SegmentField::Origin => &mut segment.origin,
            SegmentField::Destination => &mut segment.destination,
            SegmentField::Date => &mut segment.date,
        };
        *target = value.to_string();
        Ok(())
    }

    pub fn is_form_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        match self.trip_type {
            TripType::MultiCity => {
                for (i, segment) in self.segments.iter().enumerate() {
                    if !segment.is_complete() {
                        missing.push(format!("flight {}", i + 1));
                    }
                }
            }
            TripType::OneWay | TripType::RoundTrip => {
                if self.origin.is_empty() {
                    missing.push("from".to_string());
                }
                if self.destination.is_empty() {
                    missing.push("to".to_string());
                }
                if self.departure_date.is_empty() {
                    missing.push("departure date".to_string());
                }
                if self.trip_type == TripType::RoundTrip && self.return_date.is_empty() {
                    missing.push("return date".to_string());
                }
            }
        }
        missing
    }

    /// Build the query for the results screen, or the blocking notice when
    /// required fields are empty.
    #[instrument(level = "info", skip(self), fields(trip_type = %self.trip_type))]
    pub fn submit(&self) -> Result<TripQuery, BookingError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            debug!(?missing, "Search form incomplete");
            return Err(BookingError::IncompleteSearch(missing.join(", ")));
        }

        let itinerary = match self.trip_type {
            TripType::MultiCity => Itinerary::MultiCity {
                segments: self.segments.clone(),
            },
            TripType::OneWay | TripType::RoundTrip => Itinerary::Direct {
                origin: self.origin.clone(),
                destination: self.destination.clone(),
                departure_date: self.departure_date.clone(),
                return_date: (self.trip_type == TripType::RoundTrip)
                    .then(|| self.return_date.clone()),
            },
        };

        let query = TripQuery {
            trip_type: self.trip_type,
            travel_class: self.travel_class,
            passengers: self.passengers,
            itinerary,
        };
        info!(passengers = query.passengers.total(), "Search submitted");
        Ok(query)
    }
}

pub fn results_url(query: &TripQuery) -> String {
    query.to_params().to_url(RESULTS_PATH)
}

fn step_counter(current: u32, delta: i32, floor: u32) -> u32 {
    let next = i64::from(current) + i64::from(delta);
    let next = next.clamp(i64::from(floor), i64::from(MAX_PASSENGERS_PER_TYPE));
    u32::try_from(next).unwrap_or(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adults_never_below_one() {
        let mut form = SearchForm::new();
        form.change_adults(-1);
        form.change_adults(-5);
        assert_eq!(form.passengers().adults, 1);
    }

    #[test]
    fn test_children_never_below_zero() {
        let mut form = SearchForm::new();
        form.change_children(-1);
        assert_eq!(form.passengers().children, 0);
        form.change_children(2);
        assert_eq!(form.passengers().children, 2);
    }

    #[test]
    fn test_infants_capped_by_adults() {
        let mut form = SearchForm::new();
        form.change_infants(1);
        assert_eq!(form.passengers().infants, 1);
        assert!(!form.can_add_infant());
        form.change_infants(1);
        assert_eq!(form.passengers().infants, 1);
        form.change_infants(-3);
        assert_eq!(form.passengers().infants, 0);
    }

    #[test]
    fn test_decrementing_adults_clamps_infants() {
        let mut form = SearchForm::new();
        form.change_adults(2);
        form.change_infants(1);
        form.change_infants(1);
        form.change_infants(1);
        assert_eq!(form.passengers().infants, 3);

        form.change_adults(-1);
        assert_eq!(form.passengers().adults, 2);
        assert_eq!(form.passengers().infants, 2);
    }

    #[test]
    fn test_counter_invariants_hold_under_any_sequence() {
        let mut form = SearchForm::new();
        let moves = [(0, 3), (2, 1), (2, 1), (0, -2), (2, 1), (0, -1), (2, 4), (0, 5), (2, 9)];
        for (counter, delta) in moves {
            match counter {
                0 => form.change_adults(delta),
                _ => form.change_infants(delta),
            }
            let p = form.passengers();
            assert!(p.adults >= 1);
            assert!(p.infants <= p.adults);
        }
    }

    #[test]
    fn test_counters_stop_at_nine() {
        let mut form = SearchForm::new();
        form.change_adults(20);
        form.change_children(i32::MAX);
        assert_eq!(form.passengers().adults, 9);
        assert_eq!(form.passengers().children, 9);
        form.change_infants(12);
        assert_eq!(form.passengers().infants, 0);
        form.change_infants(9);
        assert_eq!(form.passengers().infants, 9);
    }

    #[test]
    fn test_swap_cities() {
        let mut form = SearchForm::new();
        form.origin = "DEL".to_string();
        form.destination = "BOM".to_string();
        form.swap_cities();
        assert_eq!(form.origin, "BOM");
        assert_eq!(form.destination, "DEL");
    }

    #[test]
    fn test_segments_grow_to_three_only() {
        let mut form = SearchForm::new();
        assert_eq!(form.segments().len(), 2);
        assert!(form.add_segment());
        assert!(!form.add_segment());
        assert_eq!(form.segments().len(), 3);
    }

    #[test]
    fn test_first_two_segments_are_not_removable() {
        let mut form = SearchForm::new();
        form.add_segment();
        form.update_segment(0, SegmentField::Origin, "DEL").unwrap();
        assert!(!form.remove_segment(0));
        assert!(!form.remove_segment(1));
        assert_eq!(form.segments().len(), 3);
        assert_eq!(form.segments()[0].origin, "DEL");

        assert!(form.remove_segment(2));
        assert_eq!(form.segments().len(), 2);
        assert!(!form.remove_segment(2));
    }

    #[test]
    fn test_update_segment_out_of_range() {
        let mut form = SearchForm::new();
        assert!(form.update_segment(5, SegmentField::Date, "2024-06-01").is_err());
    }

    #[test]
    fn test_round_trip_requires_return_date() {
        let mut form = SearchForm::new();
        form.origin = "DEL".to_string();
        form.destination = "BOM".to_string();
        form.departure_date = "2024-06-01".to_string();
        assert!(!form.is_form_valid());

        form.trip_type = TripType::OneWay;
        assert!(form.is_form_valid());

        form.trip_type = TripType::RoundTrip;
        form.return_date = "2024-06-08".to_string();
        assert!(form.is_form_valid());
    }

    #[test]
    fn test_multi_city_requires_every_segment_field() {
        let mut form = SearchForm::new();
        form.trip_type = TripType::MultiCity;
        for (i, (from, to)) in [("DEL", "BOM"), ("BOM", "GOI")].iter().enumerate() {
            form.update_segment(i, SegmentField::Origin, from).unwrap();
            form.update_segment(i, SegmentField::Destination, to).unwrap();
        }
        form.update_segment(0, SegmentField::Date, "2024-06-01").unwrap();
        assert!(!form.is_form_valid());

        form.update_segment(1, SegmentField::Date, "2024-06-04").unwrap();
        assert!(form.is_form_valid());

        form.add_segment();
        assert!(!form.is_form_valid());
    }

    #[test]
    fn test_submit_incomplete_form_is_blocked() {
        let form = SearchForm::new();
        match form.submit() {
            Err(BookingError::IncompleteSearch(missing)) => assert!(missing.contains("from")),
            other => panic!("expected incomplete search, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_builds_query() {
        let mut form = SearchForm::new();
        form.trip_type = TripType::OneWay;
        form.travel_class = TravelClass::Business;
        form.origin = "DEL".to_string();
        form.destination = "BOM".to_string();
        form.departure_date = "2024-06-01".to_string();
        form.return_date = "2024-06-09".to_string();
        form.change_adults(1);

        let query = form.submit().unwrap();
        assert_eq!(query.travel_class, TravelClass::Business);
        assert_eq!(query.passengers.adults, 2);
        assert_eq!(query.origin(), "DEL");
        assert_eq!(query.return_date(), None);

        let params = query.to_params();
        assert_eq!(params.get("tripType"), Some("one-way"));
        assert_eq!(params.get("departureDate"), Some("2024-06-01"));
    }

    #[test]
    fn test_results_url() {
        let mut form = SearchForm::new();
        form.origin = "DEL".to_string();
        form.destination = "BOM".to_string();
        form.departure_date = "2024-06-01".to_string();
        form.return_date = "2024-06-08".to_string();
        let url = results_url(&form.submit().unwrap());
        assert_eq!(
            url,
            "/flight/results?tripType=round-trip&travelClass=economy&adults=1&children=0&infants=0\
             &from=DEL&to=BOM&departureDate=2024-06-01&returnDate=2024-06-08"
        );
    }
}
