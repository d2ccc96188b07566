// src/mcp_server.rs

use anyhow::Result;
use flight_booking::details;
use flight_booking::results::{generate_with_rng, select_flight, PriceRange};
use flight_booking::search::results_url;
use flight_booking::{
    filter_and_sort, generate, AddOns, BookingConfig, BookingContext, PassengerCounts,
    PriceBreakdown, QueryParams, ResultFilters, SearchForm, Selection, SortKey, TravelClass,
    TripType, MAX_PASSENGERS_PER_TYPE,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rmcp::{
    model::{ServerCapabilities, ServerInfo},
    schemars, tool,
    transport::stdio,
    ServerHandler, ServiceExt,
};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Booking flow MCP server
#[derive(Default, Clone)]
pub struct BookingServer {
    config: BookingConfig,
}

impl BookingServer {
    pub fn new(config: BookingConfig) -> Self {
        Self { config }
    }

    /// Initialize logging to file
    fn init_logging() -> Result<()> {
        let log_dir = PathBuf::from("logs");
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&log_dir, "flight-booking-mcp.log");

        tracing_subscriber::registry()
            .with(EnvFilter::new("info").add_directive("flight_booking=debug".parse()?))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .init();

        info!("Logging initialized - logs will be written to logs/flight-booking-mcp.log.*");
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Origin airport code or city (e.g., DEL)")]
    pub from: String,
    #[schemars(description = "Destination airport code or city (e.g., BOM)")]
    pub to: String,
    #[schemars(description = "Departure date in YYYY-MM-DD format")]
    pub departure_date: String,
    #[schemars(description = "Return date in YYYY-MM-DD format; required for round trips")]
    pub return_date: Option<String>,
    #[schemars(description = "Trip type: one-way or round-trip (default: one-way, or round-trip when return_date is set)")]
    pub trip_type: Option<String>,
    #[schemars(description = "Travel class: economy, premium-economy, business, first")]
    pub travel_class: Option<String>,
    #[schemars(description = "Number of adult passengers (default: 1)")]
    pub adults: Option<u32>,
    #[schemars(description = "Number of child passengers")]
    pub children: Option<u32>,
    #[schemars(description = "Number of infants; at most one per adult")]
    pub infants: Option<u32>,
    #[schemars(description = "Allowed stop counts, e.g. [0, 1]; empty or missing means all")]
    pub stops: Option<Vec<u8>>,
    #[schemars(description = "Allowed airline names (comma-separated, e.g. 'IndiGo,Vistara')")]
    pub airlines: Option<String>,
    #[schemars(description = "Minimum price, inclusive")]
    pub min_price: Option<u64>,
    #[schemars(description = "Maximum price, inclusive")]
    pub max_price: Option<u64>,
    #[schemars(description = "Sort order: cheapest, fastest, earliest (default: cheapest)")]
    pub sort_by: Option<String>,
    #[schemars(description = "Seed for reproducible results")]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct DetailsParams {
    #[schemars(description = "Query string from a search result link, including flightId")]
    pub query: String,
}

#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct QuoteParams {
    #[schemars(description = "Query string from a search result link, including flightId")]
    pub query: String,
    #[schemars(description = "Add meal for every passenger")]
    pub meal: Option<bool>,
    #[schemars(description = "Add extra baggage for every passenger")]
    pub extra_baggage: Option<bool>,
    #[schemars(description = "Add travel insurance for every passenger")]
    pub insurance: Option<bool>,
    #[schemars(description = "Add seat selection for every passenger")]
    pub seat_selection: Option<bool>,
}

#[tool(tool_box)]
impl BookingServer {
    #[tool(description = "Search mock flights between two places, then filter by stops, airline and price and sort by cheapest, fastest or earliest departure. Each result carries a details link query.")]
    async fn search_flights(&self, #[tool(aggr)] params: SearchParams) -> String {
        info!(
            from = params.from,
            to = params.to,
            departure_date = params.departure_date,
            return_date = params.return_date.as_deref(),
            travel_class = params.travel_class.as_deref().unwrap_or("economy"),
            adults = params.adults.unwrap_or(1),
            "Flight search request received"
        );

        let form = match build_search_form(&params) {
            Ok(form) => form,
            Err(e) => {
                warn!("Invalid search parameters: {}", e);
                return serde_json::json!({ "error": e }).to_string();
            }
        };
        let query = match form.submit() {
            Ok(query) => query,
            Err(e) => {
                warn!("Search rejected: {}", e);
                return serde_json::json!({ "error": e.to_string() }).to_string();
            }
        };

        let pricing = &self.config.pricing;
        let candidates = match params.seed {
            Some(seed) => generate_with_rng(&query, pricing, &mut StdRng::seed_from_u64(seed)),
            None => generate(&query, pricing),
        };

        let mut filters = ResultFilters::default();
        filters.reset(pricing.price_ceiling);
        if let Some(stops) = params.stops {
            filters.stops = Selection::from_values(stops);
        }
        if let Some(airlines) = params.airlines.as_deref() {
            filters.airlines = Selection::from_values(
                airlines
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            );
        }
        filters.price_range = PriceRange::new(
            params.min_price.unwrap_or(0),
            params.max_price.unwrap_or(pricing.price_ceiling),
        );
        if let Some(sort_by) = params.sort_by.as_deref() {
            match sort_by.parse::<SortKey>() {
                Ok(key) => filters.sort_by = key,
                Err(e) => {
                    error!("Invalid sort key: {}", e);
                    return serde_json::json!({ "error": e.to_string() }).to_string();
                }
            }
        }

        let flights = filter_and_sort(&candidates, &filters);
        info!(candidates = candidates.len(), matched = flights.len(), "Flight search completed");

        let results: Vec<_> = flights
            .iter()
            .map(|flight| {
                serde_json::json!({
                    "flight": flight,
                    "detailsLink": select_flight(flight, &query),
                })
            })
            .collect();

        serde_json::to_string_pretty(&serde_json::json!({
            "searchLink": results_url(&query),
            "totalCandidates": candidates.len(),
            "flights": results,
        }))
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize results: {}"}}"#, e))
    }

    #[tool(description = "Show aircraft, terminals, baggage, amenities and fare policies for one flight, with the total fare for the whole party.")]
    async fn flight_details(&self, #[tool(aggr)] params: DetailsParams) -> String {
        let context = BookingContext::from_params(&QueryParams::parse(&params.query));
        debug!(flight_id = context.flight_id, "Flight details request received");

        let pricing = &self.config.pricing;
        let flight = details::resolve(&context.flight_id, &context.query, pricing);
        let total = flight.total_price(pricing, &context.query.passengers);

        serde_json::to_string_pretty(&serde_json::json!({
            "details": flight,
            "totalPrice": total,
            "checkoutLink": details::book_now(&context),
        }))
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize details: {}"}}"#, e))
    }

    #[tool(description = "Quote the checkout total for a flight: base fare, per-passenger add-ons and taxes.")]
    async fn quote_booking(&self, #[tool(aggr)] params: QuoteParams) -> String {
        let context = BookingContext::from_params(&QueryParams::parse(&params.query));
        let add_ons = AddOns {
            meal: params.meal.unwrap_or(false),
            extra_baggage: params.extra_baggage.unwrap_or(false),
            insurance: params.insurance.unwrap_or(false),
            seat_selection: params.seat_selection.unwrap_or(false),
        };

        let pricing = &self.config.pricing;
        let flight = details::resolve(&context.flight_id, &context.query, pricing);
        let passengers: PassengerCounts = context.query.passengers;
        let breakdown = PriceBreakdown::compute(pricing, flight.flight.price, &passengers, &add_ons);
        info!(
            flight_id = context.flight_id,
            total_price = breakdown.total_price,
            "Booking quote computed"
        );

        serde_json::to_string_pretty(&serde_json::json!({
            "flightId": context.flight_id,
            "passengers": passengers,
            "addOns": add_ons,
            "breakdown": breakdown,
        }))
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize quote: {}"}}"#, e))
    }
}

fn build_search_form(params: &SearchParams) -> Result<SearchForm, String> {
    let mut form = SearchForm::new();

    form.trip_type = match params.trip_type.as_deref() {
        Some(raw) => raw
            .parse::<TripType>()
            .map_err(|e| format!("Invalid trip type: {}", e))?,
        None if params.return_date.is_some() => TripType::RoundTrip,
        None => TripType::OneWay,
    };
    if form.trip_type == TripType::MultiCity {
        return Err("Multi-city search is not available here".to_string());
    }

    form.travel_class = params
        .travel_class
        .as_deref()
        .unwrap_or("economy")
        .parse::<TravelClass>()
        .map_err(|e| format!("Invalid travel class: {}", e))?;

    form.origin = params.from.clone();
    form.destination = params.to.clone();
    form.departure_date = params.departure_date.clone();
    form.return_date = params.return_date.clone().unwrap_or_default();

    let clamp = |n: Option<u32>, default: u32| n.unwrap_or(default).min(MAX_PASSENGERS_PER_TYPE) as i32;
    form.change_adults(clamp(params.adults, 1) - 1);
    form.change_children(clamp(params.children, 0));
    for _ in 0..clamp(params.infants, 0) {
        form.change_infants(1);
    }
    Ok(form)
}

#[tool(tool_box)]
impl ServerHandler for BookingServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("A mock flight booking server. Search returns generated flights with details links; pass a link's query to flight_details or quote_booking.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = BookingServer::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let config = match std::env::var("FLIGHT_BOOKING_CONFIG") {
        Ok(path) => BookingConfig::from_file(path)?,
        Err(_) => BookingConfig::default(),
    };

    info!("Starting MCP booking server");
    let server = BookingServer::new(config);
    let service = server.serve(stdio()).await?;

    info!("MCP service started, waiting for requests");
    service.waiting().await?;

    info!("MCP service shutting down");
    Ok(())
}
