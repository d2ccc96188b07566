//! CLI interface for flight-booking

use clap::{Parser, Subcommand};
use flight_booking::checkout::CheckoutForm;
use flight_booking::confirmation::{self, ActionOutcome, ConfirmationAction};
use flight_booking::details::{self, book_now};
use flight_booking::popular::{popular_routes, RouteCategory};
use flight_booking::query::CONFIRMATION_PATH;
use flight_booking::results::{generate_with_rng, select_flight, PriceRange};
use flight_booking::search::results_url;
use flight_booking::{
    filter_and_sort, generate, BookingConfig, BookingContext, BookingError, CheckoutFlow,
    CheckoutSummary, QueryParams, ResultFilters, SearchForm, Selection, SortKey, Transition,
    TravelClass, TripType, MAX_PASSENGERS_PER_TYPE,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flight-booking")]
#[command(about = "Mock flight booking flow from search to confirmation")]
#[command(version)]
pub struct Cli {
    /// JSON config overriding fares, taxes and confirmation placeholders
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search, filter and sort mock flights
    Search {
        /// Origin airport code or city
        #[arg(short, long)]
        from: String,
        /// Destination airport code or city
        #[arg(short, long)]
        to: String,
        /// Departure date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Return date for round trips (YYYY-MM-DD)
        #[arg(short, long)]
        return_date: Option<String>,
        /// Trip type (one-way, round-trip); round-trip when --return-date is given
        #[arg(long)]
        trip_type: Option<String>,
        /// Travel class (economy, premium-economy, business, first)
        #[arg(long, default_value = "economy")]
        class: String,
        #[arg(long, default_value = "1")]
        adults: u32,
        #[arg(long, default_value = "0")]
        children: u32,
        #[arg(long, default_value = "0")]
        infants: u32,
        /// Allowed stop counts (comma-separated, e.g. 0,1)
        #[arg(long)]
        stops: Option<String>,
        /// Allowed airlines (comma-separated names)
        #[arg(long)]
        airlines: Option<String>,
        #[arg(long)]
        min_price: Option<u64>,
        #[arg(long)]
        max_price: Option<u64>,
        /// Sort order (cheapest, fastest, earliest)
        #[arg(long, default_value = "cheapest")]
        sort: String,
        /// Seed for reproducible results
        #[arg(long)]
        seed: Option<u64>,
        /// Output file for JSON results
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Show details for one flight
    Details {
        /// Query string from the results screen
        #[arg(short, long)]
        query: String,
    },
    /// Run the three checkout steps from a JSON form
    Checkout {
        /// Query string from the details screen
        #[arg(short, long)]
        query: String,
        /// JSON file with contact, passengers, add-ons and payment
        #[arg(short, long)]
        input: String,
    },
    /// Build the booking confirmation
    Confirm {
        /// Query string from checkout
        #[arg(short, long)]
        query: String,
        /// Stub action to run afterwards (download, email, share, print)
        #[arg(long)]
        action: Option<String>,
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List popular routes
    Popular {
        /// Region filter (europe, asia, america, oceania, africa)
        #[arg(long)]
        category: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "flight_booking=debug" } else { "flight_booking=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Search-form fields taken from the command line
struct SearchFlags {
    from: String,
    to: String,
    date: String,
    return_date: Option<String>,
    trip_type: Option<String>,
    class: String,
    adults: u32,
    children: u32,
    infants: u32,
}

/// Fill the search form from flags. Validation is left to `SearchForm::submit`.
fn build_search_form(flags: SearchFlags) -> Result<SearchForm, BookingError> {
    let mut form = SearchForm::new();
    form.trip_type = match flags.trip_type.as_deref() {
        Some(raw) => raw.parse::<TripType>()?,
        None if flags.return_date.is_some() => TripType::RoundTrip,
        None => TripType::OneWay,
    };
    if form.trip_type == TripType::MultiCity {
        return Err(BookingError::ParseError(
            "Multi-city search is not available from the command line".to_string(),
        ));
    }
    form.travel_class = flags.class.parse::<TravelClass>()?;
    form.origin = flags.from;
    form.destination = flags.to;
    form.departure_date = flags.date;
    form.return_date = flags.return_date.unwrap_or_default();

    let clamp = |n: u32| n.min(MAX_PASSENGERS_PER_TYPE) as i32;
    form.change_adults(clamp(flags.adults) - 1);
    form.change_children(clamp(flags.children));
    for _ in 0..clamp(flags.infants) {
        form.change_infants(1);
    }
    Ok(form)
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn write_or_print(json: &str, output: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(output_file) = output {
        fs::write(&output_file, json)?;
        println!("Results saved to {}", output_file);
    } else {
        println!("{}", json);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => BookingConfig::from_file(path)?,
        None => BookingConfig::default(),
    };
    debug!(?config, "Using config");

    match cli.command {
        Commands::Search {
            from,
            to,
            date,
            return_date,
            trip_type,
            class,
            adults,
            children,
            infants,
            stops,
            airlines,
            min_price,
            max_price,
            sort,
            seed,
            output,
        } => {
            let form = build_search_form(SearchFlags {
                from,
                to,
                date,
                return_date,
                trip_type,
                class,
                adults,
                children,
                infants,
            })?;

            let query = match form.submit() {
                Ok(query) => query,
                Err(e) => {
                    error!("Search rejected: {}", e);
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };
            println!("Searching {}", results_url(&query));

            let candidates = match seed {
                Some(seed) => generate_with_rng(&query, &config.pricing, &mut StdRng::seed_from_u64(seed)),
                None => generate(&query, &config.pricing),
            };

            let mut filters = ResultFilters::default();
            filters.reset(config.pricing.price_ceiling);
            if let Some(stops) = stops {
                let values = split_list(&stops)
                    .map(|s| s.parse::<u8>())
                    .collect::<Result<Vec<_>, _>>()?;
                filters.stops = Selection::from_values(values);
            }
            if let Some(airlines) = airlines {
                filters.airlines = Selection::from_values(split_list(&airlines).map(String::from));
            }
            filters.price_range = PriceRange::new(
                min_price.unwrap_or(0),
                max_price.unwrap_or(config.pricing.price_ceiling),
            );
            filters.sort_by = sort.parse::<SortKey>()?;

            let results = filter_and_sort(&candidates, &filters);
            let json = serde_json::to_string_pretty(&results)?;
            write_or_print(&json, output)?;

            println!("\nSummary:");
            println!("Showing {} of {} flights", results.len(), candidates.len());
            if let Some(best) = results.first() {
                println!(
                    "Top result: {} {} {}-{} ({}) {}",
                    best.airline, best.flight_number, best.departure_time, best.arrival_time, best.duration, best.price
                );
                println!("Details: {}", select_flight(best, &query));
            } else {
                println!("No flights match the current filters.");
            }
        }
        Commands::Details { query } => {
            let context = BookingContext::from_params(&QueryParams::parse(&query));
            let flight = details::resolve(&context.flight_id, &context.query, &config.pricing);
            println!("{}", serde_json::to_string_pretty(&flight)?);
            println!(
                "\nTotal for {} passenger(s): {}",
                context.query.passengers.total(),
                flight.total_price(&config.pricing, &context.query.passengers)
            );
            println!("Book now: {}", book_now(&context));
        }
        Commands::Checkout { query, input } => {
            let context = BookingContext::from_params(&QueryParams::parse(&query));
            let form: CheckoutForm = serde_json::from_str(&fs::read_to_string(&input)?)?;

            let mut flow = CheckoutFlow::new(context, config.pricing.clone());
            flow.apply_form(form)?;

            loop {
                match flow.next() {
                    Ok(Transition::Advanced(step)) => {
                        println!("Step {}: {}", step.number(), step.label());
                    }
                    Ok(Transition::Submitted(url)) => {
                        println!("\n{}", serde_json::to_string_pretty(&flow.price_breakdown())?);
                        println!("Confirmation: {}", url);
                        break;
                    }
                    Err(e) => {
                        eprintln!("{}", e);
                        std::process::exit(1);
                    }
                }
            }
        }
        Commands::Confirm { query, action, output } => {
            let params = QueryParams::parse(&query);
            let summary = CheckoutSummary::from_params(&params);
            let booking = confirmation::confirm(&summary, &config.confirmation);
            let json = serde_json::to_string_pretty(&booking)?;
            write_or_print(&json, output)?;
            println!("\nBooking {} {} on {}", booking.booking_reference, booking.status, booking.booking_date_display());

            if let Some(action) = action {
                let action: ConfirmationAction = serde_json::from_value(serde_json::Value::String(action))?;
                match booking.perform(action, &params.to_url(CONFIRMATION_PATH), None)? {
                    ActionOutcome::Notice(message) => println!("{}", message),
                    ActionOutcome::Shared => println!("Shared"),
                    ActionOutcome::PrintRequested => println!("Print requested"),
                }
            }
        }
        Commands::Popular { category } => {
            let category = category.map(|c| c.parse::<RouteCategory>()).transpose()?;
            let routes: Vec<_> = popular_routes(category)
                .into_iter()
                .filter(|route| config.image_hosts.permits(route.image))
                .collect();
            println!("{}", serde_json::to_string_pretty(&routes)?);
        }
    }

    Ok(())
}
