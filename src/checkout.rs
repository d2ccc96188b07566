//! Three-step checkout
//!
//! A small state machine: traveler details, add-ons, payment, then submitted.
//! Each step has a guard; `next()` only moves forward when the guard for the
//! current step passes, otherwise the state is left untouched and the
//! blocking notice is returned as an error.

use crate::details::{self, FlightDetails};
use crate::pricing::{AddOns, PriceBreakdown, PricingRules};
use crate::query::{BookingContext, QueryParams, CONFIRMATION_PATH};
use crate::BookingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_COUNTRY_CODE: &str = "+91";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub country_code: String,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            email: String::new(),
            phone: String::new(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassengerType {
    Adult,
    Child,
    Infant,
}

impl PassengerType {
    pub fn label(&self) -> &'static str {
        match self {
            PassengerType::Adult => "Adult",
            PassengerType::Child => "Child",
            PassengerType::Infant => "Infant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

/// One traveler on the booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Traveler {
    #[serde(rename = "type")]
    pub passenger_type: PassengerType,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub gender: Option<Gender>,
}

impl Traveler {
    pub fn new(passenger_type: PassengerType) -> Self {
        Self {
            passenger_type,
            first_name: String::new(),
            last_name: String::new(),
            dob: String::new(),
            gender: Some(Gender::Male),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.first_name.trim().is_empty() {
            missing.push("first name");
        }
        if self.last_name.trim().is_empty() {
            missing.push("last name");
        }
        if self.dob.trim().is_empty() {
            missing.push("date of birth");
        }
        if self.gender.is_none() {
            missing.push("gender");
        }
        missing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Upi,
    Netbanking,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Netbanking => "netbanking",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "Credit/Debit Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Netbanking => "Net Banking",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "netbanking" | "net-banking" => Ok(PaymentMethod::Netbanking),
            _ => Err(BookingError::ParseError(format!("Invalid payment method: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardDetails {
    pub number: String,
    pub name: String,
    pub expiry: String,
    pub cvv: String,
}

/// Payment fields, shaped by the selected method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentDetails {
    Card(CardDetails),
    Upi {
        #[serde(default, rename = "upiId")]
        upi_id: String,
    },
    Netbanking {
        #[serde(default)]
        bank: Option<String>,
    },
}

impl Default for PaymentDetails {
    fn default() -> Self {
        PaymentDetails::Card(CardDetails::default())
    }
}

impl PaymentDetails {
    pub fn for_method(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Card => PaymentDetails::Card(CardDetails::default()),
            PaymentMethod::Upi => PaymentDetails::Upi { upi_id: String::new() },
            PaymentMethod::Netbanking => PaymentDetails::Netbanking { bank: None },
        }
    }

    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentDetails::Card(_) => PaymentMethod::Card,
            PaymentDetails::Upi { .. } => PaymentMethod::Upi,
            PaymentDetails::Netbanking { .. } => PaymentMethod::Netbanking,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CheckoutStep {
    TravelerDetails = 1,
    AddOns = 2,
    Payment = 3,
}

impl CheckoutStep {
    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            CheckoutStep::TravelerDetails => "Traveler Details",
            CheckoutStep::AddOns => "Add-ons",
            CheckoutStep::Payment => "Payment",
        }
    }

    fn following(&self) -> Option<CheckoutStep> {
        match self {
            CheckoutStep::TravelerDetails => Some(CheckoutStep::AddOns),
            CheckoutStep::AddOns => Some(CheckoutStep::Payment),
            CheckoutStep::Payment => None,
        }
    }

    fn preceding(&self) -> Option<CheckoutStep> {
        match self {
            CheckoutStep::TravelerDetails => None,
            CheckoutStep::AddOns => Some(CheckoutStep::TravelerDetails),
            CheckoutStep::Payment => Some(CheckoutStep::AddOns),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    Step(CheckoutStep),
    Submitted,
}

/// Outcome of a successful `next()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Advanced(CheckoutStep),
    /// Booking handed off to the confirmation screen at this URL.
    Submitted(String),
}

/// Everything the user types into checkout, as one JSON document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutForm {
    pub contact: ContactInfo,
    pub passengers: Vec<Traveler>,
    pub add_ons: AddOns,
    pub payment: PaymentDetails,
    pub agree_terms: bool,
}

#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    context: BookingContext,
    flight: FlightDetails,
    rules: PricingRules,
    pub contact: ContactInfo,
    passengers: Vec<Traveler>,
    pub add_ons: AddOns,
    payment: PaymentDetails,
    pub agree_terms: bool,
    state: FlowState,
}

impl CheckoutFlow {
    /// Start checkout for the flight in `context`. One traveler slot per
    /// passenger: adults, then children, then infants.
    pub fn new(context: BookingContext, rules: PricingRules) -> Self {
        let flight = details::resolve(&context.flight_id, &context.query, &rules);
        let counts = context.query.passengers;
        let passengers = std::iter::repeat(PassengerType::Adult)
            .take(counts.adults as usize)
            .chain(std::iter::repeat(PassengerType::Child).take(counts.children as usize))
            .chain(std::iter::repeat(PassengerType::Infant).take(counts.infants as usize))
            .map(Traveler::new)
            .collect();

        Self {
            context,
            flight,
            rules,
            contact: ContactInfo::default(),
            passengers,
            add_ons: AddOns::default(),
            payment: PaymentDetails::default(),
            agree_terms: false,
            state: FlowState::Step(CheckoutStep::TravelerDetails),
        }
    }

    pub fn context(&self) -> &BookingContext {
        &self.context
    }

    pub fn flight(&self) -> &FlightDetails {
        &self.flight
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn current_step(&self) -> Option<CheckoutStep> {
        match self.state {
            FlowState::Step(step) => Some(step),
            FlowState::Submitted => None,
        }
    }

    pub fn passengers(&self) -> &[Traveler] {
        &self.passengers
    }

    pub fn passenger_mut(&mut self, index: usize) -> Result<&mut Traveler, BookingError> {
        self.passengers
            .get_mut(index)
            .ok_or(BookingError::InvalidPassenger(index))
    }

    pub fn payment(&self) -> &PaymentDetails {
        &self.payment
    }

    pub fn payment_mut(&mut self) -> &mut PaymentDetails {
        &mut self.payment
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment.method()
    }

    /// Switch payment method; details reset to the new method's shape.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        if self.payment.method() != method {
            self.payment = PaymentDetails::for_method(method);
        }
    }

    /// Copy a filled-in form into the flow. The traveler list keeps its
    /// length, so the form may not carry more travelers than were booked.
    pub fn apply_form(&mut self, form: CheckoutForm) -> Result<(), BookingError> {
        if form.passengers.len() > self.passengers.len() {
            return Err(BookingError::InvalidPassenger(self.passengers.len()));
        }
        for (index, traveler) in form.passengers.into_iter().enumerate() {
            let slot = self.passenger_mut(index)?;
            slot.first_name = traveler.first_name;
            slot.last_name = traveler.last_name;
            slot.dob = traveler.dob;
            slot.gender = traveler.gender;
        }
        self.contact = form.contact;
        self.add_ons = form.add_ons;
        self.payment = form.payment;
        self.agree_terms = form.agree_terms;
        Ok(())
    }

    fn missing_fields(&self, step: CheckoutStep) -> Vec<String> {
        let mut missing = Vec::new();
        match step {
            CheckoutStep::TravelerDetails => {
                if self.contact.email.trim().is_empty() {
                    missing.push("email".to_string());
                }
                if self.contact.phone.trim().is_empty() {
                    missing.push("phone".to_string());
                }
                for (i, traveler) in self.passengers.iter().enumerate() {
                    for field in traveler.missing_fields() {
                        missing.push(format!("passenger {} {}", i + 1, field));
                    }
                }
            }
            CheckoutStep::AddOns => {}
            CheckoutStep::Payment => {
                if let PaymentDetails::Card(card) = &self.payment {
                    let fields = [
                        (&card.number, "card number"),
                        (&card.name, "name on card"),
                        (&card.expiry, "expiry"),
                        (&card.cvv, "cvv"),
                    ];
                    for (value, name) in fields {
                        if value.trim().is_empty() {
                            missing.push(name.to_string());
                        }
                    }
                }
                if !self.agree_terms {
                    missing.push("terms and conditions".to_string());
                }
            }
        }
        missing
    }

    pub fn validate_step(&self, step: CheckoutStep) -> Result<(), BookingError> {
        let missing = self.missing_fields(step);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BookingError::IncompleteStep {
                step: step.number(),
                missing,
            })
        }
    }

    pub fn is_step_valid(&self, step: CheckoutStep) -> bool {
        self.missing_fields(step).is_empty()
    }

    /// Advance one step, or submit from the payment step.
    #[instrument(level = "info", skip(self), fields(flight_id = %self.context.flight_id))]
    pub fn next(&mut self) -> Result<Transition, BookingError> {
        let FlowState::Step(step) = self.state else {
            return Err(BookingError::AlreadySubmitted);
        };
        if let Err(e) = self.validate_step(step) {
            warn!(step = step.number(), error = %e, "Checkout step incomplete");
            return Err(e);
        }

        match step.following() {
            Some(following) => {
                self.state = FlowState::Step(following);
                debug!(from = step.number(), to = following.number(), "Checkout advanced");
                Ok(Transition::Advanced(following))
            }
            None => {
                let url = self.confirmation_params()?.to_url(CONFIRMATION_PATH);
                self.state = FlowState::Submitted;
                info!(
                    total_price = self.price_breakdown().total_price,
                    payment_method = %self.payment_method(),
                    "Checkout submitted"
                );
                Ok(Transition::Submitted(url))
            }
        }
    }

    /// Go back one step. Returns false on the first step or after submit.
    pub fn previous(&mut self) -> bool {
        match self.state {
            FlowState::Step(step) => match step.preceding() {
                Some(preceding) => {
                    self.state = FlowState::Step(preceding);
                    true
                }
                None => false,
            },
            FlowState::Submitted => false,
        }
    }

    pub fn price_breakdown(&self) -> PriceBreakdown {
        PriceBreakdown::compute(
            &self.rules,
            self.flight.flight.price,
            &self.context.query.passengers,
            &self.add_ons,
        )
    }

    /// Query parameters handed to the confirmation screen.
    pub fn confirmation_params(&self) -> Result<QueryParams, BookingError> {
        let breakdown = self.price_breakdown();
        let mut params = self.context.to_params();
        params.set("totalPrice", breakdown.total_price.to_string());
        params.set("basePrice", breakdown.base_price.to_string());
        params.set("addOnsTotal", breakdown.add_ons_total.to_string());
        params.set("taxes", breakdown.taxes.to_string());
        params.set("email", self.contact.email.as_str());
        params.set("phone", self.contact.phone.as_str());
        params.set("countryCode", self.contact.country_code.as_str());
        params.set("passengers", serde_json::to_string(&self.passengers)?);
        params.set("addOns", serde_json::to_string(&self.add_ons)?);
        params.set("paymentMethod", self.payment_method().as_str());
        Ok(params)
    }
}
