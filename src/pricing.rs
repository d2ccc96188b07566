//! Fares, add-ons and the checkout price breakdown

use crate::{PassengerCounts, TravelClass};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optional extras sold per passenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddOn {
    Meal,
    ExtraBaggage,
    Insurance,
    SeatSelection,
}

impl AddOn {
    pub const ALL: [AddOn; 4] = [
        AddOn::Meal,
        AddOn::ExtraBaggage,
        AddOn::Insurance,
        AddOn::SeatSelection,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            AddOn::Meal => "Meal Selection",
            AddOn::ExtraBaggage => "Extra Baggage",
            AddOn::Insurance => "Travel Insurance",
            AddOn::SeatSelection => "Seat Selection",
        }
    }
}

impl fmt::Display for AddOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Selected add-ons, serialized as `{"meal":true,"extraBaggage":false,...}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddOns {
    pub meal: bool,
    pub extra_baggage: bool,
    pub insurance: bool,
    pub seat_selection: bool,
}

impl AddOns {
    pub fn is_selected(&self, add_on: AddOn) -> bool {
        match add_on {
            AddOn::Meal => self.meal,
            AddOn::ExtraBaggage => self.extra_baggage,
            AddOn::Insurance => self.insurance,
            AddOn::SeatSelection => self.seat_selection,
        }
    }

    pub fn set(&mut self, add_on: AddOn, selected: bool) {
        let flag = match add_on {
            AddOn::Meal => &mut self.meal,
            AddOn::ExtraBaggage => &mut self.extra_baggage,
            AddOn::Insurance => &mut self.insurance,
            AddOn::SeatSelection => &mut self.seat_selection,
        };
        *flag = selected;
    }

    pub fn toggle(&mut self, add_on: AddOn) {
        self.set(add_on, !self.is_selected(add_on));
    }

    pub fn selected(&self) -> impl Iterator<Item = AddOn> + '_ {
        AddOn::ALL.into_iter().filter(|a| self.is_selected(*a))
    }
}

/// Per-class amounts in whole currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFares {
    pub economy: u64,
    pub premium_economy: u64,
    pub business: u64,
    pub first: u64,
}

impl ClassFares {
    pub fn for_class(&self, class: TravelClass) -> u64 {
        match class {
            TravelClass::Economy => self.economy,
            TravelClass::PremiumEconomy => self.premium_economy,
            TravelClass::Business => self.business,
            TravelClass::First => self.first,
        }
    }
}

/// Unit prices of each add-on, charged once per passenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOnPrices {
    pub meal: u64,
    pub extra_baggage: u64,
    pub insurance: u64,
    pub seat_selection: u64,
}

impl AddOnPrices {
    pub fn unit_price(&self, add_on: AddOn) -> u64 {
        match add_on {
            AddOn::Meal => self.meal,
            AddOn::ExtraBaggage => self.extra_baggage,
            AddOn::Insurance => self.insurance,
            AddOn::SeatSelection => self.seat_selection,
        }
    }
}

/// Fare tables and rates used across the flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingRules {
    /// Lower bound of generated result prices
    pub search_base_fares: ClassFares,
    /// Published fare on the details and checkout screens
    pub listed_fares: ClassFares,
    pub infant_fare_percent: u64,
    pub tax_percent: u64,
    pub add_ons: AddOnPrices,
    /// Upper bound of the results price filter
    pub price_ceiling: u64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            search_base_fares: ClassFares {
                economy: 3000,
                premium_economy: 6000,
                business: 12000,
                first: 25000,
            },
            listed_fares: ClassFares {
                economy: 3500,
                premium_economy: 6500,
                business: 12500,
                first: 25000,
            },
            infant_fare_percent: 10,
            tax_percent: 12,
            add_ons: AddOnPrices {
                meal: 500,
                extra_baggage: 1000,
                insurance: 300,
                seat_selection: 200,
            },
            price_ceiling: 50_000,
        }
    }
}

impl PricingRules {
    /// Full fares for adults and children plus the discounted infant fare.
    pub fn base_fare(&self, price: u64, passengers: &PassengerCounts) -> u64 {
        let full = price * u64::from(passengers.seated());
        let infant = percent_of(price * u64::from(passengers.infants), self.infant_fare_percent);
        full + infant
    }

    pub fn add_ons_total(&self, add_ons: &AddOns, passengers: &PassengerCounts) -> u64 {
        let travellers = u64::from(passengers.total());
        add_ons
            .selected()
            .map(|a| self.add_ons.unit_price(a) * travellers)
            .sum()
    }

    pub fn taxes(&self, subtotal: u64) -> u64 {
        percent_of(subtotal, self.tax_percent)
    }
}

/// Itemized checkout total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub base_price: u64,
    pub add_ons_total: u64,
    pub taxes: u64,
    pub total_price: u64,
}

impl PriceBreakdown {
    pub fn compute(
        rules: &PricingRules,
        price: u64,
        passengers: &PassengerCounts,
        add_ons: &AddOns,
    ) -> Self {
        let base_price = rules.base_fare(price, passengers);
        let add_ons_total = rules.add_ons_total(add_ons, passengers);
        let taxes = rules.taxes(base_price + add_ons_total);
        Self {
            base_price,
            add_ons_total,
            taxes,
            total_price: base_price + add_ons_total + taxes,
        }
    }
}

/// `amount * percent / 100`, rounded half up.
fn percent_of(amount: u64, percent: u64) -> u64 {
    (amount * percent + 50) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passengers(adults: u32, children: u32, infants: u32) -> PassengerCounts {
        PassengerCounts { adults, children, infants }
    }

    #[test]
    fn test_reference_breakdown() {
        let rules = PricingRules::default();
        let breakdown = PriceBreakdown::compute(&rules, 3500, &passengers(2, 0, 1), &AddOns::default());
        assert_eq!(breakdown.base_price, 7350);
        assert_eq!(breakdown.add_ons_total, 0);
        assert_eq!(breakdown.taxes, 882);
        assert_eq!(breakdown.total_price, 8232);
    }

    #[test]
    fn test_add_ons_charged_per_passenger() {
        let rules = PricingRules::default();
        let mut add_ons = AddOns::default();
        add_ons.set(AddOn::Meal, true);
        add_ons.toggle(AddOn::Insurance);

        // 2 adults + 1 child + 1 infant = 4 travellers
        let total = rules.add_ons_total(&add_ons, &passengers(2, 1, 1));
        assert_eq!(total, (500 + 300) * 4);

        let breakdown = PriceBreakdown::compute(&rules, 3500, &passengers(2, 1, 1), &add_ons);
        assert_eq!(breakdown.base_price, 3500 * 3 + 350);
        assert_eq!(
            breakdown.taxes,
            ((breakdown.base_price + breakdown.add_ons_total) as f64 * 0.12).round() as u64
        );
        assert_eq!(
            breakdown.total_price,
            breakdown.base_price + breakdown.add_ons_total + breakdown.taxes
        );
    }

    #[test]
    fn test_listed_fares_by_class() {
        let rules = PricingRules::default();
        assert_eq!(rules.listed_fares.for_class(TravelClass::Economy), 3500);
        assert_eq!(rules.listed_fares.for_class(TravelClass::PremiumEconomy), 6500);
        assert_eq!(rules.listed_fares.for_class(TravelClass::Business), 12500);
        assert_eq!(rules.listed_fares.for_class(TravelClass::First), 25000);
        assert_eq!(rules.search_base_fares.for_class(TravelClass::Business), 12000);
    }

    #[test]
    fn test_add_ons_json_shape() {
        let add_ons: AddOns = serde_json::from_str(r#"{"meal":true,"seatSelection":true}"#).unwrap();
        assert!(add_ons.meal && add_ons.seat_selection);
        assert!(!add_ons.extra_baggage);
        let json = serde_json::to_string(&add_ons).unwrap();
        assert!(json.contains("\"extraBaggage\":false"));
    }
}
