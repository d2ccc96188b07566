//! Popular routes showcase on the search page

use crate::BookingError;
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteCategory {
    Europe,
    Asia,
    America,
    Oceania,
    Africa,
}

impl RouteCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RouteCategory::Europe => "Europe",
            RouteCategory::Asia => "Asia",
            RouteCategory::America => "Americas",
            RouteCategory::Oceania => "Oceania",
            RouteCategory::Africa => "Africa",
        }
    }
}

impl FromStr for RouteCategory {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "europe" => Ok(RouteCategory::Europe),
            "asia" => Ok(RouteCategory::Asia),
            "america" | "americas" => Ok(RouteCategory::America),
            "oceania" => Ok(RouteCategory::Oceania),
            "africa" => Ok(RouteCategory::Africa),
            _ => Err(BookingError::ParseError(format!("Invalid route category: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularRoute {
    pub id: u32,
    pub route: &'static str,
    pub from: &'static str,
    pub to: &'static str,
    pub image: &'static str,
    pub category: RouteCategory,
    pub rating: f32,
    pub review_count: u32,
    pub starting_price: u64,
    pub duration: &'static str,
    pub airline: &'static str,
    pub description: &'static str,
    pub is_popular: bool,
    pub frequency: &'static str,
}

pub const POPULAR_ROUTES: [PopularRoute; 6] = [
    PopularRoute {
        id: 1,
        route: "New York to Paris",
        from: "JFK",
        to: "CDG",
        image: "https://plus.unsplash.com/premium_photo-1661914178431-fc899737a386?q=80&w=1170&auto=format&fit=crop",
        category: RouteCategory::Europe,
        rating: 4.8,
        review_count: 2847,
        starting_price: 45999,
        duration: "7h 35m",
        airline: "Air France",
        description: "City of lights and romance awaits",
        is_popular: true,
        frequency: "14 daily flights",
    },
    PopularRoute {
        id: 2,
        route: "London to Tokyo",
        from: "LHR",
        to: "NRT",
        image: "https://images.unsplash.com/photo-1540959733332-eab4deabeeaf?w=600&h=400&fit=crop",
        category: RouteCategory::Asia,
        rating: 4.9,
        review_count: 3421,
        starting_price: 52999,
        duration: "11h 45m",
        airline: "British Airways",
        description: "Experience the blend of tradition and modernity",
        is_popular: true,
        frequency: "8 daily flights",
    },
    PopularRoute {
        id: 3,
        route: "Dubai to New York",
        from: "DXB",
        to: "JFK",
        image: "https://images.unsplash.com/photo-1496442226666-8d4d0e62e6e9?w=600&h=400&fit=crop",
        category: RouteCategory::America,
        rating: 4.7,
        review_count: 4156,
        starting_price: 38999,
        duration: "14h 20m",
        airline: "Emirates",
        description: "From desert luxury to the Big Apple",
        is_popular: false,
        frequency: "6 daily flights",
    },
    PopularRoute {
        id: 4,
        route: "Singapore to Sydney",
        from: "SIN",
        to: "SYD",
        image: "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=600&h=400&fit=crop",
        category: RouteCategory::Oceania,
        rating: 4.6,
        review_count: 2654,
        starting_price: 28999,
        duration: "8h 15m",
        airline: "Singapore Airlines",
        description: "Gateway to Australia's vibrant harbor city",
        is_popular: true,
        frequency: "12 daily flights",
    },
    PopularRoute {
        id: 5,
        route: "Los Angeles to Bangkok",
        from: "LAX",
        to: "BKK",
        image: "https://images.unsplash.com/photo-1552465011-b4e21bf6e79a?w=600&h=400&fit=crop",
        category: RouteCategory::Asia,
        rating: 4.5,
        review_count: 3231,
        starting_price: 42799,
        duration: "15h 30m",
        airline: "Thai Airways",
        description: "From Hollywood to the Land of Smiles",
        is_popular: false,
        frequency: "5 daily flights",
    },
    PopularRoute {
        id: 6,
        route: "Frankfurt to São Paulo",
        from: "FRA",
        to: "GRU",
        image: "https://images.unsplash.com/photo-1483729558449-99ef09a8c325?w=600&h=400&fit=crop",
        category: RouteCategory::America,
        rating: 4.8,
        review_count: 1987,
        starting_price: 48599,
        duration: "11h 55m",
        airline: "Lufthansa",
        description: "Connect Europe to Brazil's megacity",
        is_popular: true,
        frequency: "7 daily flights",
    },
];

/// Routes in `category`, or every route for `None`.
pub fn popular_routes(category: Option<RouteCategory>) -> Vec<&'static PopularRoute> {
    POPULAR_ROUTES
        .iter()
        .filter(|route| category.map_or(true, |c| route.category == c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageHostAllowlist;

    #[test]
    fn test_all_categories() {
        assert_eq!(popular_routes(None).len(), 6);
        assert_eq!(popular_routes(Some(RouteCategory::Asia)).len(), 2);
        assert_eq!(popular_routes(Some(RouteCategory::America)).len(), 2);
        assert!(popular_routes(Some(RouteCategory::Africa)).is_empty());
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Americas".parse::<RouteCategory>().unwrap(), RouteCategory::America);
        assert!("antarctica".parse::<RouteCategory>().is_err());
    }

    #[test]
    fn test_images_come_from_allowed_hosts() {
        let hosts = ImageHostAllowlist::default();
        for route in popular_routes(None) {
            assert!(hosts.permits(route.image), "{} not allowed", route.image);
        }
    }
}
