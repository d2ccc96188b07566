//! Runtime configuration
//!
//! Everything has a built-in default; a JSON file may override any section.

use crate::confirmation::ConfirmationStub;
use crate::pricing::PricingRules;
use crate::BookingError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// External hosts images may be loaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageHostAllowlist {
    pub hosts: Vec<String>,
}

impl Default for ImageHostAllowlist {
    fn default() -> Self {
        Self {
            hosts: vec![
                "images.unsplash.com".to_string(),
                "plus.unsplash.com".to_string(),
                "hotelioimages.blob.core.windows.net".to_string(),
            ],
        }
    }
}

impl ImageHostAllowlist {
    /// Only `https` URLs on an exact listed host pass.
    pub fn permits(&self, image_url: &str) -> bool {
        let Ok(url) = Url::parse(image_url) else {
            return false;
        };
        url.scheme() == "https"
            && url
                .host_str()
                .map_or(false, |host| self.hosts.iter().any(|h| h.eq_ignore_ascii_case(host)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingConfig {
    pub pricing: PricingRules,
    pub confirmation: ConfirmationStub,
    pub image_hosts: ImageHostAllowlist,
}

impl BookingConfig {
    pub fn from_json(json: &str) -> Result<Self, BookingError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BookingError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading booking config");
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        info!(path = %path.display(), "Booking config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        let pricing = &self.pricing;
        if pricing.tax_percent > 100 {
            return Err(BookingError::ConfigError(format!(
                "taxPercent must be 0-100, got {}",
                pricing.tax_percent
            )));
        }
        if pricing.infant_fare_percent > 100 {
            return Err(BookingError::ConfigError(format!(
                "infantFarePercent must be 0-100, got {}",
                pricing.infant_fare_percent
            )));
        }
        if pricing.price_ceiling == 0 {
            return Err(BookingError::ConfigError(
                "priceCeiling must be positive".to_string(),
            ));
        }
        if self.image_hosts.hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(BookingError::ConfigError(
                "image hosts must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BookingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pricing.tax_percent, 12);
        assert_eq!(config.confirmation.payment_amount, 4500);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = BookingConfig::from_json(r#"{"pricing": {"taxPercent": 18}}"#).unwrap();
        assert_eq!(config.pricing.tax_percent, 18);
        assert_eq!(config.pricing.infant_fare_percent, 10);
        assert_eq!(config.image_hosts, ImageHostAllowlist::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            BookingConfig::from_json(r#"{"pricing": {"taxPercent": 180}}"#),
            Err(BookingError::ConfigError(_))
        ));
        assert!(matches!(
            BookingConfig::from_json("not json"),
            Err(BookingError::JsonError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            BookingConfig::from_file("/definitely/not/here.json"),
            Err(BookingError::IoError(_))
        ));
    }

    #[test]
    fn test_image_allowlist() {
        let hosts = ImageHostAllowlist::default();
        assert!(hosts.permits("https://images.unsplash.com/photo-1436491865332?w=600"));
        assert!(hosts.permits("https://plus.unsplash.com/premium_photo-1661914178431"));
        assert!(!hosts.permits("http://images.unsplash.com/photo.jpg"));
        assert!(!hosts.permits("https://evil.example.com/photo.jpg"));
        assert!(!hosts.permits("https://images.unsplash.com.evil.com/photo.jpg"));
        assert!(!hosts.permits("not a url"));
    }
}
