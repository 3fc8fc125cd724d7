//! Sale configuration
//!
//! Seed, private and strategic rounds differ only in price, schedule and
//! participant list, so they are all one `SaleLedger` built from a
//! `SaleConfig`. Configs are plain JSON.

use sale_types::ids::Address;
use sale_types::numeric::{UnitScale, MAX_DECIMALS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use crate::asset::AssetAccount;
use crate::errors::ConfigError;
use crate::ledger::SaleLedger;
use crate::release::ReleaseSchedule;

/// Label for the sale round a config describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleTier {
    Seed,
    Private,
    Strategic,
    Custom,
}

/// Initial participant registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantConfig {
    pub address: Address,
    pub min_buy_allowed: u128,
    pub max_buy_allowed: u128,
}

/// Parameters of one sale round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfig {
    pub tier: SaleTier,
    /// Payment-asset smallest units per whole sale unit
    pub unit_price: u128,
    pub sale_decimals: u32,
    /// Unix seconds
    pub init_release_date: i64,
    /// Seconds between releases
    pub release_interval: i64,
    pub total_releases: u64,
    #[serde(default)]
    pub participants: Vec<ParticipantConfig>,
}

impl SaleConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SaleConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_releases == 0 {
            return Err(ConfigError::ZeroReleases);
        }
        if self.release_interval < 0 {
            return Err(ConfigError::NegativeInterval(self.release_interval));
        }
        if self.unit_price == 0 {
            return Err(ConfigError::ZeroPrice);
        }
        if self.sale_decimals > MAX_DECIMALS {
            return Err(ConfigError::UnsupportedDecimals(self.sale_decimals));
        }

        let mut seen = HashSet::new();
        for participant in &self.participants {
            if participant.min_buy_allowed > participant.max_buy_allowed {
                return Err(ConfigError::InvalidBounds {
                    address: participant.address.to_string(),
                    min: participant.min_buy_allowed,
                    max: participant.max_buy_allowed,
                });
            }
            if !seen.insert(&participant.address) {
                return Err(ConfigError::DuplicateParticipant(
                    participant.address.to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl<P: AssetAccount, S: AssetAccount> SaleLedger<P, S> {
    /// Build a ledger from a validated config and register its participants
    /// in listed order.
    pub fn from_config(
        config: &SaleConfig,
        admin: impl Into<Address>,
        ledger_address: impl Into<Address>,
        payment: P,
        sale: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let admin = admin.into();
        let unit_scale = UnitScale::from_decimals(config.sale_decimals)
            .map_err(|_| ConfigError::UnsupportedDecimals(config.sale_decimals))?;
        let schedule = ReleaseSchedule::new(
            config.init_release_date,
            config.release_interval,
            config.total_releases,
        )?;

        let mut ledger = SaleLedger::new(
            admin.clone(),
            ledger_address,
            config.unit_price,
            unit_scale,
            schedule,
            payment,
            sale,
        );
        for participant in &config.participants {
            ledger.add_participant(
                &admin,
                &participant.address,
                participant.min_buy_allowed,
                participant.max_buy_allowed,
            )?;
        }

        info!(
            sale_id = %ledger.sale_id(),
            tier = ?config.tier,
            participants = config.participants.len(),
            "Sale ledger configured"
        );
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::InMemoryAsset;

    const SEED_JSON: &str = r#"{
        "tier": "seed",
        "unit_price": 25000,
        "sale_decimals": 18,
        "init_release_date": 1700000000,
        "release_interval": 2592000,
        "total_releases": 12,
        "participants": [
            { "address": "alice", "min_buy_allowed": 1, "max_buy_allowed": 49 },
            { "address": "bob", "min_buy_allowed": 10, "max_buy_allowed": 500 }
        ]
    }"#;

    #[test]
    fn test_parse_seed_config() {
        let config = SaleConfig::from_json_str(SEED_JSON).unwrap();
        assert_eq!(config.tier, SaleTier::Seed);
        assert_eq!(config.total_releases, 12);
        assert_eq!(config.participants.len(), 2);
        assert_eq!(config.participants[1].address, Address::from("bob"));
    }

    #[test]
    fn test_participants_default_to_empty() {
        let json = r#"{
            "tier": "strategic",
            "unit_price": 1,
            "sale_decimals": 6,
            "init_release_date": 0,
            "release_interval": 0,
            "total_releases": 1
        }"#;
        let config = SaleConfig::from_json_str(json).unwrap();
        assert!(config.participants.is_empty());
    }

    #[test]
    fn test_malformed_json() {
        let result = SaleConfig::from_json_str("{ \"tier\": \"seed\" }");
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn test_validate_rejects_zero_releases() {
        let mut config = SaleConfig::from_json_str(SEED_JSON).unwrap();
        config.total_releases = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroReleases));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut config = SaleConfig::from_json_str(SEED_JSON).unwrap();
        config.participants.push(config.participants[0].clone());
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateParticipant("alice".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = SaleConfig::from_json_str(SEED_JSON).unwrap();
        config.participants[0].min_buy_allowed = 100;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBounds { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_decimals_and_price() {
        let mut config = SaleConfig::from_json_str(SEED_JSON).unwrap();
        config.sale_decimals = 39;
        assert_eq!(config.validate(), Err(ConfigError::UnsupportedDecimals(39)));
        config.sale_decimals = 18;
        config.unit_price = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPrice));
    }

    #[test]
    fn test_from_config_registers_participants() {
        let config = SaleConfig::from_json_str(SEED_JSON).unwrap();
        let ledger = SaleLedger::from_config(
            &config,
            "admin",
            "seed-sale",
            InMemoryAsset::new("USDT"),
            InMemoryAsset::new("SALE"),
        )
        .unwrap();

        assert_eq!(ledger.participant_count(), 2);
        assert_eq!(ledger.total_min_buy_allowed(), 11);
        assert_eq!(ledger.total_max_buy_allowed(), 549);
        assert_eq!(ledger.unit_price(), 25_000);
        assert_eq!(ledger.schedule().release_interval(), 2_592_000);
        assert_eq!(ledger.ledger_address(), &Address::from("seed-sale"));
        let order: Vec<_> = ledger.participants().map(|(a, _)| a.to_string()).collect();
        assert_eq!(order, vec!["alice", "bob"]);
    }
}
