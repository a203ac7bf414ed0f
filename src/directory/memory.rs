//! In-memory directory for testing without a database.

use super::{Directory, DirectoryError};
use crate::domain::{Affiliate, House};
use async_trait::async_trait;
use std::collections::HashMap;

/// Directory backed by maps, seeded up front.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    houses: HashMap<String, House>,
    affiliates: HashMap<String, Affiliate>,
    fail_lookups: bool,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a house, keyed by its identifier.
    pub fn with_house(mut self, house: House) -> Self {
        self.houses.insert(house.identifier.clone(), house);
        self
    }

    /// Add an affiliate, keyed by username.
    pub fn with_affiliate(mut self, affiliate: Affiliate) -> Self {
        self.affiliates
            .insert(affiliate.username.clone(), affiliate);
        self
    }

    /// Make every lookup fail with a backend error.
    pub fn with_failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_house_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<House>, DirectoryError> {
        if self.fail_lookups {
            return Err(DirectoryError::Backend("simulated failure".to_string()));
        }
        Ok(self.houses.get(identifier).cloned())
    }

    async fn find_affiliate_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Affiliate>, DirectoryError> {
        if self.fail_lookups {
            return Err(DirectoryError::Backend("simulated failure".to_string()));
        }
        Ok(self.affiliates.get(username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommissionType, Decimal};

    fn house(identifier: &str) -> House {
        House {
            identifier: identifier.to_string(),
            name: identifier.to_string(),
            commission_type: CommissionType::Cpa,
            commission_value: Decimal::parse("50").unwrap(),
            cpa_value: None,
            revshare_value: None,
        }
    }

    #[tokio::test]
    async fn test_lookup_hits_and_misses() {
        let directory = InMemoryDirectory::new()
            .with_house(house("bet365"))
            .with_affiliate(Affiliate::new("joao"));

        let found = directory.find_house_by_identifier("bet365").await.unwrap();
        assert_eq!(found.unwrap().identifier, "bet365");

        let missing = directory.find_house_by_identifier("nope").await.unwrap();
        assert!(missing.is_none());

        let affiliate = directory.find_affiliate_by_username("joao").await.unwrap();
        assert_eq!(affiliate.unwrap().username, "joao");

        let missing = directory.find_affiliate_by_username("maria").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_failing_lookups() {
        let directory = InMemoryDirectory::new()
            .with_house(house("bet365"))
            .with_failing_lookups();

        assert!(directory.find_house_by_identifier("bet365").await.is_err());
        assert!(directory.find_affiliate_by_username("joao").await.is_err());
    }
}
