use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pvz_core::{DomainError, DomainResult, Entity, PickupPointId, ValueObject};

/// Cities a pickup point may be registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    #[serde(rename = "Москва")]
    Moscow,
    #[serde(rename = "Санкт-Петербург")]
    SaintPetersburg,
    #[serde(rename = "Казань")]
    Kazan,
}

impl City {
    pub const ALL: [City; 3] = [City::Moscow, City::SaintPetersburg, City::Kazan];

    /// Canonical (wire/storage) name.
    pub fn as_str(&self) -> &'static str {
        match self {
            City::Moscow => "Москва",
            City::SaintPetersburg => "Санкт-Петербург",
            City::Kazan => "Казань",
        }
    }
}

impl core::fmt::Display for City {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for City {
    type Err = DomainError;

    /// Accepts the canonical name or its English alias (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(city) = City::ALL.into_iter().find(|c| c.as_str() == trimmed) {
            return Ok(city);
        }
        match trimmed.to_lowercase().as_str() {
            "moscow" => Ok(City::Moscow),
            "saint petersburg" | "saint-petersburg" | "st. petersburg" => Ok(City::SaintPetersburg),
            "kazan" => Ok(City::Kazan),
            _ => Err(DomainError::InvalidCity(s.to_string())),
        }
    }
}

impl ValueObject for City {}

/// A registered pickup point. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupPoint {
    pub id: PickupPointId,
    pub city: City,
    pub registered_at: DateTime<Utc>,
}

impl PickupPoint {
    /// Validate `city` and build a new record.
    ///
    /// Fails with `InvalidCity` when the city is outside the allowed set.
    pub fn register(
        id: PickupPointId,
        city: &str,
        registered_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let city = city.parse::<City>()?;
        Ok(Self {
            id,
            city,
            registered_at,
        })
    }
}

impl Entity for PickupPoint {
    type Id = PickupPointId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
