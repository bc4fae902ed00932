use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pvz_core::{DomainError, DomainResult, Entity, ProductId, ReceptionId, ValueObject};

/// Product types a reception accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "электроника")]
    Electronics,
    #[serde(rename = "одежда")]
    Clothing,
    #[serde(rename = "обувь")]
    Shoes,
}

impl ProductType {
    pub const ALL: [ProductType; 3] = [
        ProductType::Electronics,
        ProductType::Clothing,
        ProductType::Shoes,
    ];

    /// Canonical (wire/storage) name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Electronics => "электроника",
            ProductType::Clothing => "одежда",
            ProductType::Shoes => "обувь",
        }
    }
}

impl core::fmt::Display for ProductType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = DomainError;

    /// Accepts the canonical name or its English alias (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(t) = ProductType::ALL.into_iter().find(|t| t.as_str() == trimmed) {
            return Ok(t);
        }
        match trimmed.to_lowercase().as_str() {
            "electronics" => Ok(ProductType::Electronics),
            "clothing" => Ok(ProductType::Clothing),
            "shoes" => Ok(ProductType::Shoes),
            _ => Err(DomainError::InvalidProductType(s.to_string())),
        }
    }
}

impl ValueObject for ProductType {}

/// A product logged within a reception. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub reception_id: ReceptionId,
    pub product_type: ProductType,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        id: ProductId,
        reception_id: ReceptionId,
        product_type: ProductType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            reception_id,
            product_type,
            created_at,
        }
    }

    /// Parse `product_type` and build a new record.
    ///
    /// Fails with `InvalidProductType` when the type is outside the allowed set.
    pub fn register(
        id: ProductId,
        reception_id: ReceptionId,
        product_type: &str,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let product_type = product_type.parse::<ProductType>()?;
        Ok(Self::new(id, reception_id, product_type, created_at))
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
