//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects carry no identity and are compared by their attribute values.
/// In this domain that covers the closed vocabularies (`City`, `ProductType`,
/// `ReceptionStatus`) and the read-side query parameters (`DateRange`,
/// `PageRequest`).
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct DateRange { start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>> }
///
/// impl ValueObject for DateRange {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
