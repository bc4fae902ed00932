use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pvz_core::{DomainError, DomainResult, Entity, PickupPointId, ReceptionId, ValueObject};

/// Reception status lifecycle: `InProgress` (open) → `Closed`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceptionStatus {
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "close")]
    Closed,
}

impl ReceptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptionStatus::InProgress => "in_progress",
            ReceptionStatus::Closed => "close",
        }
    }
}

impl core::fmt::Display for ReceptionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceptionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ReceptionStatus::InProgress),
            "close" => Ok(ReceptionStatus::Closed),
            other => Err(DomainError::internal(format!(
                "unknown reception status '{other}'"
            ))),
        }
    }
}

impl ValueObject for ReceptionStatus {}

/// Reception record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reception {
    pub id: ReceptionId,
    pub pickup_point_id: PickupPointId,
    pub status: ReceptionStatus,
    pub created_at: DateTime<Utc>,
}

impl Reception {
    /// A fresh, open reception for `pickup_point_id`.
    pub fn open(
        id: ReceptionId,
        pickup_point_id: PickupPointId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            pickup_point_id,
            status: ReceptionStatus::InProgress,
            created_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ReceptionStatus::InProgress
    }

    /// Decide the closed form of this reception (does not mutate `self`).
    ///
    /// Closing an already closed reception fails with `ReceptionAlreadyClosed`.
    pub fn close(&self) -> DomainResult<Reception> {
        if !self.is_open() {
            return Err(DomainError::ReceptionAlreadyClosed);
        }
        Ok(Reception {
            status: ReceptionStatus::Closed,
            ..self.clone()
        })
    }

    /// Products may only be added to or removed from an open reception.
    pub fn ensure_accepting_products(&self) -> DomainResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DomainError::ReceptionAlreadyClosed)
        }
    }

    /// Guard for opening a new reception given the most recent one (if any).
    pub fn ensure_can_open_after(latest: Option<&Reception>) -> DomainResult<()> {
        match latest {
            Some(r) if r.is_open() => Err(DomainError::ReceptionAlreadyOpen),
            _ => Ok(()),
        }
    }
}

impl Entity for Reception {
    type Id = ReceptionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_reception() -> Reception {
        Reception::open(ReceptionId::new(), PickupPointId::new(), Utc::now())
    }

    #[test]
    fn open_reception_is_in_progress() {
        let reception = test_reception();
        assert!(reception.is_open());
        assert_eq!(reception.status, ReceptionStatus::InProgress);
    }

    #[test]
    fn close_returns_closed_copy() {
        let reception = test_reception();
        let closed = reception.close().unwrap();

        assert_eq!(closed.status, ReceptionStatus::Closed);
        assert_eq!(closed.id, reception.id);
        assert_eq!(closed.created_at, reception.created_at);
        assert!(reception.is_open(), "close must not mutate the receiver");
    }

    #[test]
    fn close_twice_is_rejected() {
        let closed = test_reception().close().unwrap();
        assert_eq!(closed.close().unwrap_err(), DomainError::ReceptionAlreadyClosed);
    }

    #[test]
    fn closed_reception_does_not_accept_products() {
        let reception = test_reception();
        assert!(reception.ensure_accepting_products().is_ok());

        let closed = reception.close().unwrap();
        assert_eq!(
            closed.ensure_accepting_products().unwrap_err(),
            DomainError::ReceptionAlreadyClosed
        );
    }

    #[test]
    fn cannot_open_while_latest_is_open() {
        let open = test_reception();
        assert_eq!(
            Reception::ensure_can_open_after(Some(&open)).unwrap_err(),
            DomainError::ReceptionAlreadyOpen
        );

        let closed = open.close().unwrap();
        assert!(Reception::ensure_can_open_after(Some(&closed)).is_ok());
        assert!(Reception::ensure_can_open_after(None).is_ok());
    }

    #[test]
    fn status_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&ReceptionStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(serde_json::to_string(&ReceptionStatus::Closed).unwrap(), "\"close\"");
        assert_eq!("close".parse::<ReceptionStatus>().unwrap(), ReceptionStatus::Closed);
        assert!("open".parse::<ReceptionStatus>().is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn closing_is_one_way(attempts in 1usize..8) {
                let mut current = test_reception();
                let mut successes = 0;
                for _ in 0..attempts {
                    if let Ok(next) = current.close() {
                        current = next;
                        successes += 1;
                    }
                }
                prop_assert_eq!(successes, 1);
                prop_assert!(!current.is_open());
            }
        }
    }
}
