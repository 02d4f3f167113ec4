use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! natural_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the string representation of this identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when the identifier is blank (a missing required field).
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

natural_id!(
    /// Natural key of a credit facility (e.g. `"FAC-0001"`).
    ///
    /// # Examples
    ///
    /// ```
    /// use facility_rollup::core::ids::FacilityId;
    ///
    /// let a = FacilityId::new("FAC-0001");
    /// let b = FacilityId::new("FAC-0002");
    /// assert_ne!(a, b);
    /// ```
    FacilityId
);

natural_id!(
    /// Natural key of a borrower, guarantor or parent counterparty.
    CounterpartyId
);

natural_id!(
    /// Natural key of a bank legal entity (booking or lending entity).
    LegalEntityId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_equality() {
        let a = FacilityId::new("FAC-0001");
        let b = FacilityId::new("FAC-0001");
        let c = FacilityId::new("FAC-0002");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_id_display() {
        let cp = CounterpartyId::new("CP-042");
        assert_eq!(format!("{}", cp), "CP-042");
    }

    #[test]
    fn test_blank_id() {
        assert!(LegalEntityId::new("  ").is_blank());
        assert!(LegalEntityId::default().is_blank());
        assert!(!LegalEntityId::new("LE-US").is_blank());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&FacilityId::new("FAC-7")).unwrap();
        assert_eq!(json, "\"FAC-7\"");
    }
}
