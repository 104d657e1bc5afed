//! Store-assigned numeric identifiers.
//!
//! Identifiers are allocated by the persistent store (sequence semantics), so
//! the domain never invents them: it only wraps what the store hands back.
//! Each domain crate declares its own newtype via [`entity_id!`].

/// Declare a strongly-typed `i64` identifier newtype.
///
/// The wrapped value is the raw key assigned by the store. `FromStr` parses
/// path/query parameters and reports failures as
/// [`DomainError::Validation`](crate::DomainError).
#[macro_export]
macro_rules! entity_id {
    ($(#[$meta:meta])* $vis:vis struct $t:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        $vis struct $t(pub i64);

        impl $t {
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $t {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$t> for i64 {
            fn from(id: $t) -> Self {
                id.0
            }
        }

        impl ::core::str::FromStr for $t {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>()
                    .map(Self)
                    .map_err(|e| {
                        $crate::DomainError::validation(format!(
                            concat!(stringify!($t), ": {}"),
                            e
                        ))
                    })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::entity_id! {
        /// Test-only identifier.
        pub struct ProbeId
    }

    #[test]
    fn parses_and_displays_raw_key() {
        let id: ProbeId = "42".parse().unwrap();
        assert_eq!(id, ProbeId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn rejects_non_numeric_input() {
        let err = "abc".parse::<ProbeId>().unwrap_err();
        assert!(matches!(err, crate::DomainError::Validation(_)));
    }
}
