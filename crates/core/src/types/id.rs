//! Integer ids for backend records.
//!
//! Every record the backend hands out carries a positive `i64` id. Each record
//! kind gets its own wrapper so a product id can never be sent where a user
//! id belongs. Zero and negative values only ever come from user input, which
//! is what [`UserId::is_positive`] and friends are for.

/// Declare an id wrapper over `i64`.
///
/// The generated type is `Copy`, ordered, serde-transparent, and parses from
/// a (trimmed) decimal string, so clap can take it as an argument directly.
///
/// ```rust
/// # use folio_core::define_id;
/// define_id!(InvoiceId);
///
/// let id: InvoiceId = " 12 ".parse().unwrap();
/// assert_eq!(id.as_i64(), 12);
/// assert_eq!(id.to_string(), "12");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }

            /// Whether the backend could have issued this id.
            #[must_use]
            pub const fn is_positive(&self) -> bool {
                self.0 > 0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(OrderId);
define_id!(CommentId);
define_id!(TransactionId);
