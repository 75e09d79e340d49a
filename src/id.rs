use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    ops::Deref,
    str::FromStr,
};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Hash, Eq, PartialOrd, Ord, Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str { &self.0 }
        }

        impl<S: Into<String>> From<S> for $name {
            fn from(other: S) -> $name { $name(other.into()) }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &str { &self.0 }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<$name, Self::Err> {
                Ok($name::from(s))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id! {
    /// The backend's identifier for a product.
    ProductId
}

string_id! {
    /// A shopper's account identifier.
    UserId
}

string_id! {
    /// An order's identifier.
    OrderId
}

string_id! {
    /// The identifier of a single line in a shopper's cart.
    CartItemId
}

impl OrderId {
    /// The short, human-friendly reference shown to shoppers (the last six
    /// characters, upper-cased).
    pub fn short_reference(&self) -> String {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(5)
            .map(|(ix, _)| ix)
            .unwrap_or(0);

        self.0[start..].to_uppercase()
    }
}
