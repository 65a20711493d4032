//! Shopify store domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input is empty after trimming the scheme and path.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input is too long to be a hostname.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character that cannot appear in a hostname.
    #[error("shop domain contains invalid character '{0}'")]
    InvalidCharacter(char),
    /// The host is not a `*.myshopify.com` store domain.
    #[error("'{0}' is not a myshopify.com store domain")]
    NotMyshopifyDomain(String),
}

/// A normalized Shopify store domain, e.g. `brand-name.myshopify.com`.
///
/// Users paste all sorts of things into the store field: full admin URLs,
/// mixed case, trailing slashes, or just the store handle. Parsing reduces
/// them to the canonical lowercase `{handle}.myshopify.com` host, which is
/// also the key the store's access token is persisted under.
///
/// ## Examples
///
/// ```
/// use urbannue_core::ShopDomain;
///
/// let shop = ShopDomain::parse("https://Brand-Name.myshopify.com/admin").unwrap();
/// assert_eq!(shop.as_str(), "brand-name.myshopify.com");
///
/// let shop = ShopDomain::parse("brand-name").unwrap();
/// assert_eq!(shop.as_str(), "brand-name.myshopify.com");
///
/// assert!(ShopDomain::parse("evil.example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a hostname.
    pub const MAX_LENGTH: usize = 255;

    /// Suffix every store domain carries.
    pub const SUFFIX: &'static str = ".myshopify.com";

    /// Parse and normalize a store domain from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty once the scheme and path are removed
    /// - Is longer than 255 characters
    /// - Contains characters other than `a-z`, `0-9`, `-` and `.`
    /// - Is not a single-label `*.myshopify.com` host
    pub fn parse(input: &str) -> Result<Self, ShopDomainError> {
        let lowered = input.trim().to_lowercase();
        let without_scheme = lowered
            .strip_prefix("https://")
            .or_else(|| lowered.strip_prefix("http://"))
            .unwrap_or(&lowered);
        let host = without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('.');

        if host.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if host.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = host
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.')))
        {
            return Err(ShopDomainError::InvalidCharacter(c));
        }

        if let Some(c) = host.chars().next().filter(|c| matches!(c, '-' | '.')) {
            return Err(ShopDomainError::InvalidCharacter(c));
        }

        let domain = if host.contains('.') {
            host.to_owned()
        } else {
            format!("{host}{}", Self::SUFFIX)
        };

        match domain.strip_suffix(Self::SUFFIX) {
            Some(handle) if !handle.is_empty() && !handle.contains('.') => Ok(Self(domain)),
            _ => Err(ShopDomainError::NotMyshopifyDomain(domain)),
        }
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the store handle (the part before `.myshopify.com`).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShopDomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShopDomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShopDomain {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
