//! Request/response building blocks.

use alloy_primitives::Address;
use custodia_store::MAX_PAGE_SIZE;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt::Display, ops::Deref};

/// Page size served when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// The uniform success envelope.
#[derive(Debug, Serialize)]
pub struct OkResponse<T: Serialize> {
    /// Always `true`.
    pub ok: bool,
    /// Human-readable summary.
    pub description: &'static str,
    /// Endpoint-specific payload.
    pub result: T,
}

impl<T: Serialize> OkResponse<T> {
    /// Wraps a payload.
    pub const fn new(description: &'static str, result: T) -> Self {
        Self { ok: true, description, result }
    }
}

/// An address that must arrive EIP-55 checksummed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChecksumAddress(pub Address);

impl Deref for ChecksumAddress {
    type Target = Address;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ChecksumAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_checksum(None))
    }
}

impl<'de> Deserialize<'de> for ChecksumAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse_checksummed(&s, None)
            .map(Self)
            .map_err(|_| de::Error::custom(format!("address is not EIP-55 checksummed: {s}")))
    }
}

impl Serialize for ChecksumAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_checksum(None))
    }
}

/// Cursor pagination query of the account timeline.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Page size; 0 falls back to the default, anything above the cap is
    /// clamped.
    #[serde(default)]
    pub per_page: u32,
    /// Ledger-id cursor; 0 asks for the first page.
    #[serde(default)]
    pub cursor: u64,
    /// `true` pages towards older entries, `false` opens an older-to-newer
    /// window above the cursor.
    #[serde(default)]
    pub next: bool,
}

impl Pagination {
    /// The effective page size after defaulting and clamping.
    pub fn limit(&self) -> u32 {
        if self.per_page == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.per_page.min(MAX_PAGE_SIZE)
        }
    }

    /// Whether this query asks for the first page. A zero cursor always
    /// serves the first page, whichever direction was requested.
    pub const fn is_first_page(&self) -> bool {
        self.cursor < 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_page_is_clamped_to_100() {
        let p = Pagination { per_page: 250, cursor: 0, next: true };
        assert_eq!(p.limit(), 100);
        let p = Pagination { per_page: 100, cursor: 0, next: true };
        assert_eq!(p.limit(), 100);
        let p = Pagination { per_page: 7, cursor: 0, next: true };
        assert_eq!(p.limit(), 7);
    }

    #[test]
    fn zero_per_page_serves_the_default_first_page() {
        let p = Pagination { per_page: 0, cursor: 0, next: false };
        assert_eq!(p.limit(), DEFAULT_PAGE_SIZE);
        assert!(p.is_first_page());
    }

    #[test]
    fn cursor_selects_the_window() {
        assert!(!Pagination { per_page: 10, cursor: 5, next: false }.is_first_page());
        assert!(!Pagination { per_page: 10, cursor: 5, next: true }.is_first_page());
        assert!(Pagination { per_page: 10, cursor: 0, next: true }.is_first_page());
    }

    #[test]
    fn checksummed_addresses_only() {
        let ok: Result<ChecksumAddress, _> =
            serde_json::from_str("\"0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045\"");
        assert!(ok.is_ok());
        let lowercase: Result<ChecksumAddress, _> =
            serde_json::from_str("\"0xd8da6bf26964af9d7eed9e03e53415d37aa96045\"");
        assert!(lowercase.is_err());
    }
}
