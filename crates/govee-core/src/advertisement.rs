//! Advertisement data as reported by a radio transport

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single BLE advertisement observed by a scan session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    /// Stable peripheral identifier (BD address, or platform UUID where hidden)
    pub address: String,
    /// Advertised local name
    pub name: Option<String>,
    /// Received signal strength in dBm
    pub rssi: Option<i16>,
    /// Manufacturer specific data keyed by company id
    pub manufacturer_data: BTreeMap<u16, Vec<u8>>,
}

impl Advertisement {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            rssi: None,
            manufacturer_data: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rssi(mut self, rssi: i16) -> Self {
        self.rssi = Some(rssi);
        self
    }

    pub fn with_manufacturer_data(mut self, company_id: u16, data: Vec<u8>) -> Self {
        self.manufacturer_data.insert(company_id, data);
        self
    }

    /// Case-insensitive address comparison
    pub fn matches_address(&self, identifier: &str) -> bool {
        self.address.eq_ignore_ascii_case(identifier)
    }

    /// Manufacturer data rendered as `company_id -> hex` for logging
    pub fn manufacturer_data_hex(&self) -> BTreeMap<u16, String> {
        self.manufacturer_data
            .iter()
            .map(|(id, data)| (*id, hex::encode(data)))
            .collect()
    }
}
