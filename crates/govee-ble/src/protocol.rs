//! Conversion between btleplug peripheral data and core advertisements

use btleplug::api::{BDAddr, PeripheralProperties};
use govee_core::Advertisement;

/// Address used to identify a peripheral.
///
/// Platforms that hide the hardware address (macOS reports `00:00:00:00:00:00`)
/// fall back to the platform peripheral id.
pub fn peripheral_address<I: std::fmt::Debug>(id: &I, properties: &PeripheralProperties) -> String {
    if properties.address != BDAddr::default() {
        properties.address.to_string()
    } else {
        format!("{:?}", id)
    }
}

/// Build a core advertisement from the properties btleplug caches for a peripheral
pub fn advertisement_from_properties<I: std::fmt::Debug>(
    id: &I,
    properties: &PeripheralProperties,
) -> Advertisement {
    let mut advertisement = Advertisement::new(peripheral_address(id, properties));
    advertisement.name = properties.local_name.clone();
    advertisement.rssi = properties.rssi;
    advertisement.manufacturer_data = properties
        .manufacturer_data
        .iter()
        .map(|(company, data)| (*company, data.clone()))
        .collect();
    advertisement
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties(address: [u8; 6]) -> PeripheralProperties {
        let mut properties = PeripheralProperties::default();
        properties.address = BDAddr::from(address);
        properties.local_name = Some("ihoment_H6170_BB01".to_string());
        properties.rssi = Some(-61);
        properties
            .manufacturer_data
            .insert(0x8803, vec![0xec, 0x00, 0x01]);
        properties
    }

    #[test]
    fn test_hardware_address_preferred() {
        let props = properties([0xa4, 0xc1, 0x38, 0xaa, 0xbb, 0x01]);
        let advertisement = advertisement_from_properties(&"ignored", &props);

        assert_eq!(advertisement.address, "A4:C1:38:AA:BB:01");
        assert_eq!(advertisement.name.as_deref(), Some("ihoment_H6170_BB01"));
        assert_eq!(advertisement.rssi, Some(-61));
        assert_eq!(
            advertisement.manufacturer_data.get(&0x8803),
            Some(&vec![0xec, 0x00, 0x01])
        );
    }

    #[test]
    fn test_hidden_address_falls_back_to_id() {
        #[derive(Debug)]
        struct PlatformId(u32);

        let props = properties([0; 6]);
        assert_eq!(peripheral_address(&PlatformId(7), &props), "PlatformId(7)");
    }
}
