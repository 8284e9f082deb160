//! Model classification from advertised names
//!
//! Govee peripherals encode their model in the advertised local name, either as
//! `<vendor>_<model>_<suffix>` (e.g. `ihoment_H6170_2A3F`) or, for the sensor
//! line, as `GVH<digits>_<suffix>` where the model is everything after `GV`.

/// Name prefixes used by Govee and its white-label brands
pub const VENDOR_PREFIXES: [&str; 4] = ["ihoment_", "Govee_", "Minger_", "GBK_"];

/// Prefix of the sensor-style names (`GVH5075_1A2B`)
pub const SENSOR_PREFIX: &str = "GVH";

/// Extract the model identifier from an advertised name.
///
/// Returns `None` for anything that is not a well-formed Govee name.
pub fn model_from_name(name: Option<&str>) -> Option<&str> {
    let name = name.filter(|n| !n.is_empty())?;

    if VENDOR_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
        let parts: Vec<&str> = name.split('_').collect();
        return if parts.len() == 3 { Some(parts[1]) } else { None };
    }

    if name.starts_with(SENSOR_PREFIX) {
        let mut parts = name.split('_');
        let first = parts.next()?;
        return if parts.next().is_some() {
            first.get(2..)
        } else {
            None
        };
    }

    None
}

/// Whether the name carries a Govee vendor prefix at all
pub fn is_vendor_name(name: Option<&str>) -> bool {
    match name {
        Some(name) => {
            VENDOR_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
                || name.starts_with(SENSOR_PREFIX)
        }
        None => false,
    }
}
