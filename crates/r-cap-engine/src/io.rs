//! ---
//! cap_section: "02-rating-engine"
//! cap_subsection: "module"
//! cap_type: "source"
//! cap_scope: "code"
//! cap_description: "Steady-state ampacity rating engine per IEC 60287 and Neher-McGrath."
//! cap_version: "v0.1.0"
//! cap_owner: "tbd"
//! ---
use std::{fs, path::Path};

use crate::{
    errors::{RatingError, Result},
    model::RatingRequest,
};

/// Load a rating request from a JSON or YAML document; the format is
/// sniffed from the leading brace.
pub fn load_rating_request_from_file(path: impl AsRef<Path>) -> Result<RatingRequest> {
    let data = fs::read_to_string(path)?;
    load_rating_request_from_str(&data)
}

pub fn load_rating_request_from_str(data: &str) -> Result<RatingRequest> {
    let request = if data.trim_start().starts_with('{') {
        serde_json::from_str(data)?
    } else {
        serde_yaml::from_str(data).map_err(RatingError::YamlSerializationFailed)?
    };
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Installation;

    const JSON_REQUEST: &str = r#"{
        "cable": {
            "conductor": {
                "material": "copper",
                "cross_section_mm2": 240.0,
                "diameter_mm": 17.5,
                "stranding": "stranded_compact"
            },
            "insulation": {"material": "xlpe", "thickness_mm": 8.0},
            "jacket": {"material": "pe", "thickness_mm": 3.0}
        },
        "operating": {"voltage_v": 15000.0, "frequency_hz": 60.0},
        "installation": {
            "type": "direct_buried",
            "depth_m": 1.0,
            "soil_resistivity": 1.0,
            "ambient_temp_c": 25.0
        }
    }"#;

    #[test]
    fn json_request_round_trips() {
        let request = load_rating_request_from_str(JSON_REQUEST).unwrap();
        assert!(matches!(
            request.installation,
            Installation::DirectBuried { .. }
        ));
        assert_eq!(request.operating.load_factor, 1.0);
        request.validate().unwrap();
    }

    #[test]
    fn yaml_request_parses_too() {
        let yaml = r#"
cable:
  conductor:
    material: copper
    cross_section_mm2: 240.0
    diameter_mm: 17.5
    stranding: stranded_compact
  insulation:
    material: xlpe
    thickness_mm: 8.0
  jacket:
    material: pe
    thickness_mm: 3.0
operating:
  voltage_v: 15000.0
  frequency_hz: 60.0
installation:
  type: direct_buried
  depth_m: 1.0
  soil_resistivity: 1.0
  ambient_temp_c: 25.0
"#;
        let request = load_rating_request_from_str(yaml).unwrap();
        request.validate().unwrap();
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(matches!(
            load_rating_request_from_str("{ not json"),
            Err(RatingError::SerializationFailed(_))
        ));
    }
}
