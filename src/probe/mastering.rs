//! Mastering display metadata formatting

use std::collections::BTreeMap;

use serde_json::Value;

use super::{value_to_string, RawFrame};

const MASTERING_DISPLAY: &str = "Mastering display metadata";

/// First mastering-display entry across all sampled frames, formatted as
/// `G(x,y)B(x,y)R(x,y)WP(x,y)L(max,min)`
pub(crate) fn find_mastering_string(frames: &[RawFrame]) -> Option<String> {
    frames
        .iter()
        .flat_map(|frame| frame.side_data_list.iter())
        .find(|sd| {
            sd.get("side_data_type").and_then(Value::as_str) == Some(MASTERING_DISPLAY)
        })
        .map(format_mastering)
}

fn format_mastering(sd: &BTreeMap<String, Value>) -> String {
    let get = |key: &str| numerator(sd.get(key));
    format!(
        "G({},{})B({},{})R({},{})WP({},{})L({},{})",
        get("green_x"),
        get("green_y"),
        get("blue_x"),
        get("blue_y"),
        get("red_x"),
        get("red_y"),
        get("white_point_x"),
        get("white_point_y"),
        get("max_luminance"),
        get("min_luminance"),
    )
}

/// `"13250/50000"` -> `"13250"`; plain numbers pass through; missing -> `"0"`
fn numerator(value: Option<&Value>) -> String {
    let text = match value {
        Some(v) => value_to_string(v),
        None => return "0".to_string(),
    };
    match text.split('/').next() {
        Some(num) if !num.trim().is_empty() => num.trim().to_string(),
        _ => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(side_data: Value) -> RawFrame {
        serde_json::from_value(json!({ "side_data_list": side_data })).unwrap()
    }

    #[test]
    fn test_formats_fractional_fields() {
        let frames = vec![frame(json!([{
            "side_data_type": "Mastering display metadata",
            "red_x": "34000/50000", "red_y": "16000/50000",
            "green_x": "13250/50000", "green_y": "34500/50000",
            "blue_x": "7500/50000", "blue_y": "3000/50000",
            "white_point_x": "15635/50000", "white_point_y": "16450/50000",
            "max_luminance": "10000000/10000", "min_luminance": "1/10000"
        }]))];

        assert_eq!(
            find_mastering_string(&frames).unwrap(),
            "G(13250,34500)B(7500,3000)R(34000,16000)WP(15635,16450)L(10000000,1)"
        );
    }

    #[test]
    fn test_first_match_across_frames_wins() {
        let frames = vec![
            frame(json!([{ "side_data_type": "Content light level metadata" }])),
            frame(json!([{ "side_data_type": "Mastering display metadata", "red_x": 1 }])),
            frame(json!([{ "side_data_type": "Mastering display metadata", "red_x": 2 }])),
        ];

        let mastering = find_mastering_string(&frames).unwrap();
        assert!(mastering.contains("R(1,0)"));
        assert!(mastering.starts_with("G(0,0)"));
    }

    #[test]
    fn test_no_side_data_means_sdr() {
        assert_eq!(find_mastering_string(&[frame(json!([]))]), None);
        assert_eq!(find_mastering_string(&[]), None);
    }
}
