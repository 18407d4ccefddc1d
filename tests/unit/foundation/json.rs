use super::*;

#[test]
fn syntax_errors_report_line_numbers() {
    let err = parse_json_str("{\n  \"a\": 1,\n  oops\n}", Path::new("bad.json")).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("bad.json:3:"), "{msg}");
}

#[test]
fn format_header_is_checked() {
    let doc: Value =
        serde_json::from_str(r#"{"Format": {"Type": "MaterialAsset", "Version": "1"}}"#).unwrap();
    check_format(&doc, "MaterialAsset", 1).unwrap();
    assert!(check_format(&doc, "MeshAsset", 1).is_err());
    assert!(check_format(&doc, "MaterialAsset", 2).is_err());
    assert!(check_format(&serde_json::json!({}), "MaterialAsset", 1).is_err());
}

#[test]
fn loose_scalars_accept_strings_and_numbers() {
    let obj = serde_json::json!({"A": "12", "B": 7, "C": "TRUE", "D": false, "E": "0.5"});
    assert_eq!(optional_u32(&obj, "A", "t").unwrap(), Some(12));
    assert_eq!(optional_u32(&obj, "B", "t").unwrap(), Some(7));
    assert_eq!(optional_bool(&obj, "C", "t").unwrap(), Some(true));
    assert_eq!(optional_bool(&obj, "D", "t").unwrap(), Some(false));
    assert_eq!(optional_f32(&obj, "E", "t").unwrap(), Some(0.5));
    assert_eq!(optional_u32(&obj, "Missing", "t").unwrap(), None);
    assert!(optional_bool(&obj, "A", "t").is_err());
}

#[test]
fn components_require_exact_count() {
    assert_eq!(float_components::<3>("1 2 3", "t").unwrap(), [1.0, 2.0, 3.0]);
    assert!(float_components::<3>("1 2", "t").is_err());
    assert!(float_components::<2>("1 2 3", "t").is_err());
    assert_eq!(int_components::<2>("-1 4", "t").unwrap(), [-1, 4]);
    let obj = serde_json::json!({"V": [1.0, 0.0, 0.5]});
    assert_eq!(
        optional_floats::<3>(&obj, "V", "t").unwrap(),
        Some([1.0, 0.0, 0.5])
    );
}
