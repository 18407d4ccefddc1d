use super::*;

#[test]
fn block_formats_need_multiples_of_four() {
    let err = check_dimensions("dds", 30, 32, false).unwrap_err();
    assert!(matches!(err, ForgeError::PolicyViolation(_)));
    assert!(check_dimensions("DDS", 32, 30, false).is_err());
    assert!(check_dimensions("ktx", 32, 32, false).is_ok());
}

#[test]
fn override_flag_and_uncompressed_formats_pass() {
    assert!(check_dimensions("crn", 30, 30, true).is_ok());
    assert!(check_dimensions("png", 30, 30, false).is_ok());
}
