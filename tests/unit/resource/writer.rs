use super::*;

struct Pair {
    a: u32,
    b: f32,
}

impl BinaryWrite for Pair {
    fn write_to(&self, out: &mut MemoryFile) {
        out.write_u32(self.a);
        out.write_f32(self.b);
    }
}

#[test]
fn typed_writes_are_little_endian() {
    let mut f = MemoryFile::new();
    f.write(&Pair { a: 0x0102_0304, b: 1.0 });
    f.write_u16(0xBEEF);
    f.write_bool(true);
    assert_eq!(
        f.as_bytes(),
        &[0x04, 0x03, 0x02, 0x01, 0x00, 0x00, 0x80, 0x3F, 0xEF, 0xBE, 0x01]
    );
}

#[test]
fn bounded_strings_are_zero_padded_and_checked() {
    let mut f = MemoryFile::new();
    f.write_bounded_str("abc", 8).unwrap();
    assert_eq!(f.as_bytes(), b"abc\0\0\0\0\0");
    assert!(f.write_bounded_str("12345678", 8).is_err());
    assert_eq!(f.len(), 8);
}

#[test]
fn header_prefixes_encoded_image() {
    let mut f = MemoryFile::new();
    f.write_bytes(&[7u8; 64]);
    let bytes = f.encode(StringId::new("Test"), 3).unwrap();
    let header = FileFormatHeader::from_bytes(&bytes).unwrap();
    assert_eq!(header.format_type, StringId::new("Test").as_u32());
    assert_eq!(header.format_version, 3);
    assert_eq!(header.decompressed_size, 64);
    assert_eq!(
        header.compressed_size as usize,
        bytes.len() - FILE_FORMAT_HEADER_SIZE
    );
    assert!(header.compressed_size < 64);
}

#[test]
fn empty_payload_has_no_body() {
    let bytes = MemoryFile::new().encode(StringId::new("Empty"), 1).unwrap();
    assert_eq!(bytes.len(), FILE_FORMAT_HEADER_SIZE);
}
