use std::io::Cursor;
use std::sync::Arc;

use crate::codec::{
    adapter::DynamicAdapter,
    dictionary::{DataTypeManager, EncodingContext, TypeDictionary},
    structure::StructureCodec,
    value::{FieldValue, Struct},
};
use crate::schema::{
    EnumeratedType, FieldType, QualifiedTypeName, StructuredType, SwitchOperand,
    OPC_BINARY_SCHEMA_NAMESPACE, OPC_UA_NAMESPACE,
};
use crate::types::{
    encoding::{DecodingOptions, DepthGauge},
    status_code::StatusCode,
    string::UAString,
};

use parking_lot::Mutex;

const TEST_NAMESPACE: &str = "urn:test:types";

fn ua(name: &str) -> QualifiedTypeName {
    QualifiedTypeName::new(OPC_UA_NAMESPACE, name)
}

fn bit() -> QualifiedTypeName {
    QualifiedTypeName::new(OPC_BINARY_SCHEMA_NAMESPACE, "Bit")
}

fn local(name: &str) -> QualifiedTypeName {
    QualifiedTypeName::new(TEST_NAMESPACE, name)
}

fn manager(
    schemas: Vec<StructuredType>,
    enums: Vec<EnumeratedType>,
) -> DataTypeManager<DynamicAdapter> {
    let mut dictionary = TypeDictionary::new(TEST_NAMESPACE);
    for schema in schemas {
        dictionary.register_structured(Arc::new(StructureCodec::new(schema, DynamicAdapter)));
    }
    for enumerated in enums {
        dictionary.register_enumerated(enumerated);
    }
    let mut manager = DataTypeManager::new();
    manager.add_dictionary(dictionary);
    manager
}

fn encode(
    manager: &DataTypeManager<DynamicAdapter>,
    name: &str,
    value: &Struct,
) -> (usize, Vec<u8>) {
    let options = DecodingOptions::test();
    let ctx = EncodingContext::new(manager, &options);
    let codec = manager
        .dictionary(TEST_NAMESPACE)
        .unwrap()
        .codec(name)
        .unwrap()
        .clone();
    let mut stream = Cursor::new(Vec::new());
    let written = codec.encode(&ctx, &mut stream, value).unwrap();
    let bytes = stream.into_inner();
    assert_eq!(written, bytes.len());
    (written, bytes)
}

fn decode(manager: &DataTypeManager<DynamicAdapter>, name: &str, bytes: Vec<u8>) -> Struct {
    let options = DecodingOptions::test();
    let ctx = EncodingContext::new(manager, &options);
    let codec = manager
        .dictionary(TEST_NAMESPACE)
        .unwrap()
        .codec(name)
        .unwrap()
        .clone();
    let len = bytes.len();
    let mut stream = Cursor::new(bytes);
    let decoded = codec.decode(&ctx, &mut stream).unwrap();
    // Every byte written must be consumed
    assert_eq!(stream.position() as usize, len);
    decoded
}

fn round_trip(manager: &DataTypeManager<DynamicAdapter>, name: &str, value: &Struct) -> Struct {
    let (_, bytes) = encode(manager, name, value);
    decode(manager, name, bytes)
}

#[test]
fn scalar_round_trip() {
    let schema = StructuredType::new(
        "Reading",
        vec![
            FieldType::scalar("Id", ua("Int32")),
            FieldType::scalar("Name", ua("String")),
            FieldType::scalar("Value", ua("Double")),
            FieldType::scalar("Good", ua("Boolean")),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    let mut value = Struct::new("Reading");
    value
        .insert("Id", FieldValue::Int32(-42))
        .insert("Name", FieldValue::String(UAString::from("flow rate")))
        .insert("Value", FieldValue::Double(99.25))
        .insert("Good", FieldValue::Boolean(true));

    let decoded = round_trip(&manager, "Reading", &value);
    assert_eq!(decoded, value);
}

#[test]
fn switch_gates_field_presence() {
    let schema = StructuredType::new(
        "Gated",
        vec![
            FieldType::scalar("Selector", ua("Int32")),
            FieldType::scalar("Detail", ua("String")).with_switch("Selector", Some(2), None),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    // Selector is 2, the detail is on the wire
    let mut present = Struct::new("Gated");
    present
        .insert("Selector", FieldValue::Int32(2))
        .insert("Detail", FieldValue::String(UAString::from("here")));
    let (written, bytes) = encode(&manager, "Gated", &present);
    assert_eq!(written, 4 + 4 + 4);
    let decoded = decode(&manager, "Gated", bytes);
    assert_eq!(decoded, present);

    // Selector is 3, the detail contributes zero bytes even though the member exists
    let mut absent = Struct::new("Gated");
    absent
        .insert("Selector", FieldValue::Int32(3))
        .insert("Detail", FieldValue::String(UAString::from("ignored")));
    let (written, bytes) = encode(&manager, "Gated", &absent);
    assert_eq!(written, 4);
    let decoded = decode(&manager, "Gated", bytes);
    assert_eq!(decoded.member("Detail"), None);
    assert_eq!(decoded.member("Selector"), Some(&FieldValue::Int32(3)));
}

#[test]
fn switch_defaults_to_equals_one() {
    let schema = StructuredType::new(
        "Defaulted",
        vec![
            FieldType::scalar("HasExtra", ua("Byte")),
            FieldType::scalar("Extra", ua("Int16")).with_switch("HasExtra", None, None),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    let mut with_extra = Struct::new("Defaulted");
    with_extra
        .insert("HasExtra", FieldValue::Byte(1))
        .insert("Extra", FieldValue::Int16(-5));
    assert_eq!(round_trip(&manager, "Defaulted", &with_extra), with_extra);

    let mut without = Struct::new("Defaulted");
    without.insert("HasExtra", FieldValue::Byte(0));
    let (written, _) = encode(&manager, "Defaulted", &without);
    assert_eq!(written, 1);
}

#[test]
fn switch_ordering_operand() {
    let schema = StructuredType::new(
        "Ordered",
        vec![
            FieldType::scalar("Version", ua("UInt16")),
            FieldType::scalar("Added", ua("Int32")).with_switch(
                "Version",
                Some(3),
                Some(SwitchOperand::GreaterThanOrEqual),
            ),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    let mut new_version = Struct::new("Ordered");
    new_version
        .insert("Version", FieldValue::UInt16(4))
        .insert("Added", FieldValue::Int32(7));
    let (written, _) = encode(&manager, "Ordered", &new_version);
    assert_eq!(written, 2 + 4);

    let mut old_version = Struct::new("Ordered");
    old_version
        .insert("Version", FieldValue::UInt16(2))
        .insert("Added", FieldValue::Int32(7));
    let (written, bytes) = encode(&manager, "Ordered", &old_version);
    assert_eq!(written, 2);
    let decoded = decode(&manager, "Ordered", bytes);
    assert_eq!(decoded.member("Added"), None);
}

#[test]
fn array_length_from_sibling_field() {
    let schema = StructuredType::new(
        "Samples",
        vec![
            FieldType::scalar("NoOfValues", ua("Int32")),
            FieldType::array_with_length_field("Values", ua("Int32"), "NoOfValues"),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    // The caller never sets the length, the codec synthesizes it
    let mut value = Struct::new("Samples");
    value.insert(
        "Values",
        FieldValue::Array(Some(vec![
            FieldValue::Int32(10),
            FieldValue::Int32(20),
            FieldValue::Int32(30),
        ])),
    );
    let (written, bytes) = encode(&manager, "Samples", &value);
    assert_eq!(written, 4 + 3 * 4);
    // Length carrier precedes the elements on the wire
    assert_eq!(&bytes[0..4], &[3, 0, 0, 0]);

    let decoded = decode(&manager, "Samples", bytes);
    // The carrier must not appear in the decoded value
    assert_eq!(decoded.member("NoOfValues"), None);
    assert_eq!(decoded, value);
}

#[test]
fn array_length_field_narrower_than_int32() {
    let schema = StructuredType::new(
        "Packed",
        vec![
            FieldType::scalar("Count", ua("UInt16")),
            FieldType::array_with_length_field("Data", ua("Byte"), "Count"),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    let mut value = Struct::new("Packed");
    value.insert(
        "Data",
        FieldValue::Array(Some(vec![FieldValue::Byte(0xAA), FieldValue::Byte(0xBB)])),
    );
    let (written, bytes) = encode(&manager, "Packed", &value);
    assert_eq!(written, 2 + 2);
    assert_eq!(bytes, vec![0x02, 0x00, 0xAA, 0xBB]);

    assert_eq!(decode(&manager, "Packed", bytes), value);
}

#[test]
fn literal_length_array() {
    let schema = StructuredType::new(
        "Fixed",
        vec![FieldType::array("Pair", ua("Int16"), 2)],
    );
    let manager = manager(vec![schema], vec![]);

    let mut value = Struct::new("Fixed");
    value.insert(
        "Pair",
        FieldValue::Array(Some(vec![FieldValue::Int16(1), FieldValue::Int16(2)])),
    );
    let (written, bytes) = encode(&manager, "Fixed", &value);
    // No length on the wire, the count is a schema constant
    assert_eq!(written, 4);
    assert_eq!(decode(&manager, "Fixed", bytes), value);
}

#[test]
fn null_array_round_trip() {
    let schema = StructuredType::new(
        "MaybeValues",
        vec![
            FieldType::scalar("NoOfValues", ua("Int32")),
            FieldType::array_with_length_field("Values", ua("Int32"), "NoOfValues"),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    let mut value = Struct::new("MaybeValues");
    value.insert("Values", FieldValue::Array(None));
    let (written, bytes) = encode(&manager, "MaybeValues", &value);
    // The -1 length carrier is the entire encoding
    assert_eq!(written, 4);
    assert_eq!(bytes, vec![0xff, 0xff, 0xff, 0xff]);

    let decoded = decode(&manager, "MaybeValues", bytes);
    assert_eq!(decoded.member("Values"), Some(&FieldValue::Array(None)));
    assert_eq!(decoded, value);
}

#[test]
fn empty_array_distinct_from_null() {
    let schema = StructuredType::new(
        "MaybeValues",
        vec![
            FieldType::scalar("NoOfValues", ua("Int32")),
            FieldType::array_with_length_field("Values", ua("Int32"), "NoOfValues"),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    let mut value = Struct::new("MaybeValues");
    value.insert("Values", FieldValue::Array(Some(Vec::new())));
    let (_, bytes) = encode(&manager, "MaybeValues", &value);
    assert_eq!(bytes, vec![0, 0, 0, 0]);
    assert_eq!(decode(&manager, "MaybeValues", bytes), value);
}

#[test]
fn bit_array_packs_lsb_first() {
    let schema = StructuredType::new(
        "Flags",
        vec![FieldType::array("Bits", bit(), 5)],
    );
    let manager = manager(vec![schema], vec![]);

    // 22 = 0b10110, five bits LSB first: 0, 1, 1, 0, 1 in one padded byte
    let mut value = Struct::new("Flags");
    value.insert("Bits", FieldValue::Int32(22));
    let (written, bytes) = encode(&manager, "Flags", &value);
    assert_eq!(written, 1);
    assert_eq!(bytes, vec![0x16]);

    let decoded = decode(&manager, "Flags", bytes);
    assert_eq!(decoded.member("Bits"), Some(&FieldValue::Int32(22)));
}

#[test]
fn bit_groups_realign_before_byte_fields() {
    let schema = StructuredType::new(
        "Mixed",
        vec![
            FieldType::array("Low", bit(), 3),
            FieldType::scalar("Value", ua("Byte")),
            FieldType::array("High", bit(), 2),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    let mut value = Struct::new("Mixed");
    value
        .insert("Low", FieldValue::Int32(0b101))
        .insert("Value", FieldValue::Byte(0x7F))
        .insert("High", FieldValue::Int32(0b10));
    let (written, bytes) = encode(&manager, "Mixed", &value);
    // Padded bit byte, value byte, padded bit byte
    assert_eq!(written, 3);
    assert_eq!(bytes, vec![0b0000_0101, 0x7F, 0b0000_0010]);
    assert_eq!(decode(&manager, "Mixed", bytes), value);
}

#[test]
fn adjacent_bit_fields_share_a_byte() {
    let schema = StructuredType::new(
        "TwoGroups",
        vec![
            FieldType::array("A", bit(), 3),
            FieldType::array("B", bit(), 4),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    let mut value = Struct::new("TwoGroups");
    value
        .insert("A", FieldValue::Int32(0b111))
        .insert("B", FieldValue::Int32(0b1001));
    let (written, bytes) = encode(&manager, "TwoGroups", &value);
    // Seven bits fit in one byte: A in bits 0..3, B in bits 3..7
    assert_eq!(written, 1);
    assert_eq!(bytes, vec![0b0100_1111]);
    assert_eq!(decode(&manager, "TwoGroups", bytes), value);
}

#[test]
fn bit_array_wider_than_accumulator() {
    let schema = StructuredType::new(
        "Wide",
        vec![FieldType::array("Bits", bit(), 70)],
    );
    let manager = manager(vec![schema], vec![]);

    let mut value = Struct::new("Wide");
    value.insert("Bits", FieldValue::Int32(22));
    let (written, bytes) = encode(&manager, "Wide", &value);
    // 70 bits pad out to nine bytes, the value in the low bits
    assert_eq!(written, 9);
    assert_eq!(bytes[0], 0x16);
    assert!(bytes[1..].iter().all(|b| *b == 0));

    let decoded = decode(&manager, "Wide", bytes);
    assert_eq!(decoded.member("Bits"), Some(&FieldValue::Int32(22)));
}

#[test]
fn bit_count_from_wire_wider_than_accumulator() {
    let schema = StructuredType::new(
        "Wide",
        vec![
            FieldType::scalar("Count", ua("Int32")),
            FieldType::array_with_length_field("Bits", bit(), "Count"),
        ],
    );
    let manager = manager(vec![schema], vec![]);

    // The stream claims 70 bits, nine bytes follow
    let mut bytes = vec![70, 0, 0, 0, 0x16];
    bytes.extend_from_slice(&[0; 8]);
    let decoded = decode(&manager, "Wide", bytes);
    assert_eq!(decoded.member("Bits"), Some(&FieldValue::Int32(22)));
    assert_eq!(decoded.member("Count"), None);
}

#[test]
fn bit_count_from_wire_is_limited() {
    let schema = StructuredType::new(
        "Greedy",
        vec![
            FieldType::scalar("Count", ua("Int32")),
            FieldType::array_with_length_field("Bits", bit(), "Count"),
        ],
    );
    let manager = manager(vec![schema], vec![]);
    let options = DecodingOptions::test();
    let ctx = EncodingContext::new(&manager, &options);
    let codec = manager
        .dictionary(TEST_NAMESPACE)
        .unwrap()
        .codec("Greedy")
        .unwrap()
        .clone();

    // A claimed bit count of 2^20 exceeds the array limit, fail before reading bits
    let mut stream = Cursor::new(vec![0x00, 0x00, 0x10, 0x00]);
    assert_eq!(
        codec.decode(&ctx, &mut stream).unwrap_err(),
        StatusCode::BadEncodingLimitsExceeded
    );
}

#[test]
fn length_in_bytes_is_rejected_both_ways() {
    let mut field = FieldType::array("Data", ua("Byte"), 4);
    field.is_length_in_bytes = true;
    let schema = StructuredType::new("Bad", vec![field]);
    let manager = manager(vec![schema], vec![]);

    let options = DecodingOptions::test();
    let ctx = EncodingContext::new(&manager, &options);
    let codec = manager
        .dictionary(TEST_NAMESPACE)
        .unwrap()
        .codec("Bad")
        .unwrap()
        .clone();

    let mut value = Struct::new("Bad");
    value.insert(
        "Data",
        FieldValue::Array(Some(vec![FieldValue::Byte(0); 4])),
    );
    let mut stream = Cursor::new(Vec::new());
    assert_eq!(
        codec.encode(&ctx, &mut stream, &value).unwrap_err(),
        StatusCode::BadEncodingError
    );

    let mut stream = Cursor::new(vec![0u8; 4]);
    assert_eq!(
        codec.decode(&ctx, &mut stream).unwrap_err(),
        StatusCode::BadDecodingError
    );
}

#[test]
fn nested_structures_three_deep() {
    let inner = StructuredType::new("Inner", vec![FieldType::scalar("X", ua("Int32"))]);
    let middle = StructuredType::new(
        "Middle",
        vec![
            FieldType::scalar("Inner", local("Inner")),
            FieldType::scalar("Label", ua("String")),
        ],
    );
    let outer = StructuredType::new(
        "Outer",
        vec![
            FieldType::scalar("Middle", local("Middle")),
            FieldType::scalar("Count", ua("Byte")),
        ],
    );
    let manager = manager(vec![inner, middle, outer], vec![]);

    let mut inner_value = Struct::new("Inner");
    inner_value.insert("X", FieldValue::Int32(123));
    let mut middle_value = Struct::new("Middle");
    middle_value
        .insert("Inner", FieldValue::Structure(inner_value))
        .insert("Label", FieldValue::String(UAString::from("nested")));
    let mut outer_value = Struct::new("Outer");
    outer_value
        .insert("Middle", FieldValue::Structure(middle_value))
        .insert("Count", FieldValue::Byte(9));

    let decoded = round_trip(&manager, "Outer", &outer_value);
    assert_eq!(decoded, outer_value);
}

#[test]
fn nested_structure_array() {
    let point = StructuredType::new(
        "Point",
        vec![
            FieldType::scalar("X", ua("Int16")),
            FieldType::scalar("Y", ua("Int16")),
        ],
    );
    let path = StructuredType::new(
        "Path",
        vec![
            FieldType::scalar("NoOfPoints", ua("Int32")),
            FieldType::array_with_length_field("Points", local("Point"), "NoOfPoints"),
        ],
    );
    let manager = manager(vec![point, path], vec![]);

    let point = |x, y| {
        let mut p = Struct::new("Point");
        p.insert("X", FieldValue::Int16(x))
            .insert("Y", FieldValue::Int16(y));
        FieldValue::Structure(p)
    };
    let mut value = Struct::new("Path");
    value.insert(
        "Points",
        FieldValue::Array(Some(vec![point(0, 0), point(3, 4), point(-1, 7)])),
    );

    let (written, bytes) = encode(&manager, "Path", &value);
    assert_eq!(written, 4 + 3 * 4);
    assert_eq!(decode(&manager, "Path", bytes), value);
}

#[test]
fn enumerated_field_round_trip() {
    let schema = StructuredType::new(
        "Painted",
        vec![FieldType::scalar("Color", local("Color"))],
    );
    let manager = manager(vec![schema], vec![EnumeratedType::new("Color", 32)]);

    let mut value = Struct::new("Painted");
    value.insert("Color", FieldValue::Enumeration(2));
    let (written, bytes) = encode(&manager, "Painted", &value);
    assert_eq!(written, 4);
    assert_eq!(bytes, vec![2, 0, 0, 0]);
    assert_eq!(decode(&manager, "Painted", bytes), value);
}

#[test]
fn unresolvable_namespace_fails() {
    let schema = StructuredType::new(
        "Dangling",
        vec![FieldType::scalar(
            "Mystery",
            QualifiedTypeName::new("urn:unregistered", "Mystery"),
        )],
    );
    let manager = manager(vec![schema], vec![]);
    let options = DecodingOptions::test();
    let ctx = EncodingContext::new(&manager, &options);
    let codec = manager
        .dictionary(TEST_NAMESPACE)
        .unwrap()
        .codec("Dangling")
        .unwrap()
        .clone();

    let mut stream = Cursor::new(vec![0u8; 8]);
    assert_eq!(
        codec.decode(&ctx, &mut stream).unwrap_err(),
        StatusCode::BadDecodingError
    );

    let mut value = Struct::new("Dangling");
    value.insert("Mystery", FieldValue::Structure(Struct::new("Mystery")));
    let mut stream = Cursor::new(Vec::new());
    assert_eq!(
        codec.encode(&ctx, &mut stream, &value).unwrap_err(),
        StatusCode::BadEncodingError
    );
}

#[test]
fn unregistered_type_fails() {
    let schema = StructuredType::new(
        "Dangling",
        vec![FieldType::scalar("Missing", local("Missing"))],
    );
    let manager = manager(vec![schema], vec![]);
    let options = DecodingOptions::test();
    let ctx = EncodingContext::new(&manager, &options);
    let codec = manager
        .dictionary(TEST_NAMESPACE)
        .unwrap()
        .codec("Dangling")
        .unwrap()
        .clone();

    let mut stream = Cursor::new(vec![0u8; 8]);
    assert_eq!(
        codec.decode(&ctx, &mut stream).unwrap_err(),
        StatusCode::BadDecodingError
    );
}

#[test]
fn array_length_limit_enforced() {
    let schema = StructuredType::new(
        "Greedy",
        vec![
            FieldType::scalar("NoOfValues", ua("Int32")),
            FieldType::array_with_length_field("Values", ua("Byte"), "NoOfValues"),
        ],
    );
    let manager = manager(vec![schema], vec![]);
    let options = DecodingOptions {
        max_array_length: 4,
        ..DecodingOptions::test()
    };
    let ctx = EncodingContext::new(&manager, &options);
    let codec = manager
        .dictionary(TEST_NAMESPACE)
        .unwrap()
        .codec("Greedy")
        .unwrap()
        .clone();

    // A claimed length of 5 exceeds the limit of 4
    let mut stream = Cursor::new(vec![5, 0, 0, 0, 1, 2, 3, 4, 5]);
    assert_eq!(
        codec.decode(&ctx, &mut stream).unwrap_err(),
        StatusCode::BadEncodingLimitsExceeded
    );
}

#[test]
fn recursion_depth_is_bounded() {
    let inner = StructuredType::new("Inner", vec![FieldType::scalar("X", ua("Int32"))]);
    let middle = StructuredType::new(
        "Middle",
        vec![FieldType::scalar("Inner", local("Inner"))],
    );
    let outer = StructuredType::new(
        "Outer",
        vec![FieldType::scalar("Middle", local("Middle"))],
    );
    let manager = manager(vec![inner, middle, outer], vec![]);

    let codec = manager
        .dictionary(TEST_NAMESPACE)
        .unwrap()
        .codec("Outer")
        .unwrap()
        .clone();

    // Two nested hand-offs fit in a gauge of two
    let options = DecodingOptions {
        decoding_depth_gauge: Arc::new(Mutex::new(DepthGauge::new(2))),
        ..DecodingOptions::test()
    };
    let ctx = EncodingContext::new(&manager, &options);
    let mut stream = Cursor::new(vec![123, 0, 0, 0]);
    assert!(codec.decode(&ctx, &mut stream).is_ok());

    // They do not fit in a gauge of one
    let options = DecodingOptions {
        decoding_depth_gauge: Arc::new(Mutex::new(DepthGauge::new(1))),
        ..DecodingOptions::test()
    };
    let ctx = EncodingContext::new(&manager, &options);
    let mut stream = Cursor::new(vec![123, 0, 0, 0]);
    assert_eq!(
        codec.decode(&ctx, &mut stream).unwrap_err(),
        StatusCode::BadDecodingError
    );
}

#[test]
fn missing_member_is_an_encoding_error() {
    let schema = StructuredType::new(
        "Strict",
        vec![FieldType::scalar("Required", ua("Int32"))],
    );
    let manager = manager(vec![schema], vec![]);
    let options = DecodingOptions::test();
    let ctx = EncodingContext::new(&manager, &options);
    let codec = manager
        .dictionary(TEST_NAMESPACE)
        .unwrap()
        .codec("Strict")
        .unwrap()
        .clone();

    let value = Struct::new("Strict");
    let mut stream = Cursor::new(Vec::new());
    assert_eq!(
        codec.encode(&ctx, &mut stream, &value).unwrap_err(),
        StatusCode::BadEncodingError
    );
}
