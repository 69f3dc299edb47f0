use super::*;
use crate::common::constants::INVALID_XID;
use crate::types::{Column, DataType, Field, TableSchema};

fn users_schema() -> TableSchema {
    TableSchema::builder()
        .name("users")
        .column(
            Column::builder()
                .name("id")
                .data_type(DataType::Int)
                .primary_key()
                .build(),
        )
        .column(Column::builder().name("name").data_type(DataType::Text).build())
        .column(Column::builder().name("email").data_type(DataType::Text).build())
        .build()
}

fn wide_schema(columns: usize) -> TableSchema {
    let mut builder = TableSchema::builder();
    builder.name("wide");
    for i in 0..columns {
        builder.column(
            Column::builder()
                .name(format!("c{i}"))
                .data_type(DataType::Int)
                .build(),
        );
    }
    builder.build()
}

#[test]
fn test_round_trip_preserves_values_exactly() {
    let schema = users_schema();
    let row = Row::from(vec![
        ("id", Field::from(1)),
        ("name", Field::from("Alice")),
        ("email", Field::from("alice@example.com")),
    ]);

    let bytes = Tuple::serialize(&row, &schema, 3, INVALID_XID).unwrap();
    let tuple = Tuple::deserialize(&bytes).unwrap();

    assert_eq!(tuple.row, row);
    assert_eq!(tuple.header.xmin, 3);
    assert_eq!(tuple.header.xmax, INVALID_XID);
    // Integers come back as integers; the codec is not JSON-like.
    assert_eq!(tuple.row.get("id"), Some(&Field::Integer(1)));
}

#[test]
fn test_header_is_twelve_bytes_little_endian() {
    let schema = users_schema();
    let row = Row::from(vec![("id", Field::from(1))]);
    let bytes = Tuple::serialize(&row, &schema, 0x01020304, 0x0A0B0C0D).unwrap();

    assert_eq!(
        u16::from_le_bytes(bytes[0..2].try_into().unwrap()) as usize,
        bytes.len()
    );
    assert_eq!(&bytes[4..8], &[0x04, 0x03, 0x02, 0x01]);
    assert_eq!(&bytes[8..12], &[0x0D, 0x0C, 0x0B, 0x0A]);
}

#[test]
fn test_null_bitmap_tracks_schema_order() {
    let schema = users_schema();
    let row = Row::from(vec![
        ("id", Field::from(7)),
        ("name", Field::Null),
        // email omitted entirely; omission reads as NULL.
    ]);

    let bytes = Tuple::serialize(&row, &schema, 1, INVALID_XID).unwrap();
    let tuple = Tuple::deserialize(&bytes).unwrap();

    assert!(!tuple.is_null(0));
    assert!(tuple.is_null(1));
    assert!(tuple.is_null(2));
}

#[test]
fn test_null_bitmap_limit_at_sixteen_columns() {
    let schema = wide_schema(20);
    let mut row = Row::new();
    for i in 0..20 {
        // Every odd column is null.
        let value = if i % 2 == 1 { Field::Null } else { Field::from(i) };
        row.set(format!("c{i}"), value);
    }

    let bytes = Tuple::serialize(&row, &schema, 1, INVALID_XID).unwrap();
    let tuple = Tuple::deserialize(&bytes).unwrap();

    for i in 0..16 {
        assert_eq!(tuple.is_null(i), i % 2 == 1, "column {i}");
    }
    // Beyond the bitmap, is_null conservatively reports false even though
    // the payload carries NULL.
    assert!(!tuple.is_null(17));
    assert_eq!(tuple.row.get("c17"), Some(&Field::Null));
}

#[test]
fn test_visibility_rules() {
    let schema = users_schema();
    let row = Row::from(vec![("id", Field::from(1))]);

    let live = Tuple::deserialize(&Tuple::serialize(&row, &schema, 5, INVALID_XID).unwrap()).unwrap();
    assert!(live.is_visible(1));
    assert!(live.is_visible(100));

    // xmin == 0: uncommitted, never visible.
    let unborn = Tuple::deserialize(&Tuple::serialize(&row, &schema, INVALID_XID, INVALID_XID).unwrap()).unwrap();
    assert!(!unborn.is_visible(100));

    // Deleted by XID 8: still visible to readers older than 8.
    let deleted = Tuple::deserialize(&Tuple::serialize(&row, &schema, 5, 8).unwrap()).unwrap();
    assert!(deleted.is_visible(7));
    assert!(!deleted.is_visible(8));
    assert!(!deleted.is_visible(9));
}

#[test]
fn test_dead_horizon_boundary() {
    let header = TupleHeader {
        length: 12,
        null_bitmap: 0,
        xmin: 1,
        xmax: 9,
    };
    assert!(!header.is_dead(9));
    assert!(header.is_dead(10));

    let live = TupleHeader {
        xmax: INVALID_XID,
        ..header
    };
    assert!(!live.is_dead(100));
}

#[test]
fn test_deserialize_rejects_truncated_input() {
    assert!(Tuple::deserialize(&[1, 2, 3]).is_err());

    let schema = users_schema();
    let row = Row::from(vec![("id", Field::from(1))]);
    let bytes = Tuple::serialize(&row, &schema, 1, INVALID_XID).unwrap();
    assert!(Tuple::deserialize(&bytes[..bytes.len() - 2]).is_err());
}

#[test]
fn test_overwrite_xmax_in_place() {
    let schema = users_schema();
    let row = Row::from(vec![("id", Field::from(1))]);
    let mut bytes = Tuple::serialize(&row, &schema, 4, INVALID_XID).unwrap();
    let len_before = bytes.len();

    overwrite_xmax(&mut bytes, 9).unwrap();
    assert_eq!(bytes.len(), len_before);

    let tuple = Tuple::deserialize(&bytes).unwrap();
    assert_eq!(tuple.header.xmax, 9);
    assert_eq!(tuple.header.xmin, 4);
    assert_eq!(tuple.row, row);
}

#[test]
fn test_nested_values_survive_the_codec() {
    let schema = TableSchema::builder()
        .name("docs")
        .column(Column::builder().name("body").data_type(DataType::Map).build())
        .build();

    let mut nested = std::collections::BTreeMap::new();
    nested.insert("tags".to_string(), Field::List(vec![Field::from("a"), Field::from("b")]));
    let row = Row::from(vec![("body", Field::Map(nested))]);

    let bytes = Tuple::serialize(&row, &schema, 1, INVALID_XID).unwrap();
    assert_eq!(Tuple::deserialize(&bytes).unwrap().row, row);
}
