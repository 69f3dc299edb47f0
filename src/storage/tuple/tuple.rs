use crate::common::constants::INVALID_XID;
use crate::common::{Error, Result};
use crate::storage::tuple::Row;
use crate::storage::txn::TxnId;
use crate::types::TableSchema;

/// Size of the fixed multi-version header preceding every tuple payload.
pub const TUPLE_HEADER_SIZE: usize = 12;

/// Number of columns tracked by the null bitmap. Nulls in later columns are
/// represented by omission in the payload instead.
const NULL_BITMAP_COLUMNS: usize = 16;

/// The 12-byte multi-version tuple header:
///
/// ```text
/// offset  size  field
/// 0       2     length (total tuple length, header included)
/// 2       2     null_bitmap (bit i set = column i is NULL)
/// 4       4     xmin (XID that created this version; 0 = never visible)
/// 8       4     xmax (XID that deleted this version; 0 = live)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TupleHeader {
    pub length: u16,
    pub null_bitmap: u16,
    pub xmin: TxnId,
    pub xmax: TxnId,
}

impl TupleHeader {
    pub fn encode(&self) -> [u8; TUPLE_HEADER_SIZE] {
        let mut buffer = [0u8; TUPLE_HEADER_SIZE];
        buffer[0..2].copy_from_slice(&self.length.to_le_bytes());
        buffer[2..4].copy_from_slice(&self.null_bitmap.to_le_bytes());
        buffer[4..8].copy_from_slice(&self.xmin.to_le_bytes());
        buffer[8..12].copy_from_slice(&self.xmax.to_le_bytes());
        buffer
    }

    /// Parses the header alone. Vacuum uses this to classify tuples without
    /// paying for payload deserialization.
    pub fn decode(bytes: &[u8]) -> Result<TupleHeader> {
        if bytes.len() < TUPLE_HEADER_SIZE {
            return Err(Error::Codec(format!(
                "Truncated tuple header: {} bytes",
                bytes.len()
            )));
        }
        Ok(TupleHeader {
            length: u16::from_le_bytes(bytes[0..2].try_into().unwrap()),
            null_bitmap: u16::from_le_bytes(bytes[2..4].try_into().unwrap()),
            xmin: u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            xmax: u32::from_le_bytes(bytes[8..12].try_into().unwrap()),
        })
    }

    /// Whether this version is dead at the given vacuum horizon. A version
    /// deleted exactly at the horizon is NOT dead.
    pub fn is_dead(&self, oldest_active_xid: TxnId) -> bool {
        self.xmax != INVALID_XID && self.xmax < oldest_active_xid
    }
}

/// A materialized tuple: MVCC header plus the decoded row payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuple {
    pub header: TupleHeader,
    pub row: Row,
}

impl Tuple {
    /// Serializes a row into tuple bytes: the 12-byte header with the null
    /// bitmap computed from the schema's column order, followed by the
    /// self-describing payload.
    pub fn serialize(
        row: &Row,
        schema: &TableSchema,
        xmin: TxnId,
        xmax: TxnId,
    ) -> Result<Vec<u8>> {
        let payload = bincode::serialize(row)?;
        let total = TUPLE_HEADER_SIZE + payload.len();
        if total > u16::MAX as usize {
            return Err(Error::Codec(format!(
                "Tuple of {total} bytes exceeds the maximum tuple length"
            )));
        }

        let mut null_bitmap: u16 = 0;
        for (i, column) in schema
            .columns()
            .iter()
            .take(NULL_BITMAP_COLUMNS)
            .enumerate()
        {
            let is_null = match row.get(column.get_name()) {
                Some(value) => value.is_null(),
                None => true,
            };
            if is_null {
                null_bitmap |= 1 << i;
            }
        }

        let header = TupleHeader {
            length: total as u16,
            null_bitmap,
            xmin,
            xmax,
        };

        let mut bytes = Vec::with_capacity(total);
        bytes.extend_from_slice(&header.encode());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Parses header and payload. Fails on truncated input or a malformed
    /// payload.
    pub fn deserialize(bytes: &[u8]) -> Result<Tuple> {
        let header = TupleHeader::decode(bytes)?;
        if (header.length as usize) != bytes.len() {
            return Err(Error::Codec(format!(
                "Tuple length mismatch: header says {}, slot holds {}",
                header.length,
                bytes.len()
            )));
        }
        let row = bincode::deserialize(&bytes[TUPLE_HEADER_SIZE..])?;
        Ok(Tuple { header, row })
    }

    /// Whether column `index` is NULL according to the bitmap. Indices at or
    /// beyond the bitmap limit conservatively return false.
    pub fn is_null(&self, column_index: usize) -> bool {
        if column_index >= NULL_BITMAP_COLUMNS {
            return false;
        }
        self.header.null_bitmap & (1 << column_index) != 0
    }

    /// Header-only visibility: a version is visible iff it was created by
    /// some transaction (`xmin != 0`) and not yet deleted from this reader's
    /// point of view (`xmax == 0` or `xmax > reader`). Committed-ness is
    /// inferred from `xmin != 0`; there is no commit log.
    pub fn is_visible(&self, reader_xid: TxnId) -> bool {
        self.header.xmin != INVALID_XID
            && (self.header.xmax == INVALID_XID || self.header.xmax > reader_xid)
    }
}

/// Rewrites the `xmax` field of serialized tuple bytes in place. The delete
/// path uses this for the in-page header rewrite: the tuple's length is
/// unchanged, so the page can overwrite the slot without moving payloads.
pub fn overwrite_xmax(bytes: &mut [u8], xmax: TxnId) -> Result<()> {
    if bytes.len() < TUPLE_HEADER_SIZE {
        return Err(Error::Codec(format!(
            "Truncated tuple header: {} bytes",
            bytes.len()
        )));
    }
    bytes[8..12].copy_from_slice(&xmax.to_le_bytes());
    Ok(())
}
