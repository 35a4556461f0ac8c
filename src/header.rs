//! Generic node header shared by every node kind of the file format.
//!
//! ```text
//! byte:  0   1   2   3       4       5   6   7
//!       [ capacity  ][ - ][ flags ][   size    ]
//! ```
//!
//! `capacity` and `size` are 24-bit big-endian. `flags` packs, from the most
//! significant bit: inner B+-tree node, has refs, context flag, the 2-bit width
//! type and the 3-bit width index.

use crate::error::{BlobError, Result};

/// Size in bytes of the header prefixed to every node.
pub const HEADER_SIZE: usize = 8;

/// Largest value the 24-bit capacity and size fields can hold.
pub const MAX_NODE_BYTES: usize = 0xFF_FFFF;

const INNER_BPTREE_NODE_BIT: u8 = 0x80;
const HAS_REFS_BIT: u8 = 0x40;
const CONTEXT_FLAG_BIT: u8 = 0x20;
const WIDTH_TYPE_SHIFT: u8 = 3;
const WIDTH_TYPE_MASK: u8 = 0x18;
const WIDTH_INDEX_MASK: u8 = 0x07;

/// How the generic per-element width applies to the content of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WidthType {
    /// Width is in bits per element
    Bits = 0,
    /// Width is in bytes per element
    Multiply = 1,
    /// Width does not apply, content is raw bytes
    Ignore = 2,
}

impl TryFrom<u8> for WidthType {
    type Error = BlobError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(WidthType::Bits),
            1 => Ok(WidthType::Multiply),
            2 => Ok(WidthType::Ignore),
            other => Err(BlobError::corrupt_header(format!(
                "unknown width type {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub is_inner_bptree_node: bool,
    pub has_refs: bool,
    pub context_flag: bool,
    pub width_type: WidthType,
    /// Element width, one of 0, 1, 2, 4, 8, 16, 32, 64
    pub width: u8,
    /// Number of elements, for a blob node the number of content bytes
    pub size: usize,
    /// Total bytes of the region, header included
    pub capacity: usize,
}

impl NodeHeader {
    /// Header of a raw byte node: width ignored, no context flag.
    pub fn blob(size: usize, capacity: usize) -> Self {
        Self {
            is_inner_bptree_node: false,
            has_refs: false,
            context_flag: false,
            width_type: WidthType::Ignore,
            width: 0,
            size,
            capacity,
        }
    }

    pub fn read(header: &[u8]) -> Result<Self> {
        if header.len() < HEADER_SIZE {
            return Err(BlobError::corrupt_header(format!(
                "expected {HEADER_SIZE} header bytes, got {}",
                header.len()
            )));
        }
        let flags = header[4];
        let width_type = WidthType::try_from((flags & WIDTH_TYPE_MASK) >> WIDTH_TYPE_SHIFT)?;
        Ok(Self {
            is_inner_bptree_node: flags & INNER_BPTREE_NODE_BIT != 0,
            has_refs: flags & HAS_REFS_BIT != 0,
            context_flag: flags & CONTEXT_FLAG_BIT != 0,
            width_type,
            width: decode_width(flags & WIDTH_INDEX_MASK),
            size: decode_size(header),
            capacity: decode_capacity(header),
        })
    }

    pub fn write(&self, header: &mut [u8]) {
        let mut flags = 0;
        if self.is_inner_bptree_node {
            flags |= INNER_BPTREE_NODE_BIT;
        }
        if self.has_refs {
            flags |= HAS_REFS_BIT;
        }
        if self.context_flag {
            flags |= CONTEXT_FLAG_BIT;
        }
        flags |= (self.width_type as u8) << WIDTH_TYPE_SHIFT;
        flags |= encode_width(self.width);

        encode_capacity(header, self.capacity);
        header[3] = 0;
        header[4] = flags;
        encode_size(header, self.size);
    }
}

fn read_u24(bytes: &[u8]) -> usize {
    (bytes[0] as usize) << 16 | (bytes[1] as usize) << 8 | bytes[2] as usize
}

fn write_u24(bytes: &mut [u8], value: usize) {
    debug_assert!(value <= MAX_NODE_BYTES, "{value} does not fit in 24 bits");
    bytes[0] = (value >> 16) as u8;
    bytes[1] = (value >> 8) as u8;
    bytes[2] = value as u8;
}

/// Width index 0 means width 0, otherwise width is `1 << (index - 1)`.
fn decode_width(index: u8) -> u8 {
    ((1u16 << index) >> 1) as u8
}

fn encode_width(width: u8) -> u8 {
    debug_assert!(width == 0 || width.is_power_of_two(), "invalid width {width}");
    if width == 0 {
        0
    } else {
        width.trailing_zeros() as u8 + 1
    }
}

#[inline]
pub fn decode_size(header: &[u8]) -> usize {
    read_u24(&header[5..8])
}

#[inline]
pub fn encode_size(header: &mut [u8], size: usize) {
    write_u24(&mut header[5..8], size)
}

#[inline]
pub fn decode_capacity(header: &[u8]) -> usize {
    read_u24(&header[0..3])
}

#[inline]
pub fn encode_capacity(header: &mut [u8], capacity: usize) {
    write_u24(&mut header[0..3], capacity)
}

/// Content bytes that follow the header.
#[inline]
pub fn get_data_from_header(header: &[u8]) -> &[u8] {
    &header[HEADER_SIZE..]
}

#[inline]
pub fn get_data_from_header_mut(header: &mut [u8]) -> &mut [u8] {
    &mut header[HEADER_SIZE..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_blob_header_layout() {
        let mut bytes = [0xAA; HEADER_SIZE];
        NodeHeader::blob(0x01_02_03, 0x0A_0B_0C).write(&mut bytes);
        // capacity, reserved, flags (width type 2 in bits 4..3), size
        assert_eq!(bytes, [0x0A, 0x0B, 0x0C, 0x00, 0x10, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_flags_layout() {
        let header = NodeHeader {
            is_inner_bptree_node: true,
            has_refs: true,
            context_flag: true,
            width_type: WidthType::Multiply,
            width: 64,
            size: 0,
            capacity: 0,
        };
        let mut bytes = [0; HEADER_SIZE];
        header.write(&mut bytes);
        assert_eq!(bytes[4], 0b1110_1111);
        assert_eq!(NodeHeader::read(&bytes).unwrap(), header);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(4, 3)]
    #[case(8, 4)]
    #[case(16, 5)]
    #[case(32, 6)]
    #[case(64, 7)]
    fn test_width_encoding(#[case] width: u8, #[case] index: u8) {
        assert_eq!(encode_width(width), index);
        assert_eq!(decode_width(index), width);
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    #[case(0x1234)]
    #[case(MAX_NODE_BYTES)]
    fn test_size_and_capacity_fields(#[case] value: usize) {
        let mut bytes = [0; HEADER_SIZE];
        encode_size(&mut bytes, value);
        encode_capacity(&mut bytes, MAX_NODE_BYTES - value);
        assert_eq!(decode_size(&bytes), value);
        assert_eq!(decode_capacity(&bytes), MAX_NODE_BYTES - value);
    }

    #[test]
    fn test_unknown_width_type() {
        let mut bytes = [0; HEADER_SIZE];
        bytes[4] = 0x18;
        assert!(matches!(
            NodeHeader::read(&bytes),
            Err(BlobError::CorruptHeader(_))
        ));
    }

    #[test]
    fn test_short_header() {
        assert!(NodeHeader::read(&[0; 4]).is_err());
    }

    #[test]
    fn test_data_from_header() {
        let mut bytes = vec![0; HEADER_SIZE + 3];
        get_data_from_header_mut(&mut bytes).copy_from_slice(b"abc");
        assert_eq!(get_data_from_header(&bytes), b"abc");
    }
}
