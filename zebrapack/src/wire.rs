//! MessagePack byte encoding for values known at generation time.
//!
//! The generators only need exact bytes for constants they fold into
//! literals: headers with static counts, field keys, nil, and the type
//! fingerprint. The reference encoder uses the same functions for runtime
//! values. Every function picks the most compact header form.

// =============================================================================
// Format tags
// =============================================================================

const MAX_POSFIXINT: i64 = 0x7f;
const MIN_NEGFIXINT: i64 = -32;
const NIL: u8 = 0xc0;
const FALSE: u8 = 0xc2;
const TRUE: u8 = 0xc3;
const FIXMAP: u8 = 0x80;
const MAX_FIXMAP_SIZE: u32 = 0b1111;
const FIXARRAY: u8 = 0x90;
const MAX_FIXARRAY_SIZE: u32 = 0b1111;
const FIXSTR: u8 = 0xa0;
const MAX_FIXSTR_SIZE: usize = 0b11111;
const BIN_8: u8 = 0xc4;
const BIN_16: u8 = 0xc5;
const BIN_32: u8 = 0xc6;
const EXT_8: u8 = 0xc7;
const EXT_16: u8 = 0xc8;
const EXT_32: u8 = 0xc9;
const FLOAT_32: u8 = 0xca;
const FLOAT_64: u8 = 0xcb;
const UINT_8: u8 = 0xcc;
const UINT_16: u8 = 0xcd;
const UINT_32: u8 = 0xce;
const UINT_64: u8 = 0xcf;
const INT_8: u8 = 0xd0;
const INT_16: u8 = 0xd1;
const INT_32: u8 = 0xd2;
const INT_64: u8 = 0xd3;
const FIXEXT_1: u8 = 0xd4;
const FIXEXT_2: u8 = 0xd5;
const FIXEXT_4: u8 = 0xd6;
const FIXEXT_8: u8 = 0xd7;
const FIXEXT_16: u8 = 0xd8;
const STR_8: u8 = 0xd9;
const STR_16: u8 = 0xda;
const STR_32: u8 = 0xdb;
const ARRAY_16: u8 = 0xdc;
const ARRAY_32: u8 = 0xdd;
const MAP_16: u8 = 0xde;
const MAP_32: u8 = 0xdf;

/// Extension type used for timestamps.
pub const TIME_EXTENSION: i8 = 5;

// =============================================================================
// Worst-case encoded sizes
// =============================================================================

pub const NIL_SIZE: usize = 1;
pub const BOOL_SIZE: usize = 1;
pub const INT8_SIZE: usize = 2;
pub const INT16_SIZE: usize = 3;
pub const INT32_SIZE: usize = 5;
pub const INT64_SIZE: usize = 9;
pub const FLOAT32_SIZE: usize = 5;
pub const FLOAT64_SIZE: usize = 9;
pub const TIME_SIZE: usize = 15;
pub const MAP_HEADER_SIZE: usize = 5;
pub const ARRAY_HEADER_SIZE: usize = 5;
pub const STRING_PREFIX_SIZE: usize = 5;
pub const BYTES_PREFIX_SIZE: usize = 5;
pub const EXTENSION_PREFIX_SIZE: usize = 6;

// =============================================================================
// Append primitives
// =============================================================================

pub fn append_nil(buf: &mut Vec<u8>) {
    buf.push(NIL);
}

pub fn append_bool(buf: &mut Vec<u8>, v: bool) {
    buf.push(if v { TRUE } else { FALSE });
}

pub fn append_int64(buf: &mut Vec<u8>, v: i64) {
    if (MIN_NEGFIXINT..=MAX_POSFIXINT).contains(&v) {
        buf.push(v as u8);
    } else if let Ok(v) = i8::try_from(v) {
        buf.push(INT_8);
        buf.push(v as u8);
    } else if let Ok(v) = u8::try_from(v) {
        buf.push(UINT_8);
        buf.push(v);
    } else if let Ok(v) = i16::try_from(v) {
        buf.push(INT_16);
        buf.extend_from_slice(&v.to_be_bytes());
    } else if let Ok(v) = u16::try_from(v) {
        buf.push(UINT_16);
        buf.extend_from_slice(&v.to_be_bytes());
    } else if let Ok(v) = i32::try_from(v) {
        buf.push(INT_32);
        buf.extend_from_slice(&v.to_be_bytes());
    } else if let Ok(v) = u32::try_from(v) {
        buf.push(UINT_32);
        buf.extend_from_slice(&v.to_be_bytes());
    } else {
        buf.push(INT_64);
        buf.extend_from_slice(&v.to_be_bytes());
    }
}

pub fn append_uint64(buf: &mut Vec<u8>, v: u64) {
    if v <= MAX_POSFIXINT as u64 {
        buf.push(v as u8);
    } else if let Ok(v) = u8::try_from(v) {
        buf.push(UINT_8);
        buf.push(v);
    } else if let Ok(v) = u16::try_from(v) {
        buf.push(UINT_16);
        buf.extend_from_slice(&v.to_be_bytes());
    } else if let Ok(v) = u32::try_from(v) {
        buf.push(UINT_32);
        buf.extend_from_slice(&v.to_be_bytes());
    } else {
        buf.push(UINT_64);
        buf.extend_from_slice(&v.to_be_bytes());
    }
}

pub fn append_float32(buf: &mut Vec<u8>, v: f32) {
    buf.push(FLOAT_32);
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn append_float64(buf: &mut Vec<u8>, v: f64) {
    buf.push(FLOAT_64);
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn append_string(buf: &mut Vec<u8>, v: &str) {
    let size = v.len();
    if size <= MAX_FIXSTR_SIZE {
        buf.push(FIXSTR | size as u8);
    } else if let Ok(size) = u8::try_from(size) {
        buf.push(STR_8);
        buf.push(size);
    } else if let Ok(size) = u16::try_from(size) {
        buf.push(STR_16);
        buf.extend_from_slice(&size.to_be_bytes());
    } else {
        buf.push(STR_32);
        buf.extend_from_slice(&(size as u32).to_be_bytes());
    }
    buf.extend_from_slice(v.as_bytes());
}

pub fn append_bytes(buf: &mut Vec<u8>, v: &[u8]) {
    let size = v.len();
    if let Ok(size) = u8::try_from(size) {
        buf.push(BIN_8);
        buf.push(size);
    } else if let Ok(size) = u16::try_from(size) {
        buf.push(BIN_16);
        buf.extend_from_slice(&size.to_be_bytes());
    } else {
        buf.push(BIN_32);
        buf.extend_from_slice(&(size as u32).to_be_bytes());
    }
    buf.extend_from_slice(v);
}

pub fn append_array_header(buf: &mut Vec<u8>, n: u32) {
    if n <= MAX_FIXARRAY_SIZE {
        buf.push(FIXARRAY | n as u8);
    } else if let Ok(n) = u16::try_from(n) {
        buf.push(ARRAY_16);
        buf.extend_from_slice(&n.to_be_bytes());
    } else {
        buf.push(ARRAY_32);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

pub fn append_map_header(buf: &mut Vec<u8>, n: u32) {
    if n <= MAX_FIXMAP_SIZE {
        buf.push(FIXMAP | n as u8);
    } else if let Ok(n) = u16::try_from(n) {
        buf.push(MAP_16);
        buf.extend_from_slice(&n.to_be_bytes());
    } else {
        buf.push(MAP_32);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

pub fn append_ext(buf: &mut Vec<u8>, typ: i8, data: &[u8]) {
    match data.len() {
        1 => buf.push(FIXEXT_1),
        2 => buf.push(FIXEXT_2),
        4 => buf.push(FIXEXT_4),
        8 => buf.push(FIXEXT_8),
        16 => buf.push(FIXEXT_16),
        len => {
            if let Ok(len) = u8::try_from(len) {
                buf.push(EXT_8);
                buf.push(len);
            } else if let Ok(len) = u16::try_from(len) {
                buf.push(EXT_16);
                buf.extend_from_slice(&len.to_be_bytes());
            } else {
                buf.push(EXT_32);
                buf.extend_from_slice(&(len as u32).to_be_bytes());
            }
        }
    }
    buf.push(typ as u8);
    buf.extend_from_slice(data);
}

/// Timestamp as a 12-byte extension: seconds then nanoseconds, big-endian.
pub fn append_time(buf: &mut Vec<u8>, secs: i64, nanos: u32) {
    let mut data = [0u8; 12];
    data[..8].copy_from_slice(&secs.to_be_bytes());
    data[8..].copy_from_slice(&nanos.to_be_bytes());
    append_ext(buf, TIME_EXTENSION, &data);
}

/// The fast-protocol type fingerprint entry: key `-1`, then the receiver
/// type name as a binary value.
pub fn append_negative_one_and_string_as_bytes(buf: &mut Vec<u8>, name: &[u8]) {
    append_int64(buf, -1);
    append_bytes(buf, name);
}

/// Encode with `f` into a fresh buffer.
pub fn encoded<F: FnOnce(&mut Vec<u8>)>(f: F) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8);
    f(&mut buf);
    buf
}
