//! Byte-wise little-endian field packing for object headers.
//!
//! Heap objects start at byte-granular addresses, so multi-byte fields are
//! written one byte at a time; nothing here assumes alignment.

use zerocopy::byteorder::little_endian;

pub fn put_u16(tab: &mut [u8], val: u16) {
    debug_assert!(tab.len() >= 2);
    let bytes = little_endian::U16::new(val).to_bytes();
    tab[..2].copy_from_slice(&bytes);
}

pub fn get_u16(tab: &[u8]) -> u16 {
    debug_assert!(tab.len() >= 2);
    let bytes = [tab[0], tab[1]];
    little_endian::U16::from_bytes(bytes).get()
}

pub fn put_u8(tab: &mut [u8], val: u8) {
    debug_assert!(!tab.is_empty());
    tab[0] = val;
}

pub fn get_u8(tab: &[u8]) -> u8 {
    debug_assert!(!tab.is_empty());
    tab[0]
}
