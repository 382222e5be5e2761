//! Flatbuffer table/vector builder.
//!
//! Buffers are assembled back to front: child objects are written first and
//! land at higher addresses, so every reference is a forward u32 offset.
//! Internally the bytes are kept reversed and flipped once in `finish`.

use byteorder::{ByteOrder, LittleEndian};

/// Position of a finished object, measured from the buffer end. Only
/// meaningful for the builder that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireOffset(usize);

enum SlotValue {
    Byte(u8),
    Offset(WireOffset),
}

struct FieldSlot {
    id: u16,
    value: SlotValue,
}

pub struct Builder {
    rev: Vec<u8>,
    minalign: usize,
    slots: Vec<FieldSlot>,
    nested: bool,
}

impl Builder {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rev: Vec::with_capacity(capacity),
            minalign: 1,
            slots: Vec::new(),
            nested: false,
        }
    }

    /// Distance from the buffer end to the most recently written byte.
    fn head(&self) -> usize {
        self.rev.len()
    }

    /// Aligns the write head so that an item of alignment `align`, written
    /// after `extra` more bytes, lands on an aligned final address. The
    /// finished buffer is padded to a multiple of the largest alignment
    /// seen, which makes end-relative and start-relative alignment agree.
    fn prep(&mut self, align: usize, extra: usize) {
        if align > self.minalign {
            self.minalign = align;
        }
        while (self.rev.len() + extra) % align != 0 {
            self.rev.push(0);
        }
    }

    /// Pushes bytes so they appear in this order in the finished buffer.
    fn push(&mut self, bytes: &[u8]) {
        self.rev.extend(bytes.iter().rev());
    }

    fn push_u16(&mut self, value: u16) {
        let mut buf = [0u8; 2];
        LittleEndian::write_u16(&mut buf, value);
        self.push(&buf);
    }

    fn push_u32(&mut self, value: u32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        self.push(&buf);
    }

    /// Forward-offset value for a reference about to be written at the head.
    fn ref_to(&self, target: WireOffset) -> u32 {
        (self.head() + 4 - target.0) as u32
    }

    pub fn create_byte_vector(&mut self, data: &[u8]) -> WireOffset {
        self.prep(4, data.len());
        self.push(data);
        self.push_u32(data.len() as u32);
        WireOffset(self.head())
    }

    /// Vector of int64 dimension sizes, each written as its low and high
    /// 32-bit halves.
    pub fn create_dim_vector(&mut self, dims: &[u64]) -> WireOffset {
        self.prep(4, 8 * dims.len());
        self.prep(8, 8 * dims.len());
        for &dim in dims.iter().rev() {
            let mut buf = [0u8; 8];
            LittleEndian::write_u32(&mut buf[..4], (dim & 0xFFFF_FFFF) as u32);
            LittleEndian::write_u32(&mut buf[4..], (dim >> 32) as u32);
            self.push(&buf);
        }
        self.push_u32(dims.len() as u32);
        WireOffset(self.head())
    }

    pub fn create_string(&mut self, s: &str) -> WireOffset {
        self.prep(4, s.len() + 1);
        self.rev.push(0); // NUL terminator, not counted in the length
        self.push(s.as_bytes());
        self.push_u32(s.len() as u32);
        WireOffset(self.head())
    }

    pub fn create_offset_vector(&mut self, items: &[WireOffset]) -> WireOffset {
        self.prep(4, 4 * items.len());
        for &item in items.iter().rev() {
            let value = self.ref_to(item);
            self.push_u32(value);
        }
        self.push_u32(items.len() as u32);
        WireOffset(self.head())
    }

    pub fn start_table(&mut self) {
        debug_assert!(!self.nested, "table already in progress");
        self.nested = true;
        self.slots.clear();
    }

    /// Records a u8 field; omitted when equal to its schema default.
    pub fn push_slot_u8(&mut self, id: u16, value: u8, default: u8) {
        if value != default {
            self.slots.push(FieldSlot {
                id,
                value: SlotValue::Byte(value),
            });
        }
    }

    pub fn push_slot_offset(&mut self, id: u16, value: WireOffset) {
        self.slots.push(FieldSlot {
            id,
            value: SlotValue::Offset(value),
        });
    }

    pub fn end_table(&mut self) -> WireOffset {
        debug_assert!(self.nested, "no table in progress");
        self.nested = false;

        let table_end = self.head();
        let slots = std::mem::take(&mut self.slots);

        // Field data, in reverse declaration order so it reads forward in
        // the finished buffer. The vtable records each field's actual spot.
        let mut field_heads: Vec<(u16, usize)> = Vec::with_capacity(slots.len());
        for slot in slots.iter().rev() {
            match slot.value {
                SlotValue::Byte(value) => {
                    self.rev.push(value);
                }
                SlotValue::Offset(target) => {
                    self.prep(4, 0);
                    let value = self.ref_to(target);
                    self.push_u32(value);
                }
            }
            field_heads.push((slot.id, self.head()));
        }

        // The table starts with an i32 offset to its vtable, patched below
        // once the vtable position is known.
        self.prep(4, 0);
        self.push(&[0, 0, 0, 0]);
        let table_head = self.head();

        let n_fields = field_heads
            .iter()
            .map(|&(id, _)| id as usize + 1)
            .max()
            .unwrap_or(0);
        let vtable_len = (4 + 2 * n_fields) as u16;
        let table_len = (table_head - table_end) as u16;

        for id in (0..n_fields as u16).rev() {
            let entry = field_heads
                .iter()
                .find(|&&(fid, _)| fid == id)
                .map_or(0, |&(_, h)| (table_head - h) as u16);
            self.push_u16(entry);
        }
        self.push_u16(table_len);
        self.push_u16(vtable_len);
        let vtable_head = self.head();

        let soffset = (vtable_head - table_head) as i32;
        let le = soffset.to_le_bytes();
        for (k, byte) in le.iter().enumerate() {
            self.rev[table_head - 1 - k] = *byte;
        }

        WireOffset(table_head)
    }

    /// Writes the root offset and returns the finished buffer.
    pub fn finish(mut self, root: WireOffset) -> Vec<u8> {
        self.prep(self.minalign, 4);
        let value = self.ref_to(root);
        self.push_u32(value);
        self.rev.reverse();
        self.rev
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Table;

    #[test]
    fn test_empty_table_root() {
        let mut b = Builder::new();
        b.start_table();
        let root = b.end_table();
        let buf = b.finish(root);

        let table = Table::root(&buf).unwrap();
        // No fields: every slot reads as its default.
        assert_eq!(table.get_u8(0, 7).unwrap(), 7);
        assert_eq!(table.get_u8(3, 0).unwrap(), 0);
    }

    #[test]
    fn test_scalar_and_offset_fields() {
        let mut b = Builder::new();
        let name = b.create_string("squeeze");
        let data = b.create_byte_vector(&[9, 8, 7]);
        b.start_table();
        b.push_slot_u8(0, 5, 0);
        b.push_slot_offset(1, name);
        b.push_slot_offset(2, data);
        let root = b.end_table();
        let buf = b.finish(root);

        let table = Table::root(&buf).unwrap();
        assert_eq!(table.get_u8(0, 0).unwrap(), 5);
        assert_eq!(table.get_str(1).unwrap(), Some("squeeze"));
        assert_eq!(table.get_bytes(2).unwrap(), Some(&[9u8, 8, 7][..]));
    }

    #[test]
    fn test_default_scalar_is_omitted() {
        let mut b = Builder::new();
        b.start_table();
        b.push_slot_u8(0, 0, 0);
        let root = b.end_table();
        let buf = b.finish(root);

        let table = Table::root(&buf).unwrap();
        assert_eq!(table.get_u8(0, 42).unwrap(), 42);
    }

    #[test]
    fn test_dim_vector_alignment() {
        let mut b = Builder::new();
        let dims = b.create_dim_vector(&[1, 2, 3]);
        b.start_table();
        b.push_slot_offset(0, dims);
        let root = b.end_table();
        let buf = b.finish(root);

        assert_eq!(buf.len() % 8, 0);
        let table = Table::root(&buf).unwrap();
        assert_eq!(table.get_dims(0).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_string_is_nul_terminated() {
        let mut b = Builder::new();
        let s = b.create_string("ab");
        b.start_table();
        b.push_slot_offset(0, s);
        let root = b.end_table();
        let buf = b.finish(root);

        let pos = buf
            .windows(2)
            .position(|w| w == b"ab")
            .expect("string bytes present");
        assert_eq!(buf[pos + 2], 0);
    }

    #[test]
    fn test_offset_vector_preserves_order() {
        let mut b = Builder::new();
        let first = b.create_string("first");
        let second = b.create_string("second");
        let vec = b.create_offset_vector(&[first, second]);
        b.start_table();
        b.push_slot_offset(0, vec);
        let root = b.end_table();
        let buf = b.finish(root);

        let table = Table::root(&buf).unwrap();
        let v = table.get_vector(0).unwrap().unwrap();
        assert!(!v.is_empty());
        assert_eq!(v.len(), 2);
        assert_eq!(v.string(0).unwrap(), "first");
        assert_eq!(v.string(1).unwrap(), "second");
    }
}
