//! Bounds-checked flatbuffer table/vector reading.
//!
//! Every access validates offsets against the buffer before following them,
//! so a malformed response surfaces as a typed error instead of an
//! out-of-bounds read.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{ProtocolError, Result};

fn read_u8(buf: &[u8], at: usize) -> Result<u8> {
    buf.get(at).copied().ok_or(ProtocolError::BufferTooShort {
        need: at + 1,
        have: buf.len(),
    })
}

fn read_u16(buf: &[u8], at: usize) -> Result<u16> {
    let end = at.checked_add(2).ok_or(ProtocolError::BadOffset { at })?;
    if end > buf.len() {
        return Err(ProtocolError::BufferTooShort {
            need: end,
            have: buf.len(),
        });
    }
    Ok(LittleEndian::read_u16(&buf[at..end]))
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32> {
    let end = at.checked_add(4).ok_or(ProtocolError::BadOffset { at })?;
    if end > buf.len() {
        return Err(ProtocolError::BufferTooShort {
            need: end,
            have: buf.len(),
        });
    }
    Ok(LittleEndian::read_u32(&buf[at..end]))
}

fn read_i32(buf: &[u8], at: usize) -> Result<i32> {
    read_u32(buf, at).map(|v| v as i32)
}

/// Follows the forward u32 offset stored at `at`.
fn follow(buf: &[u8], at: usize) -> Result<usize> {
    let rel = read_u32(buf, at)? as usize;
    let target = at.checked_add(rel).ok_or(ProtocolError::BadOffset { at })?;
    if target >= buf.len() {
        return Err(ProtocolError::BadOffset { at });
    }
    Ok(target)
}

fn str_at(buf: &[u8], at: usize) -> Result<&str> {
    let len = read_u32(buf, at)? as usize;
    let start = at + 4;
    let end = start.checked_add(len).ok_or(ProtocolError::BadOffset { at })?;
    if end > buf.len() {
        return Err(ProtocolError::BufferTooShort {
            need: end,
            have: buf.len(),
        });
    }
    std::str::from_utf8(&buf[start..end]).map_err(|_| ProtocolError::InvalidUtf8)
}

/// A table within a decoded buffer.
#[derive(Debug, Clone, Copy)]
pub struct Table<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Table<'a> {
    /// Interprets the buffer's root offset as a table.
    pub fn root(buf: &'a [u8]) -> Result<Self> {
        let pos = follow(buf, 0)?;
        Ok(Self { buf, pos })
    }

    /// Resolves a field id through the vtable; `None` means the field was
    /// not written and its default applies.
    fn field_pos(&self, id: u16) -> Result<Option<usize>> {
        let soffset = read_i32(self.buf, self.pos)? as i64;
        let vtable = self.pos as i64 - soffset;
        if vtable < 0 || vtable as usize >= self.buf.len() {
            return Err(ProtocolError::BadOffset { at: self.pos });
        }
        let vtable = vtable as usize;
        let vtable_len = read_u16(self.buf, vtable)? as usize;
        let entry = 4 + 2 * id as usize;
        if entry + 2 > vtable_len {
            return Ok(None);
        }
        let off = read_u16(self.buf, vtable + entry)? as usize;
        if off == 0 {
            return Ok(None);
        }
        Ok(Some(self.pos + off))
    }

    pub fn get_u8(&self, id: u16, default: u8) -> Result<u8> {
        match self.field_pos(id)? {
            Some(pos) => read_u8(self.buf, pos),
            None => Ok(default),
        }
    }

    pub fn get_table(&self, id: u16) -> Result<Option<Table<'a>>> {
        match self.field_pos(id)? {
            Some(pos) => {
                let target = follow(self.buf, pos)?;
                Ok(Some(Table {
                    buf: self.buf,
                    pos: target,
                }))
            }
            None => Ok(None),
        }
    }

    pub fn get_str(&self, id: u16) -> Result<Option<&'a str>> {
        match self.field_pos(id)? {
            Some(pos) => {
                let target = follow(self.buf, pos)?;
                str_at(self.buf, target).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn get_bytes(&self, id: u16) -> Result<Option<&'a [u8]>> {
        match self.field_pos(id)? {
            Some(pos) => {
                let target = follow(self.buf, pos)?;
                let len = read_u32(self.buf, target)? as usize;
                let start = target + 4;
                let end = start
                    .checked_add(len)
                    .ok_or(ProtocolError::BadOffset { at: target })?;
                if end > self.buf.len() {
                    return Err(ProtocolError::BufferTooShort {
                        need: end,
                        have: self.buf.len(),
                    });
                }
                Ok(Some(&self.buf[start..end]))
            }
            None => Ok(None),
        }
    }

    /// Reads an int64 dimension vector, recombining each element from its
    /// low and high 32-bit halves. An absent field reads as an empty shape.
    pub fn get_dims(&self, id: u16) -> Result<Vec<u64>> {
        let pos = match self.field_pos(id)? {
            Some(pos) => pos,
            None => return Ok(Vec::new()),
        };
        let target = follow(self.buf, pos)?;
        let len = read_u32(self.buf, target)? as usize;
        let mut dims = Vec::with_capacity(len);
        for i in 0..len {
            let at = target + 4 + 8 * i;
            let low = read_u32(self.buf, at)? as u64;
            let high = read_u32(self.buf, at + 4)? as u64;
            dims.push((high << 32) | low);
        }
        Ok(dims)
    }

    /// Reads a vector whose elements are offsets to tables or strings.
    pub fn get_vector(&self, id: u16) -> Result<Option<OffsetVector<'a>>> {
        match self.field_pos(id)? {
            Some(pos) => {
                let target = follow(self.buf, pos)?;
                let len = read_u32(self.buf, target)? as usize;
                Ok(Some(OffsetVector {
                    buf: self.buf,
                    pos: target + 4,
                    len,
                }))
            }
            None => Ok(None),
        }
    }
}

/// A vector of forward offsets to child objects.
#[derive(Debug, Clone, Copy)]
pub struct OffsetVector<'a> {
    buf: &'a [u8],
    pos: usize,
    len: usize,
}

impl<'a> OffsetVector<'a> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn element(&self, index: usize) -> Result<usize> {
        if index >= self.len {
            return Err(ProtocolError::BadOffset { at: self.pos });
        }
        follow(self.buf, self.pos + 4 * index)
    }

    pub fn table(&self, index: usize) -> Result<Table<'a>> {
        let pos = self.element(index)?;
        Ok(Table { buf: self.buf, pos })
    }

    pub fn string(&self, index: usize) -> Result<&'a str> {
        let pos = self.element(index)?;
        str_at(self.buf, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_of_empty_buffer() {
        let result = Table::root(&[]);
        assert!(matches!(
            result,
            Err(ProtocolError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn test_root_offset_out_of_bounds() {
        let buf = 64u32.to_le_bytes();
        let result = Table::root(&buf);
        assert!(matches!(result, Err(ProtocolError::BadOffset { .. })));
    }

    #[test]
    fn test_truncated_vtable() {
        // Root points at a "table" whose soffset runs off the buffer front.
        let mut buf = Vec::new();
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&1024i32.to_le_bytes());
        let table = Table::root(&buf).unwrap();
        assert!(matches!(
            table.get_u8(0, 0),
            Err(ProtocolError::BadOffset { .. })
        ));
    }
}
