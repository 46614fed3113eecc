use crate::dns::name::{self, Name};
use crate::error::{ResolveError, Result};

/// A cursor over the bytes of one DNS message.
///
/// Reads are bounds checked against the bytes actually received, so a
/// truncated message surfaces as `MalformedMessage` instead of reading
/// zero padding. Writes are capped at the classic 512 byte UDP limit.
pub struct PacketBuffer {
    buf: Vec<u8>,
    pos: usize,
}

impl PacketBuffer {
    pub const MAX_WRITE_LEN: usize = 512;

    // fresh packet buffer for writing
    pub fn new() -> PacketBuffer {
        PacketBuffer {
            buf: Vec::with_capacity(Self::MAX_WRITE_LEN),
            pos: 0,
        }
    }

    // packet buffer positioned at the start of a received message
    pub fn from_bytes(bytes: &[u8]) -> PacketBuffer {
        PacketBuffer {
            buf: bytes.to_vec(),
            pos: 0,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    // step forward in the buffer by n steps
    #[inline]
    pub fn step(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    // set the buffer position
    #[inline]
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.buf.len() {
            return Err(ResolveError::malformed(format!(
                "seek to {} past end of {} byte message",
                pos,
                self.buf.len()
            )));
        }
        self.pos = pos;
        Ok(())
    }

    #[inline]
    fn ensure(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(ResolveError::malformed(format!(
                "need {} bytes at offset {}, only {} left",
                n,
                self.pos,
                self.remaining()
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn read_slice<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;

        let mut arr = [0; N];
        arr.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;

        Ok(arr)
    }

    // read n bytes from the buffer, and step forward
    #[inline]
    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.ensure(n)?;

        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..start + n])
    }

    // read a byte from the buffer, and step forward
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_slice::<1>()?[0])
    }

    // read 2 bytes from the buffer, and step forward
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_slice::<2>()?))
    }

    // read 4 bytes from the buffer, and step forward
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_slice::<4>()?))
    }

    // read a name from the current position
    // pointers may reference anywhere earlier in the whole message,
    // only the bytes at the current position are stepped over
    pub fn read_name(&mut self) -> Result<Name> {
        let (name, consumed) = name::decode(&self.buf, self.pos)?;
        self.pos += consumed;
        Ok(name)
    }

    #[inline]
    fn ensure_room(&self, n: usize) -> Result<()> {
        if self.pos + n > Self::MAX_WRITE_LEN {
            return Err(ResolveError::malformed(format!(
                "message exceeds {} bytes",
                Self::MAX_WRITE_LEN
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn write_u8(&mut self, val: u8) -> Result<()> {
        self.write_bytes(&[val])
    }

    #[inline]
    pub fn write_u16(&mut self, val: u16) -> Result<()> {
        self.write_bytes(&val.to_be_bytes())
    }

    #[inline]
    pub fn write_u32(&mut self, val: u32) -> Result<()> {
        self.write_bytes(&val.to_be_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_room(bytes.len())?;

        // writes always happen at the end, set_* patches earlier bytes
        self.buf.truncate(self.pos);
        self.buf.extend_from_slice(bytes);
        self.pos += bytes.len();

        Ok(())
    }

    // names are always written uncompressed
    pub fn write_name(&mut self, name: &Name) -> Result<()> {
        self.write_bytes(&name.to_wire())
    }

    #[inline]
    pub fn set_u16(&mut self, pos: usize, val: u16) -> Result<()> {
        if pos + 2 > self.buf.len() {
            return Err(ResolveError::malformed(format!(
                "cannot patch offset {} of {} byte message",
                pos,
                self.buf.len()
            )));
        }

        self.buf[pos..pos + 2].copy_from_slice(&val.to_be_bytes());
        Ok(())
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new()
    }
}
