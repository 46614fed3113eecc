use packed_struct::prelude::*;

use crate::error::{ResolveError, Result};
use crate::packetbuff::PacketBuffer;

pub const HEADER_LEN: usize = 12;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResultCode {
    NOERROR,   // no error condition
    FORMERR,   // format error - the name server was unable to interpret the query
    SERVFAIL,  // server failure - the name server was unable to process this query due to a problem with the name server
    NXDOMAIN,  // name error - meaningful only for responses from an authoritative name server, this code signifies that the domain name referenced in the query does not exist
    NOTIMP,    // not implemented - the name server does not support the requested kind of query
    REFUSED,   // refused - the name server refuses to perform the specified operation for policy reasons
    Other(u8), // 6..=15, reserved or extended
}

impl ResultCode {
    #[inline]
    pub fn from_u8(val: u8) -> ResultCode {
        match val & 0x0F {
            0 => ResultCode::NOERROR,
            1 => ResultCode::FORMERR,
            2 => ResultCode::SERVFAIL,
            3 => ResultCode::NXDOMAIN,
            4 => ResultCode::NOTIMP,
            5 => ResultCode::REFUSED,
            other => ResultCode::Other(other),
        }
    }

    #[inline]
    pub fn to_u8(self) -> u8 {
        match self {
            ResultCode::NOERROR => 0,
            ResultCode::FORMERR => 1,
            ResultCode::SERVFAIL => 2,
            ResultCode::NXDOMAIN => 3,
            ResultCode::NOTIMP => 4,
            ResultCode::REFUSED => 5,
            ResultCode::Other(val) => val & 0x0F,
        }
    }
}

#[derive(PackedStruct, Clone, Copy, Debug, PartialEq, Eq)]
#[packed_struct(bit_numbering = "msb0")]
pub struct DnsHeader {
    #[packed_field(bits = "0..=15", endian = "msb")]
    pub id: u16, // identification number; 16 bits

    #[packed_field(bits = "16")]
    pub qr: bool, // query (0) or response (1); 1 bit

    #[packed_field(bits = "17..=20")]
    pub opcode: Integer<u8, packed_bits::Bits<4>>, // operation code; 4 bits

    #[packed_field(bits = "21")]
    pub aa: bool, // authoritative answer; 1 bit
    #[packed_field(bits = "22")]
    pub tc: bool, // truncated; 1 bit
    #[packed_field(bits = "23")]
    pub rd: bool, // recursion desired; 1 bit
    #[packed_field(bits = "24")]
    pub ra: bool, // recursion available; 1 bit

    #[packed_field(bits = "25..=27")]
    pub z: Integer<u8, packed_bits::Bits<3>>, // reserved for future use; 3 bits

    #[packed_field(bits = "28..=31")]
    pub rcode: Integer<u8, packed_bits::Bits<4>>, // response code; 4 bits

    #[packed_field(bits = "32..=47", endian = "msb")]
    pub qdcount: u16, // number of entries in the question section; 16 bits
    #[packed_field(bits = "48..=63", endian = "msb")]
    pub ancount: u16, // number of resource records in the answer section; 16 bits
    #[packed_field(bits = "64..=79", endian = "msb")]
    pub nscount: u16, // number of name server resource records in the authority records section; 16 bits
    #[packed_field(bits = "80..=95", endian = "msb")]
    pub arcount: u16, // number of resource records in the additional records section; 16 bits
}

impl DnsHeader {
    pub fn new() -> Self {
        DnsHeader {
            id: 0,
            qr: false,
            opcode: 0.into(),
            aa: false,
            tc: false,
            rd: false,
            ra: false,

            z: 0.into(),

            rcode: 0.into(),
            qdcount: 0,
            ancount: 0,
            nscount: 0,
            arcount: 0,
        }
    }

    /// Builds a header from an id and a raw flags word, all counts zero.
    pub fn with_flags(id: u16, flags: u16) -> Result<Self> {
        let mut raw = [0u8; HEADER_LEN];
        raw[0..2].copy_from_slice(&id.to_be_bytes());
        raw[2..4].copy_from_slice(&flags.to_be_bytes());
        Self::unpack_bytes(&raw)
    }

    /// The QR|Opcode|AA|TC|RD|RA|Z|RCODE word.
    pub fn flags(&self) -> Result<u16> {
        let packed = self.pack_bytes()?;
        Ok(u16::from_be_bytes([packed[2], packed[3]]))
    }

    #[inline]
    pub fn result_code(&self) -> ResultCode {
        ResultCode::from_u8(*self.rcode)
    }

    #[inline]
    pub fn set_result_code(&mut self, rcode: ResultCode) {
        self.rcode = rcode.to_u8().into();
    }

    fn pack_bytes(&self) -> Result<[u8; HEADER_LEN]> {
        self.pack()
            .map_err(|e| ResolveError::malformed(format!("failed to pack header: {:?}", e)))
    }

    fn unpack_bytes(raw: &[u8; HEADER_LEN]) -> Result<Self> {
        DnsHeader::unpack(raw)
            .map_err(|e| ResolveError::malformed(format!("failed to unpack header: {:?}", e)))
    }

    pub fn read(buf: &mut PacketBuffer) -> Result<Self> {
        let raw = buf.read_slice::<HEADER_LEN>()?;
        Self::unpack_bytes(&raw)
    }

    pub fn write(&self, buf: &mut PacketBuffer) -> Result<()> {
        let packed = self.pack_bytes()?;
        buf.write_bytes(&packed)
    }
}

impl Default for DnsHeader {
    fn default() -> Self {
        Self::new()
    }
}
