use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{ResolveError, Result};
use crate::packetbuff::PacketBuffer;

use super::name::Name;
use super::question::{QueryType, CLASS_IN};

/// Type specific part of a resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    NS(Name),
    CNAME(Name),
    MX { preference: u16, exchange: Name },
    AAAA(Ipv6Addr),
    // decoded but not modelled, kept as opaque rdata
    Unknown { rtype: u16, data: Vec<u8> },
}

impl RecordData {
    pub fn query_type(&self) -> QueryType {
        match self {
            RecordData::A(_) => QueryType::A,
            RecordData::NS(_) => QueryType::NS,
            RecordData::CNAME(_) => QueryType::CNAME,
            RecordData::MX { .. } => QueryType::MX,
            RecordData::AAAA(_) => QueryType::AAAA,
            RecordData::Unknown { rtype, .. } => QueryType::from_u16(*rtype),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    pub name: Name,
    pub class: u16,
    pub ttl: u32,
    pub data: RecordData,
}

impl DnsRecord {
    pub fn new(name: Name, ttl: u32, data: RecordData) -> Self {
        DnsRecord {
            name,
            class: CLASS_IN,
            ttl,
            data,
        }
    }

    #[inline]
    pub fn rtype(&self) -> QueryType {
        self.data.query_type()
    }

    pub fn read(buf: &mut PacketBuffer) -> Result<Self> {
        let name = buf.read_name()?;

        let rtype = buf.read_u16()?;
        let class = buf.read_u16()?;
        let ttl = buf.read_u32()?;
        let data_len = buf.read_u16()? as usize;

        if buf.remaining() < data_len {
            return Err(ResolveError::malformed(format!(
                "rdata of {} bytes for {} overruns message ({} left)",
                data_len,
                name,
                buf.remaining()
            )));
        }

        let start = buf.pos();
        let data = match QueryType::from_u16(rtype) {
            QueryType::A => {
                expect_len(&name, rtype, data_len, 4)?;
                RecordData::A(Ipv4Addr::from(buf.read_u32()?))
            }
            QueryType::AAAA => {
                expect_len(&name, rtype, data_len, 16)?;
                RecordData::AAAA(Ipv6Addr::from(buf.read_slice::<16>()?))
            }
            QueryType::NS => RecordData::NS(buf.read_name()?),
            QueryType::CNAME => RecordData::CNAME(buf.read_name()?),
            QueryType::MX => RecordData::MX {
                preference: buf.read_u16()?,
                exchange: buf.read_name()?,
            },
            QueryType::UNKNOWN(_) => RecordData::Unknown {
                rtype,
                data: buf.read_bytes(data_len)?.to_vec(),
            },
        };

        // the payload must fill rdlength exactly
        let used = buf.pos() - start;
        if used != data_len {
            return Err(ResolveError::malformed(format!(
                "{} record for {} declares {} rdata bytes but uses {}",
                QueryType::from_u16(rtype),
                name,
                data_len,
                used
            )));
        }

        Ok(DnsRecord {
            name,
            class,
            ttl,
            data,
        })
    }

    pub fn write(&self, buf: &mut PacketBuffer) -> Result<usize> {
        let start_pos = buf.pos();

        buf.write_name(&self.name)?;
        buf.write_u16(self.rtype().to_u16())?;
        buf.write_u16(self.class)?;
        buf.write_u32(self.ttl)?;

        let pos = buf.pos();
        buf.write_u16(0)?; // data_len, patched below

        match &self.data {
            RecordData::A(addr) => buf.write_bytes(&addr.octets())?,
            RecordData::AAAA(addr) => buf.write_bytes(&addr.octets())?,
            RecordData::NS(target) | RecordData::CNAME(target) => buf.write_name(target)?,
            RecordData::MX {
                preference,
                exchange,
            } => {
                buf.write_u16(*preference)?;
                buf.write_name(exchange)?;
            }
            RecordData::Unknown { data, .. } => buf.write_bytes(data)?,
        }

        let len = buf.pos() - pos - 2;
        buf.set_u16(pos, len as u16)?;

        Ok(buf.pos() - start_pos)
    }
}

fn expect_len(name: &Name, rtype: u16, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(ResolveError::malformed(format!(
            "{} record for {} has rdlength {}, expected {}",
            QueryType::from_u16(rtype),
            name,
            actual,
            expected
        )));
    }
    Ok(())
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t", self.name, self.ttl, self.rtype())?;
        match &self.data {
            RecordData::A(addr) => write!(f, "{}", addr),
            RecordData::AAAA(addr) => write!(f, "{}", addr),
            RecordData::NS(target) | RecordData::CNAME(target) => write!(f, "{}", target),
            RecordData::MX {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            RecordData::Unknown { data, .. } => {
                write!(f, "\\# {}", data.len())?;
                if !data.is_empty() {
                    f.write_str(" ")?;
                }
                for byte in data {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}
