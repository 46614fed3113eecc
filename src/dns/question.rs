use std::fmt;
use std::str::FromStr;

use crate::error::{ResolveError, Result};
use crate::packetbuff::PacketBuffer;

use super::name::Name;

pub const CLASS_IN: u16 = 1;

#[derive(PartialEq, Eq, Debug, Clone, Hash, Copy)]
pub enum QueryType {
    UNKNOWN(u16),
    A,     // 1
    NS,    // 2
    CNAME, // 5
    MX,    // 15
    AAAA,  // 28
}

impl QueryType {
    #[inline]
    pub fn from_u16(val: u16) -> QueryType {
        match val {
            1 => QueryType::A,
            2 => QueryType::NS,
            5 => QueryType::CNAME,
            15 => QueryType::MX,
            28 => QueryType::AAAA,
            _ => QueryType::UNKNOWN(val),
        }
    }

    #[inline]
    pub fn to_u16(&self) -> u16 {
        match self {
            QueryType::A => 1,
            QueryType::NS => 2,
            QueryType::CNAME => 5,
            QueryType::MX => 15,
            QueryType::AAAA => 28,
            QueryType::UNKNOWN(val) => *val,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::UNKNOWN(val) => write!(f, "TYPE{}", val),
            known => write!(f, "{:?}", known),
        }
    }
}

impl FromStr for QueryType {
    type Err = ResolveError;

    // mnemonic, or the RFC 3597 TYPEnnn form
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "A" => Ok(QueryType::A),
            "NS" => Ok(QueryType::NS),
            "CNAME" => Ok(QueryType::CNAME),
            "MX" => Ok(QueryType::MX),
            "AAAA" => Ok(QueryType::AAAA),
            other => other
                .strip_prefix("TYPE")
                .and_then(|n| n.parse::<u16>().ok())
                .map(QueryType::from_u16)
                .ok_or_else(|| ResolveError::InvalidLabel(format!("unknown record type {}", s))),
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub struct DnsQuestion {
    pub qname: Name,
    pub qtype: QueryType,
    pub qclass: u16,
}

impl DnsQuestion {
    pub fn new(qname: Name, qtype: QueryType) -> Self {
        DnsQuestion {
            qname,
            qtype,
            qclass: CLASS_IN,
        }
    }

    pub fn read(buf: &mut PacketBuffer) -> Result<Self> {
        let qname = buf.read_name()?;
        let qtype = QueryType::from_u16(buf.read_u16()?);
        let qclass = buf.read_u16()?;

        Ok(DnsQuestion {
            qname,
            qtype,
            qclass,
        })
    }

    pub fn write(&self, buf: &mut PacketBuffer) -> Result<()> {
        buf.write_name(&self.qname)?;
        buf.write_u16(self.qtype.to_u16())?;
        buf.write_u16(self.qclass)?;
        Ok(())
    }
}
