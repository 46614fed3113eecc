use std::net::Ipv4Addr;

use crate::error::{ResolveError, Result};
use crate::packetbuff::PacketBuffer;

use super::{
    header::DnsHeader,
    name::Name,
    question::{DnsQuestion, QueryType},
    record::{DnsRecord, RecordData},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsPacket {
    pub header: DnsHeader,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsRecord>,
    pub authorities: Vec<DnsRecord>,
    pub additionals: Vec<DnsRecord>,
}

impl DnsPacket {
    pub fn new() -> Self {
        DnsPacket {
            header: DnsHeader::new(),
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    // single question query, recursion not desired
    pub fn query(id: u16, question: DnsQuestion) -> Self {
        let mut packet = DnsPacket::new();
        packet.header.id = id;
        packet.add_question(question);
        packet
    }

    // records in the answer section owned by `name` with the given type
    pub fn answers_for<'a>(
        &'a self,
        name: &'a Name,
        qtype: QueryType,
    ) -> impl Iterator<Item = &'a DnsRecord> {
        self.answers
            .iter()
            .filter(move |record| &record.name == name && record.rtype() == qtype)
    }

    // the canonical name if the answer section aliases `name`
    pub fn cname_for(&self, name: &Name) -> Option<(&DnsRecord, &Name)> {
        self.answers.iter().find_map(|record| match &record.data {
            RecordData::CNAME(target) if &record.name == name => Some((record, target)),
            _ => None,
        })
    }

    // iterate over the name servers in the authorities that are responsible
    // for `qname`, yielding (zone, nameserver)
    pub fn referrals<'a>(&'a self, qname: &'a Name) -> impl Iterator<Item = (&'a Name, &'a Name)> {
        self.authorities
            .iter()
            .filter_map(move |record| match &record.data {
                RecordData::NS(ns) if qname.is_subdomain_of(&record.name) => {
                    Some((&record.name, ns))
                }
                _ => None,
            })
    }

    // addresses for a name server carried in the additionals
    pub fn glue_for<'a>(&'a self, ns: &'a Name) -> impl Iterator<Item = Ipv4Addr> + 'a {
        self.additionals
            .iter()
            .filter_map(move |record| match &record.data {
                RecordData::A(addr) if &record.name == ns => Some(*addr),
                _ => None,
            })
    }

    pub fn read(buf: &mut PacketBuffer) -> Result<Self> {
        let header = DnsHeader::read(buf)?;

        // each entry takes at least 5 bytes (questions) or 11 bytes (records),
        // so don't trust the counts for preallocation
        let mut questions = Vec::new();
        for _ in 0..header.qdcount {
            questions.push(DnsQuestion::read(buf)?);
        }

        let answers = read_records(buf, header.ancount)?;
        let authorities = read_records(buf, header.nscount)?;
        let additionals = read_records(buf, header.arcount)?;

        if buf.remaining() != 0 {
            return Err(ResolveError::malformed(format!(
                "{} bytes after the last declared record",
                buf.remaining()
            )));
        }

        Ok(DnsPacket {
            header,
            questions,
            answers,
            authorities,
            additionals,
        })
    }

    pub fn write(&self, buf: &mut PacketBuffer) -> Result<()> {
        self.header.write(buf)?;

        for q in &self.questions {
            q.write(buf)?;
        }

        for a in &self.answers {
            a.write(buf)?;
        }

        for a in &self.authorities {
            a.write(buf)?;
        }

        for a in &self.additionals {
            a.write(buf)?;
        }

        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = PacketBuffer::new();
        self.write(&mut buf)?;
        Ok(buf.into_vec())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        DnsPacket::read(&mut PacketBuffer::from_bytes(bytes))
    }

    pub fn add_question(&mut self, question: DnsQuestion) {
        self.questions.push(question);
        self.header.qdcount += 1;
    }

    pub fn add_answer(&mut self, answer: DnsRecord) {
        self.answers.push(answer);
        self.header.ancount += 1;
    }

    pub fn add_authority(&mut self, authority: DnsRecord) {
        self.authorities.push(authority);
        self.header.nscount += 1;
    }

    pub fn add_additional(&mut self, additional: DnsRecord) {
        self.additionals.push(additional);
        self.header.arcount += 1;
    }
}

impl Default for DnsPacket {
    fn default() -> Self {
        Self::new()
    }
}

fn read_records(buf: &mut PacketBuffer, count: u16) -> Result<Vec<DnsRecord>> {
    let mut records = Vec::new();
    for _ in 0..count {
        records.push(DnsRecord::read(buf)?);
    }
    Ok(records)
}

/// Serializes a header followed by a single question.
pub fn encode_query(header: &DnsHeader, question: &DnsQuestion) -> Result<Vec<u8>> {
    let mut buf = PacketBuffer::new();
    header.write(&mut buf)?;
    question.write(&mut buf)?;
    Ok(buf.into_vec())
}

/// Parses a complete message, every section in order.
pub fn decode_message(bytes: &[u8]) -> Result<DnsPacket> {
    DnsPacket::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::parse(s).unwrap()
    }

    // a root server style referral for example.com, compressed the way
    // real servers do it
    fn referral_bytes() -> Vec<u8> {
        let mut msg = vec![
            0x04, 0xD2, // id 1234
            0x80, 0x00, // QR
            0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01,
        ];
        // question at 12: example.com A IN
        msg.extend_from_slice(&name("example.com").to_wire());
        msg.extend_from_slice(&[0, 1, 0, 1]);
        // authority: com NS a.gtld-servers.net, owner points at "com" (offset 20)
        msg.extend_from_slice(&[0xC0, 20, 0, 2, 0, 1, 0, 2, 0xA3, 0x00]);
        let ns_start = msg.len() + 2;
        let ns = name("a.gtld-servers.net").to_wire();
        msg.extend_from_slice(&(ns.len() as u16).to_be_bytes());
        msg.extend_from_slice(&ns);
        // additional: glue, owner points at the NS target
        msg.extend_from_slice(&[0xC0, ns_start as u8, 0, 1, 0, 1, 0, 2, 0xA3, 0x00, 0, 4]);
        msg.extend_from_slice(&[192, 5, 6, 30]);
        msg
    }

    #[test]
    fn encodes_query() {
        let mut header = DnsHeader::with_flags(22, 0x0100).unwrap();
        header.qdcount = 1;
        let question = DnsQuestion::new(name("dns.google.com"), QueryType::A);

        let bytes = encode_query(&header, &question).unwrap();
        assert_eq!(&bytes[..12], &[0, 22, 1, 0, 0, 1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            &bytes[12..],
            &[3, 100, 110, 115, 6, 103, 111, 111, 103, 108, 101, 3, 99, 111, 109, 0, 0, 1, 0, 1]
        );
    }

    #[test]
    fn query_packet_matches_encode_query() {
        let question = DnsQuestion::new(name("example.com"), QueryType::NS);
        let packet = DnsPacket::query(0xABCD, question.clone());
        assert!(!packet.header.rd);
        assert_eq!(
            packet.to_bytes().unwrap(),
            encode_query(&packet.header, &question).unwrap()
        );
    }

    #[test]
    fn decodes_compressed_referral() {
        let packet = decode_message(&referral_bytes()).unwrap();
        assert!(packet.header.qr);
        assert_eq!(packet.header.id, 1234);
        assert_eq!(packet.questions.len(), 1);
        assert!(packet.answers.is_empty());

        let qname = name("example.com");
        let referrals: Vec<_> = packet.referrals(&qname).collect();
        assert_eq!(referrals, vec![(&name("com"), &name("a.gtld-servers.net"))]);

        let glue: Vec<_> = packet.glue_for(&name("a.gtld-servers.net")).collect();
        assert_eq!(glue, vec![Ipv4Addr::new(192, 5, 6, 30)]);

        // the zone must contain the query name
        assert_eq!(packet.referrals(&name("example.org")).count(), 0);
    }

    #[test]
    fn variable_size_answers_decode_sequentially() {
        let mut packet = DnsPacket::new();
        packet.header.qr = true;
        packet.add_question(DnsQuestion::new(name("www.example.com"), QueryType::A));
        packet.add_answer(DnsRecord::new(
            name("www.example.com"),
            60,
            RecordData::CNAME(name("a-much-longer-canonical-name.example.net")),
        ));
        packet.add_answer(DnsRecord::new(
            name("a-much-longer-canonical-name.example.net"),
            60,
            RecordData::A(Ipv4Addr::new(10, 0, 0, 1)),
        ));
        packet.add_answer(DnsRecord::new(
            name("a-much-longer-canonical-name.example.net"),
            60,
            RecordData::A(Ipv4Addr::new(10, 0, 0, 2)),
        ));

        let decoded = decode_message(&packet.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, packet);

        let target = name("a-much-longer-canonical-name.example.net");
        let (_, cname) = decoded.cname_for(&name("www.example.com")).unwrap();
        assert_eq!(cname, &target);
        assert_eq!(decoded.answers_for(&target, QueryType::A).count(), 2);
    }

    #[test]
    fn truncated_messages_are_malformed() {
        let bytes = referral_bytes();
        for len in 0..bytes.len() {
            assert!(
                matches!(
                    decode_message(&bytes[..len]),
                    Err(ResolveError::MalformedMessage(_))
                ),
                "prefix of {} bytes",
                len
            );
        }
    }

    #[test]
    fn counts_beyond_content_are_malformed() {
        let mut bytes = referral_bytes();
        bytes[7] = 5; // ancount
        assert!(matches!(
            decode_message(&bytes),
            Err(ResolveError::MalformedMessage(_))
        ));
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let mut bytes = referral_bytes();
        bytes.push(0);
        assert!(matches!(
            decode_message(&bytes),
            Err(ResolveError::MalformedMessage(_))
        ));
    }

    #[test]
    fn looping_owner_name_is_reported() {
        let mut bytes = referral_bytes();
        // point the authority owner name at itself
        let owner = 12 + name("example.com").wire_len() + 4;
        bytes[owner + 1] = owner as u8;
        assert!(matches!(
            decode_message(&bytes),
            Err(ResolveError::CompressionLoop(_))
        ));
    }
}
