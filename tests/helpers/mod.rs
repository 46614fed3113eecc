#![allow(dead_code)]
use std::collections::{HashMap, VecDeque};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use recursor::{
    DnsPacket, DnsQuestion, DnsRecord, Name, RecordData, ResolveError, ResolverConfig, ResultCode,
    Transport,
};

pub const ROOT_A: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
pub const ROOT_B: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

pub fn name(s: &str) -> Name {
    Name::parse(s).unwrap()
}

pub fn config() -> ResolverConfig {
    ResolverConfig {
        timeout: Duration::from_millis(100),
        retries: 1,
        ..ResolverConfig::default()
    }
    .with_root_hints([ROOT_A, ROOT_B])
}

#[derive(Clone, Debug)]
pub enum Reply {
    // sent back with the query's id and question filled in
    Packet(DnsPacket),
    // like Packet but with the id flipped
    WrongId(DnsPacket),
    Raw(Vec<u8>),
    // raw bytes with the query's id written over the first two
    Wire(Vec<u8>),
    Timeout,
    TransportError,
}

#[derive(Clone, Debug)]
pub struct Exchange {
    pub server: SocketAddr,
    pub id: u16,
    pub question: DnsQuestion,
}

/// Scripted transport: replies are looked up by server and question name.
/// The last reply in a script repeats once the others are used up.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<(Ipv4Addr, Name), VecDeque<Reply>>>,
    exchanges: Mutex<Vec<Exchange>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, server: Ipv4Addr, qname: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert((server, name(qname)), replies.into());
        self
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        self.exchanges.lock().unwrap().clone()
    }

    fn next_reply(&self, server: Ipv4Addr, qname: &Name) -> Reply {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&(server, qname.clone())) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap(),
            Some(script) => script.front().cloned().unwrap_or(Reply::Timeout),
            None => Reply::Packet(failure(ResultCode::REFUSED)),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn exchange(
        &self,
        server: SocketAddr,
        query: &[u8],
        _timeout: Duration,
    ) -> Result<Vec<u8>, ResolveError> {
        let query = DnsPacket::from_bytes(query).expect("resolver sent a malformed query");
        assert_eq!(query.questions.len(), 1);
        assert!(!query.header.qr);
        let question = query.questions[0].clone();

        self.exchanges.lock().unwrap().push(Exchange {
            server,
            id: query.header.id,
            question: question.clone(),
        });

        let SocketAddr::V4(v4) = server else {
            panic!("unexpected IPv6 server {}", server);
        };

        match self.next_reply(*v4.ip(), &question.qname) {
            Reply::Packet(packet) => respond(packet, query.header.id, question),
            Reply::WrongId(packet) => respond(packet, !query.header.id, question),
            Reply::Raw(bytes) => Ok(bytes),
            Reply::Wire(mut bytes) => {
                bytes[..2].copy_from_slice(&query.header.id.to_be_bytes());
                Ok(bytes)
            }
            Reply::Timeout => Err(ResolveError::Timeout(server)),
            Reply::TransportError => Err(ResolveError::TransportError(format!(
                "connection refused by {}",
                server
            ))),
        }
    }
}

fn respond(mut packet: DnsPacket, id: u16, question: DnsQuestion) -> Result<Vec<u8>, ResolveError> {
    packet.header.id = id;
    packet.header.qr = true;
    packet.questions = vec![question];
    packet.header.qdcount = 1;
    packet.to_bytes()
}

pub fn a(owner: &str, addr: Ipv4Addr) -> DnsRecord {
    DnsRecord::new(name(owner), 300, RecordData::A(addr))
}

pub fn cname(owner: &str, target: &str) -> DnsRecord {
    DnsRecord::new(name(owner), 300, RecordData::CNAME(name(target)))
}

/// Authoritative answer carrying `records`.
pub fn answer(records: Vec<DnsRecord>) -> DnsPacket {
    let mut packet = DnsPacket::new();
    packet.header.aa = true;
    for record in records {
        packet.add_answer(record);
    }
    packet
}

/// Delegation of `zone` to `servers`, with glue where an address is given.
pub fn referral(zone: &str, servers: &[(&str, Option<Ipv4Addr>)]) -> DnsPacket {
    let mut packet = DnsPacket::new();
    for (ns, glue) in servers {
        packet.add_authority(DnsRecord::new(name(zone), 172800, RecordData::NS(name(ns))));
        if let Some(addr) = glue {
            packet.add_additional(a(ns, *addr));
        }
    }
    packet
}

pub fn failure(rcode: ResultCode) -> DnsPacket {
    let mut packet = DnsPacket::new();
    packet.header.set_result_code(rcode);
    packet
}

/// A referral for `qname` (type A) to `zone`, compressed the way real
/// servers send it: the NS owner points into the question, and the glue
/// owner points at the NS target.
pub fn compressed_referral(qname: &str, zone: &str, ns: &str, glue: Ipv4Addr) -> Vec<u8> {
    let mut msg = vec![
        0x00, 0x00, // id, filled in per query
        0x80, 0x00, // QR
        0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01,
    ];
    let qname = name(qname);
    msg.extend_from_slice(&qname.to_wire());
    msg.extend_from_slice(&[0, 1, 0, 1]);

    // the zone is a suffix of the question name
    let skip = qname.labels().count() - name(zone).labels().count();
    let zone_at = 12 + qname.labels().take(skip).map(|l| l.len() + 1).sum::<usize>();
    msg.extend_from_slice(&[0xC0, zone_at as u8, 0, 2, 0, 1, 0, 2, 0xA3, 0x00]);

    let ns_at = msg.len() + 2;
    let ns = name(ns).to_wire();
    msg.extend_from_slice(&(ns.len() as u16).to_be_bytes());
    msg.extend_from_slice(&ns);

    msg.extend_from_slice(&[0xC0, ns_at as u8, 0, 1, 0, 1, 0, 2, 0xA3, 0x00, 0, 4]);
    msg.extend_from_slice(&glue.octets());
    msg
}
