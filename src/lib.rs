//! An RFC 1035 message codec and an iterative resolver that walks the
//! referral chain from the root servers to an authoritative answer.
//!
//! ```no_run
//! use recursor::{QueryType, Resolver, ResolverConfig, UdpTransport};
//!
//! # async fn run() -> recursor::Result<()> {
//! let resolver = Resolver::new(UdpTransport::new(), ResolverConfig::default());
//! let answer = resolver.resolve("dns.google.com", QueryType::A).await?;
//! for addr in answer.addresses() {
//!     println!("{}", addr);
//! }
//! # Ok(())
//! # }
//! ```

pub mod dns;
pub mod error;
pub mod packetbuff;
pub mod resolver;
pub mod transport;

pub use dns::{DnsHeader, DnsPacket, DnsQuestion, DnsRecord, Name, QueryType, RecordData, ResultCode};
pub use error::{ResolveError, Result};
pub use resolver::{Answer, Resolver, ResolverConfig};
pub use transport::{Transport, UdpTransport};

// root servers
pub mod rootserver {
    use std::net::Ipv4Addr;

    pub const A: Ipv4Addr = Ipv4Addr::new(198, 41, 0, 4);
    pub const B: Ipv4Addr = Ipv4Addr::new(170, 247, 170, 2);
    pub const C: Ipv4Addr = Ipv4Addr::new(192, 33, 4, 12);
    pub const D: Ipv4Addr = Ipv4Addr::new(199, 7, 91, 13);
    pub const E: Ipv4Addr = Ipv4Addr::new(192, 203, 230, 10);
    pub const F: Ipv4Addr = Ipv4Addr::new(192, 5, 5, 241);
    pub const G: Ipv4Addr = Ipv4Addr::new(192, 112, 36, 4);
    pub const H: Ipv4Addr = Ipv4Addr::new(198, 97, 190, 53);
    pub const I: Ipv4Addr = Ipv4Addr::new(192, 36, 148, 17);
    pub const J: Ipv4Addr = Ipv4Addr::new(192, 58, 128, 30);
    pub const K: Ipv4Addr = Ipv4Addr::new(193, 0, 14, 129);
    pub const L: Ipv4Addr = Ipv4Addr::new(199, 7, 83, 42);
    pub const M: Ipv4Addr = Ipv4Addr::new(202, 12, 27, 33);

    pub const ALL: [Ipv4Addr; 13] = [A, B, C, D, E, F, G, H, I, J, K, L, M];
}
