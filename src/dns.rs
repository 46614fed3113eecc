pub mod header;
pub mod name;
pub mod packet;
pub mod question;
pub mod record;

pub use header::{DnsHeader, ResultCode};
pub use name::Name;
pub use packet::{decode_message, encode_query, DnsPacket};
pub use question::{DnsQuestion, QueryType};
pub use record::{DnsRecord, RecordData};
