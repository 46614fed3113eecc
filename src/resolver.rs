//! Iterative resolution from the root hints down to an authoritative answer.
//!
//! Each step asks one name server, then either returns its answer, follows
//! a CNAME, or follows a referral to the name servers of a closer zone.
//! Glue from the additional section is used when present; otherwise the
//! name server names are themselves resolved first.

use std::collections::{HashSet, VecDeque};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::dns::{DnsPacket, DnsQuestion, DnsRecord, Name, QueryType, RecordData, ResultCode};
use crate::error::{ResolveError, Result};
use crate::rootserver;
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Where every resolution chain starts, tried in order.
    pub root_hints: Vec<Ipv4Addr>,
    pub port: u16,
    /// Per exchange.
    pub timeout: Duration,
    /// Extra attempts against the same server after a timeout or a bogus reply.
    pub retries: usize,
    /// Referrals followed per top-level call, nested lookups included.
    pub max_referrals: usize,
    /// How deep name server address lookups may nest.
    pub max_nesting: usize,
    pub max_cname_chain: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            root_hints: rootserver::ALL.to_vec(),
            port: 53,
            timeout: Duration::from_secs(2),
            retries: 2,
            max_referrals: 20,
            max_nesting: 4,
            max_cname_chain: 8,
        }
    }
}

impl ResolverConfig {
    pub fn with_root_hints<I: IntoIterator<Item = Ipv4Addr>>(mut self, hints: I) -> Self {
        self.root_hints = hints.into_iter().collect();
        self
    }
}

/// The result of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// The name that was asked for, before any CNAME was followed.
    pub name: Name,
    pub qtype: QueryType,
    /// CNAMEs followed, in order, then the records of the requested type.
    /// Only the CNAMEs, or nothing, when the name has no records of that type.
    pub records: Vec<DnsRecord>,
    /// The server that gave the final answer.
    pub server: SocketAddr,
    pub authoritative: bool,
}

impl Answer {
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.records.iter().filter_map(|record| match record.data {
            RecordData::A(addr) => Some(addr),
            _ => None,
        })
    }

    /// True when no record has the requested type, even if CNAMEs were followed.
    pub fn is_nodata(&self) -> bool {
        !self.records.iter().any(|record| record.rtype() == self.qtype)
    }
}

pub struct Resolver<T> {
    transport: T,
    config: ResolverConfig,
}

// state owned by one top-level resolve call
struct Lookup {
    rng: StdRng,
    referrals: usize,
    exchanges: usize,
    // delegations whose name servers had no reachable address
    dead_zones: HashSet<Name>,
}

enum Outcome {
    Answer(Answer),
    // the chain of CNAMEs seen and the name it ends at
    Alias(Vec<DnsRecord>, Name),
}

impl<T: Transport> Resolver<T> {
    pub fn new(transport: T, config: ResolverConfig) -> Self {
        Resolver { transport, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolves `hostname` iteratively, starting at the root hints.
    pub async fn resolve(&self, hostname: &str, qtype: QueryType) -> Result<Answer> {
        let name = Name::parse(hostname)?;

        let mut state = Lookup {
            rng: StdRng::from_entropy(),
            referrals: 0,
            exchanges: 0,
            dead_zones: HashSet::new(),
        };

        let result = self.lookup(&mut state, name, qtype, 0).await;

        debug!(
            name = hostname,
            qtype = %qtype,
            exchanges = state.exchanges,
            referrals = state.referrals,
            ok = result.is_ok(),
            "resolution finished"
        );

        result
    }

    // resolve `name`, following CNAMEs from the root each time
    fn lookup<'a>(
        &'a self,
        state: &'a mut Lookup,
        name: Name,
        qtype: QueryType,
        depth: usize,
    ) -> BoxFuture<'a, Result<Answer>> {
        async move {
            let mut aliases: Vec<DnsRecord> = Vec::new();
            let mut current = name.clone();

            loop {
                match self.iterate(state, &current, qtype, depth).await? {
                    Outcome::Answer(mut answer) => {
                        aliases.append(&mut answer.records);
                        answer.records = aliases;
                        answer.name = name;
                        return Ok(answer);
                    }
                    Outcome::Alias(mut chain, target) => {
                        aliases.append(&mut chain);
                        if aliases.len() > self.config.max_cname_chain {
                            return Err(ResolveError::MaxReferralDepthExceeded(
                                self.config.max_cname_chain,
                            ));
                        }

                        info!(alias = %current, canonical = %target, "following CNAME");
                        current = target;
                    }
                }
            }
        }
        .boxed()
    }

    // walk the referral chain for one name
    async fn iterate(
        &self,
        state: &mut Lookup,
        name: &Name,
        qtype: QueryType,
        depth: usize,
    ) -> Result<Outcome> {
        let mut candidates: VecDeque<Ipv4Addr> = self.config.root_hints.iter().copied().collect();
        let mut visited: HashSet<Ipv4Addr> = HashSet::new();
        let mut zone = Name::root();
        let mut last_error: Option<ResolveError> = None;

        while let Some(ns) = candidates.pop_front() {
            if !visited.insert(ns) {
                continue;
            }
            let server = SocketAddr::new(ns.into(), self.config.port);

            let response = match self.query(state, server, name, qtype).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(server = %server, error = %e, "failing over to next server");
                    last_error = Some(e);
                    continue;
                }
            };

            match response.header.result_code() {
                ResultCode::NOERROR => {}
                ResultCode::NXDOMAIN => return Err(ResolveError::NameNotFound(name.to_string())),
                rcode => {
                    warn!(server = %server, rcode = ?rcode, "server failure, failing over");
                    last_error = Some(ResolveError::ServerFailure(rcode));
                    continue;
                }
            }

            if let Some(outcome) = self.answer_from(&response, name, qtype, server) {
                return Ok(outcome);
            }

            // only referrals to a zone strictly below the current one are progress
            let referred: Vec<(&Name, &Name)> = response
                .referrals(name)
                .filter(|(child, _)| child.is_subdomain_of(&zone) && *child != &zone)
                .collect();

            let Some(&(child_zone, _)) = referred.first() else {
                if response.header.aa {
                    // the name exists, just not with this type
                    return Ok(Outcome::Answer(Answer {
                        name: name.clone(),
                        qtype,
                        records: Vec::new(),
                        server,
                        authoritative: true,
                    }));
                }

                warn!(server = %server, name = %name, "no answer and no usable referral");
                last_error = Some(ResolveError::NoProgress(format!(
                    "{} gave neither answer nor referral for {}",
                    server, name
                )));
                continue;
            };
            let child_zone = child_zone.clone();

            let mut ns_names: Vec<Name> = Vec::new();
            for (_, ns_name) in referred.iter().filter(|(z, _)| **z == child_zone) {
                if !ns_names.contains(ns_name) {
                    ns_names.push((*ns_name).clone());
                }
            }

            state.referrals += 1;
            if state.referrals > self.config.max_referrals {
                return Err(ResolveError::MaxReferralDepthExceeded(
                    self.config.max_referrals,
                ));
            }

            let mut next: Vec<Ipv4Addr> = Vec::new();
            for ns_name in &ns_names {
                for addr in response.glue_for(ns_name) {
                    if !next.contains(&addr) {
                        next.push(addr);
                    }
                }
            }

            if next.is_empty() {
                // siblings of this server hand out the same delegation
                if state.dead_zones.contains(&child_zone) {
                    return Err(unreachable_zone(&child_zone));
                }

                next = self
                    .resolve_nameservers(state, &ns_names, &child_zone, depth)
                    .await?;

                if next.is_empty() {
                    warn!(zone = %child_zone, "no address for any name server");
                    state.dead_zones.insert(child_zone.clone());
                    return Err(unreachable_zone(&child_zone));
                }
            }

            let fresh: VecDeque<Ipv4Addr> =
                next.into_iter().filter(|addr| !visited.contains(addr)).collect();
            if fresh.is_empty() {
                return Err(ResolveError::NoProgress(format!(
                    "referral for {} loops back to visited servers",
                    child_zone
                )));
            }

            info!(
                name = %name,
                zone = %child_zone,
                servers = fresh.len(),
                "following referral"
            );

            candidates = fresh;
            zone = child_zone;
            last_error = None;
        }

        Err(last_error.unwrap_or_else(|| {
            ResolveError::NoProgress(format!("no name servers left for {}", name))
        }))
    }

    // a direct answer, or the CNAME chain the response carries for `name`
    fn answer_from(
        &self,
        response: &DnsPacket,
        name: &Name,
        qtype: QueryType,
        server: SocketAddr,
    ) -> Option<Outcome> {
        let mut chain: Vec<DnsRecord> = Vec::new();
        let mut owner = name;

        loop {
            let records: Vec<DnsRecord> = response.answers_for(owner, qtype).cloned().collect();
            if !records.is_empty() {
                chain.extend(records);
                return Some(Outcome::Answer(Answer {
                    name: name.clone(),
                    qtype,
                    records: chain,
                    server,
                    authoritative: response.header.aa,
                }));
            }

            match response.cname_for(owner) {
                Some((record, target)) if chain.len() <= self.config.max_cname_chain => {
                    chain.push(record.clone());
                    owner = target;
                }
                _ => break,
            }
        }

        if chain.is_empty() {
            None
        } else {
            Some(Outcome::Alias(chain, owner.clone()))
        }
    }

    // addresses for glueless name servers, stopping at the first that resolves
    async fn resolve_nameservers(
        &self,
        state: &mut Lookup,
        ns_names: &[Name],
        zone: &Name,
        depth: usize,
    ) -> Result<Vec<Ipv4Addr>> {
        if depth >= self.config.max_nesting {
            return Err(ResolveError::MaxReferralDepthExceeded(self.config.max_nesting));
        }

        for ns_name in ns_names {
            // an in-zone name server can't be found without glue
            if ns_name.is_subdomain_of(zone) {
                debug!(ns = %ns_name, zone = %zone, "skipping in-zone name server without glue");
                continue;
            }

            info!(ns = %ns_name, "resolving glueless name server");
            match self.lookup(state, ns_name.clone(), QueryType::A, depth + 1).await {
                Ok(answer) => {
                    let addrs: Vec<Ipv4Addr> = answer.addresses().collect();
                    if !addrs.is_empty() {
                        return Ok(addrs);
                    }
                }
                Err(e @ ResolveError::MaxReferralDepthExceeded(_)) => return Err(e),
                Err(e) => warn!(ns = %ns_name, error = %e, "name server lookup failed"),
            }
        }

        Ok(Vec::new())
    }

    // one question to one server, retried on timeouts and bogus replies
    async fn query(
        &self,
        state: &mut Lookup,
        server: SocketAddr,
        name: &Name,
        qtype: QueryType,
    ) -> Result<DnsPacket> {
        let question = DnsQuestion::new(name.clone(), qtype);
        let mut last_error = ResolveError::Timeout(server);

        for attempt in 0..=self.config.retries {
            let id: u16 = state.rng.gen();
            let query = DnsPacket::query(id, question.clone()).to_bytes()?;

            state.exchanges += 1;
            debug!(server = %server, id, attempt, name = %name, qtype = %qtype, "sending query");

            let reply = match self
                .transport
                .exchange(server, &query, self.config.timeout)
                .await
            {
                Ok(reply) => reply,
                Err(e) if e.is_timeout() => {
                    warn!(server = %server, attempt, "query timed out");
                    last_error = e;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let response = DnsPacket::from_bytes(&reply)?;

            let reason = if !response.header.qr {
                Some("QR bit not set".to_string())
            } else if response.header.id != id {
                Some(format!("id {} does not match query id {}", response.header.id, id))
            } else if response.questions.first().is_some_and(|q| q != &question) {
                Some("question does not match".to_string())
            } else {
                None
            };

            if let Some(reason) = reason {
                warn!(server = %server, reason = %reason, "discarding response");
                last_error = ResolveError::UnexpectedResponse { server, reason };
                continue;
            }

            return Ok(response);
        }

        Err(last_error)
    }
}

fn unreachable_zone(zone: &Name) -> ResolveError {
    ResolveError::NoProgress(format!("no reachable name server for {}", zone))
}
