// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Discovery Scope
//!
//! The user-declared boundary of a discovery session: the set of domains,
//! addresses, CIDR prefixes, and AS numbers inside which results are kept.
//! Assets outside the scope are dropped at dispatch time as `NotInScope`
//! (counted, never logged at error level).

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::entities::asset::Asset;

/// In-scope domains, addresses, CIDR prefixes, and AS numbers.
///
/// Matching rules per asset kind:
///
/// - **FQDN / WHOIS / email**: the name (or address domain) equals or is a
///   subdomain of a scope domain
/// - **IP address**: the address is listed explicitly or contained in a
///   scope CIDR
/// - **Netblock**: the block is a subnet of (or equal to) a scope CIDR
/// - **Autonomous system**: the AS number is listed
/// - **RIR organization / TLS certificate**: always admitted; they only
///   arrive as products of in-scope assets and carry no address of their own
///
/// An empty scope admits nothing: every asset is `NotInScope`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// In-scope registered domains
    #[serde(default)]
    pub domains: Vec<String>,
    /// Individually listed in-scope addresses
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
    /// In-scope CIDR prefixes
    #[serde(default)]
    pub cidrs: Vec<IpNet>,
    /// In-scope autonomous system numbers
    #[serde(default)]
    pub asns: Vec<u32>,
}

impl Scope {
    /// Creates an empty scope (admits nothing)
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a domain, canonicalizing case and trailing dot
    pub fn add_domain(mut self, domain: impl AsRef<str>) -> Self {
        self.domains
            .push(domain.as_ref().trim().trim_end_matches('.').to_lowercase());
        self
    }

    /// Adds an explicit address
    pub fn add_address(mut self, address: IpAddr) -> Self {
        self.addresses.push(address);
        self
    }

    /// Adds a CIDR prefix
    pub fn add_cidr(mut self, cidr: IpNet) -> Self {
        self.cidrs.push(cidr.trunc());
        self
    }

    /// Adds an AS number
    pub fn add_asn(mut self, asn: u32) -> Self {
        self.asns.push(asn);
        self
    }

    /// Checks whether the scope admits anything at all
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.addresses.is_empty() && self.cidrs.is_empty() && self.asns.is_empty()
    }

    /// Checks whether a bare name falls under a scope domain
    pub fn contains_name(&self, name: &str) -> bool {
        let name = name.trim_end_matches('.').to_lowercase();
        self.domains
            .iter()
            .any(|d| name == *d || name.ends_with(&format!(".{}", d)))
    }

    /// Checks whether an address is in scope
    pub fn contains_address(&self, address: IpAddr) -> bool {
        self.addresses.contains(&address) || self.cidrs.iter().any(|cidr| cidr.contains(&address))
    }

    /// Checks whether an asset falls inside the scope boundary
    pub fn in_scope(&self, asset: &Asset) -> bool {
        match asset {
            Asset::Fqdn(fqdn) => self.contains_name(fqdn.name()),
            Asset::IpAddress(ip) => self.contains_address(ip.address()),
            Asset::Netblock(nb) => self
                .cidrs
                .iter()
                .any(|cidr| cidr.contains(&nb.cidr()) || *cidr == nb.cidr()),
            Asset::AutonomousSystem(asn) => self.asns.contains(&asn.number()),
            Asset::WhoisRecord(w) => self.contains_name(w.domain()),
            Asset::EmailAddress(e) => self.contains_name(e.domain()),
            // Products of in-scope discovery; no address of their own.
            Asset::RirOrganization(_) | Asset::TlsCertificate(_) => !self.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::asset::{AutonomousSystem, Fqdn, IpAddress, Netblock};

    fn scope() -> Scope {
        Scope::new()
            .add_domain("Example.COM.")
            .add_cidr("10.0.0.0/16".parse().unwrap())
            .add_asn(64512)
    }

    #[test]
    fn test_domain_and_subdomain_in_scope() {
        let s = scope();
        assert!(s.in_scope(&Asset::Fqdn(Fqdn::new("example.com").unwrap())));
        assert!(s.in_scope(&Asset::Fqdn(Fqdn::new("mail.example.com").unwrap())));
        assert!(!s.in_scope(&Asset::Fqdn(Fqdn::new("notexample.com").unwrap())));
    }

    #[test]
    fn test_address_matches_cidr_membership() {
        let s = scope();
        assert!(s.in_scope(&Asset::IpAddress(IpAddress::parse("10.0.3.7").unwrap())));
        assert!(!s.in_scope(&Asset::IpAddress(IpAddress::parse("192.0.2.1").unwrap())));
    }

    #[test]
    fn test_netblock_must_be_subnet_of_scope_cidr() {
        let s = scope();
        assert!(s.in_scope(&Asset::Netblock(Netblock::parse("10.0.4.0/24").unwrap())));
        assert!(s.in_scope(&Asset::Netblock(Netblock::parse("10.0.0.0/16").unwrap())));
        assert!(!s.in_scope(&Asset::Netblock(Netblock::parse("10.0.0.0/8").unwrap())));
    }

    #[test]
    fn test_asn_listed_in_scope() {
        let s = scope();
        assert!(s.in_scope(&Asset::AutonomousSystem(AutonomousSystem::new(64512))));
        assert!(!s.in_scope(&Asset::AutonomousSystem(AutonomousSystem::new(64513))));
    }

    #[test]
    fn test_empty_scope_admits_nothing() {
        let s = Scope::new();
        assert!(s.is_empty());
        assert!(!s.in_scope(&Asset::Fqdn(Fqdn::new("example.com").unwrap())));
        assert!(!s.in_scope(&Asset::AutonomousSystem(AutonomousSystem::new(1))));
    }

    #[test]
    fn test_explicit_address_listed() {
        let s = Scope::new().add_address("192.0.2.9".parse().unwrap());
        assert!(s.contains_address("192.0.2.9".parse().unwrap()));
        assert!(!s.contains_address("192.0.2.10".parse().unwrap()));
    }
}
