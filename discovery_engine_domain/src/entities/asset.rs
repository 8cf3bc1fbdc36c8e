// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Asset Entity
//!
//! This module defines the asset model at the heart of the discovery engine:
//! a tagged union of the entity kinds the engine can discover, each carrying
//! a typed payload and a canonical key.
//!
//! ## Overview
//!
//! An asset is a semantic identity on the network: a fully-qualified domain
//! name, an IP address, a netblock, an autonomous system, a RIR
//! organization, a TLS certificate, a WHOIS record, or an email address.
//! Handlers consume one asset kind and emit others, and the engine routes
//! events by the [`AssetType`] discriminant.
//!
//! ## Canonical Keys
//!
//! Two assets are equal exactly when they share an asset type and a
//! canonical key. Canonicalization happens at construction, so derived
//! equality and hashing coincide with semantic equality:
//!
//! - FQDN → lower-cased name, trailing dot stripped
//! - IP address → parsed address form (`IpAddr` display)
//! - Netblock → truncated CIDR form (network address + prefix)
//! - Autonomous system → decimal of the AS number
//! - RIR organization → lower-cased name
//! - TLS certificate → lower-cased hex fingerprint
//! - WHOIS record → lower-cased domain
//! - Email address → lower-cased address

use chrono::{DateTime, Utc};
use ipnet::IpNet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::net::IpAddr;
use std::sync::OnceLock;

use crate::EngineError;

/// Matches DNS labels per RFC 1035 with the common relaxation of leading
/// digits and embedded underscores (service labels such as `_dmarc`).
fn fqdn_regex() -> &'static Regex {
    static FQDN_RE: OnceLock<Regex> = OnceLock::new();
    FQDN_RE.get_or_init(|| {
        Regex::new(r"^(\*\.)?([a-z0-9_]([a-z0-9_-]{0,61}[a-z0-9_])?\.)*[a-z0-9_]([a-z0-9_-]{0,61}[a-z0-9_])?$")
            .expect("FQDN regex is valid")
    })
}

/// Discriminant for the asset union.
///
/// The engine keys pipelines, cache buckets, and transformation rules on
/// this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Fully-qualified domain name
    Fqdn,
    /// IPv4 or IPv6 address
    IpAddress,
    /// CIDR netblock
    Netblock,
    /// Autonomous system
    AutonomousSystem,
    /// Regional Internet Registry organization
    RirOrganization,
    /// TLS certificate
    TlsCertificate,
    /// WHOIS registration record
    WhoisRecord,
    /// Email address
    EmailAddress,
}

impl AssetType {
    /// Returns all asset types the engine recognizes
    pub fn all() -> &'static [AssetType] {
        &[
            AssetType::Fqdn,
            AssetType::IpAddress,
            AssetType::Netblock,
            AssetType::AutonomousSystem,
            AssetType::RirOrganization,
            AssetType::TlsCertificate,
            AssetType::WhoisRecord,
            AssetType::EmailAddress,
        ]
    }
}

impl Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetType::Fqdn => "fqdn",
            AssetType::IpAddress => "ip_address",
            AssetType::Netblock => "netblock",
            AssetType::AutonomousSystem => "autonomous_system",
            AssetType::RirOrganization => "rir_organization",
            AssetType::TlsCertificate => "tls_certificate",
            AssetType::WhoisRecord => "whois_record",
            AssetType::EmailAddress => "email_address",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for AssetType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fqdn" => Ok(AssetType::Fqdn),
            "ip_address" | "ipaddress" | "ip" => Ok(AssetType::IpAddress),
            "netblock" => Ok(AssetType::Netblock),
            "autonomous_system" | "as" => Ok(AssetType::AutonomousSystem),
            "rir_organization" | "rirorg" => Ok(AssetType::RirOrganization),
            "tls_certificate" | "tlscert" => Ok(AssetType::TlsCertificate),
            "whois_record" | "whois" => Ok(AssetType::WhoisRecord),
            "email_address" | "email" => Ok(AssetType::EmailAddress),
            _ => Err(EngineError::InvalidConfiguration(format!(
                "Unknown asset type: {}",
                s
            ))),
        }
    }
}

/// Fully-qualified domain name payload.
///
/// The name is validated and lower-cased at construction; a single trailing
/// dot is stripped. Wildcard names (`*.example.com`) are accepted because
/// certificate subjects produce them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fqdn {
    name: String,
}

impl Fqdn {
    /// Creates a validated, canonicalized FQDN.
    ///
    /// # Errors
    /// Returns `EngineError::AssetExtraction` when the name is empty, longer
    /// than 253 octets, or violates label syntax.
    pub fn new(name: impl AsRef<str>) -> Result<Self, EngineError> {
        let canonical = name.as_ref().trim().trim_end_matches('.').to_lowercase();
        if canonical.is_empty() {
            return Err(EngineError::AssetExtraction("Empty FQDN".to_string()));
        }
        if canonical.len() > 253 {
            return Err(EngineError::AssetExtraction(format!(
                "FQDN exceeds 253 octets: {}",
                canonical
            )));
        }
        if !fqdn_regex().is_match(&canonical) {
            return Err(EngineError::AssetExtraction(format!(
                "Invalid FQDN syntax: {}",
                canonical
            )));
        }
        Ok(Self { name: canonical })
    }

    /// Returns the canonical (lower-cased) name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent domain, if any (`www.example.com` → `example.com`)
    pub fn parent(&self) -> Option<Fqdn> {
        let (_, rest) = self.name.split_once('.')?;
        Fqdn::new(rest).ok()
    }

    /// Checks whether this name equals or is a subdomain of `domain`
    pub fn within(&self, domain: &str) -> bool {
        let domain = domain.trim_end_matches('.').to_lowercase();
        self.name == domain || self.name.ends_with(&format!(".{}", domain))
    }
}

/// IP address payload (IPv4 or IPv6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpAddress {
    address: IpAddr,
}

impl IpAddress {
    /// Creates an IP address payload from a parsed address
    pub fn new(address: IpAddr) -> Self {
        Self { address }
    }

    /// Parses an IP address from text.
    ///
    /// # Errors
    /// Returns `EngineError::AssetExtraction` when the text is not a valid
    /// IPv4 or IPv6 address.
    pub fn parse(text: &str) -> Result<Self, EngineError> {
        text.trim()
            .parse::<IpAddr>()
            .map(Self::new)
            .map_err(|e| EngineError::AssetExtraction(format!("Invalid IP address '{}': {}", text, e)))
    }

    /// Returns the parsed address
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Returns true for IPv4 addresses
    pub fn is_ipv4(&self) -> bool {
        self.address.is_ipv4()
    }
}

/// CIDR netblock payload.
///
/// The network is truncated at construction so that `10.0.1.0/16` and
/// `10.0.0.0/16` canonicalize to the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Netblock {
    cidr: IpNet,
}

impl Netblock {
    /// Creates a netblock from a parsed network, truncating host bits
    pub fn new(cidr: IpNet) -> Self {
        Self { cidr: cidr.trunc() }
    }

    /// Parses a netblock from CIDR text.
    ///
    /// # Errors
    /// Returns `EngineError::AssetExtraction` for malformed CIDR notation.
    pub fn parse(text: &str) -> Result<Self, EngineError> {
        text.trim()
            .parse::<IpNet>()
            .map(Self::new)
            .map_err(|e| EngineError::AssetExtraction(format!("Invalid CIDR '{}': {}", text, e)))
    }

    /// Returns the canonical network
    pub fn cidr(&self) -> IpNet {
        self.cidr
    }

    /// Checks whether the block contains the given address
    pub fn contains(&self, address: IpAddr) -> bool {
        self.cidr.contains(&address)
    }
}

/// Autonomous system payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AutonomousSystem {
    number: u32,
}

impl AutonomousSystem {
    /// Creates an autonomous system payload from an AS number
    pub fn new(number: u32) -> Self {
        Self { number }
    }

    /// Returns the AS number
    pub fn number(&self) -> u32 {
        self.number
    }
}

/// Regional Internet Registry organization payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RirOrganization {
    name: String,
    /// Registry that published the organization record (e.g. `ARIN`)
    registry: Option<String>,
}

impl RirOrganization {
    /// Creates a RIR organization payload with a canonicalized name.
    ///
    /// # Errors
    /// Returns `EngineError::AssetExtraction` when the name is empty.
    pub fn new(name: impl AsRef<str>, registry: Option<String>) -> Result<Self, EngineError> {
        let canonical = name.as_ref().trim().to_lowercase();
        if canonical.is_empty() {
            return Err(EngineError::AssetExtraction("Empty RIR organization name".to_string()));
        }
        Ok(Self {
            name: canonical,
            registry,
        })
    }

    /// Returns the canonical organization name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the publishing registry, if known
    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }
}

/// TLS certificate payload, keyed by fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TlsCertificate {
    fingerprint: String,
    common_name: Option<String>,
}

impl TlsCertificate {
    /// Creates a TLS certificate payload from a hex fingerprint.
    ///
    /// # Errors
    /// Returns `EngineError::AssetExtraction` when the fingerprint is empty
    /// or contains non-hex characters.
    pub fn new(fingerprint: impl AsRef<str>, common_name: Option<String>) -> Result<Self, EngineError> {
        let canonical: String = fingerprint
            .as_ref()
            .trim()
            .chars()
            .filter(|c| *c != ':')
            .collect::<String>()
            .to_lowercase();
        if canonical.is_empty() || !canonical.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(EngineError::AssetExtraction(format!(
                "Invalid certificate fingerprint: {}",
                fingerprint.as_ref()
            )));
        }
        Ok(Self {
            fingerprint: canonical,
            common_name,
        })
    }

    /// Returns the canonical fingerprint
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Returns the subject common name, if captured
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }
}

/// WHOIS registration record payload, keyed by domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WhoisRecord {
    domain: String,
}

impl WhoisRecord {
    /// Creates a WHOIS record payload for a domain.
    ///
    /// # Errors
    /// Returns `EngineError::AssetExtraction` when the domain is empty.
    pub fn new(domain: impl AsRef<str>) -> Result<Self, EngineError> {
        let canonical = domain.as_ref().trim().trim_end_matches('.').to_lowercase();
        if canonical.is_empty() {
            return Err(EngineError::AssetExtraction("Empty WHOIS domain".to_string()));
        }
        Ok(Self { domain: canonical })
    }

    /// Returns the canonical domain
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// Email address payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress {
    address: String,
}

impl EmailAddress {
    /// Creates an email address payload.
    ///
    /// # Errors
    /// Returns `EngineError::AssetExtraction` when the address has no `@` or
    /// an empty local/domain part.
    pub fn new(address: impl AsRef<str>) -> Result<Self, EngineError> {
        let canonical = address.as_ref().trim().to_lowercase();
        match canonical.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self { address: canonical })
            }
            _ => Err(EngineError::AssetExtraction(format!(
                "Invalid email address: {}",
                address.as_ref()
            ))),
        }
    }

    /// Returns the canonical address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the domain part of the address
    pub fn domain(&self) -> &str {
        self.address.split_once('@').map(|(_, d)| d).unwrap_or("")
    }
}

/// The asset union routed through the engine.
///
/// Handlers pattern-match on the variant they consume; receiving a different
/// variant is the `AssetExtraction` error branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Asset {
    Fqdn(Fqdn),
    IpAddress(IpAddress),
    Netblock(Netblock),
    AutonomousSystem(AutonomousSystem),
    RirOrganization(RirOrganization),
    TlsCertificate(TlsCertificate),
    WhoisRecord(WhoisRecord),
    EmailAddress(EmailAddress),
}

impl Asset {
    /// Returns the discriminant for this asset
    pub fn asset_type(&self) -> AssetType {
        match self {
            Asset::Fqdn(_) => AssetType::Fqdn,
            Asset::IpAddress(_) => AssetType::IpAddress,
            Asset::Netblock(_) => AssetType::Netblock,
            Asset::AutonomousSystem(_) => AssetType::AutonomousSystem,
            Asset::RirOrganization(_) => AssetType::RirOrganization,
            Asset::TlsCertificate(_) => AssetType::TlsCertificate,
            Asset::WhoisRecord(_) => AssetType::WhoisRecord,
            Asset::EmailAddress(_) => AssetType::EmailAddress,
        }
    }

    /// Returns the canonical key identifying this asset within its type
    pub fn canonical_key(&self) -> String {
        match self {
            Asset::Fqdn(f) => f.name().to_string(),
            Asset::IpAddress(ip) => ip.address().to_string(),
            Asset::Netblock(nb) => nb.cidr().to_string(),
            Asset::AutonomousSystem(asn) => asn.number().to_string(),
            Asset::RirOrganization(org) => org.name().to_string(),
            Asset::TlsCertificate(cert) => cert.fingerprint().to_string(),
            Asset::WhoisRecord(w) => w.domain().to_string(),
            Asset::EmailAddress(e) => e.address().to_string(),
        }
    }

    /// Returns the `(type, key)` pair used by relations and the cache
    pub fn key(&self) -> AssetKey {
        AssetKey {
            asset_type: self.asset_type(),
            key: self.canonical_key(),
        }
    }

    /// Extracts the FQDN payload or reports the variant mismatch.
    ///
    /// # Errors
    /// Returns `EngineError::AssetExtraction` when the asset is not an FQDN.
    pub fn as_fqdn(&self) -> Result<&Fqdn, EngineError> {
        match self {
            Asset::Fqdn(f) => Ok(f),
            other => Err(EngineError::AssetExtraction(format!(
                "Expected fqdn asset, got {}",
                other.asset_type()
            ))),
        }
    }

    /// Extracts the IP address payload or reports the variant mismatch.
    ///
    /// # Errors
    /// Returns `EngineError::AssetExtraction` when the asset is not an IP
    /// address.
    pub fn as_ip_address(&self) -> Result<&IpAddress, EngineError> {
        match self {
            Asset::IpAddress(ip) => Ok(ip),
            other => Err(EngineError::AssetExtraction(format!(
                "Expected ip_address asset, got {}",
                other.asset_type()
            ))),
        }
    }

    /// Extracts the netblock payload or reports the variant mismatch.
    ///
    /// # Errors
    /// Returns `EngineError::AssetExtraction` when the asset is not a
    /// netblock.
    pub fn as_netblock(&self) -> Result<&Netblock, EngineError> {
        match self {
            Asset::Netblock(nb) => Ok(nb),
            other => Err(EngineError::AssetExtraction(format!(
                "Expected netblock asset, got {}",
                other.asset_type()
            ))),
        }
    }
}

impl Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.asset_type(), self.canonical_key())
    }
}

/// Canonical `(type, key)` reference to an asset.
///
/// Relations store keys rather than asset payloads, so an edge never keeps a
/// stale copy of either endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey {
    /// Asset type of the referenced asset
    pub asset_type: AssetType,
    /// Canonical key within the type bucket
    pub key: String,
}

impl Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.asset_type, self.key)
    }
}

/// Stored cache record for an asset, stamped with discovery timestamps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// The asset payload
    pub asset: Asset,
    /// First time the asset was observed in this session
    pub created_at: DateTime<Utc>,
    /// Most recent time the asset was observed in this session
    pub last_seen: DateTime<Utc>,
}

impl AssetRecord {
    /// Creates a record stamped with the current instant
    pub fn new(asset: Asset) -> Self {
        let now = Utc::now();
        Self {
            asset,
            created_at: now,
            last_seen: now,
        }
    }

    /// Refreshes the last-seen stamp
    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}
