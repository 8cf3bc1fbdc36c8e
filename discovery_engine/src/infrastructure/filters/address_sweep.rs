// /////////////////////////////////////////////////////////////////////////////
// Discovery Engine
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Address Sweep Planning
//!
//! Bounds speculative reverse-DNS exploration around an in-scope address.
//! Given an address, the planner derives the surrounding CIDR (from a
//! cached netblock when the session knows one, else a conservative default
//! prefix), generates a bounded neighborhood of addresses centred on the
//! input, and drops addresses the session cache has already observed. The
//! caller issues untrusted reverse-DNS queries only for the returned
//! candidates.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use discovery_engine_domain::entities::asset::{Asset, AssetType, IpAddress};
use discovery_engine_domain::services::cache_service::AssetCacheService;

/// Default neighborhood size for passive sessions
pub const DEFAULT_SWEEP_SIZE: usize = 50;

/// Neighborhood size when the session allows active behavior
pub const ACTIVE_SWEEP_SIZE: usize = 100;

/// Hard cap on a single sweep regardless of configuration
pub const MAX_SWEEP_SIZE: usize = 250;

/// Default prefix length when no cached netblock covers a v4 address
pub const DEFAULT_V4_PREFIX: u8 = 18;

/// Default prefix length when no cached netblock covers a v6 address
pub const DEFAULT_V6_PREFIX: u8 = 64;

/// Plans a reverse-DNS sweep around `address`.
///
/// Returns the neighborhood of `address` inside its governing CIDR, closest
/// addresses first, excluding `address` itself and every address the cache
/// has already observed. The neighborhood size is [`DEFAULT_SWEEP_SIZE`]
/// ([`ACTIVE_SWEEP_SIZE`] when `active`), clamped to [`MAX_SWEEP_SIZE`].
pub fn plan_sweep(address: IpAddr, cache: &dyn AssetCacheService, active: bool) -> Vec<IpAddr> {
    let cidr = governing_cidr(address, cache);
    let size = if active { ACTIVE_SWEEP_SIZE } else { DEFAULT_SWEEP_SIZE }.min(MAX_SWEEP_SIZE);

    neighborhood(address, cidr, size)
        .into_iter()
        .filter(|candidate| {
            cache
                .get_asset(&Asset::IpAddress(IpAddress::new(*candidate)))
                .is_none()
        })
        .collect()
}

/// Derives the CIDR governing a sweep: the cached netblock containing the
/// address, else the default prefix for the address family.
pub fn governing_cidr(address: IpAddr, cache: &dyn AssetCacheService) -> IpNet {
    let cached = cache
        .assets_by_type(AssetType::Netblock)
        .into_iter()
        .filter_map(|record| match record.asset {
            Asset::Netblock(nb) if nb.contains(address) => Some(nb.cidr()),
            _ => None,
        })
        // Prefer the most specific covering block.
        .max_by_key(|cidr| cidr.prefix_len());

    cached.unwrap_or_else(|| default_cidr(address))
}

fn default_cidr(address: IpAddr) -> IpNet {
    match address {
        IpAddr::V4(v4) => IpNet::V4(
            Ipv4Net::new(v4, DEFAULT_V4_PREFIX)
                .expect("default v4 prefix is valid")
                .trunc(),
        ),
        IpAddr::V6(v6) => IpNet::V6(
            Ipv6Net::new(v6, DEFAULT_V6_PREFIX)
                .expect("default v6 prefix is valid")
                .trunc(),
        ),
    }
}

/// Generates up to `size` addresses inside `cidr`, nearest to `center`
/// first, alternating below and above. The center itself is excluded.
fn neighborhood(center: IpAddr, cidr: IpNet, size: usize) -> Vec<IpAddr> {
    let (lo, hi) = range(&cidr);
    let origin = to_u128(center);
    let mut out = Vec::with_capacity(size);

    let mut offset: u128 = 1;
    while out.len() < size {
        let below = origin.checked_sub(offset).filter(|v| *v >= lo);
        let above = origin.checked_add(offset).filter(|v| *v <= hi);
        if below.is_none() && above.is_none() {
            // Block exhausted on both sides.
            break;
        }
        if let Some(v) = below {
            out.push(from_u128(center, v));
        }
        if out.len() < size {
            if let Some(v) = above {
                out.push(from_u128(center, v));
            }
        }
        offset += 1;
    }
    out
}

fn range(cidr: &IpNet) -> (u128, u128) {
    (to_u128(cidr.network()), to_u128(cidr.broadcast()))
}

fn to_u128(address: IpAddr) -> u128 {
    match address {
        IpAddr::V4(v4) => u32::from(v4) as u128,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn from_u128(family_of: IpAddr, value: u128) -> IpAddr {
    match family_of {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::from(value as u32)),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from(value)),
    }
}
