use crate::error::{Error, Result};
use crate::source::NumberSource;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use tracing::{error, info};

/// Public address used to pick the outbound interface. Nothing is sent to it.
const DEFAULT_PROBE_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

/// Resolves the network address this process reaches the outside world from.
///
/// The address must stay the same for the lifetime of the process, since the
/// shard id derived from it is baked into every id.
pub trait AddressResolver {
    fn resolve(&self) -> io::Result<IpAddr>;
}

/// A fixed address resolves to itself.
impl AddressResolver for IpAddr {
    fn resolve(&self) -> io::Result<IpAddr> {
        Ok(*self)
    }
}

/// Finds the outbound address by connecting a UDP socket toward a public
/// address and reading back the local end.
///
/// Connecting a UDP socket only selects a route, so no packet leaves the host.
#[derive(Debug, Clone, Copy)]
pub struct UdpProbeResolver {
    target: SocketAddr,
}

impl Default for UdpProbeResolver {
    fn default() -> Self {
        Self {
            target: DEFAULT_PROBE_TARGET,
        }
    }
}

impl UdpProbeResolver {
    pub fn new(target: SocketAddr) -> Self {
        Self { target }
    }
}

impl AddressResolver for UdpProbeResolver {
    fn resolve(&self) -> io::Result<IpAddr> {
        let bind_addr: SocketAddr = if self.target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.connect(self.target)?;
        let ip = socket.local_addr()?.ip();
        if ip.is_unspecified() {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no route to probe target",
            ));
        }
        Ok(ip)
    }
}

/// A shard source derived from the process's outbound network address.
///
/// The address is resolved once, up front. The returned number is the full
/// folded address; the generator truncates it to its shard bit budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressShard {
    address: IpAddr,
    shard: i64,
}

impl AddressShard {
    /// Resolves the outbound address through `resolver`.
    ///
    /// Fails with [`Error::ShardResolution`] when no address can be found.
    /// Callers must not fall back to some default shard here: two processes
    /// sharing a shard id can mint colliding ids.
    pub fn resolve<R: AddressResolver + ?Sized>(resolver: &R) -> Result<Self> {
        match resolver.resolve() {
            Ok(address) => {
                let shard = Self::from_address(address);
                info!(%address, shard = shard.shard, "resolved shard id from outbound address");
                Ok(shard)
            }
            Err(err) => {
                error!(error = %err, "failed to resolve outbound address for shard id");
                Err(Error::ShardResolution(err.to_string()))
            }
        }
    }

    pub fn from_address(address: IpAddr) -> Self {
        Self {
            address,
            shard: fold_address(address),
        }
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn shard(&self) -> i64 {
        self.shard
    }
}

impl NumberSource for AddressShard {
    fn next_number(&self) -> i64 {
        self.shard
    }
}

/// Folds the first 8 octets of an address into an integer, big-endian.
fn fold_address(address: IpAddr) -> i64 {
    let octets: Vec<u8> = match address {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    };
    octets
        .iter()
        .take(8)
        .fold(0_i64, |num, &byte| (num << 8) | i64::from(byte))
}
