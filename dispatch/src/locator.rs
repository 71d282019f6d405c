//! Finds the routing engine next to each execution unit and checks that it answers.

use crate::client::OsrmClient;
use crate::pool::ExecutionPool;
use crate::requests::{Endpoint, RouteRequest};
use crate::schema::{validate, RouteResponse};
use common::types::config::{NamedResolver, ProbeConfig, ResolverConfig};
use common::types::options::RouteOptions;
use hashbrown::HashSet;
use log::{debug, info, warn};
use std::fmt;
use std::fmt::Display;
use std::process::Command;
use std::sync::Arc;

/// Tells an execution unit at which host its co-located engine listens
pub trait AddressResolver: Send + Sync {
    fn resolve(&self) -> Result<String, LocatorError>;
}

#[derive(Debug, Clone)]
pub struct FixedResolver {
    host: String,
}

impl FixedResolver {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn loopback() -> Self {
        Self::new("127.0.0.1")
    }
}

impl AddressResolver for FixedResolver {
    fn resolve(&self) -> Result<String, LocatorError> {
        Ok(self.host.clone())
    }
}

/// First address reported by `hostname -I`, i.e. the host's address on the cluster network
#[derive(Debug, Clone, Default)]
pub struct HostnameResolver;

impl AddressResolver for HostnameResolver {
    fn resolve(&self) -> Result<String, LocatorError> {
        let output = Command::new("hostname").arg("-I").output()?;
        if !output.status.success() {
            return Err(LocatorError::NoAddress);
        }

        first_address(&String::from_utf8_lossy(&output.stdout))
            .map(str::to_string)
            .ok_or(LocatorError::NoAddress)
    }
}

fn first_address(output: &str) -> Option<&str> {
    output.split_whitespace().next()
}

pub fn resolver_from_config(config: &ResolverConfig) -> Arc<dyn AddressResolver> {
    match config {
        ResolverConfig::Named(NamedResolver::Loopback) => Arc::new(FixedResolver::loopback()),
        ResolverConfig::Named(NamedResolver::Hostname) => Arc::new(HostnameResolver),
        ResolverConfig::Fixed { fixed } => Arc::new(FixedResolver::new(fixed.clone())),
    }
}

/// How any execution unit reaches its local engine
#[derive(Clone)]
pub struct Locality {
    resolver: Arc<dyn AddressResolver>,
    port: u16,
}

impl Locality {
    pub fn new(resolver: Arc<dyn AddressResolver>, port: u16) -> Self {
        Self { resolver, port }
    }

    /// Endpoint of the engine next to the calling unit
    pub fn local_endpoint(&self) -> Result<Endpoint, LocatorError> {
        Ok(Endpoint::new(self.resolver.resolve()?, self.port))
    }
}

/// Asks every execution unit for its local endpoint. Units on the same host report the same
/// address, so the set has one entry per host.
///
/// Computed fresh on every call; the pool may have been resized since.
pub fn discover_endpoints(pool: &ExecutionPool, locality: &Locality) -> Result<HashSet<Endpoint>, LocatorError> {
    let endpoints = pool.broadcast(|_| locality.local_endpoint())
        .into_iter()
        .collect::<Result<HashSet<_>, _>>()?;

    info!(target: "locator", "Found {} engine endpoint(s) for {} execution unit(s)", endpoints.len(), pool.units());
    Ok(endpoints)
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Reachable,
    Unreachable(String),
}

impl HealthStatus {
    pub fn is_reachable(&self) -> bool {
        matches!(self, HealthStatus::Reachable)
    }
}

impl Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HealthStatus::Reachable => write!(f, "reachable"),
            HealthStatus::Unreachable(reason) => write!(f, "unreachable ({reason})"),
        }
    }
}

/// Sends the probe route to the endpoint. A failed probe is reported, never raised.
pub fn verify_endpoint(client: &OsrmClient, endpoint: &Endpoint, probe: &ProbeConfig) -> HealthStatus {
    let request = RouteRequest {
        index: 0,
        origin: probe.origin,
        destination: probe.destination,
        options: Arc::new(RouteOptions { alternatives: false, ..RouteOptions::default() }),
    };

    let response = client.dispatch(&request, endpoint);
    let status = match validate::<RouteResponse>(&response) {
        Ok(parsed) if parsed.is_ok() => HealthStatus::Reachable,
        Ok(parsed) => HealthStatus::Unreachable(format!("probe answered with code '{}'", parsed.code)),
        Err(err) => HealthStatus::Unreachable(err.to_string()),
    };

    debug!(target: "locator", "{}: {}", endpoint, status);
    status
}

/// Probes every endpoint, in address order
pub fn verify_all(
    client: &OsrmClient,
    endpoints: &HashSet<Endpoint>,
    probe: &ProbeConfig,
) -> Vec<(Endpoint, HealthStatus)> {
    let mut endpoints = endpoints.iter().cloned().collect::<Vec<_>>();
    endpoints.sort();

    let report = endpoints.into_iter()
        .map(|endpoint| {
            let status = verify_endpoint(client, &endpoint, probe);
            (endpoint, status)
        })
        .collect::<Vec<_>>();

    let unreachable = report.iter().filter(|(_, status)| !status.is_reachable()).count();
    if unreachable > 0 {
        warn!(target: "locator", "{} of {} engine endpoint(s) failed the probe", unreachable, report.len());
    }

    report
}

#[derive(thiserror::Error, Debug)]
pub enum LocatorError {
    Command(#[from] std::io::Error),
    NoAddress,
}

impl Display for LocatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LocatorError::Command(err) => write!(f, "Could not ask the host for its address: {err}"),
            LocatorError::NoAddress => write!(f, "The host reported no address"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{dead_endpoint, spawn_fake_engine, NO_ROUTE_ORIGIN};
    use common::types::Coordinate;
    use std::time::Duration;

    fn client() -> OsrmClient {
        OsrmClient::new("driving", Duration::from_secs(5), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_first_address() {
        assert_eq!(first_address("10.0.1.5 172.17.0.1 \n"), Some("10.0.1.5"));
        assert_eq!(first_address("  \n"), None);
    }

    #[test]
    fn test_resolver_from_config() {
        let fixed = resolver_from_config(&ResolverConfig::Fixed { fixed: "10.1.2.3".into() });
        assert_eq!(fixed.resolve().unwrap(), "10.1.2.3");

        let loopback = resolver_from_config(&ResolverConfig::default());
        assert_eq!(loopback.resolve().unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_discover_deduplicates_units_on_one_host() {
        let pool = ExecutionPool::new(Some(4)).unwrap();
        let locality = Locality::new(Arc::new(FixedResolver::loopback()), 5000);

        let endpoints = discover_endpoints(&pool, &locality).unwrap();
        assert_eq!(endpoints.len(), 1);
        assert!(endpoints.contains(&Endpoint::new("127.0.0.1", 5000)));
    }

    #[test]
    fn test_verify_endpoint() {
        let engine = spawn_fake_engine();
        let probe = ProbeConfig::default();

        assert_eq!(verify_endpoint(&client(), &engine.endpoint, &probe), HealthStatus::Reachable);

        let status = verify_endpoint(&client(), &dead_endpoint(), &probe);
        assert!(!status.is_reachable());

        let no_route = ProbeConfig { origin: NO_ROUTE_ORIGIN, destination: Coordinate::new(5.0, 5.0) };
        assert!(matches!(
            verify_endpoint(&client(), &engine.endpoint, &no_route),
            HealthStatus::Unreachable(reason) if reason.starts_with("Schema mismatch")
        ));
    }

    #[test]
    fn test_verify_all_reports_every_endpoint() {
        let engine = spawn_fake_engine();
        let dead = dead_endpoint();
        let endpoints = HashSet::from([engine.endpoint.clone(), dead.clone()]);

        let report = verify_all(&client(), &endpoints, &ProbeConfig::default());
        assert_eq!(report.len(), 2);

        let mut expected = vec![engine.endpoint.clone(), dead];
        expected.sort();
        assert_eq!(report.iter().map(|(endpoint, _)| endpoint.clone()).collect::<Vec<_>>(), expected);
        assert_eq!(report.iter().filter(|(_, status)| status.is_reachable()).count(), 1);
    }
}
