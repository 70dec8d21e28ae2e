use std::{
    collections::{HashMap, HashSet},
    net::{SocketAddr, UdpSocket},
    time::Duration,
};

use rayon::prelude::*;
use reqwest::Url;

use crate::{
    datatypes::{DeviceDescription, BRIDGE_DEVICE_TYPE},
    error::{Error, Result},
    protocol::{DefaultProtocol, Protocol},
};

pub(crate) const SSDP_ADDR: &str = "239.255.255.250:1900";

pub(crate) fn search_request() -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\nHOST: {}\r\nMAN: \"ssdp:discover\"\r\nMX: 2\r\nST: {}\r\n\r\n",
        SSDP_ADDR, BRIDGE_DEVICE_TYPE
    )
}

/// `LOCATION` header of an SSDP response
pub(crate) fn parse_location(response: &str) -> Option<String> {
    response.lines().find_map(|line| {
        let (name, value) = line.split_at(line.find(':')?);
        if name.trim().eq_ignore_ascii_case("location") {
            Some(value[1..].trim().to_string())
        } else {
            None
        }
    })
}

/// Keep the location of one SSDP response; false when it carries none
pub(crate) fn record_response(
    locations: &mut HashSet<String>,
    addr: SocketAddr,
    response: &str,
) -> bool {
    tracing::debug!(%addr, %response, "ssdp response");
    match parse_location(response) {
        Some(location) => {
            locations.insert(location);
            true
        }
        None => {
            tracing::warn!(%addr, "ssdp response without a location");
            false
        }
    }
}

/// Address a description URL points at
pub fn location_addr(location: &str) -> Result<SocketAddr> {
    let url = Url::parse(location)
        .map_err(|err| Error::Other(format!("Invalid location {}: {}", location, err)))?;
    url.socket_addrs(|| None)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Other(format!("Location {} has no address", location)))
}

/// Description URL of a device listening on `addr`
pub fn setup_url(addr: SocketAddr) -> String {
    format!("http://{}/setup.xml", addr)
}

pub(crate) fn describe_with<P: Protocol>(
    protocol: &P,
    location: &str,
) -> Result<(SocketAddr, DeviceDescription)> {
    let addr = location_addr(location)?;
    let description = DeviceDescription::from_xml(&protocol.get(location)?)?;
    Ok((addr, description))
}

/// Fetch the description of a single device without searching for it
pub fn describe(location: &str) -> Result<(SocketAddr, DeviceDescription)> {
    describe_with(&DefaultProtocol::new()?, location)
}

/// Discover WeMo bridges on the local network
///
/// Uses the default timeout of 3 seconds.
pub fn discover() -> Result<HashMap<SocketAddr, DeviceDescription>> {
    with_timeout(Duration::from_secs(3))
}

pub fn with_timeout(timeout: Duration) -> Result<HashMap<SocketAddr, DeviceDescription>> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_read_timeout(Some(timeout))?;

    let req = search_request();

    for _ in 0..3 {
        socket.send_to(req.as_bytes(), SSDP_ADDR)?;
    }

    let mut buf = [0u8; 4096];

    let mut locations = HashSet::new();
    while let Ok((size, addr)) = socket.recv_from(&mut buf) {
        record_response(&mut locations, addr, &String::from_utf8_lossy(&buf[0..size]));
    }

    let protocol = DefaultProtocol::new()?;
    Ok(locations
        .into_par_iter()
        .filter_map(|location| match describe_with(&protocol, &location) {
            Ok(device) => Some(device),
            Err(err) => {
                tracing::warn!(%location, error = %err, "skipping undescribable device");
                None
            }
        })
        .filter(|(_, description)| description.is_bridge())
        .collect())
}
