//! Discover devices on the local network asynchronously
//!
use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    time::Duration,
};

use tokio::{net::UdpSocket, time::timeout as tokio_timeout};

use crate::{
    datatypes::DeviceDescription,
    discovery::{location_addr, record_response, search_request, SSDP_ADDR},
    error::Result,
};

async fn describe(
    client: &reqwest::Client,
    location: &str,
) -> Result<(SocketAddr, DeviceDescription)> {
    let addr = location_addr(location)?;
    let xml = client.get(location).send().await?.text().await?;
    Ok((addr, DeviceDescription::from_xml(&xml)?))
}

/// Discover WeMo bridges on the local network
pub async fn with_timeout(timeout: Duration) -> Result<Vec<(SocketAddr, DeviceDescription)>> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;

    let req = search_request();

    for _ in 0_u8..3 {
        socket.send_to(req.as_bytes(), SSDP_ADDR).await?;
    }

    let mut buf = [0_u8; 4096];

    let mut locations = HashSet::new();
    while let Ok(Ok((size, addr))) = tokio_timeout(timeout, socket.recv_from(&mut buf)).await {
        record_response(&mut locations, addr, &String::from_utf8_lossy(&buf[0..size]));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let mut devices = HashMap::new();
    for location in locations {
        match describe(&client, &location).await {
            Ok((addr, description)) if description.is_bridge() => {
                devices.insert(addr, description);
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(%location, error = %err, "skipping undescribable device"),
        }
    }

    Ok(devices.into_iter().collect())
}

/// Discover WeMo bridges on the local network
///
/// Uses the default timeout of 3 seconds.
pub async fn discover() -> Result<Vec<(SocketAddr, DeviceDescription)>> {
    with_timeout(Duration::from_secs(3)).await
}
