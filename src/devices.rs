use std::{collections::HashMap, net::SocketAddr, rc::Rc, str::FromStr};

use crate::{
    capabilities::{ColourTemperature, DeviceActions, Dimmer, Switch},
    datatypes::{
        set_status_document, Capability, DeviceDescription, DeviceInfo, DeviceLists,
        DeviceStatusList, LightState, BRIDGE_CONTROL_PATH, BRIDGE_SERVICE,
    },
    error::{Error, Result},
    protocol::{envelope, response_argument, DefaultProtocol, Protocol},
};

/// A WeMo Link bridge relaying commands to its paired lights
#[derive(Clone)]
pub struct Bridge {
    addr: SocketAddr,
    udn: String,
    protocol: Rc<dyn Protocol>,
}

impl Bridge {
    pub fn new(addr: &str, udn: &str) -> Result<Bridge> {
        Self::from_addr(SocketAddr::from_str(addr)?, udn)
    }

    pub fn from_addr(addr: SocketAddr, udn: &str) -> Result<Bridge> {
        Ok(Self::with_protocol(addr, udn, Rc::new(DefaultProtocol::new()?)))
    }

    pub fn from_description(addr: SocketAddr, description: &DeviceDescription) -> Result<Bridge> {
        Self::from_addr(addr, &description.udn)
    }

    pub fn with_protocol(addr: SocketAddr, udn: &str, protocol: Rc<dyn Protocol>) -> Bridge {
        Bridge {
            addr,
            udn: udn.to_string(),
            protocol,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udn(&self) -> &str {
        &self.udn
    }

    /// Invoke a bridge action and return the requested output argument
    fn call(&self, action: &str, args: &[(&str, &str)], output: &str) -> Result<String> {
        let url = format!("http://{}{}", self.addr, BRIDGE_CONTROL_PATH);
        let soap_action = format!("{}#{}", BRIDGE_SERVICE, action);
        let body = envelope(BRIDGE_SERVICE, action, args);
        let response = self.protocol.post(&url, &soap_action, &body)?;
        response_argument(&response, output)
    }

    pub fn end_devices(&self) -> Result<DeviceLists> {
        let lists = self.call(
            "GetEndDevices",
            &[("DevUDN", self.udn.as_str()), ("ReqListType", "PAIRED_LIST")],
            "DeviceLists",
        )?;
        DeviceLists::from_xml(&lists)
    }

    /// Paired lights keyed by serial number
    pub fn lights(&self) -> Result<HashMap<String, BridgeLight>> {
        Ok(self
            .end_devices()?
            .devices()
            .into_iter()
            .map(|info| {
                (
                    info.device_id.clone(),
                    BridgeLight {
                        bridge: self.clone(),
                        info: info.clone(),
                    },
                )
            })
            .collect())
    }

    pub fn device_status(&self, device_id: &str) -> Result<LightState> {
        let list = self.call(
            "GetDeviceStatus",
            &[("DeviceIDs", device_id)],
            "DeviceStatusList",
        )?;
        let list = DeviceStatusList::from_xml(&list)?;
        let status = list
            .statuses
            .iter()
            .find(|status| status.device_id.id == device_id)
            .ok_or_else(|| Error::Other(format!("No status reported for {}", device_id)))?;
        if !status.is_available() {
            return Err(Error::Other(format!("Light {} is unavailable", device_id)));
        }
        Ok(status.state())
    }

    pub fn set_device_status(
        &self,
        device_id: &str,
        capability: Capability,
        value: &str,
    ) -> Result<()> {
        tracing::info!(device_id, %capability, value, "setting device status");
        let document = set_status_document(device_id, capability, value);
        let failed = self.call(
            "SetDeviceStatus",
            &[("DeviceStatusList", document.as_str())],
            "ErrorDeviceIDs",
        )?;
        if failed.split(',').any(|id| id.trim() == device_id) {
            return Err(Error::Other(format!(
                "Bridge rejected capability {} for {}",
                capability, device_id
            )));
        }
        Ok(())
    }
}

/// A light paired with a bridge
#[derive(Clone)]
pub struct BridgeLight {
    bridge: Bridge,
    info: DeviceInfo,
}

impl BridgeLight {
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn serial(&self) -> &str {
        &self.info.device_id
    }

    pub fn friendly_name(&self) -> &str {
        &self.info.friendly_name
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }
}

impl DeviceActions for BridgeLight {
    fn device_id(&self) -> &str {
        &self.info.device_id
    }

    fn capabilities(&self) -> Vec<Capability> {
        self.info.capabilities()
    }

    fn status(&self) -> Result<LightState> {
        self.bridge.device_status(&self.info.device_id)
    }

    fn set_capability(&self, capability: Capability, value: &str) -> Result<()> {
        self.bridge
            .set_device_status(&self.info.device_id, capability, value)
    }
}

impl Switch for BridgeLight {}
impl Dimmer for BridgeLight {}
impl ColourTemperature for BridgeLight {}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::datatypes::tests::{DEVICE_LISTS_XML, DEVICE_STATUS_XML};
    use crate::protocol::{escape, ProtocolMock};

    pub fn soap_response(action: &str, argument: &str, value: &str) -> String {
        format!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:{0}Response xmlns:u="urn:Belkin:service:bridge:1"><{1}>{2}</{1}></u:{0}Response></s:Body></s:Envelope>"#,
            action,
            argument,
            escape(value)
        )
    }

    pub fn bridge(protocol: &Rc<ProtocolMock>) -> Bridge {
        Bridge::with_protocol(
            "192.168.1.20:49153".parse().unwrap(),
            "uuid:Bridge-1_0-231452B0100A3F",
            protocol.clone(),
        )
    }

    /// Light `serial` out of the device list fixture, talking to `protocol`
    pub fn mock_light(protocol: &Rc<ProtocolMock>, serial: &str) -> BridgeLight {
        protocol.push_response(Ok(soap_response(
            "GetEndDevices",
            "DeviceLists",
            DEVICE_LISTS_XML,
        )));
        bridge(protocol).lights().unwrap().remove(serial).unwrap()
    }

    #[test]
    fn test_bridge_lights() {
        // arrange
        let protocol = Rc::new(ProtocolMock::new());
        protocol.push_response(Ok(soap_response(
            "GetEndDevices",
            "DeviceLists",
            DEVICE_LISTS_XML,
        )));

        // act
        let lights = bridge(&protocol).lights().unwrap();

        // assert
        assert_eq!(lights.len(), 3);
        assert_eq!(lights["94103EA2B27751AF"].friendly_name(), "Hallway");
        assert!(lights.contains_key("94103EA2B2774C3D"));

        let requests = protocol.requests();
        let request = &requests[0];
        assert_eq!(request.url, "http://192.168.1.20:49153/upnp/control/bridge1");
        assert_eq!(
            request.soap_action.as_deref(),
            Some("urn:Belkin:service:bridge:1#GetEndDevices")
        );
        let body = request.body.as_ref().unwrap();
        assert!(body.contains("<DevUDN>uuid:Bridge-1_0-231452B0100A3F</DevUDN>"));
        assert!(body.contains("<ReqListType>PAIRED_LIST</ReqListType>"));
    }

    #[test]
    fn test_bridge_without_lights() {
        let protocol = Rc::new(ProtocolMock::new());
        protocol.push_response(Ok(soap_response("GetEndDevices", "DeviceLists", "0")));

        assert!(bridge(&protocol).lights().unwrap().is_empty());
    }

    #[test]
    fn test_bridge_device_status() {
        let protocol = Rc::new(ProtocolMock::new());
        protocol.push_response(Ok(soap_response(
            "GetDeviceStatus",
            "DeviceStatusList",
            DEVICE_STATUS_XML,
        )));

        let state = bridge(&protocol).device_status("84182600000A1B2C").unwrap();

        assert_eq!(state.level, Some(200));
        assert!(protocol.requests()[0]
            .body
            .as_ref()
            .unwrap()
            .contains("<DeviceIDs>84182600000A1B2C</DeviceIDs>"));
    }

    #[test]
    fn test_bridge_device_status_missing() {
        let protocol = Rc::new(ProtocolMock::new());
        protocol.push_response(Ok(soap_response(
            "GetDeviceStatus",
            "DeviceStatusList",
            DEVICE_STATUS_XML,
        )));

        assert!(bridge(&protocol).device_status("0000000000000000").is_err());
    }

    #[test]
    fn test_bridge_set_device_status_rejected() {
        let protocol = Rc::new(ProtocolMock::new());
        protocol.push_response(Ok(soap_response(
            "SetDeviceStatus",
            "ErrorDeviceIDs",
            "94103EA2B27751AF",
        )));

        let result =
            bridge(&protocol).set_device_status("94103EA2B27751AF", Capability::OnOff, "1");

        assert!(result.is_err());
    }

    const FAULT: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>501</errorCode><errorDescription>Action Failed</errorDescription></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;

    #[test]
    fn test_bridge_fault_on_set_device_status() {
        let protocol = Rc::new(ProtocolMock::new());
        protocol.push_response(Ok(String::from(FAULT)));

        let result =
            bridge(&protocol).set_device_status("94103EA2B27751AF", Capability::OnOff, "1");

        match result {
            Err(Error::Bridge(err)) => {
                assert_eq!(err.error_code, 501);
                assert_eq!(err.error_description, "Action Failed");
            }
            other => panic!("expected a bridge error, got {:?}", other),
        }
    }

    #[test]
    fn test_bridge_fault_on_end_devices() {
        let protocol = Rc::new(ProtocolMock::new());
        protocol.push_response(Ok(String::from(FAULT)));

        match bridge(&protocol).end_devices() {
            Err(Error::Bridge(err)) => assert_eq!(err.error_code, 501),
            Err(err) => panic!("expected a bridge error, got {:?}", err),
            Ok(_) => panic!("expected a bridge error"),
        }
    }

    #[test]
    fn test_bridge_device_status_unavailable() {
        let protocol = Rc::new(ProtocolMock::new());
        protocol.push_response(Ok(soap_response(
            "GetDeviceStatus",
            "DeviceStatusList",
            &DEVICE_STATUS_XML.replace(r#"available="YES""#, r#"available="NO""#),
        )));

        match bridge(&protocol).device_status("84182600000A1B2C") {
            Err(Error::Other(message)) => assert!(message.contains("unavailable")),
            other => panic!("expected an unavailable light, got {:?}", other),
        }
    }

    #[test]
    fn test_bridge_request_failure() {
        let protocol = Rc::new(ProtocolMock::new());
        protocol.push_response(Err(Error::Other(String::from("unreachable"))));

        assert!(bridge(&protocol).end_devices().is_err());
    }
}
