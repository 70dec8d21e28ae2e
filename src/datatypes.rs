use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

pub const BRIDGE_DEVICE_TYPE: &str = "urn:Belkin:device:bridge:1";
pub const BRIDGE_SERVICE: &str = "urn:Belkin:service:bridge:1";
pub const BRIDGE_CONTROL_PATH: &str = "/upnp/control/bridge1";

/// Warmest colour temperature a tunable bulb accepts, in Kelvin
pub const MIN_KELVIN: u16 = 2700;
/// Coolest colour temperature a tunable bulb accepts, in Kelvin
pub const MAX_KELVIN: u16 = 6500;

pub fn kelvin_to_mireds(kelvin: u16) -> u16 {
    (1_000_000.0 / f64::from(kelvin.max(1))).round() as u16
}

pub fn mireds_to_kelvin(mireds: u16) -> u16 {
    (1_000_000.0 / f64::from(mireds.max(1))).round() as u16
}

#[derive(Debug, Deserialize, Default)]
struct DescriptionRoot {
    #[serde(default)]
    device: DeviceDescription,
}

/// Device description served at the `LOCATION` of an SSDP response
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    pub serial_number: String,
    #[serde(rename = "UDN")]
    pub udn: String,
}

impl DeviceDescription {
    pub fn from_xml(xml: &str) -> Result<DeviceDescription> {
        let root: DescriptionRoot = serde_xml_rs::from_str(xml)?;
        if root.device.udn.is_empty() {
            return Err(Error::Other(String::from("Device description has no UDN")));
        }
        Ok(root.device)
    }

    pub fn is_bridge(&self) -> bool {
        self.device_type == BRIDGE_DEVICE_TYPE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    OnOff,
    LevelControl,
    SleepFader,
    LevelMove,
    LevelStop,
    ColorControl,
    ColorTemperature,
}

impl Capability {
    pub fn id(self) -> &'static str {
        match self {
            Capability::OnOff => "10006",
            Capability::LevelControl => "10008",
            Capability::SleepFader => "30008",
            Capability::LevelMove => "30009",
            Capability::LevelStop => "3000A",
            Capability::ColorControl => "10300",
            Capability::ColorTemperature => "30301",
        }
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(id: &str) -> Result<Capability> {
        match id.trim().to_ascii_uppercase().as_str() {
            "10006" => Ok(Capability::OnOff),
            "10008" => Ok(Capability::LevelControl),
            "30008" => Ok(Capability::SleepFader),
            "30009" => Ok(Capability::LevelMove),
            "3000A" => Ok(Capability::LevelStop),
            "10300" => Ok(Capability::ColorControl),
            "30301" => Ok(Capability::ColorTemperature),
            other => Err(Error::Other(format!("Unknown capability {}", other))),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.id())
    }
}

fn parse_capabilities(ids: &str) -> Vec<Capability> {
    ids.split(',').filter_map(|id| id.parse().ok()).collect()
}

/// Readings of a light, paired from a capability id list and a value list
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct LightState {
    pub on: Option<bool>,
    pub level: Option<u8>,
    pub mireds: Option<u16>,
}

impl LightState {
    pub fn parse(capability_ids: &str, values: &str) -> LightState {
        let mut state = LightState::default();
        for (id, value) in capability_ids.split(',').zip(values.split(',')) {
            // "level:transition" and friends, only the reading matters
            let reading = value.split(':').next().unwrap_or("").trim();
            if reading.is_empty() {
                continue;
            }
            match id.parse::<Capability>() {
                Ok(Capability::OnOff) => state.on = reading.parse::<u8>().ok().map(|on| on > 0),
                Ok(Capability::LevelControl) => state.level = reading.parse().ok(),
                Ok(Capability::ColorTemperature) => state.mireds = reading.parse().ok(),
                _ => {}
            }
        }
        state
    }

    pub fn kelvin(&self) -> Option<u16> {
        self.mireds.filter(|mireds| *mireds > 0).map(mireds_to_kelvin)
    }
}

/// Reply of `GetEndDevices`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeviceLists {
    #[serde(rename = "DeviceList", default)]
    pub device_lists: Vec<DeviceList>,
}

impl DeviceLists {
    pub fn from_xml(xml: &str) -> Result<DeviceLists> {
        // a bridge without paired lights answers "0"
        if !xml.trim_start().starts_with('<') {
            return Ok(DeviceLists::default());
        }
        Ok(serde_xml_rs::from_str(xml)?)
    }

    /// Every paired light, whether grouped or not
    pub fn devices(&self) -> Vec<&DeviceInfo> {
        self.device_lists
            .iter()
            .flat_map(|list| {
                list.device_infos.devices.iter().chain(
                    list.group_infos
                        .groups
                        .iter()
                        .flat_map(|group| group.device_infos.devices.iter()),
                )
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeviceList {
    #[serde(rename = "DeviceListType", default)]
    pub list_type: String,
    #[serde(rename = "DeviceInfos", default)]
    pub device_infos: DeviceInfos,
    #[serde(rename = "GroupInfos", default)]
    pub group_infos: GroupInfos,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeviceInfos {
    #[serde(rename = "DeviceInfo", default)]
    pub devices: Vec<DeviceInfo>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GroupInfos {
    #[serde(rename = "GroupInfo", default)]
    pub groups: Vec<GroupInfo>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GroupInfo {
    #[serde(rename = "GroupID")]
    pub group_id: String,
    #[serde(rename = "GroupName")]
    pub group_name: String,
    #[serde(rename = "GroupCapabilityIDs")]
    pub capability_ids: String,
    #[serde(rename = "GroupCapabilityValues")]
    pub capability_values: String,
    #[serde(rename = "DeviceInfos")]
    pub device_infos: DeviceInfos,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct DeviceInfo {
    pub device_index: String,
    /// Serial number of the bulb, used to address it through the bridge
    #[serde(rename = "DeviceID")]
    pub device_id: String,
    pub friendly_name: String,
    pub firmware_version: String,
    #[serde(rename = "CapabilityIDs")]
    pub capability_ids: String,
    pub current_state: String,
    pub manufacturer: String,
    pub model_code: String,
    #[serde(rename = "productName")]
    pub product_name: String,
}

impl DeviceInfo {
    pub fn capabilities(&self) -> Vec<Capability> {
        parse_capabilities(&self.capability_ids)
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// State reported when the device list was fetched
    pub fn state(&self) -> LightState {
        LightState::parse(&self.capability_ids, &self.current_state)
    }
}

/// Reply of `GetDeviceStatus`
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeviceStatusList {
    #[serde(rename = "DeviceStatus", default)]
    pub statuses: Vec<DeviceStatus>,
}

impl DeviceStatusList {
    pub fn from_xml(xml: &str) -> Result<DeviceStatusList> {
        Ok(serde_xml_rs::from_str(xml)?)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct DeviceStatus {
    pub is_group_action: String,
    #[serde(rename = "DeviceID")]
    pub device_id: DeviceId,
    #[serde(rename = "CapabilityID")]
    pub capability_ids: String,
    pub capability_value: String,
}

impl DeviceStatus {
    pub fn state(&self) -> LightState {
        LightState::parse(&self.capability_ids, &self.capability_value)
    }

    pub fn is_available(&self) -> bool {
        self.device_id.available != "NO"
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeviceId {
    #[serde(default)]
    pub available: String,
    #[serde(rename = "$value", default)]
    pub id: String,
}

/// Document sent as the `DeviceStatusList` argument of `SetDeviceStatus`
pub fn set_status_document(device_id: &str, capability: Capability, value: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            "<DeviceStatus><IsGroupAction>NO</IsGroupAction>",
            r#"<DeviceID available="YES">{}</DeviceID>"#,
            "<CapabilityID>{}</CapabilityID>",
            "<CapabilityValue>{}</CapabilityValue>",
            "</DeviceStatus>",
        ),
        device_id, capability, value
    )
}
