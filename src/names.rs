//! Human-readable names for lights, keyed by serial number
//!
//! ```toml
//! [lights]
//! "94103EA2B27751AF" = "desk"
//! ```
use std::{collections::HashMap, fs, path::Path};

use crate::{
    devices::BridgeLight,
    error::{Error, Result},
};

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct LightNames {
    #[serde(default)]
    pub lights: HashMap<String, String>,
}

impl LightNames {
    pub fn from_toml(source: &str) -> Result<LightNames> {
        Ok(toml::from_str(source)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<LightNames> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    /// Configured name, falling back to the name the bridge reports
    pub fn name_for<'a>(&'a self, light: &'a BridgeLight) -> &'a str {
        self.lights
            .get(light.serial())
            .map(String::as_str)
            .unwrap_or_else(|| light.friendly_name())
    }

    /// Re-key lights from serial number to name
    ///
    /// Lights sharing a name are keyed as `name (SERIAL)` so none is lost.
    pub fn directory(
        &self,
        lights: HashMap<String, BridgeLight>,
    ) -> HashMap<String, BridgeLight> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for light in lights.values() {
            *counts.entry(self.name_for(light).to_string()).or_insert(0) += 1;
        }

        lights
            .into_iter()
            .map(|(serial, light)| {
                let name = self.name_for(&light).to_string();
                if counts[&name] > 1 {
                    (format!("{} ({})", name, serial), light)
                } else {
                    (name, light)
                }
            })
            .collect()
    }

    /// Find a light by configured name, then reported name, then serial number
    pub fn find<'a>(
        &self,
        lights: &'a HashMap<String, BridgeLight>,
        query: &str,
    ) -> Result<&'a BridgeLight> {
        let configured = unique(lights, query, |light| {
            self.lights
                .get(light.serial())
                .map_or(false, |name| name.eq_ignore_ascii_case(query))
        })?;
        if let Some(light) = configured {
            return Ok(light);
        }
        if let Some(light) = unique(lights, query, |light| {
            light.friendly_name().eq_ignore_ascii_case(query)
        })? {
            return Ok(light);
        }
        unique(lights, query, |light| light.serial().eq_ignore_ascii_case(query))?
            .ok_or_else(|| Error::Other(format!("No light named {}", query)))
    }
}

// The single light `matches` accepts; more than one is an error
fn unique<'a, F>(
    lights: &'a HashMap<String, BridgeLight>,
    query: &str,
    matches: F,
) -> Result<Option<&'a BridgeLight>>
where
    F: Fn(&BridgeLight) -> bool,
{
    let mut found: Vec<&BridgeLight> = lights.values().filter(|light| matches(*light)).collect();
    if found.len() > 1 {
        let mut serials: Vec<&str> = found.iter().map(|light| light.serial()).collect();
        serials.sort_unstable();
        return Err(Error::Other(format!(
            "{} names more than one light: {}",
            query,
            serials.join(", ")
        )));
    }
    Ok(found.pop())
}
