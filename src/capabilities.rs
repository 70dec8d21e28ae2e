use std::time::Duration;

use crate::{
    datatypes::{kelvin_to_mireds, Capability, LightState, MAX_KELVIN, MIN_KELVIN},
    error::{Error, Result},
};

// Bridges count transitions in tenths of a second
fn tenths(transition: Duration) -> u128 {
    transition.as_millis() / 100
}

pub trait DeviceActions {
    /// Serial number the bridge addresses the light by
    fn device_id(&self) -> &str;

    fn capabilities(&self) -> Vec<Capability>;

    /// Ask the bridge for the light's current readings
    fn status(&self) -> Result<LightState>;

    fn set_capability(&self, capability: Capability, value: &str) -> Result<()>;

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    fn require(&self, capability: Capability) -> Result<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "Light {} does not support capability {}",
                self.device_id(),
                capability
            )))
        }
    }
}

pub trait Switch: DeviceActions {
    fn is_on(&self) -> Result<bool> {
        self.status()?
            .on
            .ok_or_else(|| Error::Other(String::from("No on/off state")))
    }

    fn is_off(&self) -> Result<bool> {
        Ok(!self.is_on()?)
    }

    fn switch_on(&self) -> Result<()> {
        self.require(Capability::OnOff)?;
        self.set_capability(Capability::OnOff, "1")
    }

    fn switch_off(&self) -> Result<()> {
        self.require(Capability::OnOff)?;
        self.set_capability(Capability::OnOff, "0")
    }

    fn toggle(&self) -> Result<bool> {
        if self.is_on()? {
            self.switch_off()?;
            Ok(false)
        } else {
            self.switch_on()?;
            Ok(true)
        }
    }
}

pub trait Dimmer: DeviceActions {
    fn brightness(&self) -> Result<u8> {
        self.status()?
            .level
            .ok_or_else(|| Error::Other(String::from("No brightness level")))
    }

    fn set_brightness(&self, level: u8) -> Result<()> {
        self.set_brightness_with_transition(level, Duration::from_secs(0))
    }

    fn set_brightness_with_transition(&self, level: u8, transition: Duration) -> Result<()> {
        self.require(Capability::LevelControl)?;
        self.set_capability(
            Capability::LevelControl,
            &format!("{}:{}", level, tenths(transition)),
        )
    }
}

pub trait ColourTemperature: DeviceActions {
    /// Current colour temperature in Kelvin
    fn color_temp(&self) -> Result<u16> {
        self.status()?
            .kelvin()
            .ok_or_else(|| Error::Other(String::from("No colour temperature")))
    }

    fn set_color_temp(&self, kelvin: u16) -> Result<()> {
        self.set_color_temp_with_transition(kelvin, Duration::from_secs(0))
    }

    fn set_color_temp_with_transition(&self, kelvin: u16, transition: Duration) -> Result<()> {
        if kelvin < MIN_KELVIN || kelvin > MAX_KELVIN {
            return Err(Error::Other(format!(
                "Invalid colour temperature; must be between {} and {}",
                MIN_KELVIN, MAX_KELVIN
            )));
        }
        self.require(Capability::ColorTemperature)?;
        self.set_capability(
            Capability::ColorTemperature,
            &format!("{}:{}", kelvin_to_mireds(kelvin), tenths(transition)),
        )
    }
}
