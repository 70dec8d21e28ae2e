//! Timed command sequences
//!
//! Lights act on a command as soon as it arrives and do not queue them, so
//! every command is followed by a fixed pause before the next one is sent.
use std::{thread, time::Duration};

use crate::{
    capabilities::{ColourTemperature, Dimmer, Switch},
    error::Result,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    /// Pause after each command
    pub delay: Duration,
    /// Fade time the light is asked to use for each step
    pub transition: Duration,
    pub repeat: usize,
}

impl Default for Sweep {
    fn default() -> Sweep {
        Sweep {
            delay: Duration::from_millis(500),
            transition: Duration::from_secs(0),
            repeat: 1,
        }
    }
}

impl Sweep {
    pub fn brightness<D: Dimmer + ?Sized>(&self, light: &D, levels: &[u8]) -> Result<()> {
        for _ in 0..self.repeat {
            for level in levels {
                light.set_brightness_with_transition(*level, self.transition)?;
                thread::sleep(self.delay);
            }
        }
        Ok(())
    }

    pub fn temperature<C: ColourTemperature + ?Sized>(
        &self,
        light: &C,
        temperatures: &[u16],
    ) -> Result<()> {
        for _ in 0..self.repeat {
            for kelvin in temperatures {
                light.set_color_temp_with_transition(*kelvin, self.transition)?;
                thread::sleep(self.delay);
            }
        }
        Ok(())
    }
}

/// Turn each light on then off, one after the other
pub fn chase(lights: &[&dyn Switch], delay: Duration, rounds: usize) -> Result<()> {
    for _ in 0..rounds {
        for light in lights {
            light.switch_on()?;
            thread::sleep(delay);
            light.switch_off()?;
            thread::sleep(delay);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::devices::tests::{mock_light, soap_response};
    use crate::protocol::ProtocolMock;
    use crate::waveform::Waveform;

    fn accept(protocol: &ProtocolMock, count: usize) {
        for _ in 0..count {
            protocol.push_response(Ok(soap_response("SetDeviceStatus", "ErrorDeviceIDs", "")));
        }
    }

    fn immediate(repeat: usize) -> Sweep {
        Sweep {
            delay: Duration::from_millis(0),
            transition: Duration::from_millis(500),
            repeat,
        }
    }

    #[test]
    fn brightness_sweep_sends_every_level() {
        let protocol = Rc::new(ProtocolMock::new());
        let light = mock_light(&protocol, "94103EA2B27751AF");
        let levels = Waveform::brightness(6).brightness_levels();
        accept(&protocol, 12);

        immediate(2).brightness(&light, &levels).unwrap();

        let requests = protocol.requests();
        assert_eq!(requests.len(), 13);
        assert!(requests[1]
            .body
            .as_ref()
            .unwrap()
            .contains("&lt;CapabilityValue&gt;255:5&lt;/CapabilityValue&gt;"));
    }

    #[test]
    fn temperature_sweep_stops_on_failure() {
        let protocol = Rc::new(ProtocolMock::new());
        let light = mock_light(&protocol, "84182600000A1B2C");
        accept(&protocol, 1);
        protocol.push_response(Ok(soap_response(
            "SetDeviceStatus",
            "ErrorDeviceIDs",
            "84182600000A1B2C",
        )));

        let result = immediate(1).temperature(&light, &[2700, 4000, 6500]);

        assert!(result.is_err());
        assert_eq!(protocol.requests().len(), 3);
    }

    #[test]
    fn chase_switches_each_light() {
        let protocol = Rc::new(ProtocolMock::new());
        let lounge = mock_light(&protocol, "84182600000A1B2C");
        let hallway = mock_light(&protocol, "94103EA2B27751AF");
        accept(&protocol, 4);

        chase(&[&lounge, &hallway], Duration::from_millis(0), 1).unwrap();

        let requests = protocol.requests();
        assert_eq!(requests.len(), 6);
        assert!(requests[2].body.as_ref().unwrap().contains("84182600000A1B2C"));
        assert!(requests[4].body.as_ref().unwrap().contains("94103EA2B27751AF"));
    }
}
