use std::time::Duration;

use wemolinker::{
    capabilities::{ColourTemperature, DeviceActions, Switch},
    datatypes::Capability,
    devices::Bridge,
    discovery::discover,
    effects::Sweep,
    waveform::{plot, Waveform},
};

fn main() {
    let lights = discover()
        .unwrap()
        .iter()
        .flat_map(|(addr, description)| {
            Bridge::from_description(*addr, description)
                .unwrap()
                .lights()
                .unwrap()
                .into_iter()
                .map(|(_, light)| light)
        })
        .collect::<Vec<_>>();

    let brightness = Waveform::brightness(40).periods(2.0);
    let temperature = Waveform::temperature(40);
    print!("{}", plot(&brightness.values(), 72, 12));

    let sweep = Sweep {
        delay: Duration::from_millis(300),
        transition: Duration::from_millis(200),
        repeat: 3,
    };

    loop {
        for light in &lights {
            let _ = light.switch_on();
            let _ = sweep.brightness(light, &brightness.brightness_levels());
            if light.supports(Capability::ColorTemperature) {
                let _ = sweep.temperature(light, &temperature.temperatures());
                let _ = light.set_color_temp(2700);
            }
        }
    }
}
