use wemolinker::{devices::Bridge, discovery::discover};

fn main() {
    for (addr, description) in discover().unwrap() {
        println!("{}\t{}\t{}", addr, description.friendly_name, description.serial_number);
        let bridge = Bridge::from_description(addr, &description).unwrap();
        for (serial, light) in bridge.lights().unwrap() {
            println!("  {}\t{}\t{}", serial, light.friendly_name(), light.info().model_code);
        }
    }
}
