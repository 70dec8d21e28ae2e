extern crate wemolinker;

use std::{collections::HashMap, net::SocketAddr, process, time::Duration};

use clap::{value_t, App, AppSettings, Arg, ArgMatches, SubCommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use wemolinker::{
    capabilities::{ColourTemperature, DeviceActions, Dimmer, Switch},
    datatypes::{Capability, DeviceDescription},
    devices::{Bridge, BridgeLight},
    discovery,
    effects::{self, Sweep},
    error::{Error, Result},
    names::LightNames,
    waveform::{self, Waveform},
};

fn find_bridges(host: Option<&str>) -> Result<HashMap<SocketAddr, DeviceDescription>> {
    match host {
        Some(host) => {
            let addr: SocketAddr = host.parse()?;
            Ok(vec![discovery::describe(&discovery::setup_url(addr))?]
                .into_iter()
                .collect())
        }
        None => discovery::discover(),
    }
}

/// Lights of every bridge, keyed by serial number
fn find_lights(host: Option<&str>) -> Result<HashMap<String, BridgeLight>> {
    let mut lights = HashMap::new();
    for (addr, description) in find_bridges(host)? {
        let bridge = Bridge::from_description(addr, &description)?;
        lights.extend(bridge.lights()?);
    }
    if lights.is_empty() {
        return Err(Error::Other(String::from("No lights found")));
    }
    Ok(lights)
}

fn pad(value: &str, padding: usize) -> String {
    let pad = " ".repeat(padding.saturating_sub(value.len()));
    format!("{}{}", value, pad)
}

fn command_discover(host: Option<&str>, json: bool) -> Result<()> {
    for (addr, description) in find_bridges(host)? {
        if json {
            println!(
                "{}",
                json!({ "addr": addr.to_string(), "description": description })
            );
        } else {
            println!(
                "{}\t{}\t{}\t{}",
                addr,
                pad(&description.friendly_name, 18),
                pad(&description.serial_number, 16),
                description.udn,
            );
        }
    }
    Ok(())
}

fn command_lights(host: Option<&str>, names: &LightNames, json: bool) -> Result<()> {
    let mut lights: Vec<_> = find_lights(host)?.into_iter().collect();
    lights.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (serial, light) in lights {
        let state = light.info().state();
        if json {
            println!(
                "{}",
                json!({
                    "serial": serial,
                    "name": names.name_for(&light),
                    "bridge": light.bridge().addr().to_string(),
                    "info": light.info(),
                    "state": state,
                })
            );
        } else {
            let on = match state.on {
                Some(true) => "on",
                Some(false) => "off",
                None => "?",
            };
            let temperature = if light.supports(Capability::ColorTemperature) {
                state.kelvin().map(|kelvin| format!("{}K", kelvin))
            } else {
                None
            };
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                serial,
                pad(names.name_for(&light), 18),
                pad(&light.info().model_code, 28),
                pad(on, 3),
                pad(&state.level.map(|level| level.to_string()).unwrap_or_default(), 3),
                temperature.unwrap_or_default(),
            );
        }
    }
    Ok(())
}

fn waveform_from(matches: &ArgMatches) -> Waveform {
    let samples = value_t!(matches, "samples", usize).unwrap_or_else(|e| e.exit());
    let periods = value_t!(matches, "periods", f64).unwrap_or_else(|e| e.exit());
    let mut waveform = match matches.value_of("target") {
        Some("temperature") => Waveform::temperature(samples),
        _ => Waveform::brightness(samples),
    };
    if matches.is_present("min") {
        waveform.min = value_t!(matches, "min", f64).unwrap_or_else(|e| e.exit());
    }
    if matches.is_present("max") {
        waveform.max = value_t!(matches, "max", f64).unwrap_or_else(|e| e.exit());
    }
    waveform.periods(periods)
}

fn command_plot(matches: &ArgMatches) {
    print!("{}", waveform::plot(&waveform_from(matches).values(), 72, 16));
}

fn command_sweep(light: &BridgeLight, matches: &ArgMatches) -> Result<()> {
    let waveform = waveform_from(matches);
    let sweep = Sweep {
        delay: Duration::from_millis(
            value_t!(matches, "delay", u64).unwrap_or_else(|e| e.exit()),
        ),
        transition: Duration::from_secs_f64(
            value_t!(matches, "transition", f64).unwrap_or_else(|e| e.exit()),
        ),
        repeat: value_t!(matches, "repeat", usize).unwrap_or_else(|e| e.exit()),
    };
    if matches.is_present("plot") {
        print!("{}", waveform::plot(&waveform.values(), 72, 16));
    }

    light.switch_on()?;
    match matches.value_of("target") {
        Some("temperature") => sweep.temperature(light, &waveform.temperatures()),
        _ => sweep.brightness(light, &waveform.brightness_levels()),
    }
}

fn transition(matches: &ArgMatches) -> Duration {
    Duration::from_secs_f64(value_t!(matches, "transition", f64).unwrap_or_else(|e| e.exit()))
}

// Global flags may be given before or after the subcommand
fn global_flag(matches: &ArgMatches, name: &str) -> bool {
    matches.is_present(name)
        || matches
            .subcommand()
            .1
            .map_or(false, |sub| sub.is_present(name))
}

fn global_value<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a str> {
    matches
        .subcommand()
        .1
        .and_then(|sub| sub.value_of(name))
        .or_else(|| matches.value_of(name))
}

fn run(matches: &ArgMatches) -> Result<()> {
    let json = global_flag(matches, "json");
    let host = global_value(matches, "host");
    let names = match global_value(matches, "names") {
        Some(path) => LightNames::load(path)?,
        None => LightNames::default(),
    };

    let (name, sub) = matches.subcommand();
    let sub = match sub {
        Some(sub) => sub,
        None => return Ok(()),
    };

    match name {
        "discover" => return command_discover(host, json),
        "lights" => return command_lights(host, &names, json),
        "plot" => {
            command_plot(sub);
            return Ok(());
        }
        "chase" => {
            let delay = value_t!(sub, "delay", u64).unwrap_or_else(|e| e.exit());
            let rounds = value_t!(sub, "rounds", usize).unwrap_or_else(|e| e.exit());
            let mut lights: Vec<_> = names.directory(find_lights(host)?).into_iter().collect();
            lights.sort_by(|(a, _), (b, _)| a.cmp(b));
            let switches: Vec<&dyn Switch> =
                lights.iter().map(|(_, light)| light as &dyn Switch).collect();
            return effects::chase(&switches, Duration::from_millis(delay), rounds);
        }
        _ => {}
    }

    let lights = find_lights(host)?;
    let light = names.find(&lights, sub.value_of("light").unwrap_or_default())?;
    match name {
        "on" => light.switch_on(),
        "off" => light.switch_off(),
        "toggle" => {
            let on = light.toggle()?;
            println!("{}", if on { "on" } else { "off" });
            Ok(())
        }
        "brightness" => {
            let level = value_t!(sub, "level", u8).unwrap_or_else(|e| e.exit());
            light.set_brightness_with_transition(level, transition(sub))
        }
        "temperature" => {
            let kelvin = value_t!(sub, "kelvin", u16).unwrap_or_else(|e| e.exit());
            light.set_color_temp_with_transition(kelvin, transition(sub))
        }
        "sweep" => command_sweep(light, sub),
        other => Err(Error::Other(format!("Unknown command {}", other))),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn light_arg() -> Arg<'static, 'static> {
    Arg::with_name("light")
        .required(true)
        .help("Configured name, reported name or serial number of the light")
}

fn transition_arg() -> Arg<'static, 'static> {
    Arg::with_name("transition")
        .long("transition")
        .takes_value(true)
        .default_value("0")
        .help("Fade time in seconds")
}

fn waveform_args() -> Vec<Arg<'static, 'static>> {
    vec![
        Arg::with_name("target")
            .long("target")
            .takes_value(true)
            .possible_values(&["brightness", "temperature"])
            .default_value("brightness")
            .help("What the waveform drives"),
        Arg::with_name("samples")
            .long("samples")
            .takes_value(true)
            .default_value("32")
            .help("Number of commands in one pass"),
        Arg::with_name("periods")
            .long("periods")
            .takes_value(true)
            .default_value("1")
            .help("Cosine cycles per pass"),
        Arg::with_name("min")
            .long("min")
            .takes_value(true)
            .help("Lowest value; defaults to the target's range"),
        Arg::with_name("max")
            .long("max")
            .takes_value(true)
            .help("Highest value; defaults to the target's range"),
    ]
}

fn main() {
    let matches = App::new("WeMo Link light CLI")
        .version("0.1")
        .about("Discover and control lights paired with WeMo Link bridges on the local network.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::with_name("json")
            .long("json")
            .global(true)
            .takes_value(false)
            .help("Respond with JSON.")
        )
        .arg(Arg::with_name("names")
            .long("names")
            .global(true)
            .takes_value(true)
            .help("TOML file mapping light serial numbers to names.")
        )
        .arg(Arg::with_name("host")
            .long("host")
            .global(true)
            .takes_value(true)
            .help("Address (ip:port) of a bridge to use instead of discovering one.")
        )
        .arg(Arg::with_name("verbose")
            .short("v")
            .global(true)
            .help("Log requests and responses.")
        )
        .subcommand(SubCommand::with_name("discover")
            .about("Discover bridges on the local network")
        )
        .subcommand(SubCommand::with_name("lights")
            .about("List the lights paired with the bridges")
        )
        .subcommand(SubCommand::with_name("on")
            .about("Switch a light on")
            .arg(light_arg())
        )
        .subcommand(SubCommand::with_name("off")
            .about("Switch a light off")
            .arg(light_arg())
        )
        .subcommand(SubCommand::with_name("toggle")
            .about("Toggle a light and print its new state")
            .arg(light_arg())
        )
        .subcommand(SubCommand::with_name("brightness")
            .about("Set the brightness level (0-255) of a light")
            .arg(light_arg())
            .arg(Arg::with_name("level").required(true))
            .arg(transition_arg())
        )
        .subcommand(SubCommand::with_name("temperature")
            .about("Set the colour temperature of a light in Kelvin")
            .arg(light_arg())
            .arg(Arg::with_name("kelvin").required(true))
            .arg(transition_arg())
        )
        .subcommand(SubCommand::with_name("sweep")
            .about("Drive a light through a cosine waveform")
            .arg(light_arg())
            .args(&waveform_args())
            .arg(transition_arg())
            .arg(Arg::with_name("delay")
                .long("delay")
                .takes_value(true)
                .default_value("500")
                .help("Pause after each command in milliseconds")
            )
            .arg(Arg::with_name("repeat")
                .long("repeat")
                .takes_value(true)
                .default_value("1")
            )
            .arg(Arg::with_name("plot")
                .long("plot")
                .help("Print the waveform before running it")
            )
        )
        .subcommand(SubCommand::with_name("chase")
            .about("Switch every light on and off in turn")
            .arg(Arg::with_name("delay")
                .long("delay")
                .takes_value(true)
                .default_value("1000")
                .help("Pause after each command in milliseconds")
            )
            .arg(Arg::with_name("rounds")
                .long("rounds")
                .takes_value(true)
                .default_value("1")
            )
        )
        .subcommand(SubCommand::with_name("plot")
            .about("Print a waveform without touching any light")
            .args(&waveform_args())
        )
        .get_matches();

    init_logging(global_flag(&matches, "verbose"));

    if let Err(err) = run(&matches) {
        eprintln!("{}", err);
        process::exit(1);
    }
}
