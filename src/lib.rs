#[macro_use]
extern crate serde_derive;

pub mod error;
pub mod discovery;
pub mod datatypes;
pub mod devices;
pub mod capabilities;
pub mod names;
pub mod waveform;
pub mod effects;
pub mod protocol;

#[cfg(feature = "async")]
pub mod tokio {
    pub mod discovery;
}

pub use discovery::discover;
