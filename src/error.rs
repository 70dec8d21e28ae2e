//! Error types
use std::{convert::From, error, fmt, io, net::AddrParseError, result};

#[derive(Debug)]
pub enum Error {
    IO(io::Error),
    Http(reqwest::Error),
    Xml(serde_xml_rs::Error),
    Config(toml::de::Error),
    Bridge(UpnpError),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::IO(_) => f.write_str("Error connecting to the device"),
            Error::Http(err) => write!(f, "Request to the bridge failed: {}", err),
            Error::Xml(_) => f.write_str("Could not parse the response received from the device"),
            Error::Config(err) => write!(f, "Invalid light names file: {}", err),
            Error::Bridge(err) => write!(f, "Bridge returned an error: {}", err),
            Error::Other(err) => f.write_str(err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::IO(err) => Some(err),
            Error::Http(err) => Some(err),
            Error::Config(err) => Some(err),
            Error::Bridge(err) => Some(err),
            Error::Xml(_) | Error::Other(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::IO(error)
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Http(error)
    }
}

impl From<serde_xml_rs::Error> for Error {
    fn from(error: serde_xml_rs::Error) -> Self {
        Error::Xml(error)
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Config(error)
    }
}

impl From<AddrParseError> for Error {
    fn from(error: AddrParseError) -> Self {
        Error::Other(format!("Invalid address: {}", error))
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<UpnpError> for Error {
    fn from(error: UpnpError) -> Self {
        Error::Bridge(error)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Fault detail carried by a SOAP error response
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UpnpError {
    pub error_code: i32,
    pub error_description: String,
}

impl fmt::Display for UpnpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.error_code, self.error_description)
    }
}

impl error::Error for UpnpError {}
