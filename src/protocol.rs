use std::time::Duration;

use reqwest::{blocking::Client, header::CONTENT_TYPE};

use crate::error::{Error, Result, UpnpError};

#[cfg(test)]
use std::{cell::RefCell, collections::VecDeque};

// Escape text before embedding it in a SOAP argument
pub fn escape(plain: &str) -> String {
    plain
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// Undo `escape`; the bridge returns its documents as escaped argument text
pub fn unescape(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Build the SOAP envelope for `action` on `service`
pub fn envelope(service: &str, action: &str, args: &[(&str, &str)]) -> String {
    let arguments: String = args
        .iter()
        .map(|(name, value)| format!("<{0}>{1}</{0}>", name, escape(value)))
        .collect();

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
            r#"<s:Body><u:{0} xmlns:u="{1}">{2}</u:{0}></s:Body></s:Envelope>"#,
        ),
        action, service, arguments
    )
}

// Text between `<name>` and `</name>`, empty for `<name/>`
fn element_text<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    if let Some(position) = body.find(&open) {
        let start = position + open.len();
        let end = body[start..].find(&close)? + start;
        return Some(&body[start..end]);
    }
    if body.contains(&format!("<{}/>", name)) || body.contains(&format!("<{} />", name)) {
        return Some("");
    }
    None
}

fn fault(body: &str) -> Option<UpnpError> {
    if !body.contains("Fault>") {
        return None;
    }
    let error_code = element_text(body, "errorCode")
        .and_then(|code| code.trim().parse().ok())
        .unwrap_or(-1);
    let error_description = element_text(body, "errorDescription")
        .or_else(|| element_text(body, "faultstring"))
        .map(unescape)
        .unwrap_or_else(|| String::from("Unknown fault"));

    Some(UpnpError {
        error_code,
        error_description,
    })
}

/// Read the output argument `name` out of a SOAP response body
pub fn response_argument(body: &str, name: &str) -> Result<String> {
    if let Some(err) = fault(body) {
        return Err(Error::from(err));
    }
    element_text(body, name)
        .map(unescape)
        .ok_or_else(|| Error::Other(format!("Response is missing the {} argument", name)))
}

pub trait Protocol {
    fn get(&self, url: &str) -> Result<String>;

    fn post(&self, url: &str, soap_action: &str, body: &str) -> Result<String>;
}

pub struct DefaultProtocol {
    client: Client,
}

impl DefaultProtocol {
    pub fn new() -> Result<DefaultProtocol> {
        let client = Client::builder().timeout(Duration::new(5, 0)).build()?;
        Ok(DefaultProtocol { client })
    }
}

impl Protocol for DefaultProtocol {
    fn get(&self, url: &str) -> Result<String> {
        Ok(self.client.get(url).send()?.text()?)
    }

    // Faults come back with a 500 status, so the body is returned regardless
    fn post(&self, url: &str, soap_action: &str, body: &str) -> Result<String> {
        tracing::debug!(url, soap_action, "sending soap request");
        let response = self
            .client
            .post(url)
            .header("SOAPACTION", format!("\"{}\"", soap_action))
            .header(CONTENT_TYPE, r#"text/xml; charset="utf-8""#)
            .body(body.to_string())
            .send()?;
        let status = response.status();
        let text = response.text()?;
        tracing::debug!(%status, body = %text, "soap response");
        Ok(text)
    }
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub url: String,
    pub soap_action: Option<String>,
    pub body: Option<String>,
}

#[cfg(test)]
pub struct ProtocolMock {
    requests: RefCell<Vec<Request>>,
    responses: RefCell<VecDeque<Result<String>>>,
}

#[cfg(test)]
impl ProtocolMock {
    pub fn new() -> ProtocolMock {
        ProtocolMock {
            requests: RefCell::new(Vec::new()),
            responses: RefCell::new(VecDeque::new()),
        }
    }

    pub fn push_response(&self, resp: Result<String>) {
        self.responses.borrow_mut().push_back(resp);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    fn reply(&self, request: Request) -> Result<String> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(String::from("")))
    }
}

#[cfg(test)]
impl Protocol for ProtocolMock {
    fn get(&self, url: &str) -> Result<String> {
        self.reply(Request {
            url: url.to_string(),
            soap_action: None,
            body: None,
        })
    }

    fn post(&self, url: &str, soap_action: &str, body: &str) -> Result<String> {
        self.reply(Request {
            url: url.to_string(),
            soap_action: Some(soap_action.to_string()),
            body: Some(body.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_unescape() {
        let xml = r#"<DeviceStatus><DeviceID available="YES">A&B</DeviceID></DeviceStatus>"#;

        let escaped = escape(xml);
        assert!(!escaped.contains('<'));
        assert_eq!(xml, unescape(&escaped));
    }

    #[test]
    fn envelope_escapes_arguments() {
        let body = envelope(
            "urn:Belkin:service:bridge:1",
            "SetDeviceStatus",
            &[("DeviceStatusList", "<DeviceStatus/>")],
        );

        assert!(body.contains(r#"<u:SetDeviceStatus xmlns:u="urn:Belkin:service:bridge:1">"#));
        assert!(body.contains("<DeviceStatusList>&lt;DeviceStatus/&gt;</DeviceStatusList>"));
        assert!(body.ends_with("</u:SetDeviceStatus></s:Body></s:Envelope>"));
    }

    #[test]
    fn response_argument_unescapes() {
        let body = r#"<s:Envelope><s:Body><u:GetDeviceStatusResponse xmlns:u="urn:Belkin:service:bridge:1"><DeviceStatusList>&lt;DeviceStatusList&gt;&lt;/DeviceStatusList&gt;</DeviceStatusList></u:GetDeviceStatusResponse></s:Body></s:Envelope>"#;

        assert_eq!(
            "<DeviceStatusList></DeviceStatusList>",
            response_argument(body, "DeviceStatusList").unwrap()
        );
    }

    #[test]
    fn response_argument_empty_element() {
        let body = "<u:SetDeviceStatusResponse><ErrorDeviceIDs/></u:SetDeviceStatusResponse>";

        assert_eq!("", response_argument(body, "ErrorDeviceIDs").unwrap());
    }

    #[test]
    fn response_argument_missing() {
        assert!(response_argument("<s:Envelope></s:Envelope>", "DeviceLists").is_err());
    }

    #[test]
    fn response_argument_fault() {
        let body = r#"<s:Envelope><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>501</errorCode><errorDescription>Action Failed</errorDescription></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;

        match response_argument(body, "DeviceLists") {
            Err(Error::Bridge(err)) => {
                assert_eq!(501, err.error_code);
                assert_eq!("Action Failed", err.error_description);
            }
            other => panic!("expected a bridge error, got {:?}", other),
        }
    }
}
