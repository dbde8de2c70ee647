//! Hue bridge client over the bridge's local HTTP API.
//!
//! Endpoints used:
//!
//! | Operation  | Request                                   |
//! |------------|-------------------------------------------|
//! | discovery  | `GET https://discovery.meethue.com/`      |
//! | info       | `GET /api/config` (no credential needed)  |
//! | provision  | `POST /api {"devicetype": "..."}`         |
//! | login      | `GET /api/<token>/config`                 |
//! | fixtures   | `GET /api/<token>/lights`                 |
//! | update     | `PUT /api/<token>/lights/<id>/state`      |
//!
//! The bridge answers most failures with HTTP 200 and a body such as
//! `[{"error":{"type":101,"address":"","description":"link button not pressed"}}]`.
//! Those are decoded into [`ApiError`] so callers can tell them apart.
//! Response parsing is kept in free functions that operate on the body text.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;

use super::{Fixture, FixtureState, Gateway, GatewayDiscovery, GatewayInfo};
use crate::constants::{
    API_ERROR_LINK_BUTTON, API_ERROR_UNAUTHORIZED, APP_NAME, DISCOVERY_URL, REQUEST_TIMEOUT_SECS,
};
use crate::credentials::{Credential, GatewayId};
use crate::temperature::FixtureCapability;

/// Error reported by the bridge in an API response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: u32,
    pub address: String,
    pub description: String,
}

impl ApiError {
    pub fn is_link_button_not_pressed(&self) -> bool {
        self.kind == API_ERROR_LINK_BUTTON
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == API_ERROR_UNAUTHORIZED
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bridge error {}: {}", self.kind, self.description)
    }
}

impl std::error::Error for ApiError {}

/// Find a bridge [`ApiError`] anywhere in an error chain.
pub fn api_error(error: &anyhow::Error) -> Option<&ApiError> {
    error.chain().find_map(|cause| cause.downcast_ref::<ApiError>())
}

// # Wire types

#[derive(Debug, Deserialize)]
struct ApiEntry {
    success: Option<Value>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type")]
    kind: u32,
    #[serde(default)]
    address: String,
    #[serde(default)]
    description: String,
}

impl From<ApiErrorBody> for ApiError {
    fn from(body: ApiErrorBody) -> Self {
        Self {
            kind: body.kind,
            address: body.address,
            description: body.description,
        }
    }
}

/// Entry from the discovery endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiscoveredBridge {
    pub id: String,
    #[serde(rename = "internalipaddress")]
    pub address: String,
}

#[derive(Debug, Deserialize)]
struct BridgeConfig {
    bridgeid: Option<String>,
    name: Option<String>,
    whitelist: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct LightResource {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    state: LightStateResource,
    #[serde(default)]
    capabilities: Capabilities,
}

#[derive(Debug, Default, Deserialize)]
struct LightStateResource {
    #[serde(default)]
    on: bool,
}

#[derive(Debug, Default, Deserialize)]
struct Capabilities {
    #[serde(default)]
    control: Control,
}

#[derive(Debug, Default, Deserialize)]
struct Control {
    ct: Option<FixtureCapability>,
}

// # Response parsing

/// The first error entry of an array-shaped response, if any.
fn first_api_error(body: &str) -> Option<ApiError> {
    let entries: Vec<ApiEntry> = serde_json::from_str(body).ok()?;
    entries
        .into_iter()
        .find_map(|entry| entry.error.map(ApiError::from))
}

pub fn parse_discovery(body: &str) -> Result<Vec<DiscoveredBridge>> {
    serde_json::from_str(body).context("Unexpected discovery response")
}

pub fn parse_info(body: &str) -> Result<GatewayInfo> {
    if let Some(error) = first_api_error(body) {
        return Err(error.into());
    }
    let config: BridgeConfig =
        serde_json::from_str(body).context("Unexpected bridge config response")?;
    let id = config
        .bridgeid
        .filter(|id| !id.trim().is_empty())
        .context("Bridge did not report its id")?;

    Ok(GatewayInfo {
        id: GatewayId::new(id),
        name: config.name,
    })
}

pub fn parse_provision(body: &str) -> Result<Credential> {
    let entries: Vec<ApiEntry> =
        serde_json::from_str(body).context("Unexpected provisioning response")?;

    for entry in entries {
        if let Some(error) = entry.error {
            return Err(ApiError::from(error).into());
        }
        if let Some(username) = entry
            .success
            .as_ref()
            .and_then(|success| success.get("username"))
            .and_then(Value::as_str)
        {
            return Ok(Credential::new(username));
        }
    }

    anyhow::bail!("Provisioning response contained no credential")
}

/// An authenticated config request returns the whitelist; an
/// unauthenticated one returns either an error or the public subset.
pub fn parse_login(body: &str) -> Result<()> {
    if let Some(error) = first_api_error(body) {
        return Err(error.into());
    }
    let config: BridgeConfig =
        serde_json::from_str(body).context("Unexpected bridge config response")?;
    if config.whitelist.is_none() {
        anyhow::bail!("Bridge did not accept the credential");
    }
    Ok(())
}

pub fn parse_lights(body: &str) -> Result<Vec<Fixture>> {
    if let Some(error) = first_api_error(body) {
        return Err(error.into());
    }
    let lights: BTreeMap<String, LightResource> =
        serde_json::from_str(body).context("Unexpected lights response")?;

    let mut fixtures: Vec<Fixture> = lights
        .into_iter()
        .map(|(id, light)| Fixture {
            id,
            name: light.name,
            kind: light.kind,
            on: light.state.on,
            capability: light.capabilities.control.ct.unwrap_or_default(),
        })
        .collect();

    // Numeric ids sort naturally ("2" before "10")
    fixtures.sort_by(|a, b| {
        let key = |f: &Fixture| (f.id.parse::<u64>().unwrap_or(u64::MAX), f.id.clone());
        key(a).cmp(&key(b))
    });
    Ok(fixtures)
}

pub fn parse_state_update(body: &str) -> Result<()> {
    if let Some(error) = first_api_error(body) {
        return Err(error.into());
    }
    let _: Vec<ApiEntry> = serde_json::from_str(body).context("Unexpected state update response")?;
    Ok(())
}

pub fn state_body(state: FixtureState) -> Value {
    let mut body = json!({ "on": state.on, "ct": state.ct });
    if let Some(transition_time) = state.transition_time {
        body["transitiontime"] = json!(transition_time);
    }
    body
}

/// Bridge `devicetype`: `<application>#<device>`, each part bounded by the
/// API's length limits.
pub fn device_type(app_name: &str, device: &str) -> String {
    let app: String = app_name.chars().take(20).collect();
    let device: String = device.chars().take(19).collect();
    format!("{app}#{device}")
}

// # HTTP client

pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")
}

/// One Hue bridge reachable at `host`.
pub struct HueBridge {
    client: Client,
    host: String,
    credential: Option<Credential>,
}

impl HueBridge {
    pub fn new(client: Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
            credential: None,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}/api{}", self.host, path)
    }

    fn session(&self) -> Result<&Credential> {
        self.credential
            .as_ref()
            .with_context(|| format!("Not logged in to bridge {}", self.host))
    }

    fn get(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        self.client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .with_context(|| format!("GET request to bridge {} failed", self.host))
    }

    fn send_json(&self, method: reqwest::Method, path: &str, body: &Value) -> Result<String> {
        let url = self.url(path);
        self.client
            .request(method.clone(), &url)
            .json(body)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .with_context(|| format!("{method} request to bridge {} failed", self.host))
    }
}

impl Gateway for HueBridge {
    fn address(&self) -> String {
        self.host.clone()
    }

    fn fetch_info(&mut self) -> Result<GatewayInfo> {
        parse_info(&self.get("/config")?)
    }

    fn login(&mut self, credential: &Credential) -> Result<()> {
        let body = self.get(&format!("/{}/config", credential.expose()))?;
        parse_login(&body)?;
        self.credential = Some(credential.clone());
        Ok(())
    }

    fn provision(&mut self, app_name: &str) -> Result<Credential> {
        let device = std::env::var("HOSTNAME").unwrap_or_else(|_| APP_NAME.to_string());
        let body = json!({ "devicetype": device_type(app_name, &device) });
        parse_provision(&self.send_json(reqwest::Method::POST, "", &body)?)
    }

    fn list_fixtures(&mut self) -> Result<Vec<Fixture>> {
        let path = format!("/{}/lights", self.session()?.expose());
        parse_lights(&self.get(&path)?)
    }

    fn set_fixture_state(&mut self, fixture: &Fixture, state: FixtureState) -> Result<()> {
        let path = format!("/{}/lights/{}/state", self.session()?.expose(), fixture.id);
        let response = self.send_json(reqwest::Method::PUT, &path, &state_body(state))?;
        parse_state_update(&response)
            .with_context(|| format!("Bridge rejected update for light {}", fixture.id))
    }
}

/// Finds bridges through the discovery service, or uses a fixed host list.
pub struct HueDiscovery {
    client: Client,
    hosts: Vec<String>,
    discovery_url: String,
}

impl HueDiscovery {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            hosts: Vec::new(),
            discovery_url: DISCOVERY_URL.to_string(),
        }
    }

    /// Skip the discovery service and use these hosts.
    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        self.hosts = hosts;
        self
    }

    fn discover_hosts(&self) -> Result<Vec<String>> {
        if !self.hosts.is_empty() {
            return Ok(self.hosts.clone());
        }

        let body = self
            .client
            .get(&self.discovery_url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .context("Bridge discovery request failed")?;

        let bridges = parse_discovery(&body)?;
        for bridge in &bridges {
            log_debug!("Discovered bridge {} at {}", bridge.id, bridge.address);
        }
        Ok(bridges.into_iter().map(|b| b.address).collect())
    }
}

impl GatewayDiscovery for HueDiscovery {
    fn discover(&self) -> Result<Vec<Box<dyn Gateway>>> {
        Ok(self
            .discover_hosts()?
            .into_iter()
            .map(|host| Box::new(HueBridge::new(self.client.clone(), host)) as Box<dyn Gateway>)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_discovery() {
        let body = r#"[{"id":"001788fffe6a1b2c","internalipaddress":"192.168.1.20","port":443}]"#;
        let bridges = parse_discovery(body).unwrap();
        assert_eq!(
            bridges,
            vec![DiscoveredBridge {
                id: "001788fffe6a1b2c".to_string(),
                address: "192.168.1.20".to_string(),
            }]
        );
        assert!(parse_discovery("[]").unwrap().is_empty());
        assert!(parse_discovery("<html>").is_err());
    }

    #[test]
    fn test_parse_info() {
        let body = r#"{"name":"Philips hue","bridgeid":"001788FFFE6A1B2C","modelid":"BSB002"}"#;
        let info = parse_info(body).unwrap();
        assert_eq!(info.id, GatewayId::new("001788fffe6a1b2c"));
        assert_eq!(info.name.as_deref(), Some("Philips hue"));
    }

    #[test]
    fn test_parse_info_without_id() {
        assert!(parse_info(r#"{"name":"Philips hue"}"#).is_err());
        assert!(parse_info(r#"{"bridgeid":"  "}"#).is_err());
    }

    #[test]
    fn test_parse_provision_success() {
        let body = r#"[{"success":{"username":"83b7780291a6ceffbe0bd049104df"}}]"#;
        let credential = parse_provision(body).unwrap();
        assert_eq!(credential.expose(), "83b7780291a6ceffbe0bd049104df");
    }

    #[test]
    fn test_parse_provision_link_button() {
        let body = r#"[{"error":{"type":101,"address":"","description":"link button not pressed"}}]"#;
        let error = parse_provision(body).unwrap_err();
        let api = api_error(&error).expect("api error in chain");
        assert!(api.is_link_button_not_pressed());
        assert_eq!(api.description, "link button not pressed");
    }

    #[test]
    fn test_parse_provision_empty() {
        assert!(parse_provision("[]").is_err());
        assert!(parse_provision(r#"[{"success":{}}]"#).is_err());
    }

    #[test]
    fn test_parse_login() {
        let authorized = r#"{"name":"Philips hue","bridgeid":"abc","whitelist":{"x":{"name":"phlux#host"}}}"#;
        assert!(parse_login(authorized).is_ok());

        let public_only = r#"{"name":"Philips hue","bridgeid":"abc"}"#;
        assert!(parse_login(public_only).is_err());

        let unauthorized =
            r#"[{"error":{"type":1,"address":"/","description":"unauthorized user"}}]"#;
        let error = parse_login(unauthorized).unwrap_err();
        assert!(api_error(&error).unwrap().is_unauthorized());
    }

    #[test]
    fn test_parse_lights() {
        let body = r#"{
            "10": {"name": "Porch", "type": "On/Off plug-in unit", "state": {"on": true}},
            "2": {
                "name": "Desk",
                "type": "Extended color light",
                "state": {"on": true, "ct": 366},
                "capabilities": {"control": {"ct": {"min": 153, "max": 500}}}
            },
            "1": {
                "name": "Hall",
                "type": "Color temperature light",
                "state": {"on": false},
                "capabilities": {"control": {"ct": {"min": 153, "max": 454}}}
            }
        }"#;

        let fixtures = parse_lights(body).unwrap();
        let ids: Vec<&str> = fixtures.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);

        assert_eq!(fixtures[0].name, "Hall");
        assert!(!fixtures[0].on);
        assert_eq!(fixtures[0].capability, FixtureCapability::new(153, 454));
        assert_eq!(fixtures[1].kind, "Extended color light");
        assert!(!fixtures[2].capability.supports_color_temperature());
    }

    #[test]
    fn test_parse_lights_unauthorized() {
        let body = r#"[{"error":{"type":1,"address":"/lights","description":"unauthorized user"}}]"#;
        assert!(parse_lights(body).is_err());
    }

    #[test]
    fn test_parse_state_update() {
        let ok = r#"[{"success":{"/lights/1/state/on":true}},{"success":{"/lights/1/state/ct":153}}]"#;
        assert!(parse_state_update(ok).is_ok());

        let off = r#"[{"error":{"type":201,"address":"/lights/1/state/ct","description":"parameter, ct, is not modifiable. Device is set to off."}}]"#;
        let error = parse_state_update(off).unwrap_err();
        assert_eq!(api_error(&error).unwrap().kind, 201);
    }

    #[test]
    fn test_state_body() {
        let with_transition = state_body(FixtureState {
            on: true,
            ct: 153,
            transition_time: Some(40),
        });
        assert_eq!(with_transition, json!({"on": true, "ct": 153, "transitiontime": 40}));

        let without = state_body(FixtureState {
            on: false,
            ct: 500,
            transition_time: None,
        });
        assert_eq!(without, json!({"on": false, "ct": 500}));
    }

    #[test]
    fn test_device_type_limits() {
        assert_eq!(device_type("phlux", "desktop"), "phlux#desktop");
        let long = device_type("phlux", "a-very-long-hostname-indeed");
        assert_eq!(long, "phlux#a-very-long-hostnam");
        assert!(long.len() <= 40);
    }
}
