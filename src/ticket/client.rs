use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::auth::Credentials;
use crate::error::{Result, WorkbenchError};

const TICKET_GET: &str = "ticket.get";
const JSON_RPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    method: &'a str,
    params: [&'a str; 1],
    jsonrpc: &'a str,
    id: u32,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketStatus {
    pub id: String,
    pub status: String,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.id, self.status)
    }
}

/// JSON-RPC client for a Trac issue tracker.
pub struct TicketClient {
    client: Client,
    rpc_url: Url,
    credentials: Option<Credentials>,
}

/// `ticket.get` answers `[id, created, modified, attributes]`.
fn parse_ticket(result: &Value) -> Result<TicketStatus> {
    let malformed = || WorkbenchError::Api(format!("Unexpected ticket.get result: {result}"));

    let id = match result.get(0).ok_or_else(malformed)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(malformed()),
    };
    let status = result
        .get(3)
        .and_then(|attributes| attributes.get("status"))
        .and_then(Value::as_str)
        .ok_or_else(malformed)?
        .to_string();

    Ok(TicketStatus { id, status })
}

impl TicketClient {
    pub fn new(rpc_url: &str, credentials: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("workbench/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WorkbenchError::Config(format!("Failed to create HTTP client: {e}")))?;

        let rpc_url = Url::parse(rpc_url)
            .map_err(|e| WorkbenchError::Config(format!("Invalid RPC URL: {e}")))?;

        Ok(Self {
            client,
            rpc_url,
            credentials,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(credentials) = &self.credentials {
            request.basic_auth(&credentials.user, Some(credentials.password.as_str()))
        } else {
            request
        }
    }

    pub async fn fetch_status(&self, ticket_id: &str) -> Result<TicketStatus> {
        let body = RpcRequest {
            method: TICKET_GET,
            params: [ticket_id],
            jsonrpc: JSON_RPC_VERSION,
            id: 0,
        };
        let request = self.auth_request(self.client.post(self.rpc_url.clone()).json(&body));

        let response = request.send().await?.error_for_status()?;
        let rpc = response.json::<RpcResponse>().await?;

        if let Some(error) = rpc.error.filter(|e| !e.is_null()) {
            return Err(WorkbenchError::Api(format!(
                "ticket.get {ticket_id} failed: {error}"
            )));
        }
        let result = rpc
            .result
            .ok_or_else(|| WorkbenchError::Api(format!("ticket.get {ticket_id} returned no result")))?;

        parse_ticket(&result)
    }
}
