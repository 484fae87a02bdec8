//! One request shape for both backend services, and the reqwest implementation.

use std::future::Future;

use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::Endpoints;
use crate::error::SyncError;

/// Which backend a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Schedules, catalog, assistant and auth.
    Primary,
    /// Share links and profiles.
    Sharing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

/// A request, independent of where the service lives.
///
/// Path segments are raw; the transport percent-encodes them.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub service: Service,
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl ApiRequest {
    pub fn new<I, S>(service: Service, method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            service,
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn primary<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Service::Primary, method, segments)
    }

    pub fn sharing<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Service::Sharing, method, segments)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, SyncError> {
        let value = serde_json::to_value(body)
            .map_err(|e| SyncError::Transport(format!("encode request body: {e}")))?;
        self.body = Body::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Body::Multipart(parts);
        self
    }

    /// Unencoded path, e.g. `/api/schedules/load/Fall 2024`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body; decoding happens at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a request to one of the services.
///
/// Any response the service produced, whatever its status, is `Ok`. `Err` means
/// no response arrived.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: ApiRequest)
        -> impl Future<Output = Result<ApiResponse, SyncError>> + Send;
}

/// [`Transport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    primary: Url,
    sharing: Url,
}

impl HttpTransport {
    pub fn new(endpoints: &Endpoints) -> Result<Self, SyncError> {
        Self::with_client(Client::new(), endpoints)
    }

    pub fn with_client(client: Client, endpoints: &Endpoints) -> Result<Self, SyncError> {
        let parse = |s: &str| {
            Url::parse(s).map_err(|e| SyncError::Transport(format!("invalid base url {s:?}: {e}")))
        };
        Ok(Self {
            client,
            primary: parse(&endpoints.primary)?,
            sharing: parse(&endpoints.sharing)?,
        })
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, SyncError> {
        let mut url = match request.service {
            Service::Primary => self.primary.clone(),
            Service::Sharing => self.sharing.clone(),
        };
        let shown = url.to_string();
        url.path_segments_mut()
            .map_err(|_| SyncError::Transport(format!("{shown} cannot be a base url")))?
            .pop_if_empty()
            .extend(&request.segments);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

fn multipart_form(parts: Vec<FormPart>) -> Result<reqwest::multipart::Form, SyncError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let file = reqwest::multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&content_type)
                    .map_err(|e| SyncError::Transport(format!("content type {content_type:?}: {e}")))?;
                form.part(name, file)
            }
        };
    }
    Ok(form)
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, SyncError> {
        let url = self.url_for(&request)?;
        let request_id = Uuid::new_v4().to_string();
        debug!(method = request.method.as_str(), path = url.path(), %request_id, "request");

        let builder = self
            .client
            .request(request.method.into(), url.clone())
            .header("x-request-id", &request_id);
        let builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        let resp = builder
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        debug!(path = url.path(), status, %request_id, "response");
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> HttpTransport {
        HttpTransport::new(&Endpoints {
            primary: "http://localhost:7070".into(),
            sharing: "http://localhost:3000/".into(),
        })
        .unwrap()
    }

    #[test]
    fn segments_are_percent_encoded() {
        let req = ApiRequest::primary(Method::Put, ["api", "schedules", "load", "Fall 2024/b"]);
        let url = transport().url_for(&req).unwrap();
        assert_eq!(url.as_str(), "http://localhost:7070/api/schedules/load/Fall%202024%2Fb");
        assert_eq!(req.path(), "/api/schedules/load/Fall 2024/b");
    }

    #[test]
    fn query_and_service_base() {
        let req = ApiRequest::sharing(Method::Get, ["user_profiles", "ada"]).query("x", "a b");
        let url = transport().url_for(&req).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/user_profiles/ada?x=a+b");
        assert_eq!(req.query_value("x"), Some("a b"));
    }

    #[test]
    fn opaque_base_is_rejected_per_request() {
        let transport = HttpTransport::new(&Endpoints {
            primary: "mailto:ops@example.com".into(),
            sharing: "http://localhost:3000".into(),
        })
        .unwrap();
        let req = ApiRequest::primary(Method::Get, ["api", "schedule", "current"]);
        let err = transport.url_for(&req).unwrap_err();
        assert_eq!(
            err,
            SyncError::Transport("mailto:ops@example.com cannot be a base url".into())
        );
    }
}
