//! The asynchronous Stormdesk REST client.

use std::path::Path;
use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Method, StatusCode, multipart};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::config::{ClientConfig, Credentials, TlsVerification};
use crate::error::{Error, Result};
use crate::retry::ConflictPolicy;
use crate::session::{Session, SessionInfo};

/// Name of the session cookie issued at login.
pub const SESSION_COOKIE: &str = "sd_session";
/// Header echoing the session's anti-CSRF token on every request.
pub const CSRF_HEADER: &str = "X-Csrf-Token";
/// Header forwarding a caller-supplied action context token.
pub const CONTEXT_HEADER: &str = "X-Action-Context";
/// User agent this crate reports to the platform.
pub const USER_AGENT: &str = concat!("stormdesk-client/", env!("CARGO_PKG_VERSION"));

/// Authenticated handle to one organization of a Stormdesk deployment.
///
/// All request paths are relative to the bound organization, so `get("/incidents/42")`
/// fetches `{base_url}/rest/orgs/{org_id}/incidents/42`. The handle is cheap to
/// clone and clones share the session, including re-authentication.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<Inner>,
    context_token: Option<String>,
}

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    config: ClientConfig,
    credentials: Credentials,
    session: RwLock<Session>,
    // Serializes re-authentication so a burst of rejected requests produces
    // one login, not one per request.
    refresh: Mutex<()>,
}

struct RequestSpec {
    method: Method,
    url: String,
    payload: Option<Payload>,
}

enum Payload {
    Json(Value),
    Multipart(UploadBody),
}

struct UploadBody {
    file_name: String,
    mime: String,
    data: Vec<u8>,
}

impl UploadBody {
    // Form is not Clone, so each (re)send builds a fresh one.
    fn to_form(&self) -> Result<multipart::Form> {
        let part = multipart::Part::bytes(self.data.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime)?;
        Ok(multipart::Form::new().part("file", part))
    }
}

impl Client {
    /// Authenticate against the platform and bind to an organization.
    ///
    /// Fails when the credentials are rejected or when the organization
    /// choice is ambiguous; see [`Error`] for the possible outcomes.
    pub async fn connect(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let http = build_http(&config)?;
        let session = login(&http, &config, &credentials, 1).await?;
        tracing::debug!(
            org_id = session.org_id,
            org = %session.org_name,
            user_id = session.user_id,
            "session established"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                config,
                credentials,
                session: RwLock::new(session),
                refresh: Mutex::new(()),
            }),
            context_token: None,
        })
    }

    /// A handle that forwards `token` as the action context on every request.
    ///
    /// The returned handle shares this client's session, so it is cheap to
    /// create one per processed event.
    pub fn with_context(&self, token: impl Into<String>) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            context_token: Some(token.into()),
        }
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.inner.config.base_url
    }

    /// Numeric id of the bound organization.
    pub async fn org_id(&self) -> u64 {
        self.inner.session.read().await.org_id
    }

    /// Name of the bound organization.
    pub async fn org_name(&self) -> String {
        self.inner.session.read().await.org_name.clone()
    }

    /// Numeric id of the authenticated user.
    pub async fn user_id(&self) -> u64 {
        self.inner.session.read().await.user_id
    }

    /// Email of the authenticated user, when the platform reports one.
    pub async fn user_email(&self) -> Option<String> {
        self.inner.session.read().await.user_email.clone()
    }

    /// Fetch the JSON resource at the org-relative `path`, e.g. `/incidents/42`.
    pub async fn get(&self, path: &str) -> Result<Value> {
        let spec = RequestSpec {
            method: Method::GET,
            url: self.org_url(path).await,
            payload: None,
        };
        let response = self.execute(&spec).await?;
        json_body(response).await
    }

    /// Fetch the raw bytes of `path`, e.g. an attachment's contents.
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let spec = RequestSpec {
            method: Method::GET,
            url: self.org_url(path).await,
            payload: None,
        };
        let response = self.execute(&spec).await?;
        if response.status() == StatusCode::OK {
            Ok(response.bytes().await?.to_vec())
        } else {
            Err(request_failed(response).await)
        }
    }

    /// Create a resource under `path` and return the server's representation.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let spec = RequestSpec {
            method: Method::POST,
            url: self.org_url(path).await,
            payload: Some(Payload::Json(body.clone())),
        };
        let response = self.execute(&spec).await?;
        json_body(response).await
    }

    /// Replace the resource at `path` outright, with no conflict handling.
    ///
    /// Most callers want [`update`](Self::update) instead, which folds in
    /// concurrent writers.
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let spec = RequestSpec {
            method: Method::PUT,
            url: self.org_url(path).await,
            payload: Some(Payload::Json(body.clone())),
        };
        let response = self.execute(&spec).await?;
        json_body(response).await
    }

    /// Delete the resource at `path`.
    ///
    /// Returns the response body when the server sends one and `None` on an
    /// empty 204 reply.
    pub async fn delete(&self, path: &str) -> Result<Option<Value>> {
        let spec = RequestSpec {
            method: Method::DELETE,
            url: self.org_url(path).await,
            payload: None,
        };
        let response = self.execute(&spec).await?;
        match response.status() {
            StatusCode::OK => Ok(Some(response.json().await?)),
            StatusCode::NO_CONTENT => Ok(None),
            _ => Err(request_failed(response).await),
        }
    }

    /// Upload a local file as a multipart attachment to `path`.
    ///
    /// The file name defaults to the path's final component and the MIME type
    /// is guessed from the extension when not given.
    pub async fn upload(
        &self,
        path: &str,
        file: &Path,
        file_name: Option<&str>,
        mime: Option<&str>,
    ) -> Result<Value> {
        let data = tokio::fs::read(file).await?;
        let file_name = match file_name {
            Some(name) => name.to_string(),
            None => file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".to_string()),
        };
        let mime = match mime {
            Some(mime) => mime.to_string(),
            None => mime_guess::from_path(file)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        };
        let spec = RequestSpec {
            method: Method::POST,
            url: self.org_url(path).await,
            payload: Some(Payload::Multipart(UploadBody {
                file_name,
                mime,
                data,
            })),
        };
        let response = self.execute(&spec).await?;
        json_body(response).await
    }

    /// Optimistically update the resource at `path`.
    ///
    /// Fetches the current representation, lets `apply` mutate it in place and
    /// writes the result back. When the write conflicts with another writer
    /// the whole cycle restarts from a fresh snapshot, so `apply` must be
    /// re-runnable and must not assume any particular starting state. Retries
    /// indefinitely; use [`update_with`](Self::update_with) to bound them.
    ///
    /// Returns the representation from the final successful write.
    pub async fn update<F>(&self, path: &str, apply: F) -> Result<Value>
    where
        F: FnMut(&mut Value) + Send,
    {
        self.update_with(path, &ConflictPolicy::new(), apply).await
    }

    /// [`update`](Self::update) under an explicit [`ConflictPolicy`].
    pub async fn update_with<F>(
        &self,
        path: &str,
        policy: &ConflictPolicy,
        mut apply: F,
    ) -> Result<Value>
    where
        F: FnMut(&mut Value) + Send,
    {
        let url = self.org_url(path).await;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let fetch = RequestSpec {
                method: Method::GET,
                url: url.clone(),
                payload: None,
            };
            let response = self.execute(&fetch).await?;
            let mut snapshot = json_body(response).await?;
            apply(&mut snapshot);
            let put = RequestSpec {
                method: Method::PUT,
                url: url.clone(),
                payload: Some(Payload::Json(snapshot)),
            };
            let response = self.execute(&put).await?;
            match response.status() {
                StatusCode::OK => return Ok(response.json().await?),
                StatusCode::CONFLICT => {
                    if !policy.allows_another(attempts) {
                        return Err(Error::ConflictExhausted { attempts });
                    }
                    tracing::debug!(url = %url, attempts, "conflicting write, retrying from a fresh snapshot");
                    if let Some(delay) = policy.delay_after(attempts) {
                        tokio::time::sleep(delay).await;
                    }
                }
                _ => return Err(request_failed(response).await),
            }
        }
    }

    async fn org_url(&self, path: &str) -> String {
        let session = self.inner.session.read().await;
        format!(
            "{}/rest/orgs/{}{}",
            self.inner.config.base_url, session.org_id, path
        )
    }

    /// Send once; on a 401, re-authenticate and replay exactly once. The
    /// second response is returned as-is, so a repeat 401 surfaces as a plain
    /// request failure to the caller.
    async fn execute(&self, spec: &RequestSpec) -> Result<reqwest::Response> {
        let (response, epoch) = self.send_once(spec).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        self.reauthenticate(epoch).await?;
        let (response, _) = self.send_once(spec).await?;
        Ok(response)
    }

    async fn send_once(&self, spec: &RequestSpec) -> Result<(reqwest::Response, u64)> {
        let (cookie, csrf_token, epoch) = {
            let session = self.inner.session.read().await;
            (
                session.cookie.clone(),
                session.csrf_token.clone(),
                session.epoch,
            )
        };
        let mut request = self
            .inner
            .http
            .request(spec.method.clone(), &spec.url)
            .header(COOKIE, format!("{SESSION_COOKIE}={cookie}"))
            .header(CSRF_HEADER, csrf_token);
        if let Some(token) = &self.context_token {
            request = request.header(CONTEXT_HEADER, token);
        }
        request = match &spec.payload {
            None => request.header(CONTENT_TYPE, "application/json"),
            Some(Payload::Json(body)) => request.json(body),
            Some(Payload::Multipart(upload)) => request.multipart(upload.to_form()?),
        };
        Ok((request.send().await?, epoch))
    }

    /// Replace the session that was rejected at `observed_epoch`. When a
    /// concurrent caller already did so, this is a no-op, so one burst of
    /// rejected requests triggers a single login.
    async fn reauthenticate(&self, observed_epoch: u64) -> Result<()> {
        let _refresh = self.inner.refresh.lock().await;
        if self.inner.session.read().await.epoch > observed_epoch {
            return Ok(());
        }
        tracing::debug!("session rejected, re-authenticating");
        let session = login(
            &self.inner.http,
            &self.inner.config,
            &self.inner.credentials,
            observed_epoch + 1,
        )
        .await
        .map_err(|err| Error::Unauthenticated(Box::new(err)))?;
        *self.inner.session.write().await = session;
        Ok(())
    }
}

async fn login(
    http: &reqwest::Client,
    config: &ClientConfig,
    credentials: &Credentials,
    epoch: u64,
) -> Result<Session> {
    let url = format!("{}/rest/session", config.base_url);
    let body = serde_json::json!({
        "email": credentials.email,
        "password": credentials.password,
    });
    let response = http.post(&url).json(&body).send().await?;
    if response.status() != StatusCode::OK {
        return Err(request_failed(response).await);
    }
    let cookie = response
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| {
            Error::MalformedSession(format!("no {SESSION_COOKIE} cookie in login response"))
        })?;
    let info: SessionInfo = response.json().await?;
    let org = info.resolve_org(config.org_name.as_deref())?;
    let (org_id, org_name) = (org.id, org.name.clone());
    Ok(Session {
        csrf_token: info.csrf_token,
        cookie,
        org_id,
        org_name,
        user_id: info.user_id,
        user_email: info.user_email,
        epoch,
    })
}

fn build_http(config: &ClientConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout);
    match &config.tls {
        TlsVerification::Enabled => {}
        TlsVerification::CaBundle(path) => {
            let pem = std::fs::read(path)?;
            let certificates = reqwest::Certificate::from_pem_bundle(&pem)?;
            if certificates.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "no certificates in CA bundle {}",
                    path.display()
                )));
            }
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }
        TlsVerification::Disabled => {
            builder = builder.danger_accept_invalid_certs(true);
        }
    }
    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

async fn json_body(response: reqwest::Response) -> Result<Value> {
    if response.status() == StatusCode::OK {
        Ok(response.json().await?)
    } else {
        Err(request_failed(response).await)
    }
}

async fn request_failed(response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::RequestFailed { status, body }
}
