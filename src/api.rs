// API client module: a small blocking HTTP client for the Ada matching
// service. It logs in once, uploads a spreadsheet and triggers a match
// job against it, checking the status code of every response.

use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::AdaConfig;
use crate::error::{AdaError, Call, ParseTriggerActionError};

const LOGIN_PATH: &str = "api/v1/users/login";
const UPLOAD_PATH: &str = "api/v2/upload/";
const TRIGGER_PATH: &str = "api/v2/trigger/";

/// What the service should do with a matched upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerAction {
    /// Insert the new records.
    Load,
    /// Preview the changes without committing anything.
    Difference,
}

impl TriggerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerAction::Load => "load",
            TriggerAction::Difference => "difference",
        }
    }
}

impl fmt::Display for TriggerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerAction {
    type Err = ParseTriggerActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(TriggerAction::Load),
            "difference" => Ok(TriggerAction::Difference),
            other => Err(ParseTriggerActionError(other.to_string())),
        }
    }
}

/// Cookie jar filled by the login endpoint.
///
/// Cookies keep their `Path`, `Domain` and expiry attributes, so each
/// request only carries the cookies that apply to its URL.
#[derive(Clone)]
pub struct Session {
    jar: Arc<Jar>,
}

// Cookie values are credentials; keep them out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    fn from_login(res: &Response, url: &Url) -> Self {
        let jar = Jar::default();
        let mut set_cookies = res.headers().get_all(SET_COOKIE).iter();
        jar.set_cookies(&mut set_cookies, url);
        Session { jar: Arc::new(jar) }
    }

    /// `Cookie` header value the session sends to `url`, if any cookie applies.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    fn attach(&self, req: RequestBuilder, url: &Url) -> RequestBuilder {
        match self.jar.cookies(url) {
            Some(value) => req.header(COOKIE, value),
            None => req,
        }
    }
}

/// Login request payload.
#[derive(Serialize, Debug)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Trigger request payload. `upload` is the id returned by the upload call.
#[derive(Serialize, Debug)]
struct TriggerRequest {
    template: i64,
    trigger_action: TriggerAction,
    upload: i64,
}

/// The server's record of an uploaded file.
#[derive(Deserialize, Debug, Clone)]
pub struct Upload {
    pub id: i64,
    pub file_name: String,
    pub file_url: String,
    /// Full response body, including fields we do not model.
    #[serde(skip)]
    pub raw: Value,
}

/// The server's record of a triggered match.
#[derive(Deserialize, Debug, Clone)]
pub struct Trigger {
    pub id: i64,
    /// Echoed back by the server. Kept as a string so an unexpected value
    /// does not fail the call.
    pub trigger_action: String,
    #[serde(skip)]
    pub raw: Value,
}

impl Trigger {
    pub fn action(&self) -> Option<TriggerAction> {
        self.trigger_action.parse().ok()
    }
}

/// Link to the page in the Ada web UI that shows the job's progress.
///
/// `load` jobs live under `upload/process/{id}`, `difference` jobs under
/// `upload/preview/{id}`. Any other action has no page.
pub fn monitor_url(base_url: &str, trigger: &Trigger) -> Option<String> {
    let section = match trigger.action()? {
        TriggerAction::Load => "process",
        TriggerAction::Difference => "preview",
    };
    Some(format!("{base_url}upload/{section}/{}", trigger.id))
}

/// Blocking client for one Ada deployment. Holds the reqwest client, the
/// configuration and the session obtained by the first login.
pub struct AdaClient {
    client: Client,
    config: AdaConfig,
    session: Option<Session>,
}

impl AdaClient {
    pub fn new(config: AdaConfig) -> Result<Self, AdaError> {
        let client = Client::builder().build()?;
        Ok(AdaClient {
            client,
            config,
            session: None,
        })
    }

    pub fn config(&self) -> &AdaConfig {
        &self.config
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Forget the cached session so the next call logs in again.
    pub fn clear_session(&mut self) {
        self.session = None;
    }

    /// Log in unless a session is already cached, and return the session.
    ///
    /// Only the first successful call talks to the server; after that the
    /// same session is handed back for the lifetime of the client.
    pub fn authenticate(&mut self) -> Result<&Session, AdaError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => self.login()?,
        };
        Ok(&*self.session.insert(session))
    }

    /// Absolute URL of an endpoint below the configured base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, AdaError> {
        let url = self.config.url(path);
        Url::parse(&url).map_err(|e| AdaError::Config(format!("invalid URL {url}: {e}")))
    }

    fn login(&self) -> Result<Session, AdaError> {
        let url = self.endpoint(LOGIN_PATH)?;
        debug!(%url, email = %self.config.email, "logging in");
        let payload = LoginRequest {
            email: &self.config.email,
            password: &self.config.password,
        };
        let res = self
            .client
            .post(url.clone())
            .json(&payload)
            .send()
            .map_err(|source| AdaError::Transport {
                call: Call::Login,
                source,
            })?;

        // Cookies have to be read before the body consumes the response.
        let session = Session::from_login(&res, &url);
        read_body(Call::Login, res, &[200])?;

        debug!("login succeeded");
        Ok(session)
    }

    /// Upload a csv or xlsx file and return the server's upload record.
    ///
    /// The file is opened before logging in, so a missing file fails
    /// without any network traffic. The handle moves into the multipart
    /// body and is closed once the request is done, whatever the outcome.
    pub fn upload_file(&mut self, path: &Path) -> Result<Upload, AdaError> {
        let file = File::open(path).map_err(|source| AdaError::File {
            path: path.to_path_buf(),
            source,
        })?;
        let len = file
            .metadata()
            .map_err(|source| AdaError::File {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload")
            .to_string();

        let session = self.authenticate()?.clone();

        // Content types are constants; a parse failure is a bug in the table.
        let part = multipart::Part::reader_with_length(file, len)
            .file_name(file_name)
            .mime_str(content_type_for(path))?;
        let form = multipart::Form::new().part("file", part);

        let url = self.endpoint(UPLOAD_PATH)?;
        debug!(%url, path = %path.display(), bytes = len, "uploading file");
        let req = session.attach(self.client.post(url.clone()).multipart(form), &url);
        let res = req.send().map_err(|source| AdaError::Transport {
            call: Call::Upload,
            source,
        })?;
        let body = read_body(Call::Upload, res, &[201])?;

        let raw = decode(Call::Upload, &body)?;
        let mut upload = Upload::deserialize(&raw).map_err(|source| AdaError::Decode {
            call: Call::Upload,
            source,
        })?;
        upload.raw = raw;

        info!(
            "Upload id {} posted {} to {}",
            upload.id, upload.file_name, upload.file_url
        );
        Ok(upload)
    }

    /// Start a match job for a previous upload.
    ///
    /// An echoed action other than `load` or `difference` is logged as an
    /// error but the trigger record is still returned.
    pub fn trigger_match(
        &mut self,
        upload: &Upload,
        template_id: i64,
        action: TriggerAction,
    ) -> Result<Trigger, AdaError> {
        let session = self.authenticate()?.clone();
        let payload = TriggerRequest {
            template: template_id,
            trigger_action: action,
            upload: upload.id,
        };

        let url = self.endpoint(TRIGGER_PATH)?;
        debug!(%url, upload = upload.id, template = template_id, %action, "triggering match");
        let req = session.attach(self.client.post(url.clone()).json(&payload), &url);
        let res = req.send().map_err(|source| AdaError::Transport {
            call: Call::Trigger,
            source,
        })?;
        let body = read_body(Call::Trigger, res, &[201])?;

        let raw = decode(Call::Trigger, &body)?;
        let mut trigger = Trigger::deserialize(&raw).map_err(|source| AdaError::Decode {
            call: Call::Trigger,
            source,
        })?;
        trigger.raw = raw;

        info!("Triggered match in {} mode.", trigger.trigger_action);
        match monitor_url(&self.config.base_url, &trigger) {
            Some(link) => info!("Monitor progress at {link}"),
            None => error!("trigger_action may only take the value \"load\" or \"difference\""),
        }
        Ok(trigger)
    }

    /// `trigger_match` with the template and action from the configuration.
    pub fn trigger_default(&mut self, upload: &Upload) -> Result<Trigger, AdaError> {
        let template_id = self.config.default_template_id;
        let action = self.config.default_trigger_action;
        self.trigger_match(upload, template_id, action)
    }
}

/// Read the body and fail unless the status is one of `expected`.
fn read_body(call: Call, res: Response, expected: &[u16]) -> Result<String, AdaError> {
    let status = res.status().as_u16();
    let body = res
        .text()
        .map_err(|source| AdaError::Transport { call, source })?;
    if !expected.contains(&status) {
        return Err(AdaError::UnexpectedStatus { call, status, body });
    }
    Ok(body)
}

fn decode(call: Call, body: &str) -> Result<Value, AdaError> {
    serde_json::from_str(body).map_err(|source| AdaError::Decode { call, source })
}

// Content type sent with the uploaded file, picked from its extension.
fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        _ => "application/octet-stream",
    }
}
