//! Blocking WebHDFS REST client.
//!
//! Implements [`RemoteStorage`] over the `/webhdfs/v1` HTTP API, either
//! directly against a namenode (simple `user.name` authentication) or
//! through an Apache Knox gateway (HTTPS with basic authentication).
//!
//! Data-carrying writes (`CREATE`, `APPEND`) follow the WebHDFS two-step
//! protocol: the namenode answers the first, body-less request with a
//! `307 Temporary Redirect` naming a datanode, and the payload is sent to
//! that location. Redirects are never followed automatically so that the
//! payload is only ever transmitted once.

use crate::config::ConnectionConfig;
use crate::credentials::Credentials;
use crate::error::{ClientError, ClientResult};
use crate::path::HdfsPath;
use crate::remote::RemoteStorage;
use crate::status::{
    BooleanEnvelope, FileStatus, FileStatusEnvelope, ListStatusEnvelope, Permission,
    RemoteExceptionEnvelope,
};
use bytes::Bytes;
use reqwest::blocking::{Client, Response};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use zeroize::Zeroizing;

/// How requests identify the caller.
enum Auth {
    /// No identity (the namenode applies its default user).
    Anonymous,
    /// `user.name=` query parameter (simple authentication).
    Simple(String),
    /// HTTP basic authentication (Knox).
    Basic {
        username: String,
        password: Zeroizing<String>,
    },
}

/// WebHDFS client backed by `reqwest`'s blocking API.
pub struct WebHdfsClient {
    http: Client,
    base: Url,
    auth: Auth,
}

impl WebHdfsClient {
    /// Build a client for the given endpoint.
    ///
    /// `credentials` are used for basic authentication when `config.use_knox`
    /// is set; otherwise only the configured user name is sent.
    pub fn connect(
        config: &ConnectionConfig,
        credentials: Option<Credentials>,
    ) -> ClientResult<Self> {
        let base_url = config.base_url();
        let base = parse_base(&base_url)?;

        let mut builder = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("webhdfs-fuse/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = config.proxy_url() {
            let proxy = reqwest::Proxy::all(&proxy).map_err(|e| ClientError::InvalidUrl {
                url: proxy.clone(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        if let Some(cert_path) = &config.cert {
            let pem = std::fs::read(cert_path).map_err(|source| ClientError::Certificate {
                path: cert_path.clone(),
                source,
            })?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        let auth = match (config.use_knox, credentials, &config.username) {
            (true, Some(creds), _) => Auth::Basic {
                username: creds.username,
                password: creds.password,
            },
            (_, _, Some(user)) if !user.is_empty() => Auth::Simple(user.to_lowercase()),
            _ => Auth::Anonymous,
        };

        debug!(base = %base, knox = config.use_knox, "WebHDFS client configured");

        Ok(Self {
            http: builder.build()?,
            base,
            auth,
        })
    }

    /// Build a client for an explicit REST root such as `http://nn:9870/webhdfs/v1`.
    pub fn with_base_url(base_url: &str, user: Option<&str>) -> ClientResult<Self> {
        Ok(Self {
            http: Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()?,
            base: parse_base(base_url)?,
            auth: user.map_or(Auth::Anonymous, |u| Auth::Simple(u.to_string())),
        })
    }

    /// The REST root all paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &HdfsPath, op: &str, params: &[(&str, String)]) -> Url {
        let mut url = self.base.clone();
        // `parse_base` guarantees the base can carry path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            if path.is_root() {
                segments.push("");
            } else {
                segments.extend(path.components());
            }
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("op", op);
            for (key, value) in params {
                query.append_pair(key, value);
            }
            if let Auth::Simple(user) = &self.auth {
                query.append_pair("user.name", user);
            }
        }
        url
    }

    fn send(&self, method: Method, url: Url, body: Option<&[u8]>) -> ClientResult<Response> {
        trace!(%method, %url, "WebHDFS request");
        let mut request = self.http.request(method, url);
        if let Auth::Basic { username, password } = &self.auth {
            request = request.basic_auth(username, Some(password.as_str()));
        }
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(body.to_vec());
        }
        Ok(request.send()?)
    }

    /// Issue one request and turn error statuses into [`ClientError`]s.
    ///
    /// Success and redirect responses are returned to the caller.
    fn call(
        &self,
        method: Method,
        op: &'static str,
        path: &HdfsPath,
        params: &[(&str, String)],
    ) -> ClientResult<Response> {
        let response = self.send(method, self.url(path, op, params), None)?;
        check_status(path, response)
    }

    /// First leg of a data-carrying call, then the payload to the redirect target.
    fn two_step(
        &self,
        method: Method,
        op: &'static str,
        path: &HdfsPath,
        params: &[(&str, String)],
        data: &[u8],
    ) -> ClientResult<()> {
        let first = self.call(method.clone(), op, path, params)?;
        if !first.status().is_redirection() {
            // Some gateways complete body-less requests in one step.
            if data.is_empty() {
                return Ok(());
            }
            return Err(ClientError::MissingRedirect { op });
        }
        let target = redirect_target(op, &first)?;
        debug!(op, path = %path, target = %target, bytes = data.len(), "Following datanode redirect");
        let second = self.send(method, target, Some(data))?;
        check_status(path, second)?;
        Ok(())
    }
}

impl RemoteStorage for WebHdfsClient {
    fn fetch_status(&self, path: &HdfsPath) -> ClientResult<FileStatus> {
        let response = self.call(Method::GET, "GETFILESTATUS", path, &[])?;
        let envelope: FileStatusEnvelope = decode("GETFILESTATUS", response)?;
        Ok(envelope.file_status)
    }

    fn fetch_listing(&self, path: &HdfsPath) -> ClientResult<Vec<FileStatus>> {
        let response = self.call(Method::GET, "LISTSTATUS", path, &[])?;
        let envelope: ListStatusEnvelope = decode("LISTSTATUS", response)?;
        let entries = envelope.file_statuses.file_status;

        // Listing a file yields the file itself with an empty suffix.
        if let [only] = entries.as_slice()
            && only.path_suffix.is_empty()
            && !only.is_dir()
        {
            return Err(ClientError::NotADirectory {
                path: path.to_string(),
            });
        }
        Ok(entries)
    }

    fn read_range(&self, path: &HdfsPath, offset: u64, length: u64) -> ClientResult<Bytes> {
        let params = [("offset", offset.to_string()), ("length", length.to_string())];
        let first = self.call(Method::GET, "OPEN", path, &params)?;
        let response = if first.status().is_redirection() {
            let target = redirect_target("OPEN", &first)?;
            check_status(path, self.send(Method::GET, target, None)?)?
        } else {
            first
        };
        Ok(response.bytes()?)
    }

    fn create_empty(&self, path: &HdfsPath, permission: Permission) -> ClientResult<()> {
        let params = [
            ("overwrite", "true".to_string()),
            ("permission", permission.to_string()),
        ];
        self.two_step(Method::PUT, "CREATE", path, &params, &[])
    }

    fn append_bytes(&self, path: &HdfsPath, data: &[u8]) -> ClientResult<()> {
        self.two_step(Method::POST, "APPEND", path, &[], data)
    }

    fn make_directory(&self, path: &HdfsPath, permission: Permission) -> ClientResult<()> {
        let params = [("permission", permission.to_string())];
        let response = self.call(Method::PUT, "MKDIRS", path, &params)?;
        let result: BooleanEnvelope = decode("MKDIRS", response)?;
        if result.boolean {
            Ok(())
        } else {
            Err(ClientError::Rejected {
                op: "MKDIRS",
                path: path.to_string(),
            })
        }
    }

    fn delete(&self, path: &HdfsPath) -> ClientResult<bool> {
        let params = [("recursive", "true".to_string())];
        let response = self.call(Method::DELETE, "DELETE", path, &params)?;
        let result: BooleanEnvelope = decode("DELETE", response)?;
        Ok(result.boolean)
    }

    fn rename_path(&self, from: &HdfsPath, to: &HdfsPath) -> ClientResult<bool> {
        let params = [("destination", to.to_string())];
        let response = self.call(Method::PUT, "RENAME", from, &params)?;
        let result: BooleanEnvelope = decode("RENAME", response)?;
        Ok(result.boolean)
    }
}

fn parse_base(base_url: &str) -> ClientResult<Url> {
    let url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: "URL cannot carry a path".to_string(),
        });
    }
    Ok(url)
}

fn redirect_target(op: &'static str, response: &Response) -> ClientResult<Url> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ClientError::MissingRedirect { op })?;
    // Relative locations are resolved against the URL that produced them.
    response
        .url()
        .join(location)
        .map_err(|e| ClientError::InvalidUrl {
            url: location.to_string(),
            reason: e.to_string(),
        })
}

fn decode<T: DeserializeOwned>(op: &'static str, response: Response) -> ClientResult<T> {
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|source| ClientError::Decode { op, source })
}

fn check_status(path: &HdfsPath, response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() || status.is_redirection() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let (exception, message) = match serde_json::from_str::<RemoteExceptionEnvelope>(&body) {
        Ok(envelope) => (
            envelope.remote_exception.exception,
            envelope.remote_exception.message,
        ),
        Err(_) => (String::new(), body.trim().to_string()),
    };
    debug!(path = %path, status = status.as_u16(), exception = %exception, "WebHDFS error response");

    Err(match (status, exception.as_str()) {
        (_, "FileNotFoundException") | (StatusCode::NOT_FOUND, _) => ClientError::NotFound {
            path: path.to_string(),
        },
        (_, "AccessControlException") | (StatusCode::FORBIDDEN, _) => {
            ClientError::PermissionDenied {
                path: path.to_string(),
                message,
            }
        }
        (StatusCode::UNAUTHORIZED, _) => ClientError::Unauthorized,
        _ => ClientError::Remote {
            status: status.as_u16(),
            exception,
            message,
        },
    })
}
