//! qBittorrent WebUI (API v2) client.
//!
//! Logs in lazily on the first submission and keeps the session cookie in
//! the HTTP client's cookie store. An expired session (403 on add) triggers
//! one fresh login and one retry.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::REFERER;
use reqwest::multipart::{Form, Part};

use super::{SubmissionClient, SubmitError, SubmitOutcome};
use crate::config::QbittorrentConfig;

const TORRENT_MIME: &str = "application/x-bittorrent";

/// Reply to `torrents/add` before session handling.
#[derive(Debug, PartialEq, Eq)]
enum AddReply {
    Done(SubmitOutcome),
    Forbidden,
}

/// Not `Debug`: it holds the WebUI password.
pub struct QbittorrentClient {
    /// Base URL without trailing slash; `None` until configured.
    base_url: Option<String>,
    username: String,
    password: String,
    http: reqwest::Client,
    logged_in: AtomicBool,
}

impl QbittorrentClient {
    /// Build a client from configuration.
    ///
    /// Succeeds even without a URL so that misconfiguration surfaces per
    /// file instead of at startup.
    pub fn new(config: &QbittorrentConfig) -> Result<Self, SubmitError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;

        let base_url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| url.trim_end_matches('/').to_string());

        Ok(Self {
            base_url,
            username: config.username.clone().unwrap_or_default(),
            password: config.password.clone().unwrap_or_default(),
            http,
            logged_in: AtomicBool::new(false),
        })
    }

    fn base_url(&self) -> Result<&str, SubmitError> {
        self.base_url.as_deref().ok_or(SubmitError::NotConfigured)
    }

    fn endpoint(&self, path: &str) -> Result<String, SubmitError> {
        Ok(format!("{}/api/v2/{path}", self.base_url()?))
    }

    async fn login(&self) -> Result<(), SubmitError> {
        let url = self.endpoint("auth/login")?;
        crate::debug_event!("qbittorrent", "login", "{url}");

        let response = self
            .http
            .post(&url)
            .header(REFERER, self.base_url()?)
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        interpret_login(status, &body)?;

        self.logged_in.store(true, Ordering::SeqCst);
        crate::debug_event!("qbittorrent", "logged in");
        Ok(())
    }

    async fn ensure_login(&self) -> Result<(), SubmitError> {
        if self.logged_in.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.login().await
    }

    async fn add(&self, file_name: &str, torrent: Bytes) -> Result<AddReply, SubmitError> {
        let url = self.endpoint("torrents/add")?;
        let form = Form::new().part("torrents", torrent_part(file_name, torrent)?);

        let response = self
            .http
            .post(&url)
            .header(REFERER, self.base_url()?)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        interpret_add(status, &body)
    }
}

#[async_trait]
impl SubmissionClient for QbittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn submit(
        &self,
        file_name: &str,
        torrent: Vec<u8>,
    ) -> Result<SubmitOutcome, SubmitError> {
        self.ensure_login().await?;

        // Shared buffer; the retry below re-sends it without copying
        let torrent = Bytes::from(torrent);
        match self.add(file_name, torrent.clone()).await? {
            AddReply::Done(outcome) => Ok(outcome),
            AddReply::Forbidden => {
                crate::debug_event!("qbittorrent", "session expired, logging in again");
                self.logged_in.store(false, Ordering::SeqCst);
                self.login().await?;

                match self.add(file_name, torrent).await? {
                    AddReply::Done(outcome) => Ok(outcome),
                    AddReply::Forbidden => Err(SubmitError::Auth {
                        reason: "session rejected right after login".to_string(),
                    }),
                }
            }
        }
    }
}

fn torrent_part(file_name: &str, torrent: Bytes) -> Result<Part, SubmitError> {
    let length = torrent.len() as u64;
    Ok(Part::stream_with_length(torrent, length)
        .file_name(file_name.to_string())
        .mime_str(TORRENT_MIME)?)
}

fn interpret_login(status: StatusCode, body: &str) -> Result<(), SubmitError> {
    if status == StatusCode::FORBIDDEN {
        return Err(SubmitError::Auth {
            reason: "client IP is banned after too many failed logins".to_string(),
        });
    }
    if !status.is_success() {
        return Err(SubmitError::Status {
            status,
            body: body.trim().to_string(),
        });
    }
    match body.trim() {
        "Ok." => Ok(()),
        _ => Err(SubmitError::Auth {
            reason: "invalid username or password".to_string(),
        }),
    }
}

fn interpret_add(status: StatusCode, body: &str) -> Result<AddReply, SubmitError> {
    let body = body.trim();
    match status {
        StatusCode::FORBIDDEN => Ok(AddReply::Forbidden),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => Ok(AddReply::Done(SubmitOutcome::Rejected {
            reason: "not a valid torrent file".to_string(),
        })),
        s if s.is_success() => match body {
            "Fails." => Ok(AddReply::Done(SubmitOutcome::Rejected {
                reason: "qBittorrent refused the torrent".to_string(),
            })),
            _ => Ok(AddReply::Done(SubmitOutcome::Accepted)),
        },
        _ => Err(SubmitError::Status {
            status,
            body: body.to_string(),
        }),
    }
}
