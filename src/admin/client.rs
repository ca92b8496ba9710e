//! Admin RPC Client
//!
//! Issues administrative commands against a single storage node. A client is built per
//! logical call group and dropped afterwards; it holds no session state and never
//! retries on its own.

use super::error::AdminError;
use super::protocol::*;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{Instrument, Span};
use uuid::Uuid;

/// Address used by the "local" variants of every operation.
pub const LOCALHOST: &str = "127.0.0.1";

pub struct AdminClient {
    http_client: reqwest::Client,
    addr: String,
    span: Span,
}

impl AdminClient {
    /// Builds a client for `host:port`.
    ///
    /// `timeout` bounds every request issued through this client; there is no other
    /// deadline logic on top of it.
    pub fn connect(host: &str, port: u16, timeout: Duration, span: Span) -> Result<Self, AdminError> {
        let addr = format!("{}:{}", host, port);
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|source| AdminError::Transport {
                addr: addr.clone(),
                source,
            })?;

        Ok(Self {
            http_client,
            addr,
            span,
        })
    }

    pub fn connect_local(port: u16, timeout: Duration, span: Span) -> Result<Self, AdminError> {
        Self::connect(LOCALHOST, port, timeout, span)
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Sends one admin request and decodes the answer.
    ///
    /// A non-success answer is decoded as an [`AdminErrorResponse`]; its code is surfaced
    /// as [`AdminError::Remote`]. Anything that does not decode is [`AdminError::Protocol`].
    pub async fn call<Req, Resp>(&self, endpoint: &'static str, request: &Req) -> Result<Resp, AdminError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::debug_span!(
            parent: &self.span,
            "admin_call",
            addr = %self.addr,
            endpoint,
            request_id = %request_id
        );

        async move {
            let url = format!("http://{}{}", self.addr, endpoint);
            let response = self
                .http_client
                .post(url)
                .header(REQUEST_ID_HEADER, request_id.as_str())
                .json(request)
                .send()
                .await
                .map_err(|source| self.transport_error(source))?;

            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|source| self.transport_error(source))?;

            if status.is_success() {
                return serde_json::from_slice(&body).map_err(|e| {
                    AdminError::Protocol(format!("malformed {} response: {}", endpoint, e))
                });
            }

            match serde_json::from_slice::<AdminErrorResponse>(&body) {
                Ok(rejection) => {
                    tracing::debug!("Rejected with {}: {}", rejection.code, rejection.message);
                    Err(AdminError::Remote {
                        code: rejection.code,
                        message: rejection.message,
                    })
                }
                Err(_) => Err(AdminError::Protocol(format!(
                    "{} answered {} without an admin error body",
                    endpoint, status
                ))),
            }
        }
        .instrument(span)
        .await
    }

    fn transport_error(&self, source: reqwest::Error) -> AdminError {
        AdminError::Transport {
            addr: self.addr.clone(),
            source,
        }
    }

    pub async fn add_db(&self, request: &AddDbRequest) -> Result<(), AdminError> {
        self.call::<_, EmptyResponse>(ENDPOINT_ADD_DB, request)
            .await
            .map(drop)
    }

    pub async fn close_db(&self, request: &CloseDbRequest) -> Result<(), AdminError> {
        self.call::<_, EmptyResponse>(ENDPOINT_CLOSE_DB, request)
            .await
            .map(drop)
    }

    pub async fn clear_db(&self, request: &ClearDbRequest) -> Result<(), AdminError> {
        self.call::<_, EmptyResponse>(ENDPOINT_CLEAR_DB, request)
            .await
            .map(drop)
    }

    pub async fn compact_db(&self, request: &CompactDbRequest) -> Result<(), AdminError> {
        self.call::<_, EmptyResponse>(ENDPOINT_COMPACT_DB, request)
            .await
            .map(drop)
    }

    pub async fn check_db(&self, request: &CheckDbRequest) -> Result<CheckDbResponse, AdminError> {
        self.call(ENDPOINT_CHECK_DB, request).await
    }

    pub async fn get_sequence_number(
        &self,
        request: &GetSequenceNumberRequest,
    ) -> Result<GetSequenceNumberResponse, AdminError> {
        self.call(ENDPOINT_GET_SEQUENCE_NUMBER, request).await
    }

    pub async fn change_db_role_and_upstream(
        &self,
        request: &ChangeDbRoleAndUpstreamRequest,
    ) -> Result<(), AdminError> {
        self.call::<_, EmptyResponse>(ENDPOINT_CHANGE_ROLE_AND_UPSTREAM, request)
            .await
            .map(drop)
    }

    pub async fn backup_db(&self, request: &BackupDbRequest) -> Result<(), AdminError> {
        self.call::<_, EmptyResponse>(ENDPOINT_BACKUP_DB, request)
            .await
            .map(drop)
    }

    pub async fn backup_db_to_s3(&self, request: &BackupDbToS3Request) -> Result<(), AdminError> {
        self.call::<_, EmptyResponse>(ENDPOINT_BACKUP_DB_TO_S3, request)
            .await
            .map(drop)
    }

    pub async fn restore_db(&self, request: &RestoreDbRequest) -> Result<(), AdminError> {
        self.call::<_, EmptyResponse>(ENDPOINT_RESTORE_DB, request)
            .await
            .map(drop)
    }

    pub async fn restore_db_from_s3(
        &self,
        request: &RestoreDbFromS3Request,
    ) -> Result<(), AdminError> {
        self.call::<_, EmptyResponse>(ENDPOINT_RESTORE_DB_FROM_S3, request)
            .await
            .map(drop)
    }
}
