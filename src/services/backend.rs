use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::ServiceError;
use crate::chat::Assistant;
use crate::config::{self, AppConfig};
use crate::intake::{
    DoctorVerifier, PrescriptionFormat, PrescriptionParser, SafetyChecker, UploadRequest,
};
use crate::models::{
    DoctorVerification, DoctorVerificationRequest, Message, MessageRole, ParseResponse,
    SafetyCheckRequest, SafetyReport, VettedPrescription,
};

/// HTTP client for the prescription backend.
///
/// One instance serves all four collaborators (parser, doctor verifier,
/// safety checker, assistant). Cheap to clone.
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        Self::new(&config.service_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_connect() {
            ServiceError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            ServiceError::Timeout(self.timeout)
        } else {
            ServiceError::HttpClient(e.to_string())
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))
    }
}

/// Body of `POST /api/v1/verify-doctor`. The backend expects an empty
/// council string when it should resolve the council itself.
#[derive(Serialize)]
struct VerifyDoctorPayload<'a> {
    doctor_name: &'a str,
    registration_number: &'a str,
    medical_council: &'a str,
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    messages: Vec<ChatTurn<'a>>,
    message: &'a str,
    prescription: &'a VettedPrescription,
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatReply {
    reply: String,
}

#[async_trait]
impl PrescriptionParser for BackendClient {
    async fn parse(&self, upload: &UploadRequest) -> Result<ParseResponse, ServiceError> {
        let format = PrescriptionFormat::from_media_type(&upload.media_type);
        let file_name = format
            .map(|f| upload.upload_name(f))
            .or_else(|| upload.file_name.clone())
            .unwrap_or_else(|| "prescription".to_string());

        let part = Part::bytes(upload.bytes.clone())
            .file_name(file_name)
            .mime_str(format.map(|f| f.mime_type()).unwrap_or(upload.media_type.as_str()))
            .map_err(|e| ServiceError::HttpClient(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(config::UPLOAD_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::HttpClient(e.to_string()))?;

        // Rejections come back as `{success: false, error}`, sometimes with a
        // 4xx status. Prefer the structured body whenever it decodes.
        match serde_json::from_str::<ParseResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            }),
            Err(e) => Err(ServiceError::ResponseParsing(e.to_string())),
        }
    }
}

#[async_trait]
impl DoctorVerifier for BackendClient {
    async fn verify(
        &self,
        request: &DoctorVerificationRequest,
    ) -> Result<DoctorVerification, ServiceError> {
        let payload = VerifyDoctorPayload {
            doctor_name: &request.doctor_name,
            registration_number: &request.registration_number,
            medical_council: request.medical_council.as_deref().unwrap_or(""),
        };
        self.post_json(config::VERIFY_DOCTOR_PATH, &payload).await
    }
}

#[async_trait]
impl SafetyChecker for BackendClient {
    async fn check(&self, request: &SafetyCheckRequest) -> Result<SafetyReport, ServiceError> {
        self.post_json(config::MEDICINE_SAFETY_PATH, request).await
    }
}

#[async_trait]
impl Assistant for BackendClient {
    async fn reply(
        &self,
        prescription: &VettedPrescription,
        transcript: &[Message],
        message: &str,
    ) -> Result<String, ServiceError> {
        let payload = ChatPayload {
            messages: transcript
                .iter()
                .map(|m| ChatTurn {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            message,
            prescription,
        };
        let reply: ChatReply = self.post_json(config::CHAT_PATH, &payload).await?;
        Ok(reply.reply)
    }
}
