//! NITRO REST client.
//!
//! Thin HTTP wrapper implementing [`ApplianceSession`] against the
//! `/nitro/v1/config` API. Authentication happens eagerly in
//! [`NitroClient::connect`]; the returned session token is replayed as the
//! `NITRO_AUTH_TOKEN` cookie on every call.

use crate::config::BackupLevel;
use crate::nitro::resources::{
    SystemBackupCreate, SystemCmdPolicy, SystemCmdPolicyBinding, SystemUser, BACKUP_FILE_LOCATION,
    HA_NODE_ID,
};
use crate::nitro::{ApplianceSession, NitroError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug)]
pub struct NitroClient {
    http: reqwest::Client,
    base_url: String,
    session_token: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    sessionid: String,
}

#[derive(Deserialize)]
struct HaNodeResponse {
    #[serde(default)]
    hanode: Vec<HaNodeEntry>,
}

#[derive(Deserialize)]
struct HaNodeEntry {
    #[serde(default)]
    state: Option<String>,
}

#[derive(Deserialize)]
struct SystemFileResponse {
    #[serde(default)]
    systemfile: Vec<SystemFileEntry>,
}

#[derive(Deserialize)]
struct SystemFileEntry {
    #[serde(default)]
    filecontent: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    errorcode: i64,
    message: String,
}

impl NitroClient {
    /// Open an authenticated session against one appliance node.
    pub async fn connect(
        base_url: &str,
        username: &str,
        password: &str,
        validate_certificate: bool,
    ) -> Result<Self, NitroError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!validate_certificate)
            .build()?;

        let url = format!("{base_url}/nitro/v1/config/login");
        let body = json!({ "login": { "username": username, "password": password } });
        let response = http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let login: LoginResponse = response.json().await?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            session_token: login.sessionid,
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/nitro/v1/config/{resource}", self.base_url)
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, NitroError> {
        let response = builder
            .header(
                reqwest::header::COOKIE,
                format!("NITRO_AUTH_TOKEN={}", self.session_token),
            )
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn post(&self, resource: &str, body: serde_json::Value) -> Result<(), NitroError> {
        self.send(self.http.post(self.url(resource)).json(&body))
            .await?;
        Ok(())
    }

    async fn put(&self, resource: &str, body: serde_json::Value) -> Result<(), NitroError> {
        self.send(self.http.put(self.url(resource)).json(&body))
            .await?;
        Ok(())
    }

    async fn delete(&self, resource: &str) -> Result<(), NitroError> {
        self.send(self.http.delete(self.url(resource))).await?;
        Ok(())
    }

    async fn error_from(response: reqwest::Response) -> NitroError {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => NitroError::Api {
                errorcode: body.errorcode,
                message: body.message,
            },
            Err(_) => NitroError::UnexpectedResponse(format!("HTTP {status}")),
        }
    }
}

#[async_trait]
impl ApplianceSession for NitroClient {
    async fn ha_node_state(&self) -> Result<String, NitroError> {
        let response = self
            .send(self.http.get(self.url(&format!("hanode/{HA_NODE_ID}"))))
            .await?;
        let body: HaNodeResponse = response.json().await?;
        body.hanode
            .into_iter()
            .next()
            .and_then(|entry| entry.state)
            .ok_or_else(|| NitroError::UnexpectedResponse("HA node state missing".to_string()))
    }

    async fn create_backup(&self, name: &str, level: BackupLevel) -> Result<(), NitroError> {
        // The appliance expects the backup name without extension
        let filename = name.strip_suffix(".tgz").unwrap_or(name);
        let level = level.to_string();
        let payload = SystemBackupCreate {
            filename,
            level: &level,
        };
        self.post("systembackup?action=create", json!({ "systembackup": payload }))
            .await
    }

    async fn download_file(&self, name: &str) -> Result<String, NitroError> {
        let location = BACKUP_FILE_LOCATION.replace('/', "%2F");
        let url = format!(
            "{}?args=filelocation:{location}",
            self.url(&format!("systemfile/{name}"))
        );
        let response = self.send(self.http.get(url)).await?;
        let body: SystemFileResponse = response.json().await?;
        body.systemfile
            .into_iter()
            .next()
            .and_then(|entry| entry.filecontent)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                NitroError::UnexpectedResponse(format!("no file content returned for {name}"))
            })
    }

    async fn delete_backup(&self, name: &str) -> Result<(), NitroError> {
        self.delete(&format!("systembackup/{name}")).await
    }

    async fn create_cmd_policy(&self, name: &str, cmdspec: &str) -> Result<(), NitroError> {
        let payload = SystemCmdPolicy {
            policyname: name,
            action: "ALLOW",
            cmdspec,
        };
        self.post("systemcmdpolicy", json!({ "systemcmdpolicy": payload }))
            .await
    }

    async fn create_user(&self, username: &str, password: &str) -> Result<(), NitroError> {
        let payload = SystemUser {
            username,
            password,
            externalauth: "disabled",
            timeout: 60,
        };
        self.post("systemuser", json!({ "systemuser": payload }))
            .await
    }

    async fn bind_cmd_policy(
        &self,
        username: &str,
        policy: &str,
        priority: u32,
    ) -> Result<(), NitroError> {
        let payload = SystemCmdPolicyBinding {
            username,
            policyname: policy,
            priority,
        };
        self.put(
            "systemuser_systemcmdpolicy_binding",
            json!({ "systemuser_systemcmdpolicy_binding": payload }),
        )
        .await
    }

    async fn delete_user(&self, username: &str) -> Result<(), NitroError> {
        self.delete(&format!("systemuser/{username}")).await
    }

    async fn delete_cmd_policy(&self, name: &str) -> Result<(), NitroError> {
        self.delete(&format!("systemcmdpolicy/{name}")).await
    }

    async fn save_config(&self) -> Result<(), NitroError> {
        self.post("nsconfig?action=save", json!({ "nsconfig": {} }))
            .await
    }
}
