//! Deployment bridge.
//!
//! The deployment platform is reached through one server-side function
//! that takes `{method, data}` and answers with JSON. This module names the
//! methods and turns failure statuses and `{"error": ...}` bodies into
//! [`DeployError`]. What each method does on the platform side is the
//! function's business.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::backend::{BackendError, RecordStore};
use crate::notice::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeployMethod {
    ListProjects,
    CreateProject,
    DeleteProject,
    ListDomains,
    AddDomain,
    RemoveDomain,
    ListEnvVars,
    CreateEnvVar,
    DeleteEnvVar,
    ListDeployments,
    CreateDeployment,
}

impl DeployMethod {
    pub const ALL: [DeployMethod; 11] = [
        Self::ListProjects,
        Self::CreateProject,
        Self::DeleteProject,
        Self::ListDomains,
        Self::AddDomain,
        Self::RemoveDomain,
        Self::ListEnvVars,
        Self::CreateEnvVar,
        Self::DeleteEnvVar,
        Self::ListDeployments,
        Self::CreateDeployment,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListProjects => "listProjects",
            Self::CreateProject => "createProject",
            Self::DeleteProject => "deleteProject",
            Self::ListDomains => "listDomains",
            Self::AddDomain => "addDomain",
            Self::RemoveDomain => "removeDomain",
            Self::ListEnvVars => "listEnvVars",
            Self::CreateEnvVar => "createEnvVar",
            Self::DeleteEnvVar => "deleteEnvVar",
            Self::ListDeployments => "listDeployments",
            Self::CreateDeployment => "createDeployment",
        }
    }
}

impl fmt::Display for DeployMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployMethod {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DeployError::UnknownMethod(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("unknown deployment method: {0}")]
    UnknownMethod(String),
    #[error("deployment {method} failed ({status}): {message}")]
    Failed { method: DeployMethod, status: u16, message: String },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ErrorCode for DeployError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownMethod(_) => "E_UNKNOWN_DEPLOY_METHOD",
            Self::Failed { .. } => "E_DEPLOY_FAILED",
            Self::Backend(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Failed { status, .. } => *status == 429 || *status >= 500,
            Self::Backend(e) => e.retryable(),
            Self::UnknownMethod(_) => false,
        }
    }
}

/// Client for the deployment function.
#[derive(Clone)]
pub struct DeployClient {
    backend: Arc<dyn RecordStore>,
    function: String,
}

impl DeployClient {
    #[must_use]
    pub fn new(backend: Arc<dyn RecordStore>, function: impl Into<String>) -> Self {
        Self { backend, function: function.into() }
    }

    /// Invoke `method` with `data` and return the response body.
    ///
    /// # Errors
    ///
    /// Returns `Failed` for non-2xx statuses or bodies carrying an `error`
    /// field, `Backend` when the call itself fails.
    pub async fn call(&self, method: DeployMethod, data: Value) -> Result<Value, DeployError> {
        let body = json!({"method": method.as_str(), "data": data});
        let response = self.backend.invoke(&self.function, body).await?;
        let error = response.body.get("error").filter(|e| !e.is_null());

        if response.is_success() && error.is_none() {
            info!(%method, status = response.status, "deployment call ok");
            return Ok(response.body);
        }

        let message = match error {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| other.to_string(), str::to_string),
            None => match &response.body {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        };
        warn!(%method, status = response.status, %message, "deployment call failed");
        Err(DeployError::Failed { method, status: response.status, message })
    }

    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn list_projects(&self) -> Result<Value, DeployError> {
        self.call(DeployMethod::ListProjects, json!({})).await
    }

    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn create_project(&self, name: &str) -> Result<Value, DeployError> {
        self.call(DeployMethod::CreateProject, json!({"name": name})).await
    }

    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn delete_project(&self, project_id: &str) -> Result<Value, DeployError> {
        self.call(DeployMethod::DeleteProject, json!({"projectId": project_id}))
            .await
    }

    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn list_domains(&self, project_id: &str) -> Result<Value, DeployError> {
        self.call(DeployMethod::ListDomains, json!({"projectId": project_id}))
            .await
    }

    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn add_domain(&self, project_id: &str, domain: &str) -> Result<Value, DeployError> {
        self.call(DeployMethod::AddDomain, json!({"projectId": project_id, "domain": domain}))
            .await
    }

    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn remove_domain(&self, project_id: &str, domain: &str) -> Result<Value, DeployError> {
        self.call(DeployMethod::RemoveDomain, json!({"projectId": project_id, "domain": domain}))
            .await
    }

    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn list_env_vars(&self, project_id: &str) -> Result<Value, DeployError> {
        self.call(DeployMethod::ListEnvVars, json!({"projectId": project_id}))
            .await
    }

    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn create_env_var(
        &self,
        project_id: &str,
        key: &str,
        value: &str,
        targets: &[&str],
    ) -> Result<Value, DeployError> {
        let data = json!({"projectId": project_id, "key": key, "value": value, "target": targets});
        self.call(DeployMethod::CreateEnvVar, data).await
    }

    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn delete_env_var(&self, project_id: &str, env_id: &str) -> Result<Value, DeployError> {
        self.call(DeployMethod::DeleteEnvVar, json!({"projectId": project_id, "envId": env_id}))
            .await
    }

    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn list_deployments(&self, project_id: &str) -> Result<Value, DeployError> {
        self.call(DeployMethod::ListDeployments, json!({"projectId": project_id}))
            .await
    }

    /// Deploy a set of files (`path -> contents`) under `name`.
    ///
    /// # Errors
    /// See [`DeployClient::call`].
    pub async fn create_deployment(&self, name: &str, files: Value) -> Result<Value, DeployError> {
        self.call(DeployMethod::CreateDeployment, json!({"name": name, "files": files}))
            .await
    }
}
