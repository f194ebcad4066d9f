use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::config::ProvisioningConfig;

/// Upper bound on captured stdout/stderr per stream
const MAX_OUTPUT_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum SchemaSyncError {
    #[error("Failed to start schema sync tool '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema sync exited with code {exit_code}: {stderr}")]
    Failed { exit_code: i32, stderr: String },

    #[error("Schema sync timed out after {0:?}")]
    Timeout(Duration),

    #[error("Schema sync I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Applies the current schema to a database
#[async_trait]
pub trait SchemaSync: Send + Sync {
    async fn apply(&self, connection_string: &str) -> Result<SchemaSyncReport, SchemaSyncError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSyncReport {
    pub stdout: String,
}

/// Runs an external schema tool (`prisma db push` by default) against the
/// target database, passed through an environment variable.
#[derive(Debug, Clone)]
pub struct CommandSchemaSync {
    program: String,
    args: Vec<String>,
    schema_path: PathBuf,
    url_env: String,
    timeout: Duration,
}

impl CommandSchemaSync {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        schema_path: impl Into<PathBuf>,
        url_env: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            schema_path: schema_path.into(),
            url_env: url_env.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self::new(
            config.schema_sync_program.clone(),
            config.schema_sync_args.clone(),
            config.schema_path.clone(),
            config.schema_sync_url_env.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl SchemaSync for CommandSchemaSync {
    async fn apply(&self, connection_string: &str) -> Result<SchemaSyncReport, SchemaSyncError> {
        tracing::debug!(
            program = %self.program,
            schema = %self.schema_path.display(),
            "Running schema sync"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("--schema")
            .arg(&self.schema_path)
            .env(&self.url_env, connection_string)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SchemaSyncError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let result = tokio::time::timeout(self.timeout, async {
            let mut stdout_buf = Vec::with_capacity(4096);
            let mut stderr_buf = Vec::with_capacity(4096);

            // Drain both pipes together so a chatty tool cannot block on a full pipe
            let read_stdout = async {
                if let Some(out) = stdout.as_mut() {
                    out.take(MAX_OUTPUT_SIZE as u64).read_to_end(&mut stdout_buf).await?;
                }
                Ok::<_, std::io::Error>(())
            };
            let read_stderr = async {
                if let Some(err) = stderr.as_mut() {
                    err.take(MAX_OUTPUT_SIZE as u64).read_to_end(&mut stderr_buf).await?;
                }
                Ok::<_, std::io::Error>(())
            };
            tokio::try_join!(read_stdout, read_stderr)?;

            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stdout_buf, stderr_buf))
        })
        .await;

        let (status, stdout_buf, stderr_buf) = match result {
            Ok(done) => done?,
            // Dropping the child kills it
            Err(_) => return Err(SchemaSyncError::Timeout(self.timeout)),
        };

        let stdout = String::from_utf8_lossy(&stdout_buf).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_buf).trim().to_string();

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            tracing::error!(exit_code, stderr = %stderr, "Schema sync failed");
            return Err(SchemaSyncError::Failed { exit_code, stderr });
        }

        if !stdout.is_empty() {
            tracing::debug!(stdout = %stdout, "Schema sync output");
        }
        Ok(SchemaSyncReport { stdout })
    }
}
