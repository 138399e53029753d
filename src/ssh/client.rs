// ABOUTME: SSH session management using russh.
// ABOUTME: Connects, verifies the host key against known_hosts, and runs commands.

use super::error::{Error, Result};
use crate::shell::CommandOutput;
use russh::client::{self, Config, Handle};
use russh::keys::agent::client::AgentClient;
use russh::keys::known_hosts::{check_known_hosts_path, learn_known_hosts_path};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::{ChannelMsg, Disconnect};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;

const DEFAULT_KEYS: [&str; 3] = ["id_ed25519", "id_rsa", "id_ecdsa"];

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Explicit private key. Without one, the agent is tried, then `~/.ssh` defaults.
    pub key_path: Option<PathBuf>,
    /// Accept and remember hosts missing from known_hosts.
    pub trust_on_first_use: bool,
    /// Overrides `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            key_path: None,
            trust_on_first_use: false,
            known_hosts_path: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn trust_on_first_use(mut self, tofu: bool) -> Self {
        self.trust_on_first_use = tofu;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    fn resolved_known_hosts(&self) -> Option<PathBuf> {
        self.known_hosts_path.clone().or_else(|| {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".ssh/known_hosts"))
        })
    }
}

/// Host key verification for russh.
pub(crate) struct HostKeyCheck {
    host: String,
    port: u16,
    trust_on_first_use: bool,
    known_hosts: Option<PathBuf>,
}

impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let Some(known_hosts) = &self.known_hosts else {
            return Ok(self.trust_on_first_use);
        };

        match check_known_hosts_path(&self.host, self.port, server_public_key, known_hosts) {
            Ok(true) => Ok(true),
            Ok(false) if self.trust_on_first_use => {
                tracing::warn!(
                    "Trust-On-First-Use: accepting unknown host key for {}:{}",
                    self.host,
                    self.port
                );
                if let Err(e) =
                    learn_known_hosts_path(&self.host, self.port, server_public_key, known_hosts)
                {
                    tracing::warn!("Failed to record host key in known_hosts: {}", e);
                }
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(russh::keys::Error::KeyChanged { .. }) => {
                tracing::error!("Host key for {} changed, refusing to connect", self.host);
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Could not read known_hosts: {}", e);
                Ok(self.trust_on_first_use)
            }
        }
    }
}

enum Credentials {
    Agent(AgentClient<UnixStream>),
    Key(Arc<ssh_key::PrivateKey>),
}

/// An authenticated SSH session.
pub struct Session {
    config: SessionConfig,
    handle: Handle<HostKeyCheck>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("user", &self.config.user)
            .finish()
    }
}

impl Session {
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let credentials = Self::credentials(&config).await?;

        let russh_config = Config {
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(15)),
            ..Default::default()
        };

        let check = HostKeyCheck {
            host: config.host.clone(),
            port: config.port,
            trust_on_first_use: config.trust_on_first_use,
            known_hosts: config.resolved_known_hosts(),
        };

        let mut handle = client::connect(
            Arc::new(russh_config),
            (config.host.as_str(), config.port),
            check,
        )
        .await
        .map_err(|e| Error::Connection {
            host: config.host.clone(),
            port: config.port,
            reason: e.to_string(),
        })?;

        if !Self::authenticate(&mut handle, &config.user, credentials).await? {
            return Err(Error::AuthenticationFailed(config.user.clone()));
        }

        tracing::debug!("SSH session established to {}@{}", config.user, config.host);
        Ok(Self { config, handle })
    }

    async fn credentials(config: &SessionConfig) -> Result<Credentials> {
        if let Some(path) = &config.key_path {
            let key = load_secret_key(path, None).map_err(|e| Error::KeyLoadFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            return Ok(Credentials::Key(Arc::new(key)));
        }

        if let Ok(agent) = AgentClient::connect_env().await {
            return Ok(Credentials::Agent(agent));
        }

        let home = std::env::var_os("HOME").ok_or_else(|| {
            Error::NoCredentials("SSH agent not available and HOME not set".to_string())
        })?;
        let ssh_dir = PathBuf::from(home).join(".ssh");

        DEFAULT_KEYS
            .iter()
            .find_map(|name| load_secret_key(ssh_dir.join(name), None).ok())
            .map(|key| Credentials::Key(Arc::new(key)))
            .ok_or_else(|| {
                Error::NoCredentials("SSH agent not available and no default keys found".to_string())
            })
    }

    async fn authenticate(
        handle: &mut Handle<HostKeyCheck>,
        user: &str,
        credentials: Credentials,
    ) -> Result<bool> {
        match credentials {
            Credentials::Agent(mut agent) => {
                let identities = agent
                    .request_identities()
                    .await
                    .map_err(|e| Error::NoCredentials(format!("SSH agent: {}", e)))?;

                for identity in identities {
                    if let Ok(result) = handle
                        .authenticate_publickey_with(user, identity, None, &mut agent)
                        .await
                        && result.success()
                    {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Credentials::Key(key) => {
                let hash_alg = handle.best_supported_rsa_hash().await?.flatten();
                let result = handle
                    .authenticate_publickey(user, PrivateKeyWithHashAlg::new(key, hash_alg))
                    .await?;
                Ok(result.success())
            }
        }
    }

    /// Run a command on the remote host and wait for it to exit.
    pub async fn exec(&self, command: &str) -> Result<CommandOutput> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::Channel(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| Error::Channel(e.to_string()))?;

        let mut collector = ExecCollector::default();
        while let Some(msg) = channel.wait().await {
            if collector.push(msg) {
                break;
            }
        }
        collector.finish()
    }

    pub async fn disconnect(self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await?;
        Ok(())
    }
}

/// Accumulates channel messages for one `exec` until the command has exited
/// (by status or signal) and the remote side has sent EOF.
#[derive(Debug, Default)]
struct ExecCollector {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: Option<i32>,
    signal: Option<russh::Sig>,
    eof: bool,
}

impl ExecCollector {
    /// Returns true once no more output is expected.
    fn push(&mut self, msg: ChannelMsg) -> bool {
        match msg {
            ChannelMsg::Data { data } => self.stdout.extend_from_slice(&data),
            // ext 1 is stderr
            ChannelMsg::ExtendedData { data, ext: 1 } => self.stderr.extend_from_slice(&data),
            ChannelMsg::ExitStatus { exit_status } => {
                self.exit_code = Some(exit_status as i32);
                return self.eof;
            }
            ChannelMsg::ExitSignal {
                signal_name,
                error_message,
                ..
            } => {
                tracing::debug!("Remote command killed by {:?}: {}", signal_name, error_message);
                self.signal = Some(signal_name);
                return self.eof;
            }
            ChannelMsg::Eof => {
                self.eof = true;
                return self.exited();
            }
            ChannelMsg::Close => return true,
            _ => {}
        }
        false
    }

    fn exited(&self) -> bool {
        self.exit_code.is_some() || self.signal.is_some()
    }

    /// A signalled command reports no exit code.
    fn finish(self) -> Result<CommandOutput> {
        if !self.exited() {
            return Err(Error::ChannelClosed);
        }

        Ok(CommandOutput {
            exit_code: self.exit_code,
            stdout: String::from_utf8_lossy(&self.stdout).to_string(),
            stderr: String::from_utf8_lossy(&self.stderr).to_string(),
        })
    }
}
