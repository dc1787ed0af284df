use stackrun_notify::NotifyConfig;
use stackrun_provisioner::DeployConfig;

/// Everything read from the environment, once, at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub deploy: DeployConfig,
    pub notify: NotifyConfig,
}

impl Settings {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            deploy: DeployConfig::from_env()?,
            notify: NotifyConfig::from_env()?,
        })
    }
}
