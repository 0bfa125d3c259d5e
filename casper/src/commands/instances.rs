//! Image and instance management commands

use ghost_models::JobPayload;

use crate::commands::{flag_option, OptionsReader};
use crate::errors::CasperError;

/// Bake a new AMI for the application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildImage {
    /// Overrides the application's instance type for the build
    pub instance_type: Option<String>,
    pub skip_bootstrap: Option<bool>,
}

impl BuildImage {
    pub(crate) fn encode(&self, payload: &mut JobPayload) {
        payload.instance_type = self.instance_type.clone();
        if let Some(skip) = self.skip_bootstrap {
            payload.options.push(flag_option(skip));
        }
    }

    pub(crate) fn decode(payload: &JobPayload) -> Result<Self, CasperError> {
        let mut reader = OptionsReader::new(payload);
        let skip_bootstrap = reader.flag("skip bootstrap")?;
        reader.finish()?;
        Ok(Self {
            instance_type: payload.instance_type.clone(),
            skip_bootstrap,
        })
    }
}

/// Start one more instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateInstance {
    subnet_id: Option<String>,
    private_ip_address: Option<String>,
}

impl CreateInstance {
    /// A private IP is only accepted together with the subnet it belongs to
    pub fn new(
        subnet_id: Option<String>,
        private_ip_address: Option<String>,
    ) -> Result<Self, CasperError> {
        if private_ip_address.is_some() && subnet_id.is_none() {
            return Err(CasperError::Validation(
                "a private IP address needs a subnet id (--subnet-id)".to_string(),
            ));
        }
        Ok(Self {
            subnet_id,
            private_ip_address,
        })
    }

    pub fn subnet_id(&self) -> Option<&str> {
        self.subnet_id.as_deref()
    }

    pub fn private_ip_address(&self) -> Option<&str> {
        self.private_ip_address.as_deref()
    }

    pub(crate) fn encode(&self, payload: &mut JobPayload) {
        if let Some(subnet) = &self.subnet_id {
            payload.options.push(subnet.clone());
            if let Some(ip) = &self.private_ip_address {
                payload.options.push(ip.clone());
            }
        }
    }

    pub(crate) fn decode(payload: &JobPayload) -> Result<Self, CasperError> {
        let mut reader = OptionsReader::new(payload);
        let subnet_id = reader.optional().map(str::to_string);
        let private_ip_address = reader.optional().map(str::to_string);
        reader.finish()?;
        Self::new(subnet_id, private_ip_address)
    }
}

/// Replace every instance, optionally in rolling batches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecreateInstances {
    pub rolling_update_strategy: Option<String>,
}

impl RecreateInstances {
    pub(crate) fn encode(&self, payload: &mut JobPayload) {
        if let Some(strategy) = &self.rolling_update_strategy {
            payload.options.push(strategy.clone());
        }
    }

    pub(crate) fn decode(payload: &JobPayload) -> Result<Self, CasperError> {
        let mut reader = OptionsReader::new(payload);
        let rolling_update_strategy = reader.optional().map(str::to_string);
        reader.finish()?;
        Ok(Self {
            rolling_update_strategy,
        })
    }
}
