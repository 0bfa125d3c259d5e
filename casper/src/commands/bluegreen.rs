//! Blue/green commands

use ghost_models::{JobPayload, SwapStrategy};

use crate::commands::{flag_option, OptionsReader};
use crate::errors::CasperError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareBlueGreen {
    /// Copy the online AMI to the offline application
    pub copy_ami: Option<bool>,
}

impl PrepareBlueGreen {
    pub(crate) fn encode(&self, payload: &mut JobPayload) {
        if let Some(copy) = self.copy_ami {
            payload.options.push(flag_option(copy));
        }
    }

    pub(crate) fn decode(payload: &JobPayload) -> Result<Self, CasperError> {
        let mut reader = OptionsReader::new(payload);
        let copy_ami = reader.flag("copy AMI")?;
        reader.finish()?;
        Ok(Self { copy_ami })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwapBlueGreen {
    pub strategy: Option<SwapStrategy>,
}

impl SwapBlueGreen {
    pub(crate) fn encode(&self, payload: &mut JobPayload) {
        if let Some(strategy) = self.strategy {
            payload.options.push(strategy.to_string());
        }
    }

    pub(crate) fn decode(payload: &JobPayload) -> Result<Self, CasperError> {
        let mut reader = OptionsReader::new(payload);
        let strategy: Option<SwapStrategy> = reader.parse("swap strategy")?;
        reader.finish()?;
        Ok(Self { strategy })
    }
}
