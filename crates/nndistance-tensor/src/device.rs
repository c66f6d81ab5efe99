use crate::TensorError;

/// Execution device for the operators.
///
/// The operators read and write host memory in both cases; the tag selects how
/// the inner loops are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Device {
    /// Sequential loops on the calling thread.
    #[default]
    Cpu,
    /// Data-parallel launch grid over (batch, point) work items.
    Accelerator,
}

impl Device {
    /// Returns the device type as a string.
    pub fn device_type(&self) -> &str {
        match self {
            Device::Cpu => "cpu",
            Device::Accelerator => "accelerator",
        }
    }

    /// Returns true if the device is CPU.
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }

    /// Returns true if the device is the accelerator.
    pub fn is_accelerator(&self) -> bool {
        !self.is_cpu()
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.device_type())
    }
}

impl std::str::FromStr for Device {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "accelerator" => Ok(Device::Accelerator),
            other => Err(TensorError::UnknownDevice(other.to_string())),
        }
    }
}
