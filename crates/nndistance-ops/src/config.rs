use nndistance_tensor::Device;

/// Runtime configuration of the nearest-neighbor distance operator.
///
/// # Example
///
/// ```
/// use nndistance_ops::NnDistanceConfig;
/// use nndistance_tensor::Device;
///
/// let config = NnDistanceConfig::new(Device::Accelerator).with_num_threads(4);
/// assert_eq!(config.device, Device::Accelerator);
/// assert_eq!(config.num_threads, Some(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NnDistanceConfig {
    /// Execution path for the inner loops.
    pub device: Device,
    /// Size of a dedicated accelerator thread pool; `None` uses the global rayon pool.
    ///
    /// Ignored on the cpu device.
    pub num_threads: Option<usize>,
}

impl NnDistanceConfig {
    /// Creates a configuration for `device` on the global thread pool.
    pub fn new(device: Device) -> Self {
        Self {
            device,
            num_threads: None,
        }
    }

    /// Sets the size of a dedicated accelerator thread pool.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }
}
