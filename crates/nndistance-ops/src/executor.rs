use nndistance_tensor::Device;

use crate::{
    config::NnDistanceConfig,
    error::NnDistanceError,
    parallel::ThreadPoolHandle,
    points::PointSetView,
    scatter::{scatter_parallel, scatter_serial, ScatterInputs},
    search::{search_parallel, search_serial},
};

/// Output buffers of one forward call, all `[B, N]` or `[B, M]` row-major.
#[derive(Debug)]
pub struct SearchOutputs<'a> {
    /// Distance from every point of `xyz1` to its nearest neighbor in `xyz2`.
    pub dist1: &'a mut [f32],
    /// Index of that neighbor.
    pub idx1: &'a mut [i32],
    /// Distance from every point of `xyz2` to its nearest neighbor in `xyz1`.
    pub dist2: &'a mut [f32],
    /// Index of that neighbor.
    pub idx2: &'a mut [i32],
}

/// The two compute stages every execution path provides.
///
/// Implementations receive validated inputs and correctly sized, zero-filled outputs.
pub trait NnDistanceKernel {
    /// Fills the matches of both directions.
    fn search(&self, xyz1: PointSetView, xyz2: PointSetView, out: SearchOutputs);

    /// Accumulates the gradients of both directions into zero-filled buffers.
    fn scatter(&self, inputs: &ScatterInputs, grad_xyz1: &mut [f32], grad_xyz2: &mut [f32]);
}

/// Sequential kernels on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct CpuKernel;

impl NnDistanceKernel for CpuKernel {
    fn search(&self, xyz1: PointSetView, xyz2: PointSetView, out: SearchOutputs) {
        search_serial(xyz1, xyz2, out.dist1, out.idx1);
        search_serial(xyz2, xyz1, out.dist2, out.idx2);
    }

    fn scatter(&self, inputs: &ScatterInputs, grad_xyz1: &mut [f32], grad_xyz2: &mut [f32]) {
        scatter_serial(inputs, grad_xyz1, grad_xyz2);
    }
}

/// Data-parallel kernels over (batch, point) work items.
#[derive(Debug, Clone, Default)]
pub struct AcceleratorKernel {
    pool: ThreadPoolHandle,
}

impl AcceleratorKernel {
    /// Creates the kernel on the given pool.
    pub fn new(pool: ThreadPoolHandle) -> Self {
        Self { pool }
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool.num_threads()
    }
}

impl NnDistanceKernel for AcceleratorKernel {
    fn search(&self, xyz1: PointSetView, xyz2: PointSetView, out: SearchOutputs) {
        let SearchOutputs {
            dist1,
            idx1,
            dist2,
            idx2,
        } = out;
        self.pool.install(|| {
            rayon::join(
                || search_parallel(xyz1, xyz2, dist1, idx1),
                || search_parallel(xyz2, xyz1, dist2, idx2),
            )
        });
    }

    fn scatter(&self, inputs: &ScatterInputs, grad_xyz1: &mut [f32], grad_xyz2: &mut [f32]) {
        self.pool
            .install(|| scatter_parallel(inputs, grad_xyz1, grad_xyz2));
    }
}

/// The execution path, selected by [`NnDistanceConfig::device`].
#[derive(Debug, Clone)]
pub enum Executor {
    /// Sequential loops.
    Cpu(CpuKernel),
    /// Data-parallel launch grid.
    Accelerator(AcceleratorKernel),
}

impl Default for Executor {
    fn default() -> Self {
        Executor::Cpu(CpuKernel)
    }
}

impl Executor {
    /// Creates the executor described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`NnDistanceError::Parallel`] if the accelerator thread pool cannot be built.
    pub fn from_config(config: &NnDistanceConfig) -> Result<Self, NnDistanceError> {
        let executor = match config.device {
            Device::Cpu => {
                if config.num_threads.is_some() {
                    log::warn!("num_threads is ignored on the cpu device");
                }
                Executor::Cpu(CpuKernel)
            }
            Device::Accelerator => {
                let pool = ThreadPoolHandle::new(config.num_threads)?;
                Executor::Accelerator(AcceleratorKernel::new(pool))
            }
        };
        log::debug!("nn_distance executor: {:?}", executor);
        Ok(executor)
    }

    /// The device this executor runs on.
    pub fn device(&self) -> Device {
        match self {
            Executor::Cpu(_) => Device::Cpu,
            Executor::Accelerator(_) => Device::Accelerator,
        }
    }
}

impl NnDistanceKernel for Executor {
    fn search(&self, xyz1: PointSetView, xyz2: PointSetView, out: SearchOutputs) {
        match self {
            Executor::Cpu(kernel) => kernel.search(xyz1, xyz2, out),
            Executor::Accelerator(kernel) => kernel.search(xyz1, xyz2, out),
        }
    }

    fn scatter(&self, inputs: &ScatterInputs, grad_xyz1: &mut [f32], grad_xyz2: &mut [f32]) {
        match self {
            Executor::Cpu(kernel) => kernel.scatter(inputs, grad_xyz1, grad_xyz2),
            Executor::Accelerator(kernel) => kernel.scatter(inputs, grad_xyz1, grad_xyz2),
        }
    }
}
