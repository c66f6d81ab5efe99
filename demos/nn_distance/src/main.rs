use argh::FromArgs;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::PathBuf;

use nndistance::ops::{ChamferDistance, NnDistance, NnDistanceConfig, Reduction, POINT_DIM};
use nndistance::tensor::{Device, Tensor3};

#[derive(FromArgs)]
/// Bilateral nearest-neighbor distance between two random 6D point sets
struct Args {
    /// number of batches
    #[argh(option, default = "4")]
    batch: usize,

    /// number of points in the first set
    #[argh(option, default = "2048")]
    num_points1: usize,

    /// number of points in the second set
    #[argh(option, default = "1024")]
    num_points2: usize,

    /// execution path: cpu or accelerator
    #[argh(option)]
    device: Option<Device>,

    /// size of a dedicated accelerator thread pool
    #[argh(option)]
    num_threads: Option<usize>,

    /// path to a JSON operator config
    #[argh(option)]
    config: Option<PathBuf>,

    /// seed for the random point sets
    #[argh(option)]
    seed: Option<u64>,
}

fn random_points(rng: &mut StdRng, batch: usize, num_points: usize) -> Tensor3<f32> {
    Tensor3::from_shape_fn([batch, num_points, POINT_DIM], |_| {
        rng.random_range(-1.0..1.0)
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => NnDistanceConfig::default(),
    };
    if let Some(device) = args.device {
        config.device = device;
    }
    if let Some(num_threads) = args.num_threads {
        config.num_threads = Some(num_threads);
    }
    log::info!("config: {:?}", config);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let xyz1 = random_points(&mut rng, args.batch, args.num_points1);
    let xyz2 = random_points(&mut rng, args.batch, args.num_points2);
    println!("xyz1: {:?}, xyz2: {:?}", xyz1.shape, xyz2.shape);

    let chamfer = ChamferDistance::new(NnDistance::new(&config)?, Reduction::Mean);

    let now = std::time::Instant::now();
    let fwd = chamfer.forward(&xyz1, &xyz2)?;
    println!(
        "forward [{}]: chamfer = {:.6} in {:?}",
        chamfer.op().device(),
        fwd.loss,
        now.elapsed()
    );

    let now = std::time::Instant::now();
    let grads = chamfer.backward(&xyz1, &xyz2, &fwd, 1.0)?;
    println!(
        "backward [{}]: grad_xyz1 {:?}, grad_xyz2 {:?} in {:?}",
        chamfer.op().device(),
        grads.grad_xyz1.shape,
        grads.grad_xyz2.shape,
        now.elapsed()
    );

    let norm = grads
        .grad_xyz1
        .as_slice()
        .iter()
        .chain(grads.grad_xyz2.as_slice())
        .map(|&g| g as f64 * g as f64)
        .sum::<f64>()
        .sqrt();
    println!("gradient norm: {norm:.6}");

    Ok(())
}
