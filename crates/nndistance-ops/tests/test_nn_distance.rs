use approx::assert_relative_eq;
use nndistance_ops::{
    NnDistance, NnDistanceConfig, NnDistanceError, NnDistanceOutput, RawTensor, POINT_DIM,
};
use nndistance_tensor::{Device, Tensor2, Tensor3};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn operators() -> Result<Vec<NnDistance>, NnDistanceError> {
    Ok(vec![
        NnDistance::new(&NnDistanceConfig::new(Device::Cpu))?,
        NnDistance::new(&NnDistanceConfig::new(Device::Accelerator))?,
        NnDistance::new(&NnDistanceConfig::new(Device::Accelerator).with_num_threads(3))?,
    ])
}

fn random_points(rng: &mut StdRng, batch: usize, num_points: usize) -> Tensor3<f32> {
    Tensor3::from_shape_fn([batch, num_points, POINT_DIM], |_| {
        rng.random_range(-1.0..1.0)
    })
}

/// Points that keep their nearest neighbors under small perturbations.
///
/// `xyz2[k]` sits near `x = k`. `xyz1[j]` sits near `x = j % m`, lifted along `y` by
/// `0.3` per layer, so `xyz1[k]` is the unambiguous match of `xyz2[k]`.
fn separated_points(
    rng: &mut StdRng,
    batch: usize,
    n: usize,
    m: usize,
) -> (Tensor3<f32>, Tensor3<f32>) {
    let xyz1 = Tensor3::from_shape_fn([batch, n, POINT_DIM], |[_, j, c]| {
        let base = match c {
            0 => (j % m) as f32,
            1 => 0.3 * (j / m) as f32,
            _ => 0.0,
        };
        base + rng.random_range(-0.02..0.02)
    });
    let xyz2 = Tensor3::from_shape_fn([batch, m, POINT_DIM], |[_, k, c]| {
        let base = if c == 0 { k as f32 } else { 0.0 };
        base + rng.random_range(-0.02..0.02)
    });
    (xyz1, xyz2)
}

fn brute_force(xyz1: &Tensor3<f32>, xyz2: &Tensor3<f32>) -> (Vec<f64>, Vec<i32>) {
    let (n, m) = (xyz1.shape[1], xyz2.shape[1]);
    let mut dist = Vec::with_capacity(xyz1.shape[0] * n);
    let mut idx = Vec::with_capacity(xyz1.shape[0] * n);
    for (flat, p) in xyz1.as_slice().chunks_exact(POINT_DIM).enumerate() {
        let b = flat / n;
        let candidates = &xyz2.as_slice()[b * m * POINT_DIM..(b + 1) * m * POINT_DIM];
        let (mut best_d, mut best_k) = (f64::INFINITY, 0);
        for (k, q) in candidates.chunks_exact(POINT_DIM).enumerate() {
            let d = p
                .iter()
                .zip(q)
                .map(|(&a, &b)| ((a - b) as f64).powi(2))
                .sum::<f64>();
            if d < best_d {
                best_d = d;
                best_k = k;
            }
        }
        dist.push(best_d);
        idx.push(best_k as i32);
    }
    (dist, idx)
}

fn weighted_loss(out: &NnDistanceOutput, w1: &Tensor2<f32>, w2: &Tensor2<f32>) -> f64 {
    let dot = |d: &Tensor2<f32>, w: &Tensor2<f32>| {
        d.as_slice()
            .iter()
            .zip(w.as_slice())
            .map(|(&d, &w)| d as f64 * w as f64)
            .sum::<f64>()
    };
    dot(&out.dist1, w1) + dot(&out.dist2, w2)
}

#[test]
fn test_single_pair_scenario() -> Result<(), NnDistanceError> {
    let xyz1 = Tensor3::from_shape_vec([1, 1, 6], vec![0.0; 6])?;
    let xyz2 = Tensor3::from_shape_vec([1, 1, 6], vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0])?;
    let grad_dist1 = Tensor2::from_shape_vec([1, 1], vec![1.0])?;
    let grad_dist2 = Tensor2::from_shape_vec([1, 1], vec![0.0])?;

    for op in operators()? {
        let out = op.forward(&xyz1, &xyz2)?;
        assert_eq!(out.dist1.as_slice(), &[1.0]);
        assert_eq!(out.idx1.as_slice(), &[0]);
        assert_eq!(out.dist2.as_slice(), &[1.0]);
        assert_eq!(out.idx2.as_slice(), &[0]);

        let grads = op.backward(&xyz1, &xyz2, &grad_dist1, &out.idx1, &grad_dist2, &out.idx2)?;
        assert_eq!(grads.grad_xyz1.as_slice(), &[-2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(grads.grad_xyz2.as_slice(), &[2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }
    Ok(())
}

#[test]
fn test_forward_matches_brute_force() -> Result<(), NnDistanceError> {
    let mut rng = StdRng::seed_from_u64(42);
    let xyz1 = random_points(&mut rng, 3, 57);
    let xyz2 = random_points(&mut rng, 3, 31);
    let (dist1, idx1) = brute_force(&xyz1, &xyz2);
    let (dist2, idx2) = brute_force(&xyz2, &xyz1);

    for op in operators()? {
        let out = op.forward(&xyz1, &xyz2)?;
        assert_eq!(out.idx1.as_slice(), idx1.as_slice());
        assert_eq!(out.idx2.as_slice(), idx2.as_slice());
        for (&d, &e) in out.dist1.as_slice().iter().zip(&dist1) {
            assert_relative_eq!(d, e as f32, max_relative = 1e-6);
        }
        for (&d, &e) in out.dist2.as_slice().iter().zip(&dist2) {
            assert_relative_eq!(d, e as f32, max_relative = 1e-6);
        }
    }
    Ok(())
}

#[test]
fn test_swapping_inputs_swaps_outputs() -> Result<(), NnDistanceError> {
    let mut rng = StdRng::seed_from_u64(7);
    let xyz1 = random_points(&mut rng, 2, 40);
    let xyz2 = random_points(&mut rng, 2, 25);

    for op in operators()? {
        let fwd = op.forward(&xyz1, &xyz2)?;
        let rev = op.forward(&xyz2, &xyz1)?;
        assert_eq!(fwd.dist1, rev.dist2);
        assert_eq!(fwd.idx1, rev.idx2);
        assert_eq!(fwd.dist2, rev.dist1);
        assert_eq!(fwd.idx2, rev.idx1);
    }
    Ok(())
}

#[test]
fn test_tie_picks_lowest_index() -> Result<(), NnDistanceError> {
    // xyz2[1] and xyz2[3] are both at distance 1 from the query, xyz2[0] and xyz2[2] further
    #[rustfmt::skip]
    let xyz2 = Tensor3::from_shape_vec([1, 4, 6], vec![
        5.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 3.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, -1.0,
    ])?;
    let xyz1 = Tensor3::from_shape_vec([1, 1, 6], vec![0.0; 6])?;

    for op in operators()? {
        for _ in 0..3 {
            let out = op.forward(&xyz1, &xyz2)?;
            assert_eq!(out.idx1.as_slice(), &[1]);
            assert_eq!(out.dist1.as_slice(), &[1.0]);
        }
    }
    Ok(())
}

#[test]
fn test_gradient_matches_finite_differences() -> Result<(), NnDistanceError> {
    let mut rng = StdRng::seed_from_u64(1234);
    let (batch, n, m) = (2, 10, 5);
    let (xyz1, xyz2) = separated_points(&mut rng, batch, n, m);
    let w1 = Tensor2::from_shape_fn([batch, n], |_| rng.random_range(0.5..1.5));
    let w2 = Tensor2::from_shape_fn([batch, m], |_| rng.random_range(0.5..1.5));
    let eps = 1e-2f32;

    for op in operators()? {
        let out = op.forward(&xyz1, &xyz2)?;
        let grads = op.backward_from_output(&xyz1, &xyz2, &out, &w1, &w2)?;

        let numeric = |perturbed1: &Tensor3<f32>, perturbed2: &Tensor3<f32>| {
            op.forward(perturbed1, perturbed2)
                .map(|out| weighted_loss(&out, &w1, &w2))
        };

        for i in 0..xyz1.numel() {
            let mut plus = xyz1.clone();
            plus.as_slice_mut()[i] += eps;
            let mut minus = xyz1.clone();
            minus.as_slice_mut()[i] -= eps;
            let fd = (numeric(&plus, &xyz2)? - numeric(&minus, &xyz2)?) / (2.0 * eps as f64);
            assert_relative_eq!(grads.grad_xyz1.as_slice()[i], fd as f32, epsilon = 1e-3);
        }
        for i in 0..xyz2.numel() {
            let mut plus = xyz2.clone();
            plus.as_slice_mut()[i] += eps;
            let mut minus = xyz2.clone();
            minus.as_slice_mut()[i] -= eps;
            let fd = (numeric(&xyz1, &plus)? - numeric(&xyz1, &minus)?) / (2.0 * eps as f64);
            assert_relative_eq!(grads.grad_xyz2.as_slice()[i], fd as f32, epsilon = 1e-3);
        }
    }
    Ok(())
}

#[test]
fn test_single_direction_pair_is_antisymmetric() -> Result<(), NnDistanceError> {
    let mut rng = StdRng::seed_from_u64(99);
    let (xyz1, xyz2) = separated_points(&mut rng, 1, 4, 4);
    let mut grad_dist1 = Tensor2::<f32>::zeros([1, 4]);
    let grad_dist2 = Tensor2::<f32>::zeros([1, 4]);
    if let Some(g) = grad_dist1.get_mut([0, 2]) {
        *g = 0.75;
    }

    for op in operators()? {
        let out = op.forward(&xyz1, &xyz2)?;
        let grads = op.backward_from_output(&xyz1, &xyz2, &out, &grad_dist1, &grad_dist2)?;
        let k = out.idx1.as_slice()[2] as usize;
        assert_eq!(k, 2);
        for c in 0..POINT_DIM {
            let g1 = grads.grad_xyz1.get([0, 2, c]).copied();
            let g2 = grads.grad_xyz2.get([0, k, c]).map(|g| -g);
            assert_eq!(g1, g2);
        }
        // nothing else was touched
        let touched = grads.grad_xyz1.as_slice().iter().filter(|g| **g != 0.0).count();
        assert!(touched <= POINT_DIM);
    }
    Ok(())
}

#[test]
fn test_gradients_sum_to_zero_per_batch() -> Result<(), NnDistanceError> {
    let mut rng = StdRng::seed_from_u64(5);
    let xyz1 = random_points(&mut rng, 2, 30);
    let xyz2 = random_points(&mut rng, 2, 20);
    let w1 = Tensor2::from_shape_fn([2, 30], |_| rng.random_range(0.0..1.0));
    let w2 = Tensor2::from_shape_fn([2, 20], |_| rng.random_range(0.0..1.0));

    for op in operators()? {
        let out = op.forward(&xyz1, &xyz2)?;
        let grads = op.backward_from_output(&xyz1, &xyz2, &out, &w1, &w2)?;
        for b in 0..2 {
            for c in 0..POINT_DIM {
                let s1 = (0..30)
                    .filter_map(|j| grads.grad_xyz1.get([b, j, c]))
                    .sum::<f32>();
                let s2 = (0..20)
                    .filter_map(|k| grads.grad_xyz2.get([b, k, c]))
                    .sum::<f32>();
                assert_relative_eq!(s1 + s2, 0.0, epsilon = 1e-4);
            }
        }
    }
    Ok(())
}

#[test]
fn test_devices_agree() -> Result<(), NnDistanceError> {
    let mut rng = StdRng::seed_from_u64(2024);
    let xyz1 = random_points(&mut rng, 4, 100);
    let xyz2 = random_points(&mut rng, 4, 64);
    let w1 = Tensor2::from_shape_fn([4, 100], |_| rng.random_range(-1.0..1.0));
    let w2 = Tensor2::from_shape_fn([4, 64], |_| rng.random_range(-1.0..1.0));

    let cpu = NnDistance::new(&NnDistanceConfig::new(Device::Cpu))?;
    let acc = NnDistance::new(&NnDistanceConfig::new(Device::Accelerator))?;

    let out_cpu = cpu.forward(&xyz1, &xyz2)?;
    let out_acc = acc.forward(&xyz1, &xyz2)?;
    assert_eq!(out_cpu, out_acc);

    let g_cpu = cpu.backward_from_output(&xyz1, &xyz2, &out_cpu, &w1, &w2)?;
    let g_acc = acc.backward_from_output(&xyz1, &xyz2, &out_acc, &w1, &w2)?;
    for (a, b) in g_cpu
        .grad_xyz1
        .as_slice()
        .iter()
        .zip(g_acc.grad_xyz1.as_slice())
        .chain(g_cpu.grad_xyz2.as_slice().iter().zip(g_acc.grad_xyz2.as_slice()))
    {
        assert_relative_eq!(a, b, epsilon = 1e-4);
    }
    Ok(())
}

#[test]
fn test_contract_violations() -> Result<(), NnDistanceError> {
    let op = NnDistance::default();
    let xyz1 = Tensor3::<f32>::zeros([2, 3, 6]);
    let xyz2 = Tensor3::<f32>::zeros([2, 4, 6]);

    let err = op.forward(&xyz1, &Tensor3::zeros([1, 4, 6])).unwrap_err();
    assert!(err.is_contract_violation());

    let err = op.forward(&Tensor3::zeros([2, 3, 5]), &xyz2).unwrap_err();
    assert!(err.is_contract_violation());

    let out = op.forward(&xyz1, &Tensor3::zeros([2, 0, 6]))?;
    assert_eq!(out.dist1.as_slice(), &[0.0; 6]);
    assert_eq!(out.idx2.shape, [2, 0]);

    let grad1 = Tensor2::<f32>::zeros([2, 3]);
    let idx1 = Tensor2::<i32>::zeros([2, 3]);
    let grad2 = Tensor2::<f32>::zeros([2, 4]);
    let idx2 = Tensor2::<i32>::zeros([2, 4]);
    assert!(op.backward(&xyz1, &xyz2, &grad1, &idx1, &grad2, &idx2).is_ok());

    let err = op
        .backward(&xyz1, &xyz2, &grad1, &idx1, &grad1, &idx2)
        .unwrap_err();
    assert!(err.is_contract_violation());

    let err = op
        .backward(&xyz1, &Tensor3::zeros([3, 4, 6]), &grad1, &idx1, &grad2, &idx2)
        .unwrap_err();
    assert_eq!(err, NnDistanceError::BatchMismatch(2, 3));

    let err = op
        .backward(&xyz1, &Tensor3::zeros([2, 4, 5]), &grad1, &idx1, &grad2, &idx2)
        .unwrap_err();
    assert!(matches!(
        err,
        NnDistanceError::InvalidPointDim { name: "xyz2", .. }
    ));

    let data = [0.0f32; 24];
    let err = op
        .backward_raw(
            RawTensor::new(&[2, 3, 6], &data[..18]),
            RawTensor::new(&[8, 3], &data),
            RawTensor::new(&[2, 3], grad1.as_slice()),
            RawTensor::new(&[2, 3], idx1.as_slice()),
            RawTensor::new(&[2, 4], grad2.as_slice()),
            RawTensor::new(&[2, 4], idx2.as_slice()),
        )
        .unwrap_err();
    assert_eq!(
        err,
        NnDistanceError::InvalidRank {
            name: "xyz2",
            actual: 2
        }
    );
    Ok(())
}
