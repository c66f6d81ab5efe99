use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use nndistance_ops::{NnDistance, NnDistanceConfig, POINT_DIM};
use nndistance_tensor::{Device, Tensor2, Tensor3};
use rand::Rng;

fn random_points(rng: &mut impl Rng, batch: usize, num_points: usize) -> Tensor3<f32> {
    Tensor3::from_shape_fn([batch, num_points, POINT_DIM], |_| rng.random::<f32>())
}

fn bench_nn_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("nn_distance");
    let mut rng = rand::rng();

    for (batch, n, m) in [(1, 1024, 1024), (8, 2048, 1024), (4, 8192, 8192)].iter() {
        group.throughput(criterion::Throughput::Elements((batch * n * m) as u64));
        let parameter_string = format!("{batch}x{n}x{m}");

        let xyz1 = random_points(&mut rng, *batch, *n);
        let xyz2 = random_points(&mut rng, *batch, *m);
        let grad_dist1 = Tensor2::from_shape_val([*batch, *n], 1.0);
        let grad_dist2 = Tensor2::from_shape_val([*batch, *m], 1.0);

        for device in [Device::Cpu, Device::Accelerator] {
            let op = NnDistance::new(&NnDistanceConfig::new(device)).unwrap();
            let out = op.forward(&xyz1, &xyz2).unwrap();

            group.bench_with_input(
                BenchmarkId::new(format!("forward_{device}"), &parameter_string),
                &(&xyz1, &xyz2),
                |b, i| b.iter(|| black_box(op.forward(i.0, i.1).unwrap())),
            );

            group.bench_with_input(
                BenchmarkId::new(format!("backward_{device}"), &parameter_string),
                &(&xyz1, &xyz2),
                |b, i| {
                    b.iter(|| {
                        black_box(
                            op.backward_from_output(i.0, i.1, &out, &grad_dist1, &grad_dist2)
                                .unwrap(),
                        )
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_nn_distance
);
criterion_main!(benches);
