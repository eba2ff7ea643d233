//! Benchmarks du filtrage et de la réconciliation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use facility_map::{
    reconcile, visible_facilities, AttributeSeed, Bounds, Category, CategoryFilter, Facility,
    FilterRule, HeadlessMap, InferredFields, LatLng, ReconcilePolicy, RenderedSet,
};

/// Équipements répartis sur une grille autour de Séoul
fn synthetic(n: usize) -> Vec<Facility> {
    let seed = AttributeSeed::new("bench");
    let side = (n as f64).sqrt().ceil() as usize;
    (0..n)
        .map(|i| {
            let id = format!("F{:06}", i);
            let row = (i / side) as f64;
            let col = (i % side) as f64;
            Facility {
                category: Category::ALL[i % Category::ALL.len()],
                is_free: seed.flag(&id, "free", 0.7),
                has_night_light: seed.flag(&id, "night_light", 0.5),
                has_parking: seed.flag(&id, "parking", 0.5),
                latitude: 37.3 + row * 0.4 / side as f64,
                longitude: 126.7 + col * 0.5 / side as f64,
                name: id.clone(),
                description: String::new(),
                inferred: InferredFields::default(),
                id,
            }
        })
        .collect()
}

fn bench_visible(c: &mut Criterion) {
    let bounds = Bounds::new(37.40, 126.90, 37.55, 126.99).unwrap();
    let rules = FilterRule {
        free_only: true,
        category: CategoryFilter::Only(Category::Basketball),
        ..FilterRule::default()
    };

    let mut group = c.benchmark_group("visible_facilities");
    for n in [1_000usize, 10_000, 100_000] {
        let data = synthetic(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| black_box(visible_facilities(black_box(data), &bounds, &rules)))
        });
    }
    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let data = synthetic(10_000);
    let bounds = Bounds::new(37.40, 126.90, 37.55, 126.99).unwrap();
    let visible = visible_facilities(&data, &bounds, &FilterRule::default());

    let mut group = c.benchmark_group("reconcile_unchanged");
    group.throughput(Throughput::Elements(visible.len() as u64));
    for policy in [ReconcilePolicy::Rebuild, ReconcilePolicy::Keyed] {
        group.bench_function(format!("{:?}", policy), |b| {
            let mut widget = HeadlessMap::new(LatLng::new(37.475, 126.945), 5);
            let (mut rendered, _) = reconcile(&mut widget, RenderedSet::new(), &visible, policy);
            b.iter(|| {
                let current = std::mem::take(&mut rendered);
                let (next, report) = reconcile(&mut widget, current, &visible, policy);
                rendered = next;
                black_box(report)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_visible, bench_reconcile);
criterion_main!(benches);
