use compose_maps_core::{Contribution, ContributionChain, Contributor, KindSet, Modifier, Platform, Target};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const CHAIN_LENGTHS: &[usize] = &[4, 16, 64];

struct Headless;

impl Platform for Headless {
    type Surface = ();
    type Root = ();
    type Overlay = ();
}

struct Slot {
    value: u32,
}

impl Contributor<Headless> for Slot {
    fn contribute(&mut self, _target: Target<'_, Headless>) {
        black_box(self.value);
    }
}

#[derive(Debug, PartialEq)]
struct Width(u32);

#[derive(Debug, PartialEq)]
struct Tint(u32);

macro_rules! slot_contribution {
    ($name:ident) => {
        impl Contribution<Headless> for $name {
            type Contributor = Slot;

            fn kinds(&self) -> KindSet {
                KindSet::OVERLAY | KindSet::ROOT
            }

            fn create(&self) -> Slot {
                Slot { value: self.0 }
            }

            fn update(&self, contributor: &mut Slot) {
                contributor.value = self.0;
            }
        }
    };
}

slot_contribution!(Width);
slot_contribution!(Tint);

fn build(len: usize, generation: u32, alternate_types: bool) -> Modifier<Headless> {
    (0..len).fold(Modifier::empty(), |chain, index| {
        let value = index as u32 + generation;
        if alternate_types && (index as u32 + generation) % 2 == 0 {
            chain.with(Tint(value))
        } else {
            chain.with(Width(value))
        }
    })
}

fn bench_steady_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_steady_state");
    for &len in CHAIN_LENGTHS {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let mut chain = ContributionChain::new(KindSet::USER);
            chain.reconcile(&build(len, 0, false)).ok();
            b.iter(|| {
                let report = chain.reconcile(black_box(&build(len, 0, false)));
                black_box(report)
            });
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_churn");
    for &len in CHAIN_LENGTHS {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let mut chain = ContributionChain::new(KindSet::USER);
            let mut generation = 0u32;
            b.iter(|| {
                generation = generation.wrapping_add(1);
                let report = chain.reconcile(black_box(&build(len, generation, true)));
                chain.contribute(Target::Overlay(&mut ()));
                black_box(report)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_steady_state, bench_churn);
criterion_main!(benches);
