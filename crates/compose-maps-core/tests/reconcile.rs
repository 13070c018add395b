use std::cell::RefCell;
use std::rc::Rc;

use compose_maps_core::{
    CommitReport, Contribution, ContributionChain, Contributor, Kind, KindSet, Modifier, Platform,
    ReconcileConfig, ReconcileError, Setter, Symbol, SymbolError, Target,
};

type Sink = Rc<RefCell<Vec<String>>>;

struct Recording;

impl Platform for Recording {
    type Surface = Sink;
    type Root = Sink;
    type Overlay = Sink;
}

fn sink(target: Target<'_, Recording>) -> Sink {
    match target {
        Target::Surface(sink) | Target::Root(sink) | Target::Overlay(sink) => sink.clone(),
    }
}

fn set_color(target: Target<'_, Recording>, value: &&'static str) {
    let kind = target.kind();
    sink(target).borrow_mut().push(format!("{kind}.color={value}"));
}

fn set_radius(target: Target<'_, Recording>, value: &u32) {
    let kind = target.kind();
    sink(target).borrow_mut().push(format!("{kind}.radius={value}"));
}

fn color(value: &'static str) -> Modifier<Recording> {
    Modifier::element(Setter::new("color", KindSet::OVERLAY, value, set_color))
}

fn radius(value: u32) -> Modifier<Recording> {
    Modifier::element(Setter::new("radius", KindSet::OVERLAY, value, set_radius))
}

struct Stamp {
    id: usize,
}

impl Contributor<Recording> for Stamp {
    fn contribute(&mut self, target: Target<'_, Recording>) {
        let kind = target.kind();
        sink(target).borrow_mut().push(format!("{kind}.stamp={}", self.id));
    }
}

#[derive(Debug, PartialEq)]
struct Everywhere;

impl Contribution<Recording> for Everywhere {
    type Contributor = Stamp;

    fn kinds(&self) -> KindSet {
        KindSet::USER
    }

    fn create(&self) -> Stamp {
        thread_local!(static NEXT: std::cell::Cell<usize> = const { std::cell::Cell::new(0) });
        Stamp {
            id: NEXT.with(|next| {
                next.set(next.get() + 1);
                next.get()
            }),
        }
    }

    fn update(&self, _contributor: &mut Stamp) {}
}

#[test]
fn repeated_equal_generations_stay_noop() {
    let mut chain = ContributionChain::<Recording>::with_config(KindSet::OVERLAY, ReconcileConfig::new().verbose(true));
    let first = chain.reconcile(&color("red").then(radius(5))).unwrap();
    assert_eq!(first.created, 2);

    for _ in 0..3 {
        let report = chain.reconcile(&color("red").then(radius(5))).unwrap();
        assert!(report.is_noop());
        assert_eq!(report.reused, 2);
    }
}

#[test]
fn contribution_applies_latest_values_to_native() {
    let overlay = Sink::default();
    let mut chain = ContributionChain::<Recording>::new(KindSet::OVERLAY);

    chain.reconcile(&color("red").then(radius(5))).unwrap();
    chain.contribute(Target::Overlay(&mut overlay.clone()));
    chain.reconcile(&color("red").then(radius(7))).unwrap();
    chain.contribute(Target::Overlay(&mut overlay.clone()));

    assert_eq!(
        *overlay.borrow(),
        vec![
            "overlay.color=red",
            "overlay.radius=5",
            "overlay.color=red",
            "overlay.radius=7",
        ]
    );
}

#[test]
fn multi_kind_descriptor_contributes_to_each_native_separately() {
    let (surface, root, overlay) = (Sink::default(), Sink::default(), Sink::default());
    let mut chain = ContributionChain::<Recording>::new(KindSet::USER);
    chain.reconcile(&Modifier::element(Everywhere)).unwrap();

    chain.contribute(Target::Surface(&mut surface.clone()));
    chain.contribute(Target::Root(&mut root.clone()));
    chain.contribute(Target::Overlay(&mut overlay.clone()));

    let ids: Vec<usize> = Kind::ALL
        .into_iter()
        .map(|kind| chain.contributor::<Stamp>(kind, 0).unwrap().id)
        .collect();
    assert_eq!(surface.borrow().len(), 1);
    assert_eq!(root.borrow().len(), 1);
    assert_eq!(overlay.borrow().len(), 1);
    assert!(ids[0] != ids[1] && ids[1] != ids[2] && ids[0] != ids[2]);
}

#[test]
fn descriptors_report_live_generation() {
    let mut chain = ContributionChain::<Recording>::new(KindSet::OVERLAY);
    chain.reconcile(&color("red").then(radius(5))).unwrap();
    chain.reconcile(&color("blue").then(radius(5))).unwrap();

    let names: Vec<String> = chain
        .descriptors(Kind::Overlay)
        .map(|descriptor| format!("{descriptor:?}"))
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names[0].contains("blue"));
    assert!(names[1].contains("radius"));
}

#[test]
fn two_phase_commit_matches_reconcile() {
    let mut staged = ContributionChain::<Recording>::new(KindSet::OVERLAY);
    let mut direct = ContributionChain::<Recording>::new(KindSet::OVERLAY);
    let generations = [
        color("red").then(radius(5)),
        color("red").then(radius(7)),
        radius(7),
        Modifier::empty(),
    ];

    for generation in &generations {
        staged.diff(generation).unwrap();
        let report = staged.commit().unwrap();
        assert_eq!(report, direct.reconcile(generation).unwrap());
    }
    assert!(staged.is_empty() && direct.is_empty());
    assert_eq!(staged.commit().unwrap(), CommitReport::default());
}

#[test]
fn errors_render_readable_messages() {
    let err = ReconcileError::DuplicateDelegate { kind: Kind::Root };
    assert_eq!(err.to_string(), "more than one owning delegate contributed for root");

    let mut symbol: Symbol<u8> = Symbol::new("overlay");
    let err = symbol.get_mut().unwrap_err();
    assert_eq!(err, SymbolError::Unbound { name: "overlay" });
    assert_eq!(err.to_string(), "symbol `overlay` read before it was bound");
}
