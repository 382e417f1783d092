#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use cellscene::boundary::Boundary;
use cellscene::figure::{FigureKind, FigureShape};
use cellscene::links::{LinkKind, LinkRequest};
use cellscene::math::{CuttingPlane, Point3, Vector3};
use cellscene::particle::{ParticleData, ParticleSet, SharedParticles};
use cellscene::{FigureStore, SceneConfig, SceneDriver};

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

#[test]
fn particle_crossing_a_face_gets_one_image() {
    init_tracing();
    let mut set = ParticleSet::new();
    let id = set.insert(ParticleData::sphere(Point3::new(4.5, 0.0, 0.0), 2.0));
    let mut store = FigureStore::new();
    let mut driver = SceneDriver::new(SceneConfig {
        draw_overflow: true,
        image_shells: 1,
        ..SceneConfig::default()
    });

    let report = driver
        .draw_frame(&mut set, &Boundary::periodic_cube(10.0), &mut store)
        .unwrap();
    assert_eq!(report.overflow_images, 1);
    assert_eq!(report.image_origins, 26);
    assert_eq!(store.image_origins().len(), 26);
    assert!(store.image_origins().contains(&Vector3::new(-10.0, 0.0, 0.0)));
    assert_eq!(store.count(FigureKind::Ball), 2);

    let image = driver.overflow_images(id).unwrap().get(0).unwrap();
    let FigureShape::Ball { center, diameter } = store.figure(image).unwrap().shape else {
        panic!("expected a ball");
    };
    assert_eq!(center, Point3::new(-5.5, 0.0, 0.0));
    assert_eq!(diameter, 2.0);
}

#[test]
fn link_requested_before_first_frame_is_drawn_once() {
    init_tracing();
    let mut set = ParticleSet::new();
    let a = set.insert(ParticleData::sphere(Point3::new(-1.0, 0.0, 0.0), 1.0));
    let b = set.insert(ParticleData::sphere(Point3::new(1.0, 0.0, 0.0), 1.0));
    let mut store = FigureStore::new();
    let mut driver = SceneDriver::new(SceneConfig::default());
    let boundary = Boundary::periodic_cube(10.0);

    let (links, registry) = driver.links_mut();
    let request = links.request_link(a, b, LinkKind::Plain, registry, &mut store).unwrap();
    assert!(matches!(request, LinkRequest::Queued(_)));

    let first = driver.draw_frame(&mut set, &boundary, &mut store).unwrap();
    assert_eq!(first.links_created, 1);
    let second = driver.draw_frame(&mut set, &boundary, &mut store).unwrap();
    assert_eq!(second.links_created, 0);

    assert_eq!(store.count(FigureKind::Bond), 1);
    assert_eq!(driver.links().pending_len(), 0);
    let bond = driver.links().link_figure(a, b, LinkKind::Plain).unwrap();
    assert!(store.is_visible(bond));
}

#[test]
fn plane_sweeping_through_the_cell() {
    init_tracing();
    let mut set = ParticleSet::new();
    let mut store = FigureStore::new();
    let mut driver = SceneDriver::new(SceneConfig::default());
    let boundary = Boundary::periodic_cube(10.0);
    let plane = driver
        .planes_mut()
        .add_plane(CuttingPlane::new(Vector3::z(), 6.0).unwrap());

    let mut counts = Vec::new();
    for step in 0..=12 {
        let z = -6.0 + f64::from(step);
        driver
            .planes_mut()
            .set_plane(plane, CuttingPlane::new(Vector3::z(), -z).unwrap())
            .unwrap();
        let report = driver.draw_frame(&mut set, &boundary, &mut store).unwrap();
        counts.push(report.plane_triangles);
    }

    assert_eq!(counts.first(), Some(&0));
    assert_eq!(counts.last(), Some(&0));
    assert!(counts[1..12].iter().all(|&n| n == 2));
    // Two triangles created on entry and released on exit.
    assert_eq!(store.count(FigureKind::Triangle), 0);
    assert_eq!(
        store.created() - store.count(FigureKind::Line),
        2,
        "triangles were recreated while the plane moved"
    );
}

#[test]
fn truncated_octahedron_cell() {
    init_tracing();
    let mut set = ParticleSet::new();
    set.insert(ParticleData::sphere(Point3::new(0.2, 5.0, 5.0), 1.0));
    let mut store = FigureStore::new();
    let mut driver = SceneDriver::new(SceneConfig {
        draw_overflow: true,
        image_shells: 1,
        ..SceneConfig::default()
    });

    let report = driver
        .draw_frame(&mut set, &Boundary::truncated_octahedron(10.0), &mut store)
        .unwrap();
    assert_eq!(report.boundary_edges, 36);
    assert_eq!(report.overflow_images, 1);
    assert_eq!(report.image_origins, 26);
    let bounds = store.bounding_box().unwrap();
    assert!(bounds.contains(&Point3::new(0.2, 5.0, 5.0)));
    assert_eq!(bounds.min, Point3::origin());
}

#[test]
fn producer_thread_never_leaves_dangling_figures() {
    init_tracing();
    let mut set = ParticleSet::new();
    for i in 0..50 {
        set.insert(ParticleData::sphere(Point3::new(f64::from(i) * 0.1, 0.0, 0.0), 0.5));
    }
    let mut shared = SharedParticles::new(set);
    let producer = shared.clone();
    let done = Arc::new(AtomicBool::new(false));
    let stop = Arc::clone(&done);

    let handle = thread::spawn(move || {
        let mut step = 0_u32;
        while !stop.load(Ordering::Relaxed) && step < 10_000 {
            let mut set = producer.write();
            if step % 3 == 0 {
                let oldest = set.ids().next();
                if let Some(id) = oldest {
                    set.remove(id);
                }
            } else {
                set.insert(ParticleData::sphere(Point3::new(0.0, f64::from(step % 7), 0.0), 0.5));
            }
            drop(set);
            step += 1;
        }
    });

    let mut store = FigureStore::new();
    let mut driver = SceneDriver::new(SceneConfig::default());
    let boundary = Boundary::periodic_cube(10.0);
    for _ in 0..200 {
        driver.draw_frame(&mut shared, &boundary, &mut store).unwrap();
    }
    done.store(true, Ordering::Relaxed);
    handle.join().unwrap();

    let report = driver.draw_frame(&mut shared, &boundary, &mut store).unwrap();
    assert!(!report.sync.truncated);
    assert_eq!(report.sync.stale, 0);

    let live = shared.read().len();
    assert_eq!(driver.registry().len(), live);
    assert_eq!(store.count(FigureKind::Ball), live);
    for (particle, figure) in driver.registry().iter() {
        assert!(shared.read().get(particle).is_some());
        assert!(store.is_visible(figure));
    }
}
