use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vapp_planner::legacy::LegacyInstrument;
use vapp_planner::observation::Observation;
use vapp_planner::target::{SkyCoord, Target};
use vapp_planner::time::parse_instant;
use vapp_planner::time_series::TimeWindow;

/// Track HR 8799 b over an eight hour night at increasing sampling density.
fn bench_track(c: &mut Criterion) {
    let (instrument, vapp) = LegacyInstrument::Charis.setup(0.0).unwrap();
    let coords = SkyCoord::from_sexagesimal("23 07 28.7157", "+21 08 03.302").unwrap();
    let target = Target::new("HR 8799", coords, 65.0, 1.7, Some(11.0)).unwrap();
    let start = parse_instant("2019-05-17T10:00").unwrap();
    let obs = Observation::new(instrument, vapp, target, start, None).unwrap();

    let mut group = c.benchmark_group("companion_track");
    for steps in [8u32, 60, 480] {
        let window = TimeWindow::parse("2019-05-17T10:00", "2019-05-17T18:00", steps).unwrap();
        group.bench_function(format!("{steps}_steps"), |b| {
            b.iter(|| black_box(obs.track(black_box(&window)).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_track);
criterion_main!(benches);
