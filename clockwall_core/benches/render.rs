use clockwall_core::grid::{RenderGrid, TimeFormat};
use clockwall_core::time_digits;
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

// 2025-01-01T00:00:00Z
const START_MS: f64 = 1_735_689_600_000.0;

pub fn bench_render(c: &mut Criterion) {
    let mut g = c.benchmark_group("render");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p clockwall_core --bench render
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    for &twelve_hour in &[false, true] {
        let format = TimeFormat {
            utc_offset_hours: 5.5,
            twelve_hour,
        };
        g.bench_function(format!("time_digits_h12_{twelve_hour}"), |b| {
            b.iter(|| black_box(time_digits(black_box(START_MS + 123_456.0), &format)))
        });

        // One simulated hour of ticks through a fresh grid
        g.bench_function(format!("grid_hour_h12_{twelve_hour}"), |b| {
            b.iter_batched(
                RenderGrid::new,
                |mut grid| {
                    for s in 0..3600u32 {
                        let frame = grid.render(START_MS + f64::from(s) * 1000.0, &format);
                        black_box(frame.time);
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(render, bench_render);
criterion_main!(render);
