use std::collections::BTreeSet;
use std::fmt::Write;
use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hifitime::Epoch;

use snxroster::{
    geodesy::Transformer,
    sinex::{parse_solution_estimate, BlockPolicy},
};

/// Station code of index `i`: `aaaa`, `aaab`, ...
fn station_code(mut i: usize) -> String {
    let mut code = [b'a'; 4];
    for slot in code.iter_mut().rev() {
        *slot = b'a' + (i % 26) as u8;
        i /= 26;
    }
    String::from_utf8(code.to_vec()).unwrap()
}

/// Synthetic solution with `stations` sites, each carrying position and velocity records.
fn synthetic_solution(stations: usize) -> String {
    let mut text = String::from("%=SNX 2.02 IGS 24:079:34521 IGS 24:073:00000 24:073:86399 P\n");
    text.push_str("+SOLUTION/ESTIMATE\n");
    let mut index = 1;
    for i in 0..stations {
        let code = station_code(i).to_uppercase();
        for (param, value) in [
            ("STAX", 4231162.32414131 + i as f64),
            ("STAY", -332746.71234 - i as f64),
            ("STAZ", 4745131.0 + i as f64),
            ("VELX", -0.0155),
        ] {
            let unit = if param.starts_with("VEL") { "m/y" } else { "m  " };
            writeln!(
                text,
                "{index:>6} {param}   {code}  A    1 24:073:43200 {unit}  2 {value:>21.14E} 0.1031E-02"
            )
            .unwrap();
            index += 1;
        }
    }
    text.push_str("-SOLUTION/ESTIMATE\n%ENDSNX\n");
    text
}

fn bench_parse(c: &mut Criterion) {
    let epoch = Epoch::from_gregorian_utc_at_midnight(2024, 3, 13);
    let mut group = c.benchmark_group("parse_solution_estimate");

    for stations in [100usize, 500, 2000] {
        let text = synthetic_solution(stations);
        // half of the sites are kept
        let known: BTreeSet<String> = (0..stations).step_by(2).map(station_code).collect();

        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", stations), &text, |b, text| {
            b.iter(|| {
                parse_solution_estimate(
                    Cursor::new(black_box(text.as_str())),
                    &known,
                    epoch,
                    BlockPolicy::FirstBlockOnly,
                )
                .unwrap()
            })
        });
        group.bench_with_input(
            BenchmarkId::new("parse_and_transform", stations),
            &text,
            |b, text| {
                b.iter(|| {
                    let parsed = parse_solution_estimate(
                        Cursor::new(black_box(text.as_str())),
                        &known,
                        epoch,
                        BlockPolicy::FirstBlockOnly,
                    )
                    .unwrap();
                    Transformer::default().transform(parsed)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
