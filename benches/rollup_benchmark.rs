use criterion::{black_box, criterion_group, criterion_main, Criterion};
use facility_rollup::assembly::assembler::FacilitySummaryAssembler;
use facility_rollup::config::{PipelineConfig, ReportingCalendar};
use facility_rollup::pipeline::run_pipeline;
use facility_rollup::rollup::assembler::RollupAssembler;
use facility_rollup::simulation::synthetic::{generate_sources, SyntheticConfig};

fn portfolio(facility_count: usize, counterparty_count: usize) -> facility_rollup::source::tables::SourceTables {
    let config = SyntheticConfig {
        facility_count,
        counterparty_count,
    };
    generate_sources(&config, &ReportingCalendar::default())
}

fn bench_assemble_1000_facilities(c: &mut Criterion) {
    let tables = portfolio(1_000, 200);
    let calendar = ReportingCalendar::default();

    c.bench_function("assemble_1000_facilities", |b| {
        b.iter(|| FacilitySummaryAssembler::new(black_box(&tables), calendar).assemble())
    });
}

fn bench_rollup_10000_facilities(c: &mut Criterion) {
    let tables = portfolio(10_000, 1_500);
    let calendar = ReportingCalendar::default();
    let facilities = FacilitySummaryAssembler::new(&tables, calendar).assemble();

    c.bench_function("rollup_10000_facilities", |b| {
        b.iter(|| RollupAssembler::new(&tables, calendar).assemble(black_box(&facilities)))
    });
}

fn bench_pipeline_10000_facilities(c: &mut Criterion) {
    let tables = portfolio(10_000, 1_500);
    let config = PipelineConfig::default();

    c.bench_function("pipeline_10000_facilities", |b| {
        b.iter(|| run_pipeline(black_box(&tables), &config))
    });
}

criterion_group!(
    benches,
    bench_assemble_1000_facilities,
    bench_rollup_10000_facilities,
    bench_pipeline_10000_facilities
);
criterion_main!(benches);
