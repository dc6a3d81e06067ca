use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::io::Write;
use std::sync::OnceLock;
use tempfile::TempDir;
use turnover::prelude::*;

const REGIONALS: [&str; 4] = ["Sul", "Norte", "Leste", "Oeste"];
const REASONS: [&str; 5] = ["Pedido", "Justa causa", "Proposta", "Abandono", "Fim de contrato"];

// Synthetic dataset shared by every benchmark
static DATASET: OnceLock<TerminationDataset> = OnceLock::new();

fn synthetic_records(n: usize) -> Vec<TerminationRecord> {
    (0..n)
        .map(|i| TerminationRecord {
            regional: Some(REGIONALS[i % REGIONALS.len()].to_string()),
            supervisor: Some(format!("Supervisor {}", i % 37)),
            brand: Some(if i % 3 == 0 { "FPP" } else { "DC" }.to_string()),
            registration_id: Some(format!("{:05}", i)),
            employee_name: Some(format!("Colaborador {}", i)),
            birth_date: Some(format!("{:02}/{:02}/{}", 1 + i % 28, 1 + i % 12, 1960 + i % 45)),
            role: Some("Operador".to_string()),
            admission_date: Some(format!("{:02}/{:02}/{}", 1 + i % 28, 1 + (i / 7) % 12, 2005 + i % 18)),
            termination_date: Some(format!("{:02}/{:02}/2024", 1 + (i / 3) % 28, 1 + (i / 11) % 12)),
            initiative: Some(if i % 2 == 0 { "Inic. Empregado" } else { "Inic. Empresa" }.to_string()),
            reason: Some(REASONS[i % REASONS.len()].to_string()),
        })
        .collect()
}

fn get_dataset() -> &'static TerminationDataset {
    DATASET.get_or_init(|| TerminationDataset::from_records(synthetic_records(5_000)))
}

fn benchmark_enrichment(c: &mut Criterion) {
    let mut group = c.benchmark_group("enrichment");
    for size in [500usize, 5_000] {
        let records = synthetic_records(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| enrich_all(black_box(records.clone())))
        });
    }
    group.finish();
}

fn benchmark_reading(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("base.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", TerminationSchema::required_columns().join(";")).unwrap();
    for r in synthetic_records(5_000) {
        let fields = [
            r.regional, r.supervisor, r.brand, r.registration_id, r.employee_name, r.birth_date,
            r.role, r.admission_date, r.termination_date, r.initiative, r.reason,
        ];
        let line: Vec<String> = fields.into_iter().map(|f| f.unwrap_or_default()).collect();
        writeln!(file, "{}", line.join(";")).unwrap();
    }
    drop(file);

    c.bench_function("load_csv_5k_sniffed", |b| {
        b.iter(|| TerminationReader::new().load(black_box(&path)).unwrap())
    });
}

fn benchmark_filters(c: &mut Criterion) {
    let dataset = get_dataset();
    let filters = FilterSet::new().regional("Sul").initiative("Inic. Empregado");

    c.bench_function("filter_two_dimensions", |b| {
        b.iter(|| dataset.filter(black_box(&filters)).len())
    });

    c.bench_function("query_early_resignations", |b| {
        b.iter(|| {
            dataset.query()
                .initiative_kind(InitiativeKind::Employee)
                .tenure_bucket(TenureBucket::UnderOneYear)
                .count()
        })
    });
}

fn benchmark_aggregations(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregations");
    let dataset = get_dataset();
    let view = dataset.all();
    let as_of = chrono::NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

    group.bench_function("monthly_timeline", |b| b.iter(|| view.analytics().monthly_timeline()));
    group.bench_function("risk_matrix", |b| b.iter(|| view.analytics().risk_matrix()));
    group.bench_function("age_breakdown", |b| b.iter(|| view.analytics().age_breakdown()));
    group.bench_function("dashboard_report", |b| {
        b.iter(|| DashboardReport::build(dataset, &FilterSet::new(), 640, black_box(as_of)))
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_enrichment,
    benchmark_reading,
    benchmark_filters,
    benchmark_aggregations
);
criterion_main!(benches);
