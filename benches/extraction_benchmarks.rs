//! Performance benchmarks for credsift components.
//!
//! Measures the heuristic extractors, the anchor/window primitives they are
//! built on, and the format/merge/export tail of the pipeline over messages
//! of growing size.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use credsift::config::WindowConfig;
use credsift::export::{self, CsvExporter, JsonExporter, JsonLayout, RecordExporter};
use credsift::extractors::{self, Extractor};
use credsift::format::{Formatter, RecordType};
use credsift::patterns::{self, ContextWindow};
use credsift::{AnalysisOptions, CredentialExtractor, dedup};

/// Typical migration request
const SAMPLE_TICKET: &str = "Dzień dobry,\n\
prosimy o migrację konta.\n\n\
serwer FTP: ftp.sklep-ania.pl\n\
login: ania_ftp\n\
hasło: Kwiatek#2024\n\
port: 2121\n\n\
Panel WordPress: https://sklep-ania.pl/wp-admin\n\
użytkownik: admin\n\
hasło: Adm1nPass\n\n\
Domena: sklep-ania.pl\n\
Serwery DNS: ns1.stary-hosting.pl, ns2.stary-hosting.pl\n\n\
Rekordy DNS:\n\
@ IN A 192.0.2.10\n\
www IN CNAME sklep-ania.pl.\n\
@ IN MX 10 mail.sklep-ania.pl.\n\n\
Skrzynki do przeniesienia:\n\
biuro@sklep-ania.pl hasło: Biuro123\n\
sklep@sklep-ania.pl hasło: Sklep456\n\n\
Serwer poczty: mail.stary-hosting.pl, IMAP 993, SMTP 465\n\
SSH: vps.sklep-ania.pl login: root hasło: R00t!\n";

/// Long message: the sample repeated between paragraphs of filler text.
fn generate_large_ticket(repeats: usize) -> String {
    let filler = "Uprzejmie prosimy o sprawne przeprowadzenie całej operacji \
                  w godzinach nocnych, tak aby klienci sklepu nie odczuli przerwy.\n";
    let mut text = String::with_capacity(repeats * (SAMPLE_TICKET.len() + filler.len() * 4));
    for i in 0..repeats {
        text.push_str(&SAMPLE_TICKET.replace("sklep-ania", &format!("sklep-{i}")));
        for _ in 0..4 {
            text.push_str(filler);
        }
    }
    text
}

fn bench_extractors(c: &mut Criterion) {
    let mut group = c.benchmark_group("extractors");
    let windows = WindowConfig::default();

    for extractor in extractors::default_extractors(&windows) {
        group.bench_function(extractor.name(), |b| {
            b.iter(|| extractor.extract(black_box(SAMPLE_TICKET)))
        });
    }

    group.bench_function("extract_all", |b| {
        b.iter(|| extractors::extract_all(black_box(SAMPLE_TICKET), &windows))
    });

    group.bench_function("extract_all_no_matches", |b| {
        let text = "Dzień dobry, proszę o wystawienie faktury. ".repeat(50);
        b.iter(|| extractors::extract_all(black_box(&text), &windows))
    });

    group.finish();
}

fn bench_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("patterns");

    group.bench_function("find_anchors_ftp_host", |b| {
        b.iter(|| patterns::find_anchors(black_box(SAMPLE_TICKET), &patterns::FTP_HOST))
    });

    group.bench_function("find_occurrences_username", |b| {
        b.iter(|| patterns::find_occurrences(black_box(SAMPLE_TICKET), &patterns::USERNAME))
    });

    let offset = SAMPLE_TICKET.find("ftp.sklep").unwrap_or(0);
    group.bench_function("window_probe_password", |b| {
        b.iter(|| {
            ContextWindow::around(black_box(SAMPLE_TICKET), offset, 200).probe(&patterns::PASSWORD)
        })
    });

    group.finish();
}

fn bench_pipeline_tail(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_tail");
    let text = generate_large_ticket(20);
    let candidates = extractors::extract_all(&text, &WindowConfig::default());
    let formatter = Formatter::new();
    let records = formatter.format_all(&candidates);

    group.bench_function("dedup", |b| b.iter(|| dedup(black_box(candidates.clone()))));
    group.bench_function("format_all", |b| {
        b.iter(|| formatter.format_all(black_box(&candidates)))
    });
    group.bench_function("group", |b| b.iter(|| export::group(black_box(&records))));
    group.bench_function("json_categorized", |b| {
        let exporter = JsonExporter::new(JsonLayout::Categorized);
        b.iter(|| exporter.export(black_box(&records)))
    });
    group.bench_function("csv_ftp", |b| {
        let exporter = CsvExporter::new(RecordType::Ftp);
        b.iter(|| exporter.export(black_box(&records)))
    });

    group.finish();
}

/// Benchmark throughput with varying input sizes
fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    let extractor = CredentialExtractor::heuristic_only(WindowConfig::default());
    let opts = AnalysisOptions::default();

    for &size in &[1, 10, 50] {
        let text = generate_large_ticket(size);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("analyze_offline", size), &text, |b, text| {
            b.iter(|| extractor.analyze_offline(black_box(text), None, &opts))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_extractors,
    bench_patterns,
    bench_pipeline_tail,
    bench_throughput
);

criterion_main!(benches);
