//! Benchmark for config parsing and validation

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rotor::config::RotorConfig;
use std::fmt::Write;
use std::path::Path;

fn bench_config_load_from_file(c: &mut Criterion) {
    let config_path = Path::new("rotor.example.toml");

    c.bench_function("config_parse_from_file", |b| {
        b.iter(|| {
            let config = RotorConfig::load(Some(black_box(config_path)));
            black_box(config)
        });
    });
}

fn bench_config_large_pool(c: &mut Criterion) {
    let mut toml_content = String::from("default_proxy_limit = 10\ndefault_proxy_window_seconds = 1\n");
    for i in 0..200 {
        let _ = write!(
            toml_content,
            "\n[[proxies]]\naddress = \"http://10.0.{}.{}:3128\"\nlimit = 5\nwindow_seconds = 1\n",
            i / 250,
            i % 250
        );
    }
    for i in 0..100 {
        let _ = write!(
            toml_content,
            "\n[[endpoints]]\npattern = \"https://api{}.example.com/*\"\nlimit = 20\nwindow_seconds = 1\n",
            i
        );
    }

    c.bench_function("config_parse_and_validate_large", |b| {
        b.iter(|| {
            let config = RotorConfig::parse(black_box(&toml_content)).unwrap();
            config.validate().unwrap();
            black_box(config)
        });
    });
}

criterion_group!(benches, bench_config_load_from_file, bench_config_large_pool);
criterion_main!(benches);
