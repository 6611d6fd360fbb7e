use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ranmix::cart::Product;
use ranmix::channel::{EvidenceImage, InMemoryChannel, NotificationChannelClient};
use ranmix::clock::ManualClock;
use ranmix::events::{EventCatalogStore, SimulatedOccupancy};
use ranmix::order::MemoryOrderRepository;
use ranmix::store::MemoryStorage;
use ranmix::workflow::{submission_pipeline, PaymentForm, SubmissionCtxData};
use ranmix::{format_price, parse_price, CartStore, ContextData};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn menu(n: usize) -> Vec<Product> {
  (0..n)
    .map(|i| Product::new(format!("Drink {}", i), if i % 2 == 0 { "coffee" } else { "tea" }, 39_000 + i as u64 * 1_000))
    .collect()
}

fn bench_cart_mutations(c: &mut Criterion) {
  let mut group = c.benchmark_group("CartMutations");

  for lines in [1usize, 10, 50].iter() {
    let products = menu(*lines);
    group.throughput(Throughput::Elements(*lines as u64));
    group.bench_with_input(BenchmarkId::new("add_then_bump", lines), &products, |b, products| {
      b.iter_batched(
        || CartStore::load(Arc::new(MemoryStorage::new())),
        |cart| {
          for product in products {
            cart.add_item(product.clone()).unwrap();
          }
          for product in products {
            cart.add_item(product.clone()).unwrap();
          }
          cart.state().total_price
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

fn bench_price_formatting(c: &mut Criterion) {
  let mut group = c.benchmark_group("PriceFormatting");
  let prices: Vec<u64> = vec![0, 999, 45_000, 1_250_000, 987_654_321];
  let rendered: Vec<String> = prices.iter().map(|p| format_price(*p)).collect();

  group.throughput(Throughput::Elements(prices.len() as u64));
  group.bench_function("format", |b| {
    b.iter(|| prices.iter().map(|p| format_price(*p).len()).sum::<usize>())
  });
  group.bench_function("parse", |b| {
    b.iter(|| rendered.iter().filter_map(|s| parse_price(s)).sum::<u64>())
  });
  group.finish();
}

fn bench_catalog_tick(c: &mut Criterion) {
  let mut group = c.benchmark_group("EventCatalogTick");
  let clock = Arc::new(ManualClock::new(chrono::Utc::now()));

  group.bench_function("seeded_catalog", |b| {
    b.iter_batched(
      || (EventCatalogStore::seeded(clock.clone()), SimulatedOccupancy::seeded(7)),
      |(catalog, mut source)| catalog.tick(&mut source),
      criterion::BatchSize::SmallInput,
    );
  });
  group.finish();
}

fn bench_submission_pipeline(c: &mut Criterion) {
  let mut group = c.benchmark_group("SubmissionPipeline");
  let rt = Runtime::new().unwrap();
  let pipeline = Arc::new(submission_pipeline());
  let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
  let evidence = EvidenceImage::new("receipt.jpg", "image/jpeg", vec![0xFF; 64 * 1024]).unwrap();

  group.bench_function("validate_record_notify", |b| {
    b.to_async(&rt).iter_batched(
      || {
        let channel = NotificationChannelClient::new(
          Arc::new(InMemoryChannel::new()),
          Arc::new(MemoryOrderRepository::new()),
        );
        ContextData::new(SubmissionCtxData {
          form: PaymentForm {
            customer_name: "Minh".to_string(),
            email: "minh@example.com".to_string(),
            phone: "0901234567".to_string(),
            amount: 125_000,
            payment_method: "bank transfer".to_string(),
            evidence: Some(evidence.clone()),
          },
          order: None,
          receipt: None,
          channel,
          clock: clock.clone(),
          on_recorded: None,
        })
      },
      |ctx| {
        let p_clone = pipeline.clone();
        async move { p_clone.run(ctx).await.unwrap() }
      },
      criterion::BatchSize::SmallInput,
    );
  });
  group.finish();
}

criterion_group!(
  benches,
  bench_cart_mutations,
  bench_price_formatting,
  bench_catalog_tick,
  bench_submission_pipeline
);
criterion_main!(benches);
