use std::sync::Arc;

use common::{ItemStatus, Money, ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    Actor, AdvanceStatus, CreateOrder, InMemoryAccountDirectory, InMemoryCatalog,
    NotificationDispatcher, OrderService, ProductSnapshot, RecordingNotifier, authorize,
    ensure_legal,
};
use order_store::{CartLine, DeliveryDetails, InMemoryOrderStore};

fn delivery() -> DeliveryDetails {
    DeliveryDetails {
        address: "1 Market St".to_string(),
        phone: "555-0100".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        city: "London".to_string(),
        region: "Greater London".to_string(),
    }
}

struct Fixture {
    service: OrderService<InMemoryOrderStore>,
    store: InMemoryOrderStore,
    buyer: UserId,
    seller: UserId,
    products: Vec<ProductId>,
}

fn fixture(product_count: usize) -> Fixture {
    let store = InMemoryOrderStore::new();
    let catalog = InMemoryCatalog::new();
    let accounts = InMemoryAccountDirectory::new();
    let buyer = UserId::new();
    let seller = UserId::new();
    accounts.register(buyer);

    let products: Vec<ProductId> = (0..product_count).map(|_| ProductId::new()).collect();
    for product in &products {
        catalog.put_product(
            *product,
            ProductSnapshot::new(seller, "Benchmark Widget", Money::from_cents(1000)),
        );
    }

    let service = OrderService::new(
        store.clone(),
        Arc::new(catalog),
        Arc::new(accounts),
        NotificationDispatcher::inline(Arc::new(RecordingNotifier::new())),
    );

    Fixture {
        service,
        store,
        buyer,
        seller,
        products,
    }
}

fn bench_transition_rules(c: &mut Criterion) {
    let buyer = UserId::new();
    let seller = UserId::new();
    let actor = Actor::seller(seller);

    c.bench_function("domain/transition_rules_all_pairs", |b| {
        b.iter(|| {
            let mut allowed = 0;
            for current in ItemStatus::ALL {
                for target in ItemStatus::ALL {
                    if ensure_legal(current, target).is_ok()
                        && authorize(&actor, target, seller, buyer).is_ok()
                    {
                        allowed += 1;
                    }
                }
            }
            allowed
        });
    });
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let f = fixture(5);

    c.bench_function("domain/create_order_5_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                for product in &f.products {
                    f.store
                        .put_cart_line(CartLine::new(f.buyer, *product, 1))
                        .await;
                }
                f.service
                    .create_order(CreateOrder::new(f.buyer, delivery()))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let f = fixture(1);

    c.bench_function("domain/create_and_receive", |b| {
        b.iter(|| {
            rt.block_on(async {
                f.store
                    .put_cart_line(CartLine::new(f.buyer, f.products[0], 1))
                    .await;
                let placed = f
                    .service
                    .create_order(CreateOrder::new(f.buyer, delivery()))
                    .await
                    .unwrap();

                for status in ItemStatus::PIPELINE.iter().skip(1) {
                    f.service
                        .advance_status(AdvanceStatus::new(
                            placed.order.id,
                            f.products[0],
                            Actor::seller(f.seller),
                            *status,
                        ))
                        .await
                        .unwrap();
                }
            });
        });
    });
}

criterion_group!(
    benches,
    bench_transition_rules,
    bench_create_order,
    bench_full_pipeline
);
criterion_main!(benches);
