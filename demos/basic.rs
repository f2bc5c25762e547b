use std::{sync::Arc, thread, time::Duration};

use idcache::{CacheRegistryBuilder, Cacheable, IdCacheError, Identifier, Mergeable, Slot};

#[derive(Debug, Clone)]
struct Record {
    name: String,
    version: u32,
}

#[derive(Debug)]
struct Customer(Slot<Record>);

impl Mergeable for Customer {
    fn merge(
        &self,
        fresh: Self,
    ) {
        self.0.merge(fresh.0);
    }
}

impl Cacheable for Customer {
    const TAG: &'static str = "customer";
}

fn load(
    id: &Identifier,
    name: &str,
    version: u32,
) -> Result<Customer, IdCacheError> {
    println!("loading {} -> {}", id, name);
    Ok(Customer(Slot::new(Record {
        name: name.to_string(),
        version,
    })))
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let registry = CacheRegistryBuilder::new().build().unwrap();
    let customers = registry.cache::<Customer>();

    let a = customers.get(42, 1, Some(|id: &Identifier| load(id, "A", 1))).unwrap().unwrap();
    let again = customers.get(42, 1, Some(|id: &Identifier| load(id, "never", 0))).unwrap().unwrap();
    println!("hit shares identity: {}", Arc::ptr_eq(&a, &again));

    thread::sleep(Duration::from_millis(1100));

    let b = customers.get(42, 1, Some(|id: &Identifier| load(id, "B", 2))).unwrap().unwrap();
    println!("reload shares identity: {}, held instance now {:?}", Arc::ptr_eq(&a, &b), a.0.get());

    customers.push_update(42, Customer(Slot::new(Record {
        name: "C".to_string(),
        version: 3,
    })));
    let current = a.0.get();
    println!("after push_update: {} v{}", current.name, current.version);

    println!("stats: {:?}", customers.stats());
}
