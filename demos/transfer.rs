//! Sends a `Transfer` record through both pipelines and checks what comes
//! back.
//!
//! ```text
//! RUST_LOG=serde_proto=trace cargo run --example transfer
//! ```

use chrono::{SubsecRound, Utc};
use serde_proto::{Codec, Object, Pattern, Prototype, Resolver, Result, Value};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).compact())
        .init();
}

struct Classes {
    base: Arc<Prototype>,
    derived: Arc<Prototype>,
    transfer: Arc<Prototype>,
}

impl Classes {
    fn new() -> Self {
        let base = Arc::new(Prototype::new("Base").with_tag("Base"));
        let derived = Arc::new(Prototype::new("Derived").extending(&base).with_tag("Derived"));
        let transfer = Arc::new(Prototype::new("Transfer").with_tag("Transfer"));
        Classes {
            base,
            derived,
            transfer,
        }
    }

    fn base(&self, ts: Value) -> Value {
        let mut obj = Object::with_prototype(&self.base);
        obj.insert("ts", ts);
        Value::Object(obj)
    }

    fn derived(&self, s: &str) -> Result<Value> {
        let mut obj = Object::with_prototype(&self.derived);
        obj.insert("ts", Value::from(0));
        obj.insert("s", Value::from(s));
        obj.insert("i", Value::from(f64::INFINITY));
        obj.insert("j", Value::from(f64::NEG_INFINITY));
        obj.insert("x", Value::from(f64::NAN));
        obj.insert("re", Value::Pattern(Pattern::new(s, "gim")?));
        Ok(Value::Object(obj))
    }

    fn transfer(&self, id: i64) -> Result<Value> {
        let mut sub = Object::new();
        sub.insert("d1", self.derived("d1")?);
        sub.insert("d2", self.derived("d2")?);

        let mut obj = Object::with_prototype(&self.transfer);
        obj.insert("id", Value::from(id));
        obj.insert("b", self.base(Value::Date(Utc::now().trunc_subsecs(3))));
        obj.insert("sub", Value::Object(sub));
        obj.insert(
            "a",
            Value::Array(vec![
                self.derived("da[0]")?,
                self.base(Value::from(123_456_789)),
                self.derived("da[2]")?,
                self.base(Value::from(987_654_321)),
            ]),
        );
        Ok(Value::Object(obj))
    }

    fn resolver(&self) -> Result<Resolver> {
        Resolver::from_prototypes([&self.base, &self.derived, &self.transfer])
    }
}

fn check(classes: &Classes, label: &str, sent: &Value, received: &Value) -> bool {
    let checks = [
        (
            "Transfer lineage",
            received
                .as_object()
                .is_some_and(|o| o.instance_of(&classes.transfer)),
        ),
        (
            "Date",
            received.get("b").and_then(|b| b.get("ts")) == sent.get("b").and_then(|b| b.get("ts")),
        ),
        (
            "Derived lineage",
            received
                .get("sub")
                .and_then(|s| s.get("d2"))
                .and_then(Value::as_object)
                .is_some_and(|o| o.instance_of(&classes.derived) && o.instance_of(&classes.base)),
        ),
        (
            "NaN",
            received
                .get("sub")
                .and_then(|s| s.get("d1"))
                .and_then(|d| d.get("x"))
                .and_then(Value::as_f64)
                .is_some_and(f64::is_nan),
        ),
        ("whole tree", received == sent),
    ];

    let mut good = true;
    for (name, ok) in checks {
        if ok {
            info!(pipeline = label, check = name, "OK");
        } else {
            warn!(pipeline = label, check = name, "FAIL");
            good = false;
        }
    }
    good
}

fn main() -> Result<()> {
    init_tracing();

    let classes = Classes::new();
    let resolver = classes.resolver()?;
    let codec = Codec::default();
    let sent = classes.transfer(123)?;

    let direct = codec.encode(&sent)?;
    info!("streaming payload: {}", direct);
    let received = resolver.decode(&direct)?;
    let mut good = check(&classes, "streaming", &sent, &received);

    let mut packed = sent.clone();
    let indirect = codec.encode_in_place(&mut packed)?;
    info!("deep-walk payload: {}", indirect);
    let received = resolver.decode_in_place(&indirect)?;
    good &= check(&classes, "deep walk", &sent, &received);

    let received = resolver.decode(&indirect)?;
    good &= check(&classes, "deep walk -> streaming", &sent, &received);

    if good {
        info!("all checks passed");
    } else {
        warn!("some checks failed");
    }
    Ok(())
}
