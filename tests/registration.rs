//! Registration validation through the public builder API.

mod common;

use std::sync::Arc;
use std::time::Duration;

use actionvisor::{
    AdmissionSet, ConfigViolation, Engine, EventKey, KeyFnRef, RegistrationError,
};
use common::{Gauge, sleeper};
use tokio_util::sync::CancellationToken;

struct Order {
    customer: String,
}

fn order(customer: &str) -> Order {
    Order {
        customer: customer.to_string(),
    }
}

#[test]
fn rejected_binding_registers_nothing() {
    let mut builder = Engine::<Order>::builder();
    let err = builder
        .on(["order.placed"])
        .concurrency_group("customer", 0, |_, o| o.customer.clone())
        .bind("reserve-stock", sleeper(Gauge::new(), Duration::ZERO))
        .unwrap_err();

    assert_eq!(
        err,
        RegistrationError::Invalid {
            violations: vec![ConfigViolation::ZeroGroupCapacity {
                group: "customer".into()
            }],
        }
    );
    assert_eq!(err.as_label(), "registration_invalid");
    assert!(builder.registry().actions_for("order.placed").is_empty());
    assert!(!builder.registry().contains_action("reserve-stock"));
}

#[test]
fn duplicate_action_key_is_rejected() {
    let mut builder = Engine::<Order>::builder();
    builder
        .on(["order.placed"])
        .bind("notify", sleeper(Gauge::new(), Duration::ZERO))
        .unwrap();

    let err = builder
        .on(["order.shipped"])
        .bind("notify", sleeper(Gauge::new(), Duration::ZERO))
        .unwrap_err();

    assert_eq!(
        err.violations(),
        [ConfigViolation::DuplicateAction {
            action: "notify".into()
        }]
    );
    assert!(builder.registry().actions_for("order.shipped").is_empty());
    assert_eq!(builder.registry().actions_for("order.placed").len(), 1);
}

#[test]
fn violation_messages_name_the_problem() {
    let mut builder = Engine::<Order>::builder();
    let err = builder
        .on(Vec::<&str>::new())
        .concurrency(0)
        .bind("", sleeper(Gauge::new(), Duration::ZERO))
        .unwrap_err();

    let labels: Vec<&str> = err.violations().iter().map(|v| v.as_label()).collect();
    assert_eq!(labels, ["missing_action_key", "no_event_keys", "zero_global_capacity"]);
    assert!(err.to_string().starts_with("registration rejected: "));
    assert!(err.to_string().contains("at least one event key"));
}

#[tokio::test]
async fn prepared_admission_set_can_be_registered_directly() -> anyhow::Result<()> {
    let by_customer: KeyFnRef<Order> =
        Arc::new(|_: &CancellationToken, o: &Order| o.customer.clone());
    let mut admission = AdmissionSet::new();
    admission.add_group("customer", 1, Some(by_customer));

    let gauge = Gauge::new();
    let mut builder = Engine::<Order>::builder();
    builder.register(
        vec![EventKey::from("order.placed")],
        "charge".into(),
        sleeper(gauge.clone(), Duration::from_millis(50)),
        admission,
    )?;
    let engine = builder.build();
    let ctx = CancellationToken::new();

    assert_eq!(engine.dispatch(&ctx, "order.placed", order("c1")).granted(), 1);
    assert_eq!(engine.dispatch(&ctx, "order.placed", order("c1")).granted(), 0);
    assert_eq!(engine.dispatch(&ctx, "order.placed", order("c2")).granted(), 1);

    engine.drain(Duration::from_secs(2)).await?;
    assert_eq!(gauge.runs(), 2);
    Ok(())
}
