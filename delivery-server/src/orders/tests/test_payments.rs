use super::*;

fn paid_report(invoice: &str) -> GatewayPaymentStatus {
    GatewayPaymentStatus {
        invoice_id: invoice.into(),
        raw_status: "Paid".into(),
    }
}

#[tokio::test]
async fn initiate_uses_the_authoritative_total_and_stores_the_invoice_id() {
    let ctx = test_context().await;
    let order = place_gateway_order(&ctx).await;
    let order_id = order.id_string();

    ctx.gateway.push_create(Ok(InvoiceCreated {
        invoice_id: "914000".into(),
        payment_url: "https://pay.example/914000".into(),
    }));

    let initiated = ctx.state.reconciler().initiate(&order_id).await.unwrap();
    assert_eq!(initiated.invoice_id, "914000");
    assert_eq!(initiated.payment_url, "https://pay.example/914000");

    // Invoice id persisted immediately; payment still unpaid
    let current = reload(&ctx, &order_id).await;
    assert_eq!(current.payment.invoice_id, "914000");
    assert_eq!(current.payment.status, PaymentStatus::Unpaid);

    // The gateway saw the server-computed 78.00, not anything client-supplied
    let calls = ctx.gateway.recorded_calls();
    assert_eq!(calls, vec![format!("create:{order_id}:78.00")]);
}

#[tokio::test]
async fn initiate_refuses_cash_orders() {
    let ctx = test_context().await;
    let order = place_cash_order(&ctx).await;

    let err = ctx.state.reconciler().initiate(&order.id_string()).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn failed_initiate_leaves_the_order_reattemptable() {
    let ctx = test_context().await;
    let order = place_gateway_order(&ctx).await;
    let order_id = order.id_string();

    ctx.gateway
        .push_create(Err(GatewayError::Request("connect timeout".into())));

    let err = ctx.state.reconciler().initiate(&order_id).await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));

    // No partial state: not paid, not failed, no invoice id
    let current = reload(&ctx, &order_id).await;
    assert_eq!(current.payment.status, PaymentStatus::Unpaid);
    assert_eq!(current.payment.invoice_id, "");

    // Second attempt succeeds
    ctx.gateway.push_create(Ok(InvoiceCreated {
        invoice_id: "914001".into(),
        payment_url: "https://pay.example/914001".into(),
    }));
    let initiated = ctx.state.reconciler().initiate(&order_id).await.unwrap();
    assert_eq!(initiated.invoice_id, "914001");
}

#[tokio::test]
async fn reconcile_marks_paid_and_is_idempotent() {
    let ctx = test_context().await;
    let order = place_gateway_order(&ctx).await;
    let order_id = order.id_string();
    let record_id = crate::db::repository::OrderRepository::parse_order_id(&order_id).unwrap();

    ctx.gateway.push_status(Ok(paid_report("914000")));
    let outcome = ctx.state.reconciler().reconcile(&order_id, "PAY-1").await.unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.status, PaymentStatus::Paid);
    assert_eq!(outcome.order.payment.status, PaymentStatus::Paid);
    assert_eq!(outcome.order.payment.payment_id, "PAY-1");
    assert_eq!(outcome.order.payment.invoice_id, "914000");

    // Same callback delivered again: verified again, applied never
    ctx.gateway.push_status(Ok(paid_report("914000")));
    let repeat = ctx.state.reconciler().reconcile(&order_id, "PAY-1").await.unwrap();
    assert!(!repeat.applied);
    assert_eq!(repeat.order.payment.status, PaymentStatus::Paid);

    // Payment reconciliation produces no notification projection
    let projection = ctx
        .state
        .notification_repo()
        .find_by_order(&record_id)
        .await
        .unwrap();
    assert!(projection.is_none());
}

#[tokio::test]
async fn unknown_gateway_status_fails_closed() {
    let ctx = test_context().await;
    let order = place_gateway_order(&ctx).await;
    let order_id = order.id_string();

    ctx.gateway.push_status(Ok(GatewayPaymentStatus {
        invoice_id: "914000".into(),
        raw_status: "S0me^G@rbage".into(),
    }));

    let outcome = ctx.state.reconciler().reconcile(&order_id, "PAY-1").await.unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.order.payment.status, PaymentStatus::Failed);
}

#[tokio::test]
async fn verification_falls_back_to_the_invoice_key_once() {
    let ctx = test_context().await;
    let order = place_gateway_order(&ctx).await;
    let order_id = order.id_string();

    // First lookup (by payment id) errors; the invoice-id retry succeeds
    ctx.gateway
        .push_status(Err(GatewayError::Rejected("unknown payment id".into())));
    ctx.gateway.push_status(Ok(paid_report("914000")));

    let outcome = ctx.state.reconciler().reconcile(&order_id, "914000").await.unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.order.payment.status, PaymentStatus::Paid);

    assert_eq!(
        ctx.gateway.recorded_calls(),
        vec![
            "status:PaymentId:914000".to_string(),
            "status:InvoiceId:914000".to_string(),
        ]
    );
}

#[tokio::test]
async fn inconclusive_verification_changes_nothing() {
    let ctx = test_context().await;
    let order = place_gateway_order(&ctx).await;
    let order_id = order.id_string();

    ctx.gateway
        .push_status(Err(GatewayError::Request("timeout".into())));
    ctx.gateway
        .push_status(Err(GatewayError::Request("timeout".into())));

    let err = ctx.state.reconciler().reconcile(&order_id, "PAY-1").await.unwrap_err();
    assert!(matches!(err, AppError::Upstream(_)));

    // Never guess: the payment stays unpaid
    let current = reload(&ctx, &order_id).await;
    assert_eq!(current.payment.status, PaymentStatus::Unpaid);
}

#[tokio::test]
async fn a_late_conflicting_callback_never_downgrades_paid() {
    let ctx = test_context().await;
    let order = place_gateway_order(&ctx).await;
    let order_id = order.id_string();

    ctx.gateway.push_status(Ok(paid_report("914000")));
    ctx.state.reconciler().reconcile(&order_id, "PAY-1").await.unwrap();

    ctx.gateway.push_status(Ok(GatewayPaymentStatus {
        invoice_id: "914000".into(),
        raw_status: "Failed".into(),
    }));
    let late = ctx.state.reconciler().reconcile(&order_id, "PAY-1").await.unwrap();
    assert!(!late.applied);
    assert_eq!(late.order.payment.status, PaymentStatus::Paid);
}

#[tokio::test]
async fn reconcile_validates_inputs() {
    let ctx = test_context().await;

    let err = ctx.state.reconciler().reconcile("nonsense", "PAY-1").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let order = place_gateway_order(&ctx).await;
    let err = ctx
        .state
        .reconciler()
        .reconcile(&order.id_string(), "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    ctx.gateway.push_status(Ok(paid_report("914000")));
    let err = ctx
        .state
        .reconciler()
        .reconcile("order:missing", "PAY-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn error_redirect_fails_only_unpaid_orders() {
    let ctx = test_context().await;
    let order = place_gateway_order(&ctx).await;
    let order_id = order.id_string();

    let failed = ctx.state.reconciler().mark_failed(&order_id).await.unwrap();
    assert_eq!(failed.payment.status, PaymentStatus::Failed);

    // Repeat: no-op, still failed
    let again = ctx.state.reconciler().mark_failed(&order_id).await.unwrap();
    assert_eq!(again.payment.status, PaymentStatus::Failed);

    // A paid order is left alone
    let paid = place_gateway_order(&ctx).await;
    ctx.gateway.push_status(Ok(paid_report("914001")));
    ctx.state
        .reconciler()
        .reconcile(&paid.id_string(), "PAY-2")
        .await
        .unwrap();
    let untouched = ctx.state.reconciler().mark_failed(&paid.id_string()).await.unwrap();
    assert_eq!(untouched.payment.status, PaymentStatus::Paid);
}

#[tokio::test]
async fn failed_payment_leaves_the_order_pending_not_cancelled() {
    let ctx = test_context().await;
    let order = place_gateway_order(&ctx).await;
    let order_id = order.id_string();

    ctx.gateway.push_status(Ok(GatewayPaymentStatus {
        invoice_id: "914000".into(),
        raw_status: "Expired".into(),
    }));
    ctx.state.reconciler().reconcile(&order_id, "PAY-1").await.unwrap();

    let current = reload(&ctx, &order_id).await;
    assert_eq!(current.payment.status, PaymentStatus::Failed);
    // Delivery state is untouched: no auto-cancel
    assert_eq!(current.delivery.status, DeliveryStatus::Pending);
}
