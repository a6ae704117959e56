use super::*;

#[tokio::test]
async fn claim_assigns_exactly_this_driver() {
    let ctx = test_context().await;
    let order = place_cash_order(&ctx).await;
    let order_id = order.id_string();

    let claimed = ctx
        .state
        .delivery_flow()
        .claim(&order_id, &driver(1))
        .await
        .unwrap();

    assert_eq!(claimed.delivery.status, DeliveryStatus::Claimed);
    assert_eq!(claimed.delivery.assigned_driver_id, Some(driver(1)));
    assert!(claimed.delivery.claimed_at.is_some());
    assert!(claimed.delivery.picked_up_at.is_none());
}

#[tokio::test]
async fn second_claim_gets_conflict() {
    let ctx = test_context().await;
    let order = place_cash_order(&ctx).await;
    let order_id = order.id_string();
    let flow = ctx.state.delivery_flow();

    let first = flow.claim(&order_id, &driver(1)).await;
    let second = flow.claim(&order_id, &driver(2)).await;

    assert!(first.is_ok());
    assert!(matches!(second, Err(AppError::Conflict(_))));

    // Loser must not have overwritten the assignment
    let current = reload(&ctx, &order_id).await;
    assert_eq!(current.delivery.assigned_driver_id, Some(driver(1)));
}

#[tokio::test]
async fn concurrent_claims_have_exactly_one_winner() {
    let ctx = test_context().await;
    let order = place_cash_order(&ctx).await;
    let order_id = order.id_string();

    let flow_a = ctx.state.delivery_flow();
    let flow_b = ctx.state.delivery_flow();
    let driver_a = driver(1);
    let driver_b = driver(2);
    let (a, b) = tokio::join!(
        flow_a.claim(&order_id, &driver_a),
        flow_b.claim(&order_id, &driver_b),
    );

    let winners = [a.is_ok(), b.is_ok()].iter().filter(|w| **w).count();
    assert_eq!(winners, 1, "exactly one concurrent claim must win");

    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn claiming_a_missing_order_is_not_found() {
    let ctx = test_context().await;
    let err = ctx
        .state
        .delivery_flow()
        .claim("order:doesnotexist", &driver(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn claiming_with_a_malformed_id_is_a_validation_error() {
    let ctx = test_context().await;
    let err = ctx
        .state
        .delivery_flow()
        .claim("definitely not an id", &driver(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Wrong table counts as malformed too
    let err = ctx
        .state
        .delivery_flow()
        .claim("user:driver1", &driver(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn claiming_a_cancelled_order_is_a_conflict() {
    let ctx = test_context().await;
    let order = place_cash_order(&ctx).await;
    let order_id = order.id_string();

    ctx.state.delivery_flow().cancel(&order_id).await.unwrap();

    let err = ctx
        .state
        .delivery_flow()
        .claim(&order_id, &driver(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn claim_updates_the_notification_projection() {
    let ctx = test_context().await;
    let order = place_cash_order(&ctx).await;
    let order_id = order.id_string();

    ctx.state
        .delivery_flow()
        .claim(&order_id, &driver(1))
        .await
        .unwrap();

    let record_id = crate::db::repository::OrderRepository::parse_order_id(&order_id).unwrap();
    let projection = ctx
        .state
        .notification_repo()
        .find_by_order(&record_id)
        .await
        .unwrap()
        .expect("projection missing");
    assert_eq!(projection.status, NotificationStatus::Claimed);
    assert_eq!(projection.driver_id, Some(driver(1)));
}

#[tokio::test]
async fn available_listing_hides_unpaid_gateway_orders() {
    let ctx = test_context().await;

    let cash = place_cash_order(&ctx).await;
    let gateway_unpaid = place_gateway_order(&ctx).await;

    let available = ctx.state.delivery_flow().list_available().await.unwrap();
    let ids: Vec<String> = available.iter().map(|o| o.id_string()).collect();

    assert!(ids.contains(&cash.id_string()), "cash orders are claimable immediately");
    assert!(
        !ids.contains(&gateway_unpaid.id_string()),
        "unpaid gateway orders stay invisible"
    );
}

#[tokio::test]
async fn available_listing_shows_paid_gateway_orders_newest_first() {
    let ctx = test_context().await;

    let older = place_cash_order(&ctx).await;
    let paid = place_gateway_order(&ctx).await;

    // Reconcile the gateway order to paid
    ctx.gateway.push_status(Ok(GatewayPaymentStatus {
        invoice_id: "914000".into(),
        raw_status: "Paid".into(),
    }));
    ctx.state
        .reconciler()
        .reconcile(&paid.id_string(), "PAY-1")
        .await
        .unwrap();

    let available = ctx.state.delivery_flow().list_available().await.unwrap();
    let ids: Vec<String> = available.iter().map(|o| o.id_string()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&older.id_string()));
    assert!(ids.contains(&paid.id_string()));
}

#[tokio::test]
async fn claimed_orders_leave_the_available_listing() {
    let ctx = test_context().await;
    let order = place_cash_order(&ctx).await;
    let order_id = order.id_string();

    ctx.state
        .delivery_flow()
        .claim(&order_id, &driver(1))
        .await
        .unwrap();

    let available = ctx.state.delivery_flow().list_available().await.unwrap();
    assert!(available.iter().all(|o| o.id_string() != order_id));
}

#[tokio::test]
async fn driver_listing_covers_claimed_picked_and_delivered() {
    let ctx = test_context().await;
    let flow = ctx.state.delivery_flow();

    let claimed = place_cash_order(&ctx).await;
    flow.claim(&claimed.id_string(), &driver(1)).await.unwrap();

    let delivered = place_cash_order(&ctx).await;
    deliver_order(&ctx, &delivered.id_string(), &driver(1)).await;

    let other_drivers = place_cash_order(&ctx).await;
    flow.claim(&other_drivers.id_string(), &driver(2)).await.unwrap();

    let mine = flow.list_for_driver(&driver(1)).await.unwrap();
    let ids: Vec<String> = mine.iter().map(|o| o.id_string()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&claimed.id_string()));
    assert!(ids.contains(&delivered.id_string()));
    assert!(!ids.contains(&other_drivers.id_string()));
}

#[tokio::test]
async fn admin_assignment_shares_the_claim_cas() {
    let ctx = test_context().await;
    let flow = ctx.state.delivery_flow();

    let order = place_cash_order(&ctx).await;
    let order_id = order.id_string();

    // Driver wins the race; the admin's later assignment must conflict
    flow.claim(&order_id, &driver(1)).await.unwrap();
    let err = flow.assign(&order_id, "user:driver9").await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // On a fresh order the assignment goes through
    let fresh = place_cash_order(&ctx).await;
    let assigned = flow.assign(&fresh.id_string(), "user:driver9").await.unwrap();
    assert_eq!(assigned.delivery.status, DeliveryStatus::Claimed);

    // Bad driver ids never reach the store
    let another = place_cash_order(&ctx).await;
    let err = flow.assign(&another.id_string(), "garbage").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
