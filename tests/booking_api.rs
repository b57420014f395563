mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{app, create_listing, days_from_today, register_user, rent_listing, send};

async fn booking_request(app: &axum::Router, cookie: &str, body: Value) -> common::TestResponse {
    send(app, Method::POST, "/api/booking/create", Some(cookie), Some(body)).await
}

fn regular_booking(listing_id: &str, days: i64, slot: &str) -> Value {
    json!({
        "propertyId": listing_id,
        "date": days_from_today(days),
        "timeSlot": slot,
        "totalPrice": 1000,
    })
}

#[tokio::test]
async fn seller_approves_then_buyer_cancels() {
    let app = app();
    let (seller, seller_id) = register_user(&app, "sellerone").await;
    let (buyer, buyer_id) = register_user(&app, "buyerone").await;

    let listing = create_listing(&app, &seller, rent_listing()).await;
    let listing_id = listing.body["listing"]["_id"].as_str().unwrap().to_string();

    let res = booking_request(&app, &buyer, regular_booking(&listing_id, 1, "10:00 AM")).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let booking = &res.body["booking"];
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["propertyId"], listing_id.as_str());
    assert_eq!(booking["sellerId"], seller_id.as_str());
    assert_eq!(booking["buyerId"], buyer_id.as_str());
    assert_eq!(booking["guests"], 1);
    assert_eq!(booking["message"], "");
    let booking_id = booking["_id"].as_str().unwrap().to_string();

    let update_uri = format!("/api/booking/update/{}", booking_id);
    let body = json!({ "status": "approved" });
    let res = send(&app, Method::PUT, &update_uri, Some(&buyer), Some(body)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let body = json!({ "status": "pending" });
    let res = send(&app, Method::PUT, &update_uri, Some(&seller), Some(body)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(
        &app,
        Method::PUT,
        &update_uri,
        Some(&seller),
        Some(json!({ "status": "approved", "sellerNote": "See you then" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["booking"]["status"], "approved");
    assert_eq!(res.body["booking"]["sellerNote"], "See you then");

    let body = json!({ "status": "rejected" });
    let res = send(&app, Method::PUT, &update_uri, Some(&seller), Some(body)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let cancel_uri = format!("/api/booking/cancel/{}", booking_id);
    let res = send(&app, Method::POST, &cancel_uri, Some(&seller), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = send(&app, Method::POST, &cancel_uri, Some(&buyer), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["booking"]["status"], "cancelled");

    let res = send(&app, Method::POST, &cancel_uri, Some(&buyer), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_rejects_invalid_requests() {
    let app = app();
    let (seller, _) = register_user(&app, "sellerone").await;
    let (buyer, _) = register_user(&app, "buyerone").await;
    let listing = create_listing(&app, &seller, rent_listing()).await;
    let listing_id = listing.body["listing"]["_id"].as_str().unwrap().to_string();

    let res = booking_request(&app, &buyer, json!({ "propertyId": listing_id })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = booking_request(
        &app,
        &buyer,
        regular_booking("7d8f0e8a-2f7b-4a39-9d0c-3b8e3f1f7a11", 1, "10:00 AM"),
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    // malformed fields are reported before the listing is looked up
    let mut bad_date = regular_booking("7d8f0e8a-2f7b-4a39-9d0c-3b8e3f1f7a11", 1, "10:00 AM");
    bad_date["date"] = json!("next friday");
    let res = booking_request(&app, &buyer, bad_date).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Date must be YYYY-MM-DD");

    let mut bad_price = regular_booking(&listing_id, 1, "10:00 AM");
    bad_price["totalPrice"] = json!(-10);
    let res = booking_request(&app, &buyer, bad_price).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Total price must be a non-negative number");

    let res = booking_request(&app, &seller, regular_booking(&listing_id, 1, "10:00 AM")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "You cannot book your own property");

    let res = booking_request(&app, &buyer, regular_booking(&listing_id, -1, "10:00 AM")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Booking date cannot be in the past");

    let mut no_slot = regular_booking(&listing_id, 1, "");
    no_slot.as_object_mut().unwrap().remove("timeSlot");
    let res = booking_request(&app, &buyer, no_slot).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Time slot is required");

    let res = send(
        &app,
        Method::POST,
        "/api/booking/create",
        None,
        Some(regular_booking(&listing_id, 1, "10:00 AM")),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn second_request_for_an_active_slot_is_rejected() {
    let app = app();
    let (seller, _) = register_user(&app, "sellerone").await;
    let (buyer, _) = register_user(&app, "buyerone").await;
    let (other, _) = register_user(&app, "buyertwo").await;
    let listing = create_listing(&app, &seller, rent_listing()).await;
    let listing_id = listing.body["listing"]["_id"].as_str().unwrap().to_string();

    let first = booking_request(&app, &buyer, regular_booking(&listing_id, 3, "10:00 AM")).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let res = booking_request(&app, &other, regular_booking(&listing_id, 3, "10:00 AM")).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "This slot is already booked");

    // a cancelled booking frees the slot
    let booking_id = first.body["booking"]["_id"].as_str().unwrap();
    let res = send(
        &app,
        Method::POST,
        &format!("/api/booking/cancel/{}", booking_id),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = booking_request(&app, &other, regular_booking(&listing_id, 3, "10:00 AM")).await;
    assert_eq!(res.status, StatusCode::CREATED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_for_one_slot_yield_one_booking() {
    let app = app();
    let (seller, _) = register_user(&app, "sellerone").await;
    let listing = create_listing(&app, &seller, rent_listing()).await;
    let listing_id = listing.body["listing"]["_id"].as_str().unwrap().to_string();

    let mut buyers = Vec::new();
    for i in 0..8 {
        let (cookie, _) = register_user(&app, &format!("buyer{:04}", i)).await;
        buyers.push(cookie);
    }

    let mut handles = Vec::new();
    for cookie in buyers {
        let app = app.clone();
        let body = regular_booking(&listing_id, 5, "4:00 PM");
        handles.push(tokio::spawn(async move {
            booking_request(&app, &cookie, body).await.status
        }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::BAD_REQUEST => rejected += 1,
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(rejected, 7);
}

#[tokio::test]
async fn joined_views_are_participant_only() {
    let app = app();
    let (seller, _) = register_user(&app, "sellerone").await;
    let (buyer, _) = register_user(&app, "buyerone").await;
    let (stranger, _) = register_user(&app, "strangerone").await;
    let listing = create_listing(&app, &seller, rent_listing()).await;
    let listing_id = listing.body["listing"]["_id"].as_str().unwrap().to_string();

    let res = booking_request(&app, &buyer, regular_booking(&listing_id, 1, "10:00 AM")).await;
    let booking_id = res.body["booking"]["_id"].as_str().unwrap().to_string();
    let uri = format!("/api/booking/get/{}", booking_id);

    let res = send(&app, Method::GET, &uri, Some(&stranger), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = send(&app, Method::GET, &uri, Some(&seller), None).await;
    assert_eq!(res.status, StatusCode::OK);
    let view = &res.body["booking"];
    assert_eq!(view["property"]["name"], "Marina Flat");
    assert_eq!(view["buyer"]["username"], "buyerone");
    assert_eq!(view["seller"]["username"], "sellerone");
    assert!(view["buyer"].get("password").is_none());

    let res = send(&app, Method::GET, "/api/booking/get", Some(&buyer), None).await;
    assert_eq!(res.body["bookings"].as_array().unwrap().len(), 1);

    let res = send(&app, Method::GET, "/api/booking/get?type=seller", Some(&buyer), None).await;
    assert_eq!(res.body["bookings"].as_array().unwrap().len(), 0);

    let res = send(&app, Method::GET, "/api/booking/get?type=seller", Some(&seller), None).await;
    assert_eq!(res.body["bookings"].as_array().unwrap().len(), 1);

    let res = send(&app, Method::GET, "/api/booking/get?type=owner", Some(&seller), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    // deleting the listing leaves a placeholder in the joined view
    send(
        &app,
        Method::DELETE,
        &format!("/api/listing/delete/{}", listing_id),
        Some(&seller),
        None,
    )
    .await;
    let res = send(&app, Method::GET, &uri, Some(&buyer), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["booking"]["property"]["name"], "Property Deleted");
}

#[tokio::test]
async fn night_stay_bookings_need_no_time_slot() {
    let app = app();
    let (host, _) = register_user(&app, "hostowner").await;
    let (guest, _) = register_user(&app, "guestone").await;

    let mut body = rent_listing();
    body["type"] = json!("night-stay");
    body["maxGuests"] = json!(4);
    body["bbqRates"] = json!([{ "meat": "mutton", "available": true, "pricePerKg": 500 }]);
    let listing = create_listing(&app, &host, body).await;
    let listing_id = listing.body["listing"]["_id"].as_str().unwrap().to_string();

    let res = booking_request(
        &app,
        &guest,
        json!({
            "propertyId": listing_id,
            "date": days_from_today(2),
            "totalPrice": 2500,
            "guests": "5",
        }),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = booking_request(
        &app,
        &guest,
        json!({
            "propertyId": listing_id,
            "date": days_from_today(2),
            "totalPrice": 2500,
            "guests": 3,
            "bbqEnabled": true,
            "bbqKg": { "mutton": 2 },
        }),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    let booking = &res.body["booking"];
    assert!(booking["timeSlot"].is_null());
    assert_eq!(booking["bbqEnabled"], true);
    assert_eq!(booking["bbqKg"]["mutton"], 2.0);
    assert_eq!(booking["guests"], 3);

    let res = booking_request(
        &app,
        &guest,
        json!({
            "propertyId": listing_id,
            "date": days_from_today(2),
            "totalPrice": 2500,
        }),
    )
    .await;
    assert_eq!(res.body["message"], "This slot is already booked");
}
