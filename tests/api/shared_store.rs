use mailing_list::domain::Subscriber;
use mailing_list::rpc::{CREATE_EMAIL, GET_EMAIL};
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn subscriber_created_over_json_is_visible_over_rpc() {
    let test_app = TestApp::spawn_app().await;

    test_app.create_subscriber("a@x.com").await;
    let response = test_app
        .call_rpc(GET_EMAIL, json!({ "email": "a@x.com" }))
        .await;

    let subscriber: Subscriber = serde_json::from_value(response["result"].clone()).unwrap();
    assert_eq!(subscriber.email, "a@x.com");
}

#[tokio::test]
async fn duplicate_across_front_ends_is_a_conflict_on_both() {
    let test_app = TestApp::spawn_app().await;

    test_app
        .call_rpc(CREATE_EMAIL, json!({ "email": "a@x.com" }))
        .await;
    let response = test_app.create_subscriber("a@x.com").await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn concurrent_creates_from_both_front_ends_are_all_stored() {
    let test_app = TestApp::spawn_app().await;
    let total = 20;
    let mut handles = Vec::new();

    for i in 0..total {
        let client = test_app.api_client.clone();
        let json_address = test_app.json_address.clone();
        let rpc_address = test_app.rpc_address.clone();

        handles.push(tokio::spawn(async move {
            let email = format!("user{}@x.com", i);
            let response = if i % 2 == 0 {
                client
                    .post(format!("{}/email/create", json_address))
                    .json(&json!({ "email": email }))
                    .send()
                    .await
            } else {
                client
                    .post(format!("{}/rpc", rpc_address))
                    .json(&json!({
                        "jsonrpc": "2.0",
                        "method": CREATE_EMAIL,
                        "params": { "email": email },
                        "id": i
                    }))
                    .send()
                    .await
            };

            response.expect("Failed to execute request.").status()
        }));
    }

    for handle in handles {
        let status = handle.await.expect("Request task panicked.");
        assert!(status.is_success());
    }

    let listed: Vec<Subscriber> = test_app
        .list_subscribers(1, 100)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), total);
    assert!(listed.windows(2).all(|pair| pair[0].id < pair[1].id));
}
