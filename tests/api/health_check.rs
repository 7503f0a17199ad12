use crate::helpers::TestApp;

#[tokio::test]
async fn health_check_works_on_both_servers() {
    let test_app = TestApp::spawn_app().await;

    for address in [&test_app.json_address, &test_app.rpc_address] {
        let response = test_app
            .api_client
            .get(format!("{}/health_check", address))
            .send()
            .await
            .expect("Failed to execute request.");

        assert!(response.status().is_success());
        assert_eq!(Some(0), response.content_length())
    }
}
