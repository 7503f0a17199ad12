use once_cell::sync::Lazy;
use reqwest::Response;
use serde_json::{json, Value};
use uuid::Uuid;

use mailing_list::{
    config::{get_configuration, Settings},
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};

// The subscriber can only be installed once per test binary. Set TEST_LOG to see the logs.
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = String::from("info");
    let subscriber_name = String::from("test");

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub struct TestApp {
    pub config: Settings,
    pub json_address: String,
    pub rpc_address: String,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        Lazy::force(&TRACING);

        let mut config = get_configuration().expect("Missing configuration file.");
        let db_path = std::env::temp_dir().join(format!(
            "mailing_list_{}.sqlite",
            Uuid::new_v4().to_string().replace('-', "_")
        ));

        // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
        // take into account: when port is 0, the OS will search for the first available port
        config.set_json_port(0);
        config.set_rpc_port(0);
        config.set_db_path(db_path.display().to_string());

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let json_address = format!("http://127.0.0.1:{}", application.get_json_port());
        let rpc_address = format!("http://127.0.0.1:{}", application.get_rpc_port());

        tokio::spawn(application.run_until_stopped());

        TestApp {
            config,
            json_address,
            rpc_address,
            api_client: reqwest::Client::new(),
        }
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.api_client
            .post(format!("{}{}", self.json_address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_json(&self, path: &str, body: &Value) -> Response {
        self.api_client
            .get(format!("{}{}", self.json_address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn create_subscriber(&self, email: &str) -> Response {
        self.post_json("/email/create", &json!({ "email": email }))
            .await
    }

    pub async fn get_subscriber(&self, email: &str) -> Response {
        self.get_json("/email/get", &json!({ "email": email })).await
    }

    pub async fn update_subscriber(&self, email: &str, confirmed_at: i64, opt_out: bool) -> Response {
        self.post_json(
            "/email/update",
            &json!({ "email": email, "confirmed_at": confirmed_at, "opt_out": opt_out }),
        )
        .await
    }

    pub async fn delete_subscriber(&self, email: &str) -> Response {
        self.post_json("/email/delete", &json!({ "email": email }))
            .await
    }

    pub async fn list_subscribers(&self, page: i64, count: i64) -> Response {
        self.get_json("/email/get_batch", &json!({ "page": page, "count": count }))
            .await
    }

    /// Sends a raw body to the RPC endpoint.
    pub async fn post_rpc(&self, body: String) -> Response {
        self.api_client
            .post(format!("{}/rpc", self.rpc_address))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Calls one procedure and returns the whole JSON-RPC response object.
    pub async fn call_rpc(&self, method: &str, params: Value) -> Value {
        let request = json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": 1 });
        let response = self.post_rpc(request.to_string()).await;

        assert_eq!(200, response.status().as_u16());

        response
            .json()
            .await
            .expect("RPC response is not valid JSON.")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let db_path = self.config.get_db_path();

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", db_path, suffix));
        }
    }
}
