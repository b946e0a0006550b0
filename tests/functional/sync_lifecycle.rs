use crate::{TestCluster, TestResources};
use cpsync::{
    config::Config,
    server::SyncServer,
    stub::{StubState, sample_payload, stub_router},
};
use envconfig::Envconfig;
use serde_json::json;
use std::collections::HashMap;
use tokio::time::{Duration, sleep};

async fn serve_stub(state: StubState) -> Result<String, Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, stub_router(state)).await });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn test_sample_payload_is_synced_and_status_reported()
-> Result<(), Box<dyn std::error::Error>> {
    let cluster = TestCluster::new().await?;
    cluster.wait_for_ready().await?;
    let resources = TestResources::new(cluster.client.clone(), "test");
    resources.install_crontab_crd().await?;

    let stub = StubState::with_payload(sample_payload());
    let base = serve_stub(stub.clone()).await?;
    let config = Config::init_from_hashmap(&HashMap::from([
        ("CPSYNC_POLL_URL".to_string(), format!("{base}/api/crontabs")),
        ("CPSYNC_STATUS_URL".to_string(), format!("{base}/api/status")),
        ("CPSYNC_INTERVAL_SECS".to_string(), "1".to_string()),
        ("CPSYNC_HTTP_ADDR".to_string(), "127.0.0.1:0".to_string()),
    ]))?;

    let server = SyncServer::new_with_client(&config, cluster.client.clone())
        .await
        .map_err(|e| e.to_string())?;
    let health_url = format!("http://{}/watches", server.addr);
    let shutdown = server.shutdown_token();
    let server_handle = tokio::spawn(server.serve());

    let mut reported = Vec::new();
    for _ in 0..60 {
        reported = stub.received().await;
        if !reported.is_empty() {
            break;
        }
        sleep(Duration::from_secs(1)).await;
    }
    assert!(!reported.is_empty(), "no status reached the control plane");
    assert_eq!(json!(reported[0]), json!({"spec.cronSpec": "* * * * */10"}));

    assert!(resources.namespace_exists().await?);
    let crontab = resources.get_crontab("my-new-cron-object").await?.unwrap();
    assert_eq!(crontab.data["spec"]["image"], "my-awesome-cron-image");
    assert!(resources.get_crontab("my-old-cron-object").await?.is_none());
    assert!(resources.get_secret("mysecret").await?.is_some());

    let watches: serde_json::Value = reqwest::get(&health_url).await?.json().await?;
    assert_eq!(watches.as_array().map(Vec::len), Some(1));
    assert_eq!(watches[0]["identity"]["plural"], "crontabs");

    // a second upsert cycle must not create duplicates or lose the desired spec
    stub.set_payload(json!({
        "items": [{
            "apiVersion": "stable.example.com/v1",
            "kind": "CronTab",
            "metadata": {"name": "my-new-cron-object", "namespace": "test"},
            "spec": {"cronSpec": "* * * * */15", "image": "my-awesome-cron-image"}
        }]
    }))
    .await;
    let mut updated = false;
    for _ in 0..30 {
        let live = resources.get_crontab("my-new-cron-object").await?.unwrap();
        if live.data["spec"]["cronSpec"] == "* * * * */15" {
            updated = true;
            break;
        }
        sleep(Duration::from_secs(1)).await;
    }
    assert!(updated, "desired spec was not applied over the live object");

    shutdown.cancel();
    server_handle.await?.map_err(|e| e.to_string())?;
    resources.cleanup().await?;
    Ok(())
}
