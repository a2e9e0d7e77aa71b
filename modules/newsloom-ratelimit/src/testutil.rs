//! Test utility for spinning up a real Redis instance via testcontainers.

use testcontainers::{
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage,
};

use newsloom_cache::Cache;

/// Spin up a Redis container and return the container handle + connected
/// cache. The container is dropped (and stopped) when `ContainerAsync` goes
/// out of scope, so callers must hold it alive for the duration of the test.
pub async fn redis_container() -> (ContainerAsync<GenericImage>, Cache) {
    let image = GenericImage::new("redis", "7-alpine")
        .with_exposed_port(ContainerPort::Tcp(6379))
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"));

    let container = image.start().await.expect("failed to start redis container");
    let host_port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("failed to get redis host port");

    let url = format!("redis://127.0.0.1:{host_port}");
    let cache = Cache::connect(&url).await.expect("failed to connect to redis");

    (container, cache)
}
