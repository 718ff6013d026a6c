use std::time::Duration;

use identity_api::MongoSettings;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::{ContainerAsync, GenericImage};

pub const MONGO_PORT: u16 = 27017;

pub fn mongo_image() -> GenericImage {
    GenericImage::new("mongo", "7")
        .with_exposed_port(ContainerPort::Tcp(MONGO_PORT))
        .with_wait_for(WaitFor::message_on_stdout("Waiting for connections"))
}

pub async fn settings(container: &ContainerAsync<GenericImage>) -> MongoSettings {
    let host_port = container
        .get_host_port_ipv4(MONGO_PORT)
        .await
        .expect("mapped port for 27017");

    MongoSettings {
        host: format!("mongodb://127.0.0.1:{}/", host_port),
        server_selection_timeout: Duration::from_secs(10),
        ..MongoSettings::default()
    }
}
