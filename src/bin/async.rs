use std::time::Duration;

use wemolinker::tokio::discovery;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let duration = Duration::from_secs(2);
    match discovery::with_timeout(duration).await {
        Ok(bridges) => bridges.into_iter().for_each(|(addr, description)| {
            println!("{}\t{}\t{}", addr, description.friendly_name, description.udn);
        }),
        Err(err) => eprintln!("{}", err),
    }
}
