//! Best-effort forwarding of burst events to an external webhook.

use crate::responder::BurstEvent;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Spawn a task that POSTs each burst event as JSON to `url`, with an
/// optional bearer token. Delivery is best-effort: failures are logged and
/// never retried.
pub fn spawn_forwarder(
    url: String,
    token: Option<String>,
    mut events: broadcast::Receiver<BurstEvent>,
) -> JoinHandle<()> {
    let client = reqwest::Client::new();
    tokio::spawn(async move {
        log::info!("forwarding burst events to {}", url);
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::debug!("event forwarder lagged {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let mut req = client.post(&url).json(&event);
            if let Some(ref t) = token {
                req = req.bearer_auth(t);
            }
            match req.send().await {
                Ok(res) if !res.status().is_success() => {
                    log::debug!("event forward returned {}", res.status());
                }
                Ok(_) => {}
                Err(e) => {
                    log::debug!("event forward failed: {}", e);
                }
            }
        }
        log::debug!("event forwarder stopped");
    })
}
