//! Simulated user.
//!
//! A client owns one inbox. On start it registers its username with the
//! engine through that inbox's delivery handle, then logs every response
//! that arrives until the inbox closes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use agora_engine::{DeliveryHandle, EngineHandle, Request, Response};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A running simulated user.
#[derive(Debug)]
pub struct Client {
    username: String,
    delivery: DeliveryHandle,
    received: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl Client {
    /// Spawn a client task that registers `username` and logs responses.
    pub fn spawn(engine: EngineHandle, username: impl Into<String>) -> Self {
        let username = username.into();
        let (delivery, inbox) = DeliveryHandle::channel(username.clone());
        let received = Arc::new(AtomicUsize::new(0));

        let task = tokio::spawn(run_client(
            engine,
            delivery.clone(),
            inbox,
            Arc::clone(&received),
        ));

        Self {
            username,
            delivery,
            received,
            task,
        }
    }

    /// The client's username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Where responses for requests made on this client's behalf should go.
    pub const fn delivery(&self) -> &DeliveryHandle {
        &self.delivery
    }

    /// Number of responses received so far.
    pub fn received(&self) -> usize {
        self.received.load(Ordering::Relaxed)
    }

    /// Stop the client task.
    pub fn stop(self) {
        self.task.abort();
    }
}

async fn run_client(
    engine: EngineHandle,
    delivery: DeliveryHandle,
    mut inbox: UnboundedReceiver<Response>,
    received: Arc<AtomicUsize>,
) {
    let username = delivery.identity().to_owned();
    info!(client = %username, "Client registered, welcome to reddit");

    let register = Request::Register {
        username: username.clone(),
    };
    if let Err(e) = engine.send(register, &delivery).await {
        warn!(client = %username, error = %e, "Client could not register");
        return;
    }
    // Only the Client value keeps the inbox open from here on.
    drop(delivery);

    while let Some(response) = inbox.recv().await {
        received.fetch_add(1, Ordering::Relaxed);
        info!(client = %username, response = %response, "Client received response");
    }
}
