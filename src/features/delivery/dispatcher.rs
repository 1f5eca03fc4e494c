//! Delivery dispatcher.
//!
//! A destination identifier is an opaque string; whether it names a person
//! or a group is the transport's business and only resolved at send time.
//! Each destination gets the direct mode first and the broadcast mode as a
//! fallback against the same identifier. Failures are contained per
//! destination and the dispatcher itself never errors.

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use std::fmt;
use std::sync::Arc;

/// The two send primitives the scheduler needs from a message backend.
///
/// Neither mode is assumed more likely to succeed; the dispatcher simply
/// tries them in order.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    /// Send as a direct/private message.
    async fn send_direct(&self, destination: &str, message: &str) -> Result<()>;

    /// Send as a broadcast/group message to the same identifier.
    async fn send_broadcast(&self, destination: &str, message: &str) -> Result<()>;
}

/// Both delivery modes failed for one destination.
#[derive(Debug)]
pub struct DeliveryFailure {
    pub destination: String,
    pub direct_error: String,
    pub broadcast_error: String,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: direct: {}; broadcast: {}",
            self.destination, self.direct_error, self.broadcast_error
        )
    }
}

/// Per-fire outcome summary across all destinations.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Destinations reached by either mode.
    pub delivered: usize,

    /// Destinations where both modes failed.
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }
}

/// Fans one message out to a list of destinations through a transport.
pub struct Dispatcher {
    transport: Arc<dyn DeliveryTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn DeliveryTransport>) -> Self {
        Dispatcher { transport }
    }

    /// Deliver `message` to every destination in order. A destination that
    /// fails both modes is logged with both causes and does not stop the
    /// remaining destinations from being attempted.
    pub async fn deliver(&self, destinations: &[String], message: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for destination in destinations {
            match self.transport.send_direct(destination, message).await {
                Ok(()) => {
                    debug!("delivered to {destination} (direct)");
                    report.delivered += 1;
                }
                Err(direct_err) => {
                    match self.transport.send_broadcast(destination, message).await {
                        Ok(()) => {
                            debug!("delivered to {destination} (broadcast fallback)");
                            report.delivered += 1;
                        }
                        Err(broadcast_err) => {
                            let failure = DeliveryFailure {
                                destination: destination.clone(),
                                direct_error: direct_err.to_string(),
                                broadcast_error: broadcast_err.to_string(),
                            };
                            warn!("delivery failed in both modes: {failure}");
                            report.failures.push(failure);
                        }
                    }
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Transport that records every call and fails configurable subsets.
    #[derive(Default)]
    struct ScriptedTransport {
        direct_fails: HashSet<String>,
        broadcast_fails: HashSet<String>,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedTransport {
        fn failing_direct(destinations: &[&str]) -> Self {
            ScriptedTransport {
                direct_fails: destinations.iter().map(|d| d.to_string()).collect(),
                ..Default::default()
            }
        }

        fn sent_log(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeliveryTransport for ScriptedTransport {
        async fn send_direct(&self, destination: &str, message: &str) -> Result<()> {
            if self.direct_fails.contains(destination) {
                return Err(anyhow!("direct refused"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((format!("direct:{destination}"), message.to_string()));
            Ok(())
        }

        async fn send_broadcast(&self, destination: &str, message: &str) -> Result<()> {
            if self.broadcast_fails.contains(destination) {
                return Err(anyhow!("broadcast refused"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((format!("broadcast:{destination}"), message.to_string()));
            Ok(())
        }
    }

    fn dests(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_direct_success_skips_broadcast() {
        let transport = Arc::new(ScriptedTransport::default());
        let dispatcher = Dispatcher::new(transport.clone());

        let report = dispatcher.deliver(&dests(&["user:1"]), "hi").await;

        assert_eq!(report.delivered, 1);
        assert!(report.failures.is_empty());
        assert_eq!(transport.sent_log(), vec![("direct:user:1".to_string(), "hi".to_string())]);
    }

    #[tokio::test]
    async fn test_broadcast_fallback_counts_as_delivered() {
        let transport = Arc::new(ScriptedTransport::failing_direct(&["group:7"]));
        let dispatcher = Dispatcher::new(transport.clone());

        let report = dispatcher.deliver(&dests(&["group:7"]), "hi").await;

        assert_eq!(report.delivered, 1);
        assert!(report.failures.is_empty());
        assert_eq!(
            transport.sent_log(),
            vec![("broadcast:group:7".to_string(), "hi".to_string())]
        );
    }

    #[tokio::test]
    async fn test_both_modes_failing_is_isolated_per_destination() {
        let mut transport = ScriptedTransport::failing_direct(&["dead:1"]);
        transport.broadcast_fails.insert("dead:1".to_string());
        let transport = Arc::new(transport);
        let dispatcher = Dispatcher::new(transport.clone());

        let report = dispatcher
            .deliver(&dests(&["user:1", "dead:1", "user:2"]), "hi")
            .await;

        assert_eq!(report.delivered, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].destination, "dead:1");
        assert_eq!(report.failures[0].direct_error, "direct refused");
        assert_eq!(report.failures[0].broadcast_error, "broadcast refused");
        assert_eq!(report.attempted(), 3);

        // the failing destination did not stop the later one
        let log = transport.sent_log();
        assert!(log.iter().any(|(mode, _)| mode == "direct:user:2"));
    }

    #[tokio::test]
    async fn test_empty_destination_list_is_a_noop() {
        let transport = Arc::new(ScriptedTransport::default());
        let dispatcher = Dispatcher::new(transport.clone());

        let report = dispatcher.deliver(&[], "hi").await;

        assert_eq!(report.attempted(), 0);
        assert!(transport.sent_log().is_empty());
    }
}
