//! Outbound alert delivery.
//!
//! The registry hands every emitted alert to an `AlertSink`. Publishing must
//! never block ingestion, so the channel sink drops alerts when its consumer
//! falls behind.

use crate::core::Alert;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Receives alerts as they are emitted.
pub trait AlertSink: Send + Sync {
    fn publish(&self, alert: &Alert);
}

/// Sink backed by a bounded crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    sender: Sender<Alert>,
}

impl ChannelAlertSink {
    /// Wrap an existing sender.
    pub fn new(sender: Sender<Alert>) -> Self {
        Self { sender }
    }
}

impl AlertSink for ChannelAlertSink {
    fn publish(&self, alert: &Alert) {
        match self.sender.try_send(alert.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(
                    student_id = %dropped.student_id,
                    "Alert channel full, dropping alert"
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("Alert channel disconnected");
            }
        }
    }
}

/// Create a bounded alert channel and its sink.
pub fn alert_channel(capacity: usize) -> (ChannelAlertSink, Receiver<Alert>) {
    let (sender, receiver) = bounded(capacity.max(1));
    (ChannelAlertSink::new(sender), receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AlertKind, AlertPriority};
    use chrono::Utc;
    use uuid::Uuid;

    fn alert(student_id: &str) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            kind: AlertKind::Critical,
            priority: AlertPriority::High,
            session_id: "S1".to_string(),
            student_id: student_id.to_string(),
            message: "low".to_string(),
            action: "act".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_channel_delivers() {
        let (sink, receiver) = alert_channel(4);
        sink.publish(&alert("a"));
        assert_eq!(receiver.try_recv().unwrap().student_id, "a");
    }

    #[test]
    fn test_full_channel_drops_without_blocking() {
        let (sink, receiver) = alert_channel(1);
        sink.publish(&alert("a"));
        sink.publish(&alert("b"));

        assert_eq!(receiver.len(), 1);
        assert_eq!(receiver.try_recv().unwrap().student_id, "a");
    }

    #[test]
    fn test_disconnected_channel_is_ignored() {
        let (sink, receiver) = alert_channel(1);
        drop(receiver);
        sink.publish(&alert("a"));
    }
}
