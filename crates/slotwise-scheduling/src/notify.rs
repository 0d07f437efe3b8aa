//! Outbound notification port and the adapters shipped with it.

use slotwise_core::error::SlotwiseResult;
use slotwise_core::models::notification::NotificationEvent;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Receives an event after the transition it describes is committed.
/// Errors are logged by the caller and never undo the transition.
pub trait NotificationPort: Send + Sync {
    fn send(&self, event: NotificationEvent) -> impl Future<Output = SlotwiseResult<()>> + Send;
}

/// Writes every event to the log.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl NotificationPort for TracingNotifier {
    async fn send(&self, event: NotificationEvent) -> SlotwiseResult<()> {
        info!(
            kind = event.kind(),
            tenant_id = %event.tenant_id(),
            customer = %event.customer().name,
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Fans events out to every live subscriber.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<NotificationEvent>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.tx.subscribe()
    }
}

impl NotificationPort for ChannelNotifier {
    async fn send(&self, event: NotificationEvent) -> SlotwiseResult<()> {
        let kind = event.kind();
        // No subscribers is not a failure.
        match self.tx.send(event) {
            Ok(receivers) => debug!(kind, receivers, "Notification broadcast"),
            Err(_) => debug!(kind, "Notification dropped, no subscribers"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use slotwise_core::TimeOfDay;
    use slotwise_core::models::booking::{Booking, BookingStatus};
    use slotwise_core::models::booking_request::CustomerContact;
    use uuid::Uuid;

    use super::*;

    fn cancelled() -> NotificationEvent {
        let customer = CustomerContact {
            name: "Jo".into(),
            email: None,
            phone: Some("555-0100".into()),
        };
        let tenant_id = Uuid::new_v4();
        NotificationEvent::BookingCancelled {
            tenant_id,
            customer: customer.clone(),
            booking: Booking {
                id: Uuid::new_v4(),
                request_id: None,
                tenant_id,
                service_id: Uuid::new_v4(),
                provider_id: Uuid::new_v4(),
                date: NaiveDate::from_ymd_opt(2024, 2, 13).unwrap(),
                start_time: TimeOfDay::hm(10, 0).unwrap(),
                end_time: TimeOfDay::hm(10, 30).unwrap(),
                duration_minutes: 30,
                customer,
                status: BookingStatus::Cancelled,
                cancelled_at: Some(Utc::now()),
                created_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn channel_delivers_to_subscribers() {
        let notifier = ChannelNotifier::new(8);
        let mut rx = notifier.subscribe();

        notifier.send(cancelled()).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind(), "booking.cancelled");
    }

    #[tokio::test]
    async fn channel_without_subscribers_is_ok() {
        let notifier = ChannelNotifier::new(8);
        assert!(notifier.send(cancelled()).await.is_ok());
        assert!(TracingNotifier.send(cancelled()).await.is_ok());
    }
}
