use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Queued booking emails. Delivery is fire-and-forget: a failed or dropped
/// notification never affects the booking it describes, so enqueue happens
/// only after the database transaction has committed.
#[derive(Clone)]
pub struct NotificationService {
    from_email: String,
    queue: Arc<RwLock<Vec<PendingNotification>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingNotification {
    pub id: Uuid,
    pub recipient: String,
    pub kind: NotificationKind,
    pub booking_reference: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationKind {
    BookingCreated,
    BookingConfirmed,
    BookingCancelled,
    BookingRefunded,
    PaymentRecorded,
}

impl NotificationKind {
    fn subject(&self) -> &'static str {
        match self {
            NotificationKind::BookingCreated => "Your booking request has been received",
            NotificationKind::BookingConfirmed => "Your booking is confirmed",
            NotificationKind::BookingCancelled => "Your booking has been cancelled",
            NotificationKind::BookingRefunded => "Your booking has been refunded",
            NotificationKind::PaymentRecorded => "We received your payment",
        }
    }
}

impl NotificationService {
    pub fn new(from_email: String) -> Self {
        Self {
            from_email,
            queue: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Spawn the queue drain loop.
    pub fn start_background_tasks(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(30));
            loop {
                interval.tick().await;
                if let Err(e) = service.process_queue().await {
                    error!("Failed to process notification queue: {}", e);
                }
            }
        });
        info!("Notification service background task started");
    }

    pub async fn enqueue(&self, recipient: &str, kind: NotificationKind, booking_reference: &str) {
        let notification = PendingNotification {
            id: Uuid::new_v4(),
            recipient: recipient.to_string(),
            kind,
            booking_reference: booking_reference.to_string(),
            created_at: Utc::now(),
        };
        debug!(
            booking_reference,
            kind = ?notification.kind,
            "queued notification"
        );
        self.queue.write().await.push(notification);
    }

    pub async fn pending_count(&self) -> usize {
        self.queue.read().await.len()
    }

    async fn process_queue(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let drained: Vec<PendingNotification> = {
            let mut queue = self.queue.write().await;
            queue.drain(..).collect()
        };

        for notification in drained {
            self.deliver(&notification).await;
        }

        Ok(())
    }

    // Stands in for an email provider integration; deliveries are logged.
    async fn deliver(&self, notification: &PendingNotification) {
        info!(
            from = %self.from_email,
            to = %notification.recipient,
            subject = notification.kind.subject(),
            booking_reference = %notification.booking_reference,
            "delivering booking notification"
        );
    }
}
