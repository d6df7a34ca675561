//! Change notification fan-out.
//!
//! The poll engine publishes at most one message per cycle; an arbitrary
//! number of consumers (scoring displays, safety interlocks) each hold their
//! own channel receiver and drain it at their own pace. Subscribing and
//! unsubscribing are safe at any time from any thread: the subscriber list
//! is locked only long enough to snapshot or prune it, never while a
//! consumer is doing work.
//!
//! Unsubscription is dropping the receiver; the dead sender is pruned on the
//! next publish.

use std::sync::Mutex;

/// Fan-out publisher decoupling "something changed" from "who cares".
///
/// Payloads are cloned per subscriber, so consumers always own their copy.
pub struct ChangeNotifier<T: Clone> {
    subscribers: Mutex<Vec<flume::Sender<T>>>,
}

impl<T: Clone> ChangeNotifier<T> {
    /// Creates a notifier with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Registers a new subscriber and returns its receiving end.
    ///
    /// The channel is unbounded: publishing never blocks on a slow consumer.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.lock().expect("subscriber list poisoned").push(tx);
        rx
    }

    /// Publishes one payload to every live subscriber, pruning any whose
    /// receiver has been dropped.
    pub fn publish(&self, payload: T) {
        let mut subscribers = self.subscribers.lock().expect("subscriber list poisoned");
        subscribers.retain(|tx| tx.send(payload.clone()).is_ok());
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("subscriber list poisoned").len()
    }
}

impl<T: Clone> Default for ChangeNotifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let notifier = ChangeNotifier::new();
        let a = notifier.subscribe();
        let b = notifier.subscribe();

        notifier.publish(42u32);
        assert_eq!(a.try_recv().unwrap(), 42);
        assert_eq!(b.try_recv().unwrap(), 42);
    }

    #[test]
    fn test_no_publish_no_message() {
        let notifier: ChangeNotifier<u32> = ChangeNotifier::new();
        let rx = notifier.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let notifier = ChangeNotifier::new();
        let rx = notifier.subscribe();
        drop(rx);
        assert_eq!(notifier.subscriber_count(), 1);

        notifier.publish(1u32);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribe_concurrent_with_publish() {
        let notifier = std::sync::Arc::new(ChangeNotifier::new());

        let publisher = {
            let notifier = notifier.clone();
            thread::spawn(move || {
                for i in 0..1000u32 {
                    notifier.publish(i);
                }
            })
        };
        let subscriber = {
            let notifier = notifier.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    let rx = notifier.subscribe();
                    drop(rx);
                }
            })
        };

        publisher.join().unwrap();
        subscriber.join().unwrap();
    }

    #[test]
    fn test_messages_arrive_in_order() {
        let notifier = ChangeNotifier::new();
        let rx = notifier.subscribe();
        for i in 0..5u32 {
            notifier.publish(i);
        }
        let received: Vec<u32> = rx.try_iter().collect();
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }
}
