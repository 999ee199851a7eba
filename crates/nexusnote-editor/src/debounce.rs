use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

enum Command<T> {
    Schedule(T),
    Cancel,
}

/// Runs an async action once input has been quiet for `delay`.
///
/// Every [`Debouncer::schedule`] replaces the pending value and restarts the
/// timer. Dropping the debouncer discards a pending value without running
/// the action.
pub struct Debouncer<T> {
    commands: mpsc::UnboundedSender<Command<T>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (commands, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                let Command::Schedule(mut pending) = command else {
                    continue;
                };
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(Command::Schedule(value)) => pending = value,
                            Some(Command::Cancel) => break,
                            // Owner dropped
                            None => return,
                        },
                        _ = tokio::time::sleep(delay) => {
                            action(pending).await;
                            break;
                        }
                    }
                }
            }
        });

        Self { commands }
    }

    /// Replace the pending value and restart the quiet period
    pub fn schedule(&self, value: T) {
        let _ = self.commands.send(Command::Schedule(value));
    }

    /// Drop the pending value, if any
    pub fn cancel(&self) {
        let _ = self.commands.send(Command::Cancel);
    }
}
