//! InMemory Queue 実装
//!
//! 「少なくとも 1 回配信」のキューをプロセス内で再現します。
//!
//! - 処理に失敗したメッセージは `max_receive_count` 回まで再配信される
//! - 再配信回数を使い切ったメッセージと `Malformed` なメッセージはデッドレターに移る
//! - 取り出したメッセージはキャンセルされず、完了するか失敗するまで処理される

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::domain::{MessageQueue, TransportError};

use super::{ConsumeError, MessageHandler};

/// デフォルトの最大受信回数
pub const DEFAULT_MAX_RECEIVE_COUNT: u32 = 3;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
struct Envelope {
    body: String,
    receive_count: u32,
}

/// 送信側
#[derive(Clone)]
pub struct InMemoryQueue {
    name: Arc<str>,
    sender: mpsc::UnboundedSender<Envelope>,
}

/// 受信側（ワーカー）
pub struct QueueReceiver {
    name: Arc<str>,
    receiver: mpsc::UnboundedReceiver<Envelope>,
    redrive: mpsc::UnboundedSender<Envelope>,
    max_receive_count: u32,
    retry_delay: Duration,
    dead_letters: Arc<Mutex<Vec<String>>>,
}

/// 1 件の配信結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Acknowledged,
    Redriven,
    DeadLettered,
}

impl InMemoryQueue {
    /// キューを作成し、送信側と受信側を返す
    pub fn channel(name: &str, max_receive_count: u32) -> (InMemoryQueue, QueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let name: Arc<str> = Arc::from(name);
        let queue = InMemoryQueue {
            name: name.clone(),
            sender: sender.clone(),
        };
        let receiver = QueueReceiver {
            name,
            receiver,
            redrive: sender,
            max_receive_count: max_receive_count.max(1),
            retry_delay: DEFAULT_RETRY_DELAY,
            dead_letters: Arc::new(Mutex::new(Vec::new())),
        };
        (queue, receiver)
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn send(&self, body: String) -> Result<(), TransportError> {
        self.sender
            .send(Envelope {
                body,
                receive_count: 0,
            })
            .map_err(|_| TransportError::Unavailable(format!("queue '{}' is closed", self.name)))
    }
}

impl QueueReceiver {
    /// デッドレターに移ったメッセージ本文の一覧
    pub async fn dead_letters(&self) -> Vec<String> {
        self.dead_letters.lock().await.clone()
    }

    /// メッセージを受信するたびに独立したタスクで処理し続ける
    pub async fn run(mut self, handler: Arc<dyn MessageHandler>) {
        tracing::info!("Queue consumer '{}' started", self.name);
        while let Some(envelope) = self.receiver.recv().await {
            let worker = Worker {
                name: self.name.clone(),
                redrive: self.redrive.clone(),
                max_receive_count: self.max_receive_count,
                retry_delay: self.retry_delay,
                dead_letters: self.dead_letters.clone(),
            };
            let handler = handler.clone();
            tokio::spawn(async move {
                worker.deliver(handler.as_ref(), envelope, true).await;
            });
        }
        tracing::info!("Queue consumer '{}' stopped", self.name);
    }

    /// 現在キューにあるメッセージを、空になるまでこのタスク内で順番に処理する
    ///
    /// 再配信されたメッセージも同じ呼び出しの中で処理される。処理した配信数を返す。
    pub async fn drain(&mut self, handler: &dyn MessageHandler) -> usize {
        let worker = Worker {
            name: self.name.clone(),
            redrive: self.redrive.clone(),
            max_receive_count: self.max_receive_count,
            retry_delay: Duration::ZERO,
            dead_letters: self.dead_letters.clone(),
        };
        let mut deliveries = 0;
        while let Ok(envelope) = self.receiver.try_recv() {
            worker.deliver(handler, envelope, false).await;
            deliveries += 1;
        }
        deliveries
    }
}

struct Worker {
    name: Arc<str>,
    redrive: mpsc::UnboundedSender<Envelope>,
    max_receive_count: u32,
    retry_delay: Duration,
    dead_letters: Arc<Mutex<Vec<String>>>,
}

impl Worker {
    async fn deliver(
        &self,
        handler: &dyn MessageHandler,
        mut envelope: Envelope,
        wait_before_redrive: bool,
    ) -> Delivery {
        envelope.receive_count += 1;
        let error = match handler.handle(&envelope.body).await {
            Ok(()) => return Delivery::Acknowledged,
            Err(e) => e,
        };

        let exhausted = envelope.receive_count >= self.max_receive_count;
        match error {
            ConsumeError::Retryable(reason) if !exhausted => {
                tracing::warn!(
                    "Queue '{}': delivery {} failed, redriving: {}",
                    self.name,
                    envelope.receive_count,
                    reason
                );
                if wait_before_redrive && !self.retry_delay.is_zero() {
                    tokio::time::sleep(self.retry_delay).await;
                }
                match self.redrive.send(envelope) {
                    Ok(()) => Delivery::Redriven,
                    Err(mpsc::error::SendError(envelope)) => self.dead_letter(envelope).await,
                }
            }
            other => {
                tracing::error!(
                    "Queue '{}': giving up after {} deliveries: {}",
                    self.name,
                    envelope.receive_count,
                    other
                );
                self.dead_letter(envelope).await
            }
        }
    }

    async fn dead_letter(&self, envelope: Envelope) -> Delivery {
        self.dead_letters.lock().await.push(envelope.body);
        Delivery::DeadLettered
    }
}
