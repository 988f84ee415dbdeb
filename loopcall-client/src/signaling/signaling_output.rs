use async_trait::async_trait;
use loopcall_core::SignalingMessage;

/// Трейт, который реализует транспорт сигнализации, чтобы роутер мог
/// отправлять сообщения другой стороне (SDP, ICE, чат).
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Сериализовать и отправить. Ошибки транспорта логируются, не возвращаются.
    async fn send(&self, msg: SignalingMessage);
}
