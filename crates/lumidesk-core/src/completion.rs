//! Text-completion abstraction.
//!
//! A [`CompletionService`] turns an ordered list of role-tagged messages
//! into generated text. Each call is awaited to completion before the next
//! one is issued; the core never streams, retries, or runs calls in
//! parallel.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Message;

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

#[async_trait]
impl<C: CompletionService + ?Sized> CompletionService for &C {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        (**self).complete(messages).await
    }
}

#[async_trait]
impl<C: CompletionService + ?Sized> CompletionService for Box<C> {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        (**self).complete(messages).await
    }
}

#[async_trait]
impl<C: CompletionService + ?Sized> CompletionService for std::sync::Arc<C> {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        (**self).complete(messages).await
    }
}
