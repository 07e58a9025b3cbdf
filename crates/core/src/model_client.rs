use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use duologue_model::{
    ModelFinishReason, ModelMessage, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

use crate::error::GenerationError;

type SendRequestResult = Result<ModelClientResponse, GenerationError>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased,
/// request/response interface for the debate engine.
///
/// Cloning is cheap, and clones send through the same provider.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    /// Wraps a model provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and waits for the complete response.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }

    /// Sends `messages` and returns the generated text.
    ///
    /// A response without any non-whitespace text counts as a failure.
    pub async fn generate(
        &self,
        messages: Vec<ModelMessage>,
    ) -> Result<String, GenerationError> {
        if messages.is_empty() {
            return Err(GenerationError::EmptyRequest);
        }
        let resp = self.send_request(ModelRequest { messages }).await?;
        if resp.text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        if resp.finish_reason == Some(ModelFinishReason::Length) {
            debug!("response was cut off by the token limit");
        }
        Ok(resp.text)
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    /// The concatenated message deltas.
    pub text: String,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

fn provider_error<E: ModelProviderError>(err: E) -> GenerationError {
    debug!("got an error: {err:?}");
    GenerationError::Provider {
        kind: err.kind(),
        message: err.to_string(),
    }
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
) -> SendRequestResult {
    let resp = resp_or_err.map_err(provider_error)?;

    let mut text = String::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event = poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx))
            .await
            .map_err(provider_error)?;

        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                text.push_str(&delta);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelClientResponse {
        text,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use duologue_model::ErrorKind;
    use duologue_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };

    use super::*;

    fn messages() -> Vec<ModelMessage> {
        vec![
            ModelMessage::System("You are a debater.".to_owned()),
            ModelMessage::User("Hi".to_owned()),
        ]
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut model_provider = TestModelProvider::default();
        for _ in 0..3 {
            model_provider.add_response(PresetResponse::with_events([
                PresetEvent::MessageDelta("How ".to_owned()),
                PresetEvent::MessageDelta("are ".to_owned()),
                PresetEvent::MessageDelta("you?".to_owned()),
            ]));
        }

        let model_client = ModelClient::new(model_provider);

        for _ in 0..3 {
            let resp = model_client
                .send_request(ModelRequest {
                    messages: messages(),
                })
                .await
                .unwrap();
            assert_eq!(resp.text, "How are you?");
            assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
        }
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_provider = TestModelProvider::default();
        let model_client = ModelClient::new(model_provider);
        let err = model_client.generate(messages()).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Provider {
                kind: ErrorKind::RateLimitExceeded,
                ..
            }
        ));

        let err = model_client.generate(vec![]).await.unwrap_err();
        assert_eq!(err, GenerationError::EmptyRequest);
    }

    #[tokio::test]
    async fn test_unusable_content() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_response(PresetResponse::with_text("  \n"));
        model_provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Dogs are".to_owned()),
            PresetEvent::StreamError,
        ]));
        let model_client = ModelClient::new(model_provider);

        let err = model_client.generate(messages()).await.unwrap_err();
        assert_eq!(err, GenerationError::EmptyResponse);

        let err = model_client.generate(messages()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Provider { .. }));
    }
}
