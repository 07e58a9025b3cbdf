//! Two-channel translation, shown through the same four display fields
//! as a debate.

use duologue_model::{ModelMessage, ModelProvider};

use crate::debate::Snapshot;
use crate::error::{Agent, ConfigurationError, DebateError, GenerationError, Stage};
use crate::model_client::ModelClient;

/// Translates text with a model.
#[derive(Clone)]
pub struct Translator {
    client: ModelClient,
}

impl Translator {
    /// Creates a translator backed by a model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(provider: P) -> Self {
        Self::with_model_client(ModelClient::new(provider))
    }

    /// Creates a translator from an already wrapped client.
    #[inline]
    pub fn with_model_client(client: ModelClient) -> Self {
        Self { client }
    }

    /// Translates `text` into `target_language`.
    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> Result<String, GenerationError> {
        trace!("translating into {target_language}: {text}");
        self.client
            .generate(vec![
                ModelMessage::System(format!(
                    "You are a translator. Translate the following text to {target_language}."
                )),
                ModelMessage::User(text.to_owned()),
            ])
            .await
    }

    /// Translates two inputs, each into its own language, and lays them
    /// out as `(input 1, translation 1, translation 2, input 2)`.
    pub async fn translate_pair(
        &self,
        inputs: [&str; 2],
        targets: [&str; 2],
    ) -> Result<Snapshot, DebateError> {
        let mut translations = [String::new(), String::new()];
        for agent in Agent::BOTH {
            let idx = agent.index();
            let input = inputs[idx].trim();
            if input.is_empty() {
                return Err(ConfigurationError::EmptySeed(agent).into());
            }
            translations[idx] = self
                .translate(input, targets[idx])
                .await
                .map_err(|source| DebateError::Generation {
                    stage: Stage::Translation,
                    agent,
                    source,
                })?;
        }

        let [translation1, translation2] = translations;
        Ok(Snapshot::new(
            Stage::Translation,
            [
                inputs[0].trim().to_owned(),
                translation1,
                translation2,
                inputs[1].trim().to_owned(),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use duologue_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    #[tokio::test]
    async fn test_translate_pair_layout() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("Hello"));
        provider.add_response(PresetResponse::with_text("Bonjour"));
        let observer = provider.clone();
        let translator = Translator::with_model_provider(provider);

        let snapshot = translator
            .translate_pair(["你好", " 早上好 "], ["English", "French"])
            .await
            .unwrap();
        assert_eq!(snapshot.fields(), ["你好", "Hello", "Bonjour", "早上好"]);

        let requests = observer.requests();
        assert_eq!(
            requests[1].messages[0].content(),
            "You are a translator. Translate the following text to French."
        );
        assert_eq!(requests[1].messages[1].content(), "早上好");
    }

    #[tokio::test]
    async fn test_translate_pair_failure() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("Hello"));
        let translator = Translator::with_model_provider(provider);

        let err = translator
            .translate_pair(["你好", "早上好"], ["English", "French"])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DebateError::Generation {
                stage: Stage::Translation,
                agent: Agent::Second,
                ..
            }
        ));

        let err = translator
            .translate_pair(["", "早上好"], ["English", "French"])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DebateError::from(ConfigurationError::EmptySeed(Agent::First))
        );
    }
}
