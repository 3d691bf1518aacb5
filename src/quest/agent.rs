use async_trait::async_trait;
use hq4l_agents::shared::chat::ChatAgent;
use hq4l_agents::shared::error::Result;
use hq4l_agents::shared::gemini::QuestModel;
use hq4l_agents::shared::intent::{classify_quest, QuestIntent};
use hq4l_agents::shared::quest::{
    daily_quests_prompt, format_quests_for_chat, free_chat_prompt, single_quest_payload,
    single_quest_prompt, QuestBatch, QuestInput, QuestResponse, QuestSeed, CHAT_QUEST_PROMPT,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

pub const WELCOME: &str = "🎮 **Quest Generator ready!**

Ask me for a `quest` and I will make one up, or just ask me anything.";

pub struct QuestAgent {
    model: Arc<dyn QuestModel>,
}

impl QuestAgent {
    pub fn new(model: Arc<dyn QuestModel>) -> Self {
        Self { model }
    }

    pub async fn daily_quests(&self, input: &QuestInput) -> Result<QuestBatch> {
        info!(
            "Received quest request: role={}, level={}",
            input.role, input.level
        );
        let text = self.model.generate(&daily_quests_prompt(input)).await?;
        info!("Response received from Gemini");
        Ok(QuestBatch::from_model_text(&text))
    }

    pub async fn single_quest(&self, seed: &QuestSeed) -> Result<Value> {
        let text = self.model.generate(&single_quest_prompt(seed)).await?;
        Ok(single_quest_payload(&text))
    }

    /// A single quest with title, description and integer reward.
    pub async fn structured_quest(&self) -> Result<QuestResponse> {
        let text = self.model.generate(CHAT_QUEST_PROMPT).await?;
        let quest = QuestResponse::from_model_text(&text).inspect_err(|e| {
            error!("Could not read quest from Gemini answer: {}", e);
        })?;
        info!("Generated quest '{}' (reward {})", quest.title, quest.reward);
        Ok(quest)
    }
}

#[async_trait]
impl ChatAgent for QuestAgent {
    fn welcome(&self) -> String {
        WELCOME.to_string()
    }

    async fn reply(&self, _sender: &str, text: &str) -> String {
        let text = text.trim();
        match classify_quest(text) {
            QuestIntent::GenerateQuest => match self.model.generate(CHAT_QUEST_PROMPT).await {
                Ok(answer) => format!("🎮 Generated quest:\n{}", format_quests_for_chat(&answer)),
                Err(err) => {
                    error!("Quest generation failed: {}", err);
                    format!("⚠️ Error from Gemini: {}", err)
                }
            },
            QuestIntent::FreeChat => match self.model.generate(&free_chat_prompt(text)).await {
                Ok(answer) => answer,
                Err(err) => {
                    error!("Free chat generation failed: {}", err);
                    "⚠️ Failed to get a response from Gemini.".to_string()
                }
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hq4l_agents::shared::error::AgentError;
    use hq4l_agents::shared::quest::QuestReplyError;
    use std::sync::Mutex;

    /// Returns a canned answer and records every prompt it was given.
    pub(crate) struct ScriptedModel {
        answer: std::result::Result<String, String>,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub(crate) fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl QuestModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answer.clone().map_err(AgentError::Model)
        }
    }

    #[tokio::test]
    async fn daily_quests_use_level_and_role() {
        let model = ScriptedModel::answering(r#"[{"judul": "Stretch", "exp": 5}]"#);
        let agent = QuestAgent::new(model.clone());
        let batch = agent
            .daily_quests(&QuestInput {
                role: "Sports".to_string(),
                level: 3,
                desc: "Runner".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(batch.quests[0]["judul"], "Stretch");
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Player role: Sports"));
        assert!(prompts[0].contains("Player level: 3"));
    }

    #[tokio::test]
    async fn model_failure_propagates_from_daily_quests() {
        let agent = QuestAgent::new(ScriptedModel::failing("quota exceeded"));
        let err = agent
            .daily_quests(&QuestInput {
                role: "Arts".to_string(),
                level: 1,
                desc: String::new(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn structured_quest_reads_json_and_labelled_lines() {
        let agent = QuestAgent::new(ScriptedModel::answering(
            r#"[{"title": "Goblin hunt", "description": "Clear the cave", "reward": 30}]"#,
        ));
        assert_eq!(
            agent.structured_quest().await.unwrap(),
            QuestResponse {
                title: "Goblin hunt".to_string(),
                description: "Clear the cave".to_string(),
                reward: 30,
            }
        );

        let model = ScriptedModel::answering(
            "Judul: Penjaga Hutan\n\nDeskripsi: Usir serigala dari desa\nReward: 75\n",
        );
        let agent = QuestAgent::new(model.clone());
        let quest = agent.structured_quest().await.unwrap();
        assert_eq!(quest.title, "Penjaga Hutan");
        assert_eq!(quest.description, "Usir serigala dari desa");
        assert_eq!(quest.reward, 75);
        assert_eq!(model.prompts.lock().unwrap()[0], CHAT_QUEST_PROMPT);
    }

    #[tokio::test]
    async fn structured_quest_rejects_non_integer_reward() {
        let agent = QuestAgent::new(ScriptedModel::answering(
            "Judul: Dragon\nDeskripsi: Slay it\nReward: lots of gold",
        ));
        let err = agent.structured_quest().await.unwrap_err();
        match err {
            AgentError::QuestReply(QuestReplyError::InvalidReward(value)) => {
                assert_eq!(value, "lots of gold")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn chat_quest_request_is_formatted() {
        let model = ScriptedModel::answering(
            r#"```json
[{"title": "Goblin hunt", "description": "Clear the cave", "reward": 30}]
```"#,
        );
        let agent = QuestAgent::new(model.clone());
        let reply = agent.reply("alice", "give me a quest").await;
        assert!(reply.starts_with("🎮 Generated quest:\n**1. Goblin hunt**"), "{reply}");
        assert!(reply.contains("Reward: 30"));
        assert_eq!(model.prompts.lock().unwrap()[0], CHAT_QUEST_PROMPT);
    }

    #[tokio::test]
    async fn free_chat_passes_text_through() {
        let model = ScriptedModel::answering("Paris.");
        let agent = QuestAgent::new(model.clone());
        assert_eq!(agent.reply("bob", "  capital of France?  ").await, "Paris.");
        assert_eq!(
            model.prompts.lock().unwrap()[0],
            "Answer the following message briefly: capital of France?"
        );
    }

    #[tokio::test]
    async fn chat_failures_become_warnings() {
        let agent = QuestAgent::new(ScriptedModel::failing("503"));
        assert!(agent.reply("bob", "quest pls").await.starts_with("⚠️ Error from Gemini"));
        assert_eq!(
            agent.reply("bob", "hello").await,
            "⚠️ Failed to get a response from Gemini."
        );
    }
}
