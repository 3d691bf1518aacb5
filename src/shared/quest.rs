//! Quest prompts and the shaping of model answers into quest payloads.

use super::json_extract::extract_json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};

pub const DAILY_QUEST_COUNT: usize = 5;

/// Body of `POST /quest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestInput {
    pub role: String,
    pub level: u32,
    pub desc: String,
}

/// Body of `POST /generate-quest`; every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestSeed {
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub desc: String,
}

impl Default for QuestSeed {
    fn default() -> Self {
        Self {
            role: default_role(),
            level: default_level(),
            desc: String::new(),
        }
    }
}

fn default_role() -> String {
    "Coders".to_string()
}

fn default_level() -> u32 {
    1
}

/// Response of `POST /quest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestBatch {
    pub success: bool,
    /// Extracted JSON, or the model text itself when nothing could be extracted.
    pub quests: Value,
    pub raw_response: String,
}

impl QuestBatch {
    pub fn from_model_text(text: &str) -> Self {
        let quests = match extract_json(text) {
            Ok(extracted) => {
                let count = extracted.value.as_array().map_or(1, Vec::len);
                info!(count, stage = ?extracted.stage, "Generated quests successfully");
                extracted.value
            }
            Err(failure) => {
                warn!(reason = %failure.reason, "Quest response is not valid JSON");
                warn!(raw = %failure.raw, "Raw quest response");
                Value::String(failure.raw)
            }
        };

        Self {
            success: true,
            quests,
            raw_response: text.to_string(),
        }
    }
}

/// Body of `POST /quest/generate`. Only the `generate` action is understood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestRequest {
    pub action: String,
}

impl QuestRequest {
    pub const GENERATE: &'static str = "generate";

    pub fn is_generate(&self) -> bool {
        self.action.trim().eq_ignore_ascii_case(Self::GENERATE)
    }
}

/// One quest with an integer reward, read out of a free-form model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestResponse {
    pub title: String,
    pub description: String,
    pub reward: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuestReplyError {
    #[error("quest answer has no {0}")]
    MissingField(&'static str),

    #[error("quest reward is not an integer: {0}")]
    InvalidReward(String),
}

const TITLE_KEYS: &[&str] = &["title", "judul"];
const DESCRIPTION_KEYS: &[&str] = &["description", "deskripsi", "deskripsi_quest"];
const TITLE_LABELS: &[&str] = &["Judul:", "Title:"];
const DESCRIPTION_LABELS: &[&str] = &["Deskripsi:", "Description:"];
const REWARD_LABELS: &[&str] = &["Reward:", "Hadiah:"];

impl QuestResponse {
    /// Read a quest from JSON (an object, or the first object of an array)
    /// or, failing that, from `Judul:` / `Deskripsi:` / `Reward:` lines.
    pub fn from_model_text(text: &str) -> Result<Self, QuestReplyError> {
        let quest = extract_json(text).ok().and_then(|extracted| match extracted.value {
            Value::Object(map) => Some(map),
            Value::Array(items) => items.into_iter().find_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            }),
            _ => None,
        });

        match quest {
            Some(quest) => Self::from_object(&quest),
            None => Self::from_lines(text),
        }
    }

    fn from_object(quest: &Map<String, Value>) -> Result<Self, QuestReplyError> {
        let title = first_field(quest, TITLE_KEYS).ok_or(QuestReplyError::MissingField("title"))?;
        let description = first_field(quest, DESCRIPTION_KEYS)
            .ok_or(QuestReplyError::MissingField("description"))?;
        let reward = match quest.get("reward") {
            None | Some(Value::Null) => return Err(QuestReplyError::MissingField("reward")),
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| QuestReplyError::InvalidReward(n.to_string()))?,
            Some(Value::String(s)) => parse_reward(s)?,
            Some(other) => return Err(QuestReplyError::InvalidReward(other.to_string())),
        };
        Ok(Self {
            title,
            description,
            reward,
        })
    }

    fn from_lines(text: &str) -> Result<Self, QuestReplyError> {
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
        let title = lines.next().ok_or(QuestReplyError::MissingField("title"))?;
        let description = lines
            .next()
            .ok_or(QuestReplyError::MissingField("description"))?;
        let reward = lines.next().ok_or(QuestReplyError::MissingField("reward"))?;

        Ok(Self {
            title: strip_label(title, TITLE_LABELS).to_string(),
            description: strip_label(description, DESCRIPTION_LABELS).to_string(),
            reward: parse_reward(strip_label(reward, REWARD_LABELS))?,
        })
    }
}

fn strip_label<'a>(line: &'a str, labels: &[&str]) -> &'a str {
    let line = line.trim_matches('*').trim();
    labels
        .iter()
        .find_map(|label| line.strip_prefix(label))
        .map_or(line, |rest| rest.trim_start_matches('*').trim())
}

fn parse_reward(value: &str) -> Result<i64, QuestReplyError> {
    let value = value.trim();
    value
        .parse()
        .map_err(|_| QuestReplyError::InvalidReward(value.to_string()))
}

pub fn daily_quests_prompt(input: &QuestInput) -> String {
    format!(
        r#"You are a Game Master who designs daily quests that help players build good habits.

Create **{count} daily quests** based on:
* Player role: {role}
* Player level: {level}
* Role description: {desc}

Rules:
1. Low-level quests are easy; high-level quests are more challenging.
2. Every quest has these attributes:
   - stamina (1-10)
   - exp (1-100)
   - coin (1-100)
3. The output must be a **JSON array of {count} quest objects** with no extra text.
4. Follow this JSON format:
[
    {{
        "judul": "An engaging quest title",
        "deskripsi_quest": "What the player has to do.",
        "stamina": 3,
        "exp": 25,
        "coin": 10
    }}
]
5. Make every quest different from the others."#,
        count = DAILY_QUEST_COUNT,
        role = input.role,
        level = input.level,
        desc = input.desc,
    )
}

pub fn single_quest_prompt(seed: &QuestSeed) -> String {
    format!(
        r#"You are a Game Master who designs daily quests that help players build good habits.

Based on:
* Player role: {role}
* Player level: {level}
* Role description: {desc}

Create one (1) daily quest that is relevant, clear and doable. The quest must:
1. Match the player's level: low levels get simple quests, high levels get harder and more complex ones.
2. Define its cost and rewards:
   * stamina: cost to run the quest, 1-10.
   * exp: experience gained, 1-100.
   * coin: in-game currency gained, 1-100.
3. Scale cost and rewards with difficulty: harder quests have higher stamina, exp and coin.

Output format:
A single JSON object with the keys "judul", "deskripsi_quest", "stamina", "exp" and "coin". No extra text, only the JSON object."#,
        role = seed.role,
        level = seed.level,
        desc = seed.desc,
    )
}

pub const CHAT_QUEST_PROMPT: &str = "Create a simple RPG quest. Answer with a JSON array holding \
     one object with the keys \"title\", \"description\" and \"reward\" (a number).";

pub fn free_chat_prompt(message: &str) -> String {
    format!("Answer the following message briefly: {}", message)
}

/// Response of `POST /generate-quest`: the strict JSON answer, or an error object.
pub fn single_quest_payload(text: &str) -> Value {
    serde_json::from_str::<Value>(text).unwrap_or_else(|e| {
        warn!(error = %e, "Single quest response is not valid JSON");
        json!({"error": "Response is not valid JSON", "raw": text})
    })
}

/// Chat rendering of a quest answer. Falls back to the model text verbatim.
pub fn format_quests_for_chat(text: &str) -> String {
    let quests = match extract_json(text) {
        Ok(extracted) => match extracted.value {
            Value::Array(items) => items,
            Value::Object(map) => vec![Value::Object(map)],
            _ => return text.trim().to_string(),
        },
        Err(_) => return text.trim().to_string(),
    };

    let objects: Vec<&Map<String, Value>> = quests.iter().filter_map(Value::as_object).collect();
    if objects.is_empty() {
        return text.trim().to_string();
    }

    let mut out = String::new();
    for (index, quest) in objects.iter().enumerate() {
        let title =
            first_field(quest, TITLE_KEYS).unwrap_or_else(|| "Untitled quest".to_string());
        out.push_str(&format!("**{}. {}**\n", index + 1, title));
        if let Some(desc) = first_field(quest, DESCRIPTION_KEYS) {
            out.push_str(&format!("{}\n", desc));
        }

        let stats: Vec<String> = [
            ("Stamina", &["stamina"][..]),
            ("EXP", &["exp"][..]),
            ("Coin", &["coin"][..]),
            ("Reward", &["reward"][..]),
        ]
        .iter()
        .filter_map(|(label, keys)| first_field(quest, keys).map(|v| format!("{label}: {v}")))
        .collect();
        if !stats.is_empty() {
            out.push_str(&stats.join(" | "));
            out.push('\n');
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn first_field(quest: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| quest.get(*key))
        .and_then(display_value)
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        // Models sometimes echo the `[value]` placeholder shape.
        Value::Array(items) if items.len() == 1 => display_value(&items[0]),
        other => Some(other.to_string()),
    }
}
