/// What a shop chat message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopIntent {
    ShowCatalog,
    /// Purchases are recognised but disabled.
    Unsupported,
    Unknown,
}

/// What a quest chat message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestIntent {
    GenerateQuest,
    FreeChat,
}

const CATALOG_KEYWORDS: &[&str] = &["shop", "lihat shop", "toko", "skin"];
const PURCHASE_KEYWORDS: &[&str] = &["buy", "beli"];

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

pub fn classify_shop(text: &str) -> ShopIntent {
    let text = normalize(text);
    if mentions_any(&text, CATALOG_KEYWORDS) {
        ShopIntent::ShowCatalog
    } else if mentions_any(&text, PURCHASE_KEYWORDS) {
        ShopIntent::Unsupported
    } else {
        ShopIntent::Unknown
    }
}

pub fn classify_quest(text: &str) -> QuestIntent {
    if normalize(text).contains("quest") {
        QuestIntent::GenerateQuest
    } else {
        QuestIntent::FreeChat
    }
}
