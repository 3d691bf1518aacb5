use async_trait::async_trait;
use hq4l_agents::shared::candid::format_shop_response;
use hq4l_agents::shared::canister::CatalogSource;
use hq4l_agents::shared::chat::ChatAgent;
use hq4l_agents::shared::error::AgentError;
use hq4l_agents::shared::intent::{classify_shop, ShopIntent};
use std::sync::Arc;
use tracing::{error, info};

pub const WELCOME: &str = "🎮 **Welcome to the HQ4L Game Agent!**

I can help you interact with the game smart contract.
Type `shop` or `lihat shop` to see the skins that are available.";

pub const HELP: &str = "🎮 **Game Agent commands:**

• `lihat shop` / `toko` / `skin` - List the skins that are available.

*Note: purchasing is currently disabled.*";

pub const PURCHASE_DISABLED: &str =
    "🚫 **Purchasing is disabled.**\n\nYou can only browse the skins that are available.";

pub struct ShopAgent {
    source: Arc<dyn CatalogSource>,
}

impl ShopAgent {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    pub async fn process_query(&self, query: &str) -> String {
        match classify_shop(query) {
            ShopIntent::ShowCatalog => {
                info!("Processing shop query...");
                match self.source.fetch_shop().await {
                    Ok(raw) => format_shop_response(&raw),
                    Err(err) => {
                        error!("dfx call failed: {}", err);
                        troubleshooting(&err, &self.source.manual_command())
                    }
                }
            }
            ShopIntent::Unsupported => PURCHASE_DISABLED.to_string(),
            ShopIntent::Unknown => HELP.to_string(),
        }
    }
}

#[async_trait]
impl ChatAgent for ShopAgent {
    fn welcome(&self) -> String {
        WELCOME.to_string()
    }

    async fn reply(&self, _sender: &str, text: &str) -> String {
        self.process_query(text).await
    }
}

fn troubleshooting(err: &AgentError, manual_command: &str) -> String {
    format!(
        "❌ **Failed to fetch shop data.**

**Error:** `{err}`

**Troubleshooting:**
1. Make sure the local replica is running: `dfx start --background`
2. Check that the configured dfx path (`--dfx-path` / `DFX_PATH`) is correct.
3. Try calling the canister manually:
   `{manual_command}`"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hq4l_agents::shared::error::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixtureSource {
        reply: std::result::Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl FixtureSource {
        fn ok(raw: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(raw),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CatalogSource for FixtureSource {
        async fn fetch_shop(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|m| AgentError::Command(m.to_string()))
        }

        fn manual_command(&self) -> String {
            "dfx canister call backend getShop".to_string()
        }
    }

    #[tokio::test]
    async fn shop_query_renders_catalog() {
        let source = FixtureSource::ok(
            r#"(record { owned = vec {}; available = vec { record { name = "Blade"; price = 10 : nat; } } })"#,
        );
        let agent = ShopAgent::new(source.clone());
        let text = agent.process_query("Lihat Shop dong").await;
        assert!(text.contains("**1. Blade**"), "{text}");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_gives_troubleshooting_steps() {
        let agent = ShopAgent::new(FixtureSource::failing("replica not running"));
        let text = agent.process_query("toko").await;
        assert!(text.contains("replica not running"));
        assert!(text.contains("dfx start --background"));
        assert!(text.contains("`dfx canister call backend getShop`"));
    }

    #[tokio::test]
    async fn purchases_and_unknown_text_never_call_dfx() {
        let source = FixtureSource::ok("");
        let agent = ShopAgent::new(source.clone());
        assert_eq!(agent.process_query("beli pedang").await, PURCHASE_DISABLED);
        assert_eq!(agent.process_query("halo").await, HELP);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unparseable_output_is_still_answered() {
        let agent = ShopAgent::new(FixtureSource::ok("Error: something odd {"));
        let text = agent.process_query("skin").await;
        assert!(text.contains("No skins are available."));
    }
}
