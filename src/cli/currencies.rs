//! Currencies command implementation

use crate::api::PoloniexClient;
use crate::config::Config;
use clap::Args;

#[derive(Args, Debug)]
pub struct CurrenciesArgs {
    /// Hide disabled and delisted currencies
    #[arg(long)]
    pub active: bool,
}

impl CurrenciesArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let client = PoloniexClient::with_config(config.client_config())?;
        let currencies = client.get_currencies().await?;

        println!("{:<8} {:>6}  {:<32} flags", "symbol", "id", "name");
        for (symbol, currency) in &currencies {
            if self.active && (currency.disabled || currency.delisted) {
                continue;
            }

            let mut flags = Vec::new();
            if currency.disabled {
                flags.push("disabled");
            }
            if currency.delisted {
                flags.push("delisted");
            }
            if currency.frozen {
                flags.push("frozen");
            }
            println!(
                "{:<8} {:>6}  {:<32} {}",
                symbol,
                currency.id,
                currency.name,
                flags.join(",")
            );
        }

        Ok(())
    }
}
