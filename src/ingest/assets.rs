//! Asset registration

use super::{AssetDbWriter, AssetMap, AssetRecord, IngestError, Sid, EXCHANGE};
use crate::api::{CurrencySource, Pair};

/// Register `pairs` as assets and return the sid map.
///
/// Sids are assigned `0..n` in pair order, skipping repeated pairs. Asset
/// names come from the exchange's currency listing; a pair whose traded
/// currency is not listed fails before anything is written.
pub async fn write_assets<C>(
    currencies: &C,
    writer: &mut dyn AssetDbWriter,
    pairs: &[Pair],
) -> Result<AssetMap, IngestError>
where
    C: CurrencySource + ?Sized,
{
    let listing = currencies.currencies().await?;

    let mut assets = AssetMap::new();
    let mut records = Vec::with_capacity(pairs.len());

    for pair in pairs {
        if assets.values().any(|p| p == pair) {
            continue;
        }
        let currency = listing
            .get(pair.base())
            .ok_or_else(|| IngestError::UnknownAsset(pair.base().to_string()))?;

        let sid = assets.len() as Sid;
        records.push(AssetRecord {
            sid,
            symbol: pair.base().to_string(),
            asset_name: currency.name.clone(),
            exchange: EXCHANGE.to_string(),
        });
        assets.insert(sid, pair.clone());
    }

    writer.write(&records).await?;
    tracing::info!(count = records.len(), "Registered assets");

    Ok(assets)
}
