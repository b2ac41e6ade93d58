//! Parquet bar and asset storage

use crate::candle::{Bar, BarSet};
use crate::ingest::{AssetDbWriter, AssetRecord, IngestError, MinuteBarWriter, Sid};
use crate::telemetry::{self, CounterMetric};
use arrow::array::{Array, ArrayRef, StringArray, TimestampMicrosecondArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// File name of the asset table
pub const ASSETS_FILE: &str = "assets.parquet";

/// Minute bar schema; prices are null for buckets without trades
pub fn bar_schema() -> Schema {
    Schema::new(vec![
        Field::new(
            "timestamp",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        // Decimals are stored as strings to keep full precision
        Field::new("open", DataType::Utf8, true),
        Field::new("high", DataType::Utf8, true),
        Field::new("low", DataType::Utf8, true),
        Field::new("close", DataType::Utf8, true),
        Field::new("volume", DataType::Utf8, false),
    ])
}

/// Asset table schema
pub fn asset_schema() -> Schema {
    Schema::new(vec![
        Field::new("sid", DataType::UInt32, false),
        Field::new("symbol", DataType::Utf8, false),
        Field::new("asset_name", DataType::Utf8, false),
        Field::new("exchange", DataType::Utf8, false),
    ])
}

fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

fn write_batch(path: &Path, batch: &RecordBatch) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(writer_properties()))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn decimal_column(values: impl Iterator<Item = Option<Decimal>>) -> ArrayRef {
    let strings: Vec<Option<String>> = values.map(|v| v.map(|d| d.to_string())).collect();
    Arc::new(StringArray::from(strings))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow::anyhow!("Invalid {} column", name))
}

fn optional_decimal(column: &StringArray, i: usize) -> anyhow::Result<Option<Decimal>> {
    if column.is_null(i) {
        return Ok(None);
    }
    Ok(Some(Decimal::from_str(column.value(i))?))
}

/// Writes one Parquet file per asset-day
pub struct ParquetBarWriter {
    output_dir: PathBuf,
}

impl ParquetBarWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Ensure output directory exists
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Path of the bar file for `sid` on `day`
    pub fn file_path(&self, sid: Sid, day: NaiveDate) -> PathBuf {
        let filename = format!("{}_{}.parquet", sid, day.format("%Y%m%d"));
        self.output_dir.join(filename)
    }

    /// Write one bar set to `path`. Empty sets create no file.
    pub fn write_bars(&self, path: &Path, set: &BarSet) -> anyhow::Result<()> {
        if set.is_empty() {
            return Ok(());
        }

        self.ensure_dir()?;

        let timestamps: Vec<i64> = set.bars.iter().map(|b| b.start.timestamp_micros()).collect();
        let volumes: Vec<String> = set.bars.iter().map(|b| b.volume.to_string()).collect();

        let batch = RecordBatch::try_new(
            Arc::new(bar_schema()),
            vec![
                Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone("UTC"))
                    as ArrayRef,
                decimal_column(set.bars.iter().map(|b| b.open)),
                decimal_column(set.bars.iter().map(|b| b.high)),
                decimal_column(set.bars.iter().map(|b| b.low)),
                decimal_column(set.bars.iter().map(|b| b.close)),
                Arc::new(StringArray::from(volumes)) as ArrayRef,
            ],
        )?;

        write_batch(path, &batch)?;
        tracing::debug!(path = ?path, count = set.len(), "Wrote bars to Parquet");

        Ok(())
    }
}

#[async_trait]
impl MinuteBarWriter for ParquetBarWriter {
    async fn write(
        &mut self,
        mut bars: BoxStream<'_, Result<(Sid, BarSet), IngestError>>,
        show_progress: bool,
    ) -> anyhow::Result<()> {
        let mut files = 0usize;

        while let Some((sid, set)) = bars.try_next().await? {
            let path = self.file_path(sid, set.start.date_naive());
            self.write_bars(&path, &set)?;
            telemetry::increment(CounterMetric::BarsWritten, set.len() as u64);
            files += 1;

            if show_progress {
                tracing::info!(sid, day = %set.start.date_naive(), bars = set.len(), "Wrote bars");
            }
        }

        tracing::info!(files, dir = ?self.output_dir, "Finished writing bars");
        Ok(())
    }
}

/// Writes the asset table to `assets.parquet`
pub struct ParquetAssetWriter {
    output_dir: PathBuf,
}

impl ParquetAssetWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Path of the asset table
    pub fn path(&self) -> PathBuf {
        self.output_dir.join(ASSETS_FILE)
    }
}

#[async_trait]
impl AssetDbWriter for ParquetAssetWriter {
    async fn write(&mut self, assets: &[AssetRecord]) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)?;

        let sids: Vec<u32> = assets.iter().map(|a| a.sid).collect();
        let symbols: Vec<&str> = assets.iter().map(|a| a.symbol.as_str()).collect();
        let names: Vec<&str> = assets.iter().map(|a| a.asset_name.as_str()).collect();
        let exchanges: Vec<&str> = assets.iter().map(|a| a.exchange.as_str()).collect();

        let batch = RecordBatch::try_new(
            Arc::new(asset_schema()),
            vec![
                Arc::new(UInt32Array::from(sids)) as ArrayRef,
                Arc::new(StringArray::from(symbols)) as ArrayRef,
                Arc::new(StringArray::from(names)) as ArrayRef,
                Arc::new(StringArray::from(exchanges)) as ArrayRef,
            ],
        )?;

        let path = self.path();
        write_batch(&path, &batch)?;
        tracing::debug!(path = ?path, count = assets.len(), "Wrote assets to Parquet");

        Ok(())
    }
}

/// Reader for Parquet bar files
pub struct ParquetBarReader {
    path: PathBuf,
}

impl ParquetBarReader {
    /// Create a new reader for a Parquet file
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read every bar in the file
    pub fn read_bars(&self) -> anyhow::Result<Vec<Bar>> {
        let file = File::open(&self.path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut bars = Vec::new();

        for batch_result in reader {
            let batch = batch_result?;

            let timestamps = batch
                .column_by_name("timestamp")
                .and_then(|c| c.as_any().downcast_ref::<TimestampMicrosecondArray>())
                .ok_or_else(|| anyhow::anyhow!("Invalid timestamp column"))?;
            let open = string_column(&batch, "open")?;
            let high = string_column(&batch, "high")?;
            let low = string_column(&batch, "low")?;
            let close = string_column(&batch, "close")?;
            let volume = string_column(&batch, "volume")?;

            for i in 0..batch.num_rows() {
                let start = DateTime::from_timestamp_micros(timestamps.value(i))
                    .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))?;

                bars.push(Bar {
                    start,
                    open: optional_decimal(open, i)?,
                    high: optional_decimal(high, i)?,
                    low: optional_decimal(low, i)?,
                    close: optional_decimal(close, i)?,
                    volume: Decimal::from_str(volume.value(i))?,
                });
            }
        }

        Ok(bars)
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read an asset table written by [`ParquetAssetWriter`]
pub fn read_assets(path: &Path) -> anyhow::Result<Vec<AssetRecord>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut assets = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;

        let sids = batch
            .column_by_name("sid")
            .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
            .ok_or_else(|| anyhow::anyhow!("Invalid sid column"))?;
        let symbols = string_column(&batch, "symbol")?;
        let names = string_column(&batch, "asset_name")?;
        let exchanges = string_column(&batch, "exchange")?;

        for i in 0..batch.num_rows() {
            assets.push(AssetRecord {
                sid: sids.value(i),
                symbol: symbols.value(i).to_string(),
                asset_name: names.value(i).to_string(),
                exchange: exchanges.value(i).to_string(),
            });
        }
    }

    Ok(assets)
}
