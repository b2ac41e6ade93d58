//! Bar storage
//!
//! Parquet implementations of the asset and minute bar writers

mod parquet;

pub use parquet::{
    asset_schema, bar_schema, read_assets, ParquetAssetWriter, ParquetBarReader, ParquetBarWriter,
    ASSETS_FILE,
};
