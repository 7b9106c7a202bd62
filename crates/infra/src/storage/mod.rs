pub mod checkpoint;

pub use checkpoint::{
    load_csv, load_json, CheckpointError, CheckpointStore, OutputFormat, SavedCheckpoint,
};
