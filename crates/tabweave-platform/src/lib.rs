pub mod crash_report;
pub mod paths;

pub use paths::{
    cache_dir, config_dir, crash_report_dir, data_dir, downloads_dir, ensure_dirs, log_dir,
    partition_data_dir, store_file,
};
