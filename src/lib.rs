pub mod data;
pub mod error;
pub mod logging;
pub mod sanity;
pub mod stats;
pub mod uitviic;
pub mod viz;
pub mod vivqa;

pub use data::{image_file_name, image_id_from_path, DataUnpacker, Split};
pub use error::{AuditError, Result};
pub use sanity::{SanityLog, SanitySummary};
pub use stats::DimensionStats;
pub use uitviic::{UitViicMeta, UitViicUnpacker};
pub use vivqa::{ViVqaMeta, ViVqaUnpacker};
