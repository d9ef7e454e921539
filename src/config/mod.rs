pub mod traits;
pub mod search;
pub mod suggestion;
pub mod manager;

pub use manager::{AppConfig, ConfigManager};
pub use search::SearchConfig;
pub use suggestion::SuggestionConfig;
pub use traits::{ConfigManifest, ConfigSection, FieldManifest};
