pub mod model;
pub mod store;

pub use model::{
    Currency, Language, SettingsPatch, SettingsPatchRequest, Theme, UserSettings,
};
pub use store::{ApplyError, MemorySettingsStore, SettingsStore, StoreError};
