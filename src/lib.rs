pub mod biometric;
pub mod config;

#[cfg(feature = "desktop")]
pub mod commands;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
  use std::sync::Arc;

  use crate::biometric::BiometricService;
  use crate::commands::{self, AppState};
  use crate::config::AppConfig;
  use tauri_plugin_log::{Target, TargetKind};

  #[cfg_attr(mobile, tauri::mobile_entry_point)]
  pub fn run() {
    let (config, load_error) = AppConfig::load_or_profile_defaults();

    let service = BiometricService::from_config(config.device_config(), config.retry_policy())
      .expect("failed to create biometric HTTP client");
    let state = Arc::new(AppState::new(config.clone(), service));

    let log_plugin = tauri_plugin_log::Builder::default()
      .level(config.logging.level_filter())
      .clear_targets()
      .target(Target::new(TargetKind::Stdout))
      .target(Target::new(TargetKind::LogDir {
        file_name: config.logging.file_name.clone(),
      }));

    tauri::Builder::default()
      .plugin(log_plugin.build())
      .manage(state)
      .invoke_handler(tauri::generate_handler![
        commands::biometric_test_connection,
        commands::biometric_capture,
        commands::biometric_device_info,
        commands::biometric_device_available,
        commands::biometric_fingerprint_record,
        commands::get_biometric_config,
      ])
      .setup(move |_app| {
        if let Some(e) = load_error {
          log::error!("Invalid configuration, using {:?} defaults: {}", config.environment, e);
        }
        log::info!(
          "ETD desktop started ({:?}) - scanner {} at {}",
          config.environment,
          config.biometric.device_name,
          config.biometric.base_url
        );
        Ok(())
      })
      .run(tauri::generate_context!())
      .expect("error while running tauri application");
  }
}
