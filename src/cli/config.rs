use std::error::Error;
use zim_waveform::config::Config;

pub const CONFIG_KEYS: [&str; 6] = [
    "fetch_timeout_secs",
    "export_timeout_secs",
    "samples_per_pixel",
    "temp_dir",
    "log_level",
    "log_file",
];

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    println!("Current zim-waveform configuration:");
    println!("  fetch_timeout_secs: {}", config.fetch_timeout_secs);
    println!("  export_timeout_secs: {}", config.export_timeout_secs);
    println!("  samples_per_pixel: {}", config.samples_per_pixel);
    println!(
        "  temp_dir: {}",
        config.temp_dir.as_deref().unwrap_or("(system default)")
    );
    println!("  log_level: {}", config.log_level);
    println!(
        "  log_file: {}",
        config.log_file.as_deref().unwrap_or("(none)")
    );

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;

    config.set_value(key, value)?;
    config.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}

pub fn handle_config_path() -> Result<(), Box<dyn Error>> {
    let config_path = Config::config_path()?;
    let status = if Config::exists()? { "" } else { " (not created yet)" };
    println!("{}{status}", config_path.display());
    Ok(())
}
