use crate::cli::ConfigCommands;
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            api_base_url,
            user_id,
            probe_interval_secs,
            request_timeout_secs,
            no_activate,
        } => run_config_init(
            global_profile,
            ProfileUpdate {
                api_base_url,
                user_id,
                probe_interval_secs,
                request_timeout_secs,
            },
            no_activate,
        ),
    }
}

/// Values passed to `config init`; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub api_base_url: Option<String>,
    pub user_id: Option<String>,
    pub probe_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

pub fn run_config_init(
    profile_name: Option<&str>,
    update: ProfileUpdate,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let profile = config.profile_mut_or_default(&profile_name);
    apply_profile_update(profile, update)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profiles
        .get(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let missing = missing_profile_fields(profile);
    if missing.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. \
             Run `skinvault cases --refresh` to cache the catalog."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing.join(", ")
        );
    }

    Ok(())
}

/// Merge explicit values into a profile and validate the result.
pub fn apply_profile_update(
    profile: &mut CliProfile,
    update: ProfileUpdate,
) -> Result<(), CliError> {
    if let Some(url) = normalize_text_option(update.api_base_url) {
        profile.api_base_url = Some(url);
    }
    if let Some(user_id) = normalize_text_option(update.user_id) {
        profile.user_id = Some(user_id);
    }
    if update.probe_interval_secs.is_some() {
        profile.probe_interval_secs = update.probe_interval_secs;
    }
    if update.request_timeout_secs.is_some() {
        profile.request_timeout_secs = update.request_timeout_secs;
    }

    let validated = profile.client_config().validated()?;
    profile.api_base_url = validated.api_base_url;
    Ok(())
}

pub fn missing_profile_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if profile.api_base_url.is_none() {
        missing.push("api_base_url");
    }
    if profile.user_id.is_none() {
        missing.push("user_id");
    }
    missing
}
