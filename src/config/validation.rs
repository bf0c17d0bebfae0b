use super::ServerConfig;

/// Validate the merged configuration
pub fn validate(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_session_timing(
        config.session_silence_timeout_ms,
        config.session_poll_interval_ms,
    )?;
    validate_capacity(
        "SESSION_AUDIO_QUEUE_CAPACITY",
        config.session_audio_queue_capacity,
    )?;
    validate_capacity("ASR_CHUNK_BYTES", config.asr_chunk_bytes)?;
    if config.asr_send_interval_ms == 0 {
        return Err("ASR_SEND_INTERVAL_MS must be greater than zero".into());
    }
    Ok(())
}

/// Validate silence detection timing
///
/// The poll interval must be non-zero and strictly smaller than the silence
/// timeout, otherwise a pause could never be observed in time.
pub fn validate_session_timing(
    silence_timeout_ms: u64,
    poll_interval_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    if poll_interval_ms == 0 {
        return Err("SESSION_POLL_INTERVAL_MS must be greater than zero".into());
    }
    if poll_interval_ms >= silence_timeout_ms {
        return Err(format!(
            "SESSION_POLL_INTERVAL_MS ({poll_interval_ms}) must be smaller than SESSION_SILENCE_TIMEOUT_MS ({silence_timeout_ms})"
        )
        .into());
    }
    Ok(())
}

pub fn validate_capacity(name: &str, value: usize) -> Result<(), Box<dyn std::error::Error>> {
    if value == 0 {
        return Err(format!("{name} must be greater than zero").into());
    }
    Ok(())
}
