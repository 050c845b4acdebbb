use candle_core::Device;
use tracing::info;

/// Compute device for the embedding model.
///
/// Metal is tried first when compiled in; `APP_EMBED_DEVICE=cpu` skips it.
pub fn select_device() -> Device {
    let force_cpu = std::env::var("APP_EMBED_DEVICE").is_ok_and(|v| v.eq_ignore_ascii_case("cpu"));
    #[cfg(feature = "metal")]
    {
        if !force_cpu {
            match Device::new_metal(0) {
                Ok(dev) => {
                    info!("embedding device: Metal (MPS)");
                    return dev;
                }
                Err(e) => tracing::warn!(error = %e, "Metal unavailable, using CPU"),
            }
        }
    }
    info!(force_cpu, "embedding device: CPU");
    Device::Cpu
}
