//! One-shot hardware peripheral initialization.
//!
//! Configures the two ADC1 channels and the relay GPIO using raw ESP-IDF
//! sys calls. Called once from `main()` before any task starts.
//!
//! On host targets the ADC is backed by injectable atomics so the full
//! acquisition path can run in simulation.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::config::SystemConfig;
use crate::error::SensorError;
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Self::Init("ADC1"),
            HwInitError::GpioConfigFailed(_) => Self::Init("GPIO"),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

/// Boot preflight: validate `config`, then bring up the peripherals.
///
/// Nothing is touched when the configuration is rejected.
pub fn bring_up(config: &SystemConfig) -> crate::error::Result<()> {
    config.validate()?;
    init_peripherals()?;
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before tasks spawn; single-threaded.
    unsafe {
        init_adc()?;
        init_relay_gpio()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only after `init_adc()` has completed. After
/// boot the handle is read-only and only the acquisition task converts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    // 12 dB attenuation covers the 0-3.3 V swing of the biased transformers.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for channel in [pins::VOLTAGE_ADC_CHANNEL, pins::CURRENT_ADC_CHANNEL] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }
    }

    info!(
        "hw_init: ADC1 configured (CH{}=voltage GPIO{}, CH{}=current GPIO{})",
        pins::VOLTAGE_ADC_CHANNEL,
        pins::VOLTAGE_ADC_GPIO,
        pins::CURRENT_ADC_CHANNEL,
        pins::CURRENT_ADC_GPIO
    );
    Ok(())
}

/// One 12-bit conversion.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; only the acquisition task converts.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.clamp(0, i32::from(pins::ADC_MAX_CODE)) as u16)
}

#[cfg(not(target_os = "espidf"))]
static SIM_VOLTAGE_ADC: AtomicU16 = AtomicU16::new(pins::ADC_MIDSCALE);
#[cfg(not(target_os = "espidf"))]
static SIM_CURRENT_ADC: AtomicU16 = AtomicU16::new(pins::ADC_MIDSCALE);

/// Inject the code the simulated ADC returns for `channel`.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: u16) {
    let cell = if channel == pins::VOLTAGE_ADC_CHANNEL { &SIM_VOLTAGE_ADC } else { &SIM_CURRENT_ADC };
    cell.store(raw.min(pins::ADC_MAX_CODE), Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    if channel == pins::VOLTAGE_ADC_CHANNEL {
        Ok(SIM_VOLTAGE_ADC.load(Ordering::Relaxed))
    } else {
        Ok(SIM_CURRENT_ADC.load(Ordering::Relaxed))
    }
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_relay_gpio() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::RELAY_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    // Hold the load off until the relay controller boots.
    unsafe { gpio_set_level(pins::RELAY_GPIO, u32::from(!pins::RELAY_ENERGIZED_LEVEL)) };

    info!("hw_init: relay GPIO{} configured", pins::RELAY_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    unsafe { gpio_set_level(pin, u32::from(high)); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}
