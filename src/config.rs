use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::{ByteOrder, ColorOrder, ControllerModel, PanelConfig, PanelPins, PixelFormat};

pub const DEFAULT_SPI_DEVICE: &str = "/dev/spidev0.0";
pub const DEFAULT_GPIOCHIP: &str = "/dev/gpiochip0";

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub hold_secs: Option<u64>,        // keep the frame up before teardown
    pub backlight: Option<u8>,         // 0 = off
    pub panel: Option<PanelSection>,
    pub bus: Option<BusConfig>,
}

/// Panel options as they appear in YAML; unset fields take the driver defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PanelSection {
    pub model: Option<ControllerModel>,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub color_order: Option<ColorOrder>,
    pub swap_xy: Option<bool>,
    pub mirror_x: Option<bool>,
    pub mirror_y: Option<bool>,
    pub invert: Option<bool>,
    pub pixel_format: Option<PixelFormat>,
    pub byte_order: Option<ByteOrder>,
    pub pixel_clock_hz: Option<u32>,
    pub x_offset: Option<u16>,
    pub y_offset: Option<u16>,
    pub clear_on_init: Option<bool>,
    pub pins: Option<PinSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PinSection {
    pub reset: Option<u32>,
    pub dc: Option<u32>,
    pub cs: Option<u32>,
    pub backlight: Option<u32>,
    pub backlight_active_low: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BusConfig {
    pub spi_device: Option<String>,    // e.g. "/dev/spidev0.0"
    pub gpiochip: Option<String>,      // e.g. "/dev/gpiochip0"
    pub max_transfer: Option<usize>,   // spidev bufsiz
}

impl Config {
    /// Driver configuration with defaults filled in
    pub fn panel_config(&self) -> PanelConfig {
        let mut cfg = PanelConfig::default();
        let Some(p) = self.panel.as_ref() else {
            return cfg;
        };

        if let Some(v) = p.model          { cfg.model = v; }
        if let Some(v) = p.width          { cfg.width = v; }
        if let Some(v) = p.height         { cfg.height = v; }
        if let Some(v) = p.color_order    { cfg.color_order = v; }
        if let Some(v) = p.swap_xy        { cfg.swap_xy = v; }
        if let Some(v) = p.mirror_x       { cfg.mirror_x = v; }
        if let Some(v) = p.mirror_y       { cfg.mirror_y = v; }
        if let Some(v) = p.invert         { cfg.invert = v; }
        if let Some(v) = p.pixel_format   { cfg.pixel_format = v; }
        if let Some(v) = p.byte_order     { cfg.byte_order = v; }
        if let Some(v) = p.pixel_clock_hz { cfg.pixel_clock_hz = v; }
        if let Some(v) = p.x_offset       { cfg.x_offset = v; }
        if let Some(v) = p.y_offset       { cfg.y_offset = v; }
        if let Some(v) = p.clear_on_init  { cfg.clear_on_init = v; }
        if let Some(pins) = p.pins.as_ref() {
            cfg.pins = pins.resolve(cfg.pins);
        }
        cfg
    }

    pub fn spi_device(&self) -> &str {
        self.bus.as_ref().and_then(|b| b.spi_device.as_deref()).unwrap_or(DEFAULT_SPI_DEVICE)
    }

    pub fn gpiochip(&self) -> &str {
        self.bus.as_ref().and_then(|b| b.gpiochip.as_deref()).unwrap_or(DEFAULT_GPIOCHIP)
    }

    pub fn max_transfer(&self) -> Option<usize> {
        self.bus.as_ref().and_then(|b| b.max_transfer)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

impl PinSection {
    fn resolve(&self, base: PanelPins) -> PanelPins {
        PanelPins {
            reset: self.reset.unwrap_or(base.reset),
            dc: self.dc.unwrap_or(base.dc),
            cs: self.cs.unwrap_or(base.cs),
            backlight: self.backlight.or(base.backlight),
            backlight_active_low: self.backlight_active_low.unwrap_or(base.backlight_active_low),
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "spipanel", about = "SPI panel bring-up", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long, value_enum)]
    pub model: Option<ControllerModel>,
    #[arg(long)]
    pub width: Option<u16>,
    #[arg(long)]
    pub height: Option<u16>,
    #[arg(long, value_enum)]
    pub color_order: Option<ColorOrder>,
    #[arg(long, action = ArgAction::Set)]
    pub swap_xy: Option<bool>,
    #[arg(long, action = ArgAction::Set)]
    pub mirror_x: Option<bool>,
    #[arg(long, action = ArgAction::Set)]
    pub mirror_y: Option<bool>,
    #[arg(long, action = ArgAction::Set)]
    pub invert: Option<bool>,
    #[arg(long, value_enum)]
    pub pixel_format: Option<PixelFormat>,
    /// byte order of the frames this tool renders
    #[arg(long, value_enum)]
    pub byte_order: Option<ByteOrder>,
    #[arg(long)]
    pub pixel_clock_hz: Option<u32>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub spi_device: Option<String>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub gpiochip: Option<String>,
    /// keep the test frame on screen this long before teardown
    #[arg(long)]
    pub hold_secs: Option<u64>,
    /// backlight level, 0 = off
    #[arg(long)]
    pub backlight: Option<u8>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_with(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Layer defaults, YAML and `cli`, then validate
pub fn load_with(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/spipanel/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/spipanel/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/spipanel.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["spipanel.yaml", "config/spipanel.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.hold_secs.is_some()      { dst.hold_secs = src.hold_secs; }
    if src.backlight.is_some()      { dst.backlight = src.backlight; }
    // panel
    match (&mut dst.panel, src.panel) {
        (None, Some(p)) => dst.panel = Some(p),
        (Some(d), Some(s)) => merge_panel(d, s),
        _ => {}
    }
    // bus
    match (&mut dst.bus, src.bus) {
        (None, Some(b)) => dst.bus = Some(b),
        (Some(d), Some(s)) => merge_bus(d, s),
        _ => {}
    }
}

fn merge_panel(dst: &mut PanelSection, src: PanelSection) {
    if src.model.is_some()          { dst.model = src.model; }
    if src.width.is_some()          { dst.width = src.width; }
    if src.height.is_some()         { dst.height = src.height; }
    if src.color_order.is_some()    { dst.color_order = src.color_order; }
    if src.swap_xy.is_some()        { dst.swap_xy = src.swap_xy; }
    if src.mirror_x.is_some()       { dst.mirror_x = src.mirror_x; }
    if src.mirror_y.is_some()       { dst.mirror_y = src.mirror_y; }
    if src.invert.is_some()         { dst.invert = src.invert; }
    if src.pixel_format.is_some()   { dst.pixel_format = src.pixel_format; }
    if src.byte_order.is_some()     { dst.byte_order = src.byte_order; }
    if src.pixel_clock_hz.is_some() { dst.pixel_clock_hz = src.pixel_clock_hz; }
    if src.x_offset.is_some()       { dst.x_offset = src.x_offset; }
    if src.y_offset.is_some()       { dst.y_offset = src.y_offset; }
    if src.clear_on_init.is_some()  { dst.clear_on_init = src.clear_on_init; }
    if src.pins.is_some()           { dst.pins = src.pins; }
}

fn merge_bus(dst: &mut BusConfig, src: BusConfig) {
    if src.spi_device.is_some()     { dst.spi_device = src.spi_device; }
    if src.gpiochip.is_some()       { dst.gpiochip = src.gpiochip; }
    if src.max_transfer.is_some()   { dst.max_transfer = src.max_transfer; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()      { cfg.log_level = cli.log_level.clone(); }
    if cli.hold_secs.is_some()      { cfg.hold_secs = cli.hold_secs; }
    if cli.backlight.is_some()      { cfg.backlight = cli.backlight; }

    let any_panel = cli.model.is_some()
        || cli.width.is_some()
        || cli.height.is_some()
        || cli.color_order.is_some()
        || cli.swap_xy.is_some()
        || cli.mirror_x.is_some()
        || cli.mirror_y.is_some()
        || cli.invert.is_some()
        || cli.pixel_format.is_some()
        || cli.byte_order.is_some()
        || cli.pixel_clock_hz.is_some();

    if any_panel && cfg.panel.is_none() {
        cfg.panel = Some(PanelSection::default());
    }
    if let Some(panel) = cfg.panel.as_mut() {
        if cli.model.is_some()          { panel.model = cli.model; }
        if cli.width.is_some()          { panel.width = cli.width; }
        if cli.height.is_some()         { panel.height = cli.height; }
        if cli.color_order.is_some()    { panel.color_order = cli.color_order; }
        if cli.swap_xy.is_some()        { panel.swap_xy = cli.swap_xy; }
        if cli.mirror_x.is_some()       { panel.mirror_x = cli.mirror_x; }
        if cli.mirror_y.is_some()       { panel.mirror_y = cli.mirror_y; }
        if cli.invert.is_some()         { panel.invert = cli.invert; }
        if cli.pixel_format.is_some()   { panel.pixel_format = cli.pixel_format; }
        if cli.byte_order.is_some()     { panel.byte_order = cli.byte_order; }
        if cli.pixel_clock_hz.is_some() { panel.pixel_clock_hz = cli.pixel_clock_hz; }
    }

    if (cli.spi_device.is_some() || cli.gpiochip.is_some()) && cfg.bus.is_none() {
        cfg.bus = Some(BusConfig::default());
    }
    if let Some(bus) = cfg.bus.as_mut() {
        if cli.spi_device.is_some()     { bus.spi_device = cli.spi_device.clone(); }
        if cli.gpiochip.is_some()       { bus.gpiochip = cli.gpiochip.clone(); }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(level) = cfg.log_level.as_deref() {
        match level.to_ascii_lowercase().as_str() {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {},
            _ => return Err(ConfigError::Validation(format!("unknown log_level '{}'", level))),
        }
    }
    if let Some(bus) = cfg.bus.as_ref() {
        if bus.max_transfer == Some(0) {
            return Err(ConfigError::Validation("bus max_transfer must be > 0".into()));
        }
    }
    cfg.panel_config()
        .validate()
        .map_err(|e| ConfigError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("spipanel").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_empty_config_gives_driver_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.panel_config(), PanelConfig::default());
        assert_eq!(cfg.spi_device(), DEFAULT_SPI_DEVICE);
        assert_eq!(cfg.gpiochip(), DEFAULT_GPIOCHIP);
        assert_eq!(cfg.log_level(), "info");
    }

    #[test]
    fn test_yaml_sections() {
        let cfg = parse_yaml(
            "log_level: debug\n\
             panel:\n  model: ili9341\n  width: 320\n  height: 240\n  color_order: bgr\n  swap_xy: true\n  pins:\n    dc: 24\n    backlight_active_low: true\n\
             bus:\n  spi_device: /dev/spidev1.0\n  max_transfer: 8192\n",
        )
        .unwrap();

        let panel = cfg.panel_config();
        assert_eq!(panel.model, ControllerModel::Ili9341);
        assert_eq!((panel.width, panel.height), (320, 240));
        assert_eq!(panel.color_order, ColorOrder::Bgr);
        assert!(panel.swap_xy);
        assert_eq!(panel.pins.dc, 24);
        assert_eq!(panel.pins.reset, PanelPins::default().reset);
        assert!(panel.pins.backlight_active_low);
        assert_eq!(cfg.spi_device(), "/dev/spidev1.0");
        assert_eq!(cfg.gpiochip(), DEFAULT_GPIOCHIP);
        assert_eq!(cfg.max_transfer(), Some(8192));
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut dst = parse_yaml("panel:\n  width: 240\n  height: 240\n").unwrap();
        let src = parse_yaml("panel:\n  invert: true\nhold_secs: 5\n").unwrap();
        merge(&mut dst, src);

        let panel = dst.panel.unwrap();
        assert_eq!(panel.width, Some(240));
        assert_eq!(panel.invert, Some(true));
        assert_eq!(dst.hold_secs, Some(5));
    }

    #[test]
    fn test_cli_overrides_yaml() {
        let mut cfg = parse_yaml("panel:\n  width: 240\n  invert: false\n").unwrap();
        apply_cli_overrides(
            &mut cfg,
            &cli(&["--width", "320", "--height", "240", "--invert", "true", "--model", "st7789", "--spi-device", "/dev/spidev0.1"]),
        );

        let panel = cfg.panel_config();
        assert_eq!(panel.width, 320);
        assert_eq!(panel.height, 240);
        assert!(panel.invert);
        assert_eq!(cfg.spi_device(), "/dev/spidev0.1");
    }

    #[test]
    fn test_yaml_wire_format_fields() {
        let mut cfg = parse_yaml("panel:\n  pixel_format: rgb666\n").unwrap();
        assert_eq!(cfg.panel_config().pixel_format, PixelFormat::Rgb666);

        let src = parse_yaml("panel:\n  pixel_format: rgb565\n  byte_order: little\n").unwrap();
        merge(&mut cfg, src);
        let panel = cfg.panel_config();
        assert_eq!(panel.pixel_format, PixelFormat::Rgb565);
        assert_eq!(panel.byte_order, ByteOrder::Little);
        assert!(validate(&cfg).is_ok());

        assert!(parse_yaml("panel:\n  pixel_format: rgb888\n").is_err());
    }

    #[test]
    fn test_cli_mirror_and_format_flags() {
        let mut cfg = Config::default();
        apply_cli_overrides(&mut cfg, &cli(&["--mirror-x", "true", "--mirror-y", "true", "--byte-order", "little"]));

        let panel = cfg.panel_config();
        assert!(panel.mirror_x && panel.mirror_y);
        assert!(!panel.swap_xy);
        assert_eq!(panel.byte_order, ByteOrder::Little);
        assert!(validate(&cfg).is_ok());

        // swapped buffers only exist for rgb565
        apply_cli_overrides(&mut cfg, &cli(&["--pixel-format", "rgb666"]));
        assert_eq!(cfg.panel_config().pixel_format, PixelFormat::Rgb666);
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_bad_panel() {
        let cfg = parse_yaml("panel:\n  width: 0\n").unwrap();
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));

        let cfg = parse_yaml("panel:\n  pixel_clock_hz: 80000000\n").unwrap();
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_bad_log_level_and_bus() {
        let cfg = parse_yaml("log_level: loud\n").unwrap();
        assert!(validate(&cfg).is_err());

        let cfg = parse_yaml("bus:\n  max_transfer: 0\n").unwrap();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let err = load_with(&cli(&["--config", "/nonexistent/spipanel.yaml"])).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_unknown_model_rejected() {
        assert!(parse_yaml("panel:\n  model: ssd1306\n").is_err());
    }
}
